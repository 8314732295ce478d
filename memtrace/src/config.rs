//! Analysis configuration.
//!
//! The knobs here are the platform-dependent constants of the capture
//! target; anything that would misbehave on a different virtual memory
//! layout belongs in this struct rather than in the code.

use memtrace_common::MAX_THREADS;

/// Tunable parameters for a replay/analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Addresses strictly above this boundary are treated as stack
    /// region; at or below as heap/static. Characteristic of the target
    /// ABI's user-stack placement — a target with a different layout
    /// must override this.
    pub stack_boundary: u64,

    /// Upper bound on thread ids; sizes the per-thread call-stack
    /// registry. Traces carrying a larger thread id are rejected.
    pub max_threads: usize,

    /// Events paged into memory per chunk. Power of two; bounds memory
    /// use for traces larger than RAM.
    pub chunk_events: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stack_boundary: 0x7000_0000_0000,
            max_threads: MAX_THREADS,
            chunk_events: 1 << 23,
        }
    }
}
