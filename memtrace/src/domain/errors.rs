//! Structured error types for memtrace
//!
//! Using thiserror for automatic Display implementation and error chaining.
//!
//! The taxonomy follows the analysis contract: lookup misses are *not*
//! errors (they surface as `None` / unresolved ids); these types cover the
//! fatal conditions — trace consistency violations, I/O faults, and
//! format mismatches on deserialization.

use memtrace_common::RecordError;
use thiserror::Error;

/// Fatal faults while replaying the event log.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("event log {path} is truncated: holds {actual} bytes, need {expected}")]
    Truncated { path: String, expected: u64, actual: u64 },

    #[error("thread id {thread_id} exceeds the configured maximum of {max_threads} threads")]
    ThreadLimit { thread_id: u32, max_threads: usize },

    #[error(
        "call stack mismatch on thread {thread_id} at event {offset}: \
         returning from {expected}, top of stack is {found}"
    )]
    CallStackMismatch { thread_id: u32, offset: u64, expected: String, found: String },

    #[error("read past the end of the event log ({total} events)")]
    PastEnd { total: u64 },

    #[error("malformed event record at index {offset}")]
    BadRecord {
        offset: u64,
        #[source]
        source: RecordError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fatal faults while loading or saving debug-info / session files.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("bad magic 0x{found:08x}, not a {kind} file")]
    BadMagic { kind: &'static str, found: u32 },

    #[error("unsupported {kind} format version {found} (expected {expected})")]
    UnsupportedVersion { kind: &'static str, found: u32, expected: u32 },

    #[error("string field is not valid UTF-8")]
    BadString(#[from] std::string::FromUtf8Error),

    #[error("unknown storage type {0}")]
    UnknownStorageType(u8),

    #[error("variable {var_id} references unknown parent function {parent_id}")]
    UnknownParent { var_id: i32, parent_id: i32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Faults while writing reports.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_error_display() {
        let err = TraceError::CallStackMismatch {
            thread_id: 2,
            offset: 1041,
            expected: "mul0".to_string(),
            found: "main".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("thread 2"));
        assert!(msg.contains("event 1041"));
        assert!(msg.contains("mul0"));
    }

    #[test]
    fn test_format_error_display() {
        let err = FormatError::UnsupportedVersion { kind: "debug-info", found: 9, expected: 1 };
        assert!(err.to_string().contains("version 9"));
    }
}
