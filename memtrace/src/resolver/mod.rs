//! The symbol resolver: the second pass over a trace, mapping raw
//! addresses back to variables and patching each access record with the
//! resulting var id.
//!
//! Resolution order per access:
//!   1. addresses above the stack boundary are matched against the
//!      thread's reconstructed frames, newest first;
//!   2. everything else is tried against the live heap blocks;
//!   3. failing that, against static variables by absolute address.
//!
//! Alloc events mint a fresh dynamic variable on the fly, attributed to
//! the source location of the call instruction that preceded the
//! allocation on the same thread.

pub mod heap;

use crate::config::AnalysisConfig;
use crate::domain::{TraceError, VarId};
use crate::symbols::DebugContext;
use crate::trace::{EventLog, FuncCall};
use log::info;
use memtrace_common::{Event, MemoryEvent};

pub use heap::{HeapBlock, HeapMap};

/// Tally of one resolution pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionStats {
    pub resolved: u64,
    pub unresolved: u64,
    pub allocs: u64,
    pub frees: u64,
}

impl ResolutionStats {
    #[must_use]
    pub fn total_accesses(&self) -> u64 {
        self.resolved + self.unresolved
    }
}

/// Address-to-variable resolution state.
pub struct Resolver {
    heap: HeapMap,
    /// Last CallInst instruction address seen per thread; attributes
    /// allocations to their call site.
    last_call_inst: Vec<Option<u64>>,
    stack_boundary: u64,
}

impl Resolver {
    #[must_use]
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            heap: HeapMap::new(),
            last_call_inst: vec![None; config.max_threads],
            stack_boundary: config.stack_boundary,
        }
    }

    /// Resolve one access against the thread's frames and the current
    /// heap/static state.
    #[must_use]
    pub fn resolve(
        &self,
        debug: &DebugContext,
        frames: &[FuncCall],
        addr: u64,
        size: u64,
    ) -> Option<VarId> {
        if addr > self.stack_boundary {
            return self.resolve_stack(debug, frames, addr, size);
        }
        if let Some(block) = self.heap.find(addr) {
            return Some(block.var);
        }
        debug.find_var_by_address(addr).map(|var| var.id)
    }

    /// Scan frames newest-to-oldest. The access belongs to the youngest
    /// frame whose base sits at or above it; if none of that frame's
    /// locals contain the address the scan keeps walking to older
    /// frames, since a callee may legally touch its caller's locals
    /// through a pointer.
    fn resolve_stack(
        &self,
        debug: &DebugContext,
        frames: &[FuncCall],
        addr: u64,
        size: u64,
    ) -> Option<VarId> {
        for frame in frames.iter().rev() {
            if addr > frame.frame_base {
                continue;
            }
            let func = debug.find_func(frame.func)?;
            for &var_id in &func.vars {
                let Some(var) = debug.find_var(var_id) else { continue };
                let var_addr = frame.frame_base.wrapping_add_signed(var.stack_offset);
                if addr >= var_addr && addr + size <= var_addr + var.size {
                    return Some(var.id);
                }
            }
        }
        None
    }

    /// Register a fresh heap block and mint its dynamic variable.
    pub fn handle_alloc(&mut self, debug: &mut DebugContext, event: &MemoryEvent) -> VarId {
        let src_loc = self
            .last_call_inst
            .get(event.thread_id as usize)
            .copied()
            .flatten()
            .and_then(|inst| debug.inst_binding(inst).cloned())
            .unwrap_or_default();
        let var = debug.add_dynamic_var(event.addr, event.size, src_loc);
        self.heap.insert(HeapBlock { addr: event.addr, size: event.size, var });
        var
    }

    /// Retire the block based at the freed address. The dynamic variable
    /// stays in the symbol table so earlier patched accesses keep a
    /// valid target.
    pub fn handle_free(&mut self, event: &MemoryEvent) -> Option<HeapBlock> {
        self.heap.remove(event.addr)
    }

    pub fn note_call_inst(&mut self, thread_id: u32, inst_addr: u64) {
        if let Some(slot) = self.last_call_inst.get_mut(thread_id as usize) {
            *slot = Some(inst_addr);
        }
    }

    #[must_use]
    pub fn live_blocks(&self) -> usize {
        self.heap.len()
    }
}

/// Run the full resolution pass: replay the log from the start, resolve
/// every Read/Write, and patch the var id into the record file.
/// Unresolvable accesses are patched with the unresolved marker so a
/// later pass can tell "tried and failed" from "never tried".
pub fn annotate(
    log: &mut EventLog,
    debug: &mut DebugContext,
    config: &AnalysisConfig,
) -> Result<ResolutionStats, TraceError> {
    let mut resolver = Resolver::new(config);
    let mut stats = ResolutionStats::default();
    log.reset()?;
    while log.has_next() {
        let event = log.next(debug)?;
        match event {
            Event::CallInst(routine) => {
                resolver.note_call_inst(routine.thread_id, routine.inst_addr);
            }
            Event::Alloc(memory) => {
                let var = resolver.handle_alloc(debug, &memory);
                log.patch_var_id(var.as_raw());
                stats.allocs += 1;
            }
            Event::Free(memory) => {
                resolver.handle_free(&memory);
                stats.frees += 1;
            }
            Event::Read(memory) | Event::Write(memory) => {
                let frames = log.call_frames(memory.thread_id).to_vec();
                match resolver.resolve(debug, &frames, memory.addr, memory.size) {
                    Some(var) => {
                        log.patch_var_id(var.as_raw());
                        stats.resolved += 1;
                    }
                    None => {
                        log.patch_var_id(VarId::UNRESOLVED.as_raw());
                        stats.unresolved += 1;
                    }
                }
            }
            Event::Call(_) | Event::Ret(_) => {}
        }
    }
    log.dump()?;
    info!(
        "resolution pass: {} resolved, {} unresolved, {} allocs, {} frees, {} leaked blocks",
        stats.resolved, stats.unresolved, stats.allocs, stats.frees, resolver.live_blocks()
    );
    Ok(stats)
}
