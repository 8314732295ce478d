//! Query filtering: restrict a report to chosen threads or functions.

use crate::domain::FuncId;
use memtrace_common::Event;
use std::collections::HashSet;

/// Filters applied to every record during a report pass. The default
/// context accepts everything.
#[derive(Debug, Default, Clone)]
pub struct QueryContext {
    /// When set, only these thread ids pass.
    threads: Option<HashSet<u32>>,
    /// When set, only records observed while one of these functions is
    /// on top of its thread's call stack pass.
    funcs: Option<HashSet<FuncId>>,
}

impl QueryContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept_thread(&mut self, thread_id: u32) -> &mut Self {
        self.threads.get_or_insert_with(HashSet::new).insert(thread_id);
        self
    }

    pub fn accept_func(&mut self, func: FuncId) -> &mut Self {
        self.funcs.get_or_insert_with(HashSet::new).insert(func);
        self
    }

    /// Does this record pass the filters? `top_func` is the function
    /// currently on top of the record's thread's call stack.
    #[must_use]
    pub fn accept(&self, event: &Event, top_func: Option<FuncId>) -> bool {
        if let Some(threads) = &self.threads {
            if !threads.contains(&event.thread_id()) {
                return false;
            }
        }
        if let Some(funcs) = &self.funcs {
            match top_func {
                Some(func) if funcs.contains(&func) => {}
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memtrace_common::MemoryEvent;

    fn read_on_thread(thread_id: u32) -> Event {
        Event::Read(MemoryEvent {
            timestamp: 0,
            thread_id,
            addr: 0x1000,
            size: 8,
            inst_addr: 0,
            var_id: 0,
        })
    }

    #[test]
    fn test_default_accepts_all() {
        let ctx = QueryContext::new();
        assert!(ctx.accept(&read_on_thread(0), None));
        assert!(ctx.accept(&read_on_thread(7), Some(FuncId(3))));
    }

    #[test]
    fn test_thread_filter() {
        let mut ctx = QueryContext::new();
        ctx.accept_thread(1).accept_thread(2);
        assert!(!ctx.accept(&read_on_thread(0), None));
        assert!(ctx.accept(&read_on_thread(1), None));
        assert!(ctx.accept(&read_on_thread(2), None));
    }

    #[test]
    fn test_func_filter_needs_top_frame() {
        let mut ctx = QueryContext::new();
        ctx.accept_func(FuncId(5));
        assert!(ctx.accept(&read_on_thread(0), Some(FuncId(5))));
        assert!(!ctx.accept(&read_on_thread(0), Some(FuncId(6))));
        // No reconstructed frame means the record cannot be attributed.
        assert!(!ctx.accept(&read_on_thread(0), None));
    }
}
