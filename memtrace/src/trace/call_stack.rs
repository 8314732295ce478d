//! Per-thread call-stack reconstruction from Call/Ret events.
//!
//! The stack defends against missed Ret events (tail calls, stack
//! reuse): pushing a frame first evicts every frame whose base is at or
//! below the new one, because a live caller frame always sits above its
//! callee on a downward-growing stack.

use crate::domain::FuncId;

/// One active invocation: the function plus its reconstructed frame base
/// (stack-pointer at entry plus the function's fixed offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuncCall {
    pub func: FuncId,
    pub frame_base: u64,
}

/// Mismatch between a Ret event and the reconstructed top of stack — a
/// trace-consistency violation the caller must surface with thread and
/// offset context.
#[derive(Debug, Clone, Copy)]
pub struct PopMismatch {
    pub expected: FuncCall,
    pub found: Option<FuncCall>,
}

/// Call stack of a single thread.
#[derive(Debug, Default, Clone)]
pub struct CallStack {
    calls: Vec<FuncCall>,
}

impl CallStack {
    /// Push a frame, evicting any frames whose base is at or below the
    /// new frame's base.
    pub fn push(&mut self, call: FuncCall) {
        while self.calls.last().is_some_and(|top| top.frame_base <= call.frame_base) {
            self.calls.pop();
        }
        self.calls.push(call);
    }

    /// Pop the top frame, which must exactly match `expected`.
    pub fn pop_expected(&mut self, expected: FuncCall) -> Result<(), PopMismatch> {
        match self.calls.last() {
            Some(top) if *top == expected => {
                self.calls.pop();
                Ok(())
            }
            found => Err(PopMismatch { expected, found: found.copied() }),
        }
    }

    #[must_use]
    pub fn top(&self) -> Option<&FuncCall> {
        self.calls.last()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Frames in push order; the resolver scans this newest-to-oldest.
    #[must_use]
    pub fn frames(&self) -> &[FuncCall] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

/// One call stack per thread id, fixed size.
#[derive(Debug)]
pub struct CallStackSet {
    stacks: Vec<CallStack>,
}

impl CallStackSet {
    #[must_use]
    pub fn new(max_threads: usize) -> Self {
        Self { stacks: vec![CallStack::default(); max_threads] }
    }

    #[must_use]
    pub fn get(&self, thread_id: u32) -> Option<&CallStack> {
        self.stacks.get(thread_id as usize)
    }

    pub fn get_mut(&mut self, thread_id: u32) -> Option<&mut CallStack> {
        self.stacks.get_mut(thread_id as usize)
    }

    #[must_use]
    pub fn max_threads(&self) -> usize {
        self.stacks.len()
    }

    pub fn clear(&mut self) {
        for stack in &mut self.stacks {
            stack.clear();
        }
    }
}
