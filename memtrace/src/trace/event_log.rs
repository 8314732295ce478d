//! The paged, replayable event log.
//!
//! `EventLog` wraps a flat file of fixed-size records and a record count
//! (tracked out-of-band in the session metadata). Records are paged into
//! memory in power-of-two chunks so traces larger than RAM can be
//! replayed. Iteration is strictly forward; `next()` feeds Call/Ret
//! records into the per-thread call-stack registry as a side effect, so
//! callers can always ask "what function is thread T inside right now".

use crate::config::AnalysisConfig;
use crate::domain::{FuncId, TraceError};
use crate::symbols::DebugContext;
use crate::trace::call_stack::{CallStackSet, FuncCall};
use log::debug;
use memtrace_common::{Event, EVENT_RECORD_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    total_events: u64,
    chunk_events: usize,
    iter_index: u64,
    /// Decoded records of the currently paged-in chunk.
    chunk: Vec<Event>,
    /// First event index of the loaded chunk, `None` before any load.
    chunk_start: Option<u64>,
    /// Set when a record in the chunk was patched and must be flushed.
    dirty: bool,
    call_stacks: CallStackSet,
    total_threads: u32,
}

impl EventLog {
    /// Open a finalized event log. Fails up front if the file cannot
    /// hold `total_events` records — a truncated trace is an I/O fault,
    /// not something to discover halfway through a pass.
    pub fn new(
        path: impl AsRef<Path>,
        total_events: u64,
        config: &AnalysisConfig,
    ) -> Result<Self, TraceError> {
        let path = path.as_ref().to_path_buf();
        let expected = total_events * EVENT_RECORD_SIZE as u64;
        let actual = std::fs::metadata(&path)?.len();
        if actual < expected {
            return Err(TraceError::Truncated {
                path: path.display().to_string(),
                expected,
                actual,
            });
        }
        assert!(config.chunk_events.is_power_of_two(), "chunk size must be a power of two");
        Ok(Self {
            path,
            total_events,
            chunk_events: config.chunk_events,
            iter_index: 0,
            chunk: Vec::new(),
            chunk_start: None,
            dirty: false,
            call_stacks: CallStackSet::new(config.max_threads),
            total_threads: 0,
        })
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.total_events
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_events == 0
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest observed thread id plus one, accumulated across passes.
    #[must_use]
    pub fn total_threads(&self) -> u32 {
        self.total_threads
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.iter_index < self.total_events
    }

    /// Rewind to the start and clear all call-stack state. A full pass
    /// after `reset()` reproduces identical call-stack states at
    /// identical record offsets.
    pub fn reset(&mut self) -> Result<(), TraceError> {
        self.dump()?;
        self.iter_index = 0;
        self.chunk_start = None;
        self.chunk.clear();
        self.call_stacks.clear();
        Ok(())
    }

    /// Advance to the next record. Must be guarded by [`Self::has_next`].
    ///
    /// Call/Ret records update the call-stack registry; a Ret that does
    /// not match the reconstructed top of stack is a fatal trace
    /// consistency violation reported with its thread and offset.
    pub fn next(&mut self, debug: &DebugContext) -> Result<Event, TraceError> {
        if self.iter_index >= self.total_events {
            return Err(TraceError::PastEnd { total: self.total_events });
        }
        let idx = self.iter_index;
        let chunk_base = idx - idx % self.chunk_events as u64;
        if self.chunk_start != Some(chunk_base) {
            self.load_chunk(chunk_base)?;
        }
        let event = self.chunk[(idx - chunk_base) as usize];
        self.iter_index += 1;

        let thread_id = event.thread_id();
        if thread_id as usize >= self.call_stacks.max_threads() {
            return Err(TraceError::ThreadLimit {
                thread_id,
                max_threads: self.call_stacks.max_threads(),
            });
        }
        self.total_threads = self.total_threads.max(thread_id + 1);

        match event {
            Event::Call(routine) => {
                if let Some(call) = frame_for(debug, &routine) {
                    // get_mut cannot fail: thread id checked above.
                    if let Some(stack) = self.call_stacks.get_mut(thread_id) {
                        stack.push(call);
                    }
                }
            }
            Event::Ret(routine) => {
                if let Some(call) = frame_for(debug, &routine) {
                    let result = self
                        .call_stacks
                        .get_mut(thread_id)
                        .map(|stack| stack.pop_expected(call));
                    if let Some(Err(mismatch)) = result {
                        return Err(TraceError::CallStackMismatch {
                            thread_id,
                            offset: idx,
                            expected: func_name(debug, mismatch.expected.func),
                            found: mismatch
                                .found
                                .map_or_else(|| "<empty stack>".to_string(), |f| {
                                    func_name(debug, f.func)
                                }),
                        });
                    }
                }
            }
            _ => {}
        }
        Ok(event)
    }

    /// Patch the `var_id` of the most recently returned record. No-op
    /// for routine-shaped records.
    pub fn patch_var_id(&mut self, var_id: i32) {
        let Some(start) = self.chunk_start else { return };
        if self.iter_index == 0 {
            return;
        }
        let idx = self.iter_index - 1;
        debug_assert!(idx >= start && idx - start < self.chunk.len() as u64);
        if let Some(memory) = self.chunk[(idx - start) as usize].memory_mut() {
            memory.var_id = var_id;
            self.dirty = true;
        }
    }

    /// Flush the currently paged-in chunk back to disk if any of its
    /// records were patched. The resolution pass calls this after its
    /// final record; crossing a chunk boundary flushes automatically.
    pub fn dump(&mut self) -> Result<(), TraceError> {
        let Some(start) = self.chunk_start else { return Ok(()) };
        if !self.dirty {
            return Ok(());
        }
        debug!("flushing chunk at event {start} ({} records)", self.chunk.len());
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(start * EVENT_RECORD_SIZE as u64))?;
        let mut buf = vec![0u8; self.chunk.len() * EVENT_RECORD_SIZE];
        for (i, event) in self.chunk.iter().enumerate() {
            let record = &mut buf[i * EVENT_RECORD_SIZE..(i + 1) * EVENT_RECORD_SIZE];
            event
                .encode(record)
                .map_err(|source| TraceError::BadRecord { offset: start + i as u64, source })?;
        }
        file.write_all(&buf)?;
        self.dirty = false;
        Ok(())
    }

    /// What function is this thread currently inside, according to the
    /// replay so far.
    #[must_use]
    pub fn top_func(&self, thread_id: u32) -> Option<FuncId> {
        self.call_stacks.get(thread_id)?.top().map(|call| call.func)
    }

    /// Active frames of a thread, oldest first. Empty when the thread id
    /// is out of range or has no reconstructed frames.
    #[must_use]
    pub fn call_frames(&self, thread_id: u32) -> &[FuncCall] {
        self.call_stacks
            .get(thread_id)
            .map_or(&[], crate::trace::call_stack::CallStack::frames)
    }

    fn load_chunk(&mut self, chunk_base: u64) -> Result<(), TraceError> {
        self.dump()?;
        let count = (self.total_events - chunk_base).min(self.chunk_events as u64) as usize;
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(chunk_base * EVENT_RECORD_SIZE as u64))?;
        let mut buf = vec![0u8; count * EVENT_RECORD_SIZE];
        file.read_exact(&mut buf)?;
        self.chunk.clear();
        self.chunk.reserve(count);
        for i in 0..count {
            let record = &buf[i * EVENT_RECORD_SIZE..(i + 1) * EVENT_RECORD_SIZE];
            let event = Event::decode(record)
                .map_err(|source| TraceError::BadRecord { offset: chunk_base + i as u64, source })?;
            self.chunk.push(event);
        }
        self.chunk_start = Some(chunk_base);
        Ok(())
    }
}

fn frame_for(debug: &DebugContext, routine: &memtrace_common::RoutineEvent) -> Option<FuncCall> {
    let func = debug.find_func(FuncId(routine.routine_id))?;
    Some(FuncCall {
        func: func.id,
        frame_base: routine.stack_pointer.wrapping_add_signed(func.stack_offset),
    })
}

fn func_name(debug: &DebugContext, id: FuncId) -> String {
    debug.find_func(id).map_or_else(|| id.to_string(), |f| f.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use memtrace_common::{MemoryEvent, RoutineEvent};

    const SP: u64 = 0x7fff_ffff_e000;

    fn call_event(thread_id: u32, routine_id: i32, sp: u64) -> Event {
        Event::Call(RoutineEvent {
            timestamp: 0,
            thread_id,
            routine_id,
            stack_pointer: sp,
            inst_addr: 0,
        })
    }

    fn ret_event(thread_id: u32, routine_id: i32, sp: u64) -> Event {
        Event::Ret(RoutineEvent {
            timestamp: 0,
            thread_id,
            routine_id,
            stack_pointer: sp,
            inst_addr: 0,
        })
    }

    fn read_event(thread_id: u32, addr: u64) -> Event {
        Event::Read(MemoryEvent {
            timestamp: 0,
            thread_id,
            addr,
            size: 8,
            inst_addr: 0,
            var_id: -1,
        })
    }

    fn write_log(events: &[Event]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut buf = [0u8; EVENT_RECORD_SIZE];
        for event in events {
            event.encode(&mut buf).unwrap();
            file.write_all(&buf).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn test_config() -> AnalysisConfig {
        AnalysisConfig { chunk_events: 4, ..AnalysisConfig::default() }
    }

    fn debug_with_funcs() -> DebugContext {
        let mut debug = DebugContext::new();
        debug.add_func("main", -8); // FuncId(0)
        debug.add_func("mul0", -8); // FuncId(1)
        debug
    }

    #[test]
    fn test_balanced_stream_leaves_empty_stack() {
        let debug = debug_with_funcs();
        let events = vec![
            call_event(0, 0, SP),
            call_event(0, 1, SP - 0x100),
            read_event(0, 0x1000),
            ret_event(0, 1, SP - 0x100),
            ret_event(0, 0, SP),
        ];
        let file = write_log(&events);
        let mut log = EventLog::new(file.path(), events.len() as u64, &test_config()).unwrap();
        while log.has_next() {
            log.next(&debug).unwrap();
        }
        assert!(log.call_frames(0).is_empty());
        assert_eq!(log.total_threads(), 1);
    }

    #[test]
    fn test_top_func_tracks_replay() {
        let debug = debug_with_funcs();
        let events = vec![
            call_event(0, 0, SP),
            call_event(0, 1, SP - 0x100),
            ret_event(0, 1, SP - 0x100),
        ];
        let file = write_log(&events);
        let mut log = EventLog::new(file.path(), events.len() as u64, &test_config()).unwrap();
        log.next(&debug).unwrap();
        assert_eq!(log.top_func(0), Some(FuncId(0)));
        log.next(&debug).unwrap();
        assert_eq!(log.top_func(0), Some(FuncId(1)));
        log.next(&debug).unwrap();
        assert_eq!(log.top_func(0), Some(FuncId(0)));
    }

    #[test]
    fn test_mismatched_ret_is_fatal() {
        let debug = debug_with_funcs();
        let events = vec![call_event(0, 0, SP), ret_event(0, 1, SP - 0x100)];
        let file = write_log(&events);
        let mut log = EventLog::new(file.path(), events.len() as u64, &test_config()).unwrap();
        log.next(&debug).unwrap();
        let err = log.next(&debug).unwrap_err();
        match err {
            TraceError::CallStackMismatch { thread_id, offset, expected, found } => {
                assert_eq!(thread_id, 0);
                assert_eq!(offset, 1);
                assert_eq!(expected, "mul0");
                assert_eq!(found, "main");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reset_reproduces_call_stack_states() {
        let debug = debug_with_funcs();
        let events = vec![
            call_event(0, 0, SP),
            call_event(1, 1, SP),
            read_event(0, 0x1000),
            ret_event(1, 1, SP),
            read_event(1, 0x2000),
            ret_event(0, 0, SP),
        ];
        let file = write_log(&events);
        let mut log = EventLog::new(file.path(), events.len() as u64, &test_config()).unwrap();

        let mut first_pass = Vec::new();
        while log.has_next() {
            log.next(&debug).unwrap();
            first_pass.push((log.top_func(0), log.top_func(1)));
        }
        log.reset().unwrap();
        let mut second_pass = Vec::new();
        while log.has_next() {
            log.next(&debug).unwrap();
            second_pass.push((log.top_func(0), log.top_func(1)));
        }
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn test_patch_back_survives_paging_and_reset() {
        let debug = debug_with_funcs();
        // 10 events with a chunk size of 4 forces two chunk crossings.
        let events: Vec<Event> = (0..10).map(|i| read_event(0, 0x1000 + i * 8)).collect();
        let file = write_log(&events);
        let mut log = EventLog::new(file.path(), events.len() as u64, &test_config()).unwrap();
        let mut i = 0;
        while log.has_next() {
            log.next(&debug).unwrap();
            log.patch_var_id(i);
            i += 1;
        }
        log.dump().unwrap();

        log.reset().unwrap();
        let mut patched = Vec::new();
        while log.has_next() {
            let event = log.next(&debug).unwrap();
            patched.push(event.memory().unwrap().var_id);
        }
        assert_eq!(patched, (0..10).collect::<Vec<i32>>());
    }

    #[test]
    fn test_truncated_log_rejected_up_front() {
        let events = vec![read_event(0, 0x1000)];
        let file = write_log(&events);
        let err = EventLog::new(file.path(), 2, &test_config()).unwrap_err();
        assert!(matches!(err, TraceError::Truncated { .. }));
    }

    #[test]
    fn test_thread_limit_enforced() {
        let debug = debug_with_funcs();
        let events = vec![read_event(640, 0x1000)];
        let file = write_log(&events);
        let mut log = EventLog::new(file.path(), 1, &test_config()).unwrap();
        assert!(matches!(log.next(&debug), Err(TraceError::ThreadLimit { thread_id: 640, .. })));
    }
}
