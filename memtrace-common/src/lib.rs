//! # Shared Trace Record Layout (capture plugin ↔ analysis core)
//!
//! Defines the fixed-width on-disk event record written by the
//! instrumentation plugin and replayed by the analysis core. Both sides
//! depend on this crate so the byte layout can never drift between the
//! producer and the consumer.
//!
//! ## Record Layout
//!
//! Every record is exactly [`EVENT_RECORD_SIZE`] bytes, little-endian:
//!
//! ```text
//! offset  size  field
//!      0     4  tag (TAG_CALL_INST .. TAG_FREE)
//!      4     4  reserved (zero)
//!      8     8  timestamp (monotonic cycle counter)
//!     16     4  thread id
//! memory shape (Read / Write / Alloc / Free):
//!     20     4  var id (i32, -1 until the resolution pass runs)
//!     24     8  address
//!     32     8  access size in bytes
//!     40     8  instruction address
//! routine shape (CallInst / Call / Ret):
//!     20     4  routine id (i32)
//!     24     8  stack pointer register at the event
//!     32     8  instruction address
//!     40     8  reserved (zero)
//! ```
//!
//! The log file itself is a raw concatenation of records; the total
//! record count travels out-of-band in the session metadata.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

// ============================================================================
// Record Tags
// ============================================================================

/// Call instruction reached (routine shape). Precedes the `Call` of the
/// callee and is how allocation call sites are attributed.
pub const TAG_CALL_INST: u32 = 0;
/// Function entry (routine shape).
pub const TAG_CALL: u32 = 1;
/// Function exit (routine shape).
pub const TAG_RET: u32 = 2;
/// Memory read (memory shape).
pub const TAG_READ: u32 = 3;
/// Memory write (memory shape).
pub const TAG_WRITE: u32 = 4;
/// Heap allocation: `addr` is the block start, `size` the requested size.
pub const TAG_ALLOC: u32 = 5;
/// Heap free: `addr` is the block start, `size` unused.
pub const TAG_FREE: u32 = 6;

/// On-disk size of one event record in bytes.
pub const EVENT_RECORD_SIZE: usize = 48;

/// Default upper bound on thread ids the capture plugin will emit.
///
/// The analysis core sizes its per-thread call-stack registry from this;
/// a trace with a thread id at or above the configured limit is rejected
/// rather than silently dropped.
pub const MAX_THREADS: usize = 64;

// ============================================================================
// Event Shapes
// ============================================================================

/// Payload of a Read/Write/Alloc/Free record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryEvent {
    pub timestamp: u64,
    pub thread_id: u32,
    pub addr: u64,
    pub size: u64,
    pub inst_addr: u64,
    /// Id of the variable this access resolves to, or -1 before the
    /// resolution pass has run (or when resolution failed).
    pub var_id: i32,
}

/// Payload of a CallInst/Call/Ret record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineEvent {
    pub timestamp: u64,
    pub thread_id: u32,
    pub routine_id: i32,
    pub stack_pointer: u64,
    pub inst_addr: u64,
}

/// One trace event, decoded from its fixed-width record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    CallInst(RoutineEvent),
    Call(RoutineEvent),
    Ret(RoutineEvent),
    Read(MemoryEvent),
    Write(MemoryEvent),
    Alloc(MemoryEvent),
    Free(MemoryEvent),
}

/// Malformed event record.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("unknown event tag {0}")]
    UnknownTag(u32),

    #[error("record buffer is {0} bytes, expected {EVENT_RECORD_SIZE}")]
    ShortRecord(usize),
}

impl Event {
    /// The on-disk tag for this event.
    #[must_use]
    pub fn tag(&self) -> u32 {
        match self {
            Event::CallInst(_) => TAG_CALL_INST,
            Event::Call(_) => TAG_CALL,
            Event::Ret(_) => TAG_RET,
            Event::Read(_) => TAG_READ,
            Event::Write(_) => TAG_WRITE,
            Event::Alloc(_) => TAG_ALLOC,
            Event::Free(_) => TAG_FREE,
        }
    }

    /// Thread that emitted the event, regardless of shape.
    #[must_use]
    pub fn thread_id(&self) -> u32 {
        match self {
            Event::CallInst(r) | Event::Call(r) | Event::Ret(r) => r.thread_id,
            Event::Read(m) | Event::Write(m) | Event::Alloc(m) | Event::Free(m) => m.thread_id,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> u64 {
        match self {
            Event::CallInst(r) | Event::Call(r) | Event::Ret(r) => r.timestamp,
            Event::Read(m) | Event::Write(m) | Event::Alloc(m) | Event::Free(m) => m.timestamp,
        }
    }

    /// Memory payload for memory-shaped events.
    #[must_use]
    pub fn memory(&self) -> Option<&MemoryEvent> {
        match self {
            Event::Read(m) | Event::Write(m) | Event::Alloc(m) | Event::Free(m) => Some(m),
            _ => None,
        }
    }

    /// Mutable memory payload, used by the resolution pass to patch
    /// `var_id` back into the record.
    #[must_use]
    pub fn memory_mut(&mut self) -> Option<&mut MemoryEvent> {
        match self {
            Event::Read(m) | Event::Write(m) | Event::Alloc(m) | Event::Free(m) => Some(m),
            _ => None,
        }
    }

    /// Routine payload for routine-shaped events.
    #[must_use]
    pub fn routine(&self) -> Option<&RoutineEvent> {
        match self {
            Event::CallInst(r) | Event::Call(r) | Event::Ret(r) => Some(r),
            _ => None,
        }
    }

    /// True for Read/Write events, the only ones downstream analyses see.
    #[must_use]
    pub fn is_access(&self) -> bool {
        matches!(self, Event::Read(_) | Event::Write(_))
    }

    /// Serialize into a record buffer. The buffer must be exactly
    /// [`EVENT_RECORD_SIZE`] bytes.
    pub fn encode(&self, buf: &mut [u8]) -> Result<(), RecordError> {
        if buf.len() != EVENT_RECORD_SIZE {
            return Err(RecordError::ShortRecord(buf.len()));
        }
        buf.fill(0);
        LittleEndian::write_u32(&mut buf[0..4], self.tag());
        match self {
            Event::CallInst(r) | Event::Call(r) | Event::Ret(r) => {
                LittleEndian::write_u64(&mut buf[8..16], r.timestamp);
                LittleEndian::write_u32(&mut buf[16..20], r.thread_id);
                LittleEndian::write_i32(&mut buf[20..24], r.routine_id);
                LittleEndian::write_u64(&mut buf[24..32], r.stack_pointer);
                LittleEndian::write_u64(&mut buf[32..40], r.inst_addr);
            }
            Event::Read(m) | Event::Write(m) | Event::Alloc(m) | Event::Free(m) => {
                LittleEndian::write_u64(&mut buf[8..16], m.timestamp);
                LittleEndian::write_u32(&mut buf[16..20], m.thread_id);
                LittleEndian::write_i32(&mut buf[20..24], m.var_id);
                LittleEndian::write_u64(&mut buf[24..32], m.addr);
                LittleEndian::write_u64(&mut buf[32..40], m.size);
                LittleEndian::write_u64(&mut buf[40..48], m.inst_addr);
            }
        }
        Ok(())
    }

    /// Deserialize a record buffer.
    pub fn decode(buf: &[u8]) -> Result<Self, RecordError> {
        if buf.len() != EVENT_RECORD_SIZE {
            return Err(RecordError::ShortRecord(buf.len()));
        }
        let tag = LittleEndian::read_u32(&buf[0..4]);
        let timestamp = LittleEndian::read_u64(&buf[8..16]);
        let thread_id = LittleEndian::read_u32(&buf[16..20]);
        match tag {
            TAG_CALL_INST | TAG_CALL | TAG_RET => {
                let routine = RoutineEvent {
                    timestamp,
                    thread_id,
                    routine_id: LittleEndian::read_i32(&buf[20..24]),
                    stack_pointer: LittleEndian::read_u64(&buf[24..32]),
                    inst_addr: LittleEndian::read_u64(&buf[32..40]),
                };
                Ok(match tag {
                    TAG_CALL_INST => Event::CallInst(routine),
                    TAG_CALL => Event::Call(routine),
                    _ => Event::Ret(routine),
                })
            }
            TAG_READ | TAG_WRITE | TAG_ALLOC | TAG_FREE => {
                let memory = MemoryEvent {
                    timestamp,
                    thread_id,
                    var_id: LittleEndian::read_i32(&buf[20..24]),
                    addr: LittleEndian::read_u64(&buf[24..32]),
                    size: LittleEndian::read_u64(&buf[32..40]),
                    inst_addr: LittleEndian::read_u64(&buf[40..48]),
                };
                Ok(match tag {
                    TAG_READ => Event::Read(memory),
                    TAG_WRITE => Event::Write(memory),
                    TAG_ALLOC => Event::Alloc(memory),
                    _ => Event::Free(memory),
                })
            }
            other => Err(RecordError::UnknownTag(other)),
        }
    }
}
