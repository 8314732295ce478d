//! Event-log replay: paged record iteration, per-thread call-stack
//! reconstruction, and session metadata.

pub mod call_stack;
pub mod event_log;
pub mod session;

pub use call_stack::{CallStack, CallStackSet, FuncCall};
pub use event_log::EventLog;
pub use session::SessionMeta;
