//! The symbol model: functions, variables, source locations, and the
//! `DebugContext` that owns them, with binary save/load.
//!
//! The raw geometry (DWARF tag walking, type-size computation) is
//! extracted by a separate tool; this module only models the result.

pub mod debug_context;
pub mod types;

pub use debug_context::DebugContext;
pub use types::{FuncInfo, NewVar, SourceLocation, StorageType, VarInfo};
