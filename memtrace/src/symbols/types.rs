//! Symbol records: functions, variables, source locations.

use crate::domain::{FuncId, VarId};
use std::fmt;

/// Where a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// Global/static data; `stack_offset` holds the absolute address.
    Static,
    /// Stack local; `stack_offset` is relative to the owning frame base.
    Auto,
    /// Heap block discovered from an Alloc event; `stack_offset` holds
    /// the absolute block address.
    Dynamic,
}

impl StorageType {
    pub(crate) fn as_raw(self) -> u8 {
        match self {
            StorageType::Static => 0,
            StorageType::Auto => 1,
            StorageType::Dynamic => 2,
        }
    }

    pub(crate) fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(StorageType::Static),
            1 => Some(StorageType::Auto),
            2 => Some(StorageType::Dynamic),
            _ => None,
        }
    }
}

/// A file/line pair; `line == -1` means unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: String,
    pub line: i32,
}

impl SourceLocation {
    #[must_use]
    pub fn new(file: impl Into<String>, line: i32) -> Self {
        Self { file: file.into(), line }
    }

    /// A location that can be trusted for identity comparisons (matrix
    /// merging refuses to merge unknown locations).
    #[must_use]
    pub fn is_known(&self) -> bool {
        !self.file.is_empty() && self.line >= 0
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self { file: String::new(), line: -1 }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{}:{}", self.file, self.line)
        } else {
            write!(f, "<unknown>")
        }
    }
}

/// A function known to the symbol table.
///
/// Created once during symbol-table construction and immutable
/// thereafter, apart from `vars` which accumulates back-references as
/// its locals are registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncInfo {
    pub id: FuncId,
    pub name: String,
    /// Signed displacement from the stack-pointer value at entry to the
    /// function's frame base.
    pub stack_offset: i64,
    /// Ids of the variables owned by this function (non-owning).
    pub vars: Vec<VarId>,
}

/// A variable known to the symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarInfo {
    pub id: VarId,
    pub storage: StorageType,
    pub name: String,
    /// Total size in bytes.
    pub size: u64,
    /// Element size, used by stride matching.
    pub type_size: u64,
    /// Frame-relative offset for Auto; absolute address for
    /// Static/Dynamic.
    pub stack_offset: i64,
    pub src_loc: SourceLocation,
    /// Owning function; `None` for Static/Dynamic.
    pub parent: Option<FuncId>,
}

/// Everything needed to register a variable; the id is assigned by the
/// `DebugContext`.
#[derive(Debug, Clone)]
pub struct NewVar {
    pub storage: StorageType,
    pub name: String,
    pub size: u64,
    pub type_size: u64,
    pub stack_offset: i64,
    pub src_loc: SourceLocation,
    pub parent: Option<FuncId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_known() {
        assert!(SourceLocation::new("a.c", 10).is_known());
        assert!(!SourceLocation::new("a.c", -1).is_known());
        assert!(!SourceLocation::default().is_known());
    }

    #[test]
    fn test_source_location_display() {
        assert_eq!(SourceLocation::new("a.c", 10).to_string(), "a.c:10");
        assert_eq!(SourceLocation::default().to_string(), "<unknown>");
    }

    #[test]
    fn test_storage_type_raw_round_trip() {
        for st in [StorageType::Static, StorageType::Auto, StorageType::Dynamic] {
            assert_eq!(StorageType::from_raw(st.as_raw()), Some(st));
        }
        assert_eq!(StorageType::from_raw(9), None);
    }
}
