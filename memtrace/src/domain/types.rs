//! Domain id types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep function ids, variable ids and raw event
//! fields from being mixed up in signatures that juggle several kinds of
//! integer at once.

use std::fmt;

/// Function id, assigned by the `DebugContext` at creation.
///
/// Stable for the lifetime of the context; also the value carried in
/// routine-shaped event records as `routine_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub i32);

impl fmt::Display for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func#{}", self.0)
    }
}

/// Variable id, assigned by the `DebugContext` at creation.
///
/// Memory-shaped event records carry a `var_id` of -1 until the
/// resolution pass patches the resolved id in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub i32);

impl VarId {
    /// The sentinel stored in unresolved event records.
    pub const UNRESOLVED: VarId = VarId(-1);

    /// True when this id refers to an actual variable.
    #[must_use]
    pub fn is_resolved(self) -> bool {
        self.0 >= 0
    }

    /// The raw value written into event records.
    #[must_use]
    pub fn as_raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_id_resolution_state() {
        assert!(VarId(0).is_resolved());
        assert!(VarId(42).is_resolved());
        assert!(!VarId::UNRESOLVED.is_resolved());
        assert_eq!(VarId::UNRESOLVED.as_raw(), -1);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(FuncId(3).to_string(), "func#3");
        assert_eq!(VarId(7).to_string(), "var#7");
    }
}
