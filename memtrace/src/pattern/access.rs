//! The unit the pattern matchers consume: one resolved memory access.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => write!(f, "R"),
            AccessKind::Write => write!(f, "W"),
        }
    }
}

/// One access attributed to a named variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    pub addr: u64,
    pub size: u64,
    pub kind: AccessKind,
    pub name: String,
}

impl Access {
    #[must_use]
    pub fn new(addr: u64, size: u64, kind: AccessKind, name: impl Into<String>) -> Self {
        Self { addr, size, kind, name: name.into() }
    }
}
