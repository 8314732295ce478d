//! Matched pattern runs and their merging rules.

use std::fmt;

/// What kind of structure a window matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Fixed-stride walk, e.g. a sequential array scan.
    Consecutive { stride: u64 },
    /// Recurring relative access shape, identified by its shape hash.
    Stat { hash: u64 },
    /// Read-after-write (or repeated same-address) traffic.
    Rw,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Consecutive { stride } => write!(f, "consecutive(stride {stride})"),
            MatchKind::Stat { hash } => write!(f, "shape({hash:#x})"),
            MatchKind::Rw => write!(f, "same-address"),
        }
    }
}

/// One merged run of window matches over an address range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    pub kind: MatchKind,
    pub begin_addr: u64,
    pub end_addr: u64,
    /// Number of window matches merged into this run.
    pub count: u32,
}

impl MatchInfo {
    /// A new window match extends this run when it has the same kind
    /// and starts exactly where this run ends.
    #[must_use]
    pub fn is_mergeable(&self, other: &MatchInfo) -> bool {
        self.kind == other.kind && self.end_addr == other.begin_addr
    }

    pub fn absorb(&mut self, other: &MatchInfo) {
        debug_assert!(self.is_mergeable(other));
        self.end_addr = other.end_addr;
        self.count += other.count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_same_kind_merges() {
        let mut run = MatchInfo {
            kind: MatchKind::Consecutive { stride: 8 },
            begin_addr: 0x1000,
            end_addr: 0x1008,
            count: 1,
        };
        let next = MatchInfo {
            kind: MatchKind::Consecutive { stride: 8 },
            begin_addr: 0x1008,
            end_addr: 0x1010,
            count: 1,
        };
        assert!(run.is_mergeable(&next));
        run.absorb(&next);
        assert_eq!(run.end_addr, 0x1010);
        assert_eq!(run.count, 2);
    }

    #[test]
    fn test_kind_or_gap_blocks_merge() {
        let run = MatchInfo {
            kind: MatchKind::Consecutive { stride: 8 },
            begin_addr: 0x1000,
            end_addr: 0x1008,
            count: 1,
        };
        let gap = MatchInfo { begin_addr: 0x1010, ..run.clone() };
        assert!(!run.is_mergeable(&gap));
        let stride = MatchInfo { kind: MatchKind::Consecutive { stride: 4 }, ..run.clone() };
        assert!(!run.is_mergeable(&stride));
        let rw = MatchInfo { kind: MatchKind::Rw, ..run.clone() };
        assert!(!run.is_mergeable(&rw));
    }
}
