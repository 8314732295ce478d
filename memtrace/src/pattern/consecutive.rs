//! Fixed-stride (sequential) access detection.

use crate::pattern::access::Access;
use crate::pattern::match_info::MatchKind;
use crate::pattern::window::Matcher;
use std::collections::VecDeque;

/// Matches pairs of same-kind accesses exactly one stride apart. The
/// stride is the variable's element size, so an `i32` array scanned
/// four bytes at a time matches while a strided sweep does not.
pub struct ConsecutiveMatcher {
    stride: u64,
}

impl ConsecutiveMatcher {
    #[must_use]
    pub fn new(type_size: u64) -> Self {
        Self { stride: type_size.max(1) }
    }

    #[must_use]
    pub fn stride(&self) -> u64 {
        self.stride
    }
}

impl Matcher for ConsecutiveMatcher {
    fn window_size(&self) -> usize {
        2
    }

    fn match_window(&mut self, window: &VecDeque<Access>) -> Option<MatchKind> {
        let (a, b) = (window.front()?, window.back()?);
        (a.kind == b.kind && b.addr.wrapping_sub(a.addr) == self.stride)
            .then_some(MatchKind::Consecutive { stride: self.stride })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::access::AccessKind;
    use crate::pattern::match_info::MatchInfo;
    use crate::pattern::window::AccessPattern;

    fn read(addr: u64) -> Access {
        Access::new(addr, 8, AccessKind::Read, "a")
    }

    fn write(addr: u64) -> Access {
        Access::new(addr, 8, AccessKind::Write, "a")
    }

    #[test]
    fn test_sequential_scan_merges_into_one_run() {
        let mut pattern = AccessPattern::new(ConsecutiveMatcher::new(8));
        for addr in [0x1000, 0x1008, 0x1010, 0x1018] {
            pattern.process(read(addr));
        }
        assert_eq!(
            pattern.matches(),
            vec![MatchInfo {
                kind: MatchKind::Consecutive { stride: 8 },
                begin_addr: 0x1000,
                end_addr: 0x1018,
                count: 3,
            }]
        );
    }

    #[test]
    fn test_short_runs_filtered() {
        let mut pattern = AccessPattern::new(ConsecutiveMatcher::new(8));
        for addr in [0x1000, 0x1008, 0x1010] {
            pattern.process(read(addr));
        }
        // Two merged window matches is below the reporting threshold.
        assert!(pattern.matches().is_empty());
    }

    #[test]
    fn test_kind_flip_breaks_run() {
        let mut pattern = AccessPattern::new(ConsecutiveMatcher::new(8));
        pattern.process(read(0x1000));
        pattern.process(read(0x1008));
        pattern.process(write(0x1010));
        pattern.process(read(0x1018));
        pattern.process(read(0x1020));
        assert!(pattern.matches().is_empty());
    }

    #[test]
    fn test_wrong_stride_no_match() {
        let mut pattern = AccessPattern::new(ConsecutiveMatcher::new(4));
        for addr in [0x1000, 0x1008, 0x1010, 0x1018, 0x1020] {
            pattern.process(read(addr));
        }
        assert!(pattern.matches().is_empty());
    }
}
