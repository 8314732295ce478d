//! Repeated same-address traffic detection.

use crate::pattern::access::Access;
use crate::pattern::match_info::MatchKind;
use crate::pattern::window::Matcher;
use std::collections::VecDeque;

/// Matches pairs of same-kind accesses to the exact same address, the
/// signature of a hot scalar being hammered in a loop.
#[derive(Default)]
pub struct RwMatcher;

impl Matcher for RwMatcher {
    fn window_size(&self) -> usize {
        2
    }

    fn match_window(&mut self, window: &VecDeque<Access>) -> Option<MatchKind> {
        let (a, b) = (window.front()?, window.back()?);
        (a.kind == b.kind && a.addr == b.addr).then_some(MatchKind::Rw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::access::AccessKind;
    use crate::pattern::window::AccessPattern;

    #[test]
    fn test_hammered_address_reported() {
        let mut pattern = AccessPattern::new(RwMatcher);
        for _ in 0..5 {
            pattern.process(Access::new(0x2000, 8, AccessKind::Write, "counter"));
        }
        let matches = pattern.matches();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, MatchKind::Rw);
        assert_eq!(matches[0].begin_addr, 0x2000);
        assert_eq!(matches[0].count, 4);
    }

    #[test]
    fn test_alternating_kind_no_match() {
        let mut pattern = AccessPattern::new(RwMatcher);
        for i in 0..6 {
            let kind = if i % 2 == 0 { AccessKind::Read } else { AccessKind::Write };
            pattern.process(Access::new(0x2000, 8, kind, "counter"));
        }
        assert!(pattern.matches().is_empty());
    }
}
