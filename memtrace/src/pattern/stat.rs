//! Statistical shape matching: recurring relative access patterns.
//!
//! Every window of accesses is reduced to a hash of its members'
//! offsets (relative to the window head) and directions. Recurring
//! hashes are tallied in a pool rather than reported as positional
//! matches, so a loop body touching `a[i]`, `a[i+1]`, `b[i]` shows up
//! as one shape with a count, wherever in memory it ran.

use crate::pattern::access::{Access, AccessKind};
use crate::pattern::match_info::MatchKind;
use crate::pattern::window::Matcher;
use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;

/// Accesses per shape window.
pub const STAT_WINDOW: usize = 3;

/// Largest offset (either direction) from the window head that still
/// hashes; windows reaching further are ignored.
const MAX_HALF_OFFSET: i128 = 128;

/// Radix of one window position: offsets span `2 * MAX_HALF_OFFSET`
/// values, doubled for the read/write bit.
const FACTOR: u64 = 4 * MAX_HALF_OFFSET as u64;

#[derive(Debug, Clone)]
struct ShapeEntry {
    name: String,
    count: u32,
}

/// One recurring shape from the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatShape {
    pub hash: u64,
    pub name: String,
    pub count: u32,
}

impl StatShape {
    #[must_use]
    pub fn kind(&self) -> MatchKind {
        MatchKind::Stat { hash: self.hash }
    }
}

/// Tally-only matcher: hashes every full window into the shape pool and
/// never emits positional matches.
#[derive(Default)]
pub struct StatMatcher {
    pool: HashMap<u64, ShapeEntry>,
}

impl StatMatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shapes seen so far, most frequent first.
    #[must_use]
    pub fn shapes(&self) -> Vec<StatShape> {
        let mut shapes: Vec<StatShape> = self
            .pool
            .iter()
            .map(|(&hash, entry)| StatShape {
                hash,
                name: entry.name.clone(),
                count: entry.count,
            })
            .collect();
        shapes.sort_by(|a, b| b.count.cmp(&a.count).then(a.hash.cmp(&b.hash)));
        shapes
    }

    fn window_name(window: &VecDeque<Access>) -> String {
        let mut name = String::new();
        for access in window {
            if !name.is_empty() {
                name.push(' ');
            }
            name.push_str(&access.name);
        }
        name
    }
}

/// Render a shape hash as its offset/direction sequence, e.g.
/// `[R 0] [R 8] [W -4]`. Offsets are relative to the window head.
#[must_use]
pub fn describe(hash: u64) -> String {
    let mut rest = hash;
    let mut out = String::new();
    for _ in 0..STAT_WINDOW {
        let code = rest % FACTOR;
        rest /= FACTOR;
        let kind = if code % 2 == 0 { AccessKind::Read } else { AccessKind::Write };
        #[allow(clippy::cast_possible_wrap)]
        let offset = (code / 2) as i64 - MAX_HALF_OFFSET as i64;
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "[{kind} {offset}]");
    }
    out
}

impl Matcher for StatMatcher {
    fn window_size(&self) -> usize {
        STAT_WINDOW
    }

    fn match_window(&mut self, window: &VecDeque<Access>) -> Option<MatchKind> {
        let base = i128::from(window.front()?.addr) - MAX_HALF_OFFSET;
        let mut hash = 0u64;
        let mut scale = 1u64;
        for access in window {
            let offset = i128::from(access.addr) - base;
            if offset < 0 || offset >= 2 * MAX_HALF_OFFSET {
                return None;
            }
            #[allow(clippy::cast_sign_loss)]
            let code = 2 * offset as u64 + u64::from(access.kind == AccessKind::Write);
            hash += code * scale;
            scale *= FACTOR;
        }
        let name = Self::window_name(window);
        match self.pool.get_mut(&hash) {
            // A hash collision across different variables would corrupt
            // the tally; first name wins, later disagreements are
            // dropped.
            Some(entry) if entry.name == name => entry.count += 1,
            Some(_) => {}
            None => {
                self.pool.insert(hash, ShapeEntry { name, count: 1 });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::window::AccessPattern;

    fn read(addr: u64, name: &str) -> Access {
        Access::new(addr, 8, AccessKind::Read, name)
    }

    #[test]
    fn test_recurring_triplet_is_tallied() {
        let mut pattern = AccessPattern::new(StatMatcher::new());
        // Five iterations of the same three-access loop body.
        for _ in 0..5 {
            for addr in [92, 100, 108] {
                pattern.process(read(addr, "a"));
            }
        }
        let shapes = pattern.matcher().shapes();
        // Three distinct window alignments over the cycle; the one
        // anchored at the loop head recurs five times.
        assert_eq!(shapes.len(), 3);
        assert_eq!(shapes[0].count, 5);
        assert_eq!(shapes[0].name, "a a a");
        // No positional matches: shapes are tally-only.
        assert!(pattern.matches().is_empty());
    }

    #[test]
    fn test_describe_round_trips_offsets() {
        let mut pattern = AccessPattern::new(StatMatcher::new());
        for _ in 0..2 {
            for addr in [1000, 1008, 996] {
                pattern.process(read(addr, "a"));
            }
        }
        let shapes = pattern.matcher().shapes();
        let head = shapes.iter().max_by_key(|s| s.count).unwrap();
        assert_eq!(describe(head.hash), "[R 0] [R 8] [R -4]");
    }

    #[test]
    fn test_conflicting_name_not_counted() {
        let mut matcher = StatMatcher::new();
        let window: VecDeque<Access> =
            [read(100, "a"), read(108, "a"), read(116, "a")].into_iter().collect();
        assert!(matcher.match_window(&window).is_none());
        assert!(matcher.match_window(&window).is_none());
        let renamed: VecDeque<Access> =
            [read(100, "b"), read(108, "b"), read(116, "b")].into_iter().collect();
        assert!(matcher.match_window(&renamed).is_none());
        let shapes = matcher.shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].name, "a a a");
        assert_eq!(shapes[0].count, 2);
    }

    #[test]
    fn test_far_offsets_ignored() {
        let mut matcher = StatMatcher::new();
        let window: VecDeque<Access> =
            [read(100, "a"), read(100 + 1024, "a"), read(100, "a")].into_iter().collect();
        assert!(matcher.match_window(&window).is_none());
        assert!(matcher.shapes().is_empty());
    }
}
