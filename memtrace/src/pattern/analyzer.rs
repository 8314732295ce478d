//! Runs every matcher over one variable's access stream.

use crate::pattern::access::Access;
use crate::pattern::consecutive::ConsecutiveMatcher;
use crate::pattern::match_info::MatchInfo;
use crate::pattern::rw::RwMatcher;
use crate::pattern::stat::{StatMatcher, StatShape};
use crate::pattern::window::AccessPattern;

/// All matchers for a single variable, fed from the same stream.
pub struct PatternAnalyzer {
    consecutive: AccessPattern<ConsecutiveMatcher>,
    stat: AccessPattern<StatMatcher>,
    rw: AccessPattern<RwMatcher>,
}

impl PatternAnalyzer {
    /// `type_size` fixes the stride the consecutive matcher accepts.
    #[must_use]
    pub fn new(type_size: u64) -> Self {
        Self {
            consecutive: AccessPattern::new(ConsecutiveMatcher::new(type_size)),
            stat: AccessPattern::new(StatMatcher::new()),
            rw: AccessPattern::new(RwMatcher),
        }
    }

    pub fn process(&mut self, access: &Access) {
        self.consecutive.process(access.clone());
        self.stat.process(access.clone());
        self.rw.process(access.clone());
    }

    /// Positional match runs from all matchers, in stream order per
    /// matcher.
    #[must_use]
    pub fn matches(&self) -> Vec<MatchInfo> {
        let mut matches = self.consecutive.matches();
        matches.extend(self.rw.matches());
        matches
    }

    /// The `top_n` most frequent shapes from the tally pool.
    #[must_use]
    pub fn stat_shapes(&self, top_n: usize) -> Vec<StatShape> {
        let mut shapes = self.stat.matcher().shapes();
        shapes.truncate(top_n);
        shapes
    }
}
