//! The sliding-window driver shared by all matchers.

use crate::pattern::access::Access;
use crate::pattern::match_info::{MatchInfo, MatchKind};
use std::collections::VecDeque;

/// Runs below this many merged window matches are noise and filtered
/// from reports.
pub const MIN_GROUP_SIZE: u32 = 3;

/// A matcher inspects a full window and reports what it saw. Tally-only
/// matchers (the shape matcher) keep their own state and return `None`.
pub trait Matcher {
    fn window_size(&self) -> usize;
    fn match_window(&mut self, window: &VecDeque<Access>) -> Option<MatchKind>;
}

/// Slides a fixed-size window over an access stream, collecting merged
/// match runs.
pub struct AccessPattern<M: Matcher> {
    matcher: M,
    window: VecDeque<Access>,
    matches: Vec<MatchInfo>,
}

impl<M: Matcher> AccessPattern<M> {
    pub fn new(matcher: M) -> Self {
        Self { matcher, window: VecDeque::new(), matches: Vec::new() }
    }

    pub fn process(&mut self, access: Access) {
        self.window.push_back(access);
        if self.window.len() > self.matcher.window_size() {
            self.window.pop_front();
        }
        if self.window.len() < self.matcher.window_size() {
            return;
        }
        if let Some(kind) = self.matcher.match_window(&self.window) {
            // A window match covers [first, last) of the window.
            let info = MatchInfo {
                kind,
                begin_addr: self.window.front().map_or(0, |a| a.addr),
                end_addr: self.window.back().map_or(0, |a| a.addr),
                count: 1,
            };
            match self.matches.last_mut() {
                Some(run) if run.is_mergeable(&info) => run.absorb(&info),
                _ => self.matches.push(info),
            }
        }
    }

    /// Merged runs long enough to be worth reporting.
    #[must_use]
    pub fn matches(&self) -> Vec<MatchInfo> {
        self.matches.iter().filter(|run| run.count >= MIN_GROUP_SIZE).cloned().collect()
    }

    #[must_use]
    pub fn matcher(&self) -> &M {
        &self.matcher
    }
}
