//! Access-pattern detection: sliding-window matchers over per-variable
//! access streams, with merged run reporting and a statistical shape
//! pool.

pub mod access;
pub mod analyzer;
pub mod consecutive;
pub mod match_info;
pub mod rw;
pub mod stat;
pub mod window;

pub use access::{Access, AccessKind};
pub use analyzer::PatternAnalyzer;
pub use consecutive::ConsecutiveMatcher;
pub use match_info::{MatchInfo, MatchKind};
pub use rw::RwMatcher;
pub use stat::{describe, StatMatcher, StatShape};
pub use window::{AccessPattern, Matcher, MIN_GROUP_SIZE};
