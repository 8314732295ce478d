//! The query layer: filtered report passes over an annotated log.

pub mod access_matrix;
pub mod context;
pub mod manager;

pub use access_matrix::{AccessMask, AccessMatrix, MatrixEntry, ThreadAccess};
pub use context::QueryContext;
pub use manager::{LocalityReport, PatternReport, QueryManager};
