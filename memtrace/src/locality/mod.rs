//! Locality estimators: spatial (stride distances) and temporal (LRU
//! reuse distances), both streaming and O(1) memory in the trace
//! length.

pub mod lru;
pub mod spatial;
pub mod temporal;

pub use lru::LruCache;
pub use spatial::SpatialLocality;
pub use temporal::TemporalLocality;
