//! Temporal-locality estimation via a stack of exponentially sized LRU
//! caches.

use crate::locality::lru::LruCache;

/// Default reuse horizon: reuses further apart than this many distinct
/// addresses score zero.
pub const DEFAULT_HORIZON: u64 = 1 << 17;

/// Classifies every access by its LRU reuse distance, quantized to
/// powers of two: an address found in the cache of capacity `2^i + 1`
/// but no smaller one has reuse class `i`. Tight reuse (classes 0 and
/// 1) scores full weight, decaying linearly to zero at the horizon.
#[derive(Debug)]
pub struct TemporalLocality {
    caches: Vec<LruCache>,
    reuse: Vec<u64>,
    total: u64,
    log2_horizon: u32,
}

impl Default for TemporalLocality {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON)
    }
}

impl TemporalLocality {
    /// `horizon` must be a power of two.
    #[must_use]
    pub fn new(horizon: u64) -> Self {
        assert!(horizon.is_power_of_two());
        let log2_horizon = horizon.trailing_zeros();
        let levels = log2_horizon as usize + 1;
        let caches = (0..levels).map(|i| LruCache::new((1usize << i) + 1)).collect();
        Self { caches, reuse: vec![0; levels], total: 0, log2_horizon }
    }

    pub fn record(&mut self, addr: u64) {
        self.total += 1;
        if let Some(class) = self.caches.iter().position(|cache| cache.contains(addr)) {
            self.reuse[class] += 1;
        }
        for cache in &mut self.caches {
            cache.put(addr);
        }
    }

    /// Weighted fraction of tightly reused accesses, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let log2 = f64::from(self.log2_horizon);
        let weighted: f64 = self
            .reuse
            .iter()
            .enumerate()
            .map(|(class, &hits)| {
                let weight = if class <= 1 { log2 } else { log2 - class as f64 };
                hits as f64 * weight
            })
            .sum();
        weighted / log2 / self.total as f64
    }
}
