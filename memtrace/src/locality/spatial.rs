//! Spatial-locality estimation over word-granular stride distances.

use std::collections::VecDeque;

const WORD_SIZE: u64 = 8;
const WINDOW_SIZE: usize = 32;
const STRIDE_BUCKETS: usize = 128;

/// Histograms the distance from each access to its nearest neighbour
/// among the last few accesses, in 8-byte words. The score weights
/// short distances heavily: 1.0 means every access landed on a word
/// already in the window, 0.0 means nothing landed within a kilobyte.
#[derive(Debug)]
pub struct SpatialLocality {
    window: VecDeque<u64>,
    stride: Vec<u64>,
    /// Accesses measured against a non-empty window, bucketed or not.
    count: u64,
}

impl Default for SpatialLocality {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialLocality {
    #[must_use]
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW_SIZE),
            stride: vec![0; STRIDE_BUCKETS],
            count: 0,
        }
    }

    pub fn record(&mut self, addr: u64) {
        let word = addr / WORD_SIZE;
        if let Some(nearest) = self.window.iter().map(|&w| word.abs_diff(w)).min() {
            self.count += 1;
            if (nearest as usize) < STRIDE_BUCKETS {
                self.stride[nearest as usize] += 1;
            }
        }
        if self.window.len() == WINDOW_SIZE {
            self.window.pop_front();
        }
        self.window.push_back(word);
    }

    /// Weighted fraction of near-by accesses, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let weighted: f64 = self
            .stride
            .iter()
            .enumerate()
            .map(|(distance, &hits)| hits as f64 / (distance + 1) as f64)
            .sum();
        weighted / self.count as f64
    }
}
