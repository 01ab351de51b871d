//! Fixed-bin coincidence counting.

use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::model::{CoincidenceModel, Coincidences, Timestamp};

/// Splits time into bins `[k·w, (k+1)·w)` and counts, per bin, every pairing
/// of an `a` event with a `b` event in that bin.
///
/// Cheaper than the sliding window but misses pairs that straddle a bin edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinnedCoincidenceModel {
    bin_width: Timestamp,
}

impl BinnedCoincidenceModel {
    /// Create a model; the bin width must be at least 1 ps.
    pub fn new(bin_width: Timestamp) -> AnalysisResult<Self> {
        if bin_width == 0 {
            return Err(AnalysisError::InvalidWindow("bin width must be positive".into()));
        }
        Ok(Self { bin_width })
    }

    /// Sorted `(bin, events)` histogram.
    fn histogram(&self, events: &[Timestamp]) -> Vec<(Timestamp, u64)> {
        let mut bins: Vec<Timestamp> = events.iter().map(|t| t / self.bin_width).collect();
        bins.sort_unstable();

        let mut hist: Vec<(Timestamp, u64)> = Vec::new();
        for bin in bins {
            match hist.last_mut() {
                Some((last, n)) if *last == bin => *n += 1,
                _ => hist.push((bin, 1)),
            }
        }
        hist
    }
}

impl CoincidenceModel for BinnedCoincidenceModel {
    fn name(&self) -> &'static str {
        "binned"
    }

    fn window(&self) -> Timestamp {
        self.bin_width
    }

    fn compute(&self, a: &[Timestamp], b: &[Timestamp]) -> Coincidences {
        let ha = self.histogram(a);
        let hb = self.histogram(b);

        let (mut i, mut j, mut count) = (0, 0, 0u64);
        while i < ha.len() && j < hb.len() {
            let (bin_a, na) = ha[i];
            let (bin_b, nb) = hb[j];
            match bin_a.cmp(&bin_b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    count += na * nb;
                    i += 1;
                    j += 1;
                }
            }
        }

        debug!(bin_width = self.bin_width, count, "binned coincidences");
        Coincidences {
            count,
            window: self.bin_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_bin_only() {
        let model = BinnedCoincidenceModel::new(10).unwrap();
        // 10 and 12 share bin 1; 100 and 101 share bin 10; 50 and 90 are alone.
        assert_eq!(model.compute(&[10, 50, 100], &[12, 90, 101]).count, 2);
        // 9 and 10 straddle an edge.
        assert_eq!(model.compute(&[9], &[10]).count, 0);
    }

    #[test]
    fn test_bin_products() {
        let model = BinnedCoincidenceModel::new(100).unwrap();
        assert_eq!(model.compute(&[1, 2, 3], &[50, 60]).count, 6);
    }

    #[test]
    fn test_zero_width_rejected() {
        assert!(BinnedCoincidenceModel::new(0).is_err());
    }
}
