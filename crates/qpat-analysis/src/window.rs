//! Sliding-window coincidence counting.

use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::model::{CoincidenceModel, Coincidences, Timestamp};

/// Counts every pair `(a, b)` with `|a - b| < window`.
///
/// An event may take part in several pairs when the other stream has more
/// than one event inside its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCoincidenceModel {
    window: Timestamp,
}

impl WindowCoincidenceModel {
    /// Create a model; the window must be at least 1 ps.
    pub fn new(window: Timestamp) -> AnalysisResult<Self> {
        if window == 0 {
            return Err(AnalysisError::InvalidWindow("window must be positive".into()));
        }
        Ok(Self { window })
    }
}

fn sorted(events: &[Timestamp]) -> Vec<Timestamp> {
    let mut v = events.to_vec();
    v.sort_unstable();
    v
}

impl CoincidenceModel for WindowCoincidenceModel {
    fn name(&self) -> &'static str {
        "window"
    }

    fn window(&self) -> Timestamp {
        self.window
    }

    fn compute(&self, a: &[Timestamp], b: &[Timestamp]) -> Coincidences {
        let a = sorted(a);
        let b = sorted(b);

        let mut count = 0u64;
        let mut lo = 0usize;
        for &t in &a {
            // b[lo..] holds the events with b > t - window.
            while lo < b.len() && b[lo].saturating_add(self.window) <= t {
                lo += 1;
            }
            count += b[lo..]
                .iter()
                .take_while(|&&u| u < t.saturating_add(self.window))
                .count() as u64;
        }

        debug!(
            window = self.window,
            a = a.len(),
            b = b.len(),
            count,
            "window coincidences"
        );
        Coincidences {
            count,
            window: self.window,
        }
    }
}
