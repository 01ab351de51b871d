//! Single-photon detectors and the fixed-basis polarization detector.

use rand_distr::{Distribution, Exp};
use tracing::trace;

use super::{Action, ComponentId, Routing, SimContext};
use crate::error::{SimError, SimResult};
use crate::kernel::{PS_PER_SECOND, Picoseconds};
use crate::photon::Photon;

/// Detector parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Probability that an arriving photon clicks.
    pub efficiency: f64,
    /// Dark-count rate in Hz.
    pub dark_count: f64,
    /// Maximum count rate in Hz; the dead time is its reciprocal.
    pub count_rate: f64,
    /// Timestamp granularity in picoseconds.
    pub time_resolution: Picoseconds,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            efficiency: 0.95,
            dark_count: 500.0,
            count_rate: 25e6,
            time_resolution: 150,
        }
    }
}

impl DetectorConfig {
    /// Check ranges.
    pub fn validate(&self) -> SimResult<()> {
        if !(0.0..=1.0).contains(&self.efficiency) {
            return Err(SimError::Configuration(format!(
                "efficiency must be in [0, 1], got {}",
                self.efficiency
            )));
        }
        if !self.dark_count.is_finite() || self.dark_count < 0.0 {
            return Err(SimError::Configuration(format!(
                "dark_count must be non-negative, got {}",
                self.dark_count
            )));
        }
        if !self.count_rate.is_finite() || self.count_rate <= 0.0 {
            return Err(SimError::Configuration(format!(
                "count_rate must be positive, got {}",
                self.count_rate
            )));
        }
        Ok(())
    }

    /// Dead time after each click.
    pub fn dead_time(&self) -> Picoseconds {
        (PS_PER_SECOND / self.count_rate).round() as Picoseconds
    }
}

/// A threshold single-photon detector.
pub struct PhotonDetector {
    /// Component name.
    pub name: String,
    config: DetectorConfig,
    next_detection_time: Picoseconds,
    observer: Option<(ComponentId, usize)>,
    photon_counter: u64,
}

impl PhotonDetector {
    /// Create a detector; fails on out-of-range parameters.
    pub fn new(name: impl Into<String>, config: DetectorConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            config,
            next_detection_time: 0,
            observer: None,
            photon_counter: 0,
        })
    }

    /// Report clicks to `observer` as its detector number `channel`.
    pub fn attach(&mut self, observer: ComponentId, channel: usize) {
        self.observer = Some((observer, channel));
    }

    /// Detector parameters.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Clicks registered so far, dark counts included.
    pub fn photon_counter(&self) -> u64 {
        self.photon_counter
    }

    pub(crate) fn init(&mut self, id: ComponentId, ctx: &mut SimContext<'_>) -> SimResult<()> {
        if self.observer.is_none() {
            return Err(SimError::Wiring(format!(
                "detector '{}' is not attached to an observer",
                self.name
            )));
        }
        self.schedule_dark_count(id, ctx)
    }

    fn schedule_dark_count(&self, id: ComponentId, ctx: &mut SimContext<'_>) -> SimResult<()> {
        if self.config.dark_count <= 0.0 {
            return Ok(());
        }
        let exp = Exp::new(self.config.dark_count)
            .map_err(|e| SimError::Configuration(format!("dark_count: {e}")))?;
        let wait = (exp.sample(&mut *ctx.rng) * PS_PER_SECOND).round() as Picoseconds;
        let at = ctx.now().saturating_add(wait);
        ctx.timeline.schedule(at, Action::DarkCount { detector: id })
    }

    pub(crate) fn receive(&mut self, photon: Photon, ctx: &mut SimContext<'_>) -> Routing {
        ctx.release(photon);
        if ctx.uniform() < self.config.efficiency {
            self.click(ctx.now())
        } else {
            Routing::Done
        }
    }

    pub(crate) fn on_dark_count(
        &mut self,
        id: ComponentId,
        ctx: &mut SimContext<'_>,
    ) -> SimResult<Routing> {
        self.schedule_dark_count(id, ctx)?;
        trace!(detector = %self.name, time = ctx.now(), "dark count");
        Ok(self.click(ctx.now()))
    }

    fn click(&mut self, now: Picoseconds) -> Routing {
        match (self.record_detection(now), self.observer) {
            (Some(time), Some((observer, channel))) => Routing::Detected {
                observer,
                channel,
                time,
            },
            _ => Routing::Done,
        }
    }

    /// Register a click at `now`, honoring dead time.
    ///
    /// Returns the resolution-rounded timestamp, or `None` if the detector
    /// was still dead.
    pub fn record_detection(&mut self, now: Picoseconds) -> Option<Picoseconds> {
        if now < self.next_detection_time {
            return None;
        }
        self.photon_counter += 1;
        self.next_detection_time = now.saturating_add(self.config.dead_time());

        let resolution = self.config.time_resolution;
        if resolution == 0 {
            return Some(now);
        }
        let bins = (now as f64 / resolution as f64).round() as Picoseconds;
        Some(bins * resolution)
    }
}

/// A beam splitter feeding two detectors; collects click timestamps.
pub struct FixedBasisPolarizationDetector {
    /// Component name.
    pub name: String,
    splitter: ComponentId,
    detectors: [ComponentId; 2],
    trigger_times: [Vec<Picoseconds>; 2],
}

impl FixedBasisPolarizationDetector {
    /// Wrap an already-wired splitter and its two detectors.
    pub fn new(name: impl Into<String>, splitter: ComponentId, detectors: [ComponentId; 2]) -> Self {
        Self {
            name: name.into(),
            splitter,
            detectors,
            trigger_times: [Vec::new(), Vec::new()],
        }
    }

    /// Beam splitter id.
    pub fn splitter(&self) -> ComponentId {
        self.splitter
    }

    /// Detector ids for outputs 0 and 1.
    pub fn detectors(&self) -> [ComponentId; 2] {
        self.detectors
    }

    pub(crate) fn receive(&mut self, photon: Photon) -> Routing {
        Routing::Forward(self.splitter, photon)
    }

    /// Append a click on detector `channel`.
    pub fn record(&mut self, channel: usize, time: Picoseconds) -> SimResult<()> {
        self.trigger_times
            .get_mut(channel)
            .ok_or_else(|| {
                SimError::Wiring(format!(
                    "'{}' has no detector channel {channel}",
                    self.name
                ))
            })?
            .push(time);
        Ok(())
    }

    /// Timestamps recorded since the last drain, without draining.
    pub fn trigger_times(&self) -> &[Vec<Picoseconds>; 2] {
        &self.trigger_times
    }

    /// Take both timestamp lists, leaving them empty.
    pub fn drain_photon_times(&mut self) -> [Vec<Picoseconds>; 2] {
        std::mem::take(&mut self.trigger_times)
    }
}
