//! Optical fibre between two nodes.

use qpat_experiment::{LinkModel, ParamsExt, QuantumLinkSpec};
use tracing::trace;

use super::{Action, ComponentId, Routing, SimContext};
use crate::error::{SimError, SimResult};
use crate::kernel::Picoseconds;
use crate::photon::Photon;

/// Speed of light in fibre, metres per picosecond.
pub const LIGHT_SPEED_FIBRE: f64 = 2e-4;

/// One-way fibre with propagation delay and attenuation.
pub struct QuantumChannel {
    /// Channel name, `"<src>-><dst>"`.
    pub name: String,
    distance: f64,
    attenuation: f64,
    insertion_loss: f64,
    delay: Picoseconds,
    loss: f64,
    pub(crate) receiver: Option<ComponentId>,
}

impl QuantumChannel {
    /// Build from a link description.
    ///
    /// `distance` is in metres and `attenuation` in dB/m. The `bifrost`
    /// model adds an `insertion_loss` (dB) read from the link's model
    /// parameters.
    pub fn from_link(link: &QuantumLinkSpec) -> SimResult<Self> {
        link.validate()?;
        let insertion_loss = match link.model {
            LinkModel::Ideal => 0.0,
            LinkModel::Bifrost => link.model_params.get_f64("insertion_loss")?.unwrap_or(0.0),
        };
        if !insertion_loss.is_finite() || insertion_loss < 0.0 {
            return Err(SimError::Configuration(format!(
                "insertion_loss must be non-negative, got {insertion_loss}"
            )));
        }

        let total_db = link.attenuation * link.distance + insertion_loss;
        Ok(Self {
            name: format!("{}->{}", link.src, link.dst),
            distance: link.distance,
            attenuation: link.attenuation,
            insertion_loss,
            delay: (link.distance / LIGHT_SPEED_FIBRE).round() as Picoseconds,
            loss: 1.0 - 10f64.powf(-total_db / 10.0),
            receiver: None,
        })
    }

    /// Length in metres.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Attenuation in dB/m.
    pub fn attenuation(&self) -> f64 {
        self.attenuation
    }

    /// Fixed insertion loss in dB.
    pub fn insertion_loss(&self) -> f64 {
        self.insertion_loss
    }

    /// Propagation delay.
    pub fn delay(&self) -> Picoseconds {
        self.delay
    }

    /// Probability that a photon is lost in transit.
    pub fn loss(&self) -> f64 {
        self.loss
    }

    pub(crate) fn receive(&mut self, photon: Photon, ctx: &mut SimContext<'_>) -> SimResult<Routing> {
        let Some(to) = self.receiver else {
            ctx.release(photon);
            return Err(SimError::Wiring(format!(
                "channel '{}' has no receiver",
                self.name
            )));
        };

        if self.loss > 0.0 && ctx.uniform() < self.loss {
            trace!(channel = %self.name, "photon lost in fibre");
            ctx.release(photon);
            return Ok(Routing::Done);
        }

        let at = ctx.now().saturating_add(self.delay);
        ctx.timeline.schedule(at, Action::Deliver { to, photon })?;
        Ok(Routing::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Timeline;
    use crate::photon::Encoding;
    use crate::state::{QuantumManager, horizontal};
    use qpat_experiment::ParamValue;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_delay_and_loss() {
        let link = QuantumLinkSpec::new("Source", "Alice").with_fiber(1_000.0, 0.0002);
        let ch = QuantumChannel::from_link(&link).unwrap();
        assert_eq!(ch.name, "Source->Alice");
        assert_eq!(ch.delay(), 5_000_000);
        // 0.2 dB total
        assert!((ch.loss() - (1.0 - 10f64.powf(-0.02))).abs() < 1e-12);
    }

    #[test]
    fn test_ideal_zero_length_is_lossless() {
        let ch = QuantumChannel::from_link(&QuantumLinkSpec::new("a", "b")).unwrap();
        assert_eq!(ch.delay(), 0);
        assert_eq!(ch.loss(), 0.0);
    }

    #[test]
    fn test_bifrost_insertion_loss() {
        let mut link = QuantumLinkSpec::new("a", "b");
        link.model = LinkModel::Bifrost;
        link.model_params
            .insert("insertion_loss".into(), ParamValue::from(3.0));
        let ch = QuantumChannel::from_link(&link).unwrap();
        assert!((ch.loss() - (1.0 - 10f64.powf(-0.3))).abs() < 1e-12);
    }

    #[test]
    fn test_surviving_photon_is_scheduled_after_delay() {
        let link = QuantumLinkSpec::new("a", "b").with_fiber(20.0, 0.0);
        let mut ch = QuantumChannel::from_link(&link).unwrap();
        ch.receiver = Some(ComponentId(3));

        let mut tl: Timeline<Action> = Timeline::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut qm = QuantumManager::new();
        let key = qm.new_ket(horizontal(), 1).unwrap();
        let mut ctx = SimContext::new(&mut tl, &mut rng, &mut qm);
        let routing = ch
            .receive(Photon::new("0", Encoding::Polarization, 1550.0, key), &mut ctx)
            .unwrap();
        assert!(matches!(routing, Routing::Done));

        let (time, action) = tl.pop_due().unwrap();
        assert_eq!(time, 100_000);
        assert!(matches!(action, Action::Deliver { to: ComponentId(3), .. }));
    }

    #[test]
    fn test_opaque_fibre_releases_state() {
        let link = QuantumLinkSpec::new("a", "b").with_fiber(1_000.0, 1.0);
        let mut ch = QuantumChannel::from_link(&link).unwrap();
        ch.receiver = Some(ComponentId(3));

        let mut tl: Timeline<Action> = Timeline::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut qm = QuantumManager::new();
        let key = qm.new_ket(horizontal(), 1).unwrap();
        let mut ctx = SimContext::new(&mut tl, &mut rng, &mut qm);
        ch.receive(Photon::new("0", Encoding::Polarization, 1550.0, key), &mut ctx)
            .unwrap();

        assert_eq!(tl.pending(), 0);
        assert!(qm.is_empty());
    }
}
