use crate::config::Config;
use rand::Rng;

/// Slowly interpolated global heading offset applied to every branch.
///
/// Every `direction_change_interval_ms` the current target becomes the new
/// base, a fresh target is drawn from `[-drift_range, drift_range]`, and the
/// effective offset blends linearly from base to target over
/// `angle_transition_ms`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Drift {
    base: f32,
    target: f32,
    transition_start: f64,
    last_change: f64,
}

impl Drift {
    /// Retargets the drift if the change interval has elapsed.
    ///
    /// ### Returns
    /// `true` if a new target was drawn.
    pub fn advance(&mut self, now: f64, cfg: &Config, rng: &mut impl Rng) -> bool {
        if now - self.last_change <= cfg.direction_change_interval_ms {
            return false;
        }
        self.last_change = now;
        self.base = self.target;
        self.target = rng.random_range(-cfg.drift_range..=cfg.drift_range);
        self.transition_start = now;
        true
    }

    /// Effective offset at time `now`.
    pub fn offset(&self, now: f64, cfg: &Config) -> f32 {
        let t = if cfg.angle_transition_ms > 0.0 {
            ((now - self.transition_start) / cfg.angle_transition_ms).clamp(0.0, 1.0) as f32
        } else {
            1.0
        };
        self.base + (self.target - self.base) * t
    }

    pub fn target(&self) -> f32 {
        self.target
    }
}
