//! Tunables for growth, culling, drift and connection generation.
//!
//! Every field has a default, so a TOML file only needs to name the values
//! it overrides:
//!
//! ```toml
//! max_distance = 40.0
//! cull_policy = { kind = "ceiling", max = 1500 }
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};
use std::{fs, path::Path};

/// How many particles are culled per growth tick once culling is enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CullPolicy {
    /// Never cull; the population grows without bound.
    Never,
    /// Cull one old particle per newly born one, holding the population at
    /// the size it had when culling was enabled.
    OnePerBirth,
    /// Cull just enough old particles to keep the population at or below
    /// `max`.
    Ceiling { max: usize },
}

impl CullPolicy {
    /// Number of particles to cull after `births` new particles have been
    /// appended to a population that now holds `population` particles.
    pub fn quota(&self, births: usize, population: usize) -> usize {
        match *self {
            CullPolicy::Never => 0,
            CullPolicy::OnePerBirth => births.min(population),
            CullPolicy::Ceiling { max } => population.saturating_sub(max),
        }
    }
}

/// Placement of a root planted on reset, relative to the canvas size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RootSeed {
    pub x_frac: f32,
    pub y_frac: f32,
    /// Heading in radians; `PI / 2` points up the canvas.
    pub angle: f32,
}

/// Simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection threshold, also used as the spatial grid cell size.
    pub max_distance: f32,

    pub growth_interval_ms: f64,
    pub growth_step: f32,
    pub max_branch_level: u32,
    pub branch_spawn_chance: f32,
    pub branch_spawn_min_progress: f32,
    pub max_branches: usize,
    /// A tree may hold at most `max_branches / branch_cap_share` branches.
    pub branch_cap_share: usize,
    pub child_length_min: f32,
    pub child_length_max: f32,
    pub child_width_ratio: f32,
    /// Root branch length as a fraction of the canvas height.
    pub root_length_ratio: f32,
    pub root_width: f32,

    pub direction_change_interval_ms: f64,
    pub angle_transition_ms: f64,
    pub drift_range: f32,

    pub steer_into_view: bool,
    pub view_lookahead: f32,
    pub view_turn_degrees: f32,

    pub forest_rotation: bool,
    pub tree_spawn_interval_ms: f64,

    pub cull_policy: CullPolicy,
    /// Cull from the first tick instead of waiting for the first
    /// secondary root.
    pub cull_from_start: bool,

    pub settle_chance: f32,
    pub settle_period_secs: f32,
    pub settle_window_secs: f32,
    /// Share of active particles oscillated per tick, walked round-robin.
    pub animation_fraction: f32,

    pub initial_roots: Vec<RootSeed>,

    /// Collapse queued `update` commands into the newest one.
    pub coalesce_updates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_distance: 33.0,
            growth_interval_ms: 50.0,
            growth_step: 0.02,
            max_branch_level: 4,
            branch_spawn_chance: 0.1,
            branch_spawn_min_progress: 0.3,
            max_branches: 150,
            branch_cap_share: 3,
            child_length_min: 0.6,
            child_length_max: 0.9,
            child_width_ratio: 0.8,
            root_length_ratio: 0.4,
            root_width: 55.0,
            direction_change_interval_ms: 1200.0,
            angle_transition_ms: 800.0,
            drift_range: 0.6,
            steer_into_view: true,
            view_lookahead: 200.0,
            view_turn_degrees: 135.0,
            forest_rotation: true,
            tree_spawn_interval_ms: 3600.0,
            cull_policy: CullPolicy::OnePerBirth,
            cull_from_start: false,
            settle_chance: 0.05,
            settle_period_secs: 5.0,
            settle_window_secs: 0.1,
            animation_fraction: 1.0,
            initial_roots: vec![
                RootSeed {
                    x_frac: 0.5,
                    y_frac: 0.95,
                    angle: FRAC_PI_2,
                },
                RootSeed {
                    x_frac: 0.5,
                    y_frac: 0.05,
                    angle: PI * 1.5,
                },
            ],
            coalesce_updates: true,
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// The in-view correction turn, in radians.
    pub fn view_turn(&self) -> f32 {
        self.view_turn_degrees.to_radians()
    }

    /// Checks that every value is usable by the simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(msg: impl Into<String>) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(msg.into()))
        }

        if !(self.max_distance.is_finite() && self.max_distance > 0.0) {
            return invalid(format!("max_distance must be positive, got {}", self.max_distance));
        }
        if !(self.growth_step > 0.0 && self.growth_step <= 1.0) {
            return invalid(format!("growth_step must be in (0, 1], got {}", self.growth_step));
        }
        for (name, p) in [
            ("branch_spawn_chance", self.branch_spawn_chance),
            ("branch_spawn_min_progress", self.branch_spawn_min_progress),
            ("settle_chance", self.settle_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{name} must be in [0, 1], got {p}"));
            }
        }
        if !(self.child_length_min > 0.0 && self.child_length_min <= self.child_length_max) {
            return invalid(format!(
                "child length range {}..{} is empty",
                self.child_length_min, self.child_length_max
            ));
        }
        if self.branch_cap_share == 0 {
            return invalid("branch_cap_share must be at least 1");
        }
        for (name, ms) in [
            ("growth_interval_ms", self.growth_interval_ms),
            ("direction_change_interval_ms", self.direction_change_interval_ms),
            ("angle_transition_ms", self.angle_transition_ms),
            ("tree_spawn_interval_ms", self.tree_spawn_interval_ms),
        ] {
            if !(ms.is_finite() && ms >= 0.0) {
                return invalid(format!("{name} must be a non-negative duration, got {ms}"));
            }
        }
        if !(self.settle_period_secs > 0.0) {
            return invalid("settle_period_secs must be positive");
        }
        if !(self.animation_fraction > 0.0 && self.animation_fraction <= 1.0) {
            return invalid(format!(
                "animation_fraction must be in (0, 1], got {}",
                self.animation_fraction
            ));
        }
        if self.drift_range < 0.0 || !self.drift_range.is_finite() {
            return invalid(format!("drift_range must be non-negative, got {}", self.drift_range));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().expect("defaults should validate");
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            max_distance = 40.0
            forest_rotation = false
            cull_policy = { kind = "ceiling", max = 200 }
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.max_distance, 40.0);
        assert!(!cfg.forest_rotation);
        assert_eq!(cfg.cull_policy, CullPolicy::Ceiling { max: 200 });
        assert_eq!(cfg.growth_step, Config::default().growth_step);
        assert_eq!(cfg.initial_roots.len(), 2);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::from_toml_str("max_distance = \"far\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn validation_rejects_bad_values() {
        let bad = [
            Config {
                max_distance: 0.0,
                ..Config::default()
            },
            Config {
                branch_spawn_chance: 1.5,
                ..Config::default()
            },
            Config {
                child_length_min: 0.9,
                child_length_max: 0.6,
                ..Config::default()
            },
            Config {
                branch_cap_share: 0,
                ..Config::default()
            },
            Config {
                growth_step: 0.0,
                ..Config::default()
            },
            Config {
                animation_fraction: 0.0,
                ..Config::default()
            },
            Config {
                drift_range: -1.0,
                ..Config::default()
            },
        ];
        for cfg in bad {
            assert!(
                matches!(cfg.validate(), Err(ConfigError::Invalid(_))),
                "expected rejection for {cfg:?}"
            );
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::from_toml_file("/nonexistent/grove.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn cull_quota_follows_policy() {
        assert_eq!(CullPolicy::Never.quota(5, 100), 0);
        assert_eq!(CullPolicy::OnePerBirth.quota(5, 100), 5);
        assert_eq!(CullPolicy::OnePerBirth.quota(5, 3), 3);
        assert_eq!(CullPolicy::Ceiling { max: 98 }.quota(5, 100), 2);
        assert_eq!(CullPolicy::Ceiling { max: 200 }.quota(5, 100), 0);
    }
}
