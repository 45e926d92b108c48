//! The per-tick simulation pipeline.
//!
//! A tick runs these phases in order:
//! 1. [`Simulation::drift_phase`]: advance the drift and re-aim branches.
//! 2. [`Simulation::rotation_phase`]: maybe plant a new root.
//! 3. [`Simulation::growth_phase`]: grow branches, allocate their
//!    particles, then cull and compact in one batch.
//! 4. [`Simulation::animation_phase`]: oscillate and settle particles.
//! 5. [`Simulation::connection_phase`]: rebuild the grid and connect
//!    nearby particles.
//!
//! All mutable state lives in one [`Simulation`] value. [`Simulation::reset`]
//! is the only way back to a fresh state.

use crate::branch::BranchSet;
use crate::config::Config;
use crate::connections::{self, Connection};
use crate::drift::Drift;
use crate::forest::Forest;
use crate::grid::SpatialGrid;
use crate::lifecycle::Population;
use crate::error::ConfigError;
use crate::protocol::{Command, Frame, Reply, decode_command, encode_reply};
use crate::viewport::{Steering, Viewport};
use glam::Vec2;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, trace, warn};

/// Counts describing the current simulation state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub particles: usize,
    pub active_particles: usize,
    pub branches: usize,
    pub growing_branches: usize,
    pub roots: usize,
    pub active_roots: usize,
    pub culling: bool,
}

/// A complete, independent growth simulation.
///
/// Generic over the random source so tests can inject a seeded generator.
#[derive(Debug)]
pub struct Simulation<R = StdRng> {
    cfg: Config,
    viewport: Viewport,
    rng: R,
    drift: Drift,
    forest: Forest,
    branches: BranchSet,
    population: Population,
    grid: SpatialGrid,
    culling: bool,
    last_growth: Option<f64>,
}

impl Simulation<StdRng> {
    /// Creates a simulation seeded from the operating system.
    pub fn new(cfg: Config, width: f32, height: f32) -> Result<Self, ConfigError> {
        Self::with_rng(cfg, width, height, StdRng::from_os_rng())
    }
}

impl<R: Rng> Simulation<R> {
    /// Creates a simulation drawing all randomness from `rng` and plants the
    /// configured initial roots.
    ///
    /// ### Returns
    /// `ConfigError::Invalid` if `cfg` fails [`Config::validate`].
    pub fn with_rng(cfg: Config, width: f32, height: f32, rng: R) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let grid = SpatialGrid::new(cfg.max_distance);
        let mut sim = Self {
            cfg,
            viewport: Viewport::new(width, height),
            rng,
            drift: Drift::default(),
            forest: Forest::new(),
            branches: BranchSet::new(),
            population: Population::new(),
            grid,
            culling: false,
            last_growth: None,
        };
        sim.reset(width, height);
        Ok(sim)
    }

    /// Discards all particles, branches and roots and replants the initial
    /// roots on a canvas of the given size.
    pub fn reset(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
        self.drift = Drift::default();
        self.forest.clear();
        self.branches.clear();
        self.population.clear();
        self.grid.set_cell_size(self.cfg.max_distance);
        self.culling = self.cfg.cull_from_start;
        self.last_growth = None;

        let steering = self.steering();
        for seed in &self.cfg.initial_roots {
            let origin = Vec2::new(width * seed.x_frac, height * seed.y_frac);
            self.forest.plant(
                origin,
                seed.angle,
                &mut self.branches,
                &steering,
                &self.cfg,
                &mut self.rng,
            );
        }
        debug!(width, height, roots = self.forest.len(), "simulation reset");
    }

    /// Applies a host command.
    ///
    /// ### Returns
    /// The frame produced by an `update`, or `None` for a reset.
    pub fn handle(&mut self, cmd: Command) -> Option<Frame> {
        match cmd {
            Command::Init { width, height } | Command::Resize { width, height } => {
                self.reset(width, height);
                None
            }
            Command::Update { timestamp } => Some(self.tick(timestamp)),
        }
    }

    /// Decodes and applies a JSON command. Garbled commands are logged and
    /// ignored.
    ///
    /// ### Returns
    /// The encoded `draw` reply for an `update`, otherwise `None`.
    pub fn handle_json(&mut self, text: &str) -> Option<String> {
        let cmd = decode_command(text)
            .inspect_err(|e| warn!(error = %e, "ignoring command"))
            .ok()?;
        let reply = Reply::Draw(self.handle(cmd)?);
        encode_reply(&reply)
            .inspect_err(|e| warn!(error = %e, "dropping reply"))
            .ok()
    }

    /// Runs one full tick at `timestamp` milliseconds.
    pub fn tick(&mut self, timestamp: f64) -> Frame {
        self.drift_phase(timestamp);
        self.rotation_phase(timestamp);
        self.growth_phase(timestamp);
        self.animation_phase(timestamp);
        let connections = self.connection_phase();

        Frame {
            particles: self.population.particles().to_vec(),
            connections,
            max_distance: self.cfg.max_distance,
        }
    }

    /// Advances the drift and recomputes every branch heading.
    pub fn drift_phase(&mut self, now: f64) {
        if self.drift.advance(now, &self.cfg, &mut self.rng) {
            trace!(target_offset = self.drift.target(), "drift retargeted");
        }
        let offset = self.drift.offset(now, &self.cfg);
        let steering = self.steering();
        self.branches.apply_drift(offset, &steering, &mut self.rng);
    }

    /// Plants a new root when one is due and turns culling on.
    pub fn rotation_phase(&mut self, now: f64) {
        if !self.cfg.forest_rotation {
            return;
        }
        let steering = self.steering();
        let planted = self.forest.rotate(
            now,
            &self.population,
            &mut self.branches,
            &steering,
            &self.cfg,
            &mut self.rng,
        );
        if planted.is_some() && !self.culling {
            self.culling = true;
            debug!(population = self.population.len(), "culling enabled");
        }
    }

    /// Grows active trees and admits their particles, culling one batch if
    /// culling is on. Skipped until `growth_interval_ms` has passed since the
    /// previous growth tick.
    pub fn growth_phase(&mut self, now: f64) {
        if let Some(last) = self.last_growth
            && now - last <= self.cfg.growth_interval_ms
        {
            return;
        }
        self.last_growth = Some(now);

        let offset = self.drift.offset(now, &self.cfg);
        let steering = self.steering();
        let forest = &self.forest;
        let sprouts = self.branches.grow(
            |tree| forest.is_active(tree),
            offset,
            &steering,
            &self.cfg,
            &mut self.rng,
        );

        let births = sprouts.len();
        for sprout in sprouts {
            self.population.allocate(sprout);
        }

        let mut culled = 0;
        if self.culling {
            let quota = self.cfg.cull_policy.quota(births, self.population.len());
            if quota > 0 {
                self.population.cull(quota);
                culled = self.population.compact();
            }
        }
        trace!(births, culled, population = self.population.len(), "growth tick");
    }

    /// Oscillates active particles and, inside the settle window, freezes
    /// some of them.
    pub fn animation_phase(&mut self, now: f64) {
        let time = (now * 0.001) as f32;
        self.population.animate(time, self.cfg.animation_fraction);

        if time.rem_euclid(self.cfg.settle_period_secs) < self.cfg.settle_window_secs {
            let frozen = self.population.settle(self.cfg.settle_chance, &mut self.rng);
            if frozen > 0 {
                trace!(frozen, "particles settled");
            }
        }
    }

    /// Rebuilds the spatial grid and returns every connection.
    pub fn connection_phase(&mut self) -> Vec<Connection> {
        let particles = self.population.particles();
        self.grid.rebuild(particles, &self.viewport);
        connections::connect(particles, &self.grid, self.cfg.max_distance)
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn branches(&self) -> &BranchSet {
        &self.branches
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn culling_enabled(&self) -> bool {
        self.culling
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            particles: self.population.len(),
            active_particles: self.population.active_count(),
            branches: self.branches.len(),
            growing_branches: self.branches.growing_count(),
            roots: self.forest.len(),
            active_roots: self.forest.active_count(),
            culling: self.culling,
        }
    }

    fn steering(&self) -> Steering {
        Steering::from_config(self.viewport, &self.cfg)
    }
}
