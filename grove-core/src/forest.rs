//! Root records and periodic root rotation.
//!
//! Every `tree_spawn_interval_ms` the forest plants a new root on a random
//! live particle and retires the current one. Retired roots stop growing,
//! but the particles they produced stay in the population.

use crate::branch::{Branch, BranchSet};
use crate::config::Config;
use crate::lifecycle::Population;
use crate::types::TreeId;
use crate::viewport::Steering;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::FRAC_PI_2;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeRoot {
    pub origin: Vec2,
    pub angle: f32,
    pub active: bool,
}

#[derive(Debug, Default)]
pub struct Forest {
    roots: Vec<TreeRoot>,
    current: Option<TreeId>,
    /// Time of the last rotation. Unset until the first tick after a reset.
    last_rotation: Option<f64>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn roots(&self) -> &[TreeRoot] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// The root most recently made current.
    pub fn current(&self) -> Option<TreeId> {
        self.current
    }

    pub fn is_active(&self, tree: TreeId) -> bool {
        self.roots.get(tree).is_some_and(|r| r.active)
    }

    pub fn active_count(&self) -> usize {
        self.roots.iter().filter(|r| r.active).count()
    }

    /// Records a new active root and plants its zero-level branch.
    ///
    /// The heading is corrected to stay in view before anything is stored.
    /// The root branch is `root_length_ratio` of the canvas height long.
    pub fn plant(
        &mut self,
        origin: Vec2,
        angle: f32,
        branches: &mut BranchSet,
        steering: &Steering,
        cfg: &Config,
        rng: &mut impl Rng,
    ) -> TreeId {
        let angle = steering.correct(origin, angle, rng);
        let tree = self.roots.len();
        self.roots.push(TreeRoot {
            origin,
            angle,
            active: true,
        });
        branches.plant(Branch::new_root(
            origin,
            angle,
            steering.viewport.height * cfg.root_length_ratio,
            cfg.root_width,
            tree,
        ));
        if self.current.is_none() {
            self.current = Some(tree);
        }
        tree
    }

    /// Plants a new root if the rotation interval has elapsed.
    ///
    /// The new root sits on a uniformly random live particle (clamped into
    /// the canvas) and takes the heading of the branch whose start point is
    /// nearest. The previously current root is deactivated.
    ///
    /// ### Returns
    /// The new root's id, or `None` if no rotation happened.
    pub fn rotate(
        &mut self,
        now: f64,
        population: &Population,
        branches: &mut BranchSet,
        steering: &Steering,
        cfg: &Config,
        rng: &mut impl Rng,
    ) -> Option<TreeId> {
        let last = *self.last_rotation.get_or_insert(now);
        if now - last <= cfg.tree_spawn_interval_ms || population.is_empty() {
            return None;
        }

        let pick = rng.random_range(0..population.len());
        let origin = steering.viewport.clamp(population.get(pick)?.pos);
        let angle = branches
            .nearest(origin)
            .and_then(|(id, _)| branches.get(id))
            .map_or(FRAC_PI_2, |b| b.angle);

        if let Some(root) = self.current.and_then(|t| self.roots.get_mut(t)) {
            root.active = false;
        }
        let tree = self.plant(origin, angle, branches, steering, cfg, rng);
        self.current = Some(tree);
        self.last_rotation = Some(now);

        debug!(tree, x = origin.x, y = origin.y, angle, "planted new root");
        Some(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Sprout;
    use crate::viewport::Viewport;
    use rand::{SeedableRng, rngs::StdRng};

    fn steering() -> Steering {
        Steering::from_config(Viewport::new(800.0, 600.0), &Config::default())
    }

    fn populated(points: &[Vec2]) -> Population {
        let mut pop = Population::new();
        for &pos in points {
            pop.allocate(Sprout {
                pos,
                density: 1.0,
                hue: 200.0,
                phase: 0.0,
                wave_magnitude: 2.0,
                movement_scale: 2.0,
                branch_level: 0,
                tree: 0,
            });
        }
        pop
    }

    #[test]
    fn plant_records_root_and_branch() {
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut forest = Forest::new();
        let mut branches = BranchSet::new();

        let tree = forest.plant(
            Vec2::new(400.0, 570.0),
            FRAC_PI_2,
            &mut branches,
            &steering(),
            &cfg,
            &mut rng,
        );

        assert_eq!(tree, 0);
        assert_eq!(forest.current(), Some(0));
        assert!(forest.is_active(0));
        let root = branches.get(0).unwrap();
        assert_eq!(root.tree, 0);
        assert_eq!(root.level, 0);
        assert!((root.length - 240.0).abs() < 1e-4);
        assert_eq!(root.width, cfg.root_width);
    }

    #[test]
    fn rotation_waits_for_interval() {
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut forest = Forest::new();
        let mut branches = BranchSet::new();
        let pop = populated(&[Vec2::new(400.0, 300.0)]);
        forest.plant(Vec2::new(400.0, 570.0), FRAC_PI_2, &mut branches, &steering(), &cfg, &mut rng);

        assert_eq!(forest.rotate(1000.0, &pop, &mut branches, &steering(), &cfg, &mut rng), None);
        assert_eq!(forest.rotate(4000.0, &pop, &mut branches, &steering(), &cfg, &mut rng), None);
        assert_eq!(
            forest.rotate(4700.0, &pop, &mut branches, &steering(), &cfg, &mut rng),
            Some(1)
        );
    }

    #[test]
    fn rotation_needs_particles() {
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut forest = Forest::new();
        let mut branches = BranchSet::new();
        let empty = Population::new();

        forest.rotate(0.0, &empty, &mut branches, &steering(), &cfg, &mut rng);
        assert_eq!(forest.rotate(10_000.0, &empty, &mut branches, &steering(), &cfg, &mut rng), None);
        assert!(forest.is_empty());
    }

    #[test]
    fn rotation_retires_current_root_and_inherits_nearest_heading() {
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(12);
        let mut forest = Forest::new();
        let mut branches = BranchSet::new();
        let steer = steering();
        forest.plant(Vec2::new(400.0, 570.0), FRAC_PI_2, &mut branches, &steer, &cfg, &mut rng);
        forest.plant(Vec2::new(400.0, 30.0), FRAC_PI_2 * 3.0, &mut branches, &steer, &cfg, &mut rng);

        // One particle right next to the bottom root.
        let pop = populated(&[Vec2::new(400.0, 500.0)]);
        forest.rotate(0.0, &pop, &mut branches, &steer, &cfg, &mut rng);
        let tree = forest
            .rotate(cfg.tree_spawn_interval_ms + 1.0, &pop, &mut branches, &steer, &cfg, &mut rng)
            .expect("rotation due");

        assert_eq!(tree, 2);
        assert!(!forest.is_active(0), "previous current root retires");
        assert!(forest.is_active(1), "other roots keep growing");
        assert!(forest.is_active(2));
        assert_eq!(forest.current(), Some(2));

        let root = forest.roots()[2];
        assert_eq!(root.origin, Vec2::new(400.0, 500.0));
        // Straight up from (400, 500) stays inside an 800x600 canvas.
        assert_eq!(root.angle, FRAC_PI_2);
        assert_eq!(branches.branches_in_tree(2), 1);
    }

    #[test]
    fn rotated_roots_are_clamped_into_view() {
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut forest = Forest::new();
        let mut branches = BranchSet::new();
        let steer = steering();
        forest.plant(Vec2::new(400.0, 570.0), FRAC_PI_2, &mut branches, &steer, &cfg, &mut rng);

        let pop = populated(&[Vec2::new(-50.0, 700.0)]);
        forest.rotate(0.0, &pop, &mut branches, &steer, &cfg, &mut rng);
        forest.rotate(5000.0, &pop, &mut branches, &steer, &cfg, &mut rng);

        assert_eq!(forest.roots()[1].origin, Vec2::new(0.0, 600.0));
    }
}
