use crate::config::Config;
use crate::particle::Sprout;
use crate::types::{BranchId, TreeId};
use crate::viewport::{Steering, heading};
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// Progress within this distance of completion snaps to `1.0`, so a branch
/// finishes after `1 / growth_step` ticks despite float accumulation.
const PROGRESS_EPSILON: f32 = 1e-4;

/// A growing line segment of one tree's skeleton.
///
/// Topology (`parent`, `level`, `tree`) is fixed at creation; `angle` is
/// recomputed from `base_angle` every tick and `progress` only increases.
#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    pub start: Vec2,
    pub base_angle: f32,
    pub angle: f32,
    pub length: f32,
    pub width: f32,
    /// Fraction of `length` grown so far, in `[0, 1]`.
    pub progress: f32,
    pub parent: Option<BranchId>,
    pub level: u32,
    pub tree: TreeId,
}

impl Branch {
    pub fn new_root(start: Vec2, angle: f32, length: f32, width: f32, tree: TreeId) -> Self {
        Self {
            start,
            base_angle: angle,
            angle,
            length,
            width,
            progress: 0.0,
            parent: None,
            level: 0,
            tree,
        }
    }

    #[inline]
    pub fn is_growing(&self) -> bool {
        self.progress < 1.0
    }

    /// Current growth tip.
    #[inline]
    pub fn tip(&self) -> Vec2 {
        self.start + heading(self.angle) * (self.length * self.progress)
    }

    /// Advances `progress` by `step`, clamped to `1`.
    pub fn advance(&mut self, step: f32) {
        let next = self.progress + step;
        self.progress = if next >= 1.0 - PROGRESS_EPSILON {
            1.0
        } else {
            next
        };
    }
}

/// All branches of every tree in the forest.
///
/// Finished branches are kept so children and the forest spawner can still
/// look up their geometry.
#[derive(Debug, Default)]
pub struct BranchSet {
    branches: Vec<Branch>,
    /// Branch count per tree, indexed by `TreeId`.
    per_tree: Vec<usize>,
}

impl BranchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.branches.clear();
        self.per_tree.clear();
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn get(&self, id: BranchId) -> Option<&Branch> {
        self.branches.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Branch> {
        self.branches.iter()
    }

    pub fn growing_count(&self) -> usize {
        self.branches.iter().filter(|b| b.is_growing()).count()
    }

    pub fn branches_in_tree(&self, tree: TreeId) -> usize {
        self.per_tree.get(tree).copied().unwrap_or(0)
    }

    /// Adds a branch and returns its id.
    pub fn plant(&mut self, branch: Branch) -> BranchId {
        let id = self.branches.len();
        if self.per_tree.len() <= branch.tree {
            self.per_tree.resize(branch.tree + 1, 0);
        }
        self.per_tree[branch.tree] += 1;
        self.branches.push(branch);
        id
    }

    /// Finds the branch whose start point is closest to `pos`.
    ///
    /// ### Returns
    /// The branch id and squared distance, or `None` if there are no
    /// branches.
    pub fn nearest(&self, pos: Vec2) -> Option<(BranchId, f32)> {
        let mut best = None;
        let mut best_d2 = f32::MAX;
        for (id, b) in self.branches.iter().enumerate() {
            let d2 = (b.start - pos).length_squared();
            if d2 < best_d2 {
                best_d2 = d2;
                best = Some(id);
            }
        }
        best.map(|id| (id, best_d2))
    }

    /// Re-aims every branch at `base_angle + offset`, then applies the
    /// in-view correction from its start point.
    pub fn apply_drift(&mut self, offset: f32, steering: &Steering, rng: &mut impl Rng) {
        for b in &mut self.branches {
            b.angle = steering.correct(b.start, b.base_angle + offset, rng);
        }
    }

    /// Runs one growth tick.
    ///
    /// Every growing branch of an active tree advances by
    /// `cfg.growth_step` and may spawn one child. Then every branch that
    /// advanced, and every child planted this tick, emits one sprout at its
    /// tip. A new child emits at its start point and starts advancing on the
    /// next tick.
    ///
    /// ### Parameters
    /// - `is_active` - Whether a tree is still growing.
    /// - `drift` - Current global heading offset, applied to new children.
    /// - `steering` - In-view correction for new children.
    /// - `cfg` - Growth constants.
    /// - `rng` - Source for spawn decisions and sprout traits.
    ///
    /// ### Returns
    /// The sprouts emitted this tick, in branch order.
    pub fn grow(
        &mut self,
        is_active: impl Fn(TreeId) -> bool,
        drift: f32,
        steering: &Steering,
        cfg: &Config,
        rng: &mut impl Rng,
    ) -> Vec<Sprout> {
        let existing = self.branches.len();
        let mut advanced = vec![false; existing];

        for id in 0..existing {
            let branch = &mut self.branches[id];
            if !branch.is_growing() || !is_active(branch.tree) {
                continue;
            }
            branch.advance(cfg.growth_step);
            advanced[id] = true;
            let branch = branch.clone();

            if self.may_spawn(&branch, cfg) && rng.random::<f32>() < cfg.branch_spawn_chance {
                let child = spawn_child(&branch, id, drift, steering, cfg, rng);
                self.plant(child);
            }
        }

        // Children planted above sit past `existing`.
        let mut sprouts = Vec::with_capacity(self.branches.len());
        for (id, branch) in self.branches.iter().enumerate() {
            if advanced.get(id).copied().unwrap_or(true) {
                sprouts.push(sprout_at_tip(branch, rng));
            }
        }
        sprouts
    }

    fn may_spawn(&self, branch: &Branch, cfg: &Config) -> bool {
        branch.level < cfg.max_branch_level
            && branch.progress > cfg.branch_spawn_min_progress
            && branch.is_growing()
            && self.branches_in_tree(branch.tree) * cfg.branch_cap_share < cfg.max_branches
    }
}

/// Builds a child starting at the parent's current tip.
///
/// The child's heading is the parent's base angle plus a random spread of
/// width `1.8 + 0.8·level`, then the drift offset and in-view correction.
fn spawn_child(
    parent: &Branch,
    parent_id: BranchId,
    drift: f32,
    steering: &Steering,
    cfg: &Config,
    rng: &mut impl Rng,
) -> Branch {
    let spread_width = 1.8 + parent.level as f32 * 0.8;
    let spread = (rng.random::<f32>() - 0.5) * spread_width;
    let base_angle = parent.base_angle + spread;
    let start = parent.tip();
    let angle = steering.correct(start, base_angle + drift, rng);

    Branch {
        start,
        base_angle,
        angle,
        length: parent.length * rng.random_range(cfg.child_length_min..=cfg.child_length_max),
        width: parent.width * cfg.child_width_ratio,
        progress: 0.0,
        parent: Some(parent_id),
        level: parent.level + 1,
        tree: parent.tree,
    }
}

/// A sprout at the branch tip with randomly drawn oscillation traits.
fn sprout_at_tip(branch: &Branch, rng: &mut impl Rng) -> Sprout {
    Sprout {
        pos: branch.tip(),
        density: (1.0 - branch.progress * 0.5).max(0.3),
        hue: 200.0 + rng.random::<f32>() * 160.0,
        phase: rng.random::<f32>() * TAU,
        wave_magnitude: 2.0 + rng.random::<f32>() * 2.0,
        movement_scale: 2.0 + rng.random::<f32>() * 2.0,
        branch_level: branch.level,
        tree: branch.tree,
    }
}
