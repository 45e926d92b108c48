use crate::types::{BirthOrder, ParticleIndex, TreeId};
use glam::Vec2;
use serde::Serialize;

/// A point sampled along a branch's growth path.
///
/// `index` is the particle's current slot in the population and changes on
/// compaction; `birth_order` is its stable identity.
///
/// Serializes flat, as a renderer reads it:
/// `{x, y, originalX, originalY, density, hue, index, phase, waveMagnitude,
/// movementScale, branchLevel, treeIndex, birthOrder}`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(into = "WireParticle")]
pub struct Particle {
    /// Current, possibly oscillated, position.
    pub pos: Vec2,
    /// Position at birth.
    pub origin: Vec2,
    pub density: f32,
    pub hue: f32,
    pub index: ParticleIndex,
    pub phase: f32,
    pub wave_magnitude: f32,
    pub movement_scale: f32,
    pub branch_level: u32,
    pub tree: TreeId,
    pub birth_order: BirthOrder,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireParticle {
    x: f32,
    y: f32,
    original_x: f32,
    original_y: f32,
    density: f32,
    hue: f32,
    index: ParticleIndex,
    phase: f32,
    wave_magnitude: f32,
    movement_scale: f32,
    branch_level: u32,
    tree_index: TreeId,
    birth_order: BirthOrder,
}

impl From<Particle> for WireParticle {
    fn from(p: Particle) -> Self {
        Self {
            x: p.pos.x,
            y: p.pos.y,
            original_x: p.origin.x,
            original_y: p.origin.y,
            density: p.density,
            hue: p.hue,
            index: p.index,
            phase: p.phase,
            wave_magnitude: p.wave_magnitude,
            movement_scale: p.movement_scale,
            branch_level: p.branch_level,
            tree_index: p.tree,
            birth_order: p.birth_order,
        }
    }
}

/// The part of a particle decided by the growth engine.
///
/// The population turns a sprout into a [`Particle`] by assigning its index
/// and birth order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprout {
    pub pos: Vec2,
    pub density: f32,
    pub hue: f32,
    pub phase: f32,
    pub wave_magnitude: f32,
    pub movement_scale: f32,
    pub branch_level: u32,
    pub tree: TreeId,
}

impl Particle {
    pub(crate) fn from_sprout(s: Sprout, index: ParticleIndex, birth_order: BirthOrder) -> Self {
        Self {
            pos: s.pos,
            origin: s.pos,
            density: s.density,
            hue: s.hue,
            index,
            phase: s.phase,
            wave_magnitude: s.wave_magnitude,
            movement_scale: s.movement_scale,
            branch_level: s.branch_level,
            tree: s.tree,
            birth_order,
        }
    }

    /// Deeper branches sway less, down to a fifth of the full amplitude.
    #[inline]
    pub fn wave_scale(&self) -> f32 {
        (1.0 - self.branch_level as f32 * 0.2).max(0.2)
    }

    /// Places the particle on its oscillation path around `rest` at
    /// `time` seconds.
    pub fn oscillate(&mut self, rest: Vec2, time: f32) {
        let t = (time + self.phase) * 2.0;
        let s = self.wave_scale();
        self.pos = Vec2::new(
            rest.x + t.sin() * self.wave_magnitude * s,
            rest.y + t.cos() * self.movement_scale * s,
        );
    }
}
