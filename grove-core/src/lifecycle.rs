//! Ownership of the particle population.
//!
//! Particles live in a dense vector ordered by birth order. `index` is the
//! slot in that vector and is only rewritten by [`Population::compact`];
//! `birth_order` is the stable handle used by the FIFO eviction queue.
//!
//! Removal is two-phase: [`Population::cull`] marks the oldest particles and
//! [`Population::compact`] drops every marked particle in a single pass,
//! so a tick that culls `n` particles costs `O(len)` instead of `O(n·len)`.

use crate::particle::{Particle, Sprout};
use crate::types::{BirthOrder, ParticleIndex};
use glam::Vec2;
use rand::Rng;
use std::collections::{BTreeSet, VecDeque};

#[derive(Debug, Default)]
pub struct Population {
    particles: Vec<Particle>,
    /// Rest position of each particle, parallel to `particles`.
    rest: Vec<Vec2>,
    active: BTreeSet<ParticleIndex>,
    eviction: VecDeque<BirthOrder>,
    doomed: BTreeSet<ParticleIndex>,
    next_birth: BirthOrder,
    /// Where the next partial animation pass starts in the active set.
    animate_cursor: usize,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every particle and restarts birth orders from zero.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn get(&self, index: ParticleIndex) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn rest_position(&self, index: ParticleIndex) -> Option<Vec2> {
        self.rest.get(index).copied()
    }

    pub fn is_active(&self, index: ParticleIndex) -> bool {
        self.active.contains(&index)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Birth orders awaiting eviction, oldest first.
    pub fn eviction_queue(&self) -> impl Iterator<Item = BirthOrder> + '_ {
        self.eviction.iter().copied()
    }

    /// Birth order the next allocated particle will receive.
    pub fn next_birth_order(&self) -> BirthOrder {
        self.next_birth
    }

    /// Finds the current slot of the particle with the given birth order.
    ///
    /// Particles are kept sorted by birth order, so this is a binary search.
    pub fn position_of(&self, birth_order: BirthOrder) -> Option<ParticleIndex> {
        self.particles
            .binary_search_by_key(&birth_order, |p| p.birth_order)
            .ok()
    }

    /// Appends a new particle built from `sprout`.
    ///
    /// The particle gets the next birth order, an index equal to the current
    /// population size, a rest position equal to its birth position, and
    /// starts out active. Its birth order joins the back of the eviction
    /// queue.
    pub fn allocate(&mut self, sprout: Sprout) -> &Particle {
        let index = self.particles.len();
        let birth_order = self.next_birth;
        self.next_birth += 1;

        let particle = Particle::from_sprout(sprout, index, birth_order);
        self.rest.push(particle.origin);
        self.particles.push(particle);
        self.active.insert(index);
        self.eviction.push_back(birth_order);

        &self.particles[index]
    }

    /// Moves active particles along their oscillation paths.
    ///
    /// With `fraction < 1` only that share of the active set moves, taken
    /// round-robin so successive calls cover every active particle. Active
    /// indices with no matching particle or rest position are skipped.
    pub fn animate(&mut self, time: f32, fraction: f32) {
        let active = self.active.len();
        if active == 0 {
            return;
        }
        let count = if fraction >= 1.0 {
            active
        } else {
            (active as f32 * fraction.max(0.0)) as usize
        };
        if count == 0 {
            return;
        }

        let start = self.animate_cursor % active;
        for &i in self.active.iter().cycle().skip(start).take(count) {
            let (Some(p), Some(&rest)) = (self.particles.get_mut(i), self.rest.get(i)) else {
                continue;
            };
            p.oscillate(rest, time);
        }
        self.animate_cursor = (start + count) % active;
    }

    /// Freezes each active particle with probability `chance`.
    ///
    /// A frozen particle keeps its current position and stays in the
    /// population until culled.
    ///
    /// ### Returns
    /// The number of particles frozen.
    pub fn settle(&mut self, chance: f32, rng: &mut impl Rng) -> usize {
        let before = self.active.len();
        self.active.retain(|_| rng.random::<f32>() >= chance);
        before - self.active.len()
    }

    /// Marks the `n` oldest particles for removal.
    ///
    /// Pops `n` birth orders off the eviction queue; those that no longer
    /// match a live particle are skipped. Nothing is removed until
    /// [`Population::compact`] runs.
    ///
    /// ### Returns
    /// The number of particles newly marked.
    pub fn cull(&mut self, n: usize) -> usize {
        let mut marked = 0;
        for _ in 0..n {
            let Some(birth_order) = self.eviction.pop_front() else {
                break;
            };
            if let Some(i) = self.position_of(birth_order)
                && self.doomed.insert(i)
            {
                marked += 1;
            }
        }
        marked
    }

    /// Removes every marked particle and reassigns dense indices.
    ///
    /// Survivors are re-sorted by birth order, get `index` equal to their new
    /// slot, keep their active state, and the eviction queue is rebuilt from
    /// their birth orders in ascending order.
    ///
    /// ### Returns
    /// The number of particles removed.
    pub fn compact(&mut self) -> usize {
        if self.doomed.is_empty() {
            return 0;
        }
        let doomed = std::mem::take(&mut self.doomed);
        let was_active = std::mem::take(&mut self.active);

        let mut survivors: Vec<(Particle, Vec2, bool)> = self
            .particles
            .drain(..)
            .zip(self.rest.drain(..))
            .enumerate()
            .filter(|(i, _)| !doomed.contains(i))
            .map(|(i, (p, rest))| (p, rest, was_active.contains(&i)))
            .collect();
        let removed = doomed.len();

        survivors.sort_by_key(|(p, ..)| p.birth_order);

        for (slot, (mut p, rest, active)) in survivors.into_iter().enumerate() {
            p.index = slot;
            self.particles.push(p);
            self.rest.push(rest);
            if active {
                self.active.insert(slot);
            }
        }

        self.eviction = self.particles.iter().map(|p| p.birth_order).collect();
        removed
    }
}
