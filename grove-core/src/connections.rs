//! Proximity connections between particles.
//!
//! [`connect`] walks every occupied cell of a [`SpatialGrid`] and compares
//! each particle against the 3×3 neighborhood of its cell, keeping a pair
//! only when the neighbor's index is greater. Each unordered pair is
//! therefore examined exactly once, and the cost is proportional to the
//! number of particles times the average neighborhood occupancy instead of
//! the square of the population.
//!
//! [`all_pairs`] is the quadratic reference used to check it.

use crate::grid::SpatialGrid;
use crate::particle::Particle;
use crate::types::ParticleIndex;
use crate::viewport::Viewport;
use serde::Serialize;

/// An unordered pair of particles closer than the connection distance.
///
/// Always `a < b`. The endpoints index into the particle slice the
/// connections were generated from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub a: ParticleIndex,
    pub b: ParticleIndex,
    pub dist_sq: f32,
}

impl Connection {
    #[inline]
    pub fn distance(&self) -> f32 {
        self.dist_sq.sqrt()
    }

    /// `1` for coincident endpoints, falling to `0` at `max_distance`.
    #[inline]
    pub fn closeness(&self, max_distance: f32) -> f32 {
        (1.0 - self.distance() / max_distance).clamp(0.0, 1.0)
    }
}

/// Generates every pair of gridded particles strictly closer than
/// `max_distance`, sorted by `(a, b)`.
///
/// `grid` must have been rebuilt from `particles` with a cell size of at
/// least `max_distance`.
pub fn connect(particles: &[Particle], grid: &SpatialGrid, max_distance: f32) -> Vec<Connection> {
    debug_assert!(grid.cell_size() >= max_distance);
    let max_sq = max_distance * max_distance;
    let mut out = Vec::new();

    for (cell, bucket) in grid.occupied_cells() {
        for &a in bucket {
            let Some(p) = particles.get(a) else {
                continue;
            };
            for b in grid.neighborhood(cell) {
                if b <= a {
                    continue;
                }
                let Some(q) = particles.get(b) else {
                    continue;
                };
                let dist_sq = p.pos.distance_squared(q.pos);
                if dist_sq < max_sq {
                    out.push(Connection { a, b, dist_sq });
                }
            }
        }
    }

    out.sort_unstable_by_key(|c| (c.a, c.b));
    out
}

/// Quadratic reference: compares every pair of particles inside `bounds`.
pub fn all_pairs(particles: &[Particle], bounds: &Viewport, max_distance: f32) -> Vec<Connection> {
    let max_sq = max_distance * max_distance;
    let mut out = Vec::new();
    for (a, p) in particles.iter().enumerate() {
        if !bounds.contains(p.pos) {
            continue;
        }
        for (b, q) in particles.iter().enumerate().skip(a + 1) {
            if !bounds.contains(q.pos) {
                continue;
            }
            let dist_sq = p.pos.distance_squared(q.pos);
            if dist_sq < max_sq {
                out.push(Connection { a, b, dist_sq });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Sprout;
    use glam::Vec2;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    fn particles_at(points: impl IntoIterator<Item = Vec2>) -> Vec<Particle> {
        points
            .into_iter()
            .enumerate()
            .map(|(i, pos)| {
                Particle::from_sprout(
                    Sprout {
                        pos,
                        density: 1.0,
                        hue: 200.0,
                        phase: 0.0,
                        wave_magnitude: 0.0,
                        movement_scale: 0.0,
                        branch_level: 0,
                        tree: 0,
                    },
                    i,
                    i as u64,
                )
            })
            .collect()
    }

    fn gridded(particles: &[Particle], bounds: &Viewport, max_distance: f32) -> Vec<Connection> {
        let mut grid = SpatialGrid::new(max_distance);
        grid.rebuild(particles, bounds);
        connect(particles, &grid, max_distance)
    }

    #[test]
    fn grid_matches_brute_force_on_random_populations() {
        let bounds = Viewport::new(100.0, 100.0);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            // Some points fall outside the canvas on purpose.
            let particles = particles_at((0..50).map(|_| {
                Vec2::new(rng.random_range(-10.0..110.0), rng.random_range(-10.0..110.0))
            }));

            let grid = gridded(&particles, &bounds, 20.0);
            let reference = all_pairs(&particles, &bounds, 20.0);
            assert_eq!(grid, reference, "mismatch for seed {seed}");
        }
    }

    #[test]
    fn no_self_or_duplicate_pairs() {
        let bounds = Viewport::new(60.0, 60.0);
        let mut rng = StdRng::seed_from_u64(42);
        // Dense cluster so most pairs connect.
        let particles = particles_at(
            (0..80).map(|_| Vec2::new(rng.random_range(0.0..60.0), rng.random_range(0.0..60.0))),
        );
        let connections = gridded(&particles, &bounds, 15.0);
        assert!(!connections.is_empty());

        let mut seen = HashSet::new();
        for c in &connections {
            assert!(c.a < c.b, "unordered or self pair {c:?}");
            assert!(seen.insert((c.a, c.b)), "duplicate pair {c:?}");
        }
    }

    #[test]
    fn distance_threshold_is_strict() {
        let bounds = Viewport::new(100.0, 100.0);
        let particles = particles_at([
            Vec2::new(10.0, 10.0),
            Vec2::new(20.0, 10.0), // exactly max_distance from the first
            Vec2::new(29.0, 10.0), // 9 from the second
        ]);
        let connections = gridded(&particles, &bounds, 10.0);
        let pairs: Vec<_> = connections.iter().map(|c| (c.a, c.b)).collect();
        assert_eq!(pairs, vec![(1, 2)]);
    }

    #[test]
    fn pairs_across_cell_boundaries_are_found() {
        let bounds = Viewport::new(100.0, 100.0);
        let particles = particles_at([Vec2::new(9.5, 9.5), Vec2::new(10.5, 10.5)]);
        let connections = gridded(&particles, &bounds, 10.0);
        assert_eq!(connections.len(), 1);
        assert!((connections[0].dist_sq - 2.0).abs() < 1e-4);
    }

    #[test]
    fn off_canvas_particles_never_connect() {
        let bounds = Viewport::new(100.0, 100.0);
        let particles = particles_at([Vec2::new(1.0, 1.0), Vec2::new(-1.0, 1.0)]);
        assert!(gridded(&particles, &bounds, 10.0).is_empty());
    }

    #[test]
    fn empty_population_has_no_connections() {
        let bounds = Viewport::new(100.0, 100.0);
        assert!(gridded(&[], &bounds, 10.0).is_empty());
    }

    #[test]
    fn closeness_falls_off_linearly() {
        let c = Connection {
            a: 0,
            b: 1,
            dist_sq: 25.0,
        };
        assert!((c.closeness(10.0) - 0.5).abs() < 1e-6);
        assert_eq!(c.closeness(5.0), 0.0);
    }
}
