use crate::particle::Particle;
use crate::types::ParticleIndex;
use crate::viewport::Viewport;
use glam::{IVec2, Vec2};
use std::collections::HashMap;

/// Offsets of the 3×3 neighborhood around a cell.
const NEIGHBORHOOD: [IVec2; 9] = [
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
    IVec2::new(-1, 0),
    IVec2::new(0, 0),
    IVec2::new(1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
    IVec2::new(1, 1),
];

/// Uniform grid bucketing particle indices by cell coordinate.
///
/// With `cell_size` equal to the connection distance, any two particles
/// closer than `cell_size` sit in the same or adjacent cells, so the 3×3
/// neighborhood of a particle's cell holds all of its candidate neighbors.
///
/// The grid is rebuilt from scratch every frame. Bucket allocations are
/// reused between rebuilds.
#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<IVec2, Vec<ParticleIndex>>,
    indexed: usize,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            indexed: 0,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Changes the cell size. Takes effect on the next rebuild.
    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = cell_size;
        self.cells.clear();
        self.indexed = 0;
    }

    /// Cell coordinate `(floor(x / cell), floor(y / cell))` of a position.
    #[inline]
    pub fn cell_of(&self, pos: Vec2) -> IVec2 {
        (pos / self.cell_size).floor().as_ivec2()
    }

    /// Re-buckets every particle inside `bounds`.
    ///
    /// Particles outside the canvas are left out and can never be returned
    /// by a query.
    pub fn rebuild(&mut self, particles: &[Particle], bounds: &Viewport) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.indexed = 0;

        for (i, p) in particles.iter().enumerate() {
            if !bounds.contains(p.pos) {
                continue;
            }
            let cell = self.cell_of(p.pos);
            self.cells.entry(cell).or_default().push(i);
            self.indexed += 1;
        }
    }

    /// Number of particles bucketed by the last rebuild.
    pub fn indexed_count(&self) -> usize {
        self.indexed
    }

    /// Particle indices stored in a single cell.
    pub fn bucket(&self, cell: IVec2) -> &[ParticleIndex] {
        match self.cells.get(&cell) {
            Some(bucket) => bucket,
            None => &[],
        }
    }

    /// Non-empty cells and their particle indices.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (IVec2, &[ParticleIndex])> + '_ {
        self.cells
            .iter()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(&cell, bucket)| (cell, bucket.as_slice()))
    }

    /// Particle indices in the 3×3 block of cells centered on `cell`.
    pub fn neighborhood(&self, cell: IVec2) -> impl Iterator<Item = ParticleIndex> + '_ {
        NEIGHBORHOOD
            .into_iter()
            .flat_map(move |offset| self.bucket(cell + offset).iter().copied())
    }

    /// Candidate neighbors of a position: everything in the 3×3 block
    /// around its cell.
    pub fn candidates_near(&self, pos: Vec2) -> impl Iterator<Item = ParticleIndex> + '_ {
        self.neighborhood(self.cell_of(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Sprout;

    fn particles_at(points: &[Vec2]) -> Vec<Particle> {
        points
            .iter()
            .enumerate()
            .map(|(i, &pos)| {
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

    #[test]
    fn cell_of_uses_floor_division() {
        let grid = SpatialGrid::new(10.0);
        assert_eq!(grid.cell_of(Vec2::new(0.0, 0.0)), IVec2::new(0, 0));
        assert_eq!(grid.cell_of(Vec2::new(9.99, 10.0)), IVec2::new(0, 1));
        assert_eq!(grid.cell_of(Vec2::new(-0.5, 25.0)), IVec2::new(-1, 2));
    }

    #[test]
    fn rebuild_excludes_particles_outside_bounds() {
        let particles = particles_at(&[
            Vec2::new(5.0, 5.0),
            Vec2::new(-1.0, 5.0),
            Vec2::new(5.0, 101.0),
            Vec2::new(95.0, 95.0),
        ]);
        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(&particles, &Viewport::new(100.0, 100.0));

        assert_eq!(grid.indexed_count(), 2);
        assert_eq!(grid.bucket(IVec2::new(0, 0)), &[0]);
        assert_eq!(grid.bucket(IVec2::new(9, 9)), &[3]);
    }

    #[test]
    fn neighborhood_covers_adjacent_cells_only() {
        let particles = particles_at(&[
            Vec2::new(15.0, 15.0), // cell (1,1)
            Vec2::new(5.0, 5.0),   // cell (0,0), diagonal neighbor
            Vec2::new(25.0, 15.0), // cell (2,1)
            Vec2::new(35.0, 15.0), // cell (3,1), too far
        ]);
        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(&particles, &Viewport::new(100.0, 100.0));

        let mut near: Vec<_> = grid.candidates_near(Vec2::new(15.0, 15.0)).collect();
        near.sort_unstable();
        assert_eq!(near, vec![0, 1, 2]);
    }

    #[test]
    fn rebuild_forgets_previous_frame() {
        let mut grid = SpatialGrid::new(10.0);
        let bounds = Viewport::new(100.0, 100.0);
        grid.rebuild(&particles_at(&[Vec2::new(5.0, 5.0)]), &bounds);
        grid.rebuild(&particles_at(&[Vec2::new(55.0, 55.0)]), &bounds);

        assert!(grid.bucket(IVec2::new(0, 0)).is_empty());
        assert_eq!(grid.occupied_cells().count(), 1);
        assert_eq!(grid.indexed_count(), 1);
    }
}
