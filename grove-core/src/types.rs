/// Position of a particle in the live population.
///
/// This is an index into `Population::particles` and is only meaningful
/// until the next compaction, which reassigns the index of every survivor.
/// Use [`BirthOrder`] to refer to a particle across compaction boundaries.
pub type ParticleIndex = usize;

/// Stable creation-sequence identity of a particle.
///
/// Assigned once when the particle is allocated and never reused, even
/// after the particle is culled.
pub type BirthOrder = u64;

/// Identifier for a branch in a [`crate::branch::BranchSet`].
///
/// Branches are never removed during a run, so a `BranchId` stays valid
/// until the simulation is reset.
pub type BranchId = usize;

/// Identifier for a root record in a [`crate::forest::Forest`].
pub type TreeId = usize;
