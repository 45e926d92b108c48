//! Procedural branching growth rendered as a field of connected particles.
//!
//! Trees grow from roots as branches that leave particles behind at their
//! tips. Particles sway, settle, and are retired oldest-first; every tick the
//! particles closer than a threshold are linked into connections.
//!
//! Main components:
//! - [`simulation`]: the per-tick pipeline and all mutable state.
//! - [`branch`]: branch geometry and the growth engine.
//! - [`forest`]: root records and periodic root rotation.
//! - [`lifecycle`]: particle population, FIFO culling and compaction.
//! - [`grid`] and [`connections`]: spatial hashing and proximity pairs.
//! - [`drift`] and [`viewport`]: heading drift and in-view steering.
//! - [`protocol`] and [`worker`]: host messages and the simulation thread.
//! - [`config`] and [`error`]: configuration and error types.

pub mod branch;
pub mod config;
pub mod connections;
pub mod drift;
pub mod error;
pub mod forest;
pub mod grid;
pub mod lifecycle;
pub mod particle;
pub mod protocol;
pub mod simulation;
pub mod types;
pub mod viewport;
pub mod worker;

pub use config::Config;
pub use error::GroveError;
pub use protocol::{Command, Frame};
pub use simulation::Simulation;
pub use worker::SimulationWorker;
