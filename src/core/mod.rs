//! Particle state consumed by the force generators.

pub mod particle;

pub use particle::{Particle, ParticleId, ParticleSet};
