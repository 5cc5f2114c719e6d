//! Particle Forces – force generators for mass-aggregate physics.
//!
//! This crate provides a family of closed-form particle force laws (gravity,
//! drag, springs, bungees, buoyancy, and more) and a registry that applies
//! them to particles once per simulation frame. Integration of particle state
//! is left to the caller: the registry only fills each particle's force
//! accumulator.

pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;

pub use glam::Vec3;

pub use config::{GeneratorConfig, ParticleConfig, RegistrationConfig, SceneConfig};
pub use crate::core::particle::{Particle, ParticleId, ParticleSet};
pub use dynamics::{
    buoyancy::{ParticleAirBuoyancy, ParticleBuoyancy},
    forces::{
        ParticleAirbrake, ParticleDrag, ParticleGravity, ParticleGravityAttract, ParticleUplift,
    },
    generator::ParticleForceGenerator,
    registry::{GeneratorId, ParticleForceRegistration, ParticleForceRegistry},
    springs::{
        ParticleAnchoredBungee, ParticleAnchoredSpring, ParticleBungee, ParticleFakeSpring,
        ParticleLimitedSpring, ParticleSpring,
    },
};
pub use error::ForceError;
pub use utils::{
    allocator::{Arena, Handle},
    profiling::ForcePassStats,
};

/// High-level convenience wrapper owning a particle set and its force registry.
#[derive(Default)]
pub struct ParticleScene {
    particles: ParticleSet,
    registry: ParticleForceRegistry,
    parallel_enabled: bool,
}

impl ParticleScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a particle and returns its handle.
    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        self.particles.insert(particle)
    }

    /// Removes a particle along with every registration targeting it.
    pub fn remove_particle(&mut self, id: ParticleId) -> Option<Particle> {
        let particle = self.particles.remove(id)?;
        self.registry.remove_particle(id);
        Some(particle)
    }

    /// Stores a generator in the scene's registry.
    pub fn add_generator<G: ParticleForceGenerator + 'static>(
        &mut self,
        generator: G,
    ) -> GeneratorId {
        self.registry.add_generator(generator)
    }

    /// Registers `generator` to act on `particle` every frame.
    pub fn register(
        &mut self,
        particle: ParticleId,
        generator: GeneratorId,
    ) -> Result<(), ForceError> {
        if !self.particles.contains(particle) {
            return Err(ForceError::UnknownParticle {
                index: particle.index(),
            });
        }
        self.registry.add(particle, generator)
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleSet {
        &mut self.particles
    }

    pub fn registry(&self) -> &ParticleForceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ParticleForceRegistry {
        &mut self.registry
    }

    /// Enables or disables the rayon-backed force pass.
    ///
    /// Has no effect when the crate is built without the `parallel` feature.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.parallel_enabled = enabled;
    }

    pub fn parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }

    /// Zeroes every particle's force accumulator ahead of a new frame.
    pub fn clear_accumulators(&mut self) {
        for particle in self.particles.values_mut() {
            particle.clear_accumulator();
        }
    }

    /// Runs one force pass over every registration.
    pub fn update_forces(&mut self, duration: f32) {
        #[cfg(feature = "parallel")]
        {
            if self.parallel_enabled {
                self.registry
                    .update_forces_parallel(&mut self.particles, duration);
                return;
            }
        }
        self.registry.update_forces(&mut self.particles, duration);
    }
}
