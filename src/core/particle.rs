use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_DAMPING;
use crate::error::ForceError;
use crate::utils::allocator::{Arena, Handle};

/// Stable handle to a particle stored in a [`ParticleSet`].
pub type ParticleId = Handle<Particle>;

/// Arena owning the particles of a scene.
pub type ParticleSet = Arena<Particle>;

/// Point mass consumed by force generators.
///
/// Mass is stored as its inverse so that immovable anchors can be expressed
/// with an inverse mass of zero. The force accumulator is written by the
/// registry pass and cleared by whoever integrates the particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Velocity retained per second, used by the integrator.
    pub damping: f32,
    inverse_mass: f32,
    force_accum: Vec3,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            damping: DEFAULT_DAMPING,
            inverse_mass: 1.0,
            force_accum: Vec3::ZERO,
        }
    }
}

impl Particle {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Builder-style mass setter.
    ///
    /// A mass that [`set_mass`](Self::set_mass) rejects (zero, negative, or
    /// non-finite) does not leave the particle unchanged: it is made
    /// immovable, with an inverse mass of zero, and a warning is logged. Call
    /// `set_mass` directly to handle the error instead.
    pub fn with_mass(mut self, mass: f32) -> Self {
        if self.set_mass(mass).is_err() {
            log::warn!("rejected mass {mass}; particle made immovable");
            self.inverse_mass = 0.0;
        }
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn set_mass(&mut self, mass: f32) -> Result<(), ForceError> {
        if !(mass > 0.0) || !mass.is_finite() {
            return Err(ForceError::InvalidMass(mass));
        }
        self.inverse_mass = 1.0 / mass;
        Ok(())
    }

    pub fn set_infinite_mass(&mut self) {
        self.inverse_mass = 0.0;
    }

    /// Mass of the particle, `f32::INFINITY` for immovable particles.
    pub fn mass(&self) -> f32 {
        if self.inverse_mass == 0.0 {
            f32::INFINITY
        } else {
            1.0 / self.inverse_mass
        }
    }

    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Sets the inverse mass directly. Negative values clamp to zero.
    pub fn set_inverse_mass(&mut self, inverse_mass: f32) {
        self.inverse_mass = inverse_mass.max(0.0);
    }

    pub fn has_finite_mass(&self) -> bool {
        self.inverse_mass > 0.0
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.force_accum += force;
    }

    pub fn accumulated_force(&self) -> Vec3 {
        self.force_accum
    }

    pub fn clear_accumulator(&mut self) {
        self.force_accum = Vec3::ZERO;
    }
}
