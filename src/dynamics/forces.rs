//! Body-independent force laws: gravity, drag, airbrake, uplift, and point attraction.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_GRAVITY, MIN_ATTRACTION_DISTANCE_SQ};
use crate::core::particle::{Particle, ParticleSet};
use crate::dynamics::generator::ParticleForceGenerator;
use crate::utils::math::{direction_and_length, within_extent};

/// Constant gravity scaled by particle mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleGravity {
    pub gravity: Vec3,
}

impl ParticleGravity {
    pub fn new(gravity: Vec3) -> Self {
        Self { gravity }
    }
}

impl Default for ParticleGravity {
    /// Earth gravity along `-Y`.
    fn default() -> Self {
        Self::new(Vec3::from_array(DEFAULT_GRAVITY))
    }
}

impl ParticleForceGenerator for ParticleGravity {
    fn name(&self) -> &'static str {
        "gravity"
    }

    fn force(&self, particle: &Particle, _particles: &ParticleSet, _duration: f32) -> Option<Vec3> {
        if !particle.has_finite_mass() {
            return None;
        }
        Some(self.gravity * particle.mass())
    }
}

/// Drag opposing `velocity` with linear and quadratic coefficients.
fn drag_force(velocity: Vec3, k1: f32, k2: f32) -> Option<Vec3> {
    let (direction, speed) = direction_and_length(velocity)?;
    let drag_coeff = k1 * speed + k2 * speed * speed;
    Some(-direction * drag_coeff)
}

/// Velocity drag: `-v̂ (k1 |v| + k2 |v|²)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleDrag {
    pub k1: f32,
    pub k2: f32,
}

impl ParticleDrag {
    pub fn new(k1: f32, k2: f32) -> Self {
        Self { k1, k2 }
    }
}

impl ParticleForceGenerator for ParticleDrag {
    fn name(&self) -> &'static str {
        "drag"
    }

    fn force(&self, particle: &Particle, _particles: &ParticleSet, _duration: f32) -> Option<Vec3> {
        drag_force(particle.velocity, self.k1, self.k2)
    }
}

/// Drag that only acts while the brake is engaged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleAirbrake {
    pub k1: f32,
    pub k2: f32,
    pub brake: bool,
}

impl ParticleAirbrake {
    pub fn new(k1: f32, k2: f32, brake: bool) -> Self {
        Self { k1, k2, brake }
    }

    pub fn set_brake(&mut self, brake: bool) {
        self.brake = brake;
    }

    pub fn toggle(&mut self) -> bool {
        self.brake = !self.brake;
        self.brake
    }
}

impl ParticleForceGenerator for ParticleAirbrake {
    fn name(&self) -> &'static str {
        "airbrake"
    }

    fn force(&self, particle: &Particle, _particles: &ParticleSet, _duration: f32) -> Option<Vec3> {
        if !self.brake {
            return None;
        }
        drag_force(particle.velocity, self.k1, self.k2)
    }
}

/// Constant force inside an axis-aligned column.
///
/// The column spans `[origin.x, origin.x + radius]` by `[origin.z, origin.z + radius]`
/// with both ends included; height is ignored. `radius` is an extent, not a
/// circular radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleUplift {
    pub upforce: Vec3,
    pub origin: Vec3,
    pub radius: f32,
}

impl ParticleUplift {
    pub fn new(upforce: Vec3, origin: Vec3, radius: f32) -> Self {
        Self {
            upforce,
            origin,
            radius,
        }
    }

    pub fn contains(&self, position: Vec3) -> bool {
        within_extent(position.x, self.origin.x, self.radius)
            && within_extent(position.z, self.origin.z, self.radius)
    }
}

impl ParticleForceGenerator for ParticleUplift {
    fn name(&self) -> &'static str {
        "uplift"
    }

    fn force(&self, particle: &Particle, _particles: &ParticleSet, _duration: f32) -> Option<Vec3> {
        self.contains(particle.position).then_some(self.upforce)
    }
}

/// Inverse-square attraction toward a fixed point carrying mass `other_mass`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleGravityAttract {
    pub point: Vec3,
    pub gravitational_constant: f32,
    pub other_mass: f32,
}

impl ParticleGravityAttract {
    pub fn new(point: Vec3, gravitational_constant: f32, other_mass: f32) -> Self {
        Self {
            point,
            gravitational_constant,
            other_mass,
        }
    }
}

impl ParticleForceGenerator for ParticleGravityAttract {
    fn name(&self) -> &'static str {
        "gravity_attract"
    }

    fn force(&self, particle: &Particle, _particles: &ParticleSet, _duration: f32) -> Option<Vec3> {
        if !particle.has_finite_mass() {
            return None;
        }

        let offset = self.point - particle.position;
        let r2 = offset.length_squared();
        // The law is singular at the attracting point.
        if r2 < MIN_ATTRACTION_DISTANCE_SQ {
            return None;
        }

        let magnitude = self.gravitational_constant * particle.mass() * self.other_mass / r2;
        Some(offset / r2.sqrt() * magnitude)
    }
}
