//! Buoyancy in liquid and in air, both driven by the particle's height.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::AIR_BUOYANCY_SCALE;
use crate::core::particle::{Particle, ParticleSet};
use crate::dynamics::generator::ParticleForceGenerator;

/// Upthrust from a liquid whose surface sits at `water_height`.
///
/// The particle is treated as a body extending `max_depth` above and below its
/// centre. Fully above the surface band it feels nothing, fully below it feels
/// `liquid_density * volume`, and inside the band the force ramps linearly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleBuoyancy {
    pub max_depth: f32,
    pub volume: f32,
    pub water_height: f32,
    pub liquid_density: f32,
}

impl ParticleBuoyancy {
    pub fn new(max_depth: f32, volume: f32, water_height: f32, liquid_density: f32) -> Self {
        Self {
            max_depth,
            volume,
            water_height,
            liquid_density,
        }
    }

    /// Fraction of the body under the surface at height `depth`, in `[0, 1]`.
    pub fn submerged_fraction(&self, depth: f32) -> f32 {
        if depth >= self.water_height + self.max_depth {
            return 0.0;
        }
        if depth <= self.water_height - self.max_depth {
            return 1.0;
        }
        (self.water_height + self.max_depth - depth) / (2.0 * self.max_depth)
    }
}

impl ParticleForceGenerator for ParticleBuoyancy {
    fn name(&self) -> &'static str {
        "buoyancy"
    }

    fn force(&self, particle: &Particle, _particles: &ParticleSet, _duration: f32) -> Option<Vec3> {
        let depth = particle.position.y;
        if depth >= self.water_height + self.max_depth {
            return None;
        }
        let lift = self.liquid_density * self.volume * self.submerged_fraction(depth);
        Some(Vec3::new(0.0, lift, 0.0))
    }
}

/// Lift from displaced air that fades out linearly toward `max_altitude`.
///
/// Below the ceiling the upward force is
/// `air_density * volume * (max_altitude - y) * 0.01`; above it the generator
/// still applies, with zero magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleAirBuoyancy {
    pub max_altitude: f32,
    pub volume: f32,
    pub air_density: f32,
}

impl ParticleAirBuoyancy {
    pub fn new(max_altitude: f32, volume: f32, air_density: f32) -> Self {
        Self {
            max_altitude,
            volume,
            air_density,
        }
    }
}

impl ParticleForceGenerator for ParticleAirBuoyancy {
    fn name(&self) -> &'static str {
        "air_buoyancy"
    }

    fn force(&self, particle: &Particle, _particles: &ParticleSet, _duration: f32) -> Option<Vec3> {
        let altitude = particle.position.y;
        let lift = if altitude <= self.max_altitude {
            self.air_density * self.volume * ((self.max_altitude - altitude) * AIR_BUOYANCY_SCALE)
        } else {
            0.0
        };
        Some(Vec3::new(0.0, lift, 0.0))
    }
}
