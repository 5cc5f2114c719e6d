//! Global constants and the serde scene description.
//!
//! A [`SceneConfig`] lists particles, generators, and registrations by index,
//! so a scene can be written as JSON (or any serde format) and turned into a
//! ready-to-step [`ParticleScene`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::particle::{Particle, ParticleId};
use crate::dynamics::{
    buoyancy::{ParticleAirBuoyancy, ParticleBuoyancy},
    forces::{
        ParticleAirbrake, ParticleDrag, ParticleGravity, ParticleGravityAttract, ParticleUplift,
    },
    generator::ParticleForceGenerator,
    springs::{
        ParticleAnchoredBungee, ParticleAnchoredSpring, ParticleBungee, ParticleFakeSpring,
        ParticleLimitedSpring, ParticleSpring,
    },
};
use crate::error::ForceError;
use crate::ParticleScene;

/// Default gravity vector (Y-up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];

/// Default frame duration (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Default per-second velocity retention handed to the integrator.
pub const DEFAULT_DAMPING: f32 = 0.99;

/// Scale applied to the altitude deficit in the air buoyancy law.
pub const AIR_BUOYANCY_SCALE: f32 = 0.01;

/// Squared distance below which point attraction is not evaluated.
pub const MIN_ATTRACTION_DISTANCE_SQ: f32 = 1e-8;

/// Vectors at or below this length have no usable direction.
pub const DEGENERATE_LENGTH: f32 = 1e-6;

fn default_mass() -> f32 {
    1.0
}

fn default_damping() -> f32 {
    DEFAULT_DAMPING
}

/// Initial state of one particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleConfig {
    pub position: Vec3,
    #[serde(default)]
    pub velocity: Vec3,
    #[serde(default = "default_mass")]
    pub mass: f32,
    /// Immovable particles ignore `mass` and get an inverse mass of zero.
    #[serde(default)]
    pub immovable: bool,
    #[serde(default = "default_damping")]
    pub damping: f32,
}

impl ParticleConfig {
    pub fn build(&self) -> Result<Particle, ForceError> {
        let mut particle = Particle::new(self.position).with_velocity(self.velocity);
        particle.damping = self.damping;
        if self.immovable {
            particle.set_infinite_mass();
        } else {
            particle.set_mass(self.mass)?;
        }
        Ok(particle)
    }
}

/// One force law with its parameters. `other` fields index the scene's particle list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneratorConfig {
    Gravity {
        gravity: Vec3,
    },
    Drag {
        k1: f32,
        k2: f32,
    },
    Airbrake {
        k1: f32,
        k2: f32,
        #[serde(default)]
        brake: bool,
    },
    Uplift {
        upforce: Vec3,
        origin: Vec3,
        radius: f32,
    },
    GravityAttract {
        point: Vec3,
        gravitational_constant: f32,
        other_mass: f32,
    },
    Spring {
        other: usize,
        spring_constant: f32,
        rest_length: f32,
    },
    LimitedSpring {
        other: usize,
        spring_constant: f32,
        rest_length: f32,
        max_distance: f32,
    },
    Bungee {
        other: usize,
        spring_constant: f32,
        rest_length: f32,
    },
    AnchoredSpring {
        anchor: Vec3,
        spring_constant: f32,
        rest_length: f32,
    },
    AnchoredBungee {
        anchor: Vec3,
        spring_constant: f32,
        rest_length: f32,
    },
    FakeSpring {
        anchor: Vec3,
        spring_constant: f32,
        damping: f32,
    },
    Buoyancy {
        max_depth: f32,
        volume: f32,
        water_height: f32,
        liquid_density: f32,
    },
    AirBuoyancy {
        max_altitude: f32,
        volume: f32,
        air_density: f32,
    },
}

fn non_negative(generator: &'static str, field: &str, value: f32) -> Result<(), ForceError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ForceError::invalid(
            generator,
            format!("{field} must be a finite non-negative number, got {value}"),
        ))
    }
}

fn resolve(particles: &[ParticleId], index: usize) -> Result<ParticleId, ForceError> {
    particles
        .get(index)
        .copied()
        .ok_or(ForceError::UnknownParticle { index })
}

impl GeneratorConfig {
    pub fn name(&self) -> &'static str {
        match self {
            GeneratorConfig::Gravity { .. } => "gravity",
            GeneratorConfig::Drag { .. } => "drag",
            GeneratorConfig::Airbrake { .. } => "airbrake",
            GeneratorConfig::Uplift { .. } => "uplift",
            GeneratorConfig::GravityAttract { .. } => "gravity_attract",
            GeneratorConfig::Spring { .. } => "spring",
            GeneratorConfig::LimitedSpring { .. } => "limited_spring",
            GeneratorConfig::Bungee { .. } => "bungee",
            GeneratorConfig::AnchoredSpring { .. } => "anchored_spring",
            GeneratorConfig::AnchoredBungee { .. } => "anchored_bungee",
            GeneratorConfig::FakeSpring { .. } => "fake_spring",
            GeneratorConfig::Buoyancy { .. } => "buoyancy",
            GeneratorConfig::AirBuoyancy { .. } => "air_buoyancy",
        }
    }

    /// Checks parameter ranges that would make the force law meaningless.
    pub fn validate(&self) -> Result<(), ForceError> {
        let name = self.name();
        match *self {
            GeneratorConfig::Gravity { .. } | GeneratorConfig::GravityAttract { .. } => Ok(()),
            GeneratorConfig::Drag { k1, k2 } | GeneratorConfig::Airbrake { k1, k2, .. } => {
                non_negative(name, "k1", k1)?;
                non_negative(name, "k2", k2)
            }
            GeneratorConfig::Uplift { radius, .. } => non_negative(name, "radius", radius),
            GeneratorConfig::Spring {
                spring_constant,
                rest_length,
                ..
            }
            | GeneratorConfig::Bungee {
                spring_constant,
                rest_length,
                ..
            }
            | GeneratorConfig::AnchoredSpring {
                spring_constant,
                rest_length,
                ..
            }
            | GeneratorConfig::AnchoredBungee {
                spring_constant,
                rest_length,
                ..
            } => {
                non_negative(name, "spring_constant", spring_constant)?;
                non_negative(name, "rest_length", rest_length)
            }
            GeneratorConfig::LimitedSpring {
                spring_constant,
                rest_length,
                max_distance,
                ..
            } => {
                non_negative(name, "spring_constant", spring_constant)?;
                non_negative(name, "rest_length", rest_length)?;
                non_negative(name, "max_distance", max_distance)
            }
            GeneratorConfig::FakeSpring {
                spring_constant,
                damping,
                ..
            } => {
                non_negative(name, "spring_constant", spring_constant)?;
                non_negative(name, "damping", damping)
            }
            GeneratorConfig::Buoyancy {
                max_depth, volume, ..
            } => {
                if !(max_depth > 0.0) {
                    return Err(ForceError::invalid(
                        name,
                        format!("max_depth must be positive, got {max_depth}"),
                    ));
                }
                non_negative(name, "volume", volume)
            }
            GeneratorConfig::AirBuoyancy { volume, .. } => non_negative(name, "volume", volume),
        }
    }

    /// Builds the generator, resolving particle indices against `particles`.
    pub fn build(
        &self,
        particles: &[ParticleId],
    ) -> Result<Box<dyn ParticleForceGenerator>, ForceError> {
        self.validate()?;
        let generator: Box<dyn ParticleForceGenerator> = match *self {
            GeneratorConfig::Gravity { gravity } => Box::new(ParticleGravity::new(gravity)),
            GeneratorConfig::Drag { k1, k2 } => Box::new(ParticleDrag::new(k1, k2)),
            GeneratorConfig::Airbrake { k1, k2, brake } => {
                Box::new(ParticleAirbrake::new(k1, k2, brake))
            }
            GeneratorConfig::Uplift {
                upforce,
                origin,
                radius,
            } => Box::new(ParticleUplift::new(upforce, origin, radius)),
            GeneratorConfig::GravityAttract {
                point,
                gravitational_constant,
                other_mass,
            } => Box::new(ParticleGravityAttract::new(
                point,
                gravitational_constant,
                other_mass,
            )),
            GeneratorConfig::Spring {
                other,
                spring_constant,
                rest_length,
            } => Box::new(ParticleSpring::new(
                resolve(particles, other)?,
                spring_constant,
                rest_length,
            )),
            GeneratorConfig::LimitedSpring {
                other,
                spring_constant,
                rest_length,
                max_distance,
            } => Box::new(ParticleLimitedSpring::new(
                resolve(particles, other)?,
                spring_constant,
                rest_length,
                max_distance,
            )),
            GeneratorConfig::Bungee {
                other,
                spring_constant,
                rest_length,
            } => Box::new(ParticleBungee::new(
                resolve(particles, other)?,
                spring_constant,
                rest_length,
            )),
            GeneratorConfig::AnchoredSpring {
                anchor,
                spring_constant,
                rest_length,
            } => Box::new(ParticleAnchoredSpring::new(anchor, spring_constant, rest_length)),
            GeneratorConfig::AnchoredBungee {
                anchor,
                spring_constant,
                rest_length,
            } => Box::new(ParticleAnchoredBungee::new(anchor, spring_constant, rest_length)),
            GeneratorConfig::FakeSpring {
                anchor,
                spring_constant,
                damping,
            } => Box::new(ParticleFakeSpring::new(anchor, spring_constant, damping)),
            GeneratorConfig::Buoyancy {
                max_depth,
                volume,
                water_height,
                liquid_density,
            } => Box::new(ParticleBuoyancy::new(
                max_depth,
                volume,
                water_height,
                liquid_density,
            )),
            GeneratorConfig::AirBuoyancy {
                max_altitude,
                volume,
                air_density,
            } => Box::new(ParticleAirBuoyancy::new(max_altitude, volume, air_density)),
        };
        Ok(generator)
    }
}

/// Pairs a particle index with a generator index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationConfig {
    pub particle: usize,
    pub generator: usize,
}

/// Serializable description of a whole scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub particles: Vec<ParticleConfig>,
    pub generators: Vec<GeneratorConfig>,
    pub registrations: Vec<RegistrationConfig>,
}

impl SceneConfig {
    pub fn build(&self) -> Result<ParticleScene, ForceError> {
        let mut scene = ParticleScene::new();

        let particle_ids = self
            .particles
            .iter()
            .map(|config| config.build().map(|particle| scene.add_particle(particle)))
            .collect::<Result<Vec<_>, _>>()?;

        let generator_ids = self
            .generators
            .iter()
            .map(|config| {
                config
                    .build(&particle_ids)
                    .map(|generator| scene.registry_mut().add_boxed_generator(generator))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for registration in &self.registrations {
            let particle = resolve(&particle_ids, registration.particle)?;
            let generator = generator_ids
                .get(registration.generator)
                .copied()
                .ok_or(ForceError::UnknownGeneratorIndex {
                    index: registration.generator,
                })?;
            scene.register(particle, generator)?;
        }

        log::debug!(
            "built scene with {} particles, {} generators, {} registrations",
            particle_ids.len(),
            generator_ids.len(),
            self.registrations.len()
        );
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejects_negative_rest_length() {
        let config = GeneratorConfig::AnchoredBungee {
            anchor: Vec3::ZERO,
            spring_constant: 1.0,
            rest_length: -1.0,
        };
        assert!(matches!(
            config.validate(),
            Err(ForceError::InvalidParameter {
                generator: "anchored_bungee",
                ..
            })
        ));
    }

    #[test]
    fn validation_rejects_flat_buoyancy_band() {
        let config = GeneratorConfig::Buoyancy {
            max_depth: 0.0,
            volume: 1.0,
            water_height: 0.0,
            liquid_density: 1000.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn spring_needs_existing_other_particle() {
        let config = GeneratorConfig::Spring {
            other: 3,
            spring_constant: 1.0,
            rest_length: 1.0,
        };
        assert_eq!(
            config.build(&[]).err(),
            Some(ForceError::UnknownParticle { index: 3 })
        );
    }

    #[test]
    fn immovable_particles_ignore_mass() {
        let config = ParticleConfig {
            position: Vec3::ONE,
            velocity: Vec3::ZERO,
            mass: -5.0,
            immovable: true,
            damping: DEFAULT_DAMPING,
        };
        let particle = config.build().unwrap();
        assert!(!particle.has_finite_mass());
    }
}
