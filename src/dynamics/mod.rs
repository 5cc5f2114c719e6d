//! Force generators and the registry that drives them each frame.

pub mod buoyancy;
pub mod forces;
pub mod generator;
pub mod registry;
pub mod springs;

pub use buoyancy::{ParticleAirBuoyancy, ParticleBuoyancy};
pub use forces::{
    ParticleAirbrake, ParticleDrag, ParticleGravity, ParticleGravityAttract, ParticleUplift,
};
pub use generator::{AsAny, ParticleForceGenerator};
pub use registry::{GeneratorId, ParticleForceRegistration, ParticleForceRegistry};
pub use springs::{
    ParticleAnchoredBungee, ParticleAnchoredSpring, ParticleBungee, ParticleFakeSpring,
    ParticleLimitedSpring, ParticleSpring,
};
