use std::any::Any;

use glam::Vec3;

use crate::core::particle::{Particle, ParticleId, ParticleSet};

/// Upcast helper so boxed generators can be handed back as their concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// One physical force law applied to particles once per frame.
///
/// Implementors compute the force in [`force`](Self::force); the registry
/// takes care of writing it into the particle's accumulator. Generators
/// never move particles and never own them: a law that refers to another
/// particle stores its [`ParticleId`] and looks it up in `particles`.
pub trait ParticleForceGenerator: AsAny + Send + Sync {
    /// Short, stable name used in logs and configuration errors.
    fn name(&self) -> &'static str;

    /// Force this law exerts on `particle` over the next `duration` seconds,
    /// or `None` when nothing should be applied this frame.
    fn force(&self, particle: &Particle, particles: &ParticleSet, duration: f32) -> Option<Vec3>;

    /// Whether evaluating this law changes state read by later evaluations.
    ///
    /// Stateful generators make results depend on the global call order, so
    /// the registry never evaluates them out of registration order.
    fn is_stateful(&self) -> bool {
        false
    }

    /// Computes the force for `id` and adds it to its accumulator.
    ///
    /// Returns whether a force was applied. A stale `id` applies nothing.
    fn update_force(&self, id: ParticleId, particles: &mut ParticleSet, duration: f32) -> bool {
        let force = match particles.get(id) {
            Some(particle) => self.force(particle, particles, duration),
            None => return false,
        };
        match (force, particles.get_mut(id)) {
            (Some(force), Some(particle)) => {
                particle.add_force(force);
                true
            }
            _ => false,
        }
    }
}
