//! Spring-family force laws.
//!
//! Every law here works on the offset `Δ = P - reference`, where the reference
//! is either another particle or an anchor point. Forces point along `±Δ̂` and
//! vanish at the rest length; a zero-length offset yields no force.

use glam::Vec3;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::particle::{Particle, ParticleId, ParticleSet};
use crate::dynamics::generator::ParticleForceGenerator;
use crate::utils::math::direction_and_length;

/// Hooke's law force on a particle whose offset from the reference is `offset`.
fn hooke(offset: Vec3, spring_constant: f32, rest_length: f32) -> Option<Vec3> {
    let (direction, length) = direction_and_length(offset)?;
    Some(-direction * spring_constant * (length - rest_length))
}

/// Spring connecting the particle to another particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSpring {
    pub other: ParticleId,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl ParticleSpring {
    pub fn new(other: ParticleId, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            other,
            spring_constant,
            rest_length,
        }
    }
}

impl ParticleForceGenerator for ParticleSpring {
    fn name(&self) -> &'static str {
        "spring"
    }

    fn force(&self, particle: &Particle, particles: &ParticleSet, _duration: f32) -> Option<Vec3> {
        let other = particles.get(self.other)?;
        hooke(
            particle.position - other.position,
            self.spring_constant,
            self.rest_length,
        )
    }
}

/// Spring that weakens whenever it is stretched past `max_distance`.
///
/// Each evaluation that finds the spring longer than `max_distance` halves the
/// spring constant before computing that frame's force. The constant never
/// recovers, so it is monotonically non-increasing over the generator's life.
#[derive(Debug)]
pub struct ParticleLimitedSpring {
    pub other: ParticleId,
    pub rest_length: f32,
    pub max_distance: f32,
    spring_constant: Mutex<f32>,
}

impl ParticleLimitedSpring {
    pub fn new(
        other: ParticleId,
        spring_constant: f32,
        rest_length: f32,
        max_distance: f32,
    ) -> Self {
        Self {
            other,
            rest_length,
            max_distance,
            spring_constant: Mutex::new(spring_constant),
        }
    }

    /// Spring constant that the next evaluation starts from.
    pub fn spring_constant(&self) -> f32 {
        *self.spring_constant.lock()
    }
}

impl ParticleForceGenerator for ParticleLimitedSpring {
    fn name(&self) -> &'static str {
        "limited_spring"
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn force(&self, particle: &Particle, particles: &ParticleSet, _duration: f32) -> Option<Vec3> {
        let other = particles.get(self.other)?;
        let offset = particle.position - other.position;

        let spring_constant = {
            let mut k = self.spring_constant.lock();
            if offset.length() > self.max_distance {
                *k *= 0.5;
                log::debug!(
                    "limited spring overstretched ({:.3} > {:.3}), constant now {}",
                    offset.length(),
                    self.max_distance,
                    *k
                );
            }
            *k
        };

        hooke(offset, spring_constant, self.rest_length)
    }
}

/// Elastic cord to another particle: pulls when stretched, slack otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleBungee {
    pub other: ParticleId,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl ParticleBungee {
    pub fn new(other: ParticleId, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            other,
            spring_constant,
            rest_length,
        }
    }
}

impl ParticleForceGenerator for ParticleBungee {
    fn name(&self) -> &'static str {
        "bungee"
    }

    fn force(&self, particle: &Particle, particles: &ParticleSet, _duration: f32) -> Option<Vec3> {
        let other = particles.get(self.other)?;
        let offset = particle.position - other.position;
        if offset.length() <= self.rest_length {
            return None;
        }
        hooke(offset, self.spring_constant, self.rest_length)
    }
}

/// Spring tied to a fixed point in space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleAnchoredSpring {
    pub anchor: Vec3,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl ParticleAnchoredSpring {
    pub fn new(anchor: Vec3, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            anchor,
            spring_constant,
            rest_length,
        }
    }

    pub fn set_anchor(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }
}

impl ParticleForceGenerator for ParticleAnchoredSpring {
    fn name(&self) -> &'static str {
        "anchored_spring"
    }

    fn force(&self, particle: &Particle, _particles: &ParticleSet, _duration: f32) -> Option<Vec3> {
        let (direction, length) = direction_and_length(particle.position - self.anchor)?;
        Some(direction * (self.rest_length - length) * self.spring_constant)
    }
}

/// Elastic cord tied to a fixed point in space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleAnchoredBungee {
    pub anchor: Vec3,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl ParticleAnchoredBungee {
    pub fn new(anchor: Vec3, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            anchor,
            spring_constant,
            rest_length,
        }
    }

    pub fn set_anchor(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }
}

impl ParticleForceGenerator for ParticleAnchoredBungee {
    fn name(&self) -> &'static str {
        "anchored_bungee"
    }

    fn force(&self, particle: &Particle, _particles: &ParticleSet, _duration: f32) -> Option<Vec3> {
        let offset = particle.position - self.anchor;
        if offset.length() < self.rest_length {
            return None;
        }
        hooke(offset, self.spring_constant, self.rest_length)
    }
}

/// Stiff damped spring to an anchor, solved in closed form over the step.
///
/// Instead of integrating a stiff spring, this predicts where an under-damped
/// harmonic oscillator would be after `duration` and applies the force that
/// produces exactly that displacement. Only under-damped configurations
/// (`4k > damping²`) have a solution; others apply nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleFakeSpring {
    pub anchor: Vec3,
    pub spring_constant: f32,
    pub damping: f32,
}

impl ParticleFakeSpring {
    pub fn new(anchor: Vec3, spring_constant: f32, damping: f32) -> Self {
        Self {
            anchor,
            spring_constant,
            damping,
        }
    }

    pub fn set_anchor(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }

    /// Angular frequency of the damped oscillation, if it oscillates at all.
    pub fn gamma(&self) -> Option<f32> {
        let discriminant = 4.0 * self.spring_constant - self.damping * self.damping;
        if discriminant <= 0.0 {
            return None;
        }
        let gamma = 0.5 * discriminant.sqrt();
        (gamma > 0.0).then_some(gamma)
    }
}

impl ParticleForceGenerator for ParticleFakeSpring {
    fn name(&self) -> &'static str {
        "fake_spring"
    }

    fn force(&self, particle: &Particle, _particles: &ParticleSet, duration: f32) -> Option<Vec3> {
        if !particle.has_finite_mass() || duration <= 0.0 {
            return None;
        }
        let gamma = self.gamma()?;

        let position = particle.position - self.anchor;
        let velocity = particle.velocity;
        let c = position * (self.damping / (2.0 * gamma)) + velocity * (1.0 / gamma);

        let target = (position * (gamma * duration).cos() + c * (gamma * duration).sin())
            * (-0.5 * duration * self.damping).exp();

        let accel = (target - position) / (duration * duration) - velocity / duration;
        Some(accel * particle.mass())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pair(a: Vec3, b: Vec3) -> (ParticleSet, ParticleId, ParticleId) {
        let mut particles = ParticleSet::new();
        let first = particles.insert(Particle::new(a));
        let second = particles.insert(Particle::new(b));
        (particles, first, second)
    }

    fn eval(
        generator: &dyn ParticleForceGenerator,
        particles: &ParticleSet,
        id: ParticleId,
    ) -> Option<Vec3> {
        let particle = particles.get(id).unwrap();
        generator.force(particle, particles, 0.02)
    }

    #[test]
    fn spring_pulls_when_stretched_and_pushes_when_compressed() {
        let (particles, a, b) = pair(Vec3::new(4.0, 0.0, 0.0), Vec3::ZERO);
        let stretched = eval(&ParticleSpring::new(b, 2.0, 1.0), &particles, a).unwrap();
        assert_relative_eq!(stretched.x, -6.0, epsilon = 1e-5);

        let compressed = eval(&ParticleSpring::new(b, 2.0, 6.0), &particles, a).unwrap();
        assert_relative_eq!(compressed.x, 4.0, epsilon = 1e-5);

        let at_rest = eval(&ParticleSpring::new(b, 2.0, 4.0), &particles, a).unwrap();
        assert_relative_eq!(at_rest.length(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn spring_to_stale_particle_is_idle() {
        let (mut particles, a, b) = pair(Vec3::X, Vec3::ZERO);
        particles.remove(b);
        assert!(eval(&ParticleSpring::new(b, 1.0, 0.0), &particles, a).is_none());
    }

    #[test]
    fn limited_spring_halves_permanently() {
        let (mut particles, a, b) = pair(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO);
        let spring = ParticleLimitedSpring::new(b, 8.0, 2.0, 5.0);

        let first = eval(&spring, &particles, a).unwrap();
        assert_eq!(spring.spring_constant(), 4.0);
        assert_relative_eq!(first.x, -4.0 * 8.0, epsilon = 1e-4);

        if let Some(p) = particles.get_mut(a) {
            p.position = Vec3::new(3.0, 0.0, 0.0);
        }
        let second = eval(&spring, &particles, a).unwrap();
        assert_eq!(spring.spring_constant(), 4.0);
        assert_relative_eq!(second.x, -4.0, epsilon = 1e-5);
    }

    #[test]
    fn limited_spring_within_limit_keeps_constant() {
        let (particles, a, b) = pair(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO);
        let spring = ParticleLimitedSpring::new(b, 8.0, 2.0, 5.0);
        eval(&spring, &particles, a);
        assert_eq!(spring.spring_constant(), 8.0);
    }

    #[test]
    fn bungee_is_slack_inside_rest_length() {
        let (particles, a, b) = pair(Vec3::new(0.0, 4.99, 0.0), Vec3::ZERO);
        assert!(eval(&ParticleBungee::new(b, 3.0, 5.0), &particles, a).is_none());

        let (particles, a, b) = pair(Vec3::new(0.0, 5.01, 0.0), Vec3::ZERO);
        let force = eval(&ParticleBungee::new(b, 3.0, 5.0), &particles, a).unwrap();
        assert!(force.y < 0.0, "bungee must pull toward the other end");
        assert_relative_eq!(force.y, -0.03, epsilon = 1e-4);
    }

    #[test]
    fn anchored_spring_pushes_out_when_compressed() {
        let (particles, a, _) = pair(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO);
        let spring = ParticleAnchoredSpring::new(Vec3::ZERO, 5.0, 3.0);
        let force = eval(&spring, &particles, a).unwrap();
        assert_relative_eq!(force.z, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn anchored_bungee_pulls_toward_anchor() {
        let (particles, a, _) = pair(Vec3::new(8.0, 0.0, 0.0), Vec3::ZERO);
        let bungee = ParticleAnchoredBungee::new(Vec3::ZERO, 2.0, 5.0);
        let force = eval(&bungee, &particles, a).unwrap();
        assert_relative_eq!(force.x, -6.0, epsilon = 1e-5);

        let (particles, a, _) = pair(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO);
        assert!(eval(&bungee, &particles, a).is_none());
    }

    #[test]
    fn fake_spring_requires_under_damping() {
        let (particles, a, _) = pair(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO);
        let critical = ParticleFakeSpring::new(Vec3::ZERO, 1.0, 2.0);
        assert!(critical.gamma().is_none());
        assert!(eval(&critical, &particles, a).is_none());

        let over = ParticleFakeSpring::new(Vec3::ZERO, 1.0, 3.0);
        assert!(eval(&over, &particles, a).is_none());
    }

    #[test]
    fn fake_spring_skips_infinite_mass() {
        let mut particle = Particle::new(Vec3::X);
        particle.set_infinite_mass();
        let spring = ParticleFakeSpring::new(Vec3::ZERO, 10.0, 0.5);
        assert!(spring.gamma().is_some());
        assert!(spring.force(&particle, &ParticleSet::new(), 0.02).is_none());
    }

    #[test]
    fn fake_spring_ignores_zero_duration() {
        let particle = Particle::new(Vec3::X);
        let spring = ParticleFakeSpring::new(Vec3::ZERO, 10.0, 0.5);
        assert!(spring.force(&particle, &ParticleSet::new(), 0.0).is_none());
    }

    #[test]
    fn fake_spring_lands_on_oscillator_target() {
        let dt = 0.1;
        let particle = Particle::new(Vec3::new(1.0, 0.0, 0.0)).with_mass(2.0);
        // k = 4, no damping: gamma = 2, x(t) = cos(2t).
        let spring = ParticleFakeSpring::new(Vec3::ZERO, 4.0, 0.0);
        let force = spring.force(&particle, &ParticleSet::new(), dt).unwrap();

        let accel = force / particle.mass();
        let reached = particle.position + particle.velocity * dt + accel * dt * dt;
        assert_relative_eq!(reached.x, (2.0_f32 * dt).cos(), epsilon = 1e-4);
        assert!(force.x < 0.0);
    }
}
