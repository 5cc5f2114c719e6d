use crate::core::particle::{ParticleId, ParticleSet};
use crate::dynamics::generator::ParticleForceGenerator;
use crate::error::ForceError;
use crate::utils::{
    allocator::{Arena, Handle},
    logging::ScopedTimer,
    profiling::{DurationGuard, ForcePassStats},
};

#[cfg(feature = "parallel")]
use glam::Vec3;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use std::collections::HashMap;

/// Stable handle to a generator owned by a [`ParticleForceRegistry`].
pub type GeneratorId = Handle<Box<dyn ParticleForceGenerator>>;

/// Pairing of one particle with one generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleForceRegistration {
    pub particle: ParticleId,
    pub generator: GeneratorId,
}

/// Ordered set of particle/generator pairings driving the per-frame force pass.
///
/// The registry owns the generators; particles live in a [`ParticleSet`]
/// owned by the caller and are only referenced by handle. Registration order
/// is the order forces are added to each particle.
#[derive(Default)]
pub struct ParticleForceRegistry {
    generators: Arena<Box<dyn ParticleForceGenerator>>,
    registrations: Vec<ParticleForceRegistration>,
    last_pass: ForcePassStats,
}

impl ParticleForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a generator so it can be registered against particles.
    pub fn add_generator<G: ParticleForceGenerator + 'static>(
        &mut self,
        generator: G,
    ) -> GeneratorId {
        self.add_boxed_generator(Box::new(generator))
    }

    pub fn add_boxed_generator(
        &mut self,
        generator: Box<dyn ParticleForceGenerator>,
    ) -> GeneratorId {
        let name = generator.name();
        let id = self.generators.insert(generator);
        log::debug!("stored {name} generator as {id:?}");
        id
    }

    /// Appends a registration. The same pair may be registered more than once.
    pub fn add(&mut self, particle: ParticleId, generator: GeneratorId) -> Result<(), ForceError> {
        if !self.generators.contains(generator) {
            return Err(ForceError::UnknownGenerator);
        }
        self.registrations.push(ParticleForceRegistration {
            particle,
            generator,
        });
        Ok(())
    }

    /// Removes every registration of `particle` with `generator`.
    pub fn remove(&mut self, particle: ParticleId, generator: GeneratorId) -> bool {
        let before = self.registrations.len();
        self.registrations
            .retain(|r| !(r.particle == particle && r.generator == generator));
        before != self.registrations.len()
    }

    /// Drops every registration targeting `particle`, returning how many were removed.
    pub fn remove_particle(&mut self, particle: ParticleId) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.particle != particle);
        before - self.registrations.len()
    }

    /// Frees a generator together with all of its registrations.
    pub fn remove_generator(
        &mut self,
        generator: GeneratorId,
    ) -> Option<Box<dyn ParticleForceGenerator>> {
        let removed = self.generators.remove(generator)?;
        self.registrations.retain(|r| r.generator != generator);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.registrations.clear();
        self.generators.clear();
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn generator_count(&self) -> usize {
        self.generators.len()
    }

    pub fn registrations(&self) -> impl Iterator<Item = &ParticleForceRegistration> + '_ {
        self.registrations.iter()
    }

    /// Borrows a stored generator as its concrete type.
    pub fn generator<T: ParticleForceGenerator + 'static>(&self, id: GeneratorId) -> Option<&T> {
        let generator = self.generators.get(id)?;
        (**generator).as_any().downcast_ref::<T>()
    }

    /// Mutably borrows a stored generator, e.g. to engage a brake or move an anchor.
    pub fn generator_mut<T: ParticleForceGenerator + 'static>(
        &mut self,
        id: GeneratorId,
    ) -> Option<&mut T> {
        let generator = self.generators.get_mut(id)?;
        (**generator).as_any_mut().downcast_mut::<T>()
    }

    /// Statistics of the most recent force pass.
    pub fn last_pass(&self) -> ForcePassStats {
        self.last_pass
    }

    /// Runs every registered generator once, in registration order.
    ///
    /// Forces are added to the particles' accumulators; positions and
    /// velocities are left untouched. `duration` is passed through unchecked.
    pub fn update_forces(&mut self, particles: &mut ParticleSet, duration: f32) {
        let _timer = ScopedTimer::new("forces::update");
        let mut stats = ForcePassStats::default();
        {
            let _elapsed = DurationGuard::new(&mut stats.elapsed);
            for registration in &self.registrations {
                let Some(generator) = self.generators.get(registration.generator) else {
                    stats.stale_skipped += 1;
                    continue;
                };
                if !particles.contains(registration.particle) {
                    log::warn!(
                        "{} generator registered against missing particle {:?}",
                        generator.name(),
                        registration.particle
                    );
                    stats.stale_skipped += 1;
                    continue;
                }

                stats.registrations_visited += 1;
                if generator.update_force(registration.particle, particles, duration) {
                    stats.forces_applied += 1;
                }
            }
        }
        stats.report();
        self.last_pass = stats;
    }

    /// Parallel variant of [`update_forces`](Self::update_forces).
    ///
    /// Registrations are grouped by target particle and each group is
    /// evaluated on its own rayon task against a read-only view of the
    /// particles. Within a group, forces are added in registration order;
    /// groups are applied one after another, so the order across particles
    /// differs from the serial pass.
    ///
    /// If any registered generator is stateful (see
    /// [`ParticleForceGenerator::is_stateful`]) the pass falls back to
    /// [`update_forces`](Self::update_forces), since regrouping would change
    /// the order in which that state is read and written.
    #[cfg(feature = "parallel")]
    pub fn update_forces_parallel(&mut self, particles: &mut ParticleSet, duration: f32) {
        if self.generators.iter().any(|(_, generator)| generator.is_stateful()) {
            log::debug!("stateful generator registered, running serial force pass");
            self.update_forces(particles, duration);
            return;
        }

        let _timer = ScopedTimer::new("forces::update_parallel");
        let mut stats = ForcePassStats::default();
        {
            let _elapsed = DurationGuard::new(&mut stats.elapsed);

            let mut slots: HashMap<ParticleId, usize> = HashMap::new();
            let mut groups: Vec<(ParticleId, Vec<GeneratorId>)> = Vec::new();
            for registration in &self.registrations {
                let slot = *slots.entry(registration.particle).or_insert_with(|| {
                    groups.push((registration.particle, Vec::new()));
                    groups.len() - 1
                });
                groups[slot].1.push(registration.generator);
            }

            let generators = &self.generators;
            let view: &ParticleSet = particles;
            let jobs: Vec<ForceJob> = groups
                .par_iter()
                .map(|(particle_id, generator_ids)| {
                    let mut job = ForceJob {
                        particle: *particle_id,
                        forces: Vec::with_capacity(generator_ids.len()),
                        visited: 0,
                        stale: 0,
                    };
                    let Some(particle) = view.get(*particle_id) else {
                        job.stale = generator_ids.len();
                        return job;
                    };
                    for generator in generator_ids.iter().filter_map(|id| generators.get(*id)) {
                        job.visited += 1;
                        if let Some(force) = generator.force(particle, view, duration) {
                            job.forces.push(force);
                        }
                    }
                    job.stale = generator_ids.len() - job.visited;
                    job
                })
                .collect();

            for job in jobs {
                stats.registrations_visited += job.visited;
                stats.stale_skipped += job.stale;
                if job.stale > 0 {
                    log::warn!("skipped {} stale registrations on {:?}", job.stale, job.particle);
                }
                if let Some(particle) = particles.get_mut(job.particle) {
                    stats.forces_applied += job.forces.len();
                    for force in job.forces {
                        particle.add_force(force);
                    }
                }
            }
        }
        stats.report();
        self.last_pass = stats;
    }
}

#[cfg(feature = "parallel")]
struct ForceJob {
    particle: ParticleId,
    forces: Vec<Vec3>,
    visited: usize,
    stale: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::particle::Particle;
    use crate::dynamics::forces::{ParticleAirbrake, ParticleGravity};
    use glam::Vec3;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records the order in which it is invoked.
    struct OrderRecorder {
        tag: usize,
        log: Arc<Mutex<Vec<usize>>>,
    }

    impl ParticleForceGenerator for OrderRecorder {
        fn name(&self) -> &'static str {
            "order_recorder"
        }

        fn force(
            &self,
            _particle: &Particle,
            _particles: &ParticleSet,
            _duration: f32,
        ) -> Option<Vec3> {
            self.log.lock().push(self.tag);
            Some(Vec3::X)
        }
    }

    #[test]
    fn invokes_each_registration_once_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::default());
        let b = particles.insert(Particle::default());

        let mut registry = ParticleForceRegistry::new();
        let first = registry.add_generator(OrderRecorder { tag: 1, log: log.clone() });
        let second = registry.add_generator(OrderRecorder { tag: 2, log: log.clone() });
        registry.add(a, first).unwrap();
        registry.add(b, first).unwrap();
        registry.add(a, second).unwrap();
        registry.add(a, first).unwrap();

        registry.update_forces(&mut particles, 0.1);

        assert_eq!(*log.lock(), vec![1, 1, 2, 1]);
        assert_eq!(particles.get(a).unwrap().accumulated_force(), Vec3::X * 3.0);
        assert_eq!(particles.get(b).unwrap().accumulated_force(), Vec3::X);
        assert_eq!(registry.last_pass().registrations_visited, 4);
        assert_eq!(registry.last_pass().forces_applied, 4);
    }

    #[test]
    fn registrations_are_listed_in_insertion_order() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::default());
        let b = particles.insert(Particle::default());
        let mut registry = ParticleForceRegistry::new();
        let gravity = registry.add_generator(ParticleGravity::new(Vec3::NEG_Y));
        let brake = registry.add_generator(ParticleAirbrake::new(1.0, 0.0, true));
        registry.add(b, gravity).unwrap();
        registry.add(a, brake).unwrap();
        registry.add(a, gravity).unwrap();

        let pairs: Vec<_> = registry
            .registrations()
            .map(|r| (r.particle, r.generator))
            .collect();
        assert_eq!(pairs, vec![(b, gravity), (a, brake), (a, gravity)]);

        registry.remove(a, brake);
        let pairs: Vec<_> = registry
            .registrations()
            .map(|r| (r.particle, r.generator))
            .collect();
        assert_eq!(pairs, vec![(b, gravity), (a, gravity)]);
    }

    #[test]
    fn runs_even_with_non_positive_duration() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::default().with_mass(2.0));
        let mut registry = ParticleForceRegistry::new();
        let gravity = registry.add_generator(ParticleGravity::new(Vec3::NEG_Y));
        registry.add(a, gravity).unwrap();

        registry.update_forces(&mut particles, 0.0);
        registry.update_forces(&mut particles, -1.0);

        assert_eq!(particles.get(a).unwrap().accumulated_force(), Vec3::NEG_Y * 4.0);
    }

    #[test]
    fn rejects_unknown_generator() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::default());
        let mut registry = ParticleForceRegistry::new();
        let gravity = registry.add_generator(ParticleGravity::new(Vec3::NEG_Y));
        registry.remove_generator(gravity);

        assert_eq!(registry.add(a, gravity), Err(ForceError::UnknownGenerator));
    }

    #[test]
    fn stale_particles_are_skipped() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::default());
        let b = particles.insert(Particle::default());
        let mut registry = ParticleForceRegistry::new();
        let gravity = registry.add_generator(ParticleGravity::new(Vec3::NEG_Y));
        registry.add(a, gravity).unwrap();
        registry.add(b, gravity).unwrap();
        particles.remove(a);

        registry.update_forces(&mut particles, 0.1);

        assert_eq!(registry.last_pass().stale_skipped, 1);
        assert_eq!(particles.get(b).unwrap().accumulated_force(), Vec3::NEG_Y);
    }

    #[test]
    fn removal_drops_matching_registrations() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::default());
        let b = particles.insert(Particle::default());
        let mut registry = ParticleForceRegistry::new();
        let gravity = registry.add_generator(ParticleGravity::new(Vec3::NEG_Y));
        let brake = registry.add_generator(ParticleAirbrake::new(1.0, 0.0, true));
        registry.add(a, gravity).unwrap();
        registry.add(a, gravity).unwrap();
        registry.add(a, brake).unwrap();
        registry.add(b, gravity).unwrap();

        assert!(registry.remove(a, gravity));
        assert!(!registry.remove(a, gravity));
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.remove_particle(b), 1);
        assert!(registry.remove_generator(brake).is_some());
        assert!(registry.is_empty());
        assert_eq!(registry.generator_count(), 1);
    }

    #[test]
    fn typed_access_reaches_concrete_generator() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::default().with_velocity(Vec3::X));
        let mut registry = ParticleForceRegistry::new();
        let brake = registry.add_generator(ParticleAirbrake::new(1.0, 0.0, false));
        registry.add(a, brake).unwrap();

        assert!(registry.generator::<ParticleGravity>(brake).is_none());

        registry.update_forces(&mut particles, 0.1);
        assert_eq!(particles.get(a).unwrap().accumulated_force(), Vec3::ZERO);

        registry
            .generator_mut::<ParticleAirbrake>(brake)
            .unwrap()
            .set_brake(true);
        registry.update_forces(&mut particles, 0.1);
        assert_eq!(particles.get(a).unwrap().accumulated_force(), Vec3::NEG_X);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_pass_matches_serial_pass() {
        use crate::dynamics::springs::ParticleAnchoredSpring;

        let build = || {
            let mut particles = ParticleSet::new();
            let ids: Vec<_> = (0..64)
                .map(|i| {
                    let position = Vec3::new(i as f32 * 0.37, (i % 7) as f32, -(i as f32));
                    particles.insert(Particle::new(position).with_mass(1.0 + i as f32))
                })
                .collect();
            let mut registry = ParticleForceRegistry::new();
            let gravity = registry.add_generator(ParticleGravity::new(Vec3::new(0.0, -9.81, 0.0)));
            let spring = registry.add_generator(ParticleAnchoredSpring::new(Vec3::ONE, 3.0, 2.0));
            for id in &ids {
                registry.add(*id, gravity).unwrap();
                registry.add(*id, spring).unwrap();
            }
            (particles, ids, registry)
        };

        let (mut serial, ids, mut serial_registry) = build();
        serial_registry.update_forces(&mut serial, 0.016);
        let (mut parallel, _, mut parallel_registry) = build();
        parallel_registry.update_forces_parallel(&mut parallel, 0.016);

        for id in ids {
            assert_eq!(
                serial.get(id).unwrap().accumulated_force(),
                parallel.get(id).unwrap().accumulated_force()
            );
        }
        assert_eq!(
            serial_registry.last_pass().forces_applied,
            parallel_registry.last_pass().forces_applied
        );
    }
    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_pass_keeps_serial_order_for_shared_limited_spring() {
        use crate::dynamics::springs::ParticleLimitedSpring;

        // The spring halves on the first overstretched call (b), so the
        // second evaluation on `a` must see the halved constant.
        let build = || {
            let mut particles = ParticleSet::new();
            let anchor = particles.insert(Particle::new(Vec3::ZERO));
            let a = particles.insert(Particle::new(Vec3::new(3.0, 0.0, 0.0)));
            let b = particles.insert(Particle::new(Vec3::new(20.0, 0.0, 0.0)));
            let mut registry = ParticleForceRegistry::new();
            let spring = registry.add_generator(ParticleLimitedSpring::new(anchor, 8.0, 1.0, 10.0));
            registry.add(a, spring).unwrap();
            registry.add(b, spring).unwrap();
            registry.add(a, spring).unwrap();
            (particles, a, b, registry)
        };

        let (mut serial, a, b, mut serial_registry) = build();
        serial_registry.update_forces(&mut serial, 0.016);
        let (mut parallel, _, _, mut parallel_registry) = build();
        parallel_registry.update_forces_parallel(&mut parallel, 0.016);

        assert_eq!(
            serial.get(a).unwrap().accumulated_force(),
            Vec3::new(-24.0, 0.0, 0.0)
        );
        for id in [a, b] {
            assert_eq!(
                serial.get(id).unwrap().accumulated_force(),
                parallel.get(id).unwrap().accumulated_force()
            );
        }
    }
}
