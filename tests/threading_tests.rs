use particle_forces::*;
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn test_scene_is_sync_and_send() {
    fn assert_sync_send<T: Sync + Send>() {}
    assert_sync_send::<ParticleScene>();
    assert_sync_send::<ParticleForceRegistry>();
    assert_sync_send::<ParticleLimitedSpring>();
}

#[test]
fn test_shared_scene_across_threads() {
    let mut scene = ParticleScene::new();
    let anchor = scene.add_particle(Particle::new(Vec3::ZERO));
    let bob = scene.add_particle(Particle::new(Vec3::new(0.0, -20.0, 0.0)));
    let spring = scene.add_generator(ParticleLimitedSpring::new(anchor, 64.0, 1.0, 10.0));
    scene.register(bob, spring).unwrap();

    let scene = Arc::new(Mutex::new(scene));
    let mut handles = vec![];
    for _ in 0..4 {
        let scene = Arc::clone(&scene);
        handles.push(thread::spawn(move || {
            let mut scene = scene.lock().unwrap();
            scene.update_forces(1.0 / 60.0);
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let scene = scene.lock().unwrap();
    let constant = scene
        .registry()
        .generator::<ParticleLimitedSpring>(spring)
        .unwrap()
        .spring_constant();
    assert_eq!(constant, 4.0);
}
