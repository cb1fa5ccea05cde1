#![no_main]

use glam::Vec2;
use libfuzzer_sys::fuzz_target;
use unshape_kinetics::{
    Cloth, ParticleEmitter, ParticleSystem, PhysicsWorld, RigidBody, Shape, SoftBody,
    SpringMassSystem, WorldConfig,
};

fn floats(data: &[u8]) -> impl Iterator<Item = f32> + '_ {
    data.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
}

fuzz_target!(|data: &[u8]| {
    let mut values = floats(data);
    let mut next = || values.next().unwrap_or(1.0);

    // Invalid parameters must be rejected, never panic
    let config = WorldConfig::default()
        .with_gravity(Vec2::new(next(), next()))
        .with_air_resistance(next());
    let Ok(mut world) = PhysicsWorld::new(config) else {
        return;
    };

    let mut particles = ParticleSystem::with_capacity(64);
    if let Ok(emitter) = ParticleEmitter::new(Vec2::ZERO, Vec2::new(next(), next()), next(), next())
    {
        particles.add_emitter(emitter);
    }
    world.add_particle_system(particles);

    if let Ok(shape) = Shape::circle(next()) {
        if let Ok(body) = RigidBody::new(Vec2::new(next(), next()), shape, next()) {
            world.add_rigid_body(body.with_velocity(Vec2::new(next(), next())));
        }
    }
    if let Ok(shape) = Shape::rectangle(next(), next()) {
        if let Ok(body) = RigidBody::new(Vec2::new(next(), next()), shape, next()) {
            world.add_rigid_body(body.with_rotation(next()));
        }
    }
    if let Ok(body) = SoftBody::ring(Vec2::ZERO, next(), 6, next(), next()) {
        world.add_soft_body(body);
    }
    if let Ok(cloth) = Cloth::grid(Vec2::ZERO, Vec2::new(next(), next()), 3, 3, next(), next()) {
        world.add_cloth(cloth);
    }
    if let Ok(rope) = SpringMassSystem::rope(Vec2::ZERO, Vec2::X, 3, next(), next(), next()) {
        world.add_spring_system(rope);
    }

    for _ in 0..8 {
        if world.update(next()).is_err() {
            break;
        }
    }

    let _ = world.snapshot();
});
