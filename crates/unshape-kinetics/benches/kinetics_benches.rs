//! Benchmarks for kinetics simulation.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::Vec2;
use unshape_kinetics::{
    Cloth, CollisionDetector, ParticleEmitter, ParticleSystem, PhysicsWorld, RigidBody, Shape,
    SoftBody, SpringMassSystem, WorldConfig,
};

fn bench_particles(c: &mut Criterion) {
    c.bench_function("particles_step_10_emitters", |b| {
        let mut system = ParticleSystem::with_capacity(5000);
        for i in 0..10 {
            let emitter = ParticleEmitter::new(
                Vec2::new(i as f32 * 10.0, 0.0),
                Vec2::new(0.0, -20.0),
                120.0,
                2.0,
            )
            .unwrap();
            system.add_emitter(emitter);
        }
        let env = PhysicsWorld::default().environment();

        b.iter(|| {
            system.update(1.0 / 60.0, &env).unwrap();
            black_box(&system);
        })
    });
}

fn bench_soft_body(c: &mut Criterion) {
    c.bench_function("softbody_grid_10x10", |b| {
        let mut body =
            SoftBody::grid(Vec2::ZERO, Vec2::new(10.0, 10.0), 10, 10, 0.1, 200.0).unwrap();
        body.pin(0).unwrap();
        body.pin(9).unwrap();
        let env = PhysicsWorld::default().environment();

        b.iter(|| {
            body.update(1.0 / 120.0, &env).unwrap();
            black_box(&body);
        })
    });
}

fn bench_cloth(c: &mut Criterion) {
    c.bench_function("cloth_20x20_10_iterations", |b| {
        let mut cloth = Cloth::grid(Vec2::ZERO, Vec2::new(5.0, 5.0), 20, 20, 0.05, 1.0).unwrap();
        cloth.pin_top_row().unwrap();
        let env = PhysicsWorld::default().environment();

        b.iter(|| {
            cloth.update(1.0 / 60.0, &env).unwrap();
            black_box(&cloth);
        })
    });

    c.bench_function("cloth_relax_pass_20x20", |b| {
        let mut cloth = Cloth::grid(Vec2::ZERO, Vec2::new(5.0, 5.0), 20, 20, 0.05, 0.5).unwrap();

        b.iter(|| black_box(cloth.relax()))
    });
}

fn bench_spring_mass(c: &mut Criterion) {
    c.bench_function("rope_100_segments", |b| {
        let mut rope =
            SpringMassSystem::rope(Vec2::ZERO, Vec2::new(50.0, 0.0), 100, 0.1, 500.0, 1.0).unwrap();
        let env = PhysicsWorld::default().environment();

        b.iter(|| {
            rope.update(1.0 / 240.0, &env).unwrap();
            black_box(&rope);
        })
    });
}

fn bench_collision_detection(c: &mut Criterion) {
    c.bench_function("collision_circles_100", |b| {
        let bodies: Vec<RigidBody> = (0..100)
            .map(|i| {
                let pos = Vec2::new((i % 10) as f32 * 1.5, (i / 10) as f32 * 1.5);
                RigidBody::new(pos, Shape::circle(1.0).unwrap(), 1.0).unwrap()
            })
            .collect();
        let detector = CollisionDetector::default();

        b.iter(|| black_box(detector.detect_collisions(&bodies)))
    });

    c.bench_function("collision_mixed_shapes_100", |b| {
        let bodies: Vec<RigidBody> = (0..100)
            .map(|i| {
                let pos = Vec2::new((i % 10) as f32 * 1.5, (i / 10) as f32 * 1.5);
                let shape = if i % 2 == 0 {
                    Shape::circle(0.8).unwrap()
                } else {
                    Shape::rectangle(1.6, 1.0).unwrap()
                };
                RigidBody::new(pos, shape, 1.0)
                    .unwrap()
                    .with_rotation(i as f32 * 0.3)
            })
            .collect();
        let detector = CollisionDetector::default();

        b.iter(|| black_box(detector.detect_collisions(&bodies)))
    });
}

fn bench_world_step(c: &mut Criterion) {
    c.bench_function("world_step_mixed", |b| {
        let mut world = PhysicsWorld::new(WorldConfig::default()).unwrap();

        let mut particles = ParticleSystem::with_capacity(1000);
        particles.add_emitter(
            ParticleEmitter::new(Vec2::ZERO, Vec2::new(2.0, -10.0), 200.0, 3.0).unwrap(),
        );
        world.add_particle_system(particles);

        for i in 0..50 {
            let pos = Vec2::new((i % 10) as f32 * 2.5, (i / 10) as f32 * 2.5);
            world.add_rigid_body(RigidBody::new(pos, Shape::circle(1.0).unwrap(), 1.0).unwrap());
        }
        world.add_rigid_body(
            RigidBody::fixed(Vec2::new(12.0, 20.0), Shape::rectangle(40.0, 2.0).unwrap())
                .unwrap(),
        );

        world.add_soft_body(SoftBody::ring(Vec2::new(-10.0, 0.0), 2.0, 16, 0.2, 150.0).unwrap());

        let mut cloth = Cloth::grid(Vec2::new(30.0, 0.0), Vec2::new(4.0, 4.0), 12, 12, 0.05, 1.0)
            .unwrap();
        cloth.pin_top_row().unwrap();
        world.add_cloth(cloth);

        b.iter(|| {
            world.update(1.0 / 60.0).unwrap();
            black_box(world.tick_count());
        })
    });
}

criterion_group!(
    benches,
    bench_particles,
    bench_soft_body,
    bench_cloth,
    bench_spring_mass,
    bench_collision_detection,
    bench_world_step,
);
criterion_main!(benches);
