//! Benchmarks for prism2d
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use prism2d::prelude::*;

const DT: Fix64 = Fix64::from_ratio(1, 60);

fn world_with_ground() -> World {
    let mut world = World::new(Vec2Fix::from_int(0, -10));
    let ground = world
        .create_body(&BodyDef::fixed(Vec2Fix::ZERO))
        .expect("ground");
    world
        .create_fixture(
            ground,
            FixtureDef::new(Shape::box_shape(Fix64::from_int(50), Fix64::ONE)),
        )
        .expect("ground fixture");
    world
}

fn add_box(world: &mut World, x: i64, y: i64) {
    let body = world
        .create_body(&BodyDef::dynamic(Vec2Fix::from_int(x, y)))
        .expect("body");
    world
        .create_fixture(
            body,
            FixtureDef::new(Shape::box_shape(Fix64::HALF, Fix64::HALF)),
        )
        .expect("fixture");
}

// ============================================================================
// World step benchmarks
// ============================================================================

fn bench_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");

    group.bench_function("ten_boxes_60_steps", |b| {
        b.iter(|| {
            let mut world = world_with_ground();
            for i in 0..10 {
                add_box(&mut world, (i % 5) - 2, 2 + i);
            }
            for _ in 0..60 {
                world.step(black_box(DT), 8, 3).expect("step");
            }
            world.profile().contacts
        });
    });

    group.bench_function("hundred_box_pile_settled_step", |b| {
        // Settle once, then measure the steady-state step cost.
        let mut world = world_with_ground();
        for i in 0..100i64 {
            add_box(&mut world, (i % 10) - 5, 2 + i / 10);
        }
        for _ in 0..300 {
            world.step(DT, 8, 3).expect("settle");
        }
        b.iter(|| {
            world.step(black_box(DT), 8, 3).expect("step");
            world.profile().touching_contacts
        });
    });

    group.finish();
}

fn bench_broad_phase(c: &mut Criterion) {
    let mut group = c.benchmark_group("broad_phase");

    group.bench_function("raycast_through_200_boxes", |b| {
        let mut world = world_with_ground();
        for i in 0..200i64 {
            add_box(&mut world, (i % 20) - 10, 2 + (i / 20) * 2);
        }
        world.step(DT, 1, 1).expect("step");
        b.iter(|| {
            let mut hits = 0u32;
            world.ray_cast(
                black_box(Vec2Fix::from_int(-15, 5)),
                Vec2Fix::from_int(15, 5),
                |_fixture, _point, _normal, fraction| {
                    hits += 1;
                    fraction
                },
            );
            hits
        });
    });

    group.finish();
}

fn bench_particles(c: &mut Criterion) {
    let mut group = c.benchmark_group("particles");

    group.bench_function("water_block_60_steps", |b| {
        b.iter(|| {
            let mut world = World::new(Vec2Fix::from_int(0, -10));
            let mut def =
                ParticleGroupDef::new(Shape::box_shape(Fix64::from_int(2), Fix64::from_int(2)));
            def.flags = particle_flags::WATER | particle_flags::VISCOUS;
            def.position = Vec2Fix::from_int(0, 5);
            let group_index = world.particles_mut().create_group(&def);
            for _ in 0..60 {
                world.step(black_box(DT), 8, 3).expect("step");
            }
            world.particles_mut().group_center(group_index)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_world_step, bench_broad_phase, bench_particles);
criterion_main!(benches);
