//! Integration tests for prism2d
//!
//! These tests verify end-to-end behaviour through the public API
//! re-exported from the crate root. All tests run deterministically —
//! no floating-point, no randomness.

use prism2d::prelude::*;

// ============================================================================
// Helpers
// ============================================================================

const DT: Fix64 = Fix64::from_ratio(1, 60);

fn run_world(world: &mut World, steps: usize) {
    for _ in 0..steps {
        world.step(DT, 8, 3).expect("step");
    }
}

fn add_ground(world: &mut World) -> BodyHandle {
    let ground = world
        .create_body(&BodyDef::fixed(Vec2Fix::ZERO))
        .expect("ground body");
    world
        .create_fixture(
            ground,
            FixtureDef::new(Shape::box_shape(Fix64::from_int(50), Fix64::ONE)),
        )
        .expect("ground fixture");
    ground
}

fn add_box(world: &mut World, x: i64, y: i64) -> BodyHandle {
    let body = world
        .create_body(&BodyDef::dynamic(Vec2Fix::from_int(x, y)))
        .expect("body");
    world
        .create_fixture(
            body,
            FixtureDef::new(Shape::box_shape(Fix64::HALF, Fix64::HALF)),
        )
        .expect("fixture");
    body
}

// ============================================================================
// Determinism
// ============================================================================

/// Running the same pile twice must produce bit-exact identical results.
#[test]
fn test_pile_determinism_bit_exact() {
    fn simulate() -> Vec<(i64, i64, i64)> {
        let mut world = World::new(Vec2Fix::from_int(0, -10));
        add_ground(&mut world);
        for i in 0..10i64 {
            add_box(&mut world, (i % 3) - 1, 2 + i);
        }
        // A couple of circles in the mix.
        for i in 0..3i64 {
            let body = world
                .create_body(&BodyDef::dynamic(Vec2Fix::from_int(i * 2 - 2, 15)))
                .expect("body");
            let mut fd = FixtureDef::new(Shape::circle(Vec2Fix::ZERO, Fix64::HALF));
            fd.restitution = Fix64::from_ratio(3, 10);
            world.create_fixture(body, fd).expect("fixture");
        }

        run_world(&mut world, 240);

        world
            .body_handles()
            .iter()
            .map(|&h| {
                let b = world.body(h).expect("live body");
                // Raw fixed-point bits — equality here is bit-exactness.
                (b.position().x.raw, b.position().y.raw, b.angle().raw)
            })
            .collect()
    }

    assert_eq!(simulate(), simulate());
}

/// Particle stepping is bit-exact too, including the neighbor grid.
#[test]
fn test_particle_determinism_bit_exact() {
    fn simulate() -> Vec<(i64, i64)> {
        let mut world = World::new(Vec2Fix::from_int(0, -10));
        let mut def = ParticleGroupDef::new(Shape::box_shape(Fix64::ONE, Fix64::ONE));
        def.flags = particle_flags::WATER | particle_flags::VISCOUS;
        def.position = Vec2Fix::from_int(0, 3);
        world.particles_mut().create_group(&def);
        run_world(&mut world, 60);
        world
            .particles()
            .positions()
            .iter()
            .map(|p| (p.x.raw, p.y.raw))
            .collect()
    }
    assert_eq!(simulate(), simulate());
}

// ============================================================================
// Momentum and restitution
// ============================================================================

/// Equal-mass circles with restitution 1 exchange velocities head on.
#[test]
fn test_momentum_exchange() {
    let mut world = World::with_config(
        Vec2Fix::ZERO,
        WorldConfig {
            velocity_threshold: Fix64::from_ratio(1, 100),
            allow_sleep: false,
            ..WorldConfig::default()
        },
    );
    let circle = |world: &mut World, x: i64, vx: i64| {
        let mut def = BodyDef::dynamic(Vec2Fix::from_int(x, 0));
        def.linear_velocity = Vec2Fix::from_int(vx, 0);
        let body = world.create_body(&def).expect("body");
        let mut fd = FixtureDef::new(Shape::circle(Vec2Fix::ZERO, Fix64::HALF));
        fd.restitution = Fix64::ONE;
        fd.friction = Fix64::ZERO;
        world.create_fixture(body, fd).expect("fixture");
        body
    };
    let a = circle(&mut world, -4, 6);
    let b = circle(&mut world, 4, -6);

    run_world(&mut world, 120);

    let va = world.body(a).expect("a").linear_velocity().x;
    let vb = world.body(b).expect("b").linear_velocity().x;
    let tol = Fix64::ONE;
    assert!((va + Fix64::from_int(6)).abs() < tol, "a: {:?}", va);
    assert!((vb - Fix64::from_int(6)).abs() < tol, "b: {:?}", vb);
    // Total momentum stays zero.
    assert!((va + vb).abs() < tol);
}

// ============================================================================
// Resting stability and sleep
// ============================================================================

#[test]
fn test_resting_stack_does_not_drift() {
    let mut world = World::new(Vec2Fix::from_int(0, -10));
    add_ground(&mut world);
    let a = add_box(&mut world, 0, 2);
    let b = add_box(&mut world, 0, 3);

    run_world(&mut world, 600);

    for handle in [a, b] {
        let body = world.body(handle).expect("body");
        assert!(
            body.position().x.abs() < Fix64::from_ratio(1, 4),
            "drifted to {:?}",
            body.position().x
        );
        assert!(body.linear_velocity().length() < Fix64::from_ratio(1, 10));
    }
    // Both asleep after a long rest.
    assert!(!world.body(a).expect("a").is_awake());
    assert!(!world.body(b).expect("b").is_awake());
}

/// A whole island sleeps together, and touching it wakes all of it.
#[test]
fn test_island_sleeps_and_wakes_as_a_unit() {
    let mut world = World::new(Vec2Fix::from_int(0, -10));
    add_ground(&mut world);
    let bottom = add_box(&mut world, 0, 1);
    let top = add_box(&mut world, 0, 2);

    run_world(&mut world, 600);
    assert!(!world.body(bottom).expect("bottom").is_awake());
    assert!(!world.body(top).expect("top").is_awake());

    // A kick to the top wakes the bottom through the shared island.
    world
        .body_mut(top)
        .expect("top")
        .apply_linear_impulse(Vec2Fix::from_int(5, 0), Vec2Fix::from_int(0, 2));
    run_world(&mut world, 2);
    assert!(world.body(bottom).expect("bottom").is_awake());
}

// ============================================================================
// Contact lifecycle
// ============================================================================

#[test]
fn test_begin_end_exactly_once_per_touch() {
    let mut world = World::new(Vec2Fix::from_int(0, -10));
    add_ground(&mut world);
    let ball = world
        .create_body(&BodyDef::dynamic(Vec2Fix::from_int(0, 4)))
        .expect("ball");
    let mut fd = FixtureDef::new(Shape::circle(Vec2Fix::ZERO, Fix64::HALF));
    fd.restitution = Fix64::from_ratio(8, 10);
    world.create_fixture(ball, fd).expect("fixture");

    let mut begins = 0usize;
    let mut ends = 0usize;
    let mut airborne_after_bounce = false;
    for _ in 0..90 {
        world.step(DT, 8, 3).expect("step");
        begins += world.events().begin().len();
        ends += world.events().end().len();
        if begins > 0 && world.contact_count() == 0 {
            airborne_after_bounce = true;
            break;
        }
    }
    assert!(airborne_after_bounce);
    assert_eq!(begins, 1);
    assert_eq!(ends, 1);
}

#[test]
fn test_destroying_touching_body_fires_no_end() {
    let mut world = World::new(Vec2Fix::from_int(0, -10));
    add_ground(&mut world);
    let body = add_box(&mut world, 0, 1);
    run_world(&mut world, 120);
    assert!(world.contact_count() > 0);

    world.destroy_body(body).expect("destroy");
    assert!(world.events().end().is_empty());
}

#[test]
fn test_destroying_touching_fixture_fires_end() {
    let mut world = World::new(Vec2Fix::from_int(0, -10));
    add_ground(&mut world);
    let body = world
        .create_body(&BodyDef::dynamic(Vec2Fix::from_int(0, 1)))
        .expect("body");
    let fixture = world
        .create_fixture(
            body,
            FixtureDef::new(Shape::box_shape(Fix64::HALF, Fix64::HALF)),
        )
        .expect("fixture");
    run_world(&mut world, 120);
    assert!(world.contact_count() > 0);

    // The body survives; collaborators hear about the broken touch.
    world.destroy_fixture(fixture).expect("destroy fixture");
    assert_eq!(world.events().end().len(), 1);
}

// ============================================================================
// Structural guards
// ============================================================================

#[test]
fn test_stale_handles_resolve_to_errors() {
    let mut world = World::new(Vec2Fix::ZERO);
    let body = add_box(&mut world, 0, 0);
    // Second fixture on the same body, destroyed below.
    let fixture = world
        .create_fixture(
            body,
            FixtureDef::new(Shape::circle(Vec2Fix::ZERO, Fix64::HALF)),
        )
        .expect("fixture");

    world.destroy_fixture(fixture).expect("destroy");
    assert!(world.fixture(fixture).is_none());
    assert_eq!(
        world.destroy_fixture(fixture),
        Err(PhysicsError::StaleFixtureHandle)
    );
    assert_eq!(
        world.set_density(fixture, Fix64::ONE),
        Err(PhysicsError::StaleFixtureHandle)
    );

    world.destroy_body(body).expect("destroy body");
    assert_eq!(world.destroy_body(body), Err(PhysicsError::StaleBodyHandle));

    // A recycled slot does not resurrect the old handle.
    let replacement = add_box(&mut world, 1, 1);
    assert!(world.body(body).is_none());
    assert!(world.body(replacement).is_some());
}

#[test]
fn test_chain_terrain_supports_box() {
    let mut world = World::new(Vec2Fix::from_int(0, -10));
    let terrain = world
        .create_body(&BodyDef::fixed(Vec2Fix::ZERO))
        .expect("terrain");
    let points = [
        Vec2Fix::from_int(-10, 0),
        Vec2Fix::from_int(-3, 0),
        Vec2Fix::from_int(3, 0),
        Vec2Fix::from_int(10, 2),
    ];
    world
        .create_fixture(terrain, FixtureDef::new(Shape::chain(&points, false)))
        .expect("chain fixture");
    let body = add_box(&mut world, 0, 3);

    run_world(&mut world, 300);
    let y = world.body(body).expect("body").position().y;
    // Resting on the flat middle segment.
    assert!(y > Fix64::from_ratio(1, 4), "fell through: {:?}", y);
    assert!(y < Fix64::ONE);
}

// ============================================================================
// Particles in the world step
// ============================================================================

#[test]
fn test_particles_fall_with_gravity() {
    let mut world = World::new(Vec2Fix::from_int(0, -10));
    let mut def = ParticleGroupDef::new(Shape::box_shape(Fix64::ONE, Fix64::ONE));
    def.position = Vec2Fix::from_int(0, 10);
    let group = world.particles_mut().create_group(&def);
    let start = world.particles_mut().group_center(group);

    run_world(&mut world, 60);

    let end = world.particles_mut().group_center(group);
    assert!(end.y < start.y - Fix64::ONE);
    assert!(world.profile().particle_contacts > 0);
}
