#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use prism2d::prelude::*;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Number of bodies to add (capped)
    body_count: u8,
    /// Position components (i16 to keep values reasonable)
    positions: Vec<(i16, i16)>,
    /// Per-body shape selector and half-extent numerator
    shapes: Vec<(bool, u8)>,
    /// Initial velocities
    velocities: Vec<(i8, i8)>,
    /// Number of simulation steps (capped)
    step_count: u8,
}

// Fuzz the world: add random bodies and step.
// Must never panic regardless of input; saturating math absorbs extremes.
fuzz_target!(|input: FuzzInput| {
    let mut world = World::new(Vec2Fix::from_int(0, -10));

    let ground = world.create_body(&BodyDef::fixed(Vec2Fix::ZERO)).unwrap();
    world
        .create_fixture(
            ground,
            FixtureDef::new(Shape::box_shape(Fix64::from_int(100), Fix64::ONE)),
        )
        .unwrap();

    let body_count = (input.body_count as usize).min(16);
    for i in 0..body_count {
        let (px, py) = input.positions.get(i).copied().unwrap_or((0, 10));
        let (vx, vy) = input.velocities.get(i).copied().unwrap_or((0, 0));
        let (circle, size) = input.shapes.get(i).copied().unwrap_or((false, 1));
        // Keep the half extent in (0, 16].
        let half = Fix64::from_ratio(i64::from(size % 64) + 1, 4);

        let mut def = BodyDef::dynamic(Vec2Fix::from_int(i64::from(px), i64::from(py)));
        def.linear_velocity = Vec2Fix::from_int(i64::from(vx), i64::from(vy));
        let body = world.create_body(&def).unwrap();
        let shape = if circle {
            Shape::circle(Vec2Fix::ZERO, half)
        } else {
            Shape::box_shape(half, half)
        };
        world.create_fixture(body, FixtureDef::new(shape)).unwrap();
    }

    let dt = Fix64::from_ratio(1, 60);
    let steps = (input.step_count as usize).min(32);
    for _ in 0..steps {
        world.step(dt, 4, 2).unwrap();
    }
});
