//! Boxes falling onto a ground slab, printed as a text trace.
//!
//! Run with: `cargo run --example falling_boxes`

use prism2d::prelude::*;

fn main() {
    let mut world = World::new(Vec2Fix::from_int(0, -10));

    let ground = world
        .create_body(&BodyDef::fixed(Vec2Fix::ZERO))
        .expect("ground");
    world
        .create_fixture(
            ground,
            FixtureDef::new(Shape::box_shape(Fix64::from_int(20), Fix64::ONE)),
        )
        .expect("ground fixture");

    let mut boxes = Vec::new();
    for i in 0..5i64 {
        let body = world
            .create_body(&BodyDef::dynamic(Vec2Fix::from_int((i % 3) - 1, 3 + i * 2)))
            .expect("body");
        world
            .create_fixture(
                body,
                FixtureDef::new(Shape::box_shape(Fix64::HALF, Fix64::HALF)),
            )
            .expect("fixture");
        boxes.push(body);
    }

    let dt = Fix64::from_ratio(1, 60);
    for frame in 0..300 {
        world.step(dt, 8, 3).expect("step");

        for event in world.events().begin() {
            println!("frame {frame:3}: contact begin between two fixtures");
            let _ = event;
        }

        if frame % 60 == 0 {
            println!("--- t = {}s ---", frame / 60);
            for (i, &b) in boxes.iter().enumerate() {
                let body = world.body(b).expect("body");
                println!(
                    "  box {i}: y = {:.3}  awake = {}",
                    body.position().y.to_f64(),
                    body.is_awake()
                );
            }
        }
    }

    let profile = world.profile();
    println!(
        "final: {} contacts, {} sleeping bodies",
        profile.contacts, profile.sleeping_bodies
    );
}
