#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use prism2d::collision::{evaluate, Manifold};
use prism2d::prelude::*;

#[derive(Debug, Arbitrary)]
struct CollisionInput {
    /// Two shapes' kinds
    kind_a: u8,
    kind_b: u8,
    /// Poses, small range so overlap is common
    x1: i8,
    y1: i8,
    angle1: i8,
    x2: i8,
    y2: i8,
    angle2: i8,
    /// Raw polygon points for the polygon cases
    points: Vec<(i8, i8)>,
}

fn make_shape(kind: u8, points: &[(i8, i8)]) -> Shape {
    match kind % 4 {
        0 => Shape::circle(Vec2Fix::ZERO, Fix64::ONE),
        1 => {
            let verts: Vec<Vec2Fix> = points
                .iter()
                .take(8)
                .map(|&(x, y)| Vec2Fix::from_int(i64::from(x), i64::from(y)))
                .collect();
            // Degenerate inputs fall back to a unit box internally.
            Shape::polygon(&verts)
        }
        2 => Shape::edge(Vec2Fix::from_int(-2, 0), Vec2Fix::from_int(2, 0)),
        _ => Shape::box_shape(Fix64::ONE, Fix64::HALF),
    }
}

// Fuzz manifold generation directly with arbitrary shape pairs and poses.
// Must never panic, and a non-empty manifold must carry a usable normal.
fuzz_target!(|input: CollisionInput| {
    let shape_a = make_shape(input.kind_a, &input.points);
    let shape_b = make_shape(input.kind_b, &input.points);

    let xf_a = Transform2Fix::new(
        Vec2Fix::from_int(i64::from(input.x1), i64::from(input.y1)),
        Rot2Fix::from_angle(Fix64::from_ratio(i64::from(input.angle1), 20)),
    );
    let xf_b = Transform2Fix::new(
        Vec2Fix::from_int(i64::from(input.x2), i64::from(input.y2)),
        Rot2Fix::from_angle(Fix64::from_ratio(i64::from(input.angle2), 20)),
    );

    // Normalize operand order the way the contact manager does.
    let (a, xa, b, xb) = if prism2d::collision::dispatch_swapped(shape_a.kind(), shape_b.kind()) {
        (&shape_b, &xf_b, &shape_a, &xf_a)
    } else {
        (&shape_a, &xf_a, &shape_b, &xf_b)
    };

    let mut manifold = Manifold::default();
    evaluate(&mut manifold, a, xa, 0, b, xb, 0);

    if manifold.count > 0 {
        let world = prism2d::collision::WorldManifold::initialize(
            &manifold,
            xa,
            a.surface_radius(),
            xb,
            b.surface_radius(),
        );
        // The normal is unit-ish or zero, never garbage.
        assert!(world.normal.length() <= Fix64::TWO);
    }
});
