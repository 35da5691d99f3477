//! A block of water particles dropped from height, traced as group stats.
//!
//! Run with: `cargo run --example particle_splash`

use prism2d::prelude::*;

fn main() {
    let mut world = World::new(Vec2Fix::from_int(0, -10));

    let mut def = ParticleGroupDef::new(Shape::box_shape(Fix64::from_int(2), Fix64::ONE));
    def.flags = particle_flags::WATER | particle_flags::TENSILE | particle_flags::VISCOUS;
    def.position = Vec2Fix::from_int(0, 8);
    def.color = [64, 128, 255, 255];
    let group = world.particles_mut().create_group(&def);

    println!(
        "created {} particles",
        world.particles().group(group).particle_count()
    );

    let dt = Fix64::from_ratio(1, 60);
    for frame in 0..240 {
        world.step(dt, 8, 3).expect("step");

        if frame % 30 == 0 {
            let center = world.particles_mut().group_center(group);
            let velocity = world.particles_mut().group_linear_velocity(group);
            println!(
                "frame {frame:3}: center = ({:.2}, {:.2})  v = ({:.2}, {:.2})  contacts = {}",
                center.x.to_f64(),
                center.y.to_f64(),
                velocity.x.to_f64(),
                velocity.y.to_f64(),
                world.profile().particle_contacts
            );
        }
    }
}
