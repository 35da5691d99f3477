//! # prism2d
//!
//! **Deterministic 2D Rigid-Body & Particle Physics**
//!
//! A fixed-point physics kernel in the Box2D tradition: broad-phase culling
//! over a dynamic AABB tree, SAT narrow phase with persistent manifolds,
//! island-based sequential-impulse solving, and a grid-accelerated particle
//! system. Every quantity is a `Fix64` (signed 32.32 fixed point), so two
//! runs with the same inputs produce bit-identical states on any platform.
//!
//! ## Modules
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | **math** | `Fix64`, vectors, rotations, transforms, AABBs |
//! | **shape** | Circle / polygon / edge / chain geometry |
//! | **broadphase** | Dynamic AABB tree, fat proxies, pair stream |
//! | **collision** | Manifold generation with persistent feature ids |
//! | **contact** | Contact lifecycle, begin/end events, filtering |
//! | **solver / island** | Sequential impulses, position correction, sleep |
//! | **joint** | Distance, revolute, and mouse constraints |
//! | **particle** | SoA fluid/granular solver with particle groups |
//! | **world** | The façade tying everything together |
//!
//! ## Design Principles
//!
//! - **Bit-exact determinism**: integer-only arithmetic, ordered containers,
//!   fixed iteration counts — no float, no hash-order dependence
//! - **Saturating math**: extreme inputs clamp instead of panicking
//! - **no_std compatible**: only `alloc` is required
//! - **Generation-checked handles**: stale handles resolve to `None`, never
//!   to a recycled entity
//!
//! ## Quick Start
//!
//! ```rust
//! use prism2d::prelude::*;
//!
//! let mut world = World::new(Vec2Fix::from_int(0, -10));
//!
//! // Static ground slab
//! let ground = world.create_body(&BodyDef::fixed(Vec2Fix::ZERO)).unwrap();
//! world
//!     .create_fixture(
//!         ground,
//!         FixtureDef::new(Shape::box_shape(Fix64::from_int(20), Fix64::ONE)),
//!     )
//!     .unwrap();
//!
//! // Falling box
//! let body = world
//!     .create_body(&BodyDef::dynamic(Vec2Fix::from_int(0, 10)))
//!     .unwrap();
//! world
//!     .create_fixture(body, FixtureDef::new(Shape::box_shape(Fix64::HALF, Fix64::HALF)))
//!     .unwrap();
//!
//! let dt = Fix64::from_ratio(1, 60);
//! for _ in 0..60 {
//!     world.step(dt, 8, 3).unwrap();
//! }
//! assert!(world.body(body).unwrap().position().y < Fix64::from_int(10));
//! ```
//!
//! ## Collision Events
//!
//! ```rust
//! use prism2d::prelude::*;
//!
//! let mut world = World::new(Vec2Fix::from_int(0, -10));
//! # let ground = world.create_body(&BodyDef::fixed(Vec2Fix::ZERO)).unwrap();
//! # world.create_fixture(ground, FixtureDef::new(Shape::box_shape(Fix64::from_int(20), Fix64::ONE))).unwrap();
//! # let body = world.create_body(&BodyDef::dynamic(Vec2Fix::from_int(0, 2))).unwrap();
//! # world.create_fixture(body, FixtureDef::new(Shape::circle(Vec2Fix::ZERO, Fix64::HALF))).unwrap();
//! let dt = Fix64::from_ratio(1, 60);
//! for _ in 0..120 {
//!     world.step(dt, 8, 3).unwrap();
//!     for event in world.events().begin() {
//!         // gameplay reaction to a new touch
//!         let _bodies = (event.contact.body_a, event.contact.body_b);
//!     }
//! }
//! ```
//!
//! ## Particles
//!
//! ```rust
//! use prism2d::prelude::*;
//!
//! let mut world = World::new(Vec2Fix::from_int(0, -10));
//! let mut def = ParticleGroupDef::new(Shape::box_shape(Fix64::ONE, Fix64::ONE));
//! def.flags = particle_flags::WATER | particle_flags::TENSILE;
//! def.position = Vec2Fix::from_int(0, 5);
//! let group = world.particles_mut().create_group(&def);
//! world.step(Fix64::from_ratio(1, 60), 8, 3).unwrap();
//! assert!(world.particles_mut().group_mass(group) > Fix64::ZERO);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod body;
pub mod broadphase;
pub mod collision;
pub mod error;
pub mod events;
pub mod filter;
pub mod fixture;
pub mod joint;
pub mod math;
pub mod particle;
pub mod profile;
pub mod shape;
pub mod world;

mod arena;
mod contact;
mod island;
mod solver;
mod spatial;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::body::{Body, BodyDef, BodyHandle, BodyType};
    pub use crate::error::PhysicsError;
    pub use crate::events::{ContactEvent, ContactEvents, ContactImpulses, ContactListener, ContactView};
    pub use crate::filter::Filter;
    pub use crate::fixture::{Fixture, FixtureDef, FixtureHandle};
    pub use crate::joint::{
        DistanceJointDef, Joint, JointDef, JointHandle, MouseJointDef, RevoluteJointDef,
    };
    pub use crate::math::{Aabb2, Fix64, Rot2Fix, Transform2Fix, Vec2Fix};
    pub use crate::particle::{
        particle_flags, ParticleDef, ParticleGroup, ParticleGroupDef, ParticleSystem,
        ParticleSystemDef,
    };
    pub use crate::profile::StepProfile;
    pub use crate::shape::{MassData, RayCastInput, RayHit, Shape, ShapeKind};
    pub use crate::world::{World, WorldConfig};
}

// Re-export main types at crate root
pub use prelude::*;

// ============================================================================
// Integration Tests
// ============================================================================
