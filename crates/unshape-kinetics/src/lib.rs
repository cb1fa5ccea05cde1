//! 2D physics simulation core for procedural animation.
//!
//! Provides tick-driven simulators composed behind a single world:
//! - `ParticleSystem` - emitters and short-lived point particles
//! - `SoftBody` - deformable meshes held together by springs
//! - `Cloth` - particle grids relaxed against distance constraints
//! - `SpringMassSystem` - arbitrary damped spring networks
//! - `RigidBody` + `CollisionDetector` - shaped bodies with contact response
//! - `PhysicsWorld` - owns every simulator and advances them in fixed order
//!
//! The crate holds no clock. An external scheduler calls
//! [`PhysicsWorld::update`] (directly or through a [`StepDriver`]) and reads
//! the result back with [`PhysicsWorld::snapshot`].
//!
//! ```
//! use glam::Vec2;
//! use unshape_kinetics::{PhysicsWorld, RigidBody, Shape, WorldConfig};
//!
//! let mut world = PhysicsWorld::new(WorldConfig::default()).unwrap();
//! let ball = world.add_rigid_body(
//!     RigidBody::new(Vec2::ZERO, Shape::circle(0.5).unwrap(), 1.0).unwrap(),
//! );
//!
//! for _ in 0..60 {
//!     world.update(1.0 / 60.0).unwrap();
//! }
//!
//! assert!(world.get(ball).unwrap().position.y > 4.0);
//! ```

mod cloth;
pub mod collision;
mod driver;
mod error;
mod force;
mod mass_spring;
mod particle;
mod rigidbody;
mod shape;
mod softbody;
pub mod spring;
mod world;

pub use cloth::{Cloth, ClothConfig, ClothConstraint, ClothParticle};
pub use collision::{CollisionConfig, CollisionDetector, Contact};
pub use driver::{DEFAULT_MAX_STEPS_PER_FRAME, StepDriver};
pub use error::{KineticsError, Result};
pub use force::{Attractor, CustomForce, DEFAULT_GRAVITY, Drag, Environment, ForceField, Wind};
pub use mass_spring::{Mass, SpringConnection, SpringMassSystem};
pub use particle::{Particle, ParticleEmitter, ParticleSystem};
pub use rigidbody::RigidBody;
pub use shape::{Aabb, Shape};
pub use softbody::{SoftBody, SoftBodyVertex, Spring, Triangle, triangle_area};
pub use world::{
    BodyPose, Handle, Observer, PhysicsWorld, Simulator, WorldConfig, WorldSnapshot,
};
