//! Rigid body motion.
//!
//! Bodies carry a scalar rotation and angular velocity. Integration is
//! kinematic: gravity and custom forces change linear velocity, angular
//! velocity is only ever set by the caller.

use glam::Vec2;

use crate::error::{KineticsError, Result, check_mass, check_time_step};
use crate::force::{CustomForce, Environment};
use crate::shape::{Aabb, Shape};

/// A rigid body in the simulation.
#[derive(Debug, Clone)]
pub struct RigidBody {
    /// Center of mass in world space.
    pub position: Vec2,
    /// Linear velocity.
    pub velocity: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    /// Angular velocity in radians per second.
    pub angular_velocity: f32,
    /// Restitution (bounciness), 1.0 is perfectly elastic.
    pub restitution: f32,
    mass: f32,
    inv_mass: f32,
    inertia: f32,
    shape: Shape,
    fixed: bool,
    force: Option<CustomForce>,
}

impl RigidBody {
    /// Creates a dynamic body. Inertia is derived from shape and mass.
    pub fn new(position: Vec2, shape: Shape, mass: f32) -> Result<Self> {
        shape.validate()?;
        let mass = check_mass(mass)?;

        Ok(Self {
            position,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            restitution: 1.0,
            mass,
            inv_mass: 1.0 / mass,
            inertia: shape.moment_of_inertia(mass),
            shape,
            fixed: false,
            force: None,
        })
    }

    /// Creates an immovable body (infinite mass).
    pub fn fixed(position: Vec2, shape: Shape) -> Result<Self> {
        shape.validate()?;

        Ok(Self {
            position,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            restitution: 1.0,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            shape,
            fixed: true,
            force: None,
        })
    }

    /// Sets the initial velocity.
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        if !self.fixed {
            self.velocity = velocity;
        }
        self
    }

    /// Sets the rotation.
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the restitution, clamped to [0, 1]. NaN or infinite input is rejected.
    pub fn with_restitution(mut self, restitution: f32) -> Result<Self> {
        if !restitution.is_finite() {
            return Err(KineticsError::InvalidRestitution(restitution));
        }
        self.restitution = restitution.clamp(0.0, 1.0);
        Ok(self)
    }

    /// Attaches a custom force.
    pub fn with_force(mut self, force: CustomForce) -> Self {
        self.force = Some(force);
        self
    }

    /// Mass; 0 for fixed bodies.
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Inverse mass; 0 for fixed bodies.
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Moment of inertia about the center of mass.
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    /// Collision shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns whether the body is immovable.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Linear momentum.
    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.mass
    }

    /// Applies an impulse at the center of mass.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse * self.inv_mass;
    }

    /// Transforms a world-space point into body-local space.
    pub fn local_point(&self, world: Vec2) -> Vec2 {
        Vec2::from_angle(-self.rotation).rotate(world - self.position)
    }

    /// Transforms a body-local point into world space.
    pub fn world_point(&self, local: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.rotation).rotate(local)
    }

    /// World-space bounds, accounting for rotation.
    pub fn bounding_box(&self) -> Aabb {
        match self.shape {
            Shape::Circle { radius } => Aabb::from_center(self.position, Vec2::splat(radius)),
            Shape::Rectangle { .. } => {
                let he = self.shape.half_extents();
                let corners = [
                    Vec2::new(-he.x, -he.y),
                    Vec2::new(he.x, -he.y),
                    Vec2::new(he.x, he.y),
                    Vec2::new(-he.x, he.y),
                ];
                Aabb::from_points(corners.map(|c| self.world_point(c)))
                    .unwrap_or_else(|| Aabb::from_center(self.position, he))
            }
        }
    }

    /// Returns whether a world-space point lies inside the body.
    pub fn contains(&self, point: Vec2) -> bool {
        self.shape.contains(self.local_point(point))
    }

    /// Advances the body by one step.
    pub fn update(&mut self, dt: f32, env: &Environment) -> Result<()> {
        check_time_step(dt)?;
        if self.fixed {
            return Ok(());
        }

        let mut acceleration = env.gravity;
        if let Some(force) = &self.force {
            acceleration += force.evaluate(self.position, self.velocity, env.time) * self.inv_mass;
        }

        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
        self.rotation += self.angular_velocity * dt;
        Ok(())
    }
}
