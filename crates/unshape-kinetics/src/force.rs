//! Force environment and custom force hooks.
//!
//! Every simulator is stepped against an [`Environment`] handed down by the
//! caller (normally [`PhysicsWorld`](crate::PhysicsWorld)). Effects beyond
//! gravity and springs are injected through [`ForceField`] implementations
//! wrapped in a [`CustomForce`] handle.

use std::fmt;
use std::sync::Arc;

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, check_air_resistance};

/// Default gravity: 9.8 units/s² pointing down the screen (y grows downward).
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, 9.8);

/// Shared force environment for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Environment {
    /// Gravity acceleration applied to every free node.
    pub gravity: Vec2,
    /// Per-step velocity multiplier for particles, in (0, 1]. 1 = no damping.
    pub air_resistance: f32,
    /// Simulation time at the start of the tick, in seconds.
    pub time: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            air_resistance: 1.0,
            time: 0.0,
        }
    }
}

impl Environment {
    /// Creates an environment with the given gravity and no air resistance.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            ..Default::default()
        }
    }

    /// Sets the air resistance multiplier.
    pub fn with_air_resistance(mut self, air_resistance: f32) -> Result<Self> {
        self.air_resistance = check_air_resistance(air_resistance)?;
        Ok(self)
    }

    /// Sets the simulation time.
    pub fn at_time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }
}

/// A force that depends on a body's state and the simulation time.
pub trait ForceField: Send + Sync {
    /// Returns the force (not acceleration) acting on a body.
    fn force(&self, position: Vec2, velocity: Vec2, time: f32) -> Vec2;
}

impl<F> ForceField for F
where
    F: Fn(Vec2, Vec2, f32) -> Vec2 + Send + Sync,
{
    fn force(&self, position: Vec2, velocity: Vec2, time: f32) -> Vec2 {
        self(position, velocity, time)
    }
}

/// Cheap clonable handle to a [`ForceField`].
#[derive(Clone)]
pub struct CustomForce(Arc<dyn ForceField>);

impl CustomForce {
    /// Wraps a force field.
    pub fn new(field: impl ForceField + 'static) -> Self {
        Self(Arc::new(field))
    }

    /// Evaluates the force, dropping non-finite output.
    pub fn evaluate(&self, position: Vec2, velocity: Vec2, time: f32) -> Vec2 {
        let force = self.0.force(position, velocity, time);
        if force.is_finite() { force } else { Vec2::ZERO }
    }
}

impl fmt::Debug for CustomForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomForce(..)")
    }
}

/// Constant wind blowing along a direction.
#[derive(Debug, Clone, Copy)]
pub struct Wind {
    /// Force vector.
    pub force: Vec2,
}

impl ForceField for Wind {
    fn force(&self, _position: Vec2, _velocity: Vec2, _time: f32) -> Vec2 {
        self.force
    }
}

/// Linear drag opposing velocity.
#[derive(Debug, Clone, Copy)]
pub struct Drag {
    /// Drag coefficient (force per unit velocity).
    pub coefficient: f32,
}

impl ForceField for Drag {
    fn force(&self, _position: Vec2, velocity: Vec2, _time: f32) -> Vec2 {
        -velocity * self.coefficient
    }
}

/// Attractor/repulsor with inverse-square falloff.
#[derive(Debug, Clone, Copy)]
pub struct Attractor {
    /// Attractor position.
    pub position: Vec2,
    /// Strength (positive = attract, negative = repel).
    pub strength: f32,
    /// Minimum distance (to prevent extreme forces).
    pub min_distance: f32,
}

impl ForceField for Attractor {
    fn force(&self, position: Vec2, _velocity: Vec2, _time: f32) -> Vec2 {
        let to_attractor = self.position - position;
        let dist = to_attractor.length().max(self.min_distance);
        to_attractor / dist * (self.strength / (dist * dist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_environment() {
        let env = Environment::default();
        assert_eq!(env.gravity, Vec2::new(0.0, 9.8));
        assert_eq!(env.air_resistance, 1.0);
    }

    #[test]
    fn test_air_resistance_validation() {
        assert!(Environment::default().with_air_resistance(0.98).is_ok());
        assert!(Environment::default().with_air_resistance(0.0).is_err());
        assert!(Environment::default().with_air_resistance(1.5).is_err());
    }

    #[test]
    fn test_closure_force() {
        let force = CustomForce::new(|_p: Vec2, _v: Vec2, t: f32| Vec2::new(t, 0.0));
        assert_eq!(force.evaluate(Vec2::ZERO, Vec2::ZERO, 2.0), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_non_finite_force_is_dropped() {
        let force = CustomForce::new(|_p: Vec2, _v: Vec2, _t: f32| Vec2::new(f32::NAN, 1.0));
        assert_eq!(force.evaluate(Vec2::ZERO, Vec2::ZERO, 0.0), Vec2::ZERO);
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let drag = Drag { coefficient: 0.5 };
        let f = drag.force(Vec2::ZERO, Vec2::new(4.0, 0.0), 0.0);
        assert_eq!(f, Vec2::new(-2.0, 0.0));
    }

    #[test]
    fn test_attractor_pulls() {
        let attractor = Attractor {
            position: Vec2::new(10.0, 0.0),
            strength: 10.0,
            min_distance: 0.1,
        };
        assert!(attractor.force(Vec2::ZERO, Vec2::ZERO, 0.0).x > 0.0);
    }
}
