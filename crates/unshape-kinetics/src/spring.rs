//! Shared spring kernel and point-mass integration.
//!
//! Soft bodies and spring-mass systems deposit Hooke forces into per-node
//! acceleration accumulators, then integrate every free node with
//! semi-implicit Euler. Both go through the functions here.

use glam::Vec2;

use crate::error::{KineticsError, Result};

/// Separations below this are treated as coincident and skipped.
pub const MIN_SEPARATION: f32 = 1.0e-4;

/// A mass-bearing node that springs can act on.
pub trait MassNode {
    /// Current position.
    fn position(&self) -> Vec2;
    /// Current velocity.
    fn velocity(&self) -> Vec2;
    /// Inverse mass; 0 for fixed nodes.
    fn inv_mass(&self) -> f32;
    /// Adds to the acceleration accumulator.
    fn accelerate(&mut self, acceleration: Vec2);
}

/// Geometry of a spring-like edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    /// Separation at which no force is produced.
    pub rest_length: f32,
    /// Hooke coefficient (force per unit displacement).
    pub stiffness: f32,
    /// Damping along the spring axis (force per unit relative speed).
    pub damping: f32,
}

pub(crate) fn check_spring_stiffness(stiffness: f32) -> Result<f32> {
    if stiffness.is_finite() && stiffness >= 0.0 {
        Ok(stiffness)
    } else {
        Err(KineticsError::InvalidStiffness(stiffness))
    }
}

/// Applies one spring between nodes `a` and `b`.
///
/// Returns the scalar force magnitude along the a→b axis (positive pulls the
/// endpoints together), or `None` when the endpoints coincide and the spring
/// was skipped for this step.
pub(crate) fn apply_spring<N: MassNode>(
    nodes: &mut [N],
    a: usize,
    b: usize,
    params: SpringParams,
) -> Option<f32> {
    let delta = nodes[b].position() - nodes[a].position();
    let distance = delta.length();

    if distance < MIN_SEPARATION {
        tracing::trace!(a, b, distance, "skipping degenerate spring");
        return None;
    }

    let direction = delta / distance;
    let displacement = distance - params.rest_length;

    // Hooke: F = k * x, plus damping on the closing speed
    let relative_velocity = nodes[b].velocity() - nodes[a].velocity();
    let magnitude =
        params.stiffness * displacement + params.damping * relative_velocity.dot(direction);
    let force = direction * magnitude;

    let inv_a = nodes[a].inv_mass();
    let inv_b = nodes[b].inv_mass();
    nodes[a].accelerate(force * inv_a);
    nodes[b].accelerate(-force * inv_b);

    Some(magnitude)
}

/// State of a free point mass during integration.
pub(crate) struct PointState<'a> {
    pub position: &'a mut Vec2,
    pub velocity: &'a mut Vec2,
    pub acceleration: &'a mut Vec2,
}

/// Semi-implicit Euler step under gravity plus accumulated acceleration.
///
/// Clears the accumulator afterwards.
pub(crate) fn integrate_point(state: PointState<'_>, gravity: Vec2, dt: f32) {
    *state.velocity += (gravity + *state.acceleration) * dt;
    *state.position += *state.velocity * dt;
    *state.acceleration = Vec2::ZERO;
}
