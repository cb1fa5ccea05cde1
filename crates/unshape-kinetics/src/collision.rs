//! Collision detection and response between rigid bodies.
//!
//! Detection scans every body pair, rejects pairs whose bounding boxes do
//! not overlap, then runs an exact narrow-phase test per shape combination.
//! Response is linear only: an impulse along the contact normal plus a
//! positional push out of penetration, both split by inverse mass.

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rigidbody::RigidBody;
use crate::shape::Shape;

/// A contact between two bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Index of first body.
    pub body_a: usize,
    /// Index of second body.
    pub body_b: usize,
    /// Contact normal (from A to B).
    pub normal: Vec2,
    /// Penetration depth.
    pub depth: f32,
    /// Contact point in world space.
    pub point: Vec2,
}

impl Contact {
    /// Swaps the bodies and inverts the normal.
    #[inline]
    pub fn flip(mut self) -> Self {
        self.normal = -self.normal;
        std::mem::swap(&mut self.body_a, &mut self.body_b);
        self
    }
}

/// Collision response tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollisionConfig {
    /// Penetration allowed before positional correction kicks in.
    pub slop: f32,
    /// Fraction of the remaining penetration removed per resolve, in [0, 1].
    pub correction: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            slop: 0.01,
            correction: 0.8,
        }
    }
}

impl CollisionConfig {
    /// Sets the penetration slop.
    pub fn with_slop(mut self, slop: f32) -> Self {
        self.slop = slop.max(0.0);
        self
    }

    /// Sets the correction fraction.
    pub fn with_correction(mut self, correction: f32) -> Self {
        self.correction = correction.clamp(0.0, 1.0);
        self
    }
}

/// Test circle-circle collision.
pub fn circle_circle(
    a: usize,
    b: usize,
    pos_a: Vec2,
    radius_a: f32,
    pos_b: Vec2,
    radius_b: f32,
) -> Option<Contact> {
    let d = pos_b - pos_a;
    let dist_sq = d.length_squared();
    let radius_sum = radius_a + radius_b;

    if dist_sq >= radius_sum * radius_sum {
        return None;
    }

    let dist = dist_sq.sqrt();
    // Concentric circles have no preferred axis
    let normal = if dist > 0.0 { d / dist } else { Vec2::Y };

    Some(Contact {
        body_a: a,
        body_b: b,
        normal,
        depth: radius_sum - dist,
        point: pos_a + normal * radius_a,
    })
}

/// Test rectangle-circle collision. The normal points from the rectangle
/// toward the circle.
pub fn rect_circle(
    rect_idx: usize,
    circle_idx: usize,
    rect: &RigidBody,
    circle_pos: Vec2,
    radius: f32,
) -> Option<Contact> {
    let he = rect.shape().half_extents();
    let local = rect.local_point(circle_pos);
    let clamped = local.clamp(-he, he);

    let diff = local - clamped;
    let dist_sq = diff.length_squared();

    if dist_sq >= radius * radius {
        return None;
    }

    let dist = dist_sq.sqrt();
    let (local_normal, depth) = if dist > 0.0 {
        (diff / dist, radius - dist)
    } else {
        // Center inside the rectangle: push out along the shallowest axis
        let penetration = he - local.abs();
        if penetration.x < penetration.y {
            (Vec2::X * sign(local.x), radius + penetration.x)
        } else {
            (Vec2::Y * sign(local.y), radius + penetration.y)
        }
    };

    let rotation = Vec2::from_angle(rect.rotation);
    Some(Contact {
        body_a: rect_idx,
        body_b: circle_idx,
        normal: rotation.rotate(local_normal),
        depth,
        point: rect.world_point(clamped),
    })
}

/// Test rectangle-rectangle collision with the separating axis theorem.
pub fn rect_rect(a: usize, b: usize, body_a: &RigidBody, body_b: &RigidBody) -> Option<Contact> {
    let he_a = body_a.shape().half_extents();
    let he_b = body_b.shape().half_extents();
    let rot_a = Vec2::from_angle(body_a.rotation);
    let rot_b = Vec2::from_angle(body_b.rotation);
    let axes_a = [rot_a, rot_a.perp()];
    let axes_b = [rot_b, rot_b.perp()];

    let d = body_b.position - body_a.position;

    let mut best_depth = f32::MAX;
    let mut best_axis = Vec2::Y;

    for axis in axes_a.iter().chain(axes_b.iter()) {
        let project = |he: Vec2, axes: &[Vec2; 2]| {
            he.x * axes[0].dot(*axis).abs() + he.y * axes[1].dot(*axis).abs()
        };
        let distance = d.dot(*axis);
        let overlap = project(he_a, &axes_a) + project(he_b, &axes_b) - distance.abs();

        if overlap <= 0.0 {
            return None;
        }
        if overlap < best_depth {
            best_depth = overlap;
            best_axis = *axis * sign(distance);
        }
    }

    Some(Contact {
        body_a: a,
        body_b: b,
        normal: best_axis,
        depth: best_depth,
        point: (body_a.position + body_b.position) * 0.5,
    })
}

fn sign(value: f32) -> f32 {
    if value < 0.0 { -1.0 } else { 1.0 }
}

/// Pairwise collision detection and response.
#[derive(Debug, Clone, Default)]
pub struct CollisionDetector {
    /// Response tuning.
    pub config: CollisionConfig,
}

impl CollisionDetector {
    /// Creates a detector.
    pub fn new(config: CollisionConfig) -> Self {
        Self { config }
    }

    /// Returns whether two bodies' world bounds overlap.
    pub fn bounds_overlap(a: &RigidBody, b: &RigidBody) -> bool {
        a.bounding_box().overlaps(&b.bounding_box())
    }

    /// Detects all collisions between bodies.
    ///
    /// Every pair is visited once; pairs of fixed bodies are skipped.
    pub fn detect_collisions(&self, bodies: &[RigidBody]) -> Vec<Contact> {
        let mut contacts = Vec::new();

        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                if bodies[i].is_fixed() && bodies[j].is_fixed() {
                    continue;
                }
                if !Self::bounds_overlap(&bodies[i], &bodies[j]) {
                    continue;
                }
                if let Some(contact) = Self::test_collision(i, j, &bodies[i], &bodies[j]) {
                    contacts.push(contact);
                }
            }
        }

        tracing::trace!(bodies = bodies.len(), contacts = contacts.len(), "collision scan");
        contacts
    }

    /// Narrow-phase test between two bodies.
    pub fn test_collision(
        a: usize,
        b: usize,
        body_a: &RigidBody,
        body_b: &RigidBody,
    ) -> Option<Contact> {
        match (body_a.shape(), body_b.shape()) {
            (Shape::Circle { radius: r1 }, Shape::Circle { radius: r2 }) => {
                circle_circle(a, b, body_a.position, *r1, body_b.position, *r2)
            }
            (Shape::Rectangle { .. }, Shape::Circle { radius }) => {
                rect_circle(a, b, body_a, body_b.position, *radius)
            }
            (Shape::Circle { radius }, Shape::Rectangle { .. }) => {
                rect_circle(b, a, body_b, body_a.position, *radius).map(Contact::flip)
            }
            (Shape::Rectangle { .. }, Shape::Rectangle { .. }) => {
                rect_rect(a, b, body_a, body_b)
            }
        }
    }

    /// Resolves contacts with impulses and positional correction.
    pub fn resolve(&self, bodies: &mut [RigidBody], contacts: &[Contact]) {
        for contact in contacts {
            if let Some((body_a, body_b)) = pair_mut(bodies, contact.body_a, contact.body_b) {
                self.resolve_contact(body_a, body_b, contact);
            }
        }
    }

    /// Detects and resolves in one pass. Returns the number of contacts.
    pub fn step(&self, bodies: &mut [RigidBody]) -> usize {
        let contacts = self.detect_collisions(bodies);
        self.resolve(bodies, &contacts);
        contacts.len()
    }

    fn resolve_contact(&self, body_a: &mut RigidBody, body_b: &mut RigidBody, contact: &Contact) {
        let total_inv_mass = body_a.inv_mass() + body_b.inv_mass();
        if total_inv_mass == 0.0 {
            return;
        }

        // Relative velocity along normal
        let vn = (body_b.velocity - body_a.velocity).dot(contact.normal);

        // Only approaching bodies exchange impulse
        if vn < 0.0 {
            let e = (body_a.restitution + body_b.restitution) * 0.5;
            let j = -(1.0 + e) * vn / total_inv_mass;
            let impulse = contact.normal * j;

            body_a.apply_impulse(-impulse);
            body_b.apply_impulse(impulse);
        }

        let correction = contact.normal
            * ((contact.depth - self.config.slop).max(0.0) * self.config.correction
                / total_inv_mass);

        body_a.position -= correction * body_a.inv_mass();
        body_b.position += correction * body_b.inv_mass();
    }
}

fn pair_mut(
    bodies: &mut [RigidBody],
    a: usize,
    b: usize,
) -> Option<(&mut RigidBody, &mut RigidBody)> {
    if a == b || a.max(b) >= bodies.len() {
        return None;
    }
    if a < b {
        let (left, right) = bodies.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = bodies.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    }
}
