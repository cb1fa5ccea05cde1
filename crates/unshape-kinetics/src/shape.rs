//! Rigid body shapes and axis-aligned bounds.

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{KineticsError, Result};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl Aabb {
    /// Creates a box from two corners.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Creates a box centered at `center`.
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Smallest box enclosing every point.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    /// Center point.
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Half the size along each axis.
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Returns whether the boxes overlap. Touching edges count.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Returns whether `point` lies inside or on the boundary.
    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Collision and inertia shape of a rigid body, in body-local space.
///
/// Local space has the body's center of mass at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    /// Disc.
    Circle {
        /// Radius.
        radius: f32,
    },
    /// Rectangle centered on the origin.
    Rectangle {
        /// Extent along local x.
        width: f32,
        /// Extent along local y.
        height: f32,
    },
}

fn check_dimension(name: &str, value: f32) -> Result<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(KineticsError::InvalidShape(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

impl Shape {
    /// Creates a circle.
    pub fn circle(radius: f32) -> Result<Self> {
        Ok(Shape::Circle {
            radius: check_dimension("radius", radius)?,
        })
    }

    /// Creates a rectangle.
    pub fn rectangle(width: f32, height: f32) -> Result<Self> {
        Ok(Shape::Rectangle {
            width: check_dimension("width", width)?,
            height: check_dimension("height", height)?,
        })
    }

    /// Creates a square.
    pub fn square(size: f32) -> Result<Self> {
        Self::rectangle(size, size)
    }

    /// Re-checks the parameters of a shape built as a literal.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Shape::Circle { radius } => check_dimension("radius", radius).map(|_| ()),
            Shape::Rectangle { width, height } => {
                check_dimension("width", width)?;
                check_dimension("height", height).map(|_| ())
            }
        }
    }

    /// Moment of inertia about the center of mass.
    pub fn moment_of_inertia(&self, mass: f32) -> f32 {
        match *self {
            Shape::Circle { radius } => 0.5 * mass * radius * radius,
            Shape::Rectangle { width, height } => mass * (width * width + height * height) / 12.0,
        }
    }

    /// Local-space bounds.
    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_center(Vec2::ZERO, self.half_extents())
    }

    /// Half-size of the local bounds.
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Rectangle { width, height } => Vec2::new(width, height) * 0.5,
        }
    }

    /// Returns whether a local-space point lies inside or on the boundary.
    pub fn contains(&self, point: Vec2) -> bool {
        match *self {
            Shape::Circle { radius } => point.length_squared() <= radius * radius,
            Shape::Rectangle { .. } => self.bounding_box().contains(point),
        }
    }

    /// Area.
    pub fn area(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Rectangle { width, height } => width * height,
        }
    }
}
