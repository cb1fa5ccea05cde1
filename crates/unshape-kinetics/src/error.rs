//! Error types for unshape-kinetics.

use glam::Vec2;
use thiserror::Error;

/// Errors raised when a simulator is built or driven with invalid input.
///
/// Numeric degeneracy during a step (coincident spring endpoints) and
/// particle capacity exhaustion are not errors; they are handled locally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KineticsError {
    /// Mass must be finite and strictly positive.
    #[error("mass must be positive and finite, got {0}")]
    NonPositiveMass(f32),

    /// Time step must be finite and strictly positive.
    #[error("time step must be positive and finite, got {0}")]
    NonPositiveTimeStep(f32),

    /// Run duration must be finite and non-negative.
    #[error("duration must be non-negative and finite, got {0}")]
    InvalidDuration(f32),

    /// Particle lifetime must be finite and strictly positive.
    #[error("lifetime must be positive and finite, got {0}")]
    NonPositiveLifetime(f32),

    /// Emission rate (particles per second) must be finite and strictly positive.
    #[error("emission rate must be positive and finite, got {0}")]
    NonPositiveEmissionRate(f32),

    /// Stiffness outside the range accepted by the edge kind.
    #[error("invalid stiffness: {0}")]
    InvalidStiffness(f32),

    /// Damping must be finite and non-negative.
    #[error("invalid damping: {0}")]
    InvalidDamping(f32),

    /// Restitution is NaN or infinite.
    #[error("restitution must be finite, got {0}")]
    InvalidRestitution(f32),

    /// Air resistance multiplier must lie in (0, 1].
    #[error("air resistance must lie in (0, 1], got {0}")]
    InvalidAirResistance(f32),

    /// Gravity has a NaN or infinite component.
    #[error("gravity must be finite, got ({0}, {1})")]
    NonFiniteGravity(f32, f32),

    /// Shape parameters are not positive and finite.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// Grid builders need at least two nodes along each axis.
    #[error("grid needs at least 2x2 nodes, got {columns}x{rows}")]
    InvalidGrid {
        /// Nodes along the horizontal axis.
        columns: usize,
        /// Nodes along the vertical axis.
        rows: usize,
    },

    /// An edge or triangle references a node that does not exist.
    #[error("node index {index} out of range (len {len})")]
    NodeOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of nodes available.
        len: usize,
    },

    /// An edge connects a node to itself.
    #[error("edge connects node {0} to itself")]
    DegenerateEdge(usize),

    /// A handle does not refer to a live simulator in this world.
    #[error("unknown simulator handle")]
    UnknownSimulator,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KineticsError>;

pub(crate) fn check_mass(mass: f32) -> Result<f32> {
    if mass.is_finite() && mass > 0.0 {
        Ok(mass)
    } else {
        Err(KineticsError::NonPositiveMass(mass))
    }
}

pub(crate) fn check_time_step(dt: f32) -> Result<f32> {
    if dt.is_finite() && dt > 0.0 {
        Ok(dt)
    } else {
        Err(KineticsError::NonPositiveTimeStep(dt))
    }
}

pub(crate) fn check_lifetime(lifetime: f32) -> Result<f32> {
    if lifetime.is_finite() && lifetime > 0.0 {
        Ok(lifetime)
    } else {
        Err(KineticsError::NonPositiveLifetime(lifetime))
    }
}

pub(crate) fn check_damping(damping: f32) -> Result<f32> {
    if damping.is_finite() && damping >= 0.0 {
        Ok(damping)
    } else {
        Err(KineticsError::InvalidDamping(damping))
    }
}

pub(crate) fn check_air_resistance(air_resistance: f32) -> Result<f32> {
    if air_resistance.is_finite() && air_resistance > 0.0 && air_resistance <= 1.0 {
        Ok(air_resistance)
    } else {
        Err(KineticsError::InvalidAirResistance(air_resistance))
    }
}

pub(crate) fn check_gravity(gravity: Vec2) -> Result<Vec2> {
    if gravity.is_finite() {
        Ok(gravity)
    } else {
        Err(KineticsError::NonFiniteGravity(gravity.x, gravity.y))
    }
}

pub(crate) fn check_edge(a: usize, b: usize, len: usize) -> Result<()> {
    for index in [a, b] {
        if index >= len {
            return Err(KineticsError::NodeOutOfRange { index, len });
        }
    }
    if a == b {
        return Err(KineticsError::DegenerateEdge(a));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_mass() {
        assert_eq!(check_mass(2.0), Ok(2.0));
        assert_eq!(check_mass(0.0), Err(KineticsError::NonPositiveMass(0.0)));
        assert!(check_mass(-1.0).is_err());
        assert!(check_mass(f32::NAN).is_err());
        assert!(check_mass(f32::INFINITY).is_err());
    }

    #[test]
    fn test_check_time_step() {
        assert!(check_time_step(1.0 / 60.0).is_ok());
        assert!(check_time_step(0.0).is_err());
        assert!(check_time_step(-0.1).is_err());
    }

    #[test]
    fn test_check_edge() {
        assert!(check_edge(0, 1, 2).is_ok());
        assert_eq!(
            check_edge(0, 2, 2),
            Err(KineticsError::NodeOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(check_edge(1, 1, 2), Err(KineticsError::DegenerateEdge(1)));
    }

    #[test]
    fn test_check_gravity() {
        assert!(check_gravity(Vec2::new(0.0, 9.8)).is_ok());
        assert_eq!(
            check_gravity(Vec2::new(f32::INFINITY, 0.0)),
            Err(KineticsError::NonFiniteGravity(f32::INFINITY, 0.0))
        );
    }

    #[test]
    fn test_error_messages() {
        let err = KineticsError::NonPositiveTimeStep(0.0);
        assert_eq!(err.to_string(), "time step must be positive and finite, got 0");

        let err = KineticsError::InvalidGrid { columns: 1, rows: 3 };
        assert_eq!(err.to_string(), "grid needs at least 2x2 nodes, got 1x3");
    }
}
