//! Generic damped spring networks.
//!
//! Same force model as soft bodies, without triangles: any topology of
//! masses and connections (ropes, chains, pendulums) can be simulated.

use glam::Vec2;

use crate::error::{
    KineticsError, Result, check_damping, check_edge, check_mass, check_time_step,
};
use crate::force::Environment;
use crate::spring::{
    MassNode, PointState, SpringParams, apply_spring, check_spring_stiffness, integrate_point,
};

/// A point mass in a spring network.
#[derive(Debug, Clone)]
pub struct Mass {
    /// Current position.
    pub position: Vec2,
    /// Velocity.
    pub velocity: Vec2,
    /// Accumulated acceleration (cleared by integration).
    pub acceleration: Vec2,
    mass: f32,
    fixed: bool,
}

impl Mass {
    /// Creates a free mass.
    pub fn new(position: Vec2, mass: f32) -> Result<Self> {
        Ok(Self {
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            mass: check_mass(mass)?,
            fixed: false,
        })
    }

    /// Creates an anchored mass.
    pub fn fixed(position: Vec2, mass: f32) -> Result<Self> {
        let mut node = Self::new(position, mass)?;
        node.fixed = true;
        Ok(node)
    }

    /// Mass value.
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Whether integration skips this mass.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }
}

impl MassNode for Mass {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn inv_mass(&self) -> f32 {
        if self.fixed { 0.0 } else { 1.0 / self.mass }
    }

    fn accelerate(&mut self, acceleration: Vec2) {
        self.acceleration += acceleration;
    }
}

/// A damped spring between two masses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConnection {
    /// First mass index.
    pub a: usize,
    /// Second mass index.
    pub b: usize,
    rest_length: f32,
    /// Hooke coefficient.
    pub stiffness: f32,
    /// Damping along the connection axis.
    pub damping: f32,
}

impl SpringConnection {
    /// Separation at which the connection is relaxed.
    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    fn params(&self) -> SpringParams {
        SpringParams {
            rest_length: self.rest_length,
            stiffness: self.stiffness,
            damping: self.damping,
        }
    }
}

/// A flat list of masses and spring connections.
#[derive(Debug, Clone, Default)]
pub struct SpringMassSystem {
    masses: Vec<Mass>,
    connections: Vec<SpringConnection>,
}

impl SpringMassSystem {
    /// Creates an empty system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a rope of `segments` links hanging from a fixed first mass.
    pub fn rope(
        start: Vec2,
        end: Vec2,
        segments: usize,
        mass: f32,
        stiffness: f32,
        damping: f32,
    ) -> Result<Self> {
        if segments == 0 {
            return Err(KineticsError::InvalidShape("rope needs at least one segment".into()));
        }

        let mut system = Self::new();
        system.add_mass(Mass::fixed(start, mass)?);
        for i in 1..=segments {
            let t = i as f32 / segments as f32;
            system.add_mass(Mass::new(start.lerp(end, t), mass)?);
            system.connect(i - 1, i, stiffness, damping)?;
        }
        Ok(system)
    }

    /// Adds a mass and returns its index.
    pub fn add_mass(&mut self, mass: Mass) -> usize {
        self.masses.push(mass);
        self.masses.len() - 1
    }

    /// Connects two masses; rest length is their current separation.
    pub fn connect(&mut self, a: usize, b: usize, stiffness: f32, damping: f32) -> Result<usize> {
        check_edge(a, b, self.masses.len())?;
        let rest_length = (self.masses[b].position - self.masses[a].position).length();
        self.connections.push(SpringConnection {
            a,
            b,
            rest_length,
            stiffness: check_spring_stiffness(stiffness)?,
            damping: check_damping(damping)?,
        });
        Ok(self.connections.len() - 1)
    }

    /// Returns the masses.
    pub fn masses(&self) -> &[Mass] {
        &self.masses
    }

    /// Returns a mutable mass.
    pub fn mass_mut(&mut self, index: usize) -> Option<&mut Mass> {
        self.masses.get_mut(index)
    }

    /// Returns the connections.
    pub fn connections(&self) -> &[SpringConnection] {
        &self.connections
    }

    /// Mass positions.
    pub fn positions(&self) -> Vec<Vec2> {
        self.masses.iter().map(|m| m.position).collect()
    }

    /// Total kinetic energy of the free masses.
    pub fn kinetic_energy(&self) -> f32 {
        self.masses
            .iter()
            .filter(|m| !m.fixed)
            .map(|m| 0.5 * m.mass * m.velocity.length_squared())
            .sum()
    }

    /// Advances the network: connections deposit acceleration, then masses integrate.
    pub fn update(&mut self, dt: f32, env: &Environment) -> Result<()> {
        check_time_step(dt)?;

        for connection in &self.connections {
            apply_spring(&mut self.masses, connection.a, connection.b, connection.params());
        }

        for node in &mut self.masses {
            if node.fixed {
                node.acceleration = Vec2::ZERO;
                continue;
            }
            integrate_point(
                PointState {
                    position: &mut node.position,
                    velocity: &mut node.velocity,
                    acceleration: &mut node.acceleration,
                },
                env.gravity,
                dt,
            );
        }

        Ok(())
    }
}
