//! Cloth simulation by iterative constraint relaxation.
//!
//! Particles are integrated under gravity alone; distance constraints are
//! then enforced positionally over a configurable number of relaxation
//! passes. Velocities are re-derived from the corrected displacement so the
//! next tick starts from a consistent state.

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{KineticsError, Result, check_edge, check_mass, check_time_step};
use crate::force::Environment;
use crate::spring::MIN_SEPARATION;

/// Configuration for cloth simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClothConfig {
    /// Relaxation passes per tick. More passes converge closer to rest
    /// lengths at proportionally higher cost.
    pub relaxation_iterations: u32,
    /// Velocity damping per tick, in [0, 1).
    pub damping: f32,
}

impl Default for ClothConfig {
    fn default() -> Self {
        Self {
            relaxation_iterations: 10,
            damping: 0.0,
        }
    }
}

impl ClothConfig {
    /// Sets the number of relaxation passes.
    pub fn with_relaxation_iterations(mut self, iterations: u32) -> Self {
        self.relaxation_iterations = iterations;
        self
    }

    /// Sets the damping factor.
    pub fn with_damping(mut self, damping: f32) -> Result<Self> {
        self.damping = damping;
        self.validate()?;
        Ok(self)
    }

    /// Checks that damping lies in [0, 1).
    pub fn validate(&self) -> Result<()> {
        if self.damping.is_finite() && (0.0..1.0).contains(&self.damping) {
            Ok(())
        } else {
            Err(KineticsError::InvalidDamping(self.damping))
        }
    }
}

/// A particle in the cloth.
#[derive(Debug, Clone)]
pub struct ClothParticle {
    /// Current position.
    pub position: Vec2,
    /// Position at the start of the current tick.
    pub prev_position: Vec2,
    /// Velocity.
    pub velocity: Vec2,
    mass: f32,
    fixed: bool,
}

impl ClothParticle {
    /// Creates a free particle.
    pub fn new(position: Vec2, mass: f32) -> Result<Self> {
        Ok(Self {
            position,
            prev_position: position,
            velocity: Vec2::ZERO,
            mass: check_mass(mass)?,
            fixed: false,
        })
    }

    /// Creates a pinned particle.
    pub fn fixed(position: Vec2, mass: f32) -> Result<Self> {
        let mut particle = Self::new(position, mass)?;
        particle.fixed = true;
        Ok(particle)
    }

    /// Mass.
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Returns whether this particle is pinned.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Pins this particle in place.
    pub fn pin(&mut self) {
        self.fixed = true;
        self.velocity = Vec2::ZERO;
    }

    /// Releases a pinned particle.
    pub fn unpin(&mut self) {
        self.fixed = false;
    }

    fn inv_mass(&self) -> f32 {
        if self.fixed { 0.0 } else { 1.0 / self.mass }
    }
}

/// A distance constraint between two cloth particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClothConstraint {
    /// First particle index.
    pub a: usize,
    /// Second particle index.
    pub b: usize,
    rest_length: f32,
    /// Fraction of the error corrected per pass, in (0, 1].
    pub stiffness: f32,
}

impl ClothConstraint {
    /// Rest length captured at construction.
    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }
}

fn check_constraint_stiffness(stiffness: f32) -> Result<f32> {
    if stiffness.is_finite() && stiffness > 0.0 && stiffness <= 1.0 {
        Ok(stiffness)
    } else {
        Err(KineticsError::InvalidStiffness(stiffness))
    }
}

/// A particle grid held together by distance constraints.
#[derive(Debug, Clone, Default)]
pub struct Cloth {
    particles: Vec<ClothParticle>,
    constraints: Vec<ClothConstraint>,
    config: ClothConfig,
    /// Particles per row for grid cloths, 0 otherwise.
    width: usize,
}

impl Cloth {
    /// Creates an empty cloth.
    pub fn new(config: ClothConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Default::default()
        })
    }

    /// Creates a rectangular cloth grid.
    ///
    /// # Arguments
    /// * `origin` - Top-left corner of the cloth
    /// * `size` - Extent of the cloth in world units
    /// * `columns` - Number of particles along the width
    /// * `rows` - Number of particles along the height
    /// * `mass` - Mass of each particle
    /// * `stiffness` - Structural stiffness; shear constraints use 80% of it
    pub fn grid(
        origin: Vec2,
        size: Vec2,
        columns: usize,
        rows: usize,
        mass: f32,
        stiffness: f32,
    ) -> Result<Self> {
        if columns < 2 || rows < 2 {
            return Err(KineticsError::InvalidGrid { columns, rows });
        }
        let stiffness = check_constraint_stiffness(stiffness)?;

        let dx = size.x / (columns - 1) as f32;
        let dy = size.y / (rows - 1) as f32;

        let mut cloth = Self::default();
        cloth.width = columns;

        for y in 0..rows {
            for x in 0..columns {
                let pos = origin + Vec2::new(x as f32 * dx, y as f32 * dy);
                cloth.add_particle(ClothParticle::new(pos, mass)?);
            }
        }

        for y in 0..rows {
            for x in 0..columns {
                let idx = y * columns + x;

                // Structural
                if x + 1 < columns {
                    cloth.add_constraint(idx, idx + 1, stiffness)?;
                }
                if y + 1 < rows {
                    cloth.add_constraint(idx, idx + columns, stiffness)?;
                }

                // Shear
                if x + 1 < columns && y + 1 < rows {
                    cloth.add_constraint(idx, idx + columns + 1, stiffness * 0.8)?;
                    cloth.add_constraint(idx + 1, idx + columns, stiffness * 0.8)?;
                }
            }
        }

        Ok(cloth)
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: ClothConfig) -> Result<Self> {
        self.set_config(config)?;
        Ok(self)
    }

    /// Simulation configuration.
    pub fn config(&self) -> &ClothConfig {
        &self.config
    }

    /// Replaces the configuration in place. An invalid one is rejected and
    /// the current configuration kept.
    pub fn set_config(&mut self, config: ClothConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Adds a particle and returns its index.
    pub fn add_particle(&mut self, particle: ClothParticle) -> usize {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    /// Adds a constraint; rest length is the current separation.
    pub fn add_constraint(&mut self, a: usize, b: usize, stiffness: f32) -> Result<usize> {
        check_edge(a, b, self.particles.len())?;
        let rest_length = (self.particles[b].position - self.particles[a].position).length();
        self.constraints.push(ClothConstraint {
            a,
            b,
            rest_length,
            stiffness: check_constraint_stiffness(stiffness)?,
        });
        Ok(self.constraints.len() - 1)
    }

    /// Pins the particle at `index`.
    pub fn pin(&mut self, index: usize) -> Result<()> {
        let len = self.particles.len();
        self.particles
            .get_mut(index)
            .ok_or(KineticsError::NodeOutOfRange { index, len })?
            .pin();
        Ok(())
    }

    /// Pins the top row of a cloth built with [`Cloth::grid`].
    ///
    /// Cloths assembled by hand have no rows and return
    /// [`KineticsError::InvalidGrid`].
    pub fn pin_top_row(&mut self) -> Result<()> {
        if self.width == 0 {
            return Err(KineticsError::InvalidGrid {
                columns: 0,
                rows: 0,
            });
        }
        for particle in self.particles.iter_mut().take(self.width) {
            particle.pin();
        }
        Ok(())
    }

    /// Returns the particles.
    pub fn particles(&self) -> &[ClothParticle] {
        &self.particles
    }

    /// Returns a mutable particle.
    pub fn particle_mut(&mut self, index: usize) -> Option<&mut ClothParticle> {
        self.particles.get_mut(index)
    }

    /// Returns the constraints.
    pub fn constraints(&self) -> &[ClothConstraint] {
        &self.constraints
    }

    /// Particle positions.
    pub fn positions(&self) -> Vec<Vec2> {
        self.particles.iter().map(|p| p.position).collect()
    }

    /// Largest absolute deviation of any constraint from its rest length.
    pub fn max_constraint_error(&self) -> f32 {
        self.constraints
            .iter()
            .map(|c| {
                let d = (self.particles[c.b].position - self.particles[c.a].position).length();
                (d - c.rest_length).abs()
            })
            .fold(0.0, f32::max)
    }

    /// Runs one relaxation pass over every constraint.
    ///
    /// Each constraint moves its endpoints toward the rest length by
    /// `stiffness` of the current error, split by inverse mass. Returns the
    /// largest error seen before correction.
    pub fn relax(&mut self) -> f32 {
        let mut max_error = 0.0f32;

        for c in &self.constraints {
            let p0 = &self.particles[c.a];
            let p1 = &self.particles[c.b];

            let delta = p1.position - p0.position;
            let distance = delta.length();

            if distance < MIN_SEPARATION {
                continue;
            }

            let w0 = p0.inv_mass();
            let w1 = p1.inv_mass();
            let total_weight = w0 + w1;

            if total_weight == 0.0 {
                continue;
            }

            let error = distance - c.rest_length;
            max_error = max_error.max(error.abs());

            let correction = delta / distance * (error * c.stiffness / total_weight);
            self.particles[c.a].position += correction * w0;
            self.particles[c.b].position -= correction * w1;
        }

        max_error
    }

    /// Advances the cloth by one tick.
    pub fn update(&mut self, dt: f32, env: &Environment) -> Result<()> {
        check_time_step(dt)?;
        let retain = 1.0 - self.config.damping;

        for particle in &mut self.particles {
            particle.prev_position = particle.position;
            if particle.fixed {
                continue;
            }
            particle.velocity = particle.velocity * retain + env.gravity * dt;
            particle.position += particle.velocity * dt;
        }

        for _ in 0..self.config.relaxation_iterations {
            self.relax();
        }

        for particle in &mut self.particles {
            if !particle.fixed {
                particle.velocity = (particle.position - particle.prev_position) / dt;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(stiffness: f32) -> Cloth {
        let mut cloth = Cloth::new(ClothConfig::default()).unwrap();
        cloth.add_particle(ClothParticle::new(Vec2::ZERO, 1.0).unwrap());
        cloth.add_particle(ClothParticle::new(Vec2::X, 1.0).unwrap());
        cloth.add_constraint(0, 1, stiffness).unwrap();
        cloth
    }

    fn separation(cloth: &Cloth) -> f32 {
        (cloth.particles()[1].position - cloth.particles()[0].position).length()
    }

    #[test]
    fn test_default_iterations() {
        assert_eq!(ClothConfig::default().relaxation_iterations, 10);
    }

    #[test]
    fn test_relaxation_converges_monotonically() {
        for stiffness in [0.1, 0.5, 0.9] {
            let mut cloth = pair(stiffness);
            cloth.particle_mut(1).unwrap().position = Vec2::new(2.0, 0.0);

            let mut previous = separation(&cloth);
            for _ in 0..5 {
                cloth.relax();
                let current = separation(&cloth);
                assert!(current < previous, "stiffness {stiffness}: {current} !< {previous}");
                assert!(current >= 1.0 - 1e-5);
                previous = current;
            }
        }
    }

    #[test]
    fn test_full_stiffness_converges_in_one_pass() {
        let mut cloth = pair(1.0);
        cloth.particle_mut(1).unwrap().position = Vec2::new(3.0, 0.0);
        let error = cloth.relax();
        assert!((error - 2.0).abs() < 1e-6);
        assert!((separation(&cloth) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_more_iterations_converge_closer() {
        let run = |iterations: u32| {
            let config = ClothConfig::default().with_relaxation_iterations(iterations);
            let mut cloth = Cloth::new(config).unwrap();
            cloth.add_particle(ClothParticle::fixed(Vec2::ZERO, 1.0).unwrap());
            cloth.add_particle(ClothParticle::new(Vec2::X, 1.0).unwrap());
            cloth.add_constraint(0, 1, 0.5).unwrap();
            cloth.update(0.1, &Environment::default()).unwrap();
            cloth.max_constraint_error()
        };

        let few = run(2);
        let many = run(20);
        assert!(many < few, "{many} !< {few}");
        assert!(run(0) > few);
    }

    #[test]
    fn test_fixed_particles_never_move() {
        let mut cloth = Cloth::grid(Vec2::ZERO, Vec2::new(2.0, 2.0), 5, 5, 0.1, 1.0).unwrap();
        cloth.pin_top_row().unwrap();
        let pinned: Vec<Vec2> = cloth.particles()[..5].iter().map(|p| p.position).collect();

        let env = Environment::default();
        for _ in 0..120 {
            cloth.update(1.0 / 60.0, &env).unwrap();
        }

        for (particle, original) in cloth.particles()[..5].iter().zip(&pinned) {
            assert_eq!(particle.position, *original);
            assert_eq!(particle.velocity, Vec2::ZERO);
        }
        let bottom = cloth.particles()[22].position;
        assert!(bottom.is_finite());
        assert!(bottom.y > 1.9);
    }

    #[test]
    fn test_gravity_only_integration() {
        let mut cloth = Cloth::new(ClothConfig::default()).unwrap();
        cloth.add_particle(ClothParticle::new(Vec2::ZERO, 1.0).unwrap());
        cloth.update(0.5, &Environment::new(Vec2::new(0.0, 2.0))).unwrap();

        let p = &cloth.particles()[0];
        assert!((p.velocity.y - 1.0).abs() < 1e-6);
        assert!((p.position.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_coincident_particles_stay_finite() {
        let mut cloth = pair(1.0);
        cloth.particle_mut(1).unwrap().position = Vec2::ZERO;
        cloth.update(1.0 / 60.0, &Environment::default()).unwrap();
        for p in cloth.particles() {
            assert!(p.position.is_finite());
            assert!(p.velocity.is_finite());
        }
    }

    #[test]
    fn test_grid_topology() {
        let cloth = Cloth::grid(Vec2::ZERO, Vec2::new(2.0, 2.0), 3, 3, 1.0, 1.0).unwrap();
        assert_eq!(cloth.particles().len(), 9);
        // 6 horizontal + 6 vertical + 4 cells * 2 shear
        assert_eq!(cloth.constraints().len(), 20);
        assert_eq!(cloth.max_constraint_error(), 0.0);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(Cloth::grid(Vec2::ZERO, Vec2::ONE, 3, 1, 1.0, 1.0).is_err());
        assert!(Cloth::grid(Vec2::ZERO, Vec2::ONE, 3, 3, 1.0, 0.0).is_err());
        assert!(Cloth::grid(Vec2::ZERO, Vec2::ONE, 3, 3, 1.0, 1.5).is_err());
        assert!(Cloth::grid(Vec2::ZERO, Vec2::ONE, 3, 3, -1.0, 1.0).is_err());
        assert!(ClothConfig::default().with_damping(1.0).is_err());
        assert!(pair(0.5).pin(4).is_err());
    }

    #[test]
    fn test_out_of_range_damping_rejected_everywhere() {
        let bad = ClothConfig {
            relaxation_iterations: 10,
            damping: 3.0,
        };
        assert!(matches!(
            Cloth::new(bad),
            Err(KineticsError::InvalidDamping(d)) if d == 3.0
        ));
        assert!(pair(1.0).with_config(bad).is_err());
        assert!(Cloth::new(ClothConfig { damping: -0.1, ..bad }).is_err());

        let mut cloth = pair(1.0);
        assert!(cloth.set_config(bad).is_err());
        assert_eq!(cloth.config().damping, 0.0);
    }

    #[test]
    fn test_damping_never_reverses_velocity() {
        let config = ClothConfig::default().with_damping(0.5).unwrap();
        let mut cloth = Cloth::new(config).unwrap();
        cloth.add_particle(ClothParticle::new(Vec2::ZERO, 1.0).unwrap());
        cloth.particle_mut(0).unwrap().velocity = Vec2::X;

        let still = Environment::new(Vec2::ZERO);
        let mut previous = 1.0;
        for _ in 0..5 {
            cloth.update(0.1, &still).unwrap();
            let vx = cloth.particles()[0].velocity.x;
            assert!(vx > 0.0 && vx < previous, "{vx} vs {previous}");
            previous = vx;
        }
    }

    #[test]
    fn test_pin_top_row_needs_grid() {
        let mut cloth = pair(1.0);
        assert!(matches!(
            cloth.pin_top_row(),
            Err(KineticsError::InvalidGrid { .. })
        ));
        assert!(cloth.particles().iter().all(|p| !p.is_fixed()));
    }

    #[test]
    fn test_unpinned_particle_falls() {
        let mut cloth = Cloth::grid(Vec2::ZERO, Vec2::ONE, 2, 2, 1.0, 1.0).unwrap();
        cloth.pin_top_row().unwrap();
        for index in 0..2 {
            cloth.particle_mut(index).unwrap().unpin();
        }
        assert!(cloth.particles().iter().all(|p| !p.is_fixed()));

        cloth.update(0.1, &Environment::default()).unwrap();
        assert!(cloth.particles()[0].position.y > 0.0);
    }
}
