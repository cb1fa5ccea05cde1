//! Particles with finite lifetime and rate-limited emitters.
//!
//! A [`ParticleSystem`] owns its particles and emitters. Each tick it
//! integrates every live particle, culls the expired ones, then lets each
//! emitter append at most one new particle.

use glam::Vec2;

use crate::error::{KineticsError, Result, check_lifetime, check_mass, check_time_step};
use crate::force::{CustomForce, Environment};

/// A point mass with a remaining lifetime.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Position in world space.
    pub position: Vec2,
    /// Velocity in units per second.
    pub velocity: Vec2,
    /// Acceleration applied during the last step.
    pub acceleration: Vec2,
    /// Mass (always > 0).
    mass: f32,
    /// Remaining lifetime in seconds.
    lifetime: f32,
    /// Optional extra force.
    force: Option<CustomForce>,
}

impl Particle {
    /// Creates a particle.
    pub fn new(position: Vec2, velocity: Vec2, mass: f32, lifetime: f32) -> Result<Self> {
        Ok(Self {
            position,
            velocity,
            acceleration: Vec2::ZERO,
            mass: check_mass(mass)?,
            lifetime: check_lifetime(lifetime)?,
            force: None,
        })
    }

    /// Attaches a custom force.
    pub fn with_force(mut self, force: CustomForce) -> Self {
        self.force = Some(force);
        self
    }

    /// Mass.
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Remaining lifetime in seconds.
    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    /// Returns true while lifetime remains.
    pub fn is_alive(&self) -> bool {
        self.lifetime > 0.0
    }

    /// Advances the particle by one step.
    ///
    /// Velocity is scaled by the air resistance multiplier after the
    /// acceleration is applied, then position follows the new velocity.
    pub fn update(&mut self, dt: f32, env: &Environment) -> Result<()> {
        check_time_step(dt)?;

        let mut acceleration = env.gravity;
        if let Some(force) = &self.force {
            acceleration += force.evaluate(self.position, self.velocity, env.time) / self.mass;
        }
        self.acceleration = acceleration;

        self.velocity += acceleration * dt;
        self.velocity *= env.air_resistance;
        self.position += self.velocity * dt;
        self.lifetime -= dt;
        Ok(())
    }
}

/// Emits particles at a fixed rate.
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    /// Spawn position.
    pub position: Vec2,
    /// Initial velocity of emitted particles.
    pub velocity: Vec2,
    /// Particles per second.
    emission_rate: f32,
    /// Lifetime of emitted particles.
    particle_lifetime: f32,
    /// Mass of emitted particles.
    particle_mass: f32,
    /// Time accumulated since the last emission.
    elapsed: f32,
    /// Force inherited by emitted particles.
    force: Option<CustomForce>,
}

impl ParticleEmitter {
    /// Creates an emitter releasing unit-mass particles.
    pub fn new(
        position: Vec2,
        velocity: Vec2,
        emission_rate: f32,
        particle_lifetime: f32,
    ) -> Result<Self> {
        if !(emission_rate.is_finite() && emission_rate > 0.0) {
            return Err(KineticsError::NonPositiveEmissionRate(emission_rate));
        }
        Ok(Self {
            position,
            velocity,
            emission_rate,
            particle_lifetime: check_lifetime(particle_lifetime)?,
            particle_mass: 1.0,
            elapsed: 0.0,
            force: None,
        })
    }

    /// Sets the mass of emitted particles.
    pub fn with_particle_mass(mut self, mass: f32) -> Result<Self> {
        self.particle_mass = check_mass(mass)?;
        Ok(self)
    }

    /// Sets a force every emitted particle carries.
    pub fn with_force(mut self, force: CustomForce) -> Self {
        self.force = Some(force);
        self
    }

    /// Particles per second.
    pub fn emission_rate(&self) -> f32 {
        self.emission_rate
    }

    /// Seconds between emissions.
    pub fn interval(&self) -> f32 {
        1.0 / self.emission_rate
    }

    /// Accumulates `dt` and reports whether an emission is due.
    ///
    /// The internal clock restarts from zero on every positive signal.
    pub fn should_emit(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.interval() {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    /// Builds the particle this emitter releases.
    pub fn spawn(&self) -> Particle {
        Particle {
            position: self.position,
            velocity: self.velocity,
            acceleration: Vec2::ZERO,
            mass: self.particle_mass,
            lifetime: self.particle_lifetime,
            force: self.force.clone(),
        }
    }
}

/// Owns particles and the emitters feeding them.
#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    emitters: Vec<ParticleEmitter>,
    /// Maximum live particles; `None` = unbounded.
    max_particles: Option<usize>,
    dropped: u64,
}

impl ParticleSystem {
    /// Creates an unbounded particle system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a system holding at most `max_particles` live particles.
    pub fn with_capacity(max_particles: usize) -> Self {
        Self {
            particles: Vec::with_capacity(max_particles),
            max_particles: Some(max_particles),
            ..Default::default()
        }
    }

    /// Adds an emitter and returns its index.
    pub fn add_emitter(&mut self, emitter: ParticleEmitter) -> usize {
        self.emitters.push(emitter);
        self.emitters.len() - 1
    }

    /// Returns the emitters.
    pub fn emitters(&self) -> &[ParticleEmitter] {
        &self.emitters
    }

    /// Returns a mutable emitter by index.
    pub fn emitter_mut(&mut self, index: usize) -> Option<&mut ParticleEmitter> {
        self.emitters.get_mut(index)
    }

    /// Returns the live particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Returns the live particle count.
    pub fn count(&self) -> usize {
        self.particles.len()
    }

    /// Returns the capacity, if any.
    pub fn max_particles(&self) -> Option<usize> {
        self.max_particles
    }

    /// Returns true if the system cannot accept another particle.
    pub fn is_full(&self) -> bool {
        self.max_particles
            .is_some_and(|max| self.particles.len() >= max)
    }

    /// Number of emissions dropped because the system was full.
    pub fn dropped_emissions(&self) -> u64 {
        self.dropped
    }

    /// Inserts a particle, returning false if the system is full.
    ///
    /// A full system never evicts existing particles.
    pub fn spawn(&mut self, particle: Particle) -> bool {
        if self.is_full() {
            self.dropped += 1;
            tracing::trace!(
                count = self.particles.len(),
                "particle system full, emission dropped"
            );
            return false;
        }
        self.particles.push(particle);
        true
    }

    /// Advances all particles and emitters by one step.
    ///
    /// Integration happens before culling, and culling before emission.
    pub fn update(&mut self, dt: f32, env: &Environment) -> Result<()> {
        check_time_step(dt)?;

        for particle in &mut self.particles {
            particle.update(dt, env)?;
        }

        let before = self.particles.len();
        self.particles.retain(Particle::is_alive);
        let culled = before - self.particles.len();

        let mut emitted = 0usize;
        for i in 0..self.emitters.len() {
            if self.emitters[i].should_emit(dt) {
                let particle = self.emitters[i].spawn();
                if self.spawn(particle) {
                    emitted += 1;
                }
            }
        }

        tracing::trace!(culled, emitted, live = self.particles.len(), "particle step");
        Ok(())
    }

    /// Positions of all live particles.
    pub fn positions(&self) -> Vec<Vec2> {
        self.particles.iter().map(|p| p.position).collect()
    }

    /// Removes all particles. Emitters keep their clocks.
    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
