//! Simulation world.
//!
//! `PhysicsWorld` owns every simulator and advances them in a fixed order on
//! each tick: particle systems, rigid bodies (followed by collision
//! detection and response), soft bodies, cloths, then spring-mass systems.
//! Simulators are addressed through typed [`Handle`]s; the world holds no
//! clock of its own and only moves forward when [`PhysicsWorld::update`] is
//! called.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cloth::Cloth;
use crate::collision::{CollisionConfig, CollisionDetector};
use crate::error::{
    KineticsError, Result, check_air_resistance, check_gravity, check_time_step,
};
use crate::force::{DEFAULT_GRAVITY, Environment};
use crate::mass_spring::SpringMassSystem;
use crate::particle::ParticleSystem;
use crate::rigidbody::RigidBody;
use crate::softbody::SoftBody;

/// Configuration for a simulation world.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// Gravity acceleration.
    pub gravity: Vec2,
    /// Per-step particle velocity multiplier, in (0, 1].
    pub air_resistance: f32,
    /// Whether rigid body contacts are resolved each tick.
    pub resolve_collisions: bool,
    /// Contact response tuning.
    pub collision: CollisionConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            air_resistance: 1.0,
            resolve_collisions: true,
            collision: CollisionConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Sets gravity.
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Sets air resistance.
    pub fn with_air_resistance(mut self, air_resistance: f32) -> Self {
        self.air_resistance = air_resistance;
        self
    }

    /// Enables or disables collision response.
    pub fn with_collisions(mut self, resolve_collisions: bool) -> Self {
        self.resolve_collisions = resolve_collisions;
        self
    }

    /// Sets collision response tuning.
    pub fn with_collision_config(mut self, collision: CollisionConfig) -> Self {
        self.collision = collision;
        self
    }
}

/// Typed reference to a simulator owned by a [`PhysicsWorld`].
///
/// Handles stay valid until the simulator is removed; they are never reused.
pub struct Handle<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(id: u64) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Raw identifier, unique within its world.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.id)
    }
}

/// Insertion-ordered simulators of one kind.
pub struct Store<T> {
    ids: Vec<u64>,
    items: Vec<T>,
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            items: Vec::new(),
        }
    }
}

impl<T> Store<T> {
    fn position(&self, id: u64) -> Option<usize> {
        self.ids.iter().position(|&x| x == id)
    }

    fn insert(&mut self, id: u64, item: T) {
        self.ids.push(id);
        self.items.push(item);
    }

    fn get(&self, id: u64) -> Option<&T> {
        self.position(id).map(|i| &self.items[i])
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        self.position(id).map(|i| &mut self.items[i])
    }

    fn remove(&mut self, id: u64) -> Option<T> {
        let index = self.position(id)?;
        self.ids.remove(index);
        Some(self.items.remove(index))
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A simulator kind a [`PhysicsWorld`] can own.
pub trait Simulator: sealed::Sealed + Sized {
    #[doc(hidden)]
    fn store(world: &PhysicsWorld) -> &Store<Self>;
    #[doc(hidden)]
    fn store_mut(world: &mut PhysicsWorld) -> &mut Store<Self>;
}

macro_rules! impl_simulator {
    ($ty:ty, $field:ident) => {
        impl sealed::Sealed for $ty {}

        impl Simulator for $ty {
            fn store(world: &PhysicsWorld) -> &Store<Self> {
                &world.$field
            }

            fn store_mut(world: &mut PhysicsWorld) -> &mut Store<Self> {
                &mut world.$field
            }
        }
    };
}

impl_simulator!(ParticleSystem, particle_systems);
impl_simulator!(RigidBody, rigid_bodies);
impl_simulator!(SoftBody, soft_bodies);
impl_simulator!(Cloth, cloths);
impl_simulator!(SpringMassSystem, spring_systems);

/// Pose of a rigid body in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyPose {
    /// Center of mass.
    pub position: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
}

/// Read-only copy of everything renderable in a world.
///
/// Each inner list holds the node positions of one simulator, in insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldSnapshot {
    /// Elapsed simulated time.
    pub time: f64,
    /// Completed ticks.
    pub tick: u64,
    /// Live particle positions per particle system.
    pub particles: Vec<Vec<Vec2>>,
    /// Rigid body poses.
    pub rigid_bodies: Vec<BodyPose>,
    /// Vertex positions per soft body.
    pub soft_bodies: Vec<Vec<Vec2>>,
    /// Particle positions per cloth.
    pub cloths: Vec<Vec<Vec2>>,
    /// Mass positions per spring-mass system.
    pub spring_systems: Vec<Vec<Vec2>>,
}

/// Callback run once after every completed tick.
pub type Observer = Box<dyn FnMut(&PhysicsWorld)>;

/// Container that owns and advances every simulator.
pub struct PhysicsWorld {
    config: WorldConfig,
    collision: CollisionDetector,
    particle_systems: Store<ParticleSystem>,
    rigid_bodies: Store<RigidBody>,
    soft_bodies: Store<SoftBody>,
    cloths: Store<Cloth>,
    spring_systems: Store<SpringMassSystem>,
    next_id: u64,
    time: f64,
    ticks: u64,
    last_contacts: usize,
    observer: Option<Observer>,
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("config", &self.config)
            .field("particle_systems", &self.particle_systems.items.len())
            .field("rigid_bodies", &self.rigid_bodies.items.len())
            .field("soft_bodies", &self.soft_bodies.items.len())
            .field("cloths", &self.cloths.items.len())
            .field("spring_systems", &self.spring_systems.items.len())
            .field("time", &self.time)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::from_valid_config(WorldConfig::default())
    }
}

impl PhysicsWorld {
    /// Creates an empty world.
    pub fn new(config: WorldConfig) -> Result<Self> {
        check_air_resistance(config.air_resistance)?;
        check_gravity(config.gravity)?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: WorldConfig) -> Self {
        tracing::debug!(
            gravity = ?config.gravity,
            air_resistance = config.air_resistance,
            "creating physics world"
        );
        Self {
            config,
            collision: CollisionDetector::new(config.collision),
            particle_systems: Store::default(),
            rigid_bodies: Store::default(),
            soft_bodies: Store::default(),
            cloths: Store::default(),
            spring_systems: Store::default(),
            next_id: 0,
            time: 0.0,
            ticks: 0,
            last_contacts: 0,
            observer: None,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Changes gravity for subsequent ticks.
    pub fn set_gravity(&mut self, gravity: Vec2) -> Result<()> {
        self.config.gravity = check_gravity(gravity)?;
        Ok(())
    }

    /// Environment handed to simulators on the next tick.
    pub fn environment(&self) -> Environment {
        Environment {
            gravity: self.config.gravity,
            air_resistance: self.config.air_resistance,
            time: self.time as f32,
        }
    }

    /// Elapsed simulated time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of completed ticks.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Contacts found during the most recent tick.
    pub fn last_contact_count(&self) -> usize {
        self.last_contacts
    }

    // ========================================================================
    // Simulator management
    // ========================================================================

    fn insert<T: Simulator>(&mut self, simulator: T, kind: &'static str) -> Handle<T> {
        let id = self.next_id;
        self.next_id += 1;
        T::store_mut(self).insert(id, simulator);
        tracing::debug!(id, kind, "added simulator");
        Handle::new(id)
    }

    fn take<T: Simulator>(&mut self, handle: Handle<T>, kind: &'static str) -> Result<T> {
        let simulator = T::store_mut(self)
            .remove(handle.id)
            .ok_or(KineticsError::UnknownSimulator)?;
        tracing::debug!(id = handle.id, kind, "removed simulator");
        Ok(simulator)
    }

    /// Adds a particle system.
    pub fn add_particle_system(&mut self, system: ParticleSystem) -> Handle<ParticleSystem> {
        self.insert(system, "particle system")
    }

    /// Adds a rigid body.
    pub fn add_rigid_body(&mut self, body: RigidBody) -> Handle<RigidBody> {
        self.insert(body, "rigid body")
    }

    /// Adds a soft body.
    pub fn add_soft_body(&mut self, body: SoftBody) -> Handle<SoftBody> {
        self.insert(body, "soft body")
    }

    /// Adds a cloth.
    pub fn add_cloth(&mut self, cloth: Cloth) -> Handle<Cloth> {
        self.insert(cloth, "cloth")
    }

    /// Adds a spring-mass system.
    pub fn add_spring_system(&mut self, system: SpringMassSystem) -> Handle<SpringMassSystem> {
        self.insert(system, "spring-mass system")
    }

    /// Removes a particle system.
    pub fn remove_particle_system(
        &mut self,
        handle: Handle<ParticleSystem>,
    ) -> Result<ParticleSystem> {
        self.take(handle, "particle system")
    }

    /// Removes a rigid body.
    pub fn remove_rigid_body(&mut self, handle: Handle<RigidBody>) -> Result<RigidBody> {
        self.take(handle, "rigid body")
    }

    /// Removes a soft body.
    pub fn remove_soft_body(&mut self, handle: Handle<SoftBody>) -> Result<SoftBody> {
        self.take(handle, "soft body")
    }

    /// Removes a cloth.
    pub fn remove_cloth(&mut self, handle: Handle<Cloth>) -> Result<Cloth> {
        self.take(handle, "cloth")
    }

    /// Removes a spring-mass system.
    pub fn remove_spring_system(
        &mut self,
        handle: Handle<SpringMassSystem>,
    ) -> Result<SpringMassSystem> {
        self.take(handle, "spring-mass system")
    }

    /// Looks up a simulator.
    pub fn get<T: Simulator>(&self, handle: Handle<T>) -> Option<&T> {
        T::store(self).get(handle.id)
    }

    /// Looks up a simulator mutably.
    pub fn get_mut<T: Simulator>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        T::store_mut(self).get_mut(handle.id)
    }

    /// Returns whether the handle refers to a live simulator.
    pub fn contains<T: Simulator>(&self, handle: Handle<T>) -> bool {
        T::store(self).position(handle.id).is_some()
    }

    /// Particle systems in insertion order.
    pub fn particle_systems(&self) -> &[ParticleSystem] {
        &self.particle_systems.items
    }

    /// Rigid bodies in insertion order.
    pub fn rigid_bodies(&self) -> &[RigidBody] {
        &self.rigid_bodies.items
    }

    /// Soft bodies in insertion order.
    pub fn soft_bodies(&self) -> &[SoftBody] {
        &self.soft_bodies.items
    }

    /// Cloths in insertion order.
    pub fn cloths(&self) -> &[Cloth] {
        &self.cloths.items
    }

    /// Spring-mass systems in insertion order.
    pub fn spring_systems(&self) -> &[SpringMassSystem] {
        &self.spring_systems.items
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Installs a callback run after every completed tick.
    pub fn set_observer(&mut self, observer: impl FnMut(&PhysicsWorld) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Removes the tick callback.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Advances every simulator by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        check_time_step(dt)?;
        let env = self.environment();

        for system in &mut self.particle_systems.items {
            system.update(dt, &env)?;
        }

        for body in &mut self.rigid_bodies.items {
            body.update(dt, &env)?;
        }
        self.last_contacts = if self.config.resolve_collisions {
            self.collision.step(&mut self.rigid_bodies.items)
        } else {
            0
        };

        for body in &mut self.soft_bodies.items {
            body.update(dt, &env)?;
        }

        for cloth in &mut self.cloths.items {
            cloth.update(dt, &env)?;
        }

        for system in &mut self.spring_systems.items {
            system.update(dt, &env)?;
        }

        self.time += f64::from(dt);
        self.ticks += 1;
        tracing::trace!(
            tick = self.ticks,
            time = self.time,
            contacts = self.last_contacts,
            "world tick"
        );

        if let Some(mut observer) = self.observer.take() {
            observer(self);
            self.observer = Some(observer);
        }

        Ok(())
    }

    /// Copies out the current renderable state.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            time: self.time,
            tick: self.ticks,
            particles: self
                .particle_systems
                .items
                .iter()
                .map(ParticleSystem::positions)
                .collect(),
            rigid_bodies: self
                .rigid_bodies
                .items
                .iter()
                .map(|b| BodyPose {
                    position: b.position,
                    rotation: b.rotation,
                })
                .collect(),
            soft_bodies: self.soft_bodies.items.iter().map(SoftBody::positions).collect(),
            cloths: self.cloths.items.iter().map(Cloth::positions).collect(),
            spring_systems: self
                .spring_systems
                .items
                .iter()
                .map(SpringMassSystem::positions)
                .collect(),
        }
    }
}
