//! Fixed-step driving for external schedulers.
//!
//! A render loop or timer owns the clock; [`StepDriver`] turns its calls
//! into whole fixed-size world ticks and stops issuing them once an
//! optional total duration has elapsed.

use crate::error::{KineticsError, Result, check_time_step};
use crate::world::PhysicsWorld;

/// Default cap on ticks issued for one frame.
pub const DEFAULT_MAX_STEPS_PER_FRAME: usize = 8;

/// Issues fixed-size ticks to a [`PhysicsWorld`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepDriver {
    time_step: f32,
    duration: Option<f64>,
    max_steps_per_frame: usize,
    elapsed: f64,
    accumulator: f64,
    steps: u64,
}

impl StepDriver {
    /// Creates a driver with no duration limit.
    pub fn new(time_step: f32) -> Result<Self> {
        Ok(Self {
            time_step: check_time_step(time_step)?,
            duration: None,
            max_steps_per_frame: DEFAULT_MAX_STEPS_PER_FRAME,
            elapsed: 0.0,
            accumulator: 0.0,
            steps: 0,
        })
    }

    /// Stops ticking once `duration` seconds have been simulated.
    pub fn with_duration(mut self, duration: f32) -> Result<Self> {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(KineticsError::InvalidDuration(duration));
        }
        self.duration = Some(f64::from(duration));
        Ok(self)
    }

    /// Caps the ticks issued by one [`advance`](Self::advance) call.
    pub fn with_max_steps_per_frame(mut self, max_steps: usize) -> Self {
        self.max_steps_per_frame = max_steps.max(1);
        self
    }

    /// Fixed tick size.
    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    /// Total simulated time issued so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Ticks issued so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Returns whether the configured duration has been reached.
    pub fn is_finished(&self) -> bool {
        let tolerance = f64::from(self.time_step) * 1.0e-3;
        self.duration
            .is_some_and(|duration| self.elapsed + tolerance >= duration)
    }

    /// Issues one tick unless finished. Returns whether a tick ran.
    pub fn tick(&mut self, world: &mut PhysicsWorld) -> Result<bool> {
        if self.is_finished() {
            return Ok(false);
        }

        world.update(self.time_step)?;
        self.elapsed += f64::from(self.time_step);
        self.steps += 1;

        if self.is_finished() {
            tracing::debug!(steps = self.steps, elapsed = self.elapsed, "driver finished");
        }
        Ok(true)
    }

    /// Accumulates a variable frame time and issues as many whole ticks as
    /// fit. Returns the number of ticks issued.
    ///
    /// When the cap is hit the leftover backlog is discarded so a slow frame
    /// cannot snowball into ever longer catch-up bursts.
    pub fn advance(&mut self, world: &mut PhysicsWorld, frame_time: f32) -> Result<usize> {
        if !(frame_time.is_finite() && frame_time >= 0.0) {
            return Err(KineticsError::NonPositiveTimeStep(frame_time));
        }

        self.accumulator += f64::from(frame_time);
        let dt = f64::from(self.time_step);
        let mut issued = 0;

        while self.accumulator >= dt && issued < self.max_steps_per_frame {
            if !self.tick(world)? {
                self.accumulator = 0.0;
                break;
            }
            self.accumulator -= dt;
            issued += 1;
        }

        if self.accumulator >= dt {
            tracing::trace!(backlog = self.accumulator, "dropping frame backlog");
            self.accumulator %= dt;
        }

        Ok(issued)
    }

    /// Clears elapsed time so the driver can run again.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.accumulator = 0.0;
        self.steps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_stops_at_duration() {
        let mut world = PhysicsWorld::default();
        let mut driver = StepDriver::new(1.0 / 60.0).unwrap().with_duration(1.0).unwrap();

        let mut ticks = 0;
        while driver.tick(&mut world).unwrap() {
            ticks += 1;
        }

        assert_eq!(ticks, 60);
        assert!(driver.is_finished());
        assert_eq!(world.tick_count(), 60);
        assert!(!driver.tick(&mut world).unwrap());
    }

    #[test]
    fn test_unbounded_driver_never_finishes() {
        let mut world = PhysicsWorld::default();
        let mut driver = StepDriver::new(0.1).unwrap();
        for _ in 0..100 {
            assert!(driver.tick(&mut world).unwrap());
        }
        assert!(!driver.is_finished());
    }

    #[test]
    fn test_advance_accumulates_frames() {
        let mut world = PhysicsWorld::default();
        let mut driver = StepDriver::new(0.01).unwrap();

        assert_eq!(driver.advance(&mut world, 0.004).unwrap(), 0);
        assert_eq!(driver.advance(&mut world, 0.004).unwrap(), 0);
        assert_eq!(driver.advance(&mut world, 0.004).unwrap(), 1);
        assert_eq!(driver.advance(&mut world, 0.025).unwrap(), 2);
        assert_eq!(world.tick_count(), 3);
    }

    #[test]
    fn test_advance_caps_steps_per_frame() {
        let mut world = PhysicsWorld::default();
        let mut driver = StepDriver::new(0.01).unwrap().with_max_steps_per_frame(4);

        assert_eq!(driver.advance(&mut world, 1.0).unwrap(), 4);
        // Backlog was dropped
        assert_eq!(driver.advance(&mut world, 0.0).unwrap(), 0);
    }

    #[test]
    fn test_advance_respects_duration() {
        let mut world = PhysicsWorld::default();
        let mut driver = StepDriver::new(0.1).unwrap().with_duration(0.3).unwrap();
        assert_eq!(driver.advance(&mut world, 0.55).unwrap(), 3);
        assert!(driver.is_finished());
        assert_eq!(driver.advance(&mut world, 1.0).unwrap(), 0);

        driver.reset();
        assert!(!driver.is_finished());
        assert_eq!(driver.advance(&mut world, 0.15).unwrap(), 1);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(StepDriver::new(0.0).is_err());
        assert!(StepDriver::new(f32::INFINITY).is_err());
        assert_eq!(
            StepDriver::new(0.1).unwrap().with_duration(-1.0).unwrap_err(),
            KineticsError::InvalidDuration(-1.0)
        );

        let mut world = PhysicsWorld::default();
        let mut driver = StepDriver::new(0.1).unwrap();
        assert!(driver.advance(&mut world, -0.5).is_err());
        assert!(driver.advance(&mut world, f32::NAN).is_err());
    }
}
