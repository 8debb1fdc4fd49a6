use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::config::{ConfigError, PursuitConfig};
use super::events::{EventBus, GameEvent};
use super::motion::{facing_rotation, MotionSystem};
use super::nav::{sample_position, NavError, SurfaceNavigator};

/// Fixed-period trigger advanced by the tick loop. Cancelling it drops any
/// pending fire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetargetTimer {
    interval_seconds: f32,
    elapsed_seconds: f32,
    armed: bool,
}

impl RetargetTimer {
    pub fn new(interval_seconds: f32) -> Self {
        Self {
            interval_seconds,
            elapsed_seconds: 0.0,
            armed: false,
        }
    }

    /// Arms the timer so that it fires on the next tick, then once per interval.
    pub fn arm(&mut self) {
        self.armed = true;
        self.elapsed_seconds = self.interval_seconds;
    }

    pub fn cancel(&mut self) {
        self.armed = false;
        self.elapsed_seconds = 0.0;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Number of fires due this tick.
    pub fn tick(&mut self, dt_seconds: f32) -> u32 {
        if !self.armed {
            return 0;
        }
        let mut due = 0u32;
        while self.elapsed_seconds >= self.interval_seconds {
            self.elapsed_seconds -= self.interval_seconds;
            due = due.saturating_add(1);
        }
        self.elapsed_seconds += dt_seconds.max(0.0);
        due
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PursuitState {
    Dormant,
    Haunting,
}

/// Agent that appears near the player and closes in, faster on every retarget.
#[derive(Debug, Clone)]
pub struct PursuitAgent {
    config: PursuitConfig,
    state: PursuitState,
    speed: f32,
    destination: Option<Vec3>,
    timer: RetargetTimer,
    retarget_count: u32,
    rng: ChaCha8Rng,
}

impl PursuitAgent {
    pub fn new(config: PursuitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: PursuitState::Dormant,
            speed: config.base_speed,
            destination: None,
            timer: RetargetTimer::new(config.retarget_interval_seconds),
            retarget_count: 0,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
        })
    }

    pub fn config(&self) -> &PursuitConfig {
        &self.config
    }

    pub fn state(&self) -> PursuitState {
        self.state
    }

    pub fn is_haunting(&self) -> bool {
        self.state == PursuitState::Haunting
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// Retargets performed since the last spawn.
    pub fn retarget_count(&self) -> u32 {
        self.retarget_count
    }

    /// Places the agent on the walkable surface in a ring around the player and
    /// starts the pursuit. Returns false when already haunting.
    pub fn spawn_and_haunt(
        &mut self,
        player_position: Vec3,
        navigator: &dyn SurfaceNavigator,
        motion: &mut dyn MotionSystem,
    ) -> Result<bool, NavError> {
        if self.is_haunting() {
            debug!("spawn_ignored_already_haunting");
            return Ok(false);
        }

        let ring_point = self.annulus_point(player_position);
        let spawn_position = sample_position(
            navigator,
            ring_point,
            self.config.nav_sample_radius,
            &mut self.rng,
        )?;
        motion.set_pose(
            spawn_position,
            facing_rotation(spawn_position, player_position),
        );

        self.speed = self.config.base_speed;
        self.destination = None;
        self.retarget_count = 0;
        self.timer.arm();
        self.state = PursuitState::Haunting;
        info!(
            spawn = ?spawn_position,
            player = ?player_position,
            speed = self.speed,
            "pursuit_started"
        );
        Ok(true)
    }

    pub fn stop_haunting(&mut self) {
        let was_haunting = self.is_haunting();
        self.timer.cancel();
        self.state = PursuitState::Dormant;
        if was_haunting {
            info!(retargets = self.retarget_count, speed = self.speed, "pursuit_stopped");
        }
    }

    /// One tick: due retargets first, then the kill check.
    pub fn update(
        &mut self,
        dt_seconds: f32,
        player_position: Vec3,
        navigator: &dyn SurfaceNavigator,
        motion: &mut dyn MotionSystem,
        bus: &mut EventBus,
    ) -> Result<(), NavError> {
        if self.is_haunting() {
            for _ in 0..self.timer.tick(dt_seconds) {
                self.retarget(player_position, navigator, motion)?;
            }
        }
        self.check_kill(player_position, &*motion, bus);
        Ok(())
    }

    fn retarget(
        &mut self,
        player_position: Vec3,
        navigator: &dyn SurfaceNavigator,
        motion: &mut dyn MotionSystem,
    ) -> Result<(), NavError> {
        let destination = sample_position(
            navigator,
            player_position,
            self.config.nav_sample_radius,
            &mut self.rng,
        )?;
        self.destination = Some(destination);
        motion.move_toward(destination, self.speed);

        let escalated = self.speed * self.config.speed_multiplier;
        self.speed = match self.config.max_speed {
            Some(cap) => escalated.min(cap),
            None => escalated,
        };
        self.retarget_count = self.retarget_count.saturating_add(1);
        debug!(
            destination = ?destination,
            next_speed = self.speed,
            retargets = self.retarget_count,
            "pursuit_retargeted"
        );
        Ok(())
    }

    /// Publishes `PlayerDied` whenever the agent is within kill distance. This
    /// is level-triggered: it fires again on every tick the player stays in range.
    pub fn check_kill(
        &self,
        player_position: Vec3,
        motion: &dyn MotionSystem,
        bus: &mut EventBus,
    ) -> bool {
        let in_range = motion.position().distance(player_position) <= self.config.kill_distance;
        if in_range {
            bus.publish(GameEvent::PlayerDied);
        }
        in_range
    }

    fn annulus_point(&mut self, center: Vec3) -> Vec3 {
        let angle_degrees: f32 = self.rng.gen_range(0.0..360.0);
        let radius: f32 = self
            .rng
            .gen_range(self.config.min_spawn_radius..=self.config.max_spawn_radius);
        let angle = angle_degrees.to_radians();
        center + Vec3::new(angle.sin(), 0.0, angle.cos()) * radius
    }
}
