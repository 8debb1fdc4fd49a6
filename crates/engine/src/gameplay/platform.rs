use std::fmt;

use glam::{Quat, Vec3};
use tracing::{debug, info, warn};

use super::config::{ConfigError, PlatformConfig};
use super::events::{EventBus, GameEvent};

/// The overshoot phase hands over to settling once this close to its target.
pub const OVERSHOOT_MARGIN_DEGREES: f64 = 5.0;
/// Settling snaps onto the final angle once this close.
pub const SETTLE_EPSILON_DEGREES: f64 = 1e-5;

const AXIS_MATCH_TOLERANCE: f32 = 1e-4;

/// Per-tick motion sensor readings. `None` means the device cannot provide that
/// reading at all.
pub trait MotionSensor {
    fn angular_rate(&self) -> Option<Vec3>;
    fn acceleration(&self) -> Option<Vec3>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorCapabilities {
    pub gyroscope: bool,
    pub accelerometer: bool,
}

impl Default for SensorCapabilities {
    fn default() -> Self {
        Self {
            gyroscope: true,
            accelerometer: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

impl RotationDirection {
    fn apply_sign(self, value: f64) -> f64 {
        match self {
            Self::Clockwise => value.abs(),
            Self::CounterClockwise => -value.abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPhase {
    Overshoot,
    Settle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStatus {
    Running,
    Finished,
}

/// Resumable overshoot-and-settle rotation about a single axis.
///
/// Interpolating between two rotations about one fixed axis is the same as
/// interpolating their angles, so the animation works on the angle directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAnimation {
    direction: RotationDirection,
    phase: RotationPhase,
    final_degrees: f64,
    overshoot_degrees: f64,
    rotation_speed: f32,
}

impl RotationAnimation {
    pub fn new(
        start_degrees: f64,
        step_degrees: f32,
        snap_overshoot_degrees: i32,
        direction: RotationDirection,
        rotation_speed: f32,
    ) -> Self {
        let step = direction.apply_sign(f64::from(step_degrees));
        let overshoot = direction.apply_sign(f64::from(snap_overshoot_degrees));
        Self {
            direction,
            phase: RotationPhase::Overshoot,
            final_degrees: start_degrees + step,
            overshoot_degrees: overshoot,
            rotation_speed,
        }
    }

    pub fn direction(&self) -> RotationDirection {
        self.direction
    }

    pub fn phase(&self) -> RotationPhase {
        self.phase
    }

    pub fn final_degrees(&self) -> f64 {
        self.final_degrees
    }

    pub fn target_degrees(&self) -> f64 {
        match self.phase {
            RotationPhase::Overshoot => self.final_degrees + self.overshoot_degrees,
            RotationPhase::Settle => self.final_degrees,
        }
    }

    /// Moves `angle_degrees` one tick along the animation.
    pub fn step(&mut self, angle_degrees: &mut f64, dt_seconds: f32) -> AnimationStatus {
        let factor = f64::from((self.rotation_speed * dt_seconds).clamp(0.0, 1.0));
        loop {
            let target = self.target_degrees();
            let remaining = (target - *angle_degrees).abs();
            match self.phase {
                RotationPhase::Overshoot if remaining < OVERSHOOT_MARGIN_DEGREES => {
                    self.phase = RotationPhase::Settle;
                }
                RotationPhase::Settle if remaining < SETTLE_EPSILON_DEGREES => {
                    *angle_degrees = self.final_degrees;
                    return AnimationStatus::Finished;
                }
                _ => {
                    *angle_degrees += (target - *angle_degrees) * factor;
                    return AnimationStatus::Running;
                }
            }
        }
    }
}

/// Gyro flip gesture. Platforms turning about Y read the Y rate, every other
/// axis reads X. A signed rate below the threshold turns clockwise.
pub fn detect_gyro_gesture(
    axis_is_y: bool,
    angular_rate: Vec3,
    threshold_x: f32,
    threshold_y: f32,
) -> Option<RotationDirection> {
    let (rate, threshold) = if axis_is_y {
        (angular_rate.y, threshold_y)
    } else {
        (angular_rate.x, threshold_x)
    };
    if rate.abs() < threshold {
        return None;
    }
    if rate < threshold {
        Some(RotationDirection::Clockwise)
    } else {
        Some(RotationDirection::CounterClockwise)
    }
}

/// Accelerometer flip gesture: the tilt away from the calibration baseline must
/// exceed the threshold on both Y and Z.
pub fn detect_accelerometer_gesture(base_tilt: Vec3, acceleration: Vec3, threshold: f32) -> bool {
    let difference = base_tilt - acceleration;
    difference.y.abs() > threshold && difference.z.abs() > threshold
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotatingPlatform {
    group: String,
    locked: bool,
    activated: bool,
    rotation_axis: Vec3,
    rotation_step_degrees: f32,
    snap_overshoot_degrees: i32,
    rotation_speed: f32,
    gyro_threshold_x: f32,
    gyro_threshold_y: f32,
    accelerometer_threshold: f32,
    gyro_enabled: bool,
    accelerometer_enabled: bool,
    base_tilt: Vec3,
    angle_degrees: f64,
    animation: Option<RotationAnimation>,
}

impl RotatingPlatform {
    pub fn new(
        config: &PlatformConfig,
        capabilities: SensorCapabilities,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            group: config.group.clone(),
            locked: config.locked,
            activated: false,
            rotation_axis: config.rotation_axis.normalize(),
            rotation_step_degrees: config.rotation_step_degrees,
            snap_overshoot_degrees: config.snap_overshoot_degrees,
            rotation_speed: config.rotation_speed,
            gyro_threshold_x: config.gyro_threshold_x,
            gyro_threshold_y: config.gyro_threshold_y,
            accelerometer_threshold: config.accelerometer_threshold,
            gyro_enabled: config.gyro_enabled && capabilities.gyroscope,
            accelerometer_enabled: config.accelerometer_enabled && capabilities.accelerometer,
            base_tilt: Vec3::ZERO,
            angle_degrees: f64::from(config.initial_angle_degrees),
            animation: None,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn is_rotating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn gyro_enabled(&self) -> bool {
        self.gyro_enabled
    }

    pub fn accelerometer_enabled(&self) -> bool {
        self.accelerometer_enabled
    }

    pub fn rotation_axis(&self) -> Vec3 {
        self.rotation_axis
    }

    pub fn base_tilt(&self) -> Vec3 {
        self.base_tilt
    }

    pub fn angle_degrees(&self) -> f64 {
        self.angle_degrees
    }

    pub fn animation(&self) -> Option<&RotationAnimation> {
        self.animation.as_ref()
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_axis_angle(self.rotation_axis, self.angle_degrees.to_radians() as f32)
    }

    fn axis_is_y(&self) -> bool {
        self.rotation_axis.abs_diff_eq(Vec3::Y, AXIS_MATCH_TOLERANCE)
    }

    /// Starts a rotation if the platform is armed and idle. Returns whether one started.
    pub fn try_start_rotation(&mut self, direction: RotationDirection) -> bool {
        if !self.activated || self.animation.is_some() {
            return false;
        }
        self.animation = Some(RotationAnimation::new(
            self.angle_degrees,
            self.rotation_step_degrees,
            self.snap_overshoot_degrees,
            direction,
            self.rotation_speed,
        ));
        info!(
            group = %self.group,
            ?direction,
            from_degrees = self.angle_degrees,
            "platform_rotation_started"
        );
        true
    }

    fn set_activated(&mut self, activated: bool, sensors: &dyn MotionSensor) {
        self.activated = activated;
        if activated && self.accelerometer_enabled {
            match sensors.acceleration() {
                Some(acceleration) => self.base_tilt = acceleration,
                None => self.disable_accelerometer(),
            }
        }
    }

    fn disable_gyro(&mut self) {
        self.gyro_enabled = false;
        warn!(group = %self.group, "gyroscope unavailable; gyro gestures disabled");
    }

    fn disable_accelerometer(&mut self) {
        self.accelerometer_enabled = false;
        warn!(group = %self.group, "accelerometer unavailable; tilt gestures disabled");
    }

    fn detect_gesture(&mut self, sensors: &dyn MotionSensor) -> Option<RotationDirection> {
        if self.gyro_enabled {
            match sensors.angular_rate() {
                Some(rate) => {
                    let detected = detect_gyro_gesture(
                        self.axis_is_y(),
                        rate,
                        self.gyro_threshold_x,
                        self.gyro_threshold_y,
                    );
                    if detected.is_some() {
                        return detected;
                    }
                }
                None => self.disable_gyro(),
            }
        }
        if self.accelerometer_enabled {
            match sensors.acceleration() {
                Some(acceleration) => {
                    if detect_accelerometer_gesture(
                        self.base_tilt,
                        acceleration,
                        self.accelerometer_threshold,
                    ) {
                        return Some(RotationDirection::Clockwise);
                    }
                }
                None => self.disable_accelerometer(),
            }
        }
        None
    }

    /// One tick: gesture detection while armed, then one animation step.
    pub fn update(&mut self, dt_seconds: f32, sensors: &dyn MotionSensor, manual_trigger: bool) {
        if self.activated && self.animation.is_none() {
            if let Some(direction) = self.detect_gesture(sensors) {
                self.try_start_rotation(direction);
            } else if manual_trigger {
                self.try_start_rotation(RotationDirection::Clockwise);
            }
        }

        let Some(animation) = self.animation.as_mut() else {
            return;
        };
        if animation.step(&mut self.angle_degrees, dt_seconds) == AnimationStatus::Finished {
            self.animation = None;
            info!(
                group = %self.group,
                angle_degrees = self.angle_degrees,
                "platform_rotation_finished"
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlatformId(pub usize);

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "platform#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractOutcome {
    Activated,
    Deactivated,
    Locked,
    /// Some platform of the group is mid-rotation; nothing changes until it settles.
    GroupBusy,
    UnknownPlatform,
}

/// Platforms sharing a tag. At most one of them is activated at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformGroup {
    tag: String,
    platforms: Vec<RotatingPlatform>,
}

impl PlatformGroup {
    pub fn new(tag: impl Into<String>, platforms: Vec<RotatingPlatform>) -> Result<Self, ConfigError> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(ConfigError::EmptyGroupTag);
        }
        if platforms.is_empty() {
            return Err(ConfigError::EmptyPlatformGroup { group: tag });
        }
        if let Some(stranger) = platforms.iter().find(|platform| platform.group != tag) {
            return Err(ConfigError::GroupTagMismatch {
                expected: tag,
                found: stranger.group.clone(),
            });
        }
        Ok(Self { tag, platforms })
    }

    pub fn from_configs(
        tag: impl Into<String>,
        configs: &[PlatformConfig],
        capabilities: SensorCapabilities,
    ) -> Result<Self, ConfigError> {
        let platforms = configs
            .iter()
            .map(|config| RotatingPlatform::new(config, capabilities))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(tag, platforms)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub fn platform(&self, id: PlatformId) -> Option<&RotatingPlatform> {
        self.platforms.get(id.0)
    }

    pub fn platform_mut(&mut self, id: PlatformId) -> Option<&mut RotatingPlatform> {
        self.platforms.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlatformId, &RotatingPlatform)> {
        self.platforms
            .iter()
            .enumerate()
            .map(|(index, platform)| (PlatformId(index), platform))
    }

    pub fn active_platform(&self) -> Option<PlatformId> {
        self.platforms
            .iter()
            .position(RotatingPlatform::is_activated)
            .map(PlatformId)
    }

    pub fn is_busy(&self) -> bool {
        self.platforms.iter().any(RotatingPlatform::is_rotating)
    }

    /// Toggles the platform's armed state. Arming it disarms every other member.
    pub fn interact(
        &mut self,
        id: PlatformId,
        sensors: &dyn MotionSensor,
        bus: &mut EventBus,
    ) -> InteractOutcome {
        let busy = self.is_busy();
        let Some(platform) = self.platforms.get_mut(id.0) else {
            return InteractOutcome::UnknownPlatform;
        };
        if platform.locked {
            debug!(group = %self.tag, platform = %id, "interaction_ignored_locked");
            return InteractOutcome::Locked;
        }
        if busy {
            debug!(group = %self.tag, platform = %id, "interaction_ignored_group_busy");
            return InteractOutcome::GroupBusy;
        }

        let activated = !platform.activated;
        platform.set_activated(activated, sensors);
        bus.publish(GameEvent::InputsGatedChanged(activated));

        if activated {
            for (index, other) in self.platforms.iter_mut().enumerate() {
                if index != id.0 {
                    other.activated = false;
                }
            }
        }
        info!(group = %self.tag, platform = %id, activated, "platform_interacted");

        if activated {
            InteractOutcome::Activated
        } else {
            InteractOutcome::Deactivated
        }
    }

    pub fn update(&mut self, dt_seconds: f32, sensors: &dyn MotionSensor, manual_trigger: bool) {
        for platform in &mut self.platforms {
            platform.update(dt_seconds, sensors, manual_trigger);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    const DT: f32 = 1.0 / 60.0;
    const MAX_ANIMATION_TICKS: usize = 10_000;

    #[derive(Debug, Clone, Copy, Default)]
    struct FakeSensors {
        angular_rate: Option<Vec3>,
        acceleration: Option<Vec3>,
    }

    impl FakeSensors {
        fn still() -> Self {
            Self {
                angular_rate: Some(Vec3::ZERO),
                acceleration: Some(Vec3::new(0.0, -1.0, 0.0)),
            }
        }
    }

    impl MotionSensor for FakeSensors {
        fn angular_rate(&self) -> Option<Vec3> {
            self.angular_rate
        }

        fn acceleration(&self) -> Option<Vec3> {
            self.acceleration
        }
    }

    fn platform_with(config: PlatformConfig) -> RotatingPlatform {
        RotatingPlatform::new(&config, SensorCapabilities::default()).expect("platform")
    }

    fn group_of(count: usize) -> PlatformGroup {
        let configs = vec![PlatformConfig::default(); count];
        PlatformGroup::from_configs(
            PlatformConfig::default().group,
            &configs,
            SensorCapabilities::default(),
        )
        .expect("group")
    }

    fn run_until_settled(platform: &mut RotatingPlatform, sensors: &FakeSensors) -> usize {
        for tick in 0..MAX_ANIMATION_TICKS {
            platform.update(DT, sensors, false);
            if !platform.is_rotating() {
                return tick + 1;
            }
        }
        panic!("animation did not settle");
    }

    fn armed_platform(config: PlatformConfig) -> RotatingPlatform {
        let mut platform = platform_with(config);
        platform.set_activated(true, &FakeSensors::still());
        platform
    }

    #[test]
    fn interacting_with_b_disarms_a() {
        let mut group = group_of(2);
        let mut bus = EventBus::new();
        let sensors = FakeSensors::still();
        let a = PlatformId(0);
        let b = PlatformId(1);

        assert_eq!(group.interact(a, &sensors, &mut bus), InteractOutcome::Activated);
        assert!(group.platform(a).expect("a").is_activated());
        assert!(!group.platform(b).expect("b").is_activated());

        assert_eq!(group.interact(b, &sensors, &mut bus), InteractOutcome::Activated);
        assert!(group.platform(b).expect("b").is_activated());
        assert!(!group.platform(a).expect("a").is_activated());
    }

    #[test]
    fn second_interaction_disarms_and_both_toggles_are_published() {
        let mut group = group_of(1);
        let mut bus = EventBus::new();
        let gated = Rc::new(RefCell::new(Vec::new()));
        let sink = gated.clone();
        bus.on_inputs_gated(move |value| sink.borrow_mut().push(value));
        let sensors = FakeSensors::still();

        group.interact(PlatformId(0), &sensors, &mut bus);
        assert_eq!(
            group.interact(PlatformId(0), &sensors, &mut bus),
            InteractOutcome::Deactivated
        );

        assert_eq!(*gated.borrow(), vec![true, false]);
        assert_eq!(group.active_platform(), None);
    }

    #[test]
    fn at_most_one_platform_is_armed_after_any_interaction_sequence() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xfeed);
        let sensors = FakeSensors::still();
        for size in 1..6 {
            let mut group = group_of(size);
            let mut bus = EventBus::new();
            for _ in 0..200 {
                let id = PlatformId(rng.gen_range(0..size));
                if rng.gen_bool(0.1) {
                    let platform = group.platform_mut(id).expect("platform");
                    let locked = platform.is_locked();
                    platform.set_locked(!locked);
                }
                group.interact(id, &sensors, &mut bus);
                let armed = group.iter().filter(|(_, p)| p.is_activated()).count();
                assert!(armed <= 1, "{armed} platforms armed in a group of {size}");
            }
        }
    }

    #[test]
    fn locked_platform_ignores_interaction() {
        let config = PlatformConfig {
            locked: true,
            ..PlatformConfig::default()
        };
        let mut group = PlatformGroup::from_configs(
            config.group.clone(),
            &[config],
            SensorCapabilities::default(),
        )
        .expect("group");
        let mut bus = EventBus::new();

        for _ in 0..3 {
            assert_eq!(
                group.interact(PlatformId(0), &FakeSensors::still(), &mut bus),
                InteractOutcome::Locked
            );
        }
        let platform = group.platform(PlatformId(0)).expect("platform");
        assert!(!platform.is_activated());
        assert!(!platform.is_rotating());
        assert_eq!(bus.counts().total, 0);
    }

    #[test]
    fn interaction_waits_while_a_group_member_rotates() {
        let mut group = group_of(2);
        let mut bus = EventBus::new();
        let sensors = FakeSensors::still();
        group.interact(PlatformId(0), &sensors, &mut bus);
        group.update(DT, &sensors, true);
        assert!(group.is_busy());

        assert_eq!(
            group.interact(PlatformId(1), &sensors, &mut bus),
            InteractOutcome::GroupBusy
        );
        assert_eq!(group.active_platform(), Some(PlatformId(0)));
    }

    #[test]
    fn retrigger_while_rotating_is_a_no_op() {
        let mut platform = armed_platform(PlatformConfig::default());
        assert!(platform.try_start_rotation(RotationDirection::Clockwise));
        platform.update(DT, &FakeSensors::still(), false);
        let before = *platform.animation().expect("animation");
        let angle_before = platform.angle_degrees();

        assert!(!platform.try_start_rotation(RotationDirection::CounterClockwise));

        assert_eq!(*platform.animation().expect("animation"), before);
        assert_eq!(platform.angle_degrees(), angle_before);
    }

    #[test]
    fn idle_platform_never_starts_rotating() {
        let mut platform = platform_with(PlatformConfig::default());
        assert!(!platform.try_start_rotation(RotationDirection::Clockwise));
        platform.update(DT, &FakeSensors::still(), true);
        assert!(!platform.is_rotating());
    }

    #[test]
    fn completed_cycle_lands_exactly_one_step_away() {
        for (direction, expected) in [
            (RotationDirection::Clockwise, 120.0),
            (RotationDirection::CounterClockwise, -60.0),
        ] {
            let mut platform = armed_platform(PlatformConfig {
                initial_angle_degrees: 30.0,
                ..PlatformConfig::default()
            });
            assert!(platform.try_start_rotation(direction));
            run_until_settled(&mut platform, &FakeSensors::still());

            assert_eq!(platform.angle_degrees(), expected);
            assert!(platform.is_activated());
        }
    }

    #[test]
    fn overshoot_passes_the_final_angle_before_settling() {
        let mut platform = armed_platform(PlatformConfig::default());
        platform.try_start_rotation(RotationDirection::Clockwise);
        let mut peak = f64::MIN;
        let mut saw_settle = false;
        while platform.is_rotating() {
            platform.update(DT, &FakeSensors::still(), false);
            peak = peak.max(platform.angle_degrees());
            if platform
                .animation()
                .is_some_and(|animation| animation.phase() == RotationPhase::Settle)
            {
                saw_settle = true;
            }
        }

        assert!(saw_settle);
        assert!(peak > 90.0, "peak {peak} never overshot");
        assert_eq!(platform.angle_degrees(), 90.0);
    }

    #[test]
    fn overshoot_is_independent_of_final_angle() {
        for overshoot in [0, 3, 10, 25] {
            let mut platform = armed_platform(PlatformConfig {
                snap_overshoot_degrees: overshoot,
                ..PlatformConfig::default()
            });
            platform.try_start_rotation(RotationDirection::Clockwise);
            run_until_settled(&mut platform, &FakeSensors::still());
            assert_eq!(platform.angle_degrees(), 90.0);
        }
    }

    #[test]
    fn gyro_direction_follows_signed_rate_on_y_axis() {
        assert_eq!(
            detect_gyro_gesture(true, Vec3::new(0.0, -5.0, 0.0), 8.0, 4.0),
            Some(RotationDirection::Clockwise)
        );
        assert_eq!(
            detect_gyro_gesture(true, Vec3::new(0.0, 5.0, 0.0), 8.0, 4.0),
            Some(RotationDirection::CounterClockwise)
        );
        assert_eq!(
            detect_gyro_gesture(true, Vec3::new(20.0, 3.0, 0.0), 8.0, 4.0),
            None
        );
    }

    #[test]
    fn gyro_uses_x_rate_for_other_axes() {
        assert_eq!(
            detect_gyro_gesture(false, Vec3::new(-9.0, 50.0, 0.0), 8.0, 4.0),
            Some(RotationDirection::Clockwise)
        );
        assert_eq!(
            detect_gyro_gesture(false, Vec3::new(8.0, 0.0, 0.0), 8.0, 4.0),
            Some(RotationDirection::CounterClockwise)
        );
        assert_eq!(
            detect_gyro_gesture(false, Vec3::new(7.9, 0.0, 0.0), 8.0, 4.0),
            None
        );
    }

    #[test]
    fn gyro_gesture_starts_rotation_in_detected_direction() {
        let mut platform = armed_platform(PlatformConfig::default());
        let flick = FakeSensors {
            angular_rate: Some(Vec3::new(0.0, 6.0, 0.0)),
            ..FakeSensors::still()
        };

        platform.update(DT, &flick, false);

        let animation = platform.animation().expect("rotation started");
        assert_eq!(animation.direction(), RotationDirection::CounterClockwise);
        assert_eq!(animation.final_degrees(), -90.0);
    }

    #[test]
    fn accelerometer_gesture_needs_both_y_and_z_past_threshold() {
        let base = Vec3::new(0.0, -1.0, 0.0);
        assert!(detect_accelerometer_gesture(base, Vec3::new(0.0, 0.5, 1.5), 1.0));
        assert!(!detect_accelerometer_gesture(base, Vec3::new(0.0, 0.5, 0.5), 1.0));
        assert!(!detect_accelerometer_gesture(base, Vec3::new(5.0, -1.0, 1.5), 1.0));
    }

    #[test]
    fn accelerometer_baseline_is_captured_on_activation() {
        let config = PlatformConfig {
            gyro_enabled: false,
            accelerometer_enabled: true,
            ..PlatformConfig::default()
        };
        let mut group = PlatformGroup::from_configs(
            config.group.clone(),
            &[config],
            SensorCapabilities::default(),
        )
        .expect("group");
        let mut bus = EventBus::new();
        let tilted = FakeSensors {
            angular_rate: None,
            acceleration: Some(Vec3::new(0.2, 2.0, 2.0)),
        };

        group.interact(PlatformId(0), &tilted, &mut bus);
        let platform = group.platform(PlatformId(0)).expect("platform");
        assert_eq!(platform.base_tilt(), Vec3::new(0.2, 2.0, 2.0));

        // Holding the calibrated pose is not a gesture.
        group.update(DT, &tilted, false);
        assert!(!group.is_busy());

        let flipped = FakeSensors {
            angular_rate: None,
            acceleration: Some(Vec3::new(0.2, 0.5, 0.5)),
        };
        group.update(DT, &flipped, false);
        let animation = group
            .platform(PlatformId(0))
            .and_then(RotatingPlatform::animation)
            .expect("rotation started");
        assert_eq!(animation.direction(), RotationDirection::Clockwise);
    }

    #[test]
    fn missing_gyro_disables_only_the_gyro_path() {
        let mut platform = armed_platform(PlatformConfig {
            accelerometer_enabled: true,
            ..PlatformConfig::default()
        });
        let no_gyro = FakeSensors {
            angular_rate: None,
            acceleration: Some(Vec3::new(0.0, -1.0, 0.0)),
        };

        platform.update(DT, &no_gyro, false);
        assert!(!platform.gyro_enabled());
        assert!(platform.accelerometer_enabled());
        assert!(!platform.is_rotating());

        platform.update(DT, &no_gyro, true);
        assert!(platform.is_rotating());
    }

    #[test]
    fn capabilities_disable_modalities_up_front() {
        let platform = RotatingPlatform::new(
            &PlatformConfig {
                accelerometer_enabled: true,
                ..PlatformConfig::default()
            },
            SensorCapabilities {
                gyroscope: false,
                accelerometer: true,
            },
        )
        .expect("platform");
        assert!(!platform.gyro_enabled());
        assert!(platform.accelerometer_enabled());
    }

    #[test]
    fn gyro_is_preferred_over_accelerometer() {
        let mut platform = armed_platform(PlatformConfig {
            accelerometer_enabled: true,
            ..PlatformConfig::default()
        });
        let both = FakeSensors {
            angular_rate: Some(Vec3::new(0.0, 10.0, 0.0)),
            acceleration: Some(Vec3::new(0.0, 5.0, 5.0)),
        };
        platform.update(DT, &both, false);
        assert_eq!(
            platform.animation().map(RotationAnimation::direction),
            Some(RotationDirection::CounterClockwise)
        );
    }

    #[test]
    fn orientation_tracks_angle_about_axis() {
        let mut platform = armed_platform(PlatformConfig {
            rotation_axis: Vec3::new(2.0, 0.0, 0.0),
            ..PlatformConfig::default()
        });
        assert_eq!(platform.rotation_axis(), Vec3::X);
        platform.try_start_rotation(RotationDirection::Clockwise);
        run_until_settled(&mut platform, &FakeSensors::still());

        let expected = Quat::from_rotation_x(90f32.to_radians());
        assert!(platform.orientation().angle_between(expected) < 1e-4);
    }

    #[test]
    fn group_construction_rejects_bad_input() {
        assert_eq!(
            PlatformGroup::new("rotateable", Vec::new()),
            Err(ConfigError::EmptyPlatformGroup {
                group: "rotateable".to_string()
            })
        );
        let stranger = platform_with(PlatformConfig {
            group: "other".to_string(),
            ..PlatformConfig::default()
        });
        assert!(matches!(
            PlatformGroup::new("rotateable", vec![stranger]),
            Err(ConfigError::GroupTagMismatch { .. })
        ));
        assert!(matches!(
            RotatingPlatform::new(
                &PlatformConfig {
                    rotation_axis: Vec3::ZERO,
                    ..PlatformConfig::default()
                },
                SensorCapabilities::default()
            ),
            Err(ConfigError::ZeroRotationAxis { .. })
        ));
    }
}
