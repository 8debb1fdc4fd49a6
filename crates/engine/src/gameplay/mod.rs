mod config;
mod events;
mod motion;
mod nav;
mod platform;
mod pursuit;

pub use config::{ConfigError, PlatformConfig, PursuitConfig, DEFAULT_PLATFORM_GROUP};
pub use events::{EventBus, EventCounts, GameEvent, GameEventKind, SubscriptionId};
pub use motion::{facing_rotation, KinematicBody, MotionSystem};
pub use nav::{sample_position, NavError, NavMesh, SurfaceNavigator};
pub use platform::{
    detect_accelerometer_gesture, detect_gyro_gesture, AnimationStatus, InteractOutcome,
    MotionSensor, PlatformGroup, PlatformId, RotatingPlatform, RotationAnimation,
    RotationDirection, RotationPhase, SensorCapabilities, OVERSHOOT_MARGIN_DEGREES,
    SETTLE_EPSILON_DEGREES,
};
pub use pursuit::{PursuitAgent, PursuitState, RetargetTimer};
