use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("platform group '{group}' has no platforms")]
    EmptyPlatformGroup { group: String },
    #[error("platform group tag cannot be empty")]
    EmptyGroupTag,
    #[error("platform tagged '{found}' cannot join group '{expected}'")]
    GroupTagMismatch { expected: String, found: String },
    #[error("rotation axis {axis:?} has zero length")]
    ZeroRotationAxis { axis: Vec3 },
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f32 },
    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must be > 0, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("spawn annulus is inverted: min_radius {min_radius} > max_radius {max_radius}")]
    InvertedAnnulus { min_radius: f32, max_radius: f32 },
    #[error("speed_multiplier must be >= 1 so pursuit never slows down, got {value}")]
    SpeedMultiplierBelowOne { value: f32 },
    #[error("max_speed {max_speed} is below base_speed {base_speed}")]
    SpeedCapBelowBase { max_speed: f32, base_speed: f32 },
}

/// Tuning for one rotating platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
    pub group: String,
    pub locked: bool,
    pub rotation_axis: Vec3,
    pub rotation_step_degrees: f32,
    pub snap_overshoot_degrees: i32,
    pub rotation_speed: f32,
    pub gyro_threshold_x: f32,
    pub gyro_threshold_y: f32,
    pub accelerometer_threshold: f32,
    pub gyro_enabled: bool,
    pub accelerometer_enabled: bool,
    pub initial_angle_degrees: f32,
}

pub const DEFAULT_PLATFORM_GROUP: &str = "rotateable";

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            group: DEFAULT_PLATFORM_GROUP.to_string(),
            locked: false,
            rotation_axis: Vec3::Y,
            rotation_step_degrees: 90.0,
            snap_overshoot_degrees: 10,
            rotation_speed: 5.0,
            gyro_threshold_x: 8.0,
            gyro_threshold_y: 4.0,
            accelerometer_threshold: 1.0,
            gyro_enabled: true,
            accelerometer_enabled: false,
            initial_angle_degrees: 0.0,
        }
    }
}

impl PlatformConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group.trim().is_empty() {
            return Err(ConfigError::EmptyGroupTag);
        }
        if !self.rotation_axis.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "rotation_axis",
                value: f32::NAN,
            });
        }
        if self.rotation_axis.length_squared() <= f32::EPSILON {
            return Err(ConfigError::ZeroRotationAxis {
                axis: self.rotation_axis,
            });
        }
        finite("rotation_step_degrees", self.rotation_step_degrees)?;
        finite("initial_angle_degrees", self.initial_angle_degrees)?;
        positive("rotation_speed", self.rotation_speed)?;
        non_negative("gyro_threshold_x", self.gyro_threshold_x)?;
        non_negative("gyro_threshold_y", self.gyro_threshold_y)?;
        non_negative("accelerometer_threshold", self.accelerometer_threshold)?;
        Ok(())
    }
}

/// Tuning for the pursuing agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PursuitConfig {
    pub kill_distance: f32,
    pub speed_multiplier: f32,
    pub base_speed: f32,
    /// Optional ceiling on the compounding speed; `None` keeps growth unbounded.
    pub max_speed: Option<f32>,
    pub min_spawn_radius: f32,
    pub max_spawn_radius: f32,
    pub nav_sample_radius: f32,
    pub retarget_interval_seconds: f32,
    pub rng_seed: u64,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            kill_distance: 1.0,
            speed_multiplier: 1.2,
            base_speed: 3.5,
            max_speed: None,
            min_spawn_radius: 3.0,
            max_spawn_radius: 5.0,
            nav_sample_radius: 4.0,
            retarget_interval_seconds: 1.0,
            rng_seed: 0x5eed_0f_ba11,
        }
    }
}

impl PursuitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("kill_distance", self.kill_distance)?;
        finite("speed_multiplier", self.speed_multiplier)?;
        if self.speed_multiplier < 1.0 {
            return Err(ConfigError::SpeedMultiplierBelowOne {
                value: self.speed_multiplier,
            });
        }
        non_negative("base_speed", self.base_speed)?;
        non_negative("min_spawn_radius", self.min_spawn_radius)?;
        non_negative("max_spawn_radius", self.max_spawn_radius)?;
        non_negative("nav_sample_radius", self.nav_sample_radius)?;
        positive("retarget_interval_seconds", self.retarget_interval_seconds)?;
        if self.min_spawn_radius > self.max_spawn_radius {
            return Err(ConfigError::InvertedAnnulus {
                min_radius: self.min_spawn_radius,
                max_radius: self.max_spawn_radius,
            });
        }
        if let Some(max_speed) = self.max_speed {
            non_negative("max_speed", max_speed)?;
            if max_speed < self.base_speed {
                return Err(ConfigError::SpeedCapBelowBase {
                    max_speed,
                    base_speed: self.base_speed,
                });
            }
        }
        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        PlatformConfig::default().validate().expect("platform defaults");
        PursuitConfig::default().validate().expect("pursuit defaults");
    }

    #[test]
    fn zero_rotation_axis_is_rejected() {
        let config = PlatformConfig {
            rotation_axis: Vec3::ZERO,
            ..PlatformConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroRotationAxis { axis: Vec3::ZERO })
        );
    }

    #[test]
    fn inverted_annulus_is_rejected() {
        let config = PursuitConfig {
            min_spawn_radius: 6.0,
            max_spawn_radius: 5.0,
            ..PursuitConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedAnnulus { .. })
        ));
    }

    #[test]
    fn decelerating_multiplier_and_bad_interval_are_rejected() {
        for value in [0.0, 0.5, 0.999] {
            let slowing = PursuitConfig {
                speed_multiplier: value,
                ..PursuitConfig::default()
            };
            assert_eq!(
                slowing.validate(),
                Err(ConfigError::SpeedMultiplierBelowOne { value })
            );
        }

        let constant_speed = PursuitConfig {
            speed_multiplier: 1.0,
            ..PursuitConfig::default()
        };
        assert!(constant_speed.validate().is_ok());

        let nan_interval = PursuitConfig {
            retarget_interval_seconds: f32::NAN,
            ..PursuitConfig::default()
        };
        assert!(matches!(
            nan_interval.validate(),
            Err(ConfigError::NonFinite {
                field: "retarget_interval_seconds",
                ..
            })
        ));
    }

    #[test]
    fn speed_cap_below_base_is_rejected() {
        let config = PursuitConfig {
            base_speed: 2.0,
            max_speed: Some(1.0),
            ..PursuitConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::SpeedCapBelowBase {
                max_speed: 1.0,
                base_speed: 2.0
            })
        );
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: PlatformConfig = serde_json::from_value(json!({
            "group": "bridge",
            "rotation_axis": [1.0, 0.0, 0.0],
            "accelerometer_enabled": true
        }))
        .expect("platform config");

        assert_eq!(config.group, "bridge");
        assert_eq!(config.rotation_axis, Vec3::X);
        assert!(config.accelerometer_enabled);
        assert_eq!(config.rotation_step_degrees, 90.0);
        assert_eq!(config.snap_overshoot_degrees, 10);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_value::<PursuitConfig>(json!({ "kill_radius": 2.0 }));
        assert!(result.is_err());
    }
}
