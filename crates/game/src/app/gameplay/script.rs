use std::collections::BTreeMap;

use engine::{EntityId, InputAction, InputSnapshot, InputSource};

use super::level::{ScriptAction, ScriptStep, SensorSettings};

/// Replays the device half of a level script: taps, gestures and sensor samples.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedInput {
    sensors: SensorSettings,
    steps: BTreeMap<u64, Vec<ScriptAction>>,
}

impl ScriptedInput {
    pub(crate) fn new(sensors: SensorSettings, script: &[ScriptStep]) -> Self {
        let mut steps: BTreeMap<u64, Vec<ScriptAction>> = BTreeMap::new();
        for step in script.iter().filter(|step| step.action.is_device_input()) {
            steps.entry(step.tick).or_default().push(step.action);
        }
        Self { sensors, steps }
    }

    fn idle_snapshot(&self) -> InputSnapshot {
        InputSnapshot::empty()
            .with_angular_rate(self.sensors.gyroscope.then_some(glam::Vec3::ZERO))
            .with_acceleration(
                self.sensors
                    .accelerometer
                    .then_some(self.sensors.resting_acceleration),
            )
    }
}

impl InputSource for ScriptedInput {
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot {
        let mut snapshot = self.idle_snapshot();
        let Some(actions) = self.steps.get(&tick) else {
            return snapshot;
        };
        for action in actions {
            snapshot = match *action {
                ScriptAction::Interact { entity } => {
                    snapshot.with_interact_target(Some(EntityId(entity)))
                }
                ScriptAction::Rotate => snapshot.with_action_down(InputAction::RotatePlatform, true),
                ScriptAction::Quit => snapshot.with_action_down(InputAction::Quit, true),
                // A device without the sensor cannot report a gesture on it.
                ScriptAction::Gyro { rate } if self.sensors.gyroscope => {
                    snapshot.with_angular_rate(Some(rate))
                }
                ScriptAction::Tilt { acceleration } if self.sensors.accelerometer => {
                    snapshot.with_acceleration(Some(acceleration))
                }
                _ => snapshot,
            };
        }
        snapshot
    }
}
