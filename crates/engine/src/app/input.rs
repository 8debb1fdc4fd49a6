use glam::Vec3;

use super::scene::EntityId;
use crate::gameplay::MotionSensor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    RotatePlatform,
    Quit,
}

const ACTION_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::RotatePlatform => 0,
            InputAction::Quit => 1,
        }
    }
}

/// Everything the simulation reads from the player and the device in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    actions: ActionStates,
    angular_rate: Option<Vec3>,
    acceleration: Option<Vec3>,
    interact_target: Option<EntityId>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_angular_rate(mut self, angular_rate: Option<Vec3>) -> Self {
        self.angular_rate = angular_rate;
        self
    }

    pub fn with_acceleration(mut self, acceleration: Option<Vec3>) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_interact_target(mut self, interact_target: Option<EntityId>) -> Self {
        self.interact_target = interact_target;
        self
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn quit_requested(&self) -> bool {
        self.is_down(InputAction::Quit)
    }

    pub fn rotate_pressed(&self) -> bool {
        self.is_down(InputAction::RotatePlatform)
    }

    /// Entity picked by the interact gesture this tick, if any.
    pub fn interact_target(&self) -> Option<EntityId> {
        self.interact_target
    }
}

impl MotionSensor for InputSnapshot {
    fn angular_rate(&self) -> Option<Vec3> {
        self.angular_rate
    }

    fn acceleration(&self) -> Option<Vec3> {
        self.acceleration
    }
}

/// Produces the input snapshot for each simulation tick.
pub trait InputSource {
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot;
}
