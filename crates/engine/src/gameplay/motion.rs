use glam::{Quat, Vec3};

const ARRIVAL_THRESHOLD: f32 = 0.05;

/// The part of a mover the gameplay systems drive.
pub trait MotionSystem {
    fn position(&self) -> Vec3;
    fn set_pose(&mut self, position: Vec3, rotation: Quat);
    /// Head for `destination` at `speed` units per second until told otherwise.
    fn move_toward(&mut self, destination: Vec3, speed: f32);
}

/// Yaw that makes a +Z-forward body look from `from` toward `to`, ignoring height.
pub fn facing_rotation(from: Vec3, to: Vec3) -> Quat {
    let flat = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
    if flat.length_squared() <= f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(flat.x.atan2(flat.z))
}

/// Straight-line mover with no collision; enough for a flat walkable surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicBody {
    position: Vec3,
    rotation: Quat,
    destination: Option<Vec3>,
    speed: f32,
}

impl Default for KinematicBody {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

impl KinematicBody {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            destination: None,
            speed: 0.0,
        }
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn stop(&mut self) {
        self.destination = None;
    }

    /// Advances toward the current destination. Returns true on arrival.
    pub fn step(&mut self, dt_seconds: f32) -> bool {
        let Some(destination) = self.destination else {
            return false;
        };
        let offset = destination - self.position;
        let distance = offset.length();
        let max_step = self.speed.max(0.0) * dt_seconds.max(0.0);
        if distance <= ARRIVAL_THRESHOLD || distance <= max_step {
            self.position = destination;
            self.destination = None;
            return true;
        }
        self.rotation = facing_rotation(self.position, destination);
        self.position += offset * (max_step / distance);
        false
    }
}

impl MotionSystem for KinematicBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_pose(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.rotation = rotation;
        self.destination = None;
    }

    fn move_toward(&mut self, destination: Vec3, speed: f32) {
        self.destination = Some(destination);
        self.speed = speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_at_speed_and_arrives() {
        let mut body = KinematicBody::at(Vec3::ZERO);
        body.move_toward(Vec3::new(0.0, 0.0, 3.0), 2.0);

        assert!(!body.step(1.0));
        assert!((body.position() - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);

        assert!(body.step(1.0));
        assert_eq!(body.position(), Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(body.destination(), None);
    }

    #[test]
    fn set_pose_cancels_pending_move() {
        let mut body = KinematicBody::at(Vec3::ZERO);
        body.move_toward(Vec3::X, 1.0);
        body.set_pose(Vec3::Z, Quat::IDENTITY);

        assert!(!body.step(1.0));
        assert_eq!(body.position(), Vec3::Z);
    }

    #[test]
    fn facing_rotation_points_forward_axis_at_target() {
        let rotation = facing_rotation(Vec3::ZERO, Vec3::new(3.0, 5.0, 0.0));
        let forward = rotation * Vec3::Z;
        assert!((forward - Vec3::X).length() < 1e-5);
        assert_eq!(facing_rotation(Vec3::ONE, Vec3::ONE), Quat::IDENTITY);
    }
}
