use bevy::prelude::*;
use strum_macros::Display;

/// How long a single peek-around-the-corner nudge lasts, in seconds.
pub const AUTO_ROTATE_MAX_TIME: f32 = 0.3;
/// Fraction of the horizontal sensitivity applied to yaw per nudged frame.
pub const AUTO_ROTATE_MODIFIER: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Reflect)]
pub enum RotateDirection {
    Negative,
    Positive,
}

impl RotateDirection {
    pub const ALL: [RotateDirection; 2] = [RotateDirection::Negative, RotateDirection::Positive];

    pub fn sign(self) -> f32 {
        match self {
            RotateDirection::Negative => -1.0,
            RotateDirection::Positive => 1.0,
        }
    }
}

/// Bounded yaw nudge used to swing the camera around an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum AutoRotate {
    #[default]
    Idle,
    Rotating {
        direction: RotateDirection,
        elapsed: f32,
    },
}

impl AutoRotate {
    pub fn is_idle(&self) -> bool {
        matches!(self, AutoRotate::Idle)
    }

    /// Starts a nudge. A nudge already in progress is left alone.
    pub fn request(&mut self, direction: RotateDirection) -> bool {
        if !self.is_idle() {
            return false;
        }
        *self = AutoRotate::Rotating {
            direction,
            elapsed: 0.0,
        };
        true
    }

    /// Advances the timer and returns the yaw delta to apply this frame.
    pub fn tick(&mut self, sensitivity_x: f32, dt: f32) -> f32 {
        let AutoRotate::Rotating { direction, elapsed } = self else {
            return 0.0;
        };

        if *elapsed >= AUTO_ROTATE_MAX_TIME {
            *self = AutoRotate::Idle;
            return 0.0;
        }

        let yaw = sensitivity_x * AUTO_ROTATE_MODIFIER * direction.sign();
        *elapsed += dt;
        if *elapsed >= AUTO_ROTATE_MAX_TIME {
            *self = AutoRotate::Idle;
        }
        yaw
    }
}
