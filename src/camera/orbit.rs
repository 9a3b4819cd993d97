use bevy::prelude::*;

use super::settings::RigSettings;

const MIN_SMOOTH_TIME: f32 = 1e-4;

/// Critically damped spring toward `target`.
///
/// Never overshoots. A zero or negative `dt` leaves `current` and `velocity`
/// untouched.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }

    let omega = 2.0 / smooth_time.max(MIN_SMOOTH_TIME);
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let output = target + (change + temp) * exp;

    if (target > current) == (output > target) {
        *velocity = 0.0;
        return target;
    }
    output
}

pub fn smooth_damp_vec2(
    current: Vec2,
    target: Vec2,
    velocity: &mut Vec2,
    smooth_time: f32,
    dt: f32,
) -> Vec2 {
    Vec2::new(
        smooth_damp(current.x, target.x, &mut velocity.x, smooth_time, dt),
        smooth_damp(current.y, target.y, &mut velocity.y, smooth_time, dt),
    )
}

/// Rig orientation for the given angles in degrees.
///
/// Pitch positive looks down, yaw positive turns right. Zero on both looks
/// along `-Z`.
pub fn orbit_rotation(pitch: f32, yaw: f32) -> Quat {
    Quat::from_euler(EulerRot::YXZ, -yaw.to_radians(), -pitch.to_radians(), 0.0)
}

/// Inverse of [`orbit_rotation`] for a look direction: `(pitch, yaw)` in degrees.
pub fn angles_from_direction(direction: Dir3) -> (f32, f32) {
    let pitch = (-direction.y).clamp(-1.0, 1.0).asin().to_degrees();
    let yaw = direction.x.atan2(-direction.z).to_degrees();
    (pitch, yaw)
}

/// Yaw/pitch driven by pointer input, smoothed toward the raw angles.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct OrbitState {
    /// Raw yaw in degrees.
    pub yaw: f32,
    /// Raw pitch in degrees, always within the configured limits.
    pub pitch: f32,
    /// Smoothed `(pitch, yaw)`.
    pub current: Vec2,
    velocity: Vec2,
}

impl OrbitState {
    pub fn new(pitch: f32, yaw: f32, settings: &RigSettings) -> Self {
        let pitch = pitch.clamp(settings.pitch_min, settings.pitch_max);
        Self {
            yaw,
            pitch,
            current: Vec2::new(pitch, yaw),
            velocity: Vec2::ZERO,
        }
    }

    /// Accumulates a look delta given in axis units (x right, y up).
    pub fn apply_look(&mut self, look: Vec2, settings: &RigSettings) {
        let dx = if settings.invert_x { -look.x } else { look.x };
        let dy = if settings.invert_y { -look.y } else { look.y };
        self.yaw += dx * settings.sensitivity_x;
        self.pitch -= dy * settings.sensitivity_y;
        self.pitch = self.pitch.clamp(settings.pitch_min, settings.pitch_max);
    }

    pub fn nudge_yaw(&mut self, degrees: f32) {
        self.yaw += degrees;
    }

    pub fn smooth(&mut self, smooth_time: f32, dt: f32) {
        self.current = smooth_damp_vec2(
            self.current,
            Vec2::new(self.pitch, self.yaw),
            &mut self.velocity,
            smooth_time,
            dt,
        );
    }

    pub fn rotation(&self) -> Quat {
        orbit_rotation(self.current.x, self.current.y)
    }
}
