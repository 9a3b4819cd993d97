use bevy::prelude::*;

use super::auto_rotate::AutoRotate;
use super::occlusion::{OcclusionOutcome, SceneQuery, resolve_occlusion};
use super::orbit::{OrbitState, angles_from_direction, smooth_damp};
use super::settings::RigSettings;

/// Time constant used to pull the rig in while the camera is occluded.
/// Shorter than the rotation smoothing so the camera doesn't linger in walls.
pub const OCCLUSION_SMOOTH_TIME: f32 = 0.05;
/// Framings shorter than this can't be scaled meaningfully.
const MIN_FRAMING_LENGTH: f32 = 1e-4;

/// Input for a single frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Look delta in axis units (x right, y up).
    pub look: Vec2,
    /// When set nothing may rotate the rig.
    pub locked: bool,
}

impl FrameInput {
    fn steering(&self) -> bool {
        !self.locked && self.look != Vec2::ZERO
    }
}

/// Where the rig ended up after a frame.
#[derive(Debug, Clone, Copy)]
pub struct RigPose {
    pub translation: Vec3,
    pub rotation: Quat,
    /// World position of the camera.
    pub camera: Vec3,
    pub occlusion: OcclusionOutcome,
}

/// Runtime state of a rig, created once the rig and its target are known.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct RigState {
    pub orbit: OrbitState,
    pub auto_rotate: AutoRotate,
    /// Distance from the pivot to the camera right now.
    pub camera_distance: f32,
    pub occluded: bool,
    distance: f32,
    /// Pivot to camera, in rig space, as of the last unoccluded frame.
    clear_framing: Vec3,
    ratio: f32,
    ratio_velocity: f32,
}

impl RigState {
    /// Orients the rig toward `pivot` and fixes the follow distance.
    pub fn new(rig: &Transform, pivot: Vec3, camera_local: Vec3, settings: &RigSettings) -> Self {
        let to_pivot = pivot - rig.translation;
        let direction = Dir3::new(to_pivot).unwrap_or(rig.forward());
        let (pitch, yaw) = angles_from_direction(direction);
        let distance = to_pivot.length();

        let mut state = Self {
            orbit: OrbitState::new(pitch, yaw, settings),
            auto_rotate: AutoRotate::Idle,
            camera_distance: 0.0,
            occluded: false,
            distance,
            clear_framing: Vec3::ZERO,
            ratio: 1.0,
            ratio_velocity: 0.0,
        };
        state.clear_framing = state.framing(settings, camera_local);
        state.camera_distance = state.clear_framing.length();
        state
    }

    /// Follow distance, fixed at creation.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Pivot to camera in rig space when nothing is in the way.
    fn framing(&self, settings: &RigSettings, camera_local: Vec3) -> Vec3 {
        Vec3::new(
            settings.screen_offset.x,
            settings.screen_offset.y,
            self.distance,
        ) + camera_local
    }

    /// Advances the rig by one frame.
    pub fn step(
        &mut self,
        dt: f32,
        input: FrameInput,
        pivot: Vec3,
        camera_local: Vec3,
        settings: &RigSettings,
        scene: &impl SceneQuery,
    ) -> RigPose {
        if !input.locked {
            let nudge = self.auto_rotate.tick(settings.sensitivity_x, dt);
            self.orbit.nudge_yaw(nudge);
            self.orbit.apply_look(input.look, settings);
            self.orbit.smooth(settings.rotation_smooth_time, dt);
        }
        let rotation = self.orbit.rotation();

        let framing = self.framing(settings, camera_local);
        let desired_camera = pivot + rotation * framing;
        let allow_peek = !settings.disable_auto_rotation
            && !input.locked
            && !input.steering()
            && self.auto_rotate.is_idle();
        let occlusion = resolve_occlusion(scene, settings, pivot, desired_camera, allow_peek);

        if let Some(direction) = occlusion.peek {
            if self.auto_rotate.request(direction) {
                debug!("peeking {direction} around {:?}", occlusion.blocker);
            }
        }
        if occlusion.occluded != self.occluded {
            debug!("camera occlusion {}", if occlusion.occluded { "started" } else { "cleared" });
        }
        self.occluded = occlusion.occluded;

        if occlusion.occluded {
            let baseline = self.clear_framing.length();
            let target = if baseline > MIN_FRAMING_LENGTH {
                (occlusion.distance / baseline).min(1.0)
            } else {
                1.0
            };
            self.ratio = smooth_damp(
                self.ratio,
                target,
                &mut self.ratio_velocity,
                OCCLUSION_SMOOTH_TIME,
                dt,
            );
        } else {
            self.clear_framing = framing;
            self.ratio = smooth_damp(
                self.ratio,
                1.0,
                &mut self.ratio_velocity,
                settings.rotation_smooth_time,
                dt,
            );
        }

        let camera = pivot + rotation * (self.clear_framing * self.ratio);
        self.camera_distance = camera.distance(pivot);

        RigPose {
            translation: camera - rotation * camera_local,
            rotation,
            camera,
            occlusion,
        }
    }
}
