use bevy::prelude::*;

use super::auto_rotate::RotateDirection;
use super::settings::RigSettings;

/// Margin kept between the camera and whatever it hit, and the step taken
/// past an ignored collider before casting again.
pub const PRECISION_SLUSH: f32 = 0.01;
/// Radius of the overlap test around a pulled-in camera.
pub const PROXIMITY_RADIUS: f32 = 0.15;
/// How far the camera is swung around the pivot when probing for a way around.
pub const PEEK_PROBE_ANGLE: f32 = 10.0;
/// Floor for the configured minimum distance.
pub const MIN_DISTANCE_EPSILON: f32 = 1e-3;
/// Rays shorter than this never occlude.
pub const MIN_RAY_LENGTH: f32 = 1e-4;

const MAX_RECASTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    pub entity: Entity,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// The physics queries the rig needs from the host.
pub trait SceneQuery {
    /// Nearest hit along the ray. Casting from inside a collider reports where
    /// the ray leaves it.
    fn cast_ray(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<SceneHit>;

    /// Every collider overlapping the sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Entity>;

    fn tag(&self, entity: Entity) -> Option<&str>;
}

/// Casts a ray, stepping through colliders tagged with the ignore tag.
///
/// The returned distance is measured from `origin`.
pub fn cast_past_ignored(
    scene: &impl SceneQuery,
    settings: &RigSettings,
    origin: Vec3,
    direction: Dir3,
    max_distance: f32,
) -> Option<SceneHit> {
    let mut travelled = 0.0;
    for _ in 0..MAX_RECASTS {
        let remaining = max_distance - travelled;
        if remaining <= 0.0 {
            return None;
        }

        let hit = scene.cast_ray(origin + direction * travelled, direction, remaining)?;
        let distance = travelled + hit.distance.max(0.0);
        if !settings.is_ignored(scene.tag(hit.entity)) {
            return Some(SceneHit {
                entity: hit.entity,
                distance,
            });
        }
        travelled = distance + PRECISION_SLUSH;
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionOutcome {
    /// Where the camera should be this frame.
    pub camera: Vec3,
    /// Distance from the pivot to `camera`.
    pub distance: f32,
    pub occluded: bool,
    /// Set when the camera should swing around the blocker instead of moving in.
    pub peek: Option<RotateDirection>,
    pub blocker: Option<Entity>,
}

impl OcclusionOutcome {
    fn clear(camera: Vec3, distance: f32) -> Self {
        Self {
            camera,
            distance,
            occluded: false,
            peek: None,
            blocker: None,
        }
    }
}

/// Checks the line from `pivot` to `desired_camera` and corrects the camera
/// position if something is in the way.
pub fn resolve_occlusion(
    scene: &impl SceneQuery,
    settings: &RigSettings,
    pivot: Vec3,
    desired_camera: Vec3,
    allow_peek: bool,
) -> OcclusionOutcome {
    let line = desired_camera - pivot;
    let length = line.length();
    if !length.is_finite() || length < MIN_RAY_LENGTH {
        return OcclusionOutcome::clear(desired_camera, length.max(0.0));
    }
    let Ok(direction) = Dir3::new(line) else {
        return OcclusionOutcome::clear(desired_camera, length);
    };

    let max_distance = settings.ray_limit().map_or(length, |limit| limit.min(length));
    let Some(hit) = cast_past_ignored(scene, settings, pivot, direction, max_distance) else {
        return OcclusionOutcome::clear(desired_camera, length);
    };

    if allow_peek && !settings.blocks_peek(scene.tag(hit.entity)) {
        if let Some(direction) = find_peek_direction(scene, settings, pivot, line, max_distance) {
            return OcclusionOutcome {
                camera: desired_camera,
                distance: length,
                occluded: true,
                peek: Some(direction),
                blocker: Some(hit.entity),
            };
        }
    }

    let min_distance = settings
        .min_distance_from_target
        .max(MIN_DISTANCE_EPSILON)
        .min(length);
    let mut distance = (hit.distance - PRECISION_SLUSH).clamp(min_distance, length);

    let crowded = scene
        .overlap_sphere(pivot + direction * distance, PROXIMITY_RADIUS)
        .into_iter()
        .any(|entity| entity != hit.entity && !settings.is_ignored(scene.tag(entity)));
    if crowded {
        distance = (distance - PROXIMITY_RADIUS).max(min_distance);
    }

    OcclusionOutcome {
        camera: pivot + direction * distance,
        distance,
        occluded: true,
        peek: None,
        blocker: Some(hit.entity),
    }
}

fn find_peek_direction(
    scene: &impl SceneQuery,
    settings: &RigSettings,
    pivot: Vec3,
    line: Vec3,
    max_distance: f32,
) -> Option<RotateDirection> {
    RotateDirection::ALL.into_iter().find(|direction| {
        // yaw turns the rig right, which swings the camera the other way round
        let swing = Quat::from_rotation_y(-direction.sign() * PEEK_PROBE_ANGLE.to_radians());
        let Ok(probe) = Dir3::new(swing * line) else {
            return false;
        };
        cast_past_ignored(scene, settings, pivot, probe, max_distance).is_none()
    })
}
