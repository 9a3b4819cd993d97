use avian3d::prelude::LinearVelocity;
use bevy::prelude::*;

/// Kinematic obstacles that wander through the camera's line of sight.
pub struct OccludersPlugin;

impl Plugin for OccludersPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, progress_path);
    }
}

/// Loops a kinematic body through `path` at `speed`.
#[derive(Component)]
#[require(Transform, PathIndex, LinearVelocity)]
pub struct PatrolPath {
    pub path: Vec<Vec3>,
    pub speed: f32,
}

#[derive(Component, Default)]
struct PathIndex(usize);

const WAYPOINT_REACHED: f32 = 0.05;

fn progress_path(
    mut q: Query<(
        &PatrolPath,
        &Transform,
        &mut LinearVelocity,
        &mut PathIndex,
    )>,
) {
    for (patrol, t, mut linvel, mut idx) in q.iter_mut() {
        if patrol.path.is_empty() {
            linvel.0 = Vec3::ZERO;
            continue;
        }
        idx.0 %= patrol.path.len();

        let towards = patrol.path[idx.0] - t.translation;
        if towards.length() < WAYPOINT_REACHED {
            idx.0 = (idx.0 + 1) % patrol.path.len();
        }
        linvel.0 = towards.normalize_or_zero() * patrol.speed;
    }
}
