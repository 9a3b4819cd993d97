use bevy::prelude::*;

use super::rig::RigState;
use super::settings::RigSettings;
use super::ThirdPersonRig;

/// Opacity of the followed character for a camera at `distance` from the pivot.
///
/// `1.0` at or beyond `min_dist_opaque`, `0.0` at or below
/// `max_dist_transparent`, linear in between.
pub fn fade_alpha(distance: f32, min_dist_opaque: f32, max_dist_transparent: f32) -> f32 {
    if distance >= min_dist_opaque {
        return 1.0;
    }
    if distance <= max_dist_transparent {
        return 0.0;
    }
    let t = (min_dist_opaque - distance) / (min_dist_opaque - max_dist_transparent);
    1.0 - t.clamp(0.0, 1.0)
}

/// Material state of a fade mesh before the rig started touching it.
#[derive(Component, Debug, Clone, Copy)]
pub struct FadeBaseline {
    pub alpha: f32,
    pub alpha_mode: AlphaMode,
}

pub fn fade_target(
    mut commands: Commands,
    rigs: Query<(&ThirdPersonRig, &RigSettings, &RigState)>,
    meshes: Query<(&MeshMaterial3d<StandardMaterial>, Option<&FadeBaseline>)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (rig, settings, state) in rigs.iter() {
        let Some(mesh) = rig.fade_mesh else {
            continue;
        };
        let Ok((material_handle, baseline)) = meshes.get(mesh) else {
            warn_once!("fade mesh {mesh} has no StandardMaterial");
            continue;
        };
        let Some(material) = materials.get(&material_handle.0) else {
            continue;
        };

        let baseline = match baseline {
            Some(baseline) => *baseline,
            None => {
                let baseline = FadeBaseline {
                    alpha: material.base_color.alpha(),
                    alpha_mode: material.alpha_mode,
                };
                commands.entity(mesh).insert(baseline);
                baseline
            }
        };

        let fade = fade_alpha(
            state.camera_distance,
            settings.min_dist_opaque,
            settings.max_dist_transparent,
        );
        let alpha = baseline.alpha * fade;
        let alpha_mode = if fade < 1.0 {
            AlphaMode::Blend
        } else {
            baseline.alpha_mode
        };

        if material.base_color.alpha() == alpha && material.alpha_mode == alpha_mode {
            continue;
        }
        if let Some(material) = materials.get_mut(&material_handle.0) {
            material.base_color.set_alpha(alpha);
            material.alpha_mode = alpha_mode;
        }
    }
}
