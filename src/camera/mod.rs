pub mod auto_rotate;
pub mod controller;
pub mod fade;
pub mod occlusion;
pub mod orbit;
pub mod physics;
pub mod rig;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_scene;

pub use controller::*;
pub use fade::{FadeBaseline, fade_alpha};
pub use physics::ObstacleTag;
pub use rig::{FrameInput, RigPose, RigState};
pub use settings::RigSettings;

use bevy::prelude::*;
use bevy::transform::TransformSystems;

/// Plugin for the third-person camera rig
pub struct ThirdPersonRigPlugin;

impl Plugin for ThirdPersonRigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RigInput>();
        app.init_resource::<RigInputBindings>();
        app.init_resource::<CameraInputLock>();
        app.add_systems(Update, controller::read_orbit_input);
        app.add_systems(
            PostUpdate,
            (
                settings::sanitize_rig_settings,
                controller::init_rigs,
                controller::update_rigs,
                fade::fade_target,
            )
                .chain()
                .before(TransformSystems::Propagate),
        );
    }
}
