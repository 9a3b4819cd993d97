use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions};

use super::physics::RigScene;
use super::rig::{FrameInput, RigState};
use super::settings::RigSettings;

/// Third-person camera rig following `target`.
///
/// The rig entity is moved and rotated every frame. The camera is either the
/// rig entity itself or a child of it whose local translation is kept.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
#[require(Transform, RigSettings)]
pub struct ThirdPersonRig {
    pub target: Entity,
    /// Camera child of the rig, `None` when the rig entity is the camera.
    pub camera: Option<Entity>,
    /// Mesh whose material fades out when the camera gets too close.
    pub fade_mesh: Option<Entity>,
    /// Offset from the target's origin to the point the camera orbits.
    pub pivot_offset: Vec3,
}

impl ThirdPersonRig {
    pub fn new(target: Entity) -> Self {
        Self {
            target,
            camera: None,
            fade_mesh: None,
            pivot_offset: Vec3::Y * 1.2,
        }
    }

    pub fn pivot(&self, target: &Transform) -> Vec3 {
        target.translation + self.pivot_offset
    }
}

/// While set, nothing rotates the camera (cutscenes, menus, ...).
#[derive(Resource, Reflect, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[reflect(Resource)]
pub struct CameraInputLock(pub bool);

/// Look delta gathered this frame, in axis units (x right, y up).
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct RigInput {
    pub look: Vec2,
}

#[derive(Resource, Reflect, Debug, Clone, Copy)]
#[reflect(Resource)]
pub struct RigInputBindings {
    /// Button that has to be held to orbit. `None` orbits on any mouse motion.
    /// A grabbed cursor orbits regardless.
    pub orbit_button: Option<MouseButton>,
    /// Axis units per pixel of mouse motion.
    pub axis_scale: f32,
}

impl Default for RigInputBindings {
    fn default() -> Self {
        Self {
            orbit_button: Some(MouseButton::Left),
            axis_scale: 0.1,
        }
    }
}

/// Collects mouse motion into [`RigInput`]
pub fn read_orbit_input(
    mut input: ResMut<RigInput>,
    mut cursor_events: MessageReader<MouseMotion>,
    mouse: Res<ButtonInput<MouseButton>>,
    bindings: Res<RigInputBindings>,
    cursors: Query<&CursorOptions>,
) {
    let mut delta = Vec2::ZERO;
    for event in cursor_events.read() {
        delta += event.delta;
    }

    let grabbed = cursors
        .iter()
        .any(|cursor| cursor.grab_mode == CursorGrabMode::Locked);
    let held = bindings
        .orbit_button
        .is_none_or(|button| mouse.pressed(button));

    input.look = if grabbed || held {
        // screen space grows downwards, look axes grow upwards
        Vec2::new(delta.x, -delta.y) * bindings.axis_scale
    } else {
        Vec2::ZERO
    };
}

/// Creates the runtime state of rigs whose target is available.
pub fn init_rigs(
    mut commands: Commands,
    rigs: Query<(Entity, &ThirdPersonRig, &RigSettings, &Transform), Without<RigState>>,
    others: Query<&Transform, Without<ThirdPersonRig>>,
) {
    for (entity, rig, settings, transform) in rigs.iter() {
        let Ok(target) = others.get(rig.target) else {
            warn_once!("rig {entity} is waiting for its target {}", rig.target);
            continue;
        };
        let Some(camera_local) = camera_local(rig, &others) else {
            warn_once!("rig {entity} has no camera transform");
            continue;
        };

        let state = RigState::new(transform, rig.pivot(target), camera_local, settings);
        info!(
            "rig {entity} following {} at distance {:.2}",
            rig.target,
            state.distance()
        );
        commands.entity(entity).insert(state);
    }
}

fn camera_local(
    rig: &ThirdPersonRig,
    others: &Query<&Transform, Without<ThirdPersonRig>>,
) -> Option<Vec3> {
    match rig.camera {
        None => Some(Vec3::ZERO),
        Some(camera) => others.get(camera).ok().map(|t| t.translation),
    }
}

/// Moves every rig after its target has moved for the frame.
#[allow(clippy::type_complexity)]
pub fn update_rigs(
    mut rigs: Query<(
        Entity,
        &ThirdPersonRig,
        &RigSettings,
        &mut RigState,
        &mut Transform,
    )>,
    others: Query<&Transform, Without<ThirdPersonRig>>,
    scene: RigScene,
    input: Res<RigInput>,
    lock: Res<CameraInputLock>,
    time: Res<Time>,
) {
    let frame = FrameInput {
        look: input.look,
        locked: lock.0,
    };

    for (entity, rig, settings, mut state, mut transform) in rigs.iter_mut() {
        let Ok(target) = others.get(rig.target) else {
            warn_once!("rig {entity} lost its target {}", rig.target);
            continue;
        };
        let Some(camera_local) = camera_local(rig, &others) else {
            warn_once!("rig {entity} lost its camera");
            continue;
        };

        let pose = state.step(
            time.delta_secs(),
            frame,
            rig.pivot(target),
            camera_local,
            settings,
            &scene.for_rig(settings.collision_mask, rig.target),
        );

        transform.translation = pose.translation;
        transform.rotation = pose.rotation;
    }
}
