use avian3d::prelude::*;
use bevy::prelude::*;
use bevy_tnua::prelude::*;
use bevy_tnua_avian3d::prelude::*;

use crate::camera::orbit::orbit_rotation;
use crate::camera::{RigState, ThirdPersonRig};

#[derive(Component, Default)]
#[require(Transform, Visibility)]
pub struct PlayerRoot;

pub fn on_player_spawn(on: On<Add, PlayerRoot>, mut commands: Commands) {
    commands.entity(on.event_target()).insert((
        // ground is at Y=0.05 (top of 0.1 thick floor), capsule center to bottom is 0.8
        Transform::from_xyz(0.0, 0.85, 0.0),
        RigidBody::Dynamic,
        Collider::capsule(0.3, 1.0),
        TnuaController::default(),
        TnuaAvian3dSensorShape(Collider::cylinder(0.29, 0.0)),
    ));
}

/// Yaw of the first rig following `entity`, in degrees.
fn camera_yaw(entity: Entity, rigs: &Query<(&ThirdPersonRig, &RigState)>) -> Option<f32> {
    rigs.iter()
        .find(|(rig, _)| rig.target == entity)
        .map(|(_, state)| state.orbit.current.y)
}

pub fn apply_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut controller_query: Query<(Entity, &mut TnuaController), With<PlayerRoot>>,
    rigs: Query<(&ThirdPersonRig, &RigState)>,
) {
    let Ok((entity, mut controller)) = controller_query.single_mut() else {
        return;
    };

    // WASD moves relative to where the camera looks, flattened onto the ground
    let heading = orbit_rotation(0.0, camera_yaw(entity, &rigs).unwrap_or(0.0));
    let forward = heading * Vec3::NEG_Z;
    let sideways = heading * Vec3::X;
    const FORWARD_SPEED: f32 = 2.5;
    const SIDEWAYS_SPEED: f32 = 2.0;

    let sprint_factor = if keyboard.pressed(KeyCode::ShiftLeft) {
        1.8
    } else {
        1.0
    };

    let mut direction = Vec3::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        direction += forward * FORWARD_SPEED * sprint_factor;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        direction -= forward * FORWARD_SPEED;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        direction -= sideways * SIDEWAYS_SPEED;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        direction += sideways * SIDEWAYS_SPEED;
    }

    // Feed the basis every frame, even when standing still, or the capsule just falls.
    controller.basis(TnuaBuiltinWalk {
        desired_velocity: direction,
        float_height: 0.85,
        ..Default::default()
    });

    if keyboard.pressed(KeyCode::Space) {
        controller.action(TnuaBuiltinJump {
            height: 1.2,
            ..Default::default()
        });
    }
}

/// Turns the character to face away from the camera
pub fn rotate_character_to_camera(
    mut query: Query<(Entity, &mut Transform), With<PlayerRoot>>,
    rigs: Query<(&ThirdPersonRig, &RigState)>,
    time: Res<Time>,
) {
    let Ok((entity, mut transform)) = query.single_mut() else {
        return;
    };

    let Some(yaw) = camera_yaw(entity, &rigs) else {
        return;
    };

    let target_rotation = orbit_rotation(0.0, yaw);

    const ROTATION_SPEED: f32 = 4.0; // radians per second
    transform.rotation = transform
        .rotation
        .slerp(target_rotation, (ROTATION_SPEED * time.delta_secs()).min(1.0));
}
