use std::f32::consts::PI;

use avian3d::prelude::*;
use bevy::light::CascadeShadowConfigBuilder;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions};
use bevy_inspector_egui::bevy_egui::EguiPlugin;
use bevy_inspector_egui::quick::WorldInspectorPlugin;
use bevy_tnua::prelude::*;
use bevy_tnua_avian3d::prelude::*;
use rand::Rng;

use crate::camera::{CameraInputLock, ObstacleTag, RigSettings, ThirdPersonRig, ThirdPersonRigPlugin};
use crate::occluders::{OccludersPlugin, PatrolPath};
use crate::player::PlayerPlugin;
use crate::player::controller::PlayerRoot;

pub const RIG_CONFIG_PATH: &str = "assets/config/rig.toml";

const ARENA_SIZE: f32 = 24.0;
const PILLAR_COUNT: usize = 14;

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(avian3d::prelude::PhysicsPlugins::default());
        app.insert_resource(avian3d::prelude::Gravity(Vec3::NEG_Y * 9.0));
        //app.add_plugins(avian3d::prelude::PhysicsDebugPlugin::default());
        app.add_plugins(TnuaControllerPlugin::new(FixedUpdate));
        app.add_plugins(TnuaAvian3dPlugin::new(FixedUpdate));
        app.add_plugins(EguiPlugin::default());

        #[cfg(not(target_arch = "wasm32"))]
        app.add_plugins(WorldInspectorPlugin::new());

        app.add_plugins(ThirdPersonRigPlugin);
        app.add_plugins(PlayerPlugin);
        app.add_plugins(OccludersPlugin);
        app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.08)));
        app.add_systems(Startup, setup);
        app.add_systems(Update, (grab_cursor, toggle_input_lock));
    }
}

/// Reads the rig configuration, falling back to defaults.
pub fn load_rig_settings() -> RigSettings {
    #[cfg(target_arch = "wasm32")]
    let source = Ok::<_, std::io::Error>(include_str!("../assets/config/rig.toml").to_string());
    #[cfg(not(target_arch = "wasm32"))]
    let source = std::fs::read_to_string(RIG_CONFIG_PATH);

    let source = match source {
        Ok(source) => source,
        Err(err) => {
            info!("no rig config at {RIG_CONFIG_PATH} ({err}), using defaults");
            return RigSettings::default();
        }
    };

    match RigSettings::from_toml_str(&source) {
        Ok(settings) => settings,
        Err(err) => {
            warn!("failed to parse {RIG_CONFIG_PATH}: {err}");
            RigSettings::default()
        }
    }
}

/// set up the test arena
fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ambient_light: ResMut<AmbientLight>,
) {
    ambient_light.brightness = 150.0;

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::OVERCAST_DAY,
            shadows_enabled: true,
            ..default()
        },
        Transform {
            translation: Vec3::new(0.0, 2.0, 0.0),
            rotation: Quat::from_rotation_x(-PI / 4.),
            ..default()
        },
        CascadeShadowConfigBuilder {
            first_cascade_far_bound: 4.0,
            maximum_distance: 60.0,
            ..default()
        }
        .build(),
    ));

    let stone = materials.add(StandardMaterial {
        base_color: Color::srgb(0.45, 0.42, 0.4),
        perceptual_roughness: 1.0,
        ..default()
    });

    // floor
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(ARENA_SIZE, 0.1, ARENA_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.25, 0.3, 0.22),
            perceptual_roughness: 1.0,
            ..default()
        })),
        RigidBody::Static,
        Collider::cuboid(ARENA_SIZE, 0.1, ARENA_SIZE),
        ObstacleTag::new("Ground"),
        Name::new("Floor"),
    ));

    // outer walls
    let half = ARENA_SIZE / 2.0;
    for (translation, size) in [
        (Vec3::new(0.0, 1.5, -half), Vec3::new(ARENA_SIZE, 3.0, 0.5)),
        (Vec3::new(0.0, 1.5, half), Vec3::new(ARENA_SIZE, 3.0, 0.5)),
        (Vec3::new(-half, 1.5, 0.0), Vec3::new(0.5, 3.0, ARENA_SIZE)),
        (Vec3::new(half, 1.5, 0.0), Vec3::new(0.5, 3.0, ARENA_SIZE)),
    ] {
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(size))),
            MeshMaterial3d(stone.clone()),
            Transform::from_translation(translation),
            RigidBody::Static,
            Collider::cuboid(size.x, size.y, size.z),
            Name::new("Wall"),
        ));
    }

    let mut rng = rand::rng();
    for _ in 0..PILLAR_COUNT {
        let x = rng.random_range(-half + 2.0..half - 2.0);
        let z = rng.random_range(-half + 2.0..half - 2.0);
        // keep the spawn point free
        if x.abs() < 2.0 && z.abs() < 2.0 {
            continue;
        }
        let height = rng.random_range(1.5..4.0);
        commands.spawn((
            Mesh3d(meshes.add(Cylinder::new(0.4, height))),
            MeshMaterial3d(stone.clone()),
            Transform::from_xyz(x, height / 2.0, z),
            RigidBody::Static,
            Collider::cylinder(0.4, height),
            Name::new("Pillar"),
        ));
    }

    // see-through panel the camera looks past
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(3.0, 2.5, 0.1))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgba(0.6, 0.8, 1.0, 0.25),
            alpha_mode: AlphaMode::Blend,
            ..default()
        })),
        Transform::from_xyz(-4.0, 1.25, 3.0),
        RigidBody::Static,
        Collider::cuboid(3.0, 2.5, 0.1),
        ObstacleTag::new("Ignore"),
        Name::new("Glass"),
    ));

    // wall sliding across the camera line
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(2.0, 2.5, 0.3))),
        MeshMaterial3d(stone.clone()),
        Transform::from_xyz(-5.0, 1.25, 3.5),
        RigidBody::Kinematic,
        Collider::cuboid(2.0, 2.5, 0.3),
        PatrolPath {
            path: vec![Vec3::new(-5.0, 1.25, 3.5), Vec3::new(5.0, 1.25, 3.5)],
            speed: 1.5,
        },
        Name::new("Sliding wall"),
    ));

    let body = commands
        .spawn((
            Mesh3d(meshes.add(Capsule3d::new(0.3, 1.0))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.8, 0.35, 0.2),
                ..default()
            })),
            Name::new("Player body"),
        ))
        .id();
    let player = commands
        .spawn((PlayerRoot, Name::new("Player")))
        .add_child(body)
        .id();

    let camera = commands
        .spawn((Camera3d::default(), Transform::default(), Name::new("Camera")))
        .id();

    let rig = commands
        .spawn((
            ThirdPersonRig {
                camera: Some(camera),
                fade_mesh: Some(body),
                ..ThirdPersonRig::new(player)
            },
            load_rig_settings(),
            Transform::from_xyz(0.0, 3.0, 5.0),
            Name::new("Camera rig"),
        ))
        .id();
    commands.entity(camera).insert(ChildOf(rig));
}

fn grab_cursor(
    mut cursor_options: Single<&mut CursorOptions>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
) {
    if mouse.just_pressed(MouseButton::Middle) {
        cursor_options.grab_mode = CursorGrabMode::Locked;
        cursor_options.visible = false;
    }

    if keyboard.just_pressed(KeyCode::Escape) {
        cursor_options.grab_mode = CursorGrabMode::None;
        cursor_options.visible = true;
    }
}

fn toggle_input_lock(keyboard: Res<ButtonInput<KeyCode>>, mut lock: ResMut<CameraInputLock>) {
    if keyboard.just_pressed(KeyCode::KeyL) {
        lock.0 = !lock.0;
        info!("camera input {}", if lock.0 { "locked" } else { "unlocked" });
    }
}
