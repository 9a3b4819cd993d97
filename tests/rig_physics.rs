//! Headless tests for the rig running against avian's spatial queries.
//!
//! Run with:
//!   cargo test --test rig_physics

use std::time::Duration;

use avian3d::prelude::*;
use bevy::ecs::system::RunSystemOnce;
use bevy::input::InputPlugin;
use bevy::mesh::MeshPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use third_person_rig::camera::occlusion::{PROXIMITY_RADIUS, SceneQuery};
use third_person_rig::camera::physics::RigScene;
use third_person_rig::camera::{
    ObstacleTag, RigSettings, RigState, ThirdPersonRig, ThirdPersonRigPlugin,
};

const TIMESTEP: f32 = 1.0 / 64.0;
const RIG_DISTANCE: f32 = 6.0;
/// Front face of the solid wall, seen from the pivot.
const WALL_FACE: f32 = 3.9;

struct Arena {
    app: App,
    target: Entity,
    glass: Entity,
    wall: Entity,
}

fn create_app() -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        PhysicsPlugins::default(),
        TransformPlugin,
        InputPlugin,
        AssetPlugin::default(),
        bevy::scene::ScenePlugin,
        MeshPlugin,
        ThirdPersonRigPlugin,
    ));
    app.init_asset::<StandardMaterial>();
    app.insert_resource(Time::<Fixed>::from_duration(Duration::from_secs_f32(
        TIMESTEP,
    )));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
        TIMESTEP,
    )));
    app
}

/// Target at the origin, a glass pane tagged on its body at z = 2 and a
/// solid wall at z = 4, all across the line to a camera at z = 6.
fn arena(wall_layers: CollisionLayers) -> Arena {
    let mut app = create_app();
    app.finish();

    let world = app.world_mut();
    let target = world
        .spawn((Transform::default(), RigidBody::Static, Collider::sphere(0.5)))
        .id();

    let glass = world
        .spawn((Transform::default(), Collider::cuboid(10.0, 4.0, 0.2)))
        .id();
    world
        .spawn((
            Transform::from_xyz(0.0, 0.0, 2.0),
            RigidBody::Static,
            ObstacleTag::new("Ignore"),
        ))
        .add_child(glass);

    let wall = world
        .spawn((
            Transform::from_xyz(0.0, 0.0, 4.0),
            RigidBody::Static,
            Collider::cuboid(10.0, 4.0, 0.2),
            wall_layers,
        ))
        .id();

    Arena {
        app,
        target,
        glass,
        wall,
    }
}

fn spawn_rig(arena: &mut Arena, settings: RigSettings) -> Entity {
    let target = arena.target;
    arena
        .app
        .world_mut()
        .spawn((
            ThirdPersonRig {
                pivot_offset: Vec3::ZERO,
                ..ThirdPersonRig::new(target)
            },
            settings,
            Transform::from_xyz(0.0, 0.0, RIG_DISTANCE),
        ))
        .id()
}

fn step(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

fn steady_settings() -> RigSettings {
    RigSettings {
        disable_auto_rotation: true,
        ..default()
    }
}

#[test]
fn rig_settles_in_front_of_the_wall_behind_the_glass() {
    let mut arena = arena(CollisionLayers::default());
    let rig = spawn_rig(&mut arena, steady_settings());
    step(&mut arena.app, 90);

    let state = arena.app.world().get::<RigState>(rig).unwrap();
    assert!(state.occluded);
    assert_eq!(state.distance(), RIG_DISTANCE);
    assert!(state.camera_distance < WALL_FACE);
    assert!(state.camera_distance > WALL_FACE - 0.05);

    let transform = arena.app.world().get::<Transform>(rig).unwrap();
    assert!(transform.translation.z < WALL_FACE);
    assert!(transform.translation.z > 2.1);
}

#[test]
fn layers_outside_the_collision_mask_do_not_occlude() {
    let mut arena = arena(CollisionLayers::new(LayerMask(0b10), LayerMask::ALL));
    let rig = spawn_rig(
        &mut arena,
        RigSettings {
            collision_mask: 0b01,
            ..steady_settings()
        },
    );
    step(&mut arena.app, 90);

    let state = arena.app.world().get::<RigState>(rig).unwrap();
    assert!(!state.occluded);
    assert!((state.camera_distance - RIG_DISTANCE).abs() < 1e-3);
}

type TaggedHit = Option<(Entity, f32, Option<String>)>;

fn first_hit(In((origin, target)): In<(Vec3, Entity)>, scene: RigScene) -> TaggedHit {
    let scene = scene.for_rig(u32::MAX, target);
    scene
        .cast_ray(origin, Dir3::Z, 100.0)
        .map(|hit| (hit.entity, hit.distance, scene.tag(hit.entity).map(str::to_owned)))
}

fn overlapping(
    In((center, radius, target)): In<(Vec3, f32, Entity)>,
    scene: RigScene,
) -> Vec<Entity> {
    scene.for_rig(u32::MAX, target).overlap_sphere(center, radius)
}

#[test]
fn scene_skips_the_target_and_reads_tags_from_the_body() {
    let mut arena = arena(CollisionLayers::default());
    step(&mut arena.app, 3);
    let (target, glass) = (arena.target, arena.glass);

    // the pivot sits inside the target's collider
    let (entity, distance, tag) = arena
        .app
        .world_mut()
        .run_system_once_with(first_hit, (Vec3::ZERO, target))
        .unwrap()
        .unwrap();
    assert_eq!(entity, glass);
    assert!((distance - 1.9).abs() < 1e-3);
    assert_eq!(tag.as_deref(), Some("Ignore"));

    assert!(
        arena
            .app
            .world_mut()
            .run_system_once_with(overlapping, (Vec3::ZERO, PROXIMITY_RADIUS, target))
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        arena
            .app
            .world_mut()
            .run_system_once_with(overlapping, (Vec3::ZERO, PROXIMITY_RADIUS, Entity::PLACEHOLDER))
            .unwrap(),
        vec![target]
    );
    // other radii get their own shape
    assert_eq!(
        arena
            .app
            .world_mut()
            .run_system_once_with(overlapping, (Vec3::ZERO, 2.5, target))
            .unwrap(),
        vec![glass]
    );
}

#[test]
fn rig_holds_its_pose_after_losing_the_target() {
    let mut arena = arena(CollisionLayers::default());
    let rig = spawn_rig(&mut arena, steady_settings());
    step(&mut arena.app, 30);
    let before = *arena.app.world().get::<Transform>(rig).unwrap();

    let target = arena.target;
    arena.app.world_mut().despawn(target);
    step(&mut arena.app, 10);

    assert_eq!(*arena.app.world().get::<Transform>(rig).unwrap(), before);
    assert!(arena.app.world().get::<RigState>(rig).is_some());
}

#[test]
fn casting_from_inside_a_collider_reports_its_exit() {
    let mut arena = arena(CollisionLayers::default());
    step(&mut arena.app, 3);
    let (target, glass, wall) = (arena.target, arena.glass, arena.wall);

    let (entity, distance, _) = arena
        .app
        .world_mut()
        .run_system_once_with(first_hit, (Vec3::new(0.0, 0.0, 2.0), target))
        .unwrap()
        .unwrap();
    assert_eq!(entity, glass);
    assert!((distance - 0.1).abs() < 1e-3);

    let (entity, distance, tag) = arena
        .app
        .world_mut()
        .run_system_once_with(first_hit, (Vec3::new(0.0, 0.0, 2.2), target))
        .unwrap()
        .unwrap();
    assert_eq!(entity, wall);
    assert!((distance - (WALL_FACE - 2.2)).abs() < 1e-3);
    assert_eq!(tag, None);
}

#[derive(Resource, Default)]
struct SettingsChanges(usize);

fn count_settings_changes(
    changed: Query<(), Changed<RigSettings>>,
    mut changes: ResMut<SettingsChanges>,
) {
    changes.0 += changed.iter().count();
}

#[test]
fn out_of_range_settings_are_clamped_once() {
    let mut arena = arena(CollisionLayers::default());
    arena.app.init_resource::<SettingsChanges>();
    arena.app.add_systems(Last, count_settings_changes);

    let rig = spawn_rig(
        &mut arena,
        RigSettings {
            sensitivity_x: -2.0,
            pitch_min: f32::NAN,
            ..steady_settings()
        },
    );
    step(&mut arena.app, 5);

    let settings = arena.app.world().get::<RigSettings>(rig).unwrap();
    assert_eq!(settings.sensitivity_x, 0.0);
    assert_eq!(settings.pitch_min, -80.0);
    assert!(arena.app.world().get::<RigState>(rig).is_some());
    // clamping must not look like another edit
    assert_eq!(arena.app.world().resource::<SettingsChanges>().0, 1);

    arena.app.world_mut().entity_mut(rig).insert(RigSettings {
        min_distance_from_target: -1.0,
        ..steady_settings()
    });
    step(&mut arena.app, 3);

    let settings = arena.app.world().get::<RigSettings>(rig).unwrap();
    assert_eq!(settings.min_distance_from_target, 0.0);
    assert_eq!(arena.app.world().resource::<SettingsChanges>().0, 2);
}
