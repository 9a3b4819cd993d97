use avian3d::prelude::*;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::occlusion::{PROXIMITY_RADIUS, SceneHit, SceneQuery};

/// Free-form tag on a collider, matched against the rig's ignore and no-peek tags.
///
/// A collider without a tag of its own inherits the tag of its rigid body.
#[derive(Component, Reflect, Debug, Clone, PartialEq, Eq)]
#[reflect(Component)]
pub struct ObstacleTag(pub String);

impl ObstacleTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

/// Sphere shape for the proximity check, built once per system.
pub struct ProximitySphere(Collider);

impl Default for ProximitySphere {
    fn default() -> Self {
        Self(Collider::sphere(PROXIMITY_RADIUS))
    }
}

/// Everything the rig reads from the physics world.
#[derive(SystemParam)]
pub struct RigScene<'w, 's> {
    spatial: SpatialQuery<'w, 's>,
    tags: Query<'w, 's, &'static ObstacleTag>,
    bodies: Query<'w, 's, &'static ColliderOf>,
    proximity: Local<'s, ProximitySphere>,
}

impl<'w, 's> RigScene<'w, 's> {
    /// Queries restricted to `collision_mask`, never reporting the followed target.
    pub fn for_rig(&self, collision_mask: u32, target: Entity) -> FilteredScene<'_, 'w, 's> {
        FilteredScene {
            scene: self,
            filter: SpatialQueryFilter::from_mask(LayerMask(collision_mask))
                .with_excluded_entities([target]),
        }
    }
}

/// [`SceneQuery`] backed by avian's spatial query pipeline.
pub struct FilteredScene<'a, 'w, 's> {
    scene: &'a RigScene<'w, 's>,
    filter: SpatialQueryFilter,
}

impl SceneQuery for FilteredScene<'_, '_, '_> {
    fn cast_ray(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<SceneHit> {
        // not solid: a ray starting inside a collider reports its exit point
        self.scene
            .spatial
            .cast_ray(origin, direction, max_distance, false, &self.filter)
            .map(|hit| SceneHit {
                entity: hit.entity,
                distance: hit.distance,
            })
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        let intersections = |shape: &Collider| {
            self.scene
                .spatial
                .shape_intersections(shape, center, Quat::IDENTITY, &self.filter)
        };
        if radius == PROXIMITY_RADIUS {
            intersections(&self.scene.proximity.0)
        } else {
            intersections(&Collider::sphere(radius))
        }
    }

    fn tag(&self, entity: Entity) -> Option<&str> {
        let tags = &self.scene.tags;
        let tag = match tags.get(entity) {
            Ok(tag) => Some(tag),
            Err(_) => self
                .scene
                .bodies
                .get(entity)
                .ok()
                .and_then(|collider_of| tags.get(collider_of.body).ok()),
        };
        tag.map(|tag| tag.0.as_str())
    }
}
