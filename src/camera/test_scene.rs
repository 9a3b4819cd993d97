//! In-memory scene of spheres for exercising the rig without a physics world.

use std::cell::Cell;

use bevy::prelude::*;

use super::occlusion::{SceneHit, SceneQuery};

struct Ball {
    entity: Entity,
    center: Vec3,
    radius: f32,
    tag: Option<String>,
}

#[derive(Default)]
pub struct TestScene {
    world: World,
    balls: Vec<Ball>,
    casts: Cell<usize>,
}

impl TestScene {
    pub fn sphere(&mut self, center: Vec3, radius: f32, tag: Option<&str>) -> Entity {
        let entity = self.world.spawn_empty().id();
        self.balls.push(Ball {
            entity,
            center,
            radius,
            tag: tag.map(str::to_string),
        });
        entity
    }

    /// Number of rays cast so far.
    pub fn casts(&self) -> usize {
        self.casts.get()
    }
}

impl SceneQuery for TestScene {
    fn cast_ray(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<SceneHit> {
        self.casts.set(self.casts.get() + 1);
        self.balls
            .iter()
            .filter_map(|ball| {
                let offset = origin - ball.center;
                let b = offset.dot(*direction);
                let c = offset.length_squared() - ball.radius * ball.radius;
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }
                let root = discriminant.sqrt();
                let near = -b - root;
                let far = -b + root;
                let distance = if near >= 0.0 { near } else { far };
                (distance >= 0.0 && distance <= max_distance).then_some(SceneHit {
                    entity: ball.entity,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        self.balls
            .iter()
            .filter(|ball| ball.center.distance(center) < ball.radius + radius)
            .map(|ball| ball.entity)
            .collect()
    }

    fn tag(&self, entity: Entity) -> Option<&str> {
        self.balls
            .iter()
            .find(|ball| ball.entity == entity)
            .and_then(|ball| ball.tag.as_deref())
    }
}
