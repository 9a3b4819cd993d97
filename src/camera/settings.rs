use bevy::prelude::*;
use serde::Deserialize;

/// Tunables for a [`ThirdPersonRig`](super::ThirdPersonRig).
///
/// Angles are in degrees, distances in world units. Values coming from the
/// inspector or a config file go through [`RigSettings::sanitize`] before use.
#[derive(Component, Reflect, Deserialize, Debug, Clone, PartialEq)]
#[reflect(Component)]
#[serde(default)]
pub struct RigSettings {
    /// Time constant of the orbit angle smoothing, in seconds.
    pub rotation_smooth_time: f32,
    pub sensitivity_x: f32,
    pub sensitivity_y: f32,
    /// Lowest pitch (looking up).
    pub pitch_min: f32,
    /// Highest pitch (looking down).
    pub pitch_max: f32,
    pub invert_x: bool,
    pub invert_y: bool,
    /// Offset of the pivot from the center of the screen, in the rig's right/up axes.
    pub screen_offset: Vec2,
    /// Physics layers the camera collides with.
    pub collision_mask: u32,
    /// Colliders carrying this tag never block the camera.
    pub ignore_tag: String,
    /// Obstacles with one of these tags never trigger a peek around them.
    pub no_peek_tags: Vec<String>,
    /// Closest the camera may be pulled toward the pivot.
    pub min_distance_from_target: f32,
    /// Maximum length of the occlusion ray, `0.0` for unlimited.
    pub ray_distance_limit: f32,
    pub disable_auto_rotation: bool,
    /// At or above this camera distance the target is fully opaque.
    pub min_dist_opaque: f32,
    /// At or below this camera distance the target is fully transparent.
    pub max_dist_transparent: f32,
}

impl Default for RigSettings {
    fn default() -> Self {
        Self {
            rotation_smooth_time: 0.12,
            sensitivity_x: 2.5,
            sensitivity_y: 2.5,
            pitch_min: -80.0,
            pitch_max: 40.0,
            invert_x: false,
            invert_y: false,
            screen_offset: Vec2::ZERO,
            collision_mask: u32::MAX,
            ignore_tag: "Ignore".to_string(),
            no_peek_tags: vec!["Ground".to_string()],
            min_distance_from_target: 0.2,
            ray_distance_limit: 0.0,
            disable_auto_rotation: false,
            min_dist_opaque: 0.8,
            max_dist_transparent: 0.5,
        }
    }
}

impl RigSettings {
    /// Parses a TOML document. Missing keys keep their defaults and the
    /// result is already sanitized.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        let settings: RigSettings = toml::from_str(source)?;
        Ok(settings.sanitized())
    }

    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }

    /// Clamps out-of-range values in place. Returns `true` if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let before = self.clone();
        let defaults = RigSettings::default();

        self.pitch_min = finite_or(self.pitch_min, defaults.pitch_min);
        self.pitch_max = finite_or(self.pitch_max, defaults.pitch_max);
        self.min_dist_opaque = finite_or(self.min_dist_opaque, defaults.min_dist_opaque);
        self.max_dist_transparent =
            finite_or(self.max_dist_transparent, defaults.max_dist_transparent);

        self.sensitivity_x = non_negative(self.sensitivity_x);
        self.sensitivity_y = non_negative(self.sensitivity_y);
        self.rotation_smooth_time = non_negative(self.rotation_smooth_time);
        self.min_distance_from_target = non_negative(self.min_distance_from_target);
        self.ray_distance_limit = non_negative(self.ray_distance_limit);
        self.min_dist_opaque = non_negative(self.min_dist_opaque);
        self.max_dist_transparent = non_negative(self.max_dist_transparent);

        if self.pitch_min > self.pitch_max {
            std::mem::swap(&mut self.pitch_min, &mut self.pitch_max);
        }
        if self.max_dist_transparent > self.min_dist_opaque {
            std::mem::swap(&mut self.max_dist_transparent, &mut self.min_dist_opaque);
        }
        if !self.screen_offset.is_finite() {
            self.screen_offset = Vec2::ZERO;
        }

        *self != before
    }

    /// `None` when the occlusion ray is unlimited.
    pub fn ray_limit(&self) -> Option<f32> {
        (self.ray_distance_limit > 0.0).then_some(self.ray_distance_limit)
    }

    pub fn is_ignored(&self, tag: Option<&str>) -> bool {
        !self.ignore_tag.is_empty() && tag == Some(self.ignore_tag.as_str())
    }

    pub fn blocks_peek(&self, tag: Option<&str>) -> bool {
        tag.is_some_and(|tag| self.no_peek_tags.iter().any(|t| t == tag))
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

// NaN falls to zero as well.
fn non_negative(value: f32) -> f32 {
    if value > 0.0 { value } else { 0.0 }
}

/// Sanitize hook: runs whenever the settings component is added or edited.
pub fn sanitize_rig_settings(mut q: Query<(Entity, &mut RigSettings), Changed<RigSettings>>) {
    for (entity, mut settings) in q.iter_mut() {
        // bypass change detection so the hook doesn't retrigger itself
        if settings.bypass_change_detection().sanitize() {
            warn!("rig settings on {entity} were out of range and have been clamped");
        }
    }
}
