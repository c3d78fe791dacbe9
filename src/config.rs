//! Tuning tables for the diorama: per-breakpoint geometry, choreography timings, HUD limits.
//!
//! Built-in defaults carry the shipped tuning. On native targets an optional JSON file can
//! override any subset of it (missing fields fall back to the defaults through `#[serde(default)]`).

use std::path::Path;
use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Bounds, Ellipse, Polygon};
use crate::hud::HudTransform;
use crate::proximity::{Landmark, LandmarkSpec};
use crate::scene::SceneId;
use crate::viewport::Breakpoint;

/// Location of the optional override file, relative to the working directory.
pub const CONFIG_PATH: &str = "assets/diorama.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed diorama config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid diorama config: {0}")]
    Invalid(String),
}

/// Installs `DioramaConfig` before any other plugin reads it.
pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<DioramaConfig>() {
            app.insert_resource(DioramaConfig::load_or_default(CONFIG_PATH));
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DioramaConfig {
    /// Viewports narrower than this many logical pixels use the mobile layout.
    pub mobile_max_width: f32,
    pub mobile: BreakpointLayout,
    pub desktop: BreakpointLayout,
    pub timings: ChoreographyTimings,
    pub hud: HudSettings,
    pub minigames: MinigameSettings,
}

impl DioramaConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reads the override file when one exists; any failure falls back to the built-in tuning.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if cfg!(target_arch = "wasm32") || !path.exists() {
            return Self::default();
        }

        match Self::from_path(path) {
            Ok(config) => {
                info!("Loaded diorama config from {}", path.display());
                config
            }
            Err(err) => {
                warn!("{err}; using built-in diorama config.");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.mobile_max_width > 0.0) {
            return Err(ConfigError::Invalid(
                "mobile_max_width must be positive".to_owned(),
            ));
        }

        for (name, layout) in [("mobile", &self.mobile), ("desktop", &self.desktop)] {
            layout
                .validate()
                .map_err(|reason| ConfigError::Invalid(format!("{name}: {reason}")))?;
        }

        if self.hud.min_zoom <= 0.0 || self.hud.max_zoom < self.hud.min_zoom {
            return Err(ConfigError::Invalid(
                "hud zoom limits must satisfy 0 < min_zoom <= max_zoom".to_owned(),
            ));
        }

        if self.minigames.hydrant_limit_degrees <= 0.0 {
            return Err(ConfigError::Invalid(
                "hydrant_limit_degrees must be positive".to_owned(),
            ));
        }

        Ok(())
    }

    pub fn layout(&self, breakpoint: Breakpoint) -> &BreakpointLayout {
        match breakpoint {
            Breakpoint::Mobile => &self.mobile,
            Breakpoint::Desktop => &self.desktop,
        }
    }
}

impl Default for DioramaConfig {
    fn default() -> Self {
        Self {
            mobile_max_width: 768.0,
            mobile: BreakpointLayout::mobile(),
            desktop: BreakpointLayout::desktop(),
            timings: ChoreographyTimings::default(),
            hud: HudSettings::default(),
            minigames: MinigameSettings::default(),
        }
    }
}

/// Everything that depends on the device class. Positions inside the Main scene are
/// percent-of-viewport; opening layout values are fractions of the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointLayout {
    pub floor_boundary: Polygon,
    /// Added to every floor vertex before testing.
    pub boundary_offset: Vec2,
    /// From the figurine center to its feet.
    pub foot_offset: Vec2,
    pub figurine_spawn: Vec2,
    pub figurine_grab_radius: f32,
    pub landmarks: Vec<LandmarkSpec>,
    pub hud_defaults: HudDefaults,
    pub opening: OpeningLayout,
    pub controls: ControlLayout,
}

impl BreakpointLayout {
    pub fn desktop() -> Self {
        Self {
            floor_boundary: Polygon::new(vec![
                Vec2::new(18.0, 58.0),
                Vec2::new(82.0, 58.0),
                Vec2::new(96.0, 92.0),
                Vec2::new(4.0, 92.0),
            ]),
            boundary_offset: Vec2::new(0.0, 2.0),
            foot_offset: Vec2::new(0.0, 9.0),
            figurine_spawn: Vec2::new(50.0, 75.0),
            figurine_grab_radius: 8.0,
            landmarks: vec![
                LandmarkSpec::new(Landmark::Mirror, Vec2::new(22.0, 55.0), 12.0, 7.0),
                LandmarkSpec::new(Landmark::Hydrant, Vec2::new(78.0, 70.0), 11.0, 6.0),
                LandmarkSpec::new(Landmark::Phone, Vec2::new(50.0, 60.0), 9.0, 5.0),
                LandmarkSpec::new(Landmark::Computer, Vec2::new(62.0, 56.0), 10.0, 6.0),
                LandmarkSpec::new(Landmark::Radio, Vec2::new(35.0, 72.0), 10.0, 6.0),
            ],
            hud_defaults: HudDefaults {
                opening: HudTransform::new(1.6, 0.0, -8.0),
                main: HudTransform::IDENTITY,
                hydrant: HudTransform::IDENTITY,
                mirror: HudTransform::IDENTITY,
                computer: HudTransform::IDENTITY,
                radio: HudTransform::IDENTITY,
            },
            opening: OpeningLayout {
                figurine_home: Vec2::new(0.3, 0.55),
                figurine_size: Vec2::new(0.09, 0.18),
                drop_zone_center: Vec2::new(0.62, 0.7),
                drop_zone_radii: Vec2::new(0.07, 0.035),
            },
            controls: ControlLayout::default(),
        }
    }

    pub fn mobile() -> Self {
        Self {
            floor_boundary: Polygon::new(vec![
                Vec2::new(8.0, 60.0),
                Vec2::new(92.0, 60.0),
                Vec2::new(100.0, 95.0),
                Vec2::new(0.0, 95.0),
            ]),
            boundary_offset: Vec2::new(0.0, 1.0),
            foot_offset: Vec2::new(0.0, 7.0),
            figurine_spawn: Vec2::new(50.0, 78.0),
            figurine_grab_radius: 11.0,
            landmarks: vec![
                LandmarkSpec::new(Landmark::Mirror, Vec2::new(14.0, 58.0), 15.0, 9.0),
                LandmarkSpec::new(Landmark::Hydrant, Vec2::new(86.0, 74.0), 14.0, 8.0),
                LandmarkSpec::new(Landmark::Phone, Vec2::new(50.0, 62.0), 11.0, 7.0),
                LandmarkSpec::new(Landmark::Computer, Vec2::new(68.0, 58.0), 13.0, 8.0),
                LandmarkSpec::new(Landmark::Radio, Vec2::new(30.0, 76.0), 13.0, 8.0),
            ],
            hud_defaults: HudDefaults {
                opening: HudTransform::new(1.9, 0.0, -10.0),
                main: HudTransform::new(1.25, 0.0, -6.0),
                hydrant: HudTransform::IDENTITY,
                mirror: HudTransform::IDENTITY,
                computer: HudTransform::IDENTITY,
                radio: HudTransform::IDENTITY,
            },
            opening: OpeningLayout {
                figurine_home: Vec2::new(0.5, 0.35),
                figurine_size: Vec2::new(0.12, 0.24),
                drop_zone_center: Vec2::new(0.5, 0.72),
                drop_zone_radii: Vec2::new(0.16, 0.04),
            },
            controls: ControlLayout::default(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.floor_boundary.vertices.len() < 3 {
            return Err("floor_boundary needs at least three vertices".to_owned());
        }

        for spec in &self.landmarks {
            if !(spec.threshold > 0.0) || !(spec.hotspot_radius > 0.0) {
                return Err(format!("{:?} needs positive threshold and radius", spec.landmark));
            }
        }

        for landmark in Landmark::ALL {
            if self.landmark(landmark).is_none() {
                return Err(format!("missing landmark {landmark:?}"));
            }
        }

        let radii = self.opening.drop_zone_radii;
        if !(radii.x > 0.0 && radii.y > 0.0) {
            return Err("drop_zone_radii must be positive".to_owned());
        }

        Ok(())
    }

    pub fn landmark(&self, landmark: Landmark) -> Option<&LandmarkSpec> {
        self.landmarks.iter().find(|spec| spec.landmark == landmark)
    }

    /// The walkable floor with the boundary offset already applied.
    pub fn floor(&self) -> Polygon {
        self.floor_boundary.translated(self.boundary_offset)
    }
}

/// Fractions of the viewport. `figurine_size` is measured against the viewport height on both
/// axes so the figurine keeps its aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningLayout {
    pub figurine_home: Vec2,
    pub figurine_size: Vec2,
    pub drop_zone_center: Vec2,
    pub drop_zone_radii: Vec2,
}

/// Screen-space (percent) regions of the scene chrome and minigame targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlLayout {
    pub back: Ellipse,
    pub end_control: Ellipse,
    pub mirror_surface: Bounds,
    pub hydrant_valve: Ellipse,
    pub photo_grid: PhotoGrid,
}

impl Default for ControlLayout {
    fn default() -> Self {
        Self {
            back: Ellipse::new(Vec2::new(6.0, 8.0), Vec2::splat(5.0)),
            end_control: Ellipse::new(Vec2::new(50.0, 80.0), Vec2::splat(8.0)),
            mirror_surface: Bounds::new(Vec2::new(50.0, 45.0), Vec2::new(40.0, 60.0)),
            hydrant_valve: Ellipse::new(Vec2::new(50.0, 50.0), Vec2::splat(20.0)),
            photo_grid: PhotoGrid::default(),
        }
    }
}

/// Thumbnail grid on the computer desktop, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhotoGrid {
    pub origin: Vec2,
    pub cell: Vec2,
    pub columns: u32,
    pub rows: u32,
}

impl Default for PhotoGrid {
    fn default() -> Self {
        Self {
            origin: Vec2::new(20.0, 25.0),
            cell: Vec2::new(20.0, 25.0),
            columns: 3,
            rows: 2,
        }
    }
}

impl PhotoGrid {
    pub fn photo_at(&self, point: Vec2) -> Option<usize> {
        if self.cell.x <= 0.0 || self.cell.y <= 0.0 {
            return None;
        }

        let local = (point - self.origin) / self.cell;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }

        let (column, row) = (local.x.floor() as u32, local.y.floor() as u32);
        (column < self.columns && row < self.rows).then(|| (row * self.columns + column) as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudDefaults {
    pub opening: HudTransform,
    pub main: HudTransform,
    pub hydrant: HudTransform,
    pub mirror: HudTransform,
    pub computer: HudTransform,
    pub radio: HudTransform,
}

impl HudDefaults {
    pub fn for_scene(&self, scene: SceneId) -> HudTransform {
        match scene {
            SceneId::Opening => self.opening,
            SceneId::Main => self.main,
            SceneId::Hydrant => self.hydrant,
            SceneId::Mirror => self.mirror,
            SceneId::Computer => self.computer,
            SceneId::Radio => self.radio,
        }
    }
}

/// Delays of the scene choreography, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreographyTimings {
    /// HUD pan/zoom to neutral; Main is committed when it ends.
    pub hud_transition_ms: u64,
    pub main_fade_in_ms: u64,
    pub opening_fade_out_ms: u64,
    /// Measured from the moment Main is fully visible.
    pub settle_after_visible_ms: u64,
    /// Lets the click sound play before the ending commits.
    pub ending_click_ms: u64,
}

impl Default for ChoreographyTimings {
    fn default() -> Self {
        Self {
            hud_transition_ms: 2000,
            main_fade_in_ms: 1000,
            opening_fade_out_ms: 600,
            settle_after_visible_ms: 3000,
            ending_click_ms: 400,
        }
    }
}

impl ChoreographyTimings {
    pub fn hud_transition(&self) -> Duration {
        Duration::from_millis(self.hud_transition_ms)
    }

    pub fn main_visible(&self) -> Duration {
        Duration::from_millis(self.hud_transition_ms + self.main_fade_in_ms)
    }

    pub fn opening_unmount(&self) -> Duration {
        self.main_visible() + Duration::from_millis(self.opening_fade_out_ms)
    }

    pub fn settled(&self) -> Duration {
        self.main_visible() + Duration::from_millis(self.settle_after_visible_ms)
    }

    pub fn ending_click(&self) -> Duration {
        Duration::from_millis(self.ending_click_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudSettings {
    pub zoom_epsilon: f32,
    pub translate_epsilon: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
    /// Percent of the viewport per key press.
    pub pan_step: f32,
}

impl Default for HudSettings {
    fn default() -> Self {
        Self {
            zoom_epsilon: 0.01,
            translate_epsilon: 0.5,
            min_zoom: 1.0,
            max_zoom: 2.5,
            zoom_step: 0.1,
            pan_step: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinigameSettings {
    pub hydrant_limit_degrees: f32,
    pub computer_target_photo: usize,
    /// Distance (percent) at which the radio music fades to silence.
    pub radio_audible_distance: f32,
}

impl Default for MinigameSettings {
    fn default() -> Self {
        Self {
            hydrant_limit_degrees: 1080.0,
            computer_target_photo: 4,
            radio_audible_distance: 60.0,
        }
    }
}
