//! Viewport tracking: window size, breakpoint classification, and layout-derived geometry.
//!
//! The opening scene's drop zone and figurine rest position come from the live window layout, not
//! from constants, so they live behind `GeometryProvider` and are recomputed whenever the window
//! is resized.

use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};
use serde::{Deserialize, Serialize};

use crate::config::DioramaConfig;
use crate::geometry::{Bounds, Ellipse};
use crate::scene::SceneEvent;
use crate::state::DioramaSet;

pub struct ViewportPlugin;

impl Plugin for ViewportPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Viewport>()
            .init_resource::<OpeningGeometry>()
            .add_systems(Startup, sync_viewport_from_window)
            .add_systems(
                Update,
                (
                    track_window_resize,
                    recompute_opening_geometry.after(track_window_resize),
                    toggle_drop_zone,
                )
                    .in_set(DioramaSet::Input),
            );
    }
}

/// Coarse device class. Affects geometry constants, never scene logic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Breakpoint {
    Mobile,
    #[default]
    Desktop,
}

impl Breakpoint {
    pub fn from_width(width: f32, mobile_max_width: f32) -> Self {
        if width < mobile_max_width {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }
}

/// Logical size of the scene container (the primary window) plus its classification.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub size: Vec2,
    pub breakpoint: Breakpoint,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            size: Vec2::new(1280.0, 720.0),
            breakpoint: Breakpoint::Desktop,
        }
    }
}

impl Viewport {
    pub fn new(size: Vec2, mobile_max_width: f32) -> Self {
        Self {
            size,
            breakpoint: Breakpoint::from_width(size.x, mobile_max_width),
        }
    }

    /// Pixel position inside the container to percent-of-container.
    pub fn to_percent(&self, pixels: Vec2) -> Vec2 {
        if self.size.x <= 0.0 || self.size.y <= 0.0 {
            return Vec2::ZERO;
        }
        pixels / self.size * 100.0
    }

    pub fn to_pixels(&self, percent: Vec2) -> Vec2 {
        percent * self.size / 100.0
    }
}

/// Layout-derived geometry with a single recompute entry point, called on resize.
pub trait GeometryProvider {
    fn recompute(&mut self, viewport: &Viewport, config: &DioramaConfig);
}

/// Opening scene drop zone and the figurine's rest box, in unzoomed scene pixels. Pointers reach
/// this space through `HudTransform::screen_px_to_scene_px`.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Default)]
pub struct OpeningGeometry {
    pub drop_zone: DropZone,
    pub figurine_home: Bounds,
}

impl GeometryProvider for OpeningGeometry {
    fn recompute(&mut self, viewport: &Viewport, config: &DioramaConfig) {
        let layout = &config.layout(viewport.breakpoint).opening;
        let size = viewport.size;

        self.drop_zone.ellipse = Ellipse::new(
            layout.drop_zone_center * size,
            layout.drop_zone_radii * size,
        );
        self.figurine_home = Bounds::new(
            layout.figurine_home * size,
            layout.figurine_size * size.y,
        );
    }
}

/// Placement target of the opening scene. Collision tests only run while `active`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropZone {
    pub ellipse: Ellipse,
    pub active: bool,
}

impl Default for DropZone {
    fn default() -> Self {
        Self {
            ellipse: Ellipse::default(),
            active: true,
        }
    }
}

impl DropZone {
    pub fn contains(&self, point: Vec2) -> bool {
        self.active && self.ellipse.contains(point)
    }

    pub fn contains_any(&self, points: &[Vec2]) -> bool {
        points.iter().any(|point| self.contains(*point))
    }
}

fn sync_viewport_from_window(
    windows: Query<&Window, With<PrimaryWindow>>,
    config: Res<DioramaConfig>,
    mut viewport: ResMut<Viewport>,
    mut geometry: ResMut<OpeningGeometry>,
) {
    if let Ok(window) = windows.get_single() {
        *viewport = Viewport::new(window.resolution.size(), config.mobile_max_width);
    }
    geometry.recompute(&viewport, &config);
}

fn track_window_resize(
    mut resized: EventReader<WindowResized>,
    windows: Query<Entity, With<PrimaryWindow>>,
    config: Res<DioramaConfig>,
    mut viewport: ResMut<Viewport>,
) {
    let primary = windows.get_single().ok();
    let Some(latest) = resized
        .read()
        .filter(|event| primary.map_or(true, |entity| entity == event.window))
        .last()
    else {
        return;
    };

    let next = Viewport::new(
        Vec2::new(latest.width, latest.height),
        config.mobile_max_width,
    );
    if viewport.breakpoint != next.breakpoint {
        info!("Breakpoint changed to {:?}", next.breakpoint);
    }
    viewport.set_if_neq(next);
}

fn recompute_opening_geometry(
    viewport: Res<Viewport>,
    config: Res<DioramaConfig>,
    mut geometry: ResMut<OpeningGeometry>,
) {
    if !viewport.is_changed() && !config.is_changed() {
        return;
    }
    geometry.recompute(&viewport, &config);
}

/// The drop zone only collides while the opening scene is mounted.
fn toggle_drop_zone(mut events: EventReader<SceneEvent>, mut geometry: ResMut<OpeningGeometry>) {
    if events
        .read()
        .any(|event| matches!(event, SceneEvent::OpeningUnmounted))
    {
        debug!("Opening unmounted; drop zone disabled");
        geometry.drop_zone.active = false;
    }
}
