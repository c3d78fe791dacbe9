//! HUD transform: the zoom/pan applied to the scene viewport.
//!
//! Each scene has a per-breakpoint default. Leaving the Main scene remembers a user-customised
//! transform so returning restores it; anything within epsilon of the default counts as untouched.
//! The transform ends up on the 2D camera: zoom becomes the projection scale, translation becomes
//! a camera offset.

use std::time::Duration;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use serde::{Deserialize, Serialize};

use crate::config::{DioramaConfig, HudDefaults, HudSettings};
use crate::scene::{Scene, SceneEvent, SceneId, SceneMachine};
use crate::state::DioramaSet;
use crate::viewport::Viewport;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Hud>()
            .add_event::<HudCommand>()
            .add_systems(PostStartup, reset_hud_to_scene_default)
            .add_systems(
                Update,
                (
                    follow_scene_events,
                    follow_breakpoint,
                    apply_hud_commands,
                    ease_hud,
                    apply_hud_to_camera,
                )
                    .chain()
                    .in_set(DioramaSet::Presentation),
            );
    }
}

/// Zoom around the viewport center followed by a translation, in percent of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudTransform {
    pub zoom: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Default for HudTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl HudTransform {
    pub const IDENTITY: Self = Self {
        zoom: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    pub const fn new(zoom: f32, translate_x: f32, translate_y: f32) -> Self {
        Self {
            zoom,
            translate_x,
            translate_y,
        }
    }

    pub fn translate(&self) -> Vec2 {
        Vec2::new(self.translate_x, self.translate_y)
    }

    pub fn approx_eq(&self, other: &HudTransform, settings: &HudSettings) -> bool {
        (self.zoom - other.zoom).abs() <= settings.zoom_epsilon
            && (self.translate_x - other.translate_x).abs() <= settings.translate_epsilon
            && (self.translate_y - other.translate_y).abs() <= settings.translate_epsilon
    }

    pub fn lerp(&self, other: &HudTransform, t: f32) -> HudTransform {
        let t = t.clamp(0.0, 1.0);
        HudTransform {
            zoom: self.zoom + (other.zoom - self.zoom) * t,
            translate_x: self.translate_x + (other.translate_x - self.translate_x) * t,
            translate_y: self.translate_y + (other.translate_y - self.translate_y) * t,
        }
    }

    /// Percent-of-viewport screen point to the scene's own percent coordinates.
    pub fn screen_to_scene(&self, screen: Vec2) -> Vec2 {
        let zoom = self.zoom.max(f32::EPSILON);
        (screen - Vec2::splat(50.0) - self.translate()) / zoom + Vec2::splat(50.0)
    }

    /// Window pixels to unzoomed scene pixels, the space the Opening geometry is laid out in.
    pub fn screen_px_to_scene_px(&self, pixels: Vec2, viewport: &Viewport) -> Vec2 {
        viewport.to_pixels(self.screen_to_scene(viewport.to_percent(pixels)))
    }
}

/// Intent from input: zoom by a number of steps, or pan by a percent offset.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum HudCommand {
    Zoom(f32),
    Pan(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tween {
    from: HudTransform,
    to: HudTransform,
    elapsed: Duration,
    duration: Duration,
}

#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct Hud {
    current: HudTransform,
    tween: Option<Tween>,
    saved_main: Option<HudTransform>,
}

impl Hud {
    pub fn new(initial: HudTransform) -> Self {
        Self {
            current: initial,
            ..default()
        }
    }

    pub fn current(&self) -> HudTransform {
        self.current
    }

    pub fn saved_main(&self) -> Option<HudTransform> {
        self.saved_main
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    pub fn snap_to(&mut self, target: HudTransform) {
        self.tween = None;
        self.current = target;
    }

    pub fn animate_to(&mut self, target: HudTransform, duration: Duration) {
        if duration.is_zero() {
            self.snap_to(target);
            return;
        }

        self.tween = Some(Tween {
            from: self.current,
            to: target,
            elapsed: Duration::ZERO,
            duration,
        });
    }

    /// Advances the running animation with a smoothstep ease.
    pub fn step(&mut self, delta: Duration) {
        let Some(tween) = self.tween.as_mut() else {
            return;
        };

        tween.elapsed += delta;
        let t = (tween.elapsed.as_secs_f32() / tween.duration.as_secs_f32()).min(1.0);
        let eased = t * t * (3.0 - 2.0 * t);
        self.current = tween.from.lerp(&tween.to, eased);

        if tween.elapsed >= tween.duration {
            self.current = tween.to;
            self.tween = None;
        }
    }

    pub fn on_scene_changed(
        &mut self,
        from: Scene,
        to: Scene,
        defaults: &HudDefaults,
        settings: &HudSettings,
    ) {
        match (from, to) {
            (Scene::Main, to) if to.is_object() => {
                self.saved_main = (!self.current.approx_eq(&defaults.main, settings))
                    .then_some(self.current);
                if let Some(saved) = self.saved_main {
                    debug!("Saved customised Main HUD {:?}", saved);
                }
                self.snap_to(defaults.for_scene(to.id()));
            }
            (from, Scene::Main | Scene::EndGame) if from.is_object() => {
                let restored = self.saved_main.take().unwrap_or(defaults.main);
                self.snap_to(restored);
            }
            (Scene::Opening, Scene::Main) if !self.is_animating() => {
                self.snap_to(defaults.main);
            }
            _ => {}
        }
    }

    /// Keeps an untouched transform on the default of the new breakpoint.
    pub fn on_breakpoint_changed(
        &mut self,
        scene: SceneId,
        previous: &HudDefaults,
        next: &HudDefaults,
        settings: &HudSettings,
    ) {
        if self.is_animating() {
            if let Some(tween) = self.tween.as_mut() {
                if tween.to.approx_eq(&previous.for_scene(SceneId::Main), settings) {
                    tween.to = next.for_scene(SceneId::Main);
                }
            }
            return;
        }

        if self
            .current
            .approx_eq(&previous.for_scene(scene), settings)
        {
            self.snap_to(next.for_scene(scene));
        }
    }

    /// Applies a user zoom/pan, clamped so the scene never leaves the viewport. Returns whether the
    /// transform changed.
    pub fn apply_user(&mut self, command: HudCommand, settings: &HudSettings) -> bool {
        if self.is_animating() {
            return false;
        }

        let mut next = self.current;
        match command {
            HudCommand::Zoom(steps) => {
                next.zoom = (next.zoom + steps * settings.zoom_step)
                    .clamp(settings.min_zoom, settings.max_zoom);
            }
            HudCommand::Pan(offset) => {
                next.translate_x += offset.x;
                next.translate_y += offset.y;
            }
        }

        let limit = ((next.zoom - 1.0) * 50.0).max(0.0);
        next.translate_x = next.translate_x.clamp(-limit, limit);
        next.translate_y = next.translate_y.clamp(-limit, limit);

        let changed = next != self.current;
        self.current = next;
        changed
    }
}

fn reset_hud_to_scene_default(
    machine: Res<SceneMachine>,
    viewport: Res<Viewport>,
    config: Res<DioramaConfig>,
    mut hud: ResMut<Hud>,
) {
    let defaults = &config.layout(viewport.breakpoint).hud_defaults;
    hud.snap_to(defaults.for_scene(machine.state().id()));
}

fn follow_scene_events(
    mut events: EventReader<SceneEvent>,
    viewport: Res<Viewport>,
    config: Res<DioramaConfig>,
    mut hud: ResMut<Hud>,
) {
    let defaults = &config.layout(viewport.breakpoint).hud_defaults;

    for event in events.read() {
        match *event {
            SceneEvent::HudToNeutral => {
                hud.animate_to(defaults.main, config.timings.hud_transition());
            }
            SceneEvent::Changed { from, to } => {
                hud.on_scene_changed(from, to, defaults, &config.hud);
            }
            _ => {}
        }
    }
}

fn follow_breakpoint(
    viewport: Res<Viewport>,
    machine: Res<SceneMachine>,
    config: Res<DioramaConfig>,
    mut last: Local<Option<crate::viewport::Breakpoint>>,
    mut hud: ResMut<Hud>,
) {
    let previous = last.replace(viewport.breakpoint);
    let Some(previous) = previous.filter(|previous| *previous != viewport.breakpoint) else {
        return;
    };

    hud.on_breakpoint_changed(
        machine.state().id(),
        &config.layout(previous).hud_defaults,
        &config.layout(viewport.breakpoint).hud_defaults,
        &config.hud,
    );
}

fn apply_hud_commands(
    mut commands: EventReader<HudCommand>,
    machine: Res<SceneMachine>,
    config: Res<DioramaConfig>,
    mut hud: ResMut<Hud>,
) {
    let accepts_user_input = machine.current() == Scene::Main && !machine.is_busy();
    for command in commands.read() {
        if accepts_user_input {
            hud.apply_user(*command, &config.hud);
        }
    }
}

fn ease_hud(time: Res<Time>, mut hud: ResMut<Hud>) {
    if hud.is_animating() {
        hud.step(time.delta());
    }
}

fn apply_hud_to_camera(
    hud: Res<Hud>,
    viewport: Res<Viewport>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut camera_query: Query<(&mut Transform, &mut OrthographicProjection), With<Camera2d>>,
) {
    if !hud.is_changed() && !viewport.is_changed() {
        return;
    }

    let Ok((mut camera_transform, mut projection)) = camera_query.get_single_mut() else {
        return;
    };

    let size = windows
        .get_single()
        .map(|window| window.resolution.size())
        .unwrap_or(viewport.size);

    let transform = hud.current();
    let zoom = transform.zoom.max(0.0001);
    projection.scale = 1.0 / zoom;

    // Screen y grows downwards, world y upwards.
    let offset_px = transform.translate() / 100.0 * size;
    camera_transform.translation.x = -offset_px.x / zoom;
    camera_transform.translation.y = offset_px.y / zoom;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> HudDefaults {
        DioramaConfig::default().desktop.hud_defaults
    }

    fn settings() -> HudSettings {
        HudSettings::default()
    }

    #[test]
    fn screen_points_map_into_the_zoomed_scene() {
        let transform = HudTransform::new(2.0, 10.0, -4.0);
        let scene = Vec2::new(30.0, 70.0);
        assert!((transform.screen_to_scene(Vec2::new(20.0, 86.0)) - scene).length() < 1e-4);
        assert_eq!(HudTransform::IDENTITY.screen_to_scene(scene), scene);
    }

    #[test]
    fn opening_pixels_follow_the_opening_zoom() {
        let viewport = Viewport::default();
        let opening = defaults().opening;
        // The desktop figurine home (384, 396) is drawn at (230.4, 360) under zoom 1.6.
        let scene = opening.screen_px_to_scene_px(Vec2::new(230.4, 360.0), &viewport);
        assert!((scene - Vec2::new(384.0, 396.0)).length() < 1e-3, "{:?}", scene);

        // Pointer travel shrinks by the zoom.
        let moved = opening.screen_px_to_scene_px(Vec2::new(230.4 + 160.0, 360.0), &viewport);
        assert!((moved - scene - Vec2::new(100.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn approx_eq_uses_epsilons() {
        let base = HudTransform::IDENTITY;
        assert!(base.approx_eq(&HudTransform::new(1.005, 0.4, -0.4), &settings()));
        assert!(!base.approx_eq(&HudTransform::new(1.05, 0.0, 0.0), &settings()));
        assert!(!base.approx_eq(&HudTransform::new(1.0, 0.0, 0.6), &settings()));
    }

    #[test]
    fn animation_reaches_target_exactly() {
        let mut hud = Hud::new(HudTransform::new(1.6, 0.0, -8.0));
        hud.animate_to(HudTransform::IDENTITY, Duration::from_secs(2));

        hud.step(Duration::from_secs(1));
        let midway = hud.current();
        assert!(midway.zoom < 1.6 && midway.zoom > 1.0);
        assert!(hud.is_animating());

        hud.step(Duration::from_millis(1500));
        assert_eq!(hud.current(), HudTransform::IDENTITY);
        assert!(!hud.is_animating());
    }

    #[test]
    fn customised_main_transform_survives_object_scene_visit() {
        let mut hud = Hud::new(HudTransform::IDENTITY);
        assert!(hud.apply_user(HudCommand::Zoom(5.0), &settings()));
        hud.apply_user(HudCommand::Pan(Vec2::new(6.0, 0.0)), &settings());
        let customised = hud.current();
        assert_eq!(customised.zoom, 1.5);

        hud.on_scene_changed(Scene::Main, Scene::Mirror, &defaults(), &settings());
        assert_eq!(hud.current(), defaults().mirror);
        assert_eq!(hud.saved_main(), Some(customised));

        hud.on_scene_changed(Scene::Mirror, Scene::Main, &defaults(), &settings());
        assert_eq!(hud.current(), customised);
        assert_eq!(hud.saved_main(), None);
    }

    #[test]
    fn untouched_main_returns_to_default() {
        let mut hud = Hud::new(HudTransform::new(1.004, 0.2, 0.0));
        hud.on_scene_changed(Scene::Main, Scene::Hydrant, &defaults(), &settings());
        assert_eq!(hud.saved_main(), None);

        hud.on_scene_changed(Scene::Hydrant, Scene::Main, &defaults(), &settings());
        assert_eq!(hud.current(), defaults().main);
    }

    #[test]
    fn user_input_is_clamped() {
        let mut hud = Hud::new(HudTransform::IDENTITY);
        assert!(!hud.apply_user(HudCommand::Zoom(-3.0), &settings()));
        assert!(!hud.apply_user(HudCommand::Pan(Vec2::new(10.0, 10.0)), &settings()));

        hud.apply_user(HudCommand::Zoom(100.0), &settings());
        assert_eq!(hud.current().zoom, settings().max_zoom);
        hud.apply_user(HudCommand::Pan(Vec2::new(500.0, -500.0)), &settings());
        assert_eq!(hud.current().translate(), Vec2::new(75.0, -75.0));
    }

    #[test]
    fn user_input_ignored_while_animating() {
        let mut hud = Hud::new(HudTransform::new(2.0, 0.0, 0.0));
        hud.animate_to(HudTransform::IDENTITY, Duration::from_secs(1));
        assert!(!hud.apply_user(HudCommand::Zoom(1.0), &settings()));
    }

    #[test]
    fn breakpoint_change_moves_untouched_transform() {
        let config = DioramaConfig::default();
        let mut hud = Hud::new(config.desktop.hud_defaults.main);
        hud.on_breakpoint_changed(
            SceneId::Main,
            &config.desktop.hud_defaults,
            &config.mobile.hud_defaults,
            &config.hud,
        );
        assert_eq!(hud.current(), config.mobile.hud_defaults.main);

        let customised = HudTransform::new(2.0, 10.0, 0.0);
        hud.snap_to(customised);
        hud.on_breakpoint_changed(
            SceneId::Main,
            &config.mobile.hud_defaults,
            &config.desktop.hud_defaults,
            &config.hud,
        );
        assert_eq!(hud.current(), customised);
    }
}
