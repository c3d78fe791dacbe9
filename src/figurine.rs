//! Figurine and hotspot sprites. Pure presentation: every value shown here is read from the
//! store, nothing is written back.
//!
//! World space has its origin at the viewport center with y up; the HUD moves the camera, so
//! sprites are laid out as if the HUD were at identity.

use bevy::prelude::*;

use crate::config::DioramaConfig;
use crate::drag::{FigurinePosition, OpeningFigurine};
use crate::proximity::{Landmark, ProximityFlags};
use crate::scene::{SceneId, SceneMachine, SceneVisibility};
use crate::state::DioramaSet;
use crate::viewport::{OpeningGeometry, Viewport};

const FIGURINE_TEXTURE: &str = "textures/figurine.png";
const FIGURINE_Z: f32 = 2.0;
const HOTSPOT_Z: f32 = 1.0;

const HOTSPOT_IDLE: Color = Color::srgba(1.0, 1.0, 1.0, 0.0);
const HOTSPOT_NEAR: Color = Color::srgba(1.0, 0.85, 0.4, 0.45);

/// Height of the hub figurine as a percent of the viewport height.
const MAIN_FIGURINE_HEIGHT: f32 = 18.0;

pub struct FigurinePlugin;

impl Plugin for FigurinePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_figurines).add_systems(
            Update,
            (sync_opening_figurine, sync_main_figurine, sync_hotspots)
                .in_set(DioramaSet::Presentation),
        );
    }
}

#[derive(Component)]
pub struct OpeningFigurineSprite;

#[derive(Component)]
pub struct MainFigurineSprite;

#[derive(Component, Debug, Clone, Copy)]
pub struct Hotspot(pub Landmark);

/// Container pixels (origin top-left, y down) to world units.
pub fn pixels_to_world(pixels: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(pixels.x - size.x * 0.5, size.y * 0.5 - pixels.y)
}

/// Scene percent to world units.
pub fn percent_to_world(percent: Vec2, size: Vec2) -> Vec2 {
    pixels_to_world(percent / 100.0 * size, size)
}

fn spawn_figurines(mut commands: Commands, asset_server: Res<AssetServer>) {
    let texture: Handle<Image> = asset_server.load(FIGURINE_TEXTURE);

    commands.spawn((
        Name::new("OpeningFigurine"),
        OpeningFigurineSprite,
        SpriteBundle {
            texture: texture.clone(),
            transform: Transform::from_xyz(0.0, 0.0, FIGURINE_Z),
            ..default()
        },
    ));

    commands.spawn((
        Name::new("MainFigurine"),
        MainFigurineSprite,
        SpriteBundle {
            texture,
            transform: Transform::from_xyz(0.0, 0.0, FIGURINE_Z),
            visibility: Visibility::Hidden,
            ..default()
        },
    ));

    for landmark in Landmark::ALL {
        commands.spawn((
            Name::new(format!("Hotspot{:?}", landmark)),
            Hotspot(landmark),
            SpriteBundle {
                sprite: Sprite {
                    color: HOTSPOT_IDLE,
                    ..default()
                },
                transform: Transform::from_xyz(0.0, 0.0, HOTSPOT_Z),
                visibility: Visibility::Hidden,
                ..default()
            },
        ));
    }
}

fn sync_opening_figurine(
    viewport: Res<Viewport>,
    geometry: Res<OpeningGeometry>,
    opening: Res<OpeningFigurine>,
    visibility: Res<SceneVisibility>,
    mut query: Query<(&mut Transform, &mut Sprite, &mut Visibility), With<OpeningFigurineSprite>>,
) {
    for (mut transform, mut sprite, mut shown) in &mut query {
        if !visibility.opening_mounted {
            *shown = Visibility::Hidden;
            continue;
        }

        let bounds = opening.bounds(geometry.figurine_home);
        let world = pixels_to_world(bounds.center, viewport.size);
        transform.translation = world.extend(FIGURINE_Z);
        sprite.custom_size = Some(bounds.size);
        sprite.color = Color::srgba(1.0, 1.0, 1.0, visibility.opening_opacity);
        *shown = Visibility::Visible;
    }
}

fn sync_main_figurine(
    viewport: Res<Viewport>,
    machine: Res<SceneMachine>,
    position: Res<FigurinePosition>,
    visibility: Res<SceneVisibility>,
    mut query: Query<(&mut Transform, &mut Sprite, &mut Visibility), With<MainFigurineSprite>>,
) {
    let on_hub = machine.state().id() == SceneId::Main;

    for (mut transform, mut sprite, mut shown) in &mut query {
        let Some(center) = position.get().filter(|_| on_hub) else {
            *shown = Visibility::Hidden;
            continue;
        };

        let height = MAIN_FIGURINE_HEIGHT / 100.0 * viewport.size.y;
        transform.translation = percent_to_world(center, viewport.size).extend(FIGURINE_Z);
        sprite.custom_size = Some(Vec2::new(height * 0.5, height));
        sprite.color = Color::srgba(1.0, 1.0, 1.0, visibility.main_opacity);
        *shown = Visibility::Visible;
    }
}

/// Hotspots sit on their landmarks and light up while the figurine is near.
fn sync_hotspots(
    viewport: Res<Viewport>,
    config: Res<DioramaConfig>,
    machine: Res<SceneMachine>,
    proximity: Res<ProximityFlags>,
    mut query: Query<(&Hotspot, &mut Transform, &mut Sprite, &mut Visibility)>,
) {
    let layout = config.layout(viewport.breakpoint);
    let on_hub = machine.state().id() == SceneId::Main;

    for (hotspot, mut transform, mut sprite, mut shown) in &mut query {
        let Some(spec) = layout.landmark(hotspot.0).filter(|_| on_hub) else {
            *shown = Visibility::Hidden;
            continue;
        };

        let diameter = viewport.to_pixels(Vec2::splat(spec.hotspot_radius * 2.0));
        transform.translation = percent_to_world(spec.position, viewport.size).extend(HOTSPOT_Z);
        sprite.custom_size = Some(diameter);
        sprite.color = if proximity.is_near(hotspot.0) {
            HOTSPOT_NEAR
        } else {
            HOTSPOT_IDLE
        };
        *shown = Visibility::Visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneCommand, TransitionContext};

    #[test]
    fn world_origin_is_the_viewport_center() {
        let size = Vec2::new(1000.0, 500.0);
        assert_eq!(pixels_to_world(Vec2::new(500.0, 250.0), size), Vec2::ZERO);
        assert_eq!(
            pixels_to_world(Vec2::new(0.0, 0.0), size),
            Vec2::new(-500.0, 250.0)
        );
        assert_eq!(
            percent_to_world(Vec2::new(100.0, 100.0), size),
            Vec2::new(500.0, -250.0)
        );
    }

    fn hub_machine(config: &DioramaConfig) -> SceneMachine {
        let mut machine = SceneMachine::new(config.timings);
        let ctx = TransitionContext {
            figurine_placed: true,
            ..default()
        };
        machine.handle(SceneCommand::EnterMain, &ctx);
        machine.advance(config.timings.settled());
        machine
    }

    #[test]
    fn hotspots_show_on_the_hub_and_highlight_when_near() {
        let config = DioramaConfig::default();
        let mut app = App::new();
        app.insert_resource(hub_machine(&config))
            .insert_resource(config)
            .init_resource::<Viewport>()
            .init_resource::<ProximityFlags>()
            .add_systems(Update, sync_hotspots);

        let mirror = app
            .world_mut()
            .spawn((Hotspot(Landmark::Mirror), SpriteBundle::default()))
            .id();

        app.update();
        assert_eq!(
            app.world().get::<Visibility>(mirror),
            Some(&Visibility::Visible)
        );
        assert_eq!(
            app.world().get::<Sprite>(mirror).map(|sprite| sprite.color),
            Some(HOTSPOT_IDLE)
        );

        app.world_mut()
            .resource_mut::<ProximityFlags>()
            .set(Landmark::Mirror, true);
        app.update();
        assert_eq!(
            app.world().get::<Sprite>(mirror).map(|sprite| sprite.color),
            Some(HOTSPOT_NEAR)
        );
    }

    #[test]
    fn hotspots_hide_outside_the_hub() {
        let mut app = App::new();
        app.insert_resource(DioramaConfig::default())
            .init_resource::<Viewport>()
            .init_resource::<SceneMachine>()
            .init_resource::<ProximityFlags>()
            .add_systems(Update, sync_hotspots);

        let radio = app
            .world_mut()
            .spawn((Hotspot(Landmark::Radio), SpriteBundle::default()))
            .id();
        app.update();
        assert_eq!(
            app.world().get::<Visibility>(radio),
            Some(&Visibility::Hidden)
        );
    }
}
