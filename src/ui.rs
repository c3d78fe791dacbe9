//! Debug overlay. Spawned while `UiFlags::debug_visible` is set and refreshed every frame from the
//! store.

use bevy::prelude::*;

use crate::state::DioramaSet;
use crate::store::{DioramaStore, UiFlags};
use crate::tasks::Task;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (toggle_debug_overlay_node, refresh_debug_overlay)
                .chain()
                .in_set(DioramaSet::Presentation),
        );
    }
}

#[derive(Component)]
struct DebugOverlay;

#[derive(Component)]
struct DebugOverlayText;

/// One line per store cell.
pub fn debug_report(store: &DioramaStore) -> String {
    let proximity = store.proximity();
    let near = if proximity.any() {
        proximity
            .nearby()
            .map(|landmark| format!("{:?}", landmark))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        "none".to_owned()
    };
    let tasks: Vec<String> = [Task::Mirror, Task::Hydrant, Task::Computer, Task::Radio]
        .into_iter()
        .map(|task| format!("{:?}={}", task, store.is_complete(task)))
        .collect();
    let hud = store.hud();
    let transitioning = if store.is_transitioning() {
        format!(" (transitioning, {} steps left)", store.pending_scene_steps())
    } else {
        String::new()
    };
    let figurine = store
        .figurine_position()
        .map_or_else(|| "-".to_owned(), |p| format!("({:.1}, {:.1})", p.x, p.y));

    format!(
        "scene: {:?}{}{}\n\
         breakpoint: {:?} {:.0}x{:.0}\n\
         figurine: {} placed={} dragging={}\n\
         near: {}\n\
         tasks: {}\n\
         hud: zoom={:.2} translate=({:.1}, {:.1})\n\
         camera: {:?} credits={}",
        store.scene(),
        if store.is_end_scene() { " (end)" } else { "" },
        transitioning,
        store.breakpoint(),
        store.viewport_size().x,
        store.viewport_size().y,
        figurine,
        store.figurine_placed(),
        store.figurine_dragging(),
        near,
        tasks.join(" "),
        hud.zoom,
        hud.translate_x,
        hud.translate_y,
        store.camera_permission(),
        store.ui().credits_visible,
    )
}

fn toggle_debug_overlay_node(
    mut commands: Commands,
    flags: Res<UiFlags>,
    overlay: Query<Entity, With<DebugOverlay>>,
) {
    if !flags.is_changed() {
        return;
    }

    if !flags.debug_visible {
        for entity in &overlay {
            commands.entity(entity).despawn_recursive();
        }
        return;
    }

    if !overlay.is_empty() {
        return;
    }

    commands
        .spawn((
            DebugOverlay,
            Name::new("DebugOverlay"),
            NodeBundle {
                background_color: BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
                style: Style {
                    position_type: PositionType::Absolute,
                    left: Val::Px(8.0),
                    top: Val::Px(8.0),
                    padding: UiRect::all(Val::Px(6.0)),
                    ..default()
                },
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn((
                DebugOverlayText,
                TextBundle::from_section(
                    "",
                    TextStyle {
                        font_size: 14.0,
                        color: Color::srgba(0.9, 0.9, 0.9, 1.0),
                        ..default()
                    },
                ),
            ));
        });
}

fn refresh_debug_overlay(store: DioramaStore, mut text: Query<&mut Text, With<DebugOverlayText>>) {
    for mut text in &mut text {
        if let Some(section) = text.sections.first_mut() {
            section.value = debug_report(&store);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    use crate::config::DioramaConfig;
    use crate::drag::{FigurinePosition, MainDrag, OpeningFigurine};
    use crate::hud::{Hud, HudTransform};
    use crate::proximity::{Landmark, ProximityFlags};
    use crate::scene::SceneMachine;
    use crate::store::CameraPermission;
    use crate::tasks::TaskCompletion;
    use crate::viewport::Viewport;

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(DioramaConfig::default());
        world.init_resource::<SceneMachine>();
        world.init_resource::<Viewport>();
        world.init_resource::<TaskCompletion>();
        world.init_resource::<ProximityFlags>();
        world.init_resource::<FigurinePosition>();
        world.init_resource::<OpeningFigurine>();
        world.init_resource::<MainDrag>();
        world.insert_resource(Hud::new(HudTransform::IDENTITY));
        world.init_resource::<UiFlags>();
        world.init_resource::<CameraPermission>();
        world
    }

    #[test]
    fn report_lists_scene_and_flags() {
        let mut world = world();
        world
            .resource_mut::<ProximityFlags>()
            .set(Landmark::Radio, true);
        world.resource_mut::<TaskCompletion>().complete(Task::Mirror);

        let report = world.run_system_once(|store: DioramaStore| debug_report(&store));
        assert!(report.starts_with("scene: Opening\n"));
        assert!(report.contains("near: Radio\n"));
        assert!(report.contains("Mirror=true Hydrant=false"));
        assert!(report.contains("figurine: - placed=false dragging=false"));
    }

    #[test]
    fn overlay_follows_the_debug_flag() {
        let mut app = App::new();
        app.init_resource::<UiFlags>()
            .add_systems(Update, toggle_debug_overlay_node);

        app.update();
        let count = |app: &mut App| {
            app.world_mut()
                .query_filtered::<Entity, With<DebugOverlay>>()
                .iter(app.world())
                .count()
        };
        assert_eq!(count(&mut app), 0);

        app.world_mut().resource_mut::<UiFlags>().debug_visible = true;
        app.update();
        assert_eq!(count(&mut app), 1);

        app.world_mut().resource_mut::<UiFlags>().debug_visible = false;
        app.update();
        assert_eq!(count(&mut app), 0);
    }
}
