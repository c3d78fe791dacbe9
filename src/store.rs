//! The shared cells every plugin reads, and the two that belong to nobody else.
//!
//! Each cell is a Bevy resource with exactly one writing plugin. `DioramaStore` bundles read-only
//! access to all of them so presentation systems (and tests) can ask questions like "is the figurine
//! near the mirror" without knowing which plugin owns the answer.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::drag::{FigurinePosition, MainDrag, OpeningFigurine};
use crate::hud::{Hud, HudTransform};
use crate::proximity::{Landmark, ProximityFlags};
use crate::scene::{Scene, SceneMachine};
use crate::state::{toggle_debug_overlay, DioramaSet};
use crate::tasks::{Task, TaskCompletion};
use crate::viewport::{Breakpoint, Viewport};

pub struct StorePlugin;

impl Plugin for StorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<UiFlags>()
            .init_resource::<CameraPermission>()
            .add_event::<UiCommand>()
            .add_event::<CameraPermissionChanged>()
            .add_systems(
                Update,
                (toggle_debug_overlay, apply_ui_commands, apply_camera_permission)
                    .chain()
                    .in_set(DioramaSet::Input),
            );
    }
}

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiFlags {
    pub debug_visible: bool,
    pub credits_visible: bool,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    ToggleDebug,
    ShowCredits,
    HideCredits,
}

/// Outcome of the host's camera prompt. Only recorded here; nothing in the core asks for it.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CameraPermission {
    #[default]
    NotRequested,
    Granted,
    Denied,
    Dismissed,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraPermissionChanged(pub CameraPermission);

fn apply_ui_commands(mut commands: EventReader<UiCommand>, mut flags: ResMut<UiFlags>) {
    for command in commands.read() {
        let mut next = *flags;
        match command {
            UiCommand::ToggleDebug => next.debug_visible = !next.debug_visible,
            UiCommand::ShowCredits => next.credits_visible = true,
            UiCommand::HideCredits => next.credits_visible = false,
        }
        debug!("{:?} -> {:?}", command, next);
        flags.set_if_neq(next);
    }
}

fn apply_camera_permission(
    mut changes: EventReader<CameraPermissionChanged>,
    mut permission: ResMut<CameraPermission>,
) {
    if let Some(CameraPermissionChanged(next)) = changes.read().last() {
        info!("Camera permission: {:?}", next);
        permission.set_if_neq(*next);
    }
}

/// Read-only view over every store cell.
#[derive(SystemParam)]
pub struct DioramaStore<'w> {
    machine: Res<'w, SceneMachine>,
    viewport: Res<'w, Viewport>,
    tasks: Res<'w, TaskCompletion>,
    proximity: Res<'w, ProximityFlags>,
    figurine: Res<'w, FigurinePosition>,
    opening: Res<'w, OpeningFigurine>,
    main_drag: Res<'w, MainDrag>,
    hud: Res<'w, Hud>,
    ui: Res<'w, UiFlags>,
    camera: Res<'w, CameraPermission>,
}

impl DioramaStore<'_> {
    pub fn scene(&self) -> Scene {
        self.machine.current()
    }

    pub fn is_end_scene(&self) -> bool {
        self.machine.is_ending()
    }

    pub fn is_transitioning(&self) -> bool {
        self.machine.is_transitioning()
    }

    pub fn pending_scene_steps(&self) -> usize {
        self.machine.pending_steps()
    }

    pub fn breakpoint(&self) -> Breakpoint {
        self.viewport.breakpoint
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport.size
    }

    pub fn is_complete(&self, task: Task) -> bool {
        self.tasks.is_complete(task)
    }

    pub fn all_core_tasks_complete(&self) -> bool {
        self.tasks.all_core_tasks_complete()
    }

    pub fn is_near(&self, landmark: Landmark) -> bool {
        self.proximity.is_near(landmark)
    }

    pub fn proximity(&self) -> ProximityFlags {
        *self.proximity
    }

    pub fn figurine_position(&self) -> Option<Vec2> {
        self.figurine.get()
    }

    pub fn figurine_placed(&self) -> bool {
        self.opening.is_placed()
    }

    pub fn figurine_dragging(&self) -> bool {
        self.opening.is_dragging() || self.main_drag.is_dragging()
    }

    pub fn hud(&self) -> HudTransform {
        self.hud.current()
    }

    pub fn ui(&self) -> UiFlags {
        *self.ui
    }

    pub fn camera_permission(&self) -> CameraPermission {
        *self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    fn app() -> App {
        let mut app = App::new();
        app.init_resource::<UiFlags>()
            .init_resource::<CameraPermission>()
            .add_event::<UiCommand>()
            .add_event::<CameraPermissionChanged>()
            .add_systems(Update, (apply_ui_commands, apply_camera_permission));
        app
    }

    #[test]
    fn debug_toggle_flips_each_time() {
        let mut app = app();
        app.world_mut().send_event(UiCommand::ToggleDebug);
        app.update();
        assert!(app.world().resource::<UiFlags>().debug_visible);

        app.world_mut().send_event(UiCommand::ToggleDebug);
        app.update();
        assert!(!app.world().resource::<UiFlags>().debug_visible);
    }

    #[test]
    fn credits_commands_are_idempotent() {
        let mut app = app();
        app.world_mut().send_event(UiCommand::ShowCredits);
        app.world_mut().send_event(UiCommand::ShowCredits);
        app.update();
        assert!(app.world().resource::<UiFlags>().credits_visible);
        app.world_mut().send_event(UiCommand::HideCredits);
        app.update();
        assert!(!app.world().resource::<UiFlags>().credits_visible);
    }

    #[test]
    fn camera_permission_keeps_latest_answer() {
        let mut app = app();
        app.world_mut()
            .send_event(CameraPermissionChanged(CameraPermission::Denied));
        app.world_mut()
            .send_event(CameraPermissionChanged(CameraPermission::Granted));
        app.update();
        assert_eq!(
            *app.world().resource::<CameraPermission>(),
            CameraPermission::Granted
        );
    }

    #[test]
    fn selectors_read_initial_cells() {
        let mut world = World::new();
        world.insert_resource(crate::config::DioramaConfig::default());
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

        world.run_system_once(|store: DioramaStore| {
            assert_eq!(store.scene(), Scene::Opening);
            assert!(!store.is_end_scene());
            assert!(!store.all_core_tasks_complete());
            assert!(!store.is_near(Landmark::Radio));
            assert_eq!(store.figurine_position(), None);
            assert!(!store.figurine_placed());
            assert!(!store.figurine_dragging());
            assert_eq!(store.pending_scene_steps(), 0);
            assert_eq!(store.camera_permission(), CameraPermission::NotRequested);
        });
    }
}
