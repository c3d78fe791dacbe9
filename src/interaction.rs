//! Click routing: which target a click lands on in the mounted scene, and what that asks for.
//!
//! Routing is a pure function of the click and a snapshot of the store, so every rule is testable
//! without a window. The system half only gathers the snapshot and fans the result out as events.

use bevy::prelude::*;

use crate::audio::AudioCue;
use crate::config::{BreakpointLayout, DioramaConfig};
use crate::drag::OpeningFigurine;
use crate::hud::{Hud, HudTransform};
use crate::input::PointerClick;
use crate::minigames::MinigameAction;
use crate::proximity::ProximityFlags;
use crate::scene::{ObjectScene, Scene, SceneCommand, SceneKind, SceneMachine};
use crate::state::DioramaSet;
use crate::tasks::TaskCompletion;
use crate::viewport::{OpeningGeometry, Viewport};

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, route_clicks.in_set(DioramaSet::Interaction));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickAction {
    Scene(SceneCommand),
    Minigame(MinigameAction),
    Cue(AudioCue),
}

/// Everything a click needs to know about the world.
#[derive(Debug, Clone, Copy)]
pub struct ClickContext<'a> {
    pub machine: &'a SceneMachine,
    pub layout: &'a BreakpointLayout,
    pub geometry: &'a OpeningGeometry,
    pub viewport: &'a Viewport,
    pub hud: HudTransform,
    pub proximity: ProximityFlags,
    pub tasks: TaskCompletion,
    pub figurine_placed: bool,
}

/// Resolves a click at `position` (window pixels). `None` means the click hit nothing live.
pub fn resolve_click(position: Vec2, ctx: &ClickContext) -> Option<ClickAction> {
    if ctx.machine.is_busy() {
        return None;
    }

    let state = ctx.machine.state();
    let screen = ctx.viewport.to_percent(position);
    let controls = &ctx.layout.controls;

    match state.kind() {
        SceneKind::Intro => {
            let scene_px = ctx.hud.screen_px_to_scene_px(position, ctx.viewport);
            (ctx.figurine_placed && ctx.geometry.drop_zone.contains(scene_px))
                .then_some(ClickAction::Scene(SceneCommand::EnterMain))
        }
        SceneKind::Hub => {
            let scene_point = ctx.hud.screen_to_scene(screen);
            let spec = ctx.layout.landmarks.iter().find(|spec| {
                ctx.proximity.is_near(spec.landmark)
                    && scene_point.distance(spec.position) <= spec.hotspot_radius
            })?;

            Some(match ObjectScene::from_landmark(spec.landmark) {
                Some(object) => ClickAction::Scene(SceneCommand::EnterObject(object)),
                None => ClickAction::Cue(AudioCue::PhoneRing),
            })
        }
        SceneKind::Object => {
            if controls.back.contains(screen) {
                return Some(ClickAction::Scene(SceneCommand::Back));
            }

            match state.scene() {
                Scene::Mirror => controls
                    .mirror_surface
                    .contains(screen)
                    .then_some(ClickAction::Minigame(MinigameAction::MirrorTouched)),
                Scene::Computer => Some(ClickAction::Minigame(
                    match controls.photo_grid.photo_at(screen) {
                        Some(photo) => MinigameAction::OpenPhoto(photo),
                        None => MinigameAction::ClosePhoto,
                    },
                )),
                Scene::Radio => (ctx.tasks.all_core_tasks_complete()
                    && controls.end_control.contains(screen))
                .then_some(ClickAction::Scene(SceneCommand::TriggerEnding)),
                _ => None,
            }
        }
        SceneKind::Ending => None,
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn route_clicks(
    mut clicks: EventReader<PointerClick>,
    machine: Res<SceneMachine>,
    config: Res<DioramaConfig>,
    geometry: Res<OpeningGeometry>,
    viewport: Res<Viewport>,
    hud: Res<Hud>,
    proximity: Res<ProximityFlags>,
    tasks: Res<TaskCompletion>,
    opening: Res<OpeningFigurine>,
    mut scene_commands: EventWriter<SceneCommand>,
    mut minigame: EventWriter<MinigameAction>,
    mut cues: EventWriter<AudioCue>,
) {
    let ctx = ClickContext {
        machine: &machine,
        layout: config.layout(viewport.breakpoint),
        geometry: &geometry,
        viewport: &viewport,
        hud: hud.current(),
        proximity: *proximity,
        tasks: *tasks,
        figurine_placed: opening.is_placed(),
    };

    for click in clicks.read() {
        let Some(action) = resolve_click(click.position, &ctx) else {
            continue;
        };
        debug!("Click at {:?} -> {:?}", click.position, action);

        match action {
            ClickAction::Scene(command) => {
                if matches!(command, SceneCommand::Back | SceneCommand::EnterObject(_)) {
                    cues.send(AudioCue::ButtonClick);
                }
                scene_commands.send(command);
            }
            ClickAction::Minigame(action) => {
                minigame.send(action);
            }
            ClickAction::Cue(cue) => {
                cues.send(cue);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Ellipse;
    use crate::proximity::Landmark;
    use crate::scene::TransitionContext;
    use crate::tasks::Task;
    use crate::viewport::DropZone;

    struct Fixture {
        machine: SceneMachine,
        config: DioramaConfig,
        geometry: OpeningGeometry,
        viewport: Viewport,
        proximity: ProximityFlags,
        tasks: TaskCompletion,
        hud: HudTransform,
        placed: bool,
    }

    impl Fixture {
        fn new() -> Self {
            let config = DioramaConfig::default();
            Self {
                machine: SceneMachine::new(config.timings),
                geometry: OpeningGeometry {
                    drop_zone: DropZone {
                        ellipse: Ellipse::new(Vec2::new(500.0, 400.0), Vec2::new(60.0, 20.0)),
                        active: true,
                    },
                    ..default()
                },
                viewport: Viewport::new(Vec2::new(1000.0, 1000.0), config.mobile_max_width),
                config,
                proximity: ProximityFlags::default(),
                tasks: TaskCompletion::default(),
                hud: HudTransform::IDENTITY,
                placed: false,
            }
        }

        fn transition_ctx(&self) -> TransitionContext {
            TransitionContext {
                figurine_placed: true,
                proximity: self.proximity,
                tasks: self.tasks,
            }
        }

        /// Puts the machine in `scene` through real transitions.
        fn enter(&mut self, scene: ObjectScene) {
            self.proximity.set(scene.landmark(), true);
            let ctx = self.transition_ctx();
            self.machine.handle(SceneCommand::EnterMain, &ctx);
            self.machine
                .advance(self.config.timings.settled() + std::time::Duration::from_millis(1));
            self.machine.handle(SceneCommand::EnterObject(scene), &ctx);
        }

        fn click(&self, x: f32, y: f32) -> Option<ClickAction> {
            let ctx = ClickContext {
                machine: &self.machine,
                layout: self.config.layout(self.viewport.breakpoint),
                geometry: &self.geometry,
                viewport: &self.viewport,
                hud: self.hud,
                proximity: self.proximity,
                tasks: self.tasks,
                figurine_placed: self.placed,
            };
            resolve_click(Vec2::new(x, y), &ctx)
        }
    }

    #[test]
    fn drop_zone_click_needs_placed_figurine() {
        let mut fixture = Fixture::new();
        assert_eq!(fixture.click(500.0, 400.0), None);

        fixture.placed = true;
        assert_eq!(
            fixture.click(500.0, 400.0),
            Some(ClickAction::Scene(SceneCommand::EnterMain))
        );
        assert_eq!(fixture.click(100.0, 100.0), None);
    }

    #[test]
    fn drop_zone_click_lands_where_the_zoomed_zone_is_drawn() {
        let mut fixture = Fixture::new();
        fixture.placed = true;
        fixture.hud = HudTransform::new(2.0, 0.0, 0.0);

        // Zone center (50, 40)% is drawn at (50, 30)% under zoom 2.
        assert_eq!(
            fixture.click(500.0, 300.0),
            Some(ClickAction::Scene(SceneCommand::EnterMain))
        );
        assert_eq!(fixture.click(500.0, 400.0), None);
    }

    #[test]
    fn hotspots_are_inert_until_near() {
        let mut fixture = Fixture::new();
        fixture.enter(ObjectScene::Mirror);
        fixture.machine.handle(SceneCommand::Back, &fixture.transition_ctx());
        fixture.proximity = ProximityFlags::default();

        // Desktop mirror hotspot sits at (22, 55) percent.
        assert_eq!(fixture.click(220.0, 550.0), None);

        fixture.proximity.set(Landmark::Mirror, true);
        assert_eq!(
            fixture.click(220.0, 550.0),
            Some(ClickAction::Scene(SceneCommand::EnterObject(
                ObjectScene::Mirror
            )))
        );
    }

    #[test]
    fn phone_hotspot_only_rings() {
        let mut fixture = Fixture::new();
        fixture.enter(ObjectScene::Hydrant);
        fixture.machine.handle(SceneCommand::Back, &fixture.transition_ctx());
        fixture.proximity = ProximityFlags::default();
        fixture.proximity.set(Landmark::Phone, true);

        assert_eq!(
            fixture.click(500.0, 600.0),
            Some(ClickAction::Cue(AudioCue::PhoneRing))
        );
    }

    #[test]
    fn object_scenes_route_back_and_minigames() {
        let mut fixture = Fixture::new();
        fixture.enter(ObjectScene::Mirror);
        assert_eq!(
            fixture.click(60.0, 80.0),
            Some(ClickAction::Scene(SceneCommand::Back))
        );
        assert_eq!(
            fixture.click(500.0, 450.0),
            Some(ClickAction::Minigame(MinigameAction::MirrorTouched))
        );
        assert_eq!(fixture.click(950.0, 950.0), None);
    }

    #[test]
    fn computer_clicks_open_or_close_photos() {
        let mut fixture = Fixture::new();
        fixture.enter(ObjectScene::Computer);
        // Second row, second column of a 3-wide grid.
        assert_eq!(
            fixture.click(500.0, 600.0),
            Some(ClickAction::Minigame(MinigameAction::OpenPhoto(4)))
        );
        assert_eq!(
            fixture.click(900.0, 900.0),
            Some(ClickAction::Minigame(MinigameAction::ClosePhoto))
        );
    }

    #[test]
    fn end_control_is_gated_on_core_tasks() {
        let mut fixture = Fixture::new();
        fixture.enter(ObjectScene::Radio);
        assert_eq!(fixture.click(500.0, 800.0), None);

        for task in [Task::Mirror, Task::Hydrant, Task::Computer] {
            fixture.tasks.complete(task);
        }
        assert_eq!(
            fixture.click(500.0, 800.0),
            Some(ClickAction::Scene(SceneCommand::TriggerEnding))
        );
    }

    #[test]
    fn nothing_routes_while_busy() {
        let mut fixture = Fixture::new();
        fixture.placed = true;
        let ctx = fixture.transition_ctx();
        fixture.machine.handle(SceneCommand::EnterMain, &ctx);
        assert_eq!(fixture.click(500.0, 400.0), None);
    }
}
