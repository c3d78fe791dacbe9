//! Scene graph and transition choreography.
//!
//! `SceneMachine` is the only writer of the current scene. Everything else asks for a transition
//! with a `SceneCommand` and hears about the outcome through `SceneEvent`. Requests that are not
//! valid from the current state (wrong scene, landmark not near, tasks incomplete, a choreography
//! still running) are dropped without side effects.
//!
//! ```text
//! Opening ──(placed + drop zone click)──▶ Main ⇄ {Hydrant, Mirror, Computer, Radio}
//!                                          │
//!                        (all core tasks) ─┴─▶ EndGame
//! ```

use std::time::Duration;

use bevy::app::AppExit;
use bevy::prelude::*;

use crate::audio::AudioCue;
use crate::choreography::{Scheduler, TaskHandle};
use crate::config::{ChoreographyTimings, DioramaConfig};
use crate::drag::OpeningFigurine;
use crate::proximity::{Landmark, ProximityFlags};
use crate::state::DioramaSet;
use crate::tasks::TaskCompletion;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneMachine>()
            .init_resource::<SceneVisibility>()
            .add_event::<SceneCommand>()
            .add_event::<SceneEvent>()
            .add_systems(
                Update,
                (run_scene_machine, ease_scene_visibility)
                    .chain()
                    .in_set(DioramaSet::Scene),
            )
            .add_systems(Last, teardown_on_exit);
    }
}

/// Which scene subtree is mounted. The ending reuses the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SceneId {
    Opening,
    Main,
    Hydrant,
    Mirror,
    Computer,
    Radio,
}

/// Scenes reachable from the hub by walking up to a landmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectScene {
    Hydrant,
    Mirror,
    Computer,
    Radio,
}

impl ObjectScene {
    pub fn landmark(self) -> Landmark {
        match self {
            ObjectScene::Hydrant => Landmark::Hydrant,
            ObjectScene::Mirror => Landmark::Mirror,
            ObjectScene::Computer => Landmark::Computer,
            ObjectScene::Radio => Landmark::Radio,
        }
    }

    pub fn from_landmark(landmark: Landmark) -> Option<Self> {
        match landmark {
            Landmark::Hydrant => Some(ObjectScene::Hydrant),
            Landmark::Mirror => Some(ObjectScene::Mirror),
            Landmark::Computer => Some(ObjectScene::Computer),
            Landmark::Radio => Some(ObjectScene::Radio),
            Landmark::Phone => None,
        }
    }

    pub fn id(self) -> SceneId {
        match self {
            ObjectScene::Hydrant => SceneId::Hydrant,
            ObjectScene::Mirror => SceneId::Mirror,
            ObjectScene::Computer => SceneId::Computer,
            ObjectScene::Radio => SceneId::Radio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKind {
    Intro,
    Hub,
    Object,
    Ending,
}

/// Current scene as one value: the ending is a kind, not a separate flag that could drift from the
/// scene id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneState {
    kind: SceneKind,
    id: SceneId,
}

impl SceneState {
    pub const OPENING: Self = Self {
        kind: SceneKind::Intro,
        id: SceneId::Opening,
    };
    pub const MAIN: Self = Self {
        kind: SceneKind::Hub,
        id: SceneId::Main,
    };
    pub const ENDING: Self = Self {
        kind: SceneKind::Ending,
        id: SceneId::Main,
    };

    pub fn object(scene: ObjectScene) -> Self {
        Self {
            kind: SceneKind::Object,
            id: scene.id(),
        }
    }

    pub fn kind(&self) -> SceneKind {
        self.kind
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn is_ending(&self) -> bool {
        self.kind == SceneKind::Ending
    }

    pub fn scene(&self) -> Scene {
        match (self.kind, self.id) {
            (SceneKind::Ending, _) => Scene::EndGame,
            (_, SceneId::Opening) => Scene::Opening,
            (_, SceneId::Main) => Scene::Main,
            (_, SceneId::Hydrant) => Scene::Hydrant,
            (_, SceneId::Mirror) => Scene::Mirror,
            (_, SceneId::Computer) => Scene::Computer,
            (_, SceneId::Radio) => Scene::Radio,
        }
    }
}

/// Flat view of the scene graph, as observed by presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scene {
    Opening,
    Main,
    Hydrant,
    Mirror,
    Computer,
    Radio,
    EndGame,
}

impl Scene {
    pub fn id(self) -> SceneId {
        match self {
            Scene::Opening => SceneId::Opening,
            Scene::Main | Scene::EndGame => SceneId::Main,
            Scene::Hydrant => SceneId::Hydrant,
            Scene::Mirror => SceneId::Mirror,
            Scene::Computer => SceneId::Computer,
            Scene::Radio => SceneId::Radio,
        }
    }

    pub fn is_object(self) -> bool {
        matches!(
            self,
            Scene::Hydrant | Scene::Mirror | Scene::Computer | Scene::Radio
        )
    }
}

/// Transition requests.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    /// Drop-zone click in the opening scene.
    EnterMain,
    /// Hotspot click in the hub.
    EnterObject(ObjectScene),
    /// Back control of an object scene.
    Back,
    /// The gated radio control.
    TriggerEnding,
}

/// Outbound signals. Presentation reacts to these; none of them feed back into the machine.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum SceneEvent {
    Changed { from: Scene, to: Scene },
    TransitionStarted,
    HudToNeutral,
    FadeMainIn,
    FadeOpeningOut,
    OpeningUnmounted,
    TransitionSettled,
    BackgroundAudio(bool),
    Cue(AudioCue),
}

/// Facts the machine needs from other slices to validate a command. Read, never written.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransitionContext {
    pub figurine_placed: bool,
    pub proximity: ProximityFlags,
    pub tasks: TaskCompletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    CommitMain,
    MainVisible,
    UnmountOpening,
    Settle,
    CommitEnding,
}

#[derive(Resource, Debug)]
pub struct SceneMachine {
    state: SceneState,
    transitioning: bool,
    timings: ChoreographyTimings,
    scheduler: Scheduler<Step>,
    /// Handles of every step this machine still expects to fire.
    pending: Vec<TaskHandle>,
}

impl FromWorld for SceneMachine {
    fn from_world(world: &mut World) -> Self {
        let timings = world
            .get_resource::<DioramaConfig>()
            .map(|config| config.timings)
            .unwrap_or_default();
        Self::new(timings)
    }
}

impl SceneMachine {
    pub fn new(timings: ChoreographyTimings) -> Self {
        Self {
            state: SceneState::OPENING,
            transitioning: false,
            timings,
            scheduler: Scheduler::default(),
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn current(&self) -> Scene {
        self.state.scene()
    }

    pub fn is_ending(&self) -> bool {
        self.state.is_ending()
    }

    /// True for the whole opening choreography, from the drop-zone click until Main has settled.
    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// A choreography or delayed commit is still outstanding; new commands are ignored.
    pub fn is_busy(&self) -> bool {
        self.transitioning || !self.pending.is_empty()
    }

    /// Validates and starts a transition. Invalid requests return no events and change nothing.
    pub fn handle(&mut self, command: SceneCommand, ctx: &TransitionContext) -> Vec<SceneEvent> {
        if self.is_busy() {
            debug!("Ignoring {:?}: transition in progress", command);
            return Vec::new();
        }

        match (command, self.state.kind()) {
            (SceneCommand::EnterMain, SceneKind::Intro) if ctx.figurine_placed => {
                self.begin_opening_choreography()
            }
            (SceneCommand::EnterObject(scene), SceneKind::Hub)
                if ctx.proximity.is_near(scene.landmark()) =>
            {
                self.commit(SceneState::object(scene))
            }
            (SceneCommand::Back, SceneKind::Object) => self.commit(SceneState::MAIN),
            (SceneCommand::TriggerEnding, SceneKind::Hub | SceneKind::Object)
                if self.ending_reachable() && ctx.tasks.all_core_tasks_complete() =>
            {
                self.begin_ending()
            }
            _ => {
                debug!("Ignoring {:?} in {:?}", command, self.current());
                Vec::new()
            }
        }
    }

    /// Advances the choreography clock and applies every step that came due.
    pub fn advance(&mut self, delta: Duration) -> Vec<SceneEvent> {
        let fired = self.scheduler.advance(delta);
        let scheduler = &self.scheduler;
        self.pending.retain(|handle| scheduler.is_pending(*handle));

        let mut events = Vec::new();
        for (_, step) in fired {
            self.apply_step(step, &mut events);
        }
        events
    }

    /// Choreography steps still waiting to fire.
    pub fn pending_steps(&self) -> usize {
        self.scheduler.len()
    }

    /// Cancels every outstanding step. Returns how many were dropped.
    pub fn teardown(&mut self) -> usize {
        let cancelled = self
            .pending
            .drain(..)
            .filter(|handle| self.scheduler.cancel(*handle))
            .count();
        self.transitioning = false;
        cancelled
    }

    fn ending_reachable(&self) -> bool {
        matches!(self.current(), Scene::Main | Scene::Radio)
    }

    fn schedule(&mut self, delay: Duration, step: Step) {
        let handle = self.scheduler.schedule(delay, step);
        self.pending.push(handle);
    }

    fn commit(&mut self, next: SceneState) -> Vec<SceneEvent> {
        let from = self.current();
        self.state = next;
        info!("Scene {:?} -> {:?}", from, self.current());
        vec![SceneEvent::Changed {
            from,
            to: self.current(),
        }]
    }

    fn begin_opening_choreography(&mut self) -> Vec<SceneEvent> {
        self.transitioning = true;
        let timings = self.timings;
        self.schedule(timings.hud_transition(), Step::CommitMain);
        self.schedule(timings.main_visible(), Step::MainVisible);
        self.schedule(timings.opening_unmount(), Step::UnmountOpening);
        self.schedule(timings.settled(), Step::Settle);

        info!("Opening choreography started");
        vec![
            SceneEvent::TransitionStarted,
            SceneEvent::Cue(AudioCue::TransitionClick),
            SceneEvent::HudToNeutral,
        ]
    }

    fn begin_ending(&mut self) -> Vec<SceneEvent> {
        self.schedule(self.timings.ending_click(), Step::CommitEnding);
        info!("Ending requested");
        vec![
            SceneEvent::BackgroundAudio(false),
            SceneEvent::Cue(AudioCue::TransitionClick),
        ]
    }

    /// Steps re-check the state they expect so a step that outlived its context does nothing.
    fn apply_step(&mut self, step: Step, events: &mut Vec<SceneEvent>) {
        match step {
            Step::CommitMain if self.state == SceneState::OPENING => {
                events.extend(self.commit(SceneState::MAIN));
                events.push(SceneEvent::FadeMainIn);
            }
            Step::MainVisible if self.transitioning => events.push(SceneEvent::FadeOpeningOut),
            Step::UnmountOpening if self.transitioning => {
                events.push(SceneEvent::OpeningUnmounted)
            }
            Step::Settle if self.transitioning => {
                self.transitioning = false;
                info!("Opening choreography settled");
                events.push(SceneEvent::TransitionSettled);
            }
            Step::CommitEnding if self.ending_reachable() => {
                events.extend(self.commit(SceneState::ENDING));
            }
            stale => debug!("Dropping stale choreography step {:?}", stale),
        }
    }
}

/// Opacity of the two scenes that overlap during the opening choreography.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SceneVisibility {
    pub opening_opacity: f32,
    pub main_opacity: f32,
    pub opening_mounted: bool,
    opening_target: f32,
    main_target: f32,
}

impl Default for SceneVisibility {
    fn default() -> Self {
        Self {
            opening_opacity: 1.0,
            main_opacity: 0.0,
            opening_mounted: true,
            opening_target: 1.0,
            main_target: 0.0,
        }
    }
}

impl SceneVisibility {
    pub fn apply(&mut self, event: &SceneEvent) {
        match event {
            SceneEvent::FadeMainIn => self.main_target = 1.0,
            SceneEvent::FadeOpeningOut => self.opening_target = 0.0,
            SceneEvent::OpeningUnmounted => {
                self.opening_mounted = false;
                self.opening_target = 0.0;
                self.opening_opacity = 0.0;
            }
            _ => {}
        }
    }

    /// Moves each opacity towards its target. Main fades over `main_fade_in_ms`, Opening over
    /// `opening_fade_out_ms`, so Opening is already transparent when it unmounts.
    pub fn ease(&mut self, delta: Duration, timings: &ChoreographyTimings) {
        let seconds = delta.as_secs_f32();
        let step = |fade_ms: u64| seconds * 1000.0 / fade_ms.max(1) as f32;

        self.opening_opacity = approach(
            self.opening_opacity,
            self.opening_target,
            step(timings.opening_fade_out_ms),
        );
        self.main_opacity = approach(
            self.main_opacity,
            self.main_target,
            step(timings.main_fade_in_ms),
        );
    }
}

fn approach(value: f32, target: f32, step: f32) -> f32 {
    if value < target {
        (value + step).min(target)
    } else {
        (value - step).max(target)
    }
}

fn run_scene_machine(
    mut commands: EventReader<SceneCommand>,
    time: Res<Time>,
    tasks: Res<TaskCompletion>,
    proximity: Res<ProximityFlags>,
    opening: Res<OpeningFigurine>,
    mut machine: ResMut<SceneMachine>,
    mut events: EventWriter<SceneEvent>,
) {
    let ctx = TransitionContext {
        figurine_placed: opening.is_placed(),
        proximity: *proximity,
        tasks: *tasks,
    };

    // Advance first: steps scheduled by this frame's commands start counting next frame.
    if !machine.scheduler.is_empty() {
        let fired = machine.advance(time.delta());
        events.send_batch(fired);
    }

    for command in commands.read() {
        events.send_batch(machine.handle(*command, &ctx));
    }
}

fn ease_scene_visibility(
    mut events: EventReader<SceneEvent>,
    time: Res<Time>,
    config: Res<DioramaConfig>,
    mut visibility: ResMut<SceneVisibility>,
) {
    for event in events.read() {
        visibility.apply(event);
    }

    visibility.ease(time.delta(), &config.timings);
}

fn teardown_on_exit(mut exit: EventReader<AppExit>, mut machine: ResMut<SceneMachine>) {
    if exit.read().next().is_some() {
        let cancelled = machine.teardown();
        if cancelled > 0 {
            debug!("Cancelled {cancelled} pending scene steps on exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn machine() -> SceneMachine {
        SceneMachine::new(ChoreographyTimings::default())
    }

    fn placed() -> TransitionContext {
        TransitionContext {
            figurine_placed: true,
            ..default()
        }
    }

    fn near(landmark: Landmark) -> TransitionContext {
        let mut ctx = placed();
        ctx.proximity.set(landmark, true);
        ctx
    }

    fn all_tasks() -> TransitionContext {
        let mut ctx = placed();
        ctx.tasks.complete(crate::tasks::Task::Mirror);
        ctx.tasks.complete(crate::tasks::Task::Hydrant);
        ctx.tasks.complete(crate::tasks::Task::Computer);
        ctx
    }

    fn in_main() -> SceneMachine {
        let mut machine = machine();
        machine.handle(SceneCommand::EnterMain, &placed());
        machine.advance(ms(10_000));
        assert_eq!(machine.current(), Scene::Main);
        machine
    }

    #[test]
    fn opening_requires_placed_figurine() {
        let mut machine = machine();
        let events = machine.handle(SceneCommand::EnterMain, &TransitionContext::default());
        assert!(events.is_empty());
        assert!(!machine.is_transitioning());
        assert_eq!(machine.current(), Scene::Opening);
    }

    #[test]
    fn opening_choreography_runs_in_order() {
        let mut machine = machine();
        let started = machine.handle(SceneCommand::EnterMain, &placed());
        assert_eq!(started[0], SceneEvent::TransitionStarted);
        assert!(started.contains(&SceneEvent::HudToNeutral));
        assert!(machine.is_transitioning());
        assert_eq!(machine.current(), Scene::Opening);

        assert!(machine.advance(ms(1999)).is_empty());
        assert_eq!(
            machine.advance(ms(1)),
            vec![
                SceneEvent::Changed {
                    from: Scene::Opening,
                    to: Scene::Main
                },
                SceneEvent::FadeMainIn,
            ]
        );
        assert!(machine.is_transitioning());

        assert_eq!(machine.advance(ms(1000)), vec![SceneEvent::FadeOpeningOut]);
        assert_eq!(machine.advance(ms(600)), vec![SceneEvent::OpeningUnmounted]);
        assert!(machine.advance(ms(2399)).is_empty());
        assert!(machine.is_transitioning());
        assert_eq!(machine.advance(ms(1)), vec![SceneEvent::TransitionSettled]);
        assert!(!machine.is_transitioning());
        assert!(!machine.is_busy());
    }

    #[test]
    fn one_long_frame_still_orders_steps() {
        let mut machine = machine();
        machine.handle(SceneCommand::EnterMain, &placed());
        let events = machine.advance(ms(60_000));
        assert_eq!(
            events,
            vec![
                SceneEvent::Changed {
                    from: Scene::Opening,
                    to: Scene::Main
                },
                SceneEvent::FadeMainIn,
                SceneEvent::FadeOpeningOut,
                SceneEvent::OpeningUnmounted,
                SceneEvent::TransitionSettled,
            ]
        );
    }

    #[test]
    fn retrigger_during_choreography_is_ignored() {
        let mut machine = machine();
        machine.handle(SceneCommand::EnterMain, &placed());
        machine.advance(ms(500));
        assert!(machine.handle(SceneCommand::EnterMain, &placed()).is_empty());
        assert_eq!(machine.scheduler.len(), 4);
    }

    #[test]
    fn teardown_cancels_pending_steps() {
        let mut machine = machine();
        machine.handle(SceneCommand::EnterMain, &placed());
        machine.advance(ms(2500));

        assert_eq!(machine.teardown(), 3);
        assert!(!machine.is_busy());
        assert!(machine.advance(ms(10_000)).is_empty());
        assert_eq!(machine.current(), Scene::Main);
    }

    #[test]
    fn object_scene_requires_proximity() {
        let mut machine = in_main();
        let far = machine.handle(
            SceneCommand::EnterObject(ObjectScene::Mirror),
            &TransitionContext::default(),
        );
        assert!(far.is_empty());
        assert_eq!(machine.current(), Scene::Main);

        let near_hydrant = near(Landmark::Hydrant);
        assert!(machine
            .handle(SceneCommand::EnterObject(ObjectScene::Mirror), &near_hydrant)
            .is_empty());

        let events = machine.handle(
            SceneCommand::EnterObject(ObjectScene::Mirror),
            &near(Landmark::Mirror),
        );
        assert_eq!(
            events,
            vec![SceneEvent::Changed {
                from: Scene::Main,
                to: Scene::Mirror
            }]
        );
        assert_eq!(machine.state().kind(), SceneKind::Object);
    }

    #[test]
    fn back_returns_to_hub_only_from_object_scenes() {
        let mut machine = machine();
        assert!(machine.handle(SceneCommand::Back, &placed()).is_empty());

        let mut machine = in_main();
        assert!(machine.handle(SceneCommand::Back, &placed()).is_empty());

        machine.handle(
            SceneCommand::EnterObject(ObjectScene::Computer),
            &near(Landmark::Computer),
        );
        machine.handle(SceneCommand::Back, &placed());
        assert_eq!(machine.current(), Scene::Main);
    }

    #[test]
    fn ending_is_gated_on_all_core_tasks() {
        let mut machine = in_main();
        let mut ctx = placed();
        ctx.tasks.complete(crate::tasks::Task::Mirror);
        ctx.tasks.complete(crate::tasks::Task::Hydrant);

        let events = machine.handle(SceneCommand::TriggerEnding, &ctx);
        assert!(events.is_empty());
        assert!(!events.contains(&SceneEvent::BackgroundAudio(false)));
        assert!(machine.advance(ms(1000)).is_empty());
        assert_eq!(machine.current(), Scene::Main);
        assert!(!machine.is_ending());
    }

    #[test]
    fn ending_commits_after_click_delay() {
        let mut machine = in_main();
        machine.handle(
            SceneCommand::EnterObject(ObjectScene::Radio),
            &near(Landmark::Radio),
        );

        let events = machine.handle(SceneCommand::TriggerEnding, &all_tasks());
        assert_eq!(events[0], SceneEvent::BackgroundAudio(false));
        assert!(!machine.is_ending());

        // Busy: the back control cannot race the pending commit.
        assert!(machine.handle(SceneCommand::Back, &placed()).is_empty());

        assert!(machine.advance(ms(399)).is_empty());
        assert_eq!(
            machine.advance(ms(1)),
            vec![SceneEvent::Changed {
                from: Scene::Radio,
                to: Scene::EndGame
            }]
        );
        assert!(machine.is_ending());
        assert_eq!(machine.state().id(), SceneId::Main);

        // Terminal.
        assert!(machine
            .handle(
                SceneCommand::EnterObject(ObjectScene::Mirror),
                &near(Landmark::Mirror)
            )
            .is_empty());
        assert!(machine
            .handle(SceneCommand::TriggerEnding, &all_tasks())
            .is_empty());
    }

    #[test]
    fn ending_not_reachable_from_other_object_scenes() {
        let mut machine = in_main();
        machine.handle(
            SceneCommand::EnterObject(ObjectScene::Hydrant),
            &near(Landmark::Hydrant),
        );
        assert!(machine
            .handle(SceneCommand::TriggerEnding, &all_tasks())
            .is_empty());
    }

    #[test]
    fn visibility_follows_choreography() {
        let mut visibility = SceneVisibility::default();
        visibility.apply(&SceneEvent::FadeMainIn);
        let timings = ChoreographyTimings::default();
        visibility.ease(ms(500), &timings);
        assert_eq!(visibility.main_opacity, 0.5);
        visibility.ease(ms(5000), &timings);
        assert_eq!(visibility.main_opacity, 1.0);
        assert_eq!(visibility.opening_opacity, 1.0);

        visibility.apply(&SceneEvent::FadeOpeningOut);
        visibility.ease(ms(300), &timings);
        assert!((visibility.opening_opacity - 0.5).abs() < 1e-4);
        visibility.apply(&SceneEvent::OpeningUnmounted);
        assert!(!visibility.opening_mounted);
        assert_eq!(visibility.opening_opacity, 0.0);
    }

    #[test]
    fn opening_is_transparent_by_the_time_it_unmounts() {
        let timings = ChoreographyTimings::default();
        let mut machine = machine();
        let mut visibility = SceneVisibility::default();
        for event in machine.handle(SceneCommand::EnterMain, &placed()) {
            visibility.apply(&event);
        }

        let frame = ms(16);
        let mut before_unmount = None;
        for _ in 0..(timings.settled().as_millis() / 16 + 2) {
            let fired = machine.advance(frame);
            if fired.contains(&SceneEvent::OpeningUnmounted) {
                before_unmount = Some(visibility.opening_opacity);
            }
            for event in &fired {
                visibility.apply(event);
            }
            visibility.ease(frame, &timings);
        }

        let opacity = before_unmount.expect("opening never unmounted");
        assert!(opacity < 0.05, "opening still at {opacity} when unmounted");
        assert_eq!(visibility.main_opacity, 1.0);
    }

    #[test]
    fn a_long_frame_does_not_eat_a_fresh_delay() {
        let mut app = App::new();
        let mut time = Time::<()>::default();
        time.advance_by(ms(1000));
        let ctx = all_tasks();

        app.add_event::<SceneCommand>()
            .add_event::<SceneEvent>()
            .insert_resource(time)
            .insert_resource(ctx.tasks)
            .init_resource::<ProximityFlags>()
            .init_resource::<OpeningFigurine>()
            .insert_resource(in_main())
            .add_systems(Update, run_scene_machine);

        app.world_mut().send_event(SceneCommand::TriggerEnding);
        app.update();
        assert_eq!(app.world().resource::<SceneMachine>().current(), Scene::Main);
        assert!(app.world().resource::<SceneMachine>().is_busy());

        app.update();
        assert_eq!(
            app.world().resource::<SceneMachine>().current(),
            Scene::EndGame
        );
    }
}
