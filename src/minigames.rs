//! Object-scene minigames. Each one watches for its own success condition and asks the task
//! tracker to latch it; none of them touch `TaskCompletion` directly.

use bevy::prelude::*;

use crate::config::DioramaConfig;
use crate::input::{PointerId, PointerInput, PointerPhase};
use crate::interaction::route_clicks;
use crate::scene::{Scene, SceneEvent, SceneMachine};
use crate::state::DioramaSet;
use crate::tasks::{CompleteTask, Task, TaskCompletion};
use crate::viewport::Viewport;

pub struct MinigamesPlugin;

impl Plugin for MinigamesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HydrantValve>()
            .init_resource::<ComputerDesk>()
            .add_event::<MinigameAction>()
            .add_systems(
                Update,
                (reset_on_scene_exit, apply_minigame_actions, turn_hydrant_valve)
                    .chain()
                    .after(route_clicks)
                    .in_set(DioramaSet::Interaction),
            );
    }
}

/// Click-driven minigame input, produced by click routing.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinigameAction {
    MirrorTouched,
    OpenPhoto(usize),
    ClosePhoto,
}

/// Shortest signed rotation from `from` to `to`, both in degrees. Always in `(-180, 180]`.
pub fn wrapped_delta(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Bearing of `point` around `center` in degrees, screen space (y down, so clockwise is positive).
pub fn bearing(center: Vec2, point: Vec2) -> f32 {
    let offset = point - center;
    offset.y.atan2(offset.x).to_degrees()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ValveGrip {
    pointer: PointerId,
    bearing: f32,
}

/// Accumulated valve rotation. Turning is measured in wrapped per-move deltas so a full circle
/// adds 360 degrees instead of jumping back to zero.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct HydrantValve {
    degrees: f32,
    grip: Option<ValveGrip>,
}

impl HydrantValve {
    pub fn degrees(&self) -> f32 {
        self.degrees
    }

    pub fn grab(&mut self, pointer: PointerId, bearing: f32) -> bool {
        if self.grip.is_some() {
            return false;
        }
        self.grip = Some(ValveGrip { pointer, bearing });
        true
    }

    /// Turns to `bearing`. Returns `true` when the rotation sits at either limit afterwards.
    pub fn turn(&mut self, pointer: PointerId, bearing: f32, limit: f32) -> bool {
        let Some(grip) = self.grip.as_mut().filter(|grip| grip.pointer == pointer) else {
            return false;
        };

        let delta = wrapped_delta(grip.bearing, bearing);
        grip.bearing = bearing;
        self.degrees = (self.degrees + delta).clamp(-limit, limit);
        self.degrees.abs() >= limit
    }

    pub fn release(&mut self, pointer: PointerId) {
        if self.grip.is_some_and(|grip| grip.pointer == pointer) {
            self.grip = None;
        }
    }
}

/// Which photo the computer has open, if any.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputerDesk {
    pub open_photo: Option<usize>,
}

fn reset_on_scene_exit(
    mut events: EventReader<SceneEvent>,
    mut valve: ResMut<HydrantValve>,
    mut desk: ResMut<ComputerDesk>,
) {
    for event in events.read() {
        match event {
            SceneEvent::Changed {
                from: Scene::Hydrant,
                ..
            } => valve.grip = None,
            SceneEvent::Changed {
                from: Scene::Computer,
                ..
            } => desk.open_photo = None,
            _ => {}
        }
    }
}

fn apply_minigame_actions(
    mut actions: EventReader<MinigameAction>,
    config: Res<DioramaConfig>,
    mut desk: ResMut<ComputerDesk>,
    mut complete: EventWriter<CompleteTask>,
) {
    for action in actions.read() {
        match *action {
            MinigameAction::MirrorTouched => {
                complete.send(CompleteTask(Task::Mirror));
            }
            MinigameAction::OpenPhoto(photo) => {
                desk.open_photo = Some(photo);
                if photo == config.minigames.computer_target_photo {
                    complete.send(CompleteTask(Task::Computer));
                }
            }
            MinigameAction::ClosePhoto => desk.open_photo = None,
        }
    }
}

fn turn_hydrant_valve(
    mut pointer_events: EventReader<PointerInput>,
    machine: Res<SceneMachine>,
    config: Res<DioramaConfig>,
    viewport: Res<Viewport>,
    tasks: Res<TaskCompletion>,
    mut valve: ResMut<HydrantValve>,
    mut complete: EventWriter<CompleteTask>,
) {
    let active = machine.current() == Scene::Hydrant && !machine.is_busy();
    let ellipse = config.layout(viewport.breakpoint).controls.hydrant_valve;
    let center = viewport.to_pixels(ellipse.center);
    let limit = config.minigames.hydrant_limit_degrees;

    for input in pointer_events.read() {
        if !active {
            continue;
        }

        match input.phase {
            PointerPhase::Down => {
                if ellipse.contains(viewport.to_percent(input.position)) {
                    valve.grab(input.pointer, bearing(center, input.position));
                }
            }
            PointerPhase::Move => {
                let at_limit = valve.turn(input.pointer, bearing(center, input.position), limit);
                if at_limit && !tasks.is_complete(Task::Hydrant) {
                    info!("Hydrant valve reached {:.0} degrees", valve.degrees());
                    complete.send(CompleteTask(Task::Hydrant));
                }
            }
            PointerPhase::Up | PointerPhase::Cancel => valve.release(input.pointer),
        }
    }
}
