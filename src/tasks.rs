//! Task completion latches.
//!
//! Each minigame reports success with `CompleteTask`; this plugin is the only writer of
//! `TaskCompletion` and announces each latch exactly once through `TaskCompleted`. Flags never reset
//! during a session.

use bevy::prelude::*;

use crate::audio::AudioCue;
use crate::scene::{Scene, SceneEvent};
use crate::state::DioramaSet;

pub struct TasksPlugin;

impl Plugin for TasksPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TaskCompletion>()
            .add_event::<CompleteTask>()
            .add_event::<TaskCompleted>()
            .add_systems(Update, latch_tasks.in_set(DioramaSet::Tasks));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Mirror,
    Hydrant,
    Computer,
    /// Latched when the ending commits.
    Radio,
}

/// Request from a minigame to latch its task.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompleteTask(pub Task);

/// Emitted the first time a task latches.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCompleted(pub Task);

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCompletion {
    mirror: bool,
    hydrant: bool,
    computer: bool,
    radio: bool,
}

impl TaskCompletion {
    /// Latches `task`. Returns `true` only when it was not complete before.
    pub fn complete(&mut self, task: Task) -> bool {
        let flag = match task {
            Task::Mirror => &mut self.mirror,
            Task::Hydrant => &mut self.hydrant,
            Task::Computer => &mut self.computer,
            Task::Radio => &mut self.radio,
        };
        let newly = !*flag;
        *flag = true;
        newly
    }

    pub fn is_complete(&self, task: Task) -> bool {
        match task {
            Task::Mirror => self.mirror,
            Task::Hydrant => self.hydrant,
            Task::Computer => self.computer,
            Task::Radio => self.radio,
        }
    }

    pub fn all_core_tasks_complete(&self) -> bool {
        self.mirror && self.hydrant && self.computer
    }

    pub fn completed_count(&self) -> usize {
        [self.mirror, self.hydrant, self.computer, self.radio]
            .into_iter()
            .filter(|done| *done)
            .count()
    }
}

fn latch_tasks(
    mut requests: EventReader<CompleteTask>,
    mut scene_events: EventReader<SceneEvent>,
    mut tasks: ResMut<TaskCompletion>,
    mut completed: EventWriter<TaskCompleted>,
    mut cues: EventWriter<AudioCue>,
) {
    let ending = scene_events.read().any(|event| {
        matches!(
            event,
            SceneEvent::Changed {
                to: Scene::EndGame,
                ..
            }
        )
    });

    let requested = requests.read().map(|CompleteTask(task)| *task);
    let radio = ending.then_some(Task::Radio);

    for task in requested.chain(radio) {
        if !tasks.complete(task) {
            continue;
        }

        info!(
            "Task {:?} complete ({} of 4)",
            task,
            tasks.completed_count()
        );
        completed.send(TaskCompleted(task));
        if task != Task::Radio {
            cues.send(AudioCue::TaskCompleted(task));
        }
        if task != Task::Radio && tasks.all_core_tasks_complete() {
            info!("All core tasks complete; the radio control is live");
        }
    }
}
