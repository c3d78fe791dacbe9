//! Audio cues and background music.
//!
//! The core never decides what a sound is, it only says *when* one should play: `AudioCue` events
//! and the `SceneEvent::Cue`/`BackgroundAudio` signals. This plugin maps them to clips. Handles are
//! kept in `AudioHandles` so Bevy's reference-counted asset storage keeps the decoded buffers alive.

use bevy::audio::{AudioSinkPlayback, Volume};
use bevy::prelude::*;

use crate::config::DioramaConfig;
use crate::drag::FigurinePosition;
use crate::proximity::Landmark;
use crate::scene::{SceneEvent, SceneMachine};
use crate::state::DioramaSet;
use crate::tasks::Task;
use crate::viewport::Viewport;

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AudioHandles>()
            .init_resource::<BackgroundAudio>()
            .add_event::<AudioCue>()
            .add_systems(Startup, load_audio_handles)
            .add_systems(
                Update,
                (
                    play_cues,
                    follow_background_signal,
                    sync_background_music,
                    attenuate_radio_music,
                )
                    .chain()
                    .in_set(DioramaSet::Presentation),
            );
    }
}

/// A discrete "play effect X" moment.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    TaskCompleted(Task),
    TransitionClick,
    ButtonClick,
    FigurinePlaced,
    PhoneRing,
}

#[derive(Resource, Default)]
pub struct AudioHandles {
    pub task_complete: Option<Handle<AudioSource>>,
    pub transition_click: Option<Handle<AudioSource>>,
    pub button_click: Option<Handle<AudioSource>>,
    pub figurine_placed: Option<Handle<AudioSource>>,
    pub phone_ring: Option<Handle<AudioSource>>,
    pub radio_music: Option<Handle<AudioSource>>,
}

impl AudioHandles {
    fn clip(&self, cue: AudioCue) -> Option<&Handle<AudioSource>> {
        match cue {
            AudioCue::TaskCompleted(_) => self.task_complete.as_ref(),
            AudioCue::TransitionClick => self.transition_click.as_ref(),
            AudioCue::ButtonClick => self.button_click.as_ref(),
            AudioCue::FigurinePlaced => self.figurine_placed.as_ref(),
            AudioCue::PhoneRing => self.phone_ring.as_ref(),
        }
    }
}

/// Whether the looping radio music should be audible at all. Cleared for good by the ending.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundAudio {
    pub enabled: bool,
}

impl Default for BackgroundAudio {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Component)]
struct RadioMusic;

/// Linear falloff from full volume at the radio to silence at `audible_distance`.
pub fn radio_volume(distance: Option<f32>, audible_distance: f32) -> f32 {
    match distance {
        Some(distance) if audible_distance > 0.0 => {
            (1.0 - distance / audible_distance).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

fn load_audio_handles(asset_server: Res<AssetServer>, mut handles: ResMut<AudioHandles>) {
    handles.task_complete = Some(asset_server.load("audio/task_complete.ogg"));
    handles.transition_click = Some(asset_server.load("audio/transition_click.ogg"));
    handles.button_click = Some(asset_server.load("audio/button_click.ogg"));
    handles.figurine_placed = Some(asset_server.load("audio/figurine_placed.ogg"));
    handles.phone_ring = Some(asset_server.load("audio/phone_ring.ogg"));
    handles.radio_music = Some(asset_server.load("audio/radio_music.ogg"));

    info!("Queued diorama audio clips from assets/audio/.");
}

fn play_cues(
    mut commands: Commands,
    mut cues: EventReader<AudioCue>,
    mut scene_events: EventReader<SceneEvent>,
    handles: Res<AudioHandles>,
) {
    let scene_cues = scene_events.read().filter_map(|event| match event {
        SceneEvent::Cue(cue) => Some(*cue),
        _ => None,
    });

    for cue in cues.read().copied().chain(scene_cues) {
        let Some(source) = handles.clip(cue).cloned() else {
            debug!("No clip loaded for {:?}", cue);
            continue;
        };
        commands.spawn(AudioBundle {
            source,
            settings: PlaybackSettings::DESPAWN,
        });
    }
}

fn follow_background_signal(
    mut scene_events: EventReader<SceneEvent>,
    mut background: ResMut<BackgroundAudio>,
) {
    for event in scene_events.read() {
        if let SceneEvent::BackgroundAudio(enabled) = event {
            info!("Background audio {}", if *enabled { "on" } else { "off" });
            background.set_if_neq(BackgroundAudio { enabled: *enabled });
        }
    }
}

/// Starts the loop once the hub is on screen and pauses/resumes it with `BackgroundAudio`.
fn sync_background_music(
    mut commands: Commands,
    background: Res<BackgroundAudio>,
    machine: Res<SceneMachine>,
    handles: Res<AudioHandles>,
    music: Query<&AudioSink, With<RadioMusic>>,
    spawned: Query<Entity, With<RadioMusic>>,
) {
    let wanted = background.enabled && machine.current() == crate::scene::Scene::Main;

    if spawned.is_empty() {
        if wanted {
            if let Some(source) = handles.radio_music.clone() {
                commands.spawn((
                    RadioMusic,
                    Name::new("RadioMusic"),
                    AudioBundle {
                        source,
                        settings: PlaybackSettings::LOOP.with_volume(Volume::new(0.0)),
                    },
                ));
            }
        }
        return;
    }

    for sink in &music {
        if !background.enabled && !sink.is_paused() {
            sink.pause();
        } else if background.enabled && sink.is_paused() {
            sink.play();
        }
    }
}

fn attenuate_radio_music(
    position: Res<FigurinePosition>,
    viewport: Res<Viewport>,
    config: Res<DioramaConfig>,
    background: Res<BackgroundAudio>,
    music: Query<&AudioSink, With<RadioMusic>>,
) {
    if music.is_empty() {
        return;
    }

    let layout = config.layout(viewport.breakpoint);
    let distance = layout
        .landmark(Landmark::Radio)
        .zip(position.get())
        .map(|(radio, figurine)| figurine.distance(radio.position));
    let volume = if background.enabled {
        radio_volume(distance, config.minigames.radio_audible_distance)
    } else {
        0.0
    };

    for sink in &music {
        sink.set_volume(volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radio_volume_falls_off_linearly() {
        assert_eq!(radio_volume(Some(0.0), 60.0), 1.0);
        assert_eq!(radio_volume(Some(30.0), 60.0), 0.5);
        assert_eq!(radio_volume(Some(90.0), 60.0), 0.0);
    }

    #[test]
    fn radio_volume_silent_without_figurine() {
        assert_eq!(radio_volume(None, 60.0), 0.0);
        assert_eq!(radio_volume(Some(10.0), 0.0), 0.0);
    }

    #[test]
    fn background_signal_updates_resource() {
        let mut app = App::new();
        app.add_event::<SceneEvent>()
            .init_resource::<BackgroundAudio>()
            .add_systems(Update, follow_background_signal);

        app.world_mut().send_event(SceneEvent::BackgroundAudio(false));
        app.update();
        assert!(!app.world().resource::<BackgroundAudio>().enabled);
    }
}
