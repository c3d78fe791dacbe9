//! Frame structure and the debug key.
//!
//! There is no Bevy `States` machine here: the scene graph lives in `SceneMachine` so the ending
//! flag and the choreography guard stay part of the same value. Scene-specific systems still run
//! every frame and check the machine themselves, so their event readers never fall behind.

use bevy::input::keyboard::KeyCode;
use bevy::prelude::*;

use crate::store::UiCommand;

/// Named system sets to structure the Update schedule. Chained in this order by `DioramaPlugin`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DioramaSet {
    /// Raw window input becomes pointer/click/HUD commands.
    Input,
    /// Clicks become scene commands and minigame actions.
    Interaction,
    /// Drag controllers move the figurine.
    Movement,
    Proximity,
    Tasks,
    Scene,
    /// Audio, HUD easing, sprites, overlays.
    Presentation,
}

/// Backquote toggles the debug overlay.
pub const DEBUG_TOGGLE_KEY: KeyCode = KeyCode::Backquote;

pub fn toggle_debug_overlay(keyboard: Res<ButtonInput<KeyCode>>, mut ui: EventWriter<UiCommand>) {
    if keyboard.just_pressed(DEBUG_TOGGLE_KEY) {
        ui.send(UiCommand::ToggleDebug);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backquote_requests_debug_toggle() {
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>()
            .add_event::<UiCommand>()
            .add_systems(Update, toggle_debug_overlay);

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(DEBUG_TOGGLE_KEY);
        app.update();

        let sent: Vec<_> = app
            .world()
            .resource::<Events<UiCommand>>()
            .iter_current_update_events()
            .copied()
            .collect();
        assert_eq!(sent, vec![UiCommand::ToggleDebug]);
    }
}
