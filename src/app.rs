//! High-level plugin composition.
//!
//! `DioramaPlugin` registers every domain plugin and fixes the order of the frame: raw input first,
//! then click routing, drags, proximity, task latches, the scene machine, and finally everything
//! that only presents state.

use bevy::prelude::*;

use crate::audio::GameAudioPlugin;
use crate::config::ConfigPlugin;
use crate::drag::DragPlugin;
use crate::figurine::FigurinePlugin;
use crate::hud::HudPlugin;
use crate::input::InputPlugin;
use crate::interaction::InteractionPlugin;
use crate::minigames::MinigamesPlugin;
use crate::proximity::ProximityPlugin;
use crate::scene::ScenePlugin;
use crate::state::DioramaSet;
use crate::store::StorePlugin;
use crate::tasks::TasksPlugin;
use crate::ui::UiPlugin;
use crate::viewport::ViewportPlugin;

pub struct DioramaPlugin;

impl Plugin for DioramaPlugin {
    fn build(&self, app: &mut App) {
        // Config first: several resources read it in `FromWorld`.
        app.add_plugins(ConfigPlugin)
            .add_plugins((
                ViewportPlugin,   // Window size and breakpoint.
                StorePlugin,      // UI flags, camera permission, debug key.
                InputPlugin,      // Mouse/touch to pointer events and clicks.
                InteractionPlugin,
                MinigamesPlugin,
                DragPlugin,
                ProximityPlugin,
                TasksPlugin,
                ScenePlugin,
                HudPlugin,
                GameAudioPlugin,
                FigurinePlugin,
                UiPlugin,
            ))
            .configure_sets(
                Update,
                (
                    DioramaSet::Input,
                    DioramaSet::Interaction,
                    DioramaSet::Movement,
                    DioramaSet::Proximity,
                    DioramaSet::Tasks,
                    DioramaSet::Scene,
                    DioramaSet::Presentation,
                )
                    .chain(),
            )
            .add_systems(Startup, setup_camera);
    }
}

/// The HUD drives this camera's transform and projection scale.
fn setup_camera(mut commands: Commands) {
    commands.spawn((Name::new("MainCamera"), Camera2dBundle::default()));
}
