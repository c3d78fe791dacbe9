//! Application entry point: window, logging, and asset settings, then `DioramaPlugin` from
//! `app.rs` takes over.

mod app;
mod audio;
mod choreography;
mod config;
mod drag;
mod figurine;
mod geometry;
mod hud;
mod input;
mod interaction;
mod minigames;
mod proximity;
mod scene;
mod state;
mod store;
mod tasks;
mod ui;
mod viewport;

use app::DioramaPlugin;
use bevy::asset::AssetPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::window::{Window, WindowResizeConstraints, WindowResolution};

const LOG_FILTER: &str = "wgpu=error,naga=warn,bevy_render=warn,diorama=debug";

fn main() {
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    console_error_panic_hook::set_once();

    // Narrow phones in portrait are the smallest layout the mobile tables are tuned for.
    let primary_window = Window {
        title: "Diorama".to_string(),
        resolution: WindowResolution::new(1280.0, 720.0),
        resizable: true,
        resize_constraints: WindowResizeConstraints {
            min_width: 320.0,
            min_height: 480.0,
            max_width: f32::INFINITY,
            max_height: f32::INFINITY,
        },
        canvas: cfg!(all(target_arch = "wasm32", feature = "web"))
            .then(|| "#bevy-canvas".to_owned()),
        fit_canvas_to_parent: true,
        ..default()
    };

    let mut default_plugins = DefaultPlugins
        .set(WindowPlugin {
            primary_window: Some(primary_window),
            ..default()
        })
        .set(LogPlugin {
            filter: LOG_FILTER.to_owned(),
            ..default()
        });

    #[cfg(not(target_arch = "wasm32"))]
    {
        default_plugins = default_plugins.set(AssetPlugin {
            file_path: "assets".to_owned(),
            watch_for_changes_override: Some(true),
            ..default()
        });
    }

    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    {
        default_plugins = default_plugins.set(AssetPlugin {
            file_path: "assets".to_owned(),
            watch_for_changes_override: Some(false),
            ..default()
        });
    }

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.08, 0.07, 0.09)))
        .add_plugins(default_plugins)
        .add_plugins(DioramaPlugin)
        .run();
}
