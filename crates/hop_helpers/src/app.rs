use bevy::asset::AssetMetaCheck;
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use bevy::render::RenderPlugin;
use bevy::render::settings::{PowerPreference, RenderCreation, WgpuSettings, WgpuSettingsPriority};
use bevy::window::{PresentMode, WindowMode, WindowResolution};

// typical smartphone screen ratio (9:16)
pub const WINDOW_WIDTH: f32 = 360.0;
pub const WINDOW_HEIGHT: f32 = 640.0;

/// Keeps the renderer quiet and the game crates verbose.
pub const LOG_FILTER: &str = "wgpu=error,naga=warn,hop_helpers=debug,tile_hop=debug";

pub const CLEAR_COLOR: Color = Color::srgb(0.08, 0.08, 0.1);

// Creates a Bevy app with the window, asset, render and log settings shared by every game
// of the workspace. Game plugins are added on top by the caller.
pub fn get_default_app(app_name: &str) -> App {
    let mut app = App::new();

    let asset_plugin = AssetPlugin {
        mode: bevy::asset::AssetMode::Unprocessed,
        file_path: "assets".to_string(),
        processed_file_path: "imported_assets/Default".to_string(),
        watch_for_changes_override: None,
        meta_check: AssetMetaCheck::Never,
    };

    let resolution = WindowResolution::new(WINDOW_WIDTH, WINDOW_HEIGHT);

    let window_plugin = WindowPlugin {
        primary_window: Some(Window {
            title: app_name.to_string(),
            present_mode: PresentMode::Fifo,
            resolution,
            mode: WindowMode::Windowed,
            ..default()
        }),
        ..default()
    };

    let render_plugin = RenderPlugin {
        render_creation: RenderCreation::Automatic(WgpuSettings {
            power_preference: PowerPreference::HighPerformance,
            priority: WgpuSettingsPriority::Functionality,
            ..default()
        }),
        ..default()
    };

    let log_plugin = LogPlugin {
        filter: LOG_FILTER.to_string(),
        level: Level::INFO,
        ..default()
    };

    app.add_plugins(
        DefaultPlugins
            .set(asset_plugin)
            .set(window_plugin)
            .set(render_plugin)
            .set(log_plugin),
    );

    // This plugin is useful to preserve battery life on mobile.
    // https://github.com/aevyrie/bevy_framepace
    app.add_plugins(bevy_framepace::FramepacePlugin);

    app.insert_resource(ClearColor(CLEAR_COLOR));

    info!("Starting {app_name}");

    app
}
