// Hide console window on Windows for release builds (GUI app).
// In debug builds, keep the console so panics/backtraces are visible.
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use bevy::prelude::*;
use clap::Parser;

use dicedrop::dice3d::{DiceRenderPlugin, DiceSimulationPlugin, SettingsArgs};

/// Dice Drop - pick up, drag and drop a die, and read the face it lands on
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    settings: SettingsArgs,
}

fn main() {
    let args = Args::parse();

    let settings = match args.settings.resolve() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Dice Drop".to_string(),
                resolution: (1280u32, 720u32).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.08, 0.09, 0.12)))
        .add_plugins((DiceSimulationPlugin::new(settings), DiceRenderPlugin))
        .run();
}
