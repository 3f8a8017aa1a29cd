pub mod adjacency;
pub mod board;
pub mod config;
pub mod grid;
pub mod highlight;
pub mod input;
pub mod mover;
pub mod placement;
mod scene;

#[cfg(test)]
mod integration_tests;

use board::BoardPlugin;
use input::TapInputPlugin;
use placement::{HorizontalPlane, PlaneDetection, PlacementPlugin};
use scene::ScenePlugin;

pub fn run() {
    hop_helpers::get_default_app(env!("CARGO_PKG_NAME"))
        // Without a plane tracker the floor of the scene is the detected surface.
        .insert_resource(PlaneDetection::available(HorizontalPlane { height: 0.0 }))
        .add_plugins(BoardPlugin)
        .add_plugins(PlacementPlugin)
        .add_plugins(TapInputPlugin)
        .add_plugins(ScenePlugin)
        .run();
}
