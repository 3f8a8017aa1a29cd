use bevy::prelude::*;
use thiserror::Error;

use crate::adjacency::AdjacencyRule;
use crate::grid::{GridLayout, TileIndex};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Grid side must be at least 1")]
    EmptyGrid,

    #[error("A grid of side {0} has more tiles than can be indexed")]
    TooManyTiles(u32),

    #[error("Cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),

    #[error("Padding must be finite and not negative, got {0}")]
    InvalidPadding(f32),

    #[error("Start tile {index} is outside a grid of {tile_count} tiles")]
    StartTileOutOfRange { index: u32, tile_count: u32 },
}

/// Shape of the board and the rule used to move on it.
#[derive(Reflect, Resource, Clone, Debug)]
#[reflect(Resource)]
pub struct GridSettings {
    /// Number of tiles along each side.
    pub side: u32,
    pub cell_size: f32,
    /// Extra spacing added per tile away from the center.
    pub padding: f32,
    pub start_tile: u32,
    pub adjacency: AdjacencyRule,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            side: 3,
            cell_size: 1.0,
            padding: 0.2,
            start_tile: 0,
            adjacency: AdjacencyRule::default(),
        }
    }
}

impl GridSettings {
    pub fn layout(&self) -> Result<GridLayout, ConfigError> {
        GridLayout::new(self.side, self.cell_size, self.padding)
    }

    /// Validated layout together with the tile the mover starts on.
    pub fn validate(&self) -> Result<(GridLayout, TileIndex), ConfigError> {
        let layout = self.layout()?;
        let start = TileIndex(self.start_tile);
        if !layout.contains(start) {
            return Err(ConfigError::StartTileOutOfRange {
                index: self.start_tile,
                tile_count: layout.tile_count(),
            });
        }
        Ok((layout, start))
    }
}

#[derive(Reflect, Resource, Clone, Debug)]
#[reflect(Resource)]
pub struct MoverSettings {
    /// Seconds for a hop from one tile to the next.
    pub move_duration: f32,
    /// Turn the mover toward the direction of travel.
    pub face_movement: bool,
    /// Seconds to complete the turn, never longer than the hop itself.
    pub turn_duration: f32,
    /// Height of the walking bob, in cells.
    pub bob_height: f32,
}

impl Default for MoverSettings {
    fn default() -> Self {
        Self {
            move_duration: 0.4,
            face_movement: true,
            turn_duration: 0.15,
            bob_height: 0.15,
        }
    }
}

#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlacementMode {
    /// Spawn a new board the first time a surface is hit.
    #[default]
    SpawnOnFirstHit,
    /// Spawn the board at startup and move it onto the first surface hit.
    MoveExisting,
}

#[derive(Reflect, Resource, Clone, Debug)]
#[reflect(Resource)]
pub struct PlacementSettings {
    pub mode: PlacementMode,
    /// Allow moving the board again after it was first placed.
    pub allow_reposition: bool,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            mode: PlacementMode::default(),
            allow_reposition: true,
        }
    }
}
