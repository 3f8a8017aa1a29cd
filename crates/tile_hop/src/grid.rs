use core::fmt::{self, Display, Formatter};

use bevy::prelude::*;

use crate::config::ConfigError;

/// Row-major, zero-based identifier of a tile.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileIndex(pub u32);

impl Display for TileIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "tile {}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub row: u32,
    pub col: u32,
}

/// Geometry of an N x N board, local to the board root.
///
/// Rows run along X, columns along Z and every tile sits on the Y = 0 ground plane.
/// The layout is centered on the root whatever the parity of N.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    side: u32,
    cell_size: f32,
    padding: f32,
}

impl GridLayout {
    pub fn new(side: u32, cell_size: f32, padding: f32) -> Result<Self, ConfigError> {
        if side == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if side.checked_mul(side).is_none() {
            return Err(ConfigError::TooManyTiles(side));
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(cell_size));
        }
        if !padding.is_finite() || padding < 0.0 {
            return Err(ConfigError::InvalidPadding(padding));
        }
        Ok(Self {
            side,
            cell_size,
            padding,
        })
    }

    pub const fn side(&self) -> u32 {
        self.side
    }

    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub const fn tile_count(&self) -> u32 {
        self.side * self.side
    }

    pub const fn contains(&self, index: TileIndex) -> bool {
        index.0 < self.tile_count()
    }

    pub fn tiles(&self) -> impl Iterator<Item = TileIndex> {
        (0..self.tile_count()).map(TileIndex)
    }

    pub const fn coord_of(&self, index: TileIndex) -> Option<TileCoord> {
        if !self.contains(index) {
            return None;
        }
        Some(TileCoord {
            row: index.0 / self.side,
            col: index.0 % self.side,
        })
    }

    pub const fn index_of(&self, coord: TileCoord) -> Option<TileIndex> {
        if coord.row >= self.side || coord.col >= self.side {
            return None;
        }
        Some(TileIndex(coord.row * self.side + coord.col))
    }

    /// Tile reached by stepping `d_row` rows and `d_col` columns away, if it is on the board.
    pub fn offset(&self, index: TileIndex, d_row: i32, d_col: i32) -> Option<TileIndex> {
        let coord = self.coord_of(index)?;
        let row = coord.row.checked_add_signed(d_row)?;
        let col = coord.col.checked_add_signed(d_col)?;
        self.index_of(TileCoord { row, col })
    }

    fn center_offset(&self) -> f32 {
        (self.side - 1) as f32 * 0.5
    }

    /// Distance between the centers of two neighboring tiles.
    pub fn pitch(&self) -> f32 {
        self.cell_size + self.padding
    }

    fn axis_position(&self, coord: u32) -> f32 {
        let offset = coord as f32 - self.center_offset();
        offset.mul_add(self.cell_size, offset * self.padding)
    }

    pub fn position_of(&self, index: TileIndex) -> Option<Vec3> {
        let coord = self.coord_of(index)?;
        Some(Vec3::new(
            self.axis_position(coord.row),
            0.0,
            self.axis_position(coord.col),
        ))
    }

    /// Every tile position, in index order.
    pub fn positions(&self) -> Vec<Vec3> {
        self.tiles()
            .filter_map(|index| self.position_of(index))
            .collect()
    }

    fn axis_coord(&self, value: f32) -> Option<u32> {
        let slot = (value / self.pitch() + self.center_offset()).round();
        if !(0.0..self.side as f32).contains(&slot) {
            return None;
        }
        let center = self.axis_position(slot as u32);
        ((value - center).abs() <= self.cell_size * 0.5).then_some(slot as u32)
    }

    /// Tile under a point expressed in the board's local space.
    ///
    /// Points in the padding between tiles or off the board hit nothing. Height is ignored.
    pub fn tile_at(&self, local: Vec3) -> Option<TileIndex> {
        let row = self.axis_coord(local.x)?;
        let col = self.axis_coord(local.z)?;
        self.index_of(TileCoord { row, col })
    }
}
