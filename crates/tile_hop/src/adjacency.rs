use bevy::prelude::*;
use strum::{Display, EnumIter};

use crate::grid::{GridLayout, TileIndex};

/// Which neighbors of a tile the mover may hop to.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum AdjacencyRule {
    /// The four tiles sharing an edge.
    #[default]
    Orthogonal,
    /// The eight tiles sharing an edge or a corner.
    EightWay,
}

impl AdjacencyRule {
    pub fn is_reachable(self, layout: &GridLayout, from: TileIndex, to: TileIndex) -> bool {
        if from == to {
            return false;
        }
        let (Some(a), Some(b)) = (layout.coord_of(from), layout.coord_of(to)) else {
            return false;
        };
        let row_diff = a.row.abs_diff(b.row);
        let col_diff = a.col.abs_diff(b.col);
        match self {
            Self::Orthogonal => row_diff + col_diff == 1,
            Self::EightWay => row_diff.max(col_diff) == 1,
        }
    }
}
