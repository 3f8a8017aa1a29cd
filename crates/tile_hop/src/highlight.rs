use std::collections::BTreeSet;

use bevy::prelude::*;

use crate::adjacency::AdjacencyRule;
use crate::board::GridController;
use crate::grid::{GridLayout, TileIndex};
use crate::mover::Mover;

/// Marks a tile the mover can hop to next.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Highlighted(pub bool);

/// Asks for the reachable tiles of a board to be marked again.
#[derive(Event, Clone, Copy, Debug)]
pub struct RefreshHighlights {
    pub grid: Entity,
}

/// Tiles reachable from `current` in one hop.
pub fn reachable_set(
    rule: AdjacencyRule,
    layout: &GridLayout,
    current: TileIndex,
) -> BTreeSet<TileIndex> {
    (-1..=1)
        .flat_map(|d_row| (-1..=1).map(move |d_col| (d_row, d_col)))
        .filter_map(|(d_row, d_col)| layout.offset(current, d_row, d_col))
        .filter(|&tile| rule.is_reachable(layout, current, tile))
        .collect()
}

pub fn refresh_highlights(
    mut events: EventReader<RefreshHighlights>,
    grids: Query<&GridController>,
    movers: Query<&Mover>,
    mut tiles: Query<&mut Highlighted>,
) {
    for RefreshHighlights { grid } in events.read() {
        let Ok(controller) = grids.get(*grid) else {
            warn!("Could not find grid {grid} to highlight");
            continue;
        };
        let Ok(mover) = movers.get(controller.mover()) else {
            warn!("Grid {grid} has no mover");
            continue;
        };

        let reachable = reachable_set(controller.rule(), controller.layout(), mover.tile());
        for (index, tile) in controller.tiles() {
            if let Ok(mut highlighted) = tiles.get_mut(tile) {
                highlighted.set_if_neq(Highlighted(reachable.contains(&index)));
            }
        }
    }
}
