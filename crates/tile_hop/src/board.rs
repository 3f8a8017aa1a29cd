use bevy::prelude::*;

use crate::adjacency::AdjacencyRule;
use crate::config::{GridSettings, MoverSettings};
use crate::grid::{GridLayout, TileIndex};
use crate::highlight::{Highlighted, RefreshHighlights, reachable_set, refresh_highlights};
use crate::mover::Mover;

/// Tiles are thin slabs: this is their height relative to the cell size.
const TILE_THICKNESS: f32 = 0.01;

/// Ordering of the per-frame work: input feeds placement, placement feeds the board.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum HopSet {
    Input,
    Placement,
    Board,
}

/// Root of a board: owns its geometry, its tiles and its mover.
#[derive(Component, Debug)]
pub struct GridController {
    layout: GridLayout,
    rule: AdjacencyRule,
    /// Tile entities, indexed by `TileIndex`.
    tiles: Vec<Entity>,
    mover: Entity,
}

impl GridController {
    pub const fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub const fn rule(&self) -> AdjacencyRule {
        self.rule
    }

    pub const fn mover(&self) -> Entity {
        self.mover
    }

    pub fn tile_entity(&self, index: TileIndex) -> Option<Entity> {
        self.tiles.get(index.0 as usize).copied()
    }

    pub fn tiles(&self) -> impl Iterator<Item = (TileIndex, Entity)> + '_ {
        self.layout.tiles().zip(self.tiles.iter().copied())
    }
}

#[derive(Component)]
pub struct GridTile;

/// Drives the locomotion animation of a mover.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Walking(pub bool);

#[derive(Event, Clone, Copy, Debug)]
pub struct MoveRequest {
    pub grid: Entity,
    pub target: TileIndex,
}

/// A board was placed, moved or reshaped and must be laid out again.
#[derive(Event, Clone, Copy, Debug)]
pub struct GridRepositioned {
    pub grid: Entity,
}

pub struct BoardPlugin;

impl Plugin for BoardPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<GridSettings>()
            .register_type::<MoverSettings>()
            .init_resource::<GridSettings>()
            .init_resource::<MoverSettings>()
            .add_event::<MoveRequest>()
            .add_event::<GridRepositioned>()
            .add_event::<RefreshHighlights>()
            .configure_sets(
                Update,
                (HopSet::Input, HopSet::Placement, HopSet::Board).chain(),
            )
            .add_systems(
                Update,
                (
                    apply_move_requests,
                    advance_movers,
                    apply_grid_settings.run_if(resource_changed::<GridSettings>),
                    layout_grids,
                    refresh_highlights,
                )
                    .chain()
                    .in_set(HopSet::Board),
            );
    }
}

pub fn tile_transform(layout: &GridLayout, index: TileIndex) -> Transform {
    let cell = layout.cell_size();
    Transform::from_translation(layout.position_of(index).unwrap_or_default()).with_scale(
        Vec3::new(cell, cell * TILE_THICKNESS, cell),
    )
}

fn mover_translation(layout: &GridLayout, index: TileIndex) -> Vec3 {
    layout.position_of(index).unwrap_or_default()
}

fn spawn_tiles(
    commands: &mut Commands,
    grid: Entity,
    layout: &GridLayout,
    highlighted: impl Fn(TileIndex) -> bool,
) -> Vec<Entity> {
    let tiles: Vec<Entity> = layout
        .tiles()
        .map(|index| {
            commands
                .spawn((
                    Name::new(format!("Tile {}", index.0)),
                    GridTile,
                    Highlighted(highlighted(index)),
                    tile_transform(layout, index),
                    Visibility::default(),
                ))
                .id()
        })
        .collect();
    commands.entity(grid).add_children(&tiles);
    tiles
}

/// Spawns a board root with its tiles and its mover standing on `start`.
///
/// Reachable tiles are highlighted right away so a fresh board is playable on its first frame.
pub fn spawn_grid(
    commands: &mut Commands,
    layout: GridLayout,
    rule: AdjacencyRule,
    start: TileIndex,
    transform: Transform,
) -> Entity {
    let grid = commands
        .spawn((Name::new("Grid"), transform, Visibility::default()))
        .id();

    let reachable = reachable_set(rule, &layout, start);
    let tiles = spawn_tiles(commands, grid, &layout, |index| reachable.contains(&index));

    let mover = commands
        .spawn((
            Name::new("Mover"),
            Mover::new(grid, start),
            Walking::default(),
            Transform::from_translation(mover_translation(&layout, start))
                .with_scale(Vec3::splat(layout.cell_size())),
            Visibility::default(),
        ))
        .id();

    commands.entity(grid).add_child(mover).insert(GridController {
        layout,
        rule,
        tiles,
        mover,
    });

    info!("Spawned a {0}x{0} grid starting on {start}", layout.side());
    grid
}

fn apply_move_requests(
    mut requests: EventReader<MoveRequest>,
    grids: Query<&GridController>,
    mut movers: Query<(&mut Mover, &Transform, &mut Walking)>,
    settings: Res<MoverSettings>,
) {
    for request in requests.read() {
        let Ok(controller) = grids.get(request.grid) else {
            warn!("Move request for missing grid {}", request.grid);
            continue;
        };
        let Ok((mut mover, transform, mut walking)) = movers.get_mut(controller.mover()) else {
            warn!("Grid {} has no mover", request.grid);
            continue;
        };

        match mover.request_move(
            request.target,
            controller.rule(),
            controller.layout(),
            transform,
            &settings,
        ) {
            Ok(()) => {
                info!("Moving to {}", request.target);
                walking.set_if_neq(Walking(true));
            }
            Err(rejected) => debug!("Move ignored: {rejected}"),
        }
    }
}

fn advance_movers(
    time: Res<Time>,
    mut movers: Query<(&mut Mover, &mut Transform, &mut Walking)>,
    mut refresh: EventWriter<RefreshHighlights>,
) {
    let delta = time.delta_secs();
    for (mut mover, mut transform, mut walking) in &mut movers {
        if !mover.is_moving() {
            continue;
        }
        let Some(sample) = mover.tick(delta) else {
            continue;
        };
        transform.translation = sample.translation;
        transform.rotation = sample.rotation;
        if sample.finished {
            walking.set_if_neq(Walking(false));
            refresh.send(RefreshHighlights { grid: mover.grid() });
        }
    }
}

fn apply_grid_settings(
    mut commands: Commands,
    settings: Res<GridSettings>,
    mut grids: Query<(Entity, &mut GridController)>,
    mut repositioned: EventWriter<GridRepositioned>,
) {
    let layout = match settings.layout() {
        Ok(layout) => layout,
        Err(err) => {
            error!("Ignoring grid settings: {err}");
            return;
        }
    };
    if let Err(err) = settings.validate() {
        // The layout still applies; movers pushed off the board land on tile 0.
        error!("{err}, falling back to {}", TileIndex(0));
    }

    for (grid, mut controller) in &mut grids {
        if controller.layout == layout && controller.rule == settings.adjacency {
            continue;
        }
        if controller.layout.tile_count() != layout.tile_count() {
            for tile in controller.tiles.drain(..) {
                commands.entity(tile).despawn_recursive();
            }
            // Highlights are recomputed once the mover is back on the board.
            controller.tiles = spawn_tiles(&mut commands, grid, &layout, |_| false);
        }
        controller.layout = layout;
        controller.rule = settings.adjacency;
        info!("Grid {grid} is now {0}x{0} with {1} moves", layout.side(), controller.rule);
        repositioned.send(GridRepositioned { grid });
    }
}

fn layout_grids(
    mut events: EventReader<GridRepositioned>,
    grids: Query<&GridController>,
    mut tiles: Query<&mut Transform, (With<GridTile>, Without<Mover>)>,
    mut movers: Query<(&mut Mover, &mut Transform, &mut Walking), Without<GridTile>>,
    settings: Res<GridSettings>,
    mut refresh: EventWriter<RefreshHighlights>,
) {
    for GridRepositioned { grid } in events.read() {
        let Ok(controller) = grids.get(*grid) else {
            warn!("Could not find grid {grid} to lay out");
            continue;
        };
        let layout = controller.layout();

        for (index, tile) in controller.tiles() {
            if let Ok(mut transform) = tiles.get_mut(tile) {
                *transform = tile_transform(layout, index);
            }
        }

        let Ok((mut mover, mut transform, mut walking)) = movers.get_mut(controller.mover()) else {
            warn!("Grid {grid} has no mover");
            continue;
        };
        let tile = if layout.contains(mover.tile()) {
            mover.tile()
        } else {
            let fallback = TileIndex(settings.start_tile);
            let fallback = if layout.contains(fallback) {
                fallback
            } else {
                TileIndex(0)
            };
            warn!("{} left the board, mover reset to {fallback}", mover.tile());
            fallback
        };
        mover.reset_to(tile);
        walking.set_if_neq(Walking(false));
        transform.translation = mover_translation(layout, tile);
        transform.scale = Vec3::splat(layout.cell_size());

        refresh.send(RefreshHighlights { grid: *grid });
    }
}
