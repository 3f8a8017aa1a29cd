//! Headless runs of the board and placement plugins, stepped frame by frame.

use core::time::Duration;
use std::collections::BTreeSet;

use bevy::hierarchy::HierarchyPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy::transform::TransformPlugin;

use crate::adjacency::AdjacencyRule;
use crate::board::{BoardPlugin, GridController, GridTile, MoveRequest, Walking};
use crate::config::{GridSettings, MoverSettings, PlacementMode, PlacementSettings};
use crate::grid::TileIndex;
use crate::highlight::Highlighted;
use crate::input::{TapRoute, route_tap};
use crate::mover::Mover;
use crate::placement::{
    HorizontalPlane, PlacementAnchor, PlacementPlugin, PlaneDetection, SurfaceTap,
};

const FRAME: Duration = Duration::from_millis(100);

/// More frames than any hop in these tests needs to land.
const SETTLE_FRAMES: usize = 8;

struct TestBoard {
    app: App,
}

impl TestBoard {
    fn new(grid: GridSettings, placement: PlacementSettings, detection: PlaneDetection) -> Self {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, HierarchyPlugin, TransformPlugin))
            .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
            .insert_resource(grid)
            .insert_resource(placement)
            .insert_resource(MoverSettings {
                move_duration: 0.4,
                ..default()
            })
            .insert_resource(detection)
            .add_plugins((BoardPlugin, PlacementPlugin));
        // Startup
        app.update();
        Self { app }
    }

    fn with_grid(grid: GridSettings) -> Self {
        Self::new(
            grid,
            PlacementSettings::default(),
            PlaneDetection::available(HorizontalPlane::default()),
        )
    }

    fn three_by_three_from_center() -> Self {
        Self::with_grid(GridSettings {
            side: 3,
            start_tile: 4,
            ..default()
        })
    }

    fn tap_surface(&mut self, point: Vec3) {
        let ray = Ray3d {
            origin: point + Vec3::new(0.0, 4.0, 4.0),
            direction: Dir3::new(Vec3::new(0.0, -1.0, -1.0)).expect("valid direction"),
        };
        self.app.world_mut().send_event(SurfaceTap {
            ray,
            camera_forward: None,
        });
        self.app.update();
    }

    fn request(&mut self, target: u32) {
        let grid = self.grid();
        self.app.world_mut().send_event(MoveRequest {
            grid,
            target: TileIndex(target),
        });
        self.app.update();
    }

    fn settle(&mut self) {
        for _ in 0..SETTLE_FRAMES {
            self.app.update();
        }
    }

    fn grid_count(&mut self) -> usize {
        let world = self.app.world_mut();
        let mut query = world.query_filtered::<(), With<GridController>>();
        query.iter(world).count()
    }

    fn tile_entity_count(&mut self) -> usize {
        let world = self.app.world_mut();
        let mut query = world.query_filtered::<(), With<GridTile>>();
        query.iter(world).count()
    }

    fn grid(&mut self) -> Entity {
        let world = self.app.world_mut();
        let mut query = world.query_filtered::<Entity, With<GridController>>();
        query.single(world)
    }

    fn controller(&mut self) -> &GridController {
        let grid = self.grid();
        self.app
            .world()
            .get::<GridController>(grid)
            .expect("grid has a controller")
    }

    fn mover(&mut self) -> (TileIndex, Vec3, bool) {
        let world = self.app.world_mut();
        let mut query = world.query::<(&Mover, &Transform, &Walking)>();
        let (mover, transform, walking) = query.single(world);
        (mover.tile(), transform.translation, walking.0)
    }

    fn hopping(&mut self) -> bool {
        let world = self.app.world_mut();
        let mut query = world.query::<&Mover>();
        query.single(world).is_moving()
    }

    fn anchored_grid(&mut self) -> Option<Entity> {
        let world = self.app.world_mut();
        let mut query = world.query::<&PlacementAnchor>();
        query.single(world).grid()
    }

    /// Routes a tap looking straight down at a world point.
    fn route(&mut self, point: Vec3) -> TapRoute {
        let ray = Ray3d {
            origin: point + Vec3::Y * 4.0,
            direction: Dir3::NEG_Y,
        };
        let world = self.app.world_mut();
        let mut query = world.query::<(Entity, &GridController, &GlobalTransform)>();
        route_tap(ray, None, query.iter(world))
    }

    fn anchor(&mut self) -> (Entity, bool, Vec3) {
        let world = self.app.world_mut();
        let mut query = world.query::<(Entity, &PlacementAnchor, &Transform)>();
        let (entity, anchor, transform) = query.single(world);
        (entity, anchor.is_placed(), transform.translation)
    }

    fn highlighted(&mut self) -> BTreeSet<TileIndex> {
        let grid = self.grid();
        let world = self.app.world();
        let controller = world.get::<GridController>(grid).expect("grid has a controller");
        controller
            .tiles()
            .filter(|(_, tile)| world.get::<Highlighted>(*tile).is_some_and(|h| h.0))
            .map(|(index, _)| index)
            .collect()
    }
}

fn tiles(indices: &[u32]) -> BTreeSet<TileIndex> {
    indices.iter().copied().map(TileIndex).collect()
}

#[test]
fn unavailable_plane_detection_never_places() {
    let mut board = TestBoard::new(
        GridSettings::default(),
        PlacementSettings::default(),
        PlaneDetection::Unavailable,
    );
    board.tap_surface(Vec3::ZERO);
    board.tap_surface(Vec3::new(1.0, 0.0, 1.0));

    assert_eq!(board.grid_count(), 0, "nothing placed without plane detection");
    let (_, placed, _) = board.anchor();
    assert!(!placed, "anchor untouched");
}

#[test]
fn first_hit_spawns_a_highlighted_board() {
    let mut board = TestBoard::three_by_three_from_center();
    assert_eq!(board.grid_count(), 0, "no board before a surface is hit");

    board.tap_surface(Vec3::new(1.0, 0.0, 2.0));

    assert_eq!(board.grid_count(), 1, "one board placed");
    let (anchor, placed, translation) = board.anchor();
    assert!(placed, "anchor placed");
    assert!(
        translation.abs_diff_eq(Vec3::new(1.0, 0.0, 2.0), 1e-4),
        "anchor on the hit point, got {translation}"
    );
    let grid = board.grid();
    assert_eq!(
        board.app.world().get::<Parent>(grid).map(Parent::get),
        Some(anchor),
        "board hangs off the anchor"
    );
    assert_eq!(board.anchored_grid(), Some(grid), "anchor knows its board");
    assert_eq!(board.highlighted(), tiles(&[1, 3, 5, 7]), "edges of the center");
}

#[test]
fn hop_scenario_on_three_by_three() {
    let mut board = TestBoard::three_by_three_from_center();
    board.tap_surface(Vec3::ZERO);

    board.request(5);
    let (tile, _, walking) = board.mover();
    assert_eq!(tile, TileIndex(5), "logical tile updated before the hop lands");
    assert!(walking, "walking while hopping");

    board.settle();
    let (tile, translation, walking) = board.mover();
    assert_eq!(tile, TileIndex(5), "landed on 5");
    assert!(!walking, "standing after landing");
    assert_eq!(
        Some(translation),
        board.controller().layout().position_of(TileIndex(5)),
        "snapped to the tile"
    );
    assert_eq!(board.highlighted(), tiles(&[2, 4, 8]), "neighbors of 5");

    board.request(0);
    board.settle();
    let (tile, _, _) = board.mover();
    assert_eq!(tile, TileIndex(5), "0 is not reachable from 5");
    assert_eq!(board.highlighted(), tiles(&[2, 4, 8]), "highlights unchanged");
}

#[test]
fn eight_way_two_by_two_connects_everything() {
    let mut board = TestBoard::with_grid(GridSettings {
        side: 2,
        start_tile: 0,
        adjacency: AdjacencyRule::EightWay,
        ..default()
    });
    board.tap_surface(Vec3::ZERO);
    assert_eq!(board.highlighted(), tiles(&[1, 2, 3]), "all others from 0");

    board.request(3);
    board.settle();
    assert_eq!(board.mover().0, TileIndex(3), "diagonal hop accepted");
    assert_eq!(board.highlighted(), tiles(&[0, 1, 2]), "all others from 3");
}

#[test]
fn repositioning_moves_the_same_board() {
    let mut board = TestBoard::three_by_three_from_center();
    board.tap_surface(Vec3::ZERO);
    let grid = board.grid();

    board.tap_surface(Vec3::new(3.0, 0.0, -1.0));

    assert_eq!(board.grid_count(), 1, "still a single board");
    assert_eq!(board.grid(), grid, "same board entity");
    let (_, _, translation) = board.anchor();
    assert!(
        translation.abs_diff_eq(Vec3::new(3.0, 0.0, -1.0), 1e-4),
        "anchor moved, got {translation}"
    );
}

#[test]
fn locked_board_stays_put() {
    let mut board = TestBoard::new(
        GridSettings::default(),
        PlacementSettings {
            allow_reposition: false,
            ..default()
        },
        PlaneDetection::available(HorizontalPlane::default()),
    );
    board.tap_surface(Vec3::new(1.0, 0.0, 1.0));
    board.tap_surface(Vec3::new(-2.0, 0.0, 3.0));

    let (_, _, translation) = board.anchor();
    assert!(
        translation.abs_diff_eq(Vec3::new(1.0, 0.0, 1.0), 1e-4),
        "second hit ignored, got {translation}"
    );
}

#[test]
fn existing_board_is_moved_onto_the_surface() {
    let mut board = TestBoard::new(
        GridSettings {
            start_tile: 4,
            ..default()
        },
        PlacementSettings {
            mode: PlacementMode::MoveExisting,
            ..default()
        },
        PlaneDetection::available(HorizontalPlane::default()),
    );
    assert_eq!(board.grid_count(), 1, "board exists from the start");
    let grid = board.grid();
    assert_eq!(board.highlighted(), tiles(&[1, 3, 5, 7]), "playable before placement");
    let (anchor, placed, _) = board.anchor();
    assert!(!placed, "not placed yet");

    board.tap_surface(Vec3::new(0.5, 0.0, 0.5));

    assert_eq!(board.grid(), grid, "no second board spawned");
    assert_eq!(
        board.app.world().get::<Parent>(grid).map(Parent::get),
        Some(anchor),
        "existing board re-parented to the anchor"
    );
}

#[test]
fn resizing_the_board_rebuilds_tiles() {
    let mut board = TestBoard::three_by_three_from_center();
    board.tap_surface(Vec3::ZERO);

    board.app.world_mut().resource_mut::<GridSettings>().side = 4;
    board.app.update();

    assert_eq!(board.controller().tiles().count(), 16, "table covers 4x4");
    assert_eq!(board.tile_entity_count(), 16, "old tiles despawned");
    assert!(board.controller().tile_entity(TileIndex(15)).is_some(), "last tile of 4x4 indexed");
    assert!(board.controller().tile_entity(TileIndex(16)).is_none(), "nothing past the board");
    assert_eq!(board.mover().0, TileIndex(4), "4 is still on the board");
    assert_eq!(board.highlighted(), tiles(&[0, 5, 8]), "neighbors of 4 on 4x4");

    {
        let mut settings = board.app.world_mut().resource_mut::<GridSettings>();
        settings.side = 2;
        settings.start_tile = 0;
    }
    board.app.update();

    assert_eq!(board.tile_entity_count(), 4, "2x2 left");
    assert_eq!(board.mover().0, TileIndex(0), "mover back on the start tile");
    assert_eq!(board.highlighted(), tiles(&[1, 2]), "neighbors of 0 on 2x2");
}

#[test]
fn invalid_settings_keep_the_board() {
    let mut board = TestBoard::three_by_three_from_center();
    board.tap_surface(Vec3::ZERO);

    board.app.world_mut().resource_mut::<GridSettings>().cell_size = -1.0;
    board.app.update();

    assert_eq!(board.tile_entity_count(), 9, "tiles untouched");
    let cell_size = board.controller().layout().cell_size();
    assert!((cell_size - 1.0).abs() < f32::EPSILON, "layout untouched");
}

#[test]
fn changing_the_rule_rehighlights() {
    let mut board = TestBoard::three_by_three_from_center();
    board.tap_surface(Vec3::ZERO);

    board.app.world_mut().resource_mut::<GridSettings>().adjacency = AdjacencyRule::EightWay;
    board.app.update();

    assert_eq!(
        board.highlighted(),
        tiles(&[0, 1, 2, 3, 5, 6, 7, 8]),
        "diagonals become reachable"
    );
}

#[test]
fn out_of_range_start_tile_still_resizes() {
    let mut board = TestBoard::three_by_three_from_center();
    board.tap_surface(Vec3::ZERO);

    // Start tile 4 does not exist on 2x2, and neither does the mover's tile.
    board.app.world_mut().resource_mut::<GridSettings>().side = 2;
    board.app.update();

    assert_eq!(board.tile_entity_count(), 4, "layout applied");
    assert_eq!(board.mover().0, TileIndex(0), "mover falls back to the first tile");
    assert_eq!(board.highlighted(), tiles(&[1, 2]), "neighbors of 0 on 2x2");
}

#[test]
fn tap_on_a_tile_hops_instead_of_placing() {
    let mut board = TestBoard::three_by_three_from_center();
    let anchor_point = Vec3::new(3.0, 0.0, -1.0);
    board.tap_surface(anchor_point);
    let grid = board.grid();
    let tile_five = board
        .controller()
        .layout()
        .position_of(TileIndex(5))
        .expect("tile 5 on 3x3");

    let on_tile = board.route(anchor_point + tile_five);
    assert!(
        matches!(on_tile, TapRoute::Hop(MoveRequest { grid: g, target: TileIndex(5) }) if g == grid),
        "tap on tile 5 asks for a hop, got {on_tile:?}"
    );

    let beside = board.route(Vec3::new(-3.0, 0.0, 4.0));
    assert!(
        matches!(beside, TapRoute::Surface(_)),
        "tap beside the board goes to placement, got {beside:?}"
    );

    let TapRoute::Hop(request) = on_tile else {
        return;
    };
    board.app.world_mut().send_event(request);
    board.settle();
    assert_eq!(board.mover().0, TileIndex(5), "routed tap moved the mover");
    let (_, _, translation) = board.anchor();
    assert!(
        translation.abs_diff_eq(anchor_point, 1e-4),
        "board not moved by the tile tap, got {translation}"
    );
}

#[test]
fn repositioning_mid_hop_lands_the_mover() {
    let mut board = TestBoard::three_by_three_from_center();
    board.tap_surface(Vec3::ZERO);

    board.request(5);
    assert!(board.hopping(), "hop under way");

    board.tap_surface(Vec3::new(2.0, 0.0, 2.0));

    let (tile, translation, walking) = board.mover();
    assert!(!board.hopping(), "hop dropped by the reposition");
    assert!(!walking, "standing after the reposition");
    assert_eq!(tile, TileIndex(5), "kept its logical tile");
    assert_eq!(
        Some(translation),
        board.controller().layout().position_of(TileIndex(5)),
        "snapped onto tile 5"
    );
    assert_eq!(board.highlighted(), tiles(&[2, 4, 8]), "neighbors of 5");
}
