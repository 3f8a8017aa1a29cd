use bevy::prelude::*;
use hop_helpers::input::TapInput;
use leafwing_input_manager::prelude::*;
use strum::{EnumIter, IntoEnumIterator};

use crate::board::{GridController, HopSet, MoveRequest};
use crate::grid::{GridLayout, TileIndex};
use crate::mover::Mover;
use crate::placement::SurfaceTap;

// One tile in a direction, as seen from the default camera.
#[derive(Actionlike, PartialEq, Eq, Hash, Clone, Copy, Debug, Reflect, EnumIter)]
pub enum HopAction {
    Up,
    Down,
    Left,
    Right,
}

impl HopAction {
    /// Row and column step. Rows run to the right of the screen, columns toward the camera.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

pub fn create_input_map() -> InputMap<HopAction> {
    let mut input_map = InputMap::default();

    input_map.insert(HopAction::Up, KeyCode::ArrowUp);
    input_map.insert(HopAction::Up, KeyCode::KeyW);
    input_map.insert(HopAction::Down, KeyCode::ArrowDown);
    input_map.insert(HopAction::Down, KeyCode::KeyS);
    input_map.insert(HopAction::Left, KeyCode::ArrowLeft);
    input_map.insert(HopAction::Left, KeyCode::KeyA);
    input_map.insert(HopAction::Right, KeyCode::ArrowRight);
    input_map.insert(HopAction::Right, KeyCode::KeyD);

    input_map
}

/// Tile of a board hit by a world-space ray, if any.
pub fn pick_tile(ray: Ray3d, world_from_grid: &GlobalTransform, layout: &GridLayout) -> Option<TileIndex> {
    let grid_from_world = world_from_grid.affine().inverse();
    let direction = Dir3::new(grid_from_world.transform_vector3(ray.direction.as_vec3())).ok()?;
    let local_ray = Ray3d {
        origin: grid_from_world.transform_point3(ray.origin),
        direction,
    };
    let distance = local_ray.intersect_plane(Vec3::ZERO, InfinitePlane3d { normal: Dir3::Y })?;
    layout.tile_at(local_ray.get_point(distance))
}

pub struct TapInputPlugin;

impl Plugin for TapInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(InputManagerPlugin::<HopAction>::default())
            .add_systems(Startup, spawn_hop_controls)
            .add_systems(Update, (route_taps, keyboard_hops).in_set(HopSet::Input));
    }
}

fn spawn_hop_controls(mut commands: Commands) {
    commands.spawn((
        Name::new("Hop controls"),
        InputManagerBundle::<HopAction> {
            input_map: create_input_map(),
            ..default()
        },
    ));
}

/// Where a tap goes: a tile asks for a hop, anything else may place the board.
#[derive(Clone, Copy, Debug)]
pub enum TapRoute {
    Hop(MoveRequest),
    Surface(SurfaceTap),
}

pub fn route_tap<'a>(
    ray: Ray3d,
    camera_forward: Option<Dir3>,
    grids: impl IntoIterator<Item = (Entity, &'a GridController, &'a GlobalTransform)>,
) -> TapRoute {
    grids
        .into_iter()
        .find_map(|(grid, controller, transform)| {
            pick_tile(ray, transform, controller.layout())
                .map(|target| MoveRequest { grid, target })
        })
        .map_or(TapRoute::Surface(SurfaceTap { ray, camera_forward }), TapRoute::Hop)
}

fn route_taps(
    tap_input: TapInput,
    grids: Query<(Entity, &GridController, &GlobalTransform)>,
    mut moves: EventWriter<MoveRequest>,
    mut surface_taps: EventWriter<SurfaceTap>,
) {
    let Some(ray) = tap_input.ray() else {
        return;
    };

    match route_tap(ray, tap_input.camera_forward(), &grids) {
        TapRoute::Hop(request) => {
            debug!("Tapped {}", request.target);
            moves.send(request);
        }
        TapRoute::Surface(tap) => {
            surface_taps.send(tap);
        }
    }
}

fn keyboard_hops(
    actions: Query<&ActionState<HopAction>>,
    grids: Query<(Entity, &GridController)>,
    movers: Query<&Mover>,
    mut moves: EventWriter<MoveRequest>,
) {
    let Ok(action_state) = actions.get_single() else {
        return;
    };

    for action in HopAction::iter().filter(|action| action_state.just_pressed(action)) {
        let (d_row, d_col) = action.offset();
        for (grid, controller) in &grids {
            let Ok(mover) = movers.get(controller.mover()) else {
                continue;
            };
            match controller.layout().offset(mover.tile(), d_row, d_col) {
                Some(target) => {
                    moves.send(MoveRequest { grid, target });
                }
                None => debug!("No tile {action:?} of {}", mover.tile()),
            }
        }
    }
}
