use bevy::prelude::*;

use crate::board::{GridRepositioned, HopSet, spawn_grid};
use crate::config::{GridSettings, PlacementMode, PlacementSettings};

/// Below this squared length a projected direction is too short to orient the board.
const MIN_FORWARD_SQUARED: f32 = 1e-6;

/// A point on a detected real-world surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    pub position: Vec3,
    pub normal: Dir3,
}

/// Anything able to find a surface along a ray, typically a platform plane tracker.
pub trait SurfaceRaycast: Send + Sync + 'static {
    fn raycast(&self, ray: Ray3d) -> Option<SurfaceHit>;
}

/// An infinite horizontal surface at a fixed height.
///
/// Stands in for plane tracking on platforms without it.
#[derive(Clone, Copy, Debug, Default)]
pub struct HorizontalPlane {
    pub height: f32,
}

impl SurfaceRaycast for HorizontalPlane {
    fn raycast(&self, ray: Ray3d) -> Option<SurfaceHit> {
        let distance =
            ray.intersect_plane(Vec3::Y * self.height, InfinitePlane3d { normal: Dir3::Y })?;
        Some(SurfaceHit {
            position: ray.get_point(distance),
            normal: Dir3::Y,
        })
    }
}

/// Whether the platform can detect surfaces at all.
#[derive(Resource, Default)]
pub enum PlaneDetection {
    Available(Box<dyn SurfaceRaycast>),
    #[default]
    Unavailable,
}

impl PlaneDetection {
    pub fn available(raycast: impl SurfaceRaycast) -> Self {
        Self::Available(Box::new(raycast))
    }

    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn raycast(&self, ray: Ray3d) -> Option<SurfaceHit> {
        match self {
            Self::Available(raycast) => raycast.raycast(ray),
            Self::Unavailable => None,
        }
    }
}

/// A tap that hit no tile, candidate for placing the board.
#[derive(Event, Clone, Copy, Debug)]
pub struct SurfaceTap {
    pub ray: Ray3d,
    pub camera_forward: Option<Dir3>,
}

/// Reference frame of the board on the detected surface. The board is its child.
#[derive(Component, Debug, Default)]
pub struct PlacementAnchor {
    grid: Option<Entity>,
    placed: bool,
}

impl PlacementAnchor {
    pub const fn grid(&self) -> Option<Entity> {
        self.grid
    }

    pub const fn is_placed(&self) -> bool {
        self.placed
    }
}

/// Rotation of a board lying on a surface with the given normal, its forward axis along
/// the tap ray projected on the surface.
pub fn surface_rotation(ray_direction: Vec3, camera_forward: Option<Vec3>, normal: Dir3) -> Quat {
    let up = normal.as_vec3();
    let forward = core::iter::once(ray_direction)
        .chain(camera_forward)
        .chain(core::iter::once(Vec3::NEG_Z))
        .map(|direction| direction.reject_from_normalized(up))
        .find(|direction| direction.length_squared() >= MIN_FORWARD_SQUARED)
        .unwrap_or_else(|| up.any_orthonormal_vector());
    Transform::IDENTITY.looking_to(forward, up).rotation
}

pub struct PlacementPlugin;

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<PlacementSettings>()
            .init_resource::<PlacementSettings>()
            .init_resource::<PlaneDetection>()
            .add_event::<SurfaceTap>()
            .add_systems(Startup, setup_placement)
            .add_systems(Update, place_on_surface.in_set(HopSet::Placement));
    }
}

fn setup_placement(
    mut commands: Commands,
    settings: Res<PlacementSettings>,
    grid_settings: Res<GridSettings>,
    detection: Res<PlaneDetection>,
    mut repositioned: EventWriter<GridRepositioned>,
) {
    if !detection.is_available() {
        warn!("Plane detection unavailable, placement disabled");
    }

    let mut anchor = PlacementAnchor::default();
    if settings.mode == PlacementMode::MoveExisting {
        match grid_settings.validate() {
            Ok((layout, start)) => {
                let grid = spawn_grid(
                    &mut commands,
                    layout,
                    grid_settings.adjacency,
                    start,
                    Transform::IDENTITY,
                );
                anchor.grid = Some(grid);
                repositioned.send(GridRepositioned { grid });
            }
            Err(err) => error!("Could not spawn the grid: {err}"),
        }
    }

    commands.spawn((
        Name::new("Surface anchor"),
        anchor,
        Transform::default(),
        Visibility::default(),
    ));
}

fn place_on_surface(
    mut commands: Commands,
    mut taps: EventReader<SurfaceTap>,
    detection: Res<PlaneDetection>,
    settings: Res<PlacementSettings>,
    grid_settings: Res<GridSettings>,
    mut anchors: Query<(Entity, &mut PlacementAnchor, &mut Transform)>,
    mut repositioned: EventWriter<GridRepositioned>,
) {
    for tap in taps.read() {
        let Some(hit) = detection.raycast(tap.ray) else {
            continue;
        };
        let rotation = surface_rotation(
            tap.ray.direction.as_vec3(),
            tap.camera_forward.map(|forward| forward.as_vec3()),
            hit.normal,
        );

        for (anchor_entity, mut anchor, mut transform) in &mut anchors {
            if anchor.placed {
                if !settings.allow_reposition {
                    continue;
                }
                info!("Moved grid to {}", hit.position);
            } else {
                let grid = match (settings.mode, anchor.grid) {
                    (PlacementMode::MoveExisting, Some(grid)) => grid,
                    (PlacementMode::MoveExisting, None) => {
                        error!("No existing grid to place");
                        continue;
                    }
                    (PlacementMode::SpawnOnFirstHit, _) => match grid_settings.validate() {
                        Ok((layout, start)) => spawn_grid(
                            &mut commands,
                            layout,
                            grid_settings.adjacency,
                            start,
                            Transform::IDENTITY,
                        ),
                        Err(err) => {
                            error!("Could not spawn the grid: {err}");
                            continue;
                        }
                    },
                };
                commands
                    .entity(grid)
                    .set_parent(anchor_entity)
                    .insert(Transform::IDENTITY);
                anchor.grid = Some(grid);
                anchor.placed = true;
                info!("Placed grid at {}", hit.position);
            }

            *transform = Transform::from_translation(hit.position).with_rotation(rotation);
            if let Some(grid) = anchor.grid {
                repositioned.send(GridRepositioned { grid });
            }
        }
    }
}
