use core::f32::consts::TAU;

use bevy::color::palettes::css::{DARK_SLATE_GRAY, GOLD, ORANGE_RED, WHITE_SMOKE};
use bevy::prelude::*;

use crate::board::{GridController, GridTile, Walking};
use crate::config::{MoverSettings, PlacementSettings};
use crate::highlight::Highlighted;
use crate::mover::Mover;
use crate::placement::{PlacementAnchor, PlaneDetection};

/// Resting height of the body's center, in mover space.
const BODY_REST_HEIGHT: f32 = 0.5;
const BOB_FREQUENCY: f32 = 2.5;

const BUTTON_COLOR: Color = Color::srgba(0.15, 0.15, 0.15, 0.8);
const BUTTON_PRESSED_COLOR: Color = Color::srgba(0.35, 0.35, 0.35, 0.9);

#[derive(Resource)]
struct TileAssets {
    tile_mesh: Handle<Mesh>,
    idle: Handle<StandardMaterial>,
    highlighted: Handle<StandardMaterial>,
    body_mesh: Handle<Mesh>,
    nose_mesh: Handle<Mesh>,
    body_material: Handle<StandardMaterial>,
}

impl TileAssets {
    fn tile_material(&self, highlighted: Highlighted) -> Handle<StandardMaterial> {
        if highlighted.0 {
            self.highlighted.clone()
        } else {
            self.idle.clone()
        }
    }
}

#[derive(Component)]
struct MoverBody;

#[derive(Component)]
struct HintText;

#[derive(Component)]
struct RepositionButton;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_scene, setup_ui))
            .add_systems(
                Update,
                (
                    (dress_tiles, dress_movers, paint_tiles).chain(),
                    bob_walking_movers,
                    toggle_reposition,
                    update_hint,
                ),
            );
    }
}

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Name::new("Camera"),
        Camera3d::default(),
        Transform::from_xyz(0.0, 6.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(3.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // The surface the board gets placed on. Slightly sunk so tiles never fight with it.
    commands.spawn((
        Name::new("Floor"),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(20.0, 20.0))),
        MeshMaterial3d(materials.add(Color::from(DARK_SLATE_GRAY))),
        Transform::from_xyz(0.0, -0.01, 0.0),
    ));

    commands.insert_resource(TileAssets {
        tile_mesh: meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
        idle: materials.add(Color::from(WHITE_SMOKE)),
        highlighted: materials.add(StandardMaterial {
            base_color: Color::from(GOLD),
            emissive: LinearRgba::rgb(0.4, 0.3, 0.0),
            ..default()
        }),
        body_mesh: meshes.add(Capsule3d::new(0.25, 0.5)),
        nose_mesh: meshes.add(Sphere::new(0.08)),
        body_material: materials.add(Color::from(ORANGE_RED)),
    });
}

fn setup_ui(mut commands: Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.),
            height: Val::Percent(100.),
            flex_direction: FlexDirection::Column,
            justify_content: JustifyContent::SpaceBetween,
            align_items: AlignItems::Center,
            padding: UiRect::all(Val::Px(16.)),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                HintText,
                Text::new(""),
                TextFont {
                    font_size: 20.,
                    ..default()
                },
                TextColor(Color::WHITE),
                TextLayout::new_with_justify(JustifyText::Center),
            ));
            parent
                .spawn((
                    RepositionButton,
                    Button,
                    Node {
                        padding: UiRect::axes(Val::Px(16.), Val::Px(8.)),
                        ..default()
                    },
                    BackgroundColor(BUTTON_COLOR),
                ))
                .with_child((
                    Text::new(reposition_label(true)),
                    TextFont {
                        font_size: 18.,
                        ..default()
                    },
                    TextColor(Color::WHITE),
                ));
        });
}

const fn reposition_label(allow_reposition: bool) -> &'static str {
    if allow_reposition {
        "Lock board"
    } else {
        "Unlock board"
    }
}

fn dress_tiles(
    mut commands: Commands,
    assets: Res<TileAssets>,
    tiles: Query<(Entity, &Highlighted), Added<GridTile>>,
) {
    for (entity, highlighted) in &tiles {
        commands.entity(entity).insert((
            Mesh3d(assets.tile_mesh.clone()),
            MeshMaterial3d(assets.tile_material(*highlighted)),
        ));
    }
}

fn dress_movers(
    mut commands: Commands,
    assets: Res<TileAssets>,
    movers: Query<Entity, Added<Mover>>,
) {
    for entity in &movers {
        commands.entity(entity).with_children(|parent| {
            parent
                .spawn((
                    MoverBody,
                    Mesh3d(assets.body_mesh.clone()),
                    MeshMaterial3d(assets.body_material.clone()),
                    Transform::from_xyz(0.0, BODY_REST_HEIGHT, 0.0),
                ))
                .with_child((
                    // Points along local +Z, the direction the mover faces.
                    Mesh3d(assets.nose_mesh.clone()),
                    MeshMaterial3d(assets.body_material.clone()),
                    Transform::from_xyz(0.0, 0.2, 0.25),
                ));
        });
    }
}

fn paint_tiles(
    assets: Res<TileAssets>,
    mut tiles: Query<(&Highlighted, &mut MeshMaterial3d<StandardMaterial>), Changed<Highlighted>>,
) {
    for (highlighted, mut material) in &mut tiles {
        material.0 = assets.tile_material(*highlighted);
    }
}

fn bob_walking_movers(
    time: Res<Time>,
    settings: Res<MoverSettings>,
    movers: Query<(&Walking, &Children)>,
    mut bodies: Query<&mut Transform, With<MoverBody>>,
) {
    for (walking, children) in &movers {
        let bob = if walking.0 {
            (time.elapsed_secs() * BOB_FREQUENCY * TAU).sin().abs() * settings.bob_height
        } else {
            0.0
        };
        let mut iter = bodies.iter_many_mut(children);
        while let Some(mut transform) = iter.fetch_next() {
            transform.translation.y = BODY_REST_HEIGHT + bob;
        }
    }
}

fn toggle_reposition(
    mut settings: ResMut<PlacementSettings>,
    mut buttons: Query<
        (&Interaction, &Children, &mut BackgroundColor),
        (Changed<Interaction>, With<RepositionButton>),
    >,
    mut texts: Query<&mut Text>,
) {
    for (interaction, children, mut background) in &mut buttons {
        match *interaction {
            Interaction::Pressed => {
                settings.allow_reposition = !settings.allow_reposition;
                info!("Board repositioning allowed: {}", settings.allow_reposition);
                let mut iter = texts.iter_many_mut(children);
                while let Some(mut text) = iter.fetch_next() {
                    **text = reposition_label(settings.allow_reposition).to_string();
                }
                background.0 = BUTTON_PRESSED_COLOR;
            }
            Interaction::Hovered | Interaction::None => background.0 = BUTTON_COLOR,
        }
    }
}

/// What the player can do next.
const fn hint_text(board_exists: bool, placed: bool, can_place: bool) -> &'static str {
    match (board_exists, placed, can_place) {
        (_, true, _) | (true, false, false) => "Tap a highlighted tile to hop",
        (true, false, true) => "Tap a highlighted tile to hop, or the floor to place the board",
        (false, false, true) => "Tap the floor to place the board",
        (false, false, false) => "No surface detection, the board cannot be placed",
    }
}

fn update_hint(
    detection: Res<PlaneDetection>,
    grids: Query<(), With<GridController>>,
    anchors: Query<&PlacementAnchor>,
    mut hints: Query<&mut Text, With<HintText>>,
) {
    let hint = hint_text(
        !grids.is_empty(),
        anchors.iter().any(PlacementAnchor::is_placed),
        detection.is_available(),
    );
    for mut text in &mut hints {
        if text.0 != hint {
            **text = hint.to_string();
        }
    }
}
