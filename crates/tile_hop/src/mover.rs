use bevy::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::adjacency::AdjacencyRule;
use crate::config::MoverSettings;
use crate::grid::{GridLayout, TileIndex};

/// Below this squared horizontal travel a hop has no direction to face.
const MIN_FACING_TRAVEL_SQUARED: f32 = 1e-6;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejected {
    #[error("{target} is outside a board of {tile_count} tiles")]
    OutOfRange { target: TileIndex, tile_count: u32 },

    #[error("{target} cannot be reached from {from}")]
    Unreachable { from: TileIndex, target: TileIndex },
}

/// Cubic ease with zero velocity at both ends, for `t` in `[0, 1]`.
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (-2.0f32).mul_add(t, 3.0)
}

/// Rotation about Y that points local +Z along the horizontal part of `travel`.
pub fn facing_for(travel: Vec3) -> Option<Quat> {
    let flat = Vec3::new(travel.x, 0.0, travel.z);
    if flat.length_squared() < MIN_FACING_TRAVEL_SQUARED {
        return None;
    }
    Some(Quat::from_rotation_y(flat.x.atan2(flat.z)))
}

/// Pose of the mover at one point of a hop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveSample {
    pub translation: Vec3,
    pub rotation: Quat,
    pub finished: bool,
}

/// A single hop, advanced by the frame clock until it lands.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveTask {
    start: Vec3,
    target: Vec3,
    start_rotation: Quat,
    target_rotation: Quat,
    elapsed: f32,
    duration: f32,
    turn_duration: f32,
}

impl MoveTask {
    pub fn new(from: &Transform, target: Vec3, settings: &MoverSettings) -> Self {
        let target_rotation = if settings.face_movement {
            facing_for(target - from.translation).unwrap_or(from.rotation)
        } else {
            from.rotation
        };
        let duration = settings.move_duration.max(0.0);
        Self {
            start: from.translation,
            target,
            start_rotation: from.rotation,
            target_rotation,
            elapsed: 0.0,
            duration,
            turn_duration: settings.turn_duration.clamp(0.0, duration),
        }
    }

    pub const fn target(&self) -> Vec3 {
        self.target
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).min(1.0)
    }

    pub fn advance(&mut self, delta: f32) -> MoveSample {
        self.elapsed += delta.max(0.0);
        if self.elapsed >= self.duration {
            // Land exactly on the target, whatever the easing left over.
            return MoveSample {
                translation: self.target,
                rotation: self.target_rotation,
                finished: true,
            };
        }

        let blend = smoothstep(self.elapsed / self.duration);
        let turn = if self.turn_duration > 0.0 {
            smoothstep(self.elapsed / self.turn_duration)
        } else {
            1.0
        };
        MoveSample {
            translation: self.start.lerp(self.target, blend),
            rotation: self.start_rotation.slerp(self.target_rotation, turn),
            finished: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum MoverPhase {
    #[default]
    Idle,
    Moving(MoveTask),
}

/// The piece hopping on a board.
///
/// The logical tile changes as soon as a hop is accepted; the transform catches up while
/// the hop plays. A new hop replaces the running one and starts from wherever the piece
/// is drawn at that moment.
#[derive(Component, Debug)]
pub struct Mover {
    grid: Entity,
    tile: TileIndex,
    phase: MoverPhase,
}

impl Mover {
    pub const fn new(grid: Entity, tile: TileIndex) -> Self {
        Self {
            grid,
            tile,
            phase: MoverPhase::Idle,
        }
    }

    pub const fn grid(&self) -> Entity {
        self.grid
    }

    pub const fn tile(&self) -> TileIndex {
        self.tile
    }

    pub const fn phase(&self) -> &MoverPhase {
        &self.phase
    }

    pub const fn is_moving(&self) -> bool {
        matches!(self.phase, MoverPhase::Moving(_))
    }

    pub fn request_move(
        &mut self,
        target: TileIndex,
        rule: AdjacencyRule,
        layout: &GridLayout,
        from: &Transform,
        settings: &MoverSettings,
    ) -> Result<(), MoveRejected> {
        let out_of_range = MoveRejected::OutOfRange {
            target,
            tile_count: layout.tile_count(),
        };
        let Some(destination) = layout.position_of(target) else {
            return Err(out_of_range);
        };
        if !rule.is_reachable(layout, self.tile, target) {
            return Err(MoveRejected::Unreachable {
                from: self.tile,
                target,
            });
        }

        if self.is_moving() {
            debug!("Hop to {target} replaces the running hop");
        }
        self.tile = target;
        self.phase = MoverPhase::Moving(MoveTask::new(from, destination, settings));
        Ok(())
    }

    /// Advances the running hop, returning the pose to draw. `None` while idle.
    pub fn tick(&mut self, delta: f32) -> Option<MoveSample> {
        let MoverPhase::Moving(task) = &mut self.phase else {
            return None;
        };
        let sample = task.advance(delta);
        if sample.finished {
            self.phase = MoverPhase::Idle;
        }
        Some(sample)
    }

    /// Drops any running hop and puts the piece back on `tile`.
    pub fn reset_to(&mut self, tile: TileIndex) {
        self.tile = tile;
        self.phase = MoverPhase::Idle;
    }
}
