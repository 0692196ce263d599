//! Per-tick movement integration for the controlled avatar.
//!
//! Speed is a fixed displacement per tick, not per second, so the effective
//! velocity follows the scheduler's tick rate. Diagonals are not normalised:
//! two perpendicular keys move `speed * sqrt(2)` per tick.

use crate::{InputState, Position};
use serde::{Deserialize, Serialize};

/// Inclusive world extents the controlled avatar is clamped to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorldBounds {
    pub min: Position,
    pub max: Position,
}

impl WorldBounds {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Position::new(min_x, min_y),
            max: Position::new(max_x, max_y),
        }
    }

    /// Check if a point is within bounds (edges included).
    #[must_use]
    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Clamp each axis independently.
    #[must_use]
    pub fn clamp(&self, point: Position) -> Position {
        Position::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
        )
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Apply one tick of held-direction movement and clamp to `bounds`.
///
/// Opposing keys cancel because the per-axis deltas are summed. With nothing
/// held the position is returned untouched.
#[must_use]
pub fn integrate(
    position: Position,
    input: &InputState,
    speed: f32,
    bounds: &WorldBounds,
) -> Position {
    if !input.any() {
        return position;
    }

    let mut dx = 0.0;
    let mut dy = 0.0;
    if input.up {
        dy -= speed;
    }
    if input.down {
        dy += speed;
    }
    if input.left {
        dx -= speed;
    }
    if input.right {
        dx += speed;
    }

    bounds.clamp(Position::new(position.x + dx, position.y + dy))
}
