//! Directional input reduced from press/release events.

use serde::{Deserialize, Serialize};

/// One of the four movement directions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Maps a keyboard key name (arrow keys or WASD, either case) to a direction.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" | "w" | "W" => Some(Self::Up),
            "ArrowDown" | "s" | "S" => Some(Self::Down),
            "ArrowLeft" | "a" | "A" => Some(Self::Left),
            "ArrowRight" | "d" | "D" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Currently held directions. Written by the input collaborator, read once per tick.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            up: false,
            down: false,
            left: false,
            right: false,
        }
    }

    /// Whether any direction is held.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    #[must_use]
    pub const fn is_held(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Record a press (`true`) or release (`false`).
    pub fn set(&mut self, direction: Direction, pressed: bool) {
        match direction {
            Direction::Up => self.up = pressed,
            Direction::Down => self.down = pressed,
            Direction::Left => self.left = pressed,
            Direction::Right => self.right = pressed,
        }
    }

    /// Apply a raw key event. Returns `false` for keys that do not move the avatar.
    pub fn apply_key(&mut self, key: &str, pressed: bool) -> bool {
        match Direction::from_key(key) {
            Some(direction) => {
                self.set(direction, pressed);
                true
            }
            None => false,
        }
    }

    /// Release every direction.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
