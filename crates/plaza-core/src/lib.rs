//! Core types and the per-tick presence engine for the plaza workspace.

pub mod avatar;
pub mod command;
pub mod engine;
pub mod input;
pub mod movement;
pub mod proximity;
pub mod viewport;
pub mod zones;

pub use avatar::{Avatar, AvatarId, AvatarMap, AvatarRoster};
pub use command::{SessionCommand, apply_session_command};
pub use engine::{
    AvatarView, LocationSnapshot, PresenceEngine, PresenceSnapshot, TickSummary, ZoneOccupancy,
};
pub use input::{Direction, InputState};
pub use movement::{WorldBounds, integrate};
pub use plaza_index::{IndexError, Rect, distance, point_in_rect, rects_overlap};
pub use proximity::{ProximityEngine, ProximityOrder, ProximityResult, compute_nearby};
pub use viewport::{CameraSnapshot, Viewport, ViewportConfig};
pub use zones::{LayoutConfig, Location, OUTDOOR_LABEL, POND_LABEL, Zone, ZoneIndex, ZoneKind};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monotonic counter of engine updates.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Resets the tick counter back to zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

/// Point in world (or screen) coordinates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Construct a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    #[must_use]
    pub const fn as_tuple(self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance_to(self, other: Position) -> f32 {
        distance(self.as_tuple(), other.as_tuple())
    }

    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Position {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Errors raised while validating configuration or building an engine.
#[derive(Debug, Error)]
pub enum PresenceError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A zone definition cannot be used for containment tests.
    #[error("invalid zone `{id}`: {reason}")]
    InvalidZone { id: String, reason: &'static str },
    /// Two zones share the same identifier.
    #[error("duplicate zone id `{0}`")]
    DuplicateZone(String),
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Backing structure used for proximity scans.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProximityIndexKind {
    /// Scan every online avatar each tick.
    #[default]
    Linear,
    /// Bucket avatars into square cells of `cell_size` world units.
    Grid { cell_size: f32 },
}

/// Static configuration for a presence session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Inclusive clamp applied to the controlled avatar after every move.
    pub world_bounds: WorldBounds,
    /// Displacement per tick along each held axis, in world units.
    pub move_speed: f32,
    /// Inclusive radius used for nearby and conversation-range checks.
    pub proximity_radius: f32,
    /// Width of the rendering surface in screen pixels.
    pub viewport_width: f32,
    /// Height of the rendering surface in screen pixels.
    pub viewport_height: f32,
    /// Camera zoom range and smoothing.
    pub camera: ViewportConfig,
    pub proximity_index: ProximityIndexKind,
    pub proximity_order: ProximityOrder,
    /// Maximum number of recent tick summaries retained in-memory.
    pub history_capacity: usize,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            world_bounds: WorldBounds::new(20.0, 20.0, 1_180.0, 780.0),
            move_speed: 3.0,
            proximity_radius: 60.0,
            viewport_width: 1_200.0,
            viewport_height: 800.0,
            camera: ViewportConfig::default(),
            proximity_index: ProximityIndexKind::Linear,
            proximity_order: ProximityOrder::Input,
            history_capacity: 256,
        }
    }
}

impl PresenceConfig {
    /// Validates every field, rejecting values the engine cannot run with.
    pub fn validate(&self) -> Result<(), PresenceError> {
        let bounds = &self.world_bounds;
        if !bounds.min.is_finite() || !bounds.max.is_finite() {
            return Err(PresenceError::InvalidConfig("world bounds must be finite"));
        }
        if bounds.min.x > bounds.max.x || bounds.min.y > bounds.max.y {
            return Err(PresenceError::InvalidConfig(
                "world bounds minimum cannot exceed maximum",
            ));
        }
        if !self.move_speed.is_finite() || self.move_speed <= 0.0 {
            return Err(PresenceError::InvalidConfig("move_speed must be positive"));
        }
        if !self.proximity_radius.is_finite() || self.proximity_radius <= 0.0 {
            return Err(PresenceError::InvalidConfig(
                "proximity_radius must be positive",
            ));
        }
        if !self.viewport_width.is_finite()
            || !self.viewport_height.is_finite()
            || self.viewport_width <= 0.0
            || self.viewport_height <= 0.0
        {
            return Err(PresenceError::InvalidConfig(
                "viewport dimensions must be positive",
            ));
        }
        self.camera.validate()?;
        if let ProximityIndexKind::Grid { cell_size } = self.proximity_index
            && (!cell_size.is_finite() || cell_size <= 0.0)
        {
            return Err(PresenceError::InvalidConfig(
                "grid cell_size must be positive",
            ));
        }
        if self.history_capacity == 0 {
            return Err(PresenceError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        Ok(())
    }
}
