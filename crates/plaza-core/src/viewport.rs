//! Camera that trails the controlled avatar and maps world to screen space.

use crate::{Position, PresenceError};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Increment applied by zoom in/out commands.
    pub zoom_step: f32,
    /// Fraction of the remaining distance to the target covered each tick.
    pub smoothing: f32,
    pub initial_zoom: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 2.0,
            zoom_step: 0.2,
            smoothing: 0.1,
            initial_zoom: 1.0,
        }
    }
}

impl ViewportConfig {
    pub fn validate(&self) -> Result<(), PresenceError> {
        if !self.min_zoom.is_finite()
            || !self.max_zoom.is_finite()
            || self.min_zoom <= 0.0
            || self.min_zoom > self.max_zoom
        {
            return Err(PresenceError::InvalidConfig(
                "zoom range must satisfy 0 < min_zoom <= max_zoom",
            ));
        }
        if !self.zoom_step.is_finite() || self.zoom_step <= 0.0 {
            return Err(PresenceError::InvalidConfig("zoom_step must be positive"));
        }
        if !self.smoothing.is_finite() || self.smoothing <= 0.0 || self.smoothing > 1.0 {
            return Err(PresenceError::InvalidConfig(
                "camera smoothing must be within (0, 1]",
            ));
        }
        if !self.initial_zoom.is_finite() {
            return Err(PresenceError::InvalidConfig("initial_zoom must be finite"));
        }
        Ok(())
    }
}

/// Camera state published to renderers.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CameraSnapshot {
    pub camera_x: f32,
    pub camera_y: f32,
    pub zoom: f32,
}

/// World-space top-left offset plus zoom.
#[derive(Clone, Debug)]
pub struct Viewport {
    config: ViewportConfig,
    camera: Position,
    zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        let zoom = config.initial_zoom.clamp(config.min_zoom, config.max_zoom);
        Self {
            config,
            camera: Position::default(),
            zoom,
        }
    }

    #[inline]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    #[inline]
    pub fn camera(&self) -> Position {
        self.camera
    }

    #[inline]
    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Camera offset that would centre `focus` on a surface of the given size.
    pub fn target_for(&self, focus: Position, viewport_width: f32, viewport_height: f32) -> Position {
        Position::new(
            focus.x - viewport_width / (2.0 * self.zoom),
            focus.y - viewport_height / (2.0 * self.zoom),
        )
    }

    /// Ease the camera toward the centring target. Never lands exactly on it.
    pub fn tick(&mut self, focus: Position, viewport_width: f32, viewport_height: f32) -> Position {
        let target = self.target_for(focus, viewport_width, viewport_height);
        let s = self.config.smoothing;
        self.camera.x += (target.x - self.camera.x) * s;
        self.camera.y += (target.y - self.camera.y) * s;
        self.camera
    }

    /// Jump straight to the centring target.
    pub fn snap_to(&mut self, focus: Position, viewport_width: f32, viewport_height: f32) {
        self.camera = self.target_for(focus, viewport_width, viewport_height);
    }

    pub fn world_to_screen(&self, point: Position) -> Position {
        Position::new(
            (point.x - self.camera.x) * self.zoom,
            (point.y - self.camera.y) * self.zoom,
        )
    }

    /// Exact inverse of [`Viewport::world_to_screen`]; used for pointer input.
    pub fn screen_to_world(&self, point: Position) -> Position {
        Position::new(
            point.x / self.zoom + self.camera.x,
            point.y / self.zoom + self.camera.y,
        )
    }

    /// Clamp `zoom` into the configured range and apply it. Camera offset is kept.
    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        if zoom.is_nan() {
            return self.zoom;
        }
        self.zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_zoom(self.zoom + self.config.zoom_step)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_zoom(self.zoom - self.config.zoom_step)
    }

    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            camera_x: self.camera.x,
            camera_y: self.camera.y,
            zoom: self.zoom,
        }
    }
}
