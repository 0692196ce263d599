//! Per-tick presence orchestration.
//!
//! A tick runs these stages in order, each one observing the position
//! written by the stage before it:
//!
//! 1. read the held directions,
//! 2. integrate movement for the controlled avatar (skipped when idle),
//! 3. resolve the controlled avatar's location,
//! 4. recompute the nearby set over the whole roster,
//! 5. ease the camera toward the avatar,
//! 6. publish an immutable [`PresenceSnapshot`].

use crate::{
    Avatar, AvatarId, AvatarRoster, CameraSnapshot, Direction, InputState, LayoutConfig, Location,
    Position, PresenceConfig, PresenceError, ProximityEngine, ProximityResult, Tick, Viewport,
    ZoneIndex, ZoneKind, integrate,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Compact record of one tick, retained in a bounded history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickSummary {
    pub tick: Tick,
    pub location: String,
    pub nearby_count: usize,
    pub moved: bool,
}

/// Resolved location of the controlled avatar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationSnapshot {
    pub label: String,
    pub kind: ZoneKind,
    /// Identifier of the containing zone, absent outdoors and at the pond.
    pub zone_id: Option<String>,
}

/// Render-facing view of one online avatar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvatarView {
    pub id: AvatarId,
    pub name: String,
    pub position: Position,
    pub screen: Position,
    pub talking: bool,
    pub video_enabled: bool,
    pub controlled: bool,
    pub in_conversation_range: bool,
    /// Label of the zone this avatar currently stands in.
    pub location: String,
}

/// Immutable per-tick output for rendering and UI collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresenceSnapshot {
    pub tick: Tick,
    pub avatars: Vec<AvatarView>,
    pub location: LocationSnapshot,
    pub nearby: Vec<AvatarId>,
    pub camera: CameraSnapshot,
}

/// Online head-count for a zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneOccupancy {
    pub zone_id: String,
    pub name: String,
    pub occupants: usize,
    pub capacity: Option<u32>,
}

impl ZoneOccupancy {
    /// Whether the zone has reached its declared capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|capacity| self.occupants >= capacity as usize)
    }
}

/// Session state for one controlled avatar and everyone around it.
#[derive(Debug)]
pub struct PresenceEngine {
    config: PresenceConfig,
    roster: AvatarRoster,
    controlled: AvatarId,
    zones: ZoneIndex,
    input: InputState,
    viewport: Viewport,
    proximity: ProximityEngine,
    nearby: ProximityResult,
    location: Location,
    tick: Tick,
    history: VecDeque<TickSummary>,
}

impl PresenceEngine {
    /// Validate configuration and layout, then place the controlled avatar.
    ///
    /// The controlled avatar is forced online and clamped into the world
    /// bounds; the camera starts centred on it.
    pub fn new(
        config: PresenceConfig,
        layout: LayoutConfig,
        controlled: Avatar,
    ) -> Result<Self, PresenceError> {
        config.validate()?;
        if !controlled.position.is_finite() {
            return Err(PresenceError::InvalidConfig(
                "controlled avatar position must be finite",
            ));
        }
        let zones = ZoneIndex::from_layout(layout)?;
        let proximity = ProximityEngine::new(config.proximity_index, config.proximity_order)?;
        let mut viewport = Viewport::new(config.camera);

        let mut controlled = controlled;
        controlled.online = true;
        controlled.position = config.world_bounds.clamp(controlled.position);
        viewport.snap_to(
            controlled.position,
            config.viewport_width,
            config.viewport_height,
        );

        let mut roster = AvatarRoster::new();
        let controlled_id = roster.insert(controlled);
        let history = VecDeque::with_capacity(config.history_capacity.min(1_024));

        let mut engine = Self {
            config,
            roster,
            controlled: controlled_id,
            zones,
            input: InputState::new(),
            viewport,
            proximity,
            nearby: ProximityResult::default(),
            location: Location::Outdoor,
            tick: Tick::zero(),
            history,
        };
        engine.refresh_presence();
        Ok(engine)
    }

    /// Run one update pass and publish the resulting snapshot.
    pub fn tick(&mut self) -> PresenceSnapshot {
        let input = self.input;
        let moved = input.any() && self.stage_movement(&input);
        self.refresh_presence();
        self.stage_camera();
        self.tick = self.tick.next();
        self.record_summary(moved);
        self.snapshot()
    }

    fn stage_movement(&mut self, input: &InputState) -> bool {
        let speed = self.config.move_speed;
        let bounds = self.config.world_bounds;
        let Some(avatar) = self.roster.get_mut(self.controlled) else {
            return false;
        };
        let next = integrate(avatar.position, input, speed, &bounds);
        let moved = next != avatar.position;
        avatar.position = next;
        moved
    }

    /// Recompute location and nearby set from the current controlled position.
    fn refresh_presence(&mut self) {
        let origin = self.controlled_position();
        let location = self.zones.resolve(origin);
        if location != self.location {
            debug!(
                from = self.zones.label(self.location),
                to = self.zones.label(location),
                x = origin.x,
                y = origin.y,
                "controlled avatar changed location",
            );
            self.location = location;
        }
        self.nearby = self.proximity.compute_nearby(
            self.controlled,
            origin,
            self.roster.iter(),
            self.config.proximity_radius,
        );
    }

    fn stage_camera(&mut self) {
        let focus = self.controlled_position();
        self.viewport.tick(
            focus,
            self.config.viewport_width,
            self.config.viewport_height,
        );
    }

    fn record_summary(&mut self, moved: bool) {
        if self.history.len() == self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(TickSummary {
            tick: self.tick,
            location: self.location_label().to_string(),
            nearby_count: self.nearby.len(),
            moved,
        });
    }

    /// Build the render-facing snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> PresenceSnapshot {
        let avatars = self
            .roster
            .iter_online()
            .map(|(id, avatar)| AvatarView {
                id,
                name: avatar.name.clone(),
                position: avatar.position,
                screen: self.viewport.world_to_screen(avatar.position),
                talking: avatar.talking,
                video_enabled: avatar.video_enabled,
                controlled: id == self.controlled,
                in_conversation_range: self.nearby.in_conversation_range(id),
                location: self
                    .zones
                    .label(self.zones.resolve(avatar.position))
                    .to_string(),
            })
            .collect();

        PresenceSnapshot {
            tick: self.tick,
            avatars,
            location: LocationSnapshot {
                label: self.location_label().to_string(),
                kind: self.zones.kind(self.location),
                zone_id: self.zones.zone(self.location).map(|zone| zone.id.clone()),
            },
            nearby: self.nearby.nearby().to_vec(),
            camera: self.viewport.snapshot(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    /// Current engine tick.
    #[must_use]
    pub const fn current_tick(&self) -> Tick {
        self.tick
    }

    #[must_use]
    pub fn controlled_id(&self) -> AvatarId {
        self.controlled
    }

    /// The controlled avatar. Always present: it is inserted at construction
    /// and `leave` refuses to remove it.
    #[must_use]
    pub fn controlled(&self) -> Option<&Avatar> {
        self.roster.get(self.controlled)
    }

    fn controlled_position(&self) -> Position {
        self.roster
            .get(self.controlled)
            .map(|avatar| avatar.position)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn avatar(&self, id: AvatarId) -> Option<&Avatar> {
        self.roster.get(id)
    }

    #[must_use]
    pub fn roster(&self) -> &AvatarRoster {
        &self.roster
    }

    #[must_use]
    pub fn zones(&self) -> &ZoneIndex {
        &self.zones
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Mutable access for the input collaborator.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn set_direction(&mut self, direction: Direction, pressed: bool) {
        self.input.set(direction, pressed);
    }

    /// Feed a raw key event; returns `false` for non-movement keys.
    pub fn apply_key(&mut self, key: &str, pressed: bool) -> bool {
        self.input.apply_key(key, pressed)
    }

    /// Whether the scheduler needs to keep ticking for movement.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.input.any()
    }

    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    #[must_use]
    pub fn location_label(&self) -> &str {
        self.zones.label(self.location)
    }

    #[must_use]
    pub fn nearby(&self) -> &ProximityResult {
        &self.nearby
    }

    /// Whether `id` was within the proximity radius at the last refresh.
    #[must_use]
    pub fn is_within_proximity(&self, id: AvatarId) -> bool {
        self.nearby.in_conversation_range(id)
    }

    /// Whether a location-pinned point lies within the controlled avatar's radius.
    #[must_use]
    pub fn is_location_visible(&self, point: Position) -> bool {
        point.distance_to(self.controlled_position()) <= self.config.proximity_radius
    }

    /// Participants in the current conversation, including the controlled avatar.
    #[must_use]
    pub fn conversation_size(&self) -> usize {
        self.nearby.len() + 1
    }

    /// Nearby avatars that are currently talking, in nearby order.
    #[must_use]
    pub fn talking_in_range(&self) -> Vec<AvatarId> {
        self.nearby
            .nearby()
            .iter()
            .copied()
            .filter(|&id| self.roster.get(id).is_some_and(|avatar| avatar.talking))
            .collect()
    }

    /// Online avatars whose name contains `query`, ignoring case.
    #[must_use]
    pub fn find_avatars(&self, query: &str) -> Vec<AvatarId> {
        let needle = query.to_lowercase();
        self.roster
            .iter_online()
            .filter(|(_, avatar)| avatar.name.to_lowercase().contains(&needle))
            .map(|(id, _)| id)
            .collect()
    }

    /// Online head-count per zone, in registration order.
    #[must_use]
    pub fn occupancy(&self) -> Vec<ZoneOccupancy> {
        let mut counts = vec![0usize; self.zones.zones().len()];
        for (_, avatar) in self.roster.iter_online() {
            if let Location::Zone(idx) = self.zones.resolve(avatar.position) {
                counts[idx] += 1;
            }
        }
        self.zones
            .zones()
            .iter()
            .zip(counts)
            .map(|(zone, occupants)| ZoneOccupancy {
                zone_id: zone.id.clone(),
                name: zone.name.clone(),
                occupants,
                capacity: zone.capacity,
            })
            .collect()
    }

    /// Iterate over retained tick summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &TickSummary> {
        self.history.iter()
    }

    /// Add a remote avatar to the session.
    pub fn join(&mut self, avatar: Avatar) -> AvatarId {
        let name = avatar.name.clone();
        let id = self.roster.insert(avatar);
        info!(avatar = %name, roster = self.roster.len(), "avatar joined");
        id
    }

    /// Remove a remote avatar. The controlled avatar cannot leave.
    pub fn leave(&mut self, id: AvatarId) -> Option<Avatar> {
        if id == self.controlled {
            warn!("ignoring leave for the controlled avatar");
            return None;
        }
        let removed = self.roster.remove(id)?;
        self.nearby.forget(id);
        info!(avatar = %removed.name, roster = self.roster.len(), "avatar left");
        Some(removed)
    }

    /// Update a remote avatar's position. Rejected for the controlled avatar.
    pub fn set_remote_position(&mut self, id: AvatarId, position: Position) -> bool {
        if id == self.controlled {
            warn!("remote position updates cannot move the controlled avatar");
            return false;
        }
        match self.roster.get_mut(id) {
            Some(avatar) => {
                avatar.position = position;
                true
            }
            None => false,
        }
    }

    /// Toggle a remote avatar's presence. The controlled avatar stays online.
    pub fn set_online(&mut self, id: AvatarId, online: bool) -> bool {
        if id == self.controlled {
            if !online {
                warn!("the controlled avatar cannot go offline");
            }
            return online;
        }
        let Some(avatar) = self.roster.get_mut(id) else {
            return false;
        };
        avatar.online = online;
        if !online {
            self.nearby.forget(id);
        }
        true
    }

    pub fn set_talking(&mut self, id: AvatarId, talking: bool) -> bool {
        self.roster
            .get_mut(id)
            .map(|avatar| avatar.talking = talking)
            .is_some()
    }

    pub fn set_video_enabled(&mut self, id: AvatarId, enabled: bool) -> bool {
        self.roster
            .get_mut(id)
            .map(|avatar| avatar.video_enabled = enabled)
            .is_some()
    }

    /// Teleport the controlled avatar to a clicked screen point.
    ///
    /// The camera jumps straight onto the new target instead of easing.
    pub fn click_to_move(&mut self, screen: Position) -> Position {
        let world = self.viewport.screen_to_world(screen);
        let destination = if world.is_finite() {
            self.config.world_bounds.clamp(world)
        } else {
            self.controlled_position()
        };
        if let Some(avatar) = self.roster.get_mut(self.controlled) {
            avatar.position = destination;
        }
        self.viewport.snap_to(
            destination,
            self.config.viewport_width,
            self.config.viewport_height,
        );
        self.refresh_presence();
        destination
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.viewport.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.viewport.zoom_out()
    }

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        self.viewport.set_zoom(zoom)
    }

    /// Resize the rendering surface. Non-positive sizes are ignored.
    pub fn resize_viewport(&mut self, width: f32, height: f32) -> bool {
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            warn!(width, height, "ignoring invalid viewport size");
            return false;
        }
        self.config.viewport_width = width;
        self.config.viewport_height = height;
        true
    }
}
