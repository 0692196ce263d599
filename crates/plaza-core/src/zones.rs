//! Named rectangular zones and point-to-location resolution.

use crate::{Position, PresenceError};
use plaza_index::{Rect, point_in_rect, rects_overlap};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Label reported when the point lies in the water region.
pub const POND_LABEL: &str = "Pond Area";
/// Label reported when no zone contains the point.
pub const OUTDOOR_LABEL: &str = "Outdoor Area";

/// Semantic category of a zone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Meeting,
    Lounge,
    Desk,
    Game,
    Private,
    #[default]
    Outdoor,
}

/// A named region of the world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub kind: ZoneKind,
    pub bounds: Rect,
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Presentation hint only.
    #[serde(default)]
    pub private: bool,
}

impl Zone {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ZoneKind, bounds: Rect) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            bounds,
            capacity: None,
            private: false,
        }
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    #[must_use]
    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }
}

/// Zone layout for a session. Zones are tested in the order listed here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    pub zones: Vec<Zone>,
    /// Water region that overrides every zone match.
    #[serde(default)]
    pub water: Option<Rect>,
}

impl LayoutConfig {
    /// Stock office campus: six buildings plus the pond.
    #[must_use]
    pub fn default_office() -> Self {
        Self {
            zones: vec![
                Zone::new(
                    "main-office",
                    "Main Office",
                    ZoneKind::Desk,
                    Rect::new(500.0, 100.0, 300.0, 200.0),
                ),
                Zone::new(
                    "meeting-rooms",
                    "Meeting Rooms",
                    ZoneKind::Meeting,
                    Rect::new(850.0, 120.0, 200.0, 180.0),
                )
                .with_capacity(8),
                Zone::new(
                    "team-lounge",
                    "Team Lounge",
                    ZoneKind::Lounge,
                    Rect::new(200.0, 450.0, 250.0, 150.0),
                ),
                Zone::new(
                    "game-room",
                    "Game Room",
                    ZoneKind::Game,
                    Rect::new(500.0, 450.0, 200.0, 150.0),
                ),
                Zone::new(
                    "kitchen",
                    "Kitchen",
                    ZoneKind::Lounge,
                    Rect::new(750.0, 450.0, 150.0, 120.0),
                ),
                Zone::new(
                    "private-offices",
                    "Private Offices",
                    ZoneKind::Private,
                    Rect::new(200.0, 100.0, 200.0, 180.0),
                )
                .with_private(true),
            ],
            water: Some(Rect::new(50.0, 650.0, 180.0, 120.0)),
        }
    }

    /// Rejects degenerate rectangles and duplicate ids.
    pub fn validate(&self) -> Result<(), PresenceError> {
        let mut seen = HashSet::new();
        for zone in &self.zones {
            if !zone.bounds.is_well_formed() {
                return Err(PresenceError::InvalidZone {
                    id: zone.id.clone(),
                    reason: "bounds must be finite with positive width and height",
                });
            }
            if !seen.insert(zone.id.as_str()) {
                return Err(PresenceError::DuplicateZone(zone.id.clone()));
            }
        }
        if let Some(water) = &self.water
            && !water.is_well_formed()
        {
            return Err(PresenceError::InvalidZone {
                id: "water".to_string(),
                reason: "water bounds must be finite with positive width and height",
            });
        }
        Ok(())
    }
}

/// Result of resolving a point against the layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Location {
    /// Index into [`ZoneIndex::zones`].
    Zone(usize),
    Pond,
    #[default]
    Outdoor,
}

/// Immutable, validated zone list with first-match resolution.
#[derive(Debug, Clone)]
pub struct ZoneIndex {
    zones: Vec<Zone>,
    water: Option<Rect>,
}

impl ZoneIndex {
    /// Validate `layout` and build the index.
    pub fn from_layout(layout: LayoutConfig) -> Result<Self, PresenceError> {
        layout.validate()?;
        let index = Self {
            zones: layout.zones,
            water: layout.water,
        };
        for (a, b) in index.overlapping_pairs() {
            debug!(
                first = %index.zones[a].id,
                second = %index.zones[b].id,
                "zones overlap; earlier registration wins",
            );
        }
        Ok(index)
    }

    /// Resolve `point`: water first, then zones in registration order, else outdoor.
    #[must_use]
    pub fn resolve(&self, point: Position) -> Location {
        let p = point.as_tuple();
        if let Some(water) = &self.water
            && point_in_rect(p, water)
        {
            return Location::Pond;
        }
        self.zones
            .iter()
            .position(|zone| point_in_rect(p, &zone.bounds))
            .map_or(Location::Outdoor, Location::Zone)
    }

    /// Human-readable label for a resolved location.
    #[must_use]
    pub fn label(&self, location: Location) -> &str {
        match location {
            Location::Zone(idx) => self
                .zones
                .get(idx)
                .map_or(OUTDOOR_LABEL, |zone| zone.name.as_str()),
            Location::Pond => POND_LABEL,
            Location::Outdoor => OUTDOOR_LABEL,
        }
    }

    /// Zone kind for a resolved location; the pond counts as outdoor.
    #[must_use]
    pub fn kind(&self, location: Location) -> ZoneKind {
        match location {
            Location::Zone(idx) => self.zones.get(idx).map_or(ZoneKind::Outdoor, |zone| zone.kind),
            Location::Pond | Location::Outdoor => ZoneKind::Outdoor,
        }
    }

    /// The zone behind a location, if any.
    #[must_use]
    pub fn zone(&self, location: Location) -> Option<&Zone> {
        match location {
            Location::Zone(idx) => self.zones.get(idx),
            Location::Pond | Location::Outdoor => None,
        }
    }

    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    #[must_use]
    pub fn water(&self) -> Option<&Rect> {
        self.water.as_ref()
    }

    /// Pairs of zone indices whose rectangles overlap, in registration order.
    #[must_use]
    pub fn overlapping_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, a) in self.zones.iter().enumerate() {
            for (j, b) in self.zones.iter().enumerate().skip(i + 1) {
                if rects_overlap(&a.bounds, &b.bounds) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office() -> ZoneIndex {
        ZoneIndex::from_layout(LayoutConfig::default_office()).expect("office layout")
    }

    #[test]
    fn resolves_main_office_scenario() {
        let layout = LayoutConfig {
            zones: vec![Zone::new(
                "main-office",
                "Main Office",
                ZoneKind::Desk,
                Rect::new(500.0, 100.0, 300.0, 200.0),
            )],
            water: None,
        };
        let index = ZoneIndex::from_layout(layout).expect("layout");
        let outside = index.resolve(Position::new(400.0, 300.0));
        assert_eq!(outside, Location::Outdoor);
        assert_eq!(index.label(outside), OUTDOOR_LABEL);

        let inside = index.resolve(Position::new(600.0, 200.0));
        assert_eq!(inside, Location::Zone(0));
        assert_eq!(index.label(inside), "Main Office");
        assert_eq!(index.kind(inside), ZoneKind::Desk);
    }

    #[test]
    fn doorway_edges_count_as_inside() {
        let index = office();
        assert_eq!(index.resolve(Position::new(600.0, 300.0)), Location::Zone(0));
        assert_eq!(index.resolve(Position::new(500.0, 100.0)), Location::Zone(0));
    }

    #[test]
    fn first_registered_zone_wins_overlaps() {
        let layout = LayoutConfig {
            zones: vec![
                Zone::new("a", "First", ZoneKind::Meeting, Rect::new(0.0, 0.0, 100.0, 100.0)),
                Zone::new("b", "Second", ZoneKind::Lounge, Rect::new(50.0, 50.0, 100.0, 100.0)),
            ],
            water: None,
        };
        let index = ZoneIndex::from_layout(layout).expect("layout");
        assert_eq!(index.resolve(Position::new(75.0, 75.0)), Location::Zone(0));
        assert_eq!(index.resolve(Position::new(125.0, 125.0)), Location::Zone(1));
        assert_eq!(index.overlapping_pairs(), vec![(0, 1)]);
    }

    #[test]
    fn water_overrides_zone_matches() {
        let layout = LayoutConfig {
            zones: vec![Zone::new(
                "boathouse",
                "Boathouse",
                ZoneKind::Lounge,
                Rect::new(0.0, 600.0, 300.0, 200.0),
            )],
            water: Some(Rect::new(50.0, 650.0, 180.0, 120.0)),
        };
        let index = ZoneIndex::from_layout(layout).expect("layout");
        let pond = index.resolve(Position::new(100.0, 700.0));
        assert_eq!(pond, Location::Pond);
        assert_eq!(index.label(pond), POND_LABEL);
        assert_eq!(index.kind(pond), ZoneKind::Outdoor);
        assert!(index.zone(pond).is_none());
        assert_eq!(index.resolve(Position::new(10.0, 610.0)), Location::Zone(0));
    }

    #[test]
    fn default_office_has_no_overlaps() {
        let index = office();
        assert_eq!(index.zones().len(), 6);
        assert!(index.overlapping_pairs().is_empty());
        assert_eq!(index.label(index.resolve(Position::new(150.0, 700.0))), POND_LABEL);
        assert_eq!(index.label(index.resolve(Position::new(900.0, 200.0))), "Meeting Rooms");
    }

    #[test]
    fn validation_rejects_degenerate_and_duplicate_zones() {
        let degenerate = LayoutConfig {
            zones: vec![Zone::new("flat", "Flat", ZoneKind::Desk, Rect::new(0.0, 0.0, 10.0, 0.0))],
            water: None,
        };
        assert!(matches!(
            ZoneIndex::from_layout(degenerate),
            Err(PresenceError::InvalidZone { .. })
        ));

        let duplicate = LayoutConfig {
            zones: vec![
                Zone::new("dup", "One", ZoneKind::Desk, Rect::new(0.0, 0.0, 10.0, 10.0)),
                Zone::new("dup", "Two", ZoneKind::Desk, Rect::new(20.0, 0.0, 10.0, 10.0)),
            ],
            water: None,
        };
        assert!(matches!(
            ZoneIndex::from_layout(duplicate),
            Err(PresenceError::DuplicateZone(id)) if id == "dup"
        ));

        let bad_water = LayoutConfig {
            zones: Vec::new(),
            water: Some(Rect::new(0.0, 0.0, -1.0, 5.0)),
        };
        assert!(bad_water.validate().is_err());
    }

    #[test]
    fn layout_parses_from_json() {
        let json = r#"{
            "zones": [
                { "id": "z", "name": "Zed", "kind": "game",
                  "bounds": { "x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0 } }
            ]
        }"#;
        let layout: LayoutConfig = serde_json::from_str(json).expect("parse layout");
        assert_eq!(layout.zones[0].kind, ZoneKind::Game);
        assert_eq!(layout.zones[0].capacity, None);
        assert!(layout.water.is_none());
    }
}
