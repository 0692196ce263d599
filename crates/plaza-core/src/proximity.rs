//! Nearby-avatar computation for the controlled avatar.

use crate::{Avatar, AvatarId, AvatarMap, Position, PresenceError, ProximityIndexKind};
use ordered_float::OrderedFloat;
use plaza_index::{LinearScanIndex, NeighborhoodIndex, UniformGridIndex};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Ordering applied to the nearby list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProximityOrder {
    /// Roster iteration order, unsorted.
    #[default]
    Input,
    /// Ascending distance; equal distances keep roster order.
    Distance,
}

/// Avatars within the proximity radius of the controlled avatar, recomputed each tick.
#[derive(Debug, Clone, Default)]
pub struct ProximityResult {
    nearby: Vec<AvatarId>,
    distances: AvatarMap<f32>,
}

impl ProximityResult {
    /// Nearby avatar ids in the configured order.
    #[must_use]
    pub fn nearby(&self) -> &[AvatarId] {
        &self.nearby
    }

    /// Whether `id` is close enough to hold a conversation. Unknown ids are `false`.
    #[must_use]
    pub fn in_conversation_range(&self, id: AvatarId) -> bool {
        self.distances.contains_key(id)
    }

    /// Distance recorded for a nearby avatar.
    #[must_use]
    pub fn distance_to(&self, id: AvatarId) -> Option<f32> {
        self.distances.get(id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nearby.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nearby.is_empty()
    }

    /// Drop `id` from the result, e.g. after it left the session mid-tick.
    pub fn forget(&mut self, id: AvatarId) {
        if self.distances.remove(id).is_some() {
            self.nearby.retain(|&other| other != id);
        }
    }
}

/// Runs proximity scans through a pluggable neighbourhood index.
pub struct ProximityEngine {
    index: Box<dyn NeighborhoodIndex + Send>,
    order: ProximityOrder,
    ids: Vec<AvatarId>,
    positions: Vec<(f32, f32)>,
}

impl std::fmt::Debug for ProximityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProximityEngine")
            .field("order", &self.order)
            .field("indexed", &self.index.len())
            .finish()
    }
}

impl Default for ProximityEngine {
    fn default() -> Self {
        Self {
            index: Box::new(LinearScanIndex::new()),
            order: ProximityOrder::Input,
            ids: Vec::new(),
            positions: Vec::new(),
        }
    }
}

impl ProximityEngine {
    /// Build an engine backed by the requested index.
    pub fn new(kind: ProximityIndexKind, order: ProximityOrder) -> Result<Self, PresenceError> {
        let index: Box<dyn NeighborhoodIndex + Send> = match kind {
            ProximityIndexKind::Linear => Box::new(LinearScanIndex::new()),
            ProximityIndexKind::Grid { cell_size } => {
                Box::new(UniformGridIndex::try_new(cell_size)?)
            }
        };
        Ok(Self {
            index,
            order,
            ids: Vec::new(),
            positions: Vec::new(),
        })
    }

    #[must_use]
    pub fn order(&self) -> ProximityOrder {
        self.order
    }

    /// Collect online avatars other than `controlled` within `radius` of `origin`.
    pub fn compute_nearby<'a, I>(
        &mut self,
        controlled: AvatarId,
        origin: Position,
        others: I,
        radius: f32,
    ) -> ProximityResult
    where
        I: IntoIterator<Item = (AvatarId, &'a Avatar)>,
    {
        self.ids.clear();
        self.positions.clear();
        for (id, avatar) in others {
            if id == controlled || !avatar.online {
                continue;
            }
            self.ids.push(id);
            self.positions.push(avatar.position.as_tuple());
        }

        let mut result = ProximityResult::default();
        if let Err(err) = self.index.rebuild(&self.positions) {
            warn!(%err, "proximity index rebuild failed; reporting no nearby avatars");
            return result;
        }

        let mut hits: Vec<(usize, OrderedFloat<f32>)> = Vec::new();
        self.index
            .neighbors_within(origin.as_tuple(), radius, &mut |idx, dist| {
                hits.push((idx, dist))
            });
        if self.order == ProximityOrder::Distance {
            // Stable sort keeps roster order among equal distances.
            hits.sort_by_key(|&(_, dist)| dist);
        }

        result.nearby.reserve(hits.len());
        for (idx, dist) in hits {
            let id = self.ids[idx];
            result.nearby.push(id);
            result.distances.insert(id, dist.into_inner());
        }
        result
    }
}

/// One-shot linear scan in roster order.
pub fn compute_nearby<'a, I>(
    controlled: AvatarId,
    origin: Position,
    others: I,
    radius: f32,
) -> ProximityResult
where
    I: IntoIterator<Item = (AvatarId, &'a Avatar)>,
{
    ProximityEngine::default().compute_nearby(controlled, origin, others, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AvatarRoster;

    fn roster_with(positions: &[(f32, f32, bool)]) -> (AvatarRoster, AvatarId, Vec<AvatarId>) {
        let mut roster = AvatarRoster::new();
        let me = roster.insert(Avatar::new("me", Position::new(400.0, 300.0)));
        let ids = positions
            .iter()
            .enumerate()
            .map(|(i, &(x, y, online))| {
                roster.insert(Avatar::new(format!("other-{i}"), Position::new(x, y)).with_online(online))
            })
            .collect();
        (roster, me, ids)
    }

    #[test]
    fn boundary_distance_is_included() {
        // 36-48-60 triangle: exactly 60 units away.
        let (roster, me, ids) = roster_with(&[(436.0, 348.0, true), (460.01, 300.0, true)]);
        let result = compute_nearby(me, Position::new(400.0, 300.0), roster.iter(), 60.0);
        assert_eq!(result.nearby(), &[ids[0]]);
        assert!(result.in_conversation_range(ids[0]));
        assert!(!result.in_conversation_range(ids[1]));
        assert_eq!(result.distance_to(ids[0]), Some(60.0));
    }

    #[test]
    fn offline_and_controlled_avatars_are_skipped() {
        let (roster, me, ids) = roster_with(&[(410.0, 300.0, false), (420.0, 300.0, true)]);
        let result = compute_nearby(me, Position::new(400.0, 300.0), roster.iter(), 60.0);
        assert_eq!(result.nearby(), &[ids[1]]);
        assert!(!result.in_conversation_range(me));
        assert!(!result.in_conversation_range(ids[0]));
    }

    #[test]
    fn input_order_is_preserved_and_distance_order_is_opt_in() {
        let (roster, me, ids) = roster_with(&[
            (450.0, 300.0, true),
            (410.0, 300.0, true),
            (430.0, 300.0, true),
            (390.0, 300.0, true),
        ]);
        let origin = Position::new(400.0, 300.0);
        let by_input = compute_nearby(me, origin, roster.iter(), 60.0);
        assert_eq!(by_input.nearby(), &[ids[0], ids[1], ids[2], ids[3]]);

        let mut engine =
            ProximityEngine::new(ProximityIndexKind::Linear, ProximityOrder::Distance).expect("engine");
        let by_distance = engine.compute_nearby(me, origin, roster.iter(), 60.0);
        // ids[1] and ids[3] tie at 10 units; roster order breaks the tie.
        assert_eq!(by_distance.nearby(), &[ids[1], ids[3], ids[2], ids[0]]);
    }

    #[test]
    fn grid_backed_engine_matches_linear() {
        let (roster, me, _) = roster_with(&[
            (450.0, 320.0, true),
            (200.0, 200.0, true),
            (436.0, 348.0, true),
            (600.0, 150.0, false),
            (380.0, 250.0, true),
        ]);
        let origin = Position::new(400.0, 300.0);
        let linear = compute_nearby(me, origin, roster.iter(), 60.0);
        let mut grid = ProximityEngine::new(
            ProximityIndexKind::Grid { cell_size: 25.0 },
            ProximityOrder::Input,
        )
        .expect("grid engine");
        let gridded = grid.compute_nearby(me, origin, roster.iter(), 60.0);
        assert_eq!(linear.nearby(), gridded.nearby());
        assert_eq!(linear.len(), 3);
    }

    #[test]
    fn grid_engine_rejects_bad_cell_size() {
        let err = ProximityEngine::new(
            ProximityIndexKind::Grid { cell_size: 0.0 },
            ProximityOrder::Input,
        )
        .expect_err("zero cell size");
        assert!(matches!(err, PresenceError::Index(_)));
    }

    #[test]
    fn forget_removes_entry() {
        let (roster, me, ids) = roster_with(&[(410.0, 300.0, true), (420.0, 300.0, true)]);
        let mut result = compute_nearby(me, Position::new(400.0, 300.0), roster.iter(), 60.0);
        result.forget(ids[0]);
        assert_eq!(result.nearby(), &[ids[1]]);
        assert!(!result.in_conversation_range(ids[0]));
        assert!(!result.is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn membership_matches_distance_predicate(
                ox in 20.0f32..1_180.0,
                oy in 20.0f32..780.0,
                others in prop::collection::vec((0.0f32..1_200.0, 0.0f32..800.0), 0..24),
                radius in 1.0f32..200.0,
            ) {
                let mut roster = AvatarRoster::new();
                let origin = Position::new(ox, oy);
                let me = roster.insert(Avatar::new("me", origin));
                let ids: Vec<_> = others
                    .iter()
                    .map(|&(x, y)| roster.insert(Avatar::new("other", Position::new(x, y))))
                    .collect();

                let linear = compute_nearby(me, origin, roster.iter(), radius);
                let mut grid = ProximityEngine::new(
                    ProximityIndexKind::Grid { cell_size: 50.0 },
                    ProximityOrder::Input,
                )
                .expect("grid engine");
                let gridded = grid.compute_nearby(me, origin, roster.iter(), radius);

                for (&id, &(x, y)) in ids.iter().zip(&others) {
                    let inside = origin.distance_to(Position::new(x, y)) <= radius;
                    prop_assert_eq!(linear.in_conversation_range(id), inside);
                    prop_assert_eq!(gridded.in_conversation_range(id), inside);
                }
                prop_assert_eq!(linear.nearby(), gridded.nearby());
            }
        }
    }
}
