//! Avatar records and the join-ordered roster that owns them.

use crate::Position;
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap, new_key_type};

new_key_type! {
    /// Stable handle for avatars backed by a generational slot map.
    pub struct AvatarId;
}

/// Convenience alias for associating side data with avatars.
pub type AvatarMap<T> = SecondaryMap<AvatarId, T>;

/// A session participant's body in the shared space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Avatar {
    pub name: String,
    pub position: Position,
    /// Offline avatars are skipped by every spatial query.
    pub online: bool,
    /// Owned by the call subsystem; read for conversation indicators.
    pub talking: bool,
    /// Presentation-only, passed through untouched.
    pub video_enabled: bool,
}

impl Avatar {
    /// Creates an online, silent avatar with video disabled.
    #[must_use]
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            online: true,
            talking: false,
            video_enabled: false,
        }
    }

    #[must_use]
    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    #[must_use]
    pub fn with_talking(mut self, talking: bool) -> Self {
        self.talking = talking;
        self
    }

    #[must_use]
    pub fn with_video(mut self, video_enabled: bool) -> Self {
        self.video_enabled = video_enabled;
        self
    }
}

/// Dense avatar storage keyed by generational handles.
///
/// Iteration follows join order, and removals keep the relative order of the
/// remaining avatars.
#[derive(Debug, Clone)]
pub struct AvatarRoster {
    slots: SlotMap<AvatarId, usize>,
    handles: Vec<AvatarId>,
    avatars: Vec<Avatar>,
}

impl Default for AvatarRoster {
    fn default() -> Self {
        Self::new()
    }
}

impl AvatarRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            handles: Vec::new(),
            avatars: Vec::new(),
        }
    }

    /// Number of avatars, online or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.avatars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.avatars.is_empty()
    }

    /// Returns true if `id` refers to a live avatar.
    #[must_use]
    pub fn contains(&self, id: AvatarId) -> bool {
        self.slots.contains_key(id)
    }

    /// Insert a new avatar at the end of the join order and return its handle.
    pub fn insert(&mut self, avatar: Avatar) -> AvatarId {
        let index = self.avatars.len();
        self.avatars.push(avatar);
        let id = self.slots.insert(index);
        self.handles.push(id);
        id
    }

    /// Remove `id`, shifting later avatars down so join order is preserved.
    pub fn remove(&mut self, id: AvatarId) -> Option<Avatar> {
        let index = self.slots.remove(id)?;
        let removed = self.avatars.remove(index);
        let removed_handle = self.handles.remove(index);
        debug_assert_eq!(removed_handle, id);
        for (offset, handle) in self.handles[index..].iter().enumerate() {
            if let Some(slot) = self.slots.get_mut(*handle) {
                *slot = index + offset;
            }
        }
        Some(removed)
    }

    #[must_use]
    pub fn get(&self, id: AvatarId) -> Option<&Avatar> {
        let index = *self.slots.get(id)?;
        self.avatars.get(index)
    }

    #[must_use]
    pub fn get_mut(&mut self, id: AvatarId) -> Option<&mut Avatar> {
        let index = *self.slots.get(id)?;
        self.avatars.get_mut(index)
    }

    /// Iterate over `(handle, avatar)` pairs in join order.
    pub fn iter(&self) -> impl Iterator<Item = (AvatarId, &Avatar)> + '_ {
        self.handles.iter().copied().zip(self.avatars.iter())
    }

    /// Iterate over online avatars only, in join order.
    pub fn iter_online(&self) -> impl Iterator<Item = (AvatarId, &Avatar)> + '_ {
        self.iter().filter(|(_, avatar)| avatar.online)
    }

    /// Iterate over avatar handles in join order.
    pub fn iter_handles(&self) -> impl Iterator<Item = AvatarId> + '_ {
        self.handles.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(seed: u32) -> Avatar {
        Avatar::new(format!("avatar-{seed}"), Position::new(seed as f32, seed as f32 + 1.0))
    }

    #[test]
    fn insert_allocates_unique_handles() {
        let mut roster = AvatarRoster::new();
        let a = roster.insert(sample(0));
        let b = roster.insert(sample(1));
        assert_ne!(a, b);
        assert_eq!(roster.len(), 2);
        assert!(roster.contains(a));
        assert_eq!(roster.get(b).map(|avatar| avatar.name.as_str()), Some("avatar-1"));
    }

    #[test]
    fn remove_preserves_join_order() {
        let mut roster = AvatarRoster::new();
        let a = roster.insert(sample(0));
        let b = roster.insert(sample(1));
        let c = roster.insert(sample(2));
        let d = roster.insert(sample(3));

        let removed = roster.remove(b).expect("avatar removed");
        assert_eq!(removed.name, "avatar-1");
        assert!(!roster.contains(b));
        assert!(roster.get(b).is_none());
        assert_eq!(roster.iter_handles().collect::<Vec<_>>(), vec![a, c, d]);
        assert_eq!(
            roster.get(d).map(|avatar| avatar.position),
            Some(Position::new(3.0, 4.0))
        );

        let e = roster.insert(sample(4));
        assert_ne!(b, e, "generational handles should not be reused immediately");
        assert!(roster.remove(b).is_none());
    }

    #[test]
    fn online_filter_skips_offline_avatars() {
        let mut roster = AvatarRoster::new();
        let a = roster.insert(sample(0));
        roster.insert(sample(1).with_online(false));
        let c = roster.insert(sample(2));
        let online: Vec<_> = roster.iter_online().map(|(id, _)| id).collect();
        assert_eq!(online, vec![a, c]);
    }

    #[test]
    fn builder_flags() {
        let avatar = sample(7).with_talking(true).with_video(true);
        assert!(avatar.online);
        assert!(avatar.talking);
        assert!(avatar.video_enabled);
    }
}
