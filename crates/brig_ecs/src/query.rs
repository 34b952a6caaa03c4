//! Cached query result sets.
//!
//! A [`QueryCache`] holds the current members of one component shape (the set
//! of component kinds an entity must carry to match). Caches are compiled once
//! per distinct shape and maintained incrementally by the world as components
//! are attached and removed, so per-tick reads are a plain slice copy.

use brig_component::{ComponentId, Entity};

/// The incrementally-maintained member list for one query shape.
///
/// Members are kept in the order entities first satisfied the shape — not id
/// order. Consumers rely on the first member being the oldest match (the
/// `es[0]` singleton pattern), and an entity that stops matching and later
/// matches again re-enters at the back.
#[derive(Debug)]
pub struct QueryCache {
    /// Sorted, deduplicated component shape.
    shape: Vec<ComponentId>,
    /// Matching entities, in first-satisfied order.
    members: Vec<Entity>,
}

impl QueryCache {
    /// Create an empty cache for a shape. The shape must already be sorted
    /// and deduplicated (the world normalizes it).
    #[must_use]
    pub fn new(shape: Vec<ComponentId>) -> Self {
        debug_assert!(shape.windows(2).all(|w| w[0] < w[1]));
        Self {
            shape,
            members: Vec::new(),
        }
    }

    /// The normalized shape this cache tracks.
    #[must_use]
    pub fn shape(&self) -> &[ComponentId] {
        &self.shape
    }

    /// The current members, in first-satisfied order.
    #[must_use]
    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    /// Returns `true` if changes to this component kind can affect the cache.
    #[must_use]
    pub fn involves(&self, id: ComponentId) -> bool {
        self.shape.binary_search(&id).is_ok()
    }

    /// Returns `true` if the entity is currently a member.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.members.contains(&entity)
    }

    /// Append a newly-matching entity.
    pub fn push(&mut self, entity: Entity) {
        debug_assert!(!self.contains(entity));
        self.members.push(entity);
    }

    /// Drop an entity, preserving the order of the remaining members.
    pub fn remove(&mut self, entity: Entity) {
        if let Some(pos) = self.members.iter().position(|&e| e == entity) {
            self.members.remove(pos);
        }
    }
}
