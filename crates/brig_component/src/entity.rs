//! Entity type and range-based id allocation.
//!
//! An [`Entity`] is a lightweight `u64` identifier with no inherent data.
//! Ids are handed out by an [`EntityAllocator`] from named, non-overlapping
//! ranges, so that entities authored locally and entities replicated from the
//! network can never collide.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A unique entity identifier.
///
/// Entities are pure identifiers — they carry no data of their own. Components
/// are attached to entities to give them meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    /// The "no entity" sentinel. Never allocated; used for unset references.
    pub const NONE: Entity = Entity(0);

    /// Create an entity from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is a valid (non-zero) entity.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Errors from defining or selecting entity id ranges.
#[derive(Debug, Error)]
pub enum IdRangeError {
    /// The range name is already taken.
    #[error("id range '{0}' is already defined")]
    DuplicateRange(String),

    /// No range with the given name exists.
    #[error("unknown id range '{0}'")]
    UnknownRange(String),

    /// The range bounds are unusable (zero start, or start >= end).
    #[error("id range '{name}' is invalid: start {start} must be nonzero and below end {end}")]
    InvalidRange {
        /// The offending range name.
        name: String,
        /// Requested inclusive start.
        start: u64,
        /// Requested exclusive end.
        end: u64,
    },

    /// The range intersects one that is already defined.
    #[error("id range '{name}' [{start}, {end}) overlaps existing range '{other}'")]
    OverlappingRange {
        /// The offending range name.
        name: String,
        /// Requested inclusive start.
        start: u64,
        /// Requested exclusive end.
        end: u64,
        /// The name of the range it collides with.
        other: String,
    },
}

/// A named, half-open id range `[next, end)`.
#[derive(Debug, Clone)]
struct IdRange {
    name: &'static str,
    start: u64,
    next: u64,
    end: u64,
}

/// Allocates monotonically increasing entity ids from named ranges.
///
/// A `"local"` range starting at 1 exists by default. Hosts that replicate
/// entities from elsewhere define a second range (e.g. `"net"`) and switch the
/// active range before spawning replicated entities. Ids are never reused:
/// destroying an entity does not return its id to any range.
#[derive(Debug)]
pub struct EntityAllocator {
    ranges: Vec<IdRange>,
    active: usize,
}

/// The default id range name used by [`EntityAllocator::new`].
pub const LOCAL_RANGE: &str = "local";

impl EntityAllocator {
    /// Creates an allocator with a single `"local"` range starting at 1.
    /// Id 0 is reserved for [`Entity::NONE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            ranges: vec![IdRange {
                name: "local",
                start: 1,
                next: 1,
                end: 1 << 32,
            }],
            active: 0,
        }
    }

    /// Define a new id range `[start, end)`.
    ///
    /// # Errors
    ///
    /// Fails if the name is taken, the bounds are invalid (start must be
    /// nonzero and below end), or the range overlaps an existing one.
    pub fn define_range(
        &mut self,
        name: &'static str,
        start: u64,
        end: u64,
    ) -> Result<(), IdRangeError> {
        if self.ranges.iter().any(|r| r.name == name) {
            return Err(IdRangeError::DuplicateRange(name.to_string()));
        }
        if start == 0 || start >= end {
            return Err(IdRangeError::InvalidRange {
                name: name.to_string(),
                start,
                end,
            });
        }
        if let Some(other) = self.ranges.iter().find(|r| start < r.end && r.start < end) {
            return Err(IdRangeError::OverlappingRange {
                name: name.to_string(),
                start,
                end,
                other: other.name.to_string(),
            });
        }
        self.ranges.push(IdRange {
            name,
            start,
            next: start,
            end,
        });
        Ok(())
    }

    /// Select the range that subsequent [`EntityAllocator::allocate`] calls
    /// draw from.
    ///
    /// # Errors
    ///
    /// Fails if no range with the given name exists.
    pub fn set_active_range(&mut self, name: &str) -> Result<(), IdRangeError> {
        match self.ranges.iter().position(|r| r.name == name) {
            Some(idx) => {
                self.active = idx;
                Ok(())
            }
            None => Err(IdRangeError::UnknownRange(name.to_string())),
        }
    }

    /// Returns the name of the active range.
    #[must_use]
    pub fn active_range(&self) -> &'static str {
        self.ranges[self.active].name
    }

    /// Allocates a fresh entity id from the active range.
    ///
    /// # Panics
    ///
    /// Panics if the active range is exhausted.
    pub fn allocate(&mut self) -> Entity {
        let range = &mut self.ranges[self.active];
        assert!(
            range.next < range.end,
            "id range '{}' is exhausted at {}",
            range.name,
            range.end
        );
        let id = range.next;
        range.next += 1;
        Entity(id)
    }

    /// Returns the total number of ids allocated across all ranges.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.ranges.iter().map(|r| r.next - r.start).sum()
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
