//! Serializer pair side table.
//!
//! The networking layer registers a (serialize, deserialize) pair per
//! networked component kind. The core stores the pairs and hands them back on
//! lookup; it never invokes them itself.

use std::any::Any;
use std::collections::HashMap;

use crate::def::ComponentId;

/// A type-erased (serialize, deserialize) pair for one component kind.
///
/// `serialize` appends the component's wire form to the buffer; `deserialize`
/// patches an existing component instance from the given bytes. Both sides
/// panic if handed a value of the wrong type — the typed registration wrapper
/// guarantees that cannot happen through the public API.
pub struct SerializerPair {
    /// Encode the component into the buffer.
    pub serialize: Box<dyn Fn(&dyn Any, &mut Vec<u8>)>,
    /// Decode bytes into the component in place.
    pub deserialize: Box<dyn Fn(&mut dyn Any, &[u8])>,
}

impl std::fmt::Debug for SerializerPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerPair").finish_non_exhaustive()
    }
}

/// Lookup table mapping component ids to their serializer pairs.
#[derive(Debug, Default)]
pub struct SerializerTable {
    pairs: HashMap<ComponentId, SerializerPair>,
}

impl SerializerTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a pair is registered for the component.
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.pairs.contains_key(&id)
    }

    /// Store a pair. The caller is responsible for rejecting duplicates first.
    pub fn insert(&mut self, id: ComponentId, pair: SerializerPair) {
        self.pairs.insert(id, pair);
    }

    /// Look up the pair for a component id.
    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<&SerializerPair> {
        self.pairs.get(&id)
    }

    /// Returns the number of registered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if no pairs are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
