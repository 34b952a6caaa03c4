//! Component and resource definitions.
//!
//! Every kind of data the ECS can store is registered once, by name, and the
//! registration returns a typed, `Copy` handle ([`ComponentDef`] /
//! [`ResourceDef`]) that every call site uses from then on. The handle carries
//! the constructor (and, for updatable components, the merge function) as
//! plain function pointers, so attaching and updating goes through the def's
//! fixed argument type with no runtime name dispatch.
//!
//! Component and resource definitions share one id counter and one name
//! namespace: `name -> id` and `id -> def` stay bijective across both kinds
//! for the lifetime of the registry.

use std::any::TypeId;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A unique identifier for a registered component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

/// A unique identifier for a registered resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

/// Whether a definition names a per-entity component or a global resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    /// Attached to entities, many instances.
    Component,
    /// Global singleton, at most one instance.
    Resource,
}

/// Error raised when a definition name is registered twice.
#[derive(Debug, Error)]
pub enum DefError {
    /// The name is already bound to a component or resource definition.
    #[error("definition name '{0}' is already registered")]
    DuplicateName(&'static str),
}

/// The registry-side record for one definition.
#[derive(Debug, Clone)]
pub struct DefMeta {
    /// The definition's numeric id (shared counter across both kinds).
    pub id: u32,
    /// The unique definition name.
    pub name: &'static str,
    /// Component or resource.
    pub kind: DefKind,
    /// Whether ensure-on-existing merges arguments (components only).
    pub updatable: bool,
    /// The Rust payload type, kept for diagnostics.
    pub type_id: TypeId,
}

/// Name/id registry for component and resource definitions.
///
/// Ids are indices into the meta list, so `id -> def` lookup is a slice index
/// and bijectivity with `name -> id` is structural.
#[derive(Debug, Default)]
pub struct DefTable {
    by_name: HashMap<&'static str, u32>,
    metas: Vec<DefMeta>,
}

impl DefTable {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition and return its fresh id.
    ///
    /// # Errors
    ///
    /// Fails if the name is already registered (for either kind).
    pub fn register(
        &mut self,
        name: &'static str,
        kind: DefKind,
        updatable: bool,
        type_id: TypeId,
    ) -> Result<u32, DefError> {
        if self.by_name.contains_key(name) {
            return Err(DefError::DuplicateName(name));
        }
        let id = self.metas.len() as u32;
        self.by_name.insert(name, id);
        self.metas.push(DefMeta {
            id,
            name,
            kind,
            updatable,
            type_id,
        });
        Ok(id)
    }

    /// Look up a definition by id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&DefMeta> {
        self.metas.get(id as usize)
    }

    /// Look up a definition by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&DefMeta> {
        self.by_name.get(name).map(|&id| &self.metas[id as usize])
    }

    /// Returns the number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    /// Returns `true` if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

/// A typed handle to a registered component kind.
///
/// `T` is the stored payload type; `A` is the single argument type consumed by
/// the constructor and (for updatable defs) the merge function. Handles are
/// `Copy` and are normally created through the world's `define_component`
/// family, never directly.
pub struct ComponentDef<T: 'static, A: 'static = ()> {
    id: ComponentId,
    name: &'static str,
    ctor: fn(A) -> T,
    update: Option<fn(&mut T, A)>,
}

impl<T: 'static, A: 'static> ComponentDef<T, A> {
    /// Assemble a handle from registry-assigned parts.
    #[must_use]
    pub fn new(
        id: ComponentId,
        name: &'static str,
        ctor: fn(A) -> T,
        update: Option<fn(&mut T, A)>,
    ) -> Self {
        Self {
            id,
            name,
            ctor,
            update,
        }
    }

    /// The component id this handle refers to.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// The registered definition name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The constructor producing a payload from the def's argument type.
    #[must_use]
    pub fn ctor(&self) -> fn(A) -> T {
        self.ctor
    }

    /// The merge function, if this def is updatable.
    #[must_use]
    pub fn update_fn(&self) -> Option<fn(&mut T, A)> {
        self.update
    }

    /// Returns `true` if ensure-on-existing merges new arguments.
    #[must_use]
    pub fn is_updatable(&self) -> bool {
        self.update.is_some()
    }
}

impl<T: 'static, A: 'static> Clone for ComponentDef<T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static, A: 'static> Copy for ComponentDef<T, A> {}

impl<T: 'static, A: 'static> std::fmt::Debug for ComponentDef<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("updatable", &self.is_updatable())
            .finish()
    }
}

/// A typed handle to a registered resource kind.
///
/// Like [`ComponentDef`], but for global singletons: there is no update
/// function because a resource is created once and mutated in place through
/// the world's accessors.
pub struct ResourceDef<T: 'static, A: 'static = ()> {
    id: ResourceId,
    name: &'static str,
    ctor: fn(A) -> T,
}

impl<T: 'static, A: 'static> ResourceDef<T, A> {
    /// Assemble a handle from registry-assigned parts.
    #[must_use]
    pub fn new(id: ResourceId, name: &'static str, ctor: fn(A) -> T) -> Self {
        Self { id, name, ctor }
    }

    /// The resource id this handle refers to.
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// The registered definition name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The constructor producing the singleton value.
    #[must_use]
    pub fn ctor(&self) -> fn(A) -> T {
        self.ctor
    }
}

impl<T: 'static, A: 'static> Clone for ResourceDef<T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static, A: 'static> Copy for ResourceDef<T, A> {}

impl<T: 'static, A: 'static> std::fmt::Debug for ResourceDef<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDef")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
