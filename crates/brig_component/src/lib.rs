//! # brig_component
//!
//! The "C" in ECS — entity identifiers, component/resource definitions, and
//! the serializer-pair side table used by the networking layer.
//!
//! This crate provides:
//!
//! - [`Entity`] — lightweight `u64` entity identifiers.
//! - [`EntityAllocator`] — monotonically increasing id allocation from named,
//!   non-overlapping ranges (local vs. network-assigned).
//! - [`ComponentDef`] / [`ResourceDef`] — typed, `Copy` definition handles.
//! - [`DefTable`] — the name/id registry keeping `name -> id` bijective.
//! - [`SerializerTable`] — component-id keyed (serialize, deserialize) pairs.

pub mod def;
pub mod entity;
pub mod serial;

pub use def::{ComponentDef, ComponentId, DefError, DefKind, DefMeta, DefTable, ResourceDef, ResourceId};
pub use entity::{Entity, EntityAllocator, IdRangeError, LOCAL_RANGE};
pub use serial::{SerializerPair, SerializerTable};
