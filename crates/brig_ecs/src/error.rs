//! World-level error types.

use thiserror::Error;

use brig_component::{DefError, IdRangeError};

/// Errors surfaced by world registration and scheduling.
///
/// All of these are startup-time programmer errors: the host is expected to
/// propagate them and fail fast rather than run with a partially-registered
/// world.
#[derive(Debug, Error)]
pub enum EcsError {
    /// A component/resource definition name was registered twice.
    #[error(transparent)]
    Def(#[from] DefError),

    /// An entity id range was misconfigured.
    #[error(transparent)]
    IdRange(#[from] IdRangeError),

    /// A system name was registered twice.
    #[error("system '{0}' is already registered")]
    DuplicateSystem(String),

    /// A serializer pair was registered twice for one component.
    #[error("serializer pair already registered for component '{0}'")]
    DuplicateSerializer(String),

    /// The before/after constraints admit no valid execution order.
    #[error("system ordering cycle: {}", .0.join(" -> "))]
    SchedulingCycle(Vec<String>),
}
