//! Phases, system records, and ordering constraints.
//!
//! Systems are grouped into coarse [`Phase`] buckets that run in a fixed
//! sequence each tick. Within a phase, systems run in registration order
//! unless before/after constraints say otherwise; the world compiles the
//! constraints into a topological order and caches it until the system or
//! constraint set changes.

use brig_component::{ComponentId, Entity, ResourceId};

use crate::world::World;

/// The per-tick pipeline buckets, in execution order.
///
/// All systems in one phase run to completion before any system of the next
/// phase starts. The sequence models "read input, simulate, then render"
/// while letting independently-authored subsystems interleave correctly
/// without a hand-written call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Input sampling and host event intake.
    ReadInputs,
    /// Applying replicated state and queueing outgoing state.
    Network,
    /// Setup that simulation steps depend on (builders, spawn completion).
    PrePhysics,
    /// Physics integration and collision response.
    Physics,
    /// Player-facing gameplay logic.
    GamePlayers,
    /// World simulation (weather, AI, scripted behaviour).
    GameWorld,
    /// Reactions to this tick's simulation results.
    PostGameWorld,
    /// Sound triggering and mixing parameters.
    Audio,
    /// Camera placement and visibility preparation.
    PreRender,
    /// Producing renderable state for the draw pass.
    RenderPreDraw,
    /// Handing finished frame state to the renderer.
    RenderDraw,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ALL: [Phase; 11] = [
        Phase::ReadInputs,
        Phase::Network,
        Phase::PrePhysics,
        Phase::Physics,
        Phase::GamePlayers,
        Phase::GameWorld,
        Phase::PostGameWorld,
        Phase::Audio,
        Phase::PreRender,
        Phase::RenderPreDraw,
        Phase::RenderDraw,
    ];
}

/// Boxed per-tick system callback.
///
/// Receives the world and the entities matching the system's shape (empty for
/// resource-only systems). Mutations are visible immediately to systems that
/// run later in the same tick.
pub type SystemFn = Box<dyn FnMut(&mut World, &[Entity])>;

/// One registered system.
#[derive(Debug)]
pub struct SystemRecord {
    /// Unique system name.
    pub name: String,
    /// The phase bucket this system runs in.
    pub phase: Phase,
    /// Required component shape, or `None` for a once-per-tick
    /// resource-driven system.
    pub shape: Option<Vec<ComponentId>>,
    /// Resources that must exist before the callback runs; the system is
    /// skipped for the tick while any is missing.
    pub resources: Vec<ResourceId>,
    /// The callback. Taken out while running so the world stays borrowable.
    pub(crate) callback: Option<CallbackSlot>,
    /// Index of the compiled query cache, if the system has a shape.
    pub(crate) query: Option<usize>,
}

pub(crate) struct CallbackSlot(pub(crate) SystemFn);

impl std::fmt::Debug for CallbackSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSlot").finish_non_exhaustive()
    }
}

/// A "`before` must run before `after`" constraint between two system names.
#[derive(Debug, Clone)]
pub struct OrderConstraint {
    /// The system that must run first.
    pub before: String,
    /// The system that must run later.
    pub after: String,
}
