//! # brig_ecs
//!
//! The ECS world: entity/component/resource storage, incrementally-maintained
//! queries, the phase-ordered system scheduler, and the eager/lazy init hooks.
//!
//! Everything hangs off an explicit [`World`] value that the host constructs
//! once and passes to each subsystem's registration function — there is no
//! process-global state, so independent worlds can coexist in tests.
//!
//! ## Per-tick model
//!
//! [`World::run_tick`] is synchronous and single-threaded. Each tick:
//!
//! 1. The activation pass polls lazy-init futures, publishes any that
//!    completed, and fires newly satisfiable eager-init records to a fixed
//!    point.
//! 2. Systems execute in [`Phase`] order; within a phase, registration order
//!    refined by before/after constraints (topologically sorted, memoized
//!    until the system or constraint set changes).
//! 3. A system missing a required resource is skipped for the tick — the
//!    normal state while async setup is still in flight, not an error.
//!
//! Asynchrony exists only at setup time: [`World::when_resources`] and the
//! lazy-init machinery. A system callback never yields.

pub mod error;
pub mod graph;
pub mod init;
pub mod query;
pub mod schedule;
pub mod world;

pub use error::EcsError;
pub use graph::DepGraph;
pub use init::ResourceWait;
pub use query::QueryCache;
pub use schedule::{Phase, SystemFn, SystemRecord};
pub use world::{EntityView, World};
