//! One-shot init hooks and resource readiness futures.
//!
//! Subsystems register "run this once, when its prerequisites first exist"
//! logic here instead of being enumerated by a central bootstrap function.
//! The world scans these records at the start of every tick (the activation
//! pass) and retires each one after it fires.
//!
//! Asynchrony lives exclusively at this setup layer: lazy-init futures are
//! re-polled once per tick until ready, and [`ResourceWait`] resolves when the
//! world publishes the last awaited resource. Per-tick system callbacks are
//! always synchronous.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use futures::future::LocalBoxFuture;

use brig_component::{ComponentId, ResourceId};

use crate::world::World;

/// A pending one-shot setup action, keyed by its trigger sets.
///
/// Satisfiable when every trigger component has at least one live instance in
/// the world, every trigger resource is present, and every named system is
/// registered. The callback runs synchronously, exactly once, and typically
/// registers systems itself.
pub struct EagerInit {
    /// Component kinds that must exist on some entity.
    pub components: Vec<ComponentId>,
    /// Resources that must be present.
    pub resources: Vec<ResourceId>,
    /// Systems that must be registered.
    pub systems: Vec<String>,
    /// `Some` while pending; taken when fired, so a record can never fire
    /// twice.
    pub(crate) callback: Option<Box<dyn FnOnce(&mut World)>>,
}

impl std::fmt::Debug for EagerInit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EagerInit")
            .field("components", &self.components)
            .field("resources", &self.resources)
            .field("systems", &self.systems)
            .field("pending", &self.callback.is_some())
            .finish()
    }
}

/// Type-erased future produced by a triggered lazy init.
pub(crate) type LazyFuture = LocalBoxFuture<'static, Box<dyn Any>>;

/// Lifecycle of a lazy init record: watching triggers, future in flight, or
/// retired. There is no transition back to `Pending`.
pub(crate) enum LazyState {
    /// Waiting for the required resources; holds the starter closure.
    Pending(Box<dyn FnOnce(&mut World) -> LazyFuture>),
    /// Triggered; the future is polled once per tick until ready.
    Running(LazyFuture),
    /// Finished and published; the record is dropped at the end of the pass.
    Done,
}

/// An asynchronous one-shot producer for a single resource.
///
/// Once the required resources exist, the starter closure runs synchronously
/// (reading or cloning its inputs out of the world) and returns a `'static`
/// future. When that future completes, the world publishes its output under
/// `provides`, waking any [`ResourceWait`] on it.
pub struct LazyInit {
    /// Resources that must exist before the starter runs.
    pub requires: Vec<ResourceId>,
    /// The resource this record publishes on completion.
    pub provides: ResourceId,
    /// The provided resource's name, for logs and double-publish messages.
    pub provides_name: &'static str,
    pub(crate) state: LazyState,
}

impl std::fmt::Debug for LazyInit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            LazyState::Pending(_) => "pending",
            LazyState::Running(_) => "running",
            LazyState::Done => "done",
        };
        f.debug_struct("LazyInit")
            .field("requires", &self.requires)
            .field("provides", &self.provides)
            .field("provides_name", &self.provides_name)
            .field("state", &state)
            .finish()
    }
}

#[derive(Debug)]
pub(crate) struct WaitState {
    pub(crate) done: bool,
    pub(crate) waker: Option<Waker>,
}

/// A waiter registered by `World::when_resources`, completed by the world
/// when the last awaited resource is published.
#[derive(Debug)]
pub(crate) struct PendingWait {
    pub(crate) ids: Vec<ResourceId>,
    pub(crate) shared: Arc<Mutex<WaitState>>,
}

impl PendingWait {
    /// Mark the wait complete and wake its task, if any is parked.
    pub(crate) fn complete(&self) {
        let mut state = self.shared.lock().unwrap();
        state.done = true;
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }
}

/// Future returned by `World::when_resources`.
///
/// Resolves once every listed resource has been added to the world; after it
/// resolves, strict resource accessors for those resources are guaranteed to
/// succeed. The future holds no world borrow, so it can be awaited from any
/// task while the world keeps ticking.
#[derive(Debug)]
pub struct ResourceWait {
    pub(crate) shared: Arc<Mutex<WaitState>>,
}

impl Future for ResourceWait {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.shared.lock().unwrap();
        if state.done {
            Poll::Ready(())
        } else {
            state.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}
