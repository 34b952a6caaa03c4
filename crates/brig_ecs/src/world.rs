//! The [`World`] — entity/component/resource storage, cached queries, the
//! phase scheduler, and the init hooks, behind one explicit value.
//!
//! The host constructs a `World` once and threads it through every
//! subsystem's registration function; nothing in this crate is process-global,
//! so tests can run any number of independent worlds.
//!
//! Per-tick execution is single-threaded and synchronous. [`World::run_tick`]
//! first runs the activation pass (lazy-init futures are polled, newly
//! satisfiable eager-init records fire to a fixed point), then executes every
//! registered system in phase order. A system whose required resources are
//! missing is skipped for the tick; everything else runs, and its mutations
//! are immediately visible to systems scheduled after it in the same tick.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tracing::{debug, info, trace, warn};

use brig_component::{
    ComponentDef, ComponentId, DefKind, DefTable, Entity, EntityAllocator, ResourceDef,
    ResourceId, SerializerPair, SerializerTable,
};

use crate::error::EcsError;
use crate::graph::DepGraph;
use crate::init::{EagerInit, LazyFuture, LazyInit, LazyState, PendingWait, ResourceWait, WaitState};
use crate::query::QueryCache;
use crate::schedule::{CallbackSlot, OrderConstraint, Phase, SystemRecord};

/// One live entity's component set, keyed by component id.
#[derive(Default)]
struct EntityRecord {
    components: HashMap<ComponentId, Box<dyn Any>>,
}

/// The ECS world: registry, storage, queries, scheduler, and init hooks.
pub struct World {
    defs: DefTable,
    allocator: EntityAllocator,
    entities: HashMap<Entity, EntityRecord>,
    /// Entity creation order; queries scan it so freshly-compiled caches are
    /// deterministic.
    spawn_order: Vec<Entity>,
    /// Live instance count per component kind, for eager-init triggers.
    component_counts: HashMap<ComponentId, usize>,
    resources: HashMap<ResourceId, Box<dyn Any>>,
    waiters: Vec<PendingWait>,
    queries: Vec<QueryCache>,
    serializers: SerializerTable,
    systems: Vec<SystemRecord>,
    system_names: HashMap<String, usize>,
    constraints: Vec<OrderConstraint>,
    /// Execution order memoized against `graph_version`.
    plan: Option<(u64, Vec<usize>)>,
    graph_version: u64,
    eager_inits: Vec<EagerInit>,
    lazy_inits: Vec<LazyInit>,
    tick: u64,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            defs: DefTable::new(),
            allocator: EntityAllocator::new(),
            entities: HashMap::new(),
            spawn_order: Vec::new(),
            component_counts: HashMap::new(),
            resources: HashMap::new(),
            waiters: Vec::new(),
            queries: Vec::new(),
            serializers: SerializerTable::new(),
            systems: Vec::new(),
            system_names: HashMap::new(),
            constraints: Vec::new(),
            plan: None,
            graph_version: 0,
            eager_inits: Vec::new(),
            lazy_inits: Vec::new(),
            tick: 0,
        }
    }

    // -- Definitions --

    /// Register an updatable component kind.
    ///
    /// `ctor` builds the component from the def's argument type; `update`
    /// merges fresh arguments into an existing instance when
    /// [`World::ensure_component_on`] finds the component already attached.
    ///
    /// # Errors
    ///
    /// Fails if the name is already registered.
    pub fn define_component<T: 'static, A: 'static>(
        &mut self,
        name: &'static str,
        ctor: fn(A) -> T,
        update: fn(&mut T, A),
    ) -> Result<ComponentDef<T, A>, EcsError> {
        let id = self
            .defs
            .register(name, DefKind::Component, true, TypeId::of::<T>())?;
        Ok(ComponentDef::new(ComponentId(id), name, ctor, Some(update)))
    }

    /// Register a write-once component kind: once attached, later ensure
    /// calls return the existing instance untouched.
    ///
    /// # Errors
    ///
    /// Fails if the name is already registered.
    pub fn define_nonupdatable_component<T: 'static, A: 'static>(
        &mut self,
        name: &'static str,
        ctor: fn(A) -> T,
    ) -> Result<ComponentDef<T, A>, EcsError> {
        let id = self
            .defs
            .register(name, DefKind::Component, false, TypeId::of::<T>())?;
        Ok(ComponentDef::new(ComponentId(id), name, ctor, None))
    }

    /// Register a singleton resource kind.
    ///
    /// # Errors
    ///
    /// Fails if the name is already registered.
    pub fn define_resource<T: 'static, A: 'static>(
        &mut self,
        name: &'static str,
        ctor: fn(A) -> T,
    ) -> Result<ResourceDef<T, A>, EcsError> {
        let id = self
            .defs
            .register(name, DefKind::Resource, false, TypeId::of::<T>())?;
        Ok(ResourceDef::new(ResourceId(id), name, ctor))
    }

    /// The name/id registry for all definitions.
    #[must_use]
    pub fn defs(&self) -> &DefTable {
        &self.defs
    }

    // -- Entity lifecycle --

    /// Define an entity id range `[start, end)` (e.g. `"net"` for
    /// network-assigned ids).
    ///
    /// # Errors
    ///
    /// Fails on name clashes, invalid bounds, or overlap with an existing
    /// range.
    pub fn define_id_range(
        &mut self,
        name: &'static str,
        start: u64,
        end: u64,
    ) -> Result<(), EcsError> {
        self.allocator.define_range(name, start, end)?;
        Ok(())
    }

    /// Select the id range used by subsequent [`World::spawn`] calls.
    ///
    /// # Errors
    ///
    /// Fails if no range with the given name exists.
    pub fn set_id_range(&mut self, name: &str) -> Result<(), EcsError> {
        self.allocator.set_active_range(name)?;
        Ok(())
    }

    /// Allocate a new entity with no components.
    pub fn spawn(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.entities.insert(entity, EntityRecord::default());
        self.spawn_order.push(entity);
        // An empty shape matches every entity, including brand-new ones.
        for cache in &mut self.queries {
            if cache.shape().is_empty() {
                cache.push(entity);
            }
        }
        trace!(%entity, "spawned");
        entity
    }

    /// Remove an entity and all its components.
    ///
    /// Returns `true` if the entity existed. Its id is never reused.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        let Some(record) = self.entities.remove(&entity) else {
            return false;
        };
        for id in record.components.keys() {
            if let Some(count) = self.component_counts.get_mut(id) {
                *count = count.saturating_sub(1);
            }
        }
        self.spawn_order.retain(|&e| e != entity);
        for cache in &mut self.queries {
            cache.remove(entity);
        }
        trace!(%entity, "despawned");
        true
    }

    /// Returns `true` if the entity exists.
    #[must_use]
    pub fn exists(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -- Components --

    /// Idempotently attach a component.
    ///
    /// If the entity lacks the component, it is constructed from `args` and
    /// attached. If it is already present, an updatable def merges `args`
    /// into the existing instance and a nonupdatable def returns it
    /// untouched. Many independent build systems can therefore converge on a
    /// fully-initialized entity over several ticks without duplicating work.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not exist.
    pub fn ensure_component_on<T: 'static, A: 'static>(
        &mut self,
        entity: Entity,
        def: ComponentDef<T, A>,
        args: A,
    ) -> &mut T {
        let id = def.id();
        let is_new = {
            let record = self
                .entities
                .get(&entity)
                .unwrap_or_else(|| panic!("{entity} does not exist"));
            !record.components.contains_key(&id)
        };
        if is_new {
            let value: Box<dyn Any> = Box::new((def.ctor())(args));
            self.entities
                .get_mut(&entity)
                .expect("entity checked above")
                .components
                .insert(id, value);
            *self.component_counts.entry(id).or_insert(0) += 1;
            self.queries_component_attached(entity, id);
        } else if let Some(update) = def.update_fn() {
            update(self.component_mut(entity, def), args);
        }
        self.component_mut(entity, def)
    }

    /// Detach a component.
    ///
    /// Returns `true` if it was present; absence (of the component or the
    /// entity) is a consistent no-op returning `false`.
    pub fn remove_component<T: 'static, A: 'static>(
        &mut self,
        entity: Entity,
        def: ComponentDef<T, A>,
    ) -> bool {
        let id = def.id();
        let Some(record) = self.entities.get_mut(&entity) else {
            return false;
        };
        if record.components.remove(&id).is_none() {
            return false;
        }
        if let Some(count) = self.component_counts.get_mut(&id) {
            *count = count.saturating_sub(1);
        }
        self.queries_component_removed(entity, id);
        true
    }

    /// Returns `true` if the entity carries the component.
    #[must_use]
    pub fn has_component<T: 'static, A: 'static>(
        &self,
        entity: Entity,
        def: ComponentDef<T, A>,
    ) -> bool {
        self.has_component_id(entity, def.id())
    }

    /// Id-keyed form of [`World::has_component`].
    #[must_use]
    pub fn has_component_id(&self, entity: Entity, id: ComponentId) -> bool {
        self.entities
            .get(&entity)
            .map_or(false, |r| r.components.contains_key(&id))
    }

    /// Strict component read.
    ///
    /// # Panics
    ///
    /// Panics if the entity or the component is missing — use
    /// [`World::component_opt`] for legitimately-optional lookups.
    #[must_use]
    pub fn component<T: 'static, A: 'static>(
        &self,
        entity: Entity,
        def: ComponentDef<T, A>,
    ) -> &T {
        match self.component_opt(entity, def) {
            Some(value) => value,
            None => panic!("{entity} has no component '{}'", def.name()),
        }
    }

    /// Strict mutable component access.
    ///
    /// # Panics
    ///
    /// Panics if the entity or the component is missing.
    pub fn component_mut<T: 'static, A: 'static>(
        &mut self,
        entity: Entity,
        def: ComponentDef<T, A>,
    ) -> &mut T {
        match self.component_opt_mut(entity, def) {
            Some(value) => value,
            None => panic!("{entity} has no component '{}'", def.name()),
        }
    }

    /// Optional component read.
    #[must_use]
    pub fn component_opt<T: 'static, A: 'static>(
        &self,
        entity: Entity,
        def: ComponentDef<T, A>,
    ) -> Option<&T> {
        self.entities
            .get(&entity)?
            .components
            .get(&def.id())?
            .downcast_ref::<T>()
    }

    /// Optional mutable component access.
    pub fn component_opt_mut<T: 'static, A: 'static>(
        &mut self,
        entity: Entity,
        def: ComponentDef<T, A>,
    ) -> Option<&mut T> {
        self.entities
            .get_mut(&entity)?
            .components
            .get_mut(&def.id())?
            .downcast_mut::<T>()
    }

    /// Look up an entity, asserting a component shape.
    ///
    /// Returns a view whose accessors are guaranteed to succeed for the
    /// requested components, or `None` if the entity does not exist or lacks
    /// any of them.
    #[must_use]
    pub fn find_entity(&self, entity: Entity, shape: &[ComponentId]) -> Option<EntityView<'_>> {
        let record = self.entities.get(&entity)?;
        if shape.iter().all(|id| record.components.contains_key(id)) {
            Some(EntityView {
                world: self,
                entity,
            })
        } else {
            None
        }
    }

    // -- Resources --

    /// Create the singleton instance of a resource.
    ///
    /// Wakes every pending [`World::when_resources`] waiter that this
    /// resource was the last missing input for.
    ///
    /// # Panics
    ///
    /// Panics if the resource already exists — a resource is a singleton.
    pub fn add_resource<T: 'static, A: 'static>(
        &mut self,
        def: ResourceDef<T, A>,
        args: A,
    ) -> &mut T {
        assert!(
            !self.resources.contains_key(&def.id()),
            "resource '{}' already exists",
            def.name()
        );
        self.resources
            .insert(def.id(), Box::new((def.ctor())(args)));
        debug!(resource = def.name(), "resource added");
        self.satisfy_waiters();
        self.resource_mut(def)
    }

    /// Strict resource read.
    ///
    /// # Panics
    ///
    /// Panics if the resource has not been added yet — systems that can run
    /// before that point should list the resource as a dependency instead.
    #[must_use]
    pub fn resource<T: 'static, A: 'static>(&self, def: ResourceDef<T, A>) -> &T {
        match self.try_resource(def) {
            Some(value) => value,
            None => panic!("resource '{}' is not available", def.name()),
        }
    }

    /// Strict mutable resource access.
    ///
    /// # Panics
    ///
    /// Panics if the resource has not been added yet.
    pub fn resource_mut<T: 'static, A: 'static>(&mut self, def: ResourceDef<T, A>) -> &mut T {
        match self.try_resource_mut(def) {
            Some(value) => value,
            None => panic!("resource '{}' is not available", def.name()),
        }
    }

    /// Optional resource read.
    #[must_use]
    pub fn try_resource<T: 'static, A: 'static>(&self, def: ResourceDef<T, A>) -> Option<&T> {
        self.resources.get(&def.id())?.downcast_ref::<T>()
    }

    /// Optional mutable resource access.
    pub fn try_resource_mut<T: 'static, A: 'static>(
        &mut self,
        def: ResourceDef<T, A>,
    ) -> Option<&mut T> {
        self.resources.get_mut(&def.id())?.downcast_mut::<T>()
    }

    /// Returns `true` if the resource has been added.
    #[must_use]
    pub fn resource_ready(&self, id: ResourceId) -> bool {
        self.resources.contains_key(&id)
    }

    /// Returns a future that resolves once every listed resource exists.
    ///
    /// Intended for setup-time sequencing: the future holds no world borrow,
    /// so it can be awaited from a task while the tick loop keeps running.
    /// Once it resolves, strict accessors for the listed resources are
    /// guaranteed to succeed.
    pub fn when_resources(&mut self, ids: &[ResourceId]) -> ResourceWait {
        let all_ready = ids.iter().all(|id| self.resources.contains_key(id));
        let shared = Arc::new(Mutex::new(WaitState {
            done: all_ready,
            waker: None,
        }));
        if !all_ready {
            self.waiters.push(PendingWait {
                ids: ids.to_vec(),
                shared: Arc::clone(&shared),
            });
        }
        ResourceWait { shared }
    }

    fn satisfy_waiters(&mut self) {
        let resources = &self.resources;
        self.waiters.retain(|wait| {
            if wait.ids.iter().all(|id| resources.contains_key(id)) {
                wait.complete();
                false
            } else {
                true
            }
        });
    }

    // -- Queries --

    /// Entities currently carrying every component in `shape`, from the
    /// incrementally-maintained cache (compiled on first use).
    ///
    /// Members are ordered by when each entity first satisfied the shape, so
    /// the first element is the oldest match.
    pub fn filter_entities(&mut self, shape: &[ComponentId]) -> Vec<Entity> {
        let index = self.find_or_create_query(shape);
        self.queries[index].members().to_vec()
    }

    /// One-off query that always recomputes, in entity creation order.
    /// Use sparingly; the cached form is the per-tick path.
    #[must_use]
    pub fn filter_entities_uncached(&self, shape: &[ComponentId]) -> Vec<Entity> {
        self.spawn_order
            .iter()
            .copied()
            .filter(|entity| {
                let record = &self.entities[entity];
                shape.iter().all(|id| record.components.contains_key(id))
            })
            .collect()
    }

    fn find_or_create_query(&mut self, shape: &[ComponentId]) -> usize {
        let mut normalized = shape.to_vec();
        normalized.sort_unstable();
        normalized.dedup();
        if let Some(index) = self
            .queries
            .iter()
            .position(|cache| cache.shape() == normalized.as_slice())
        {
            return index;
        }
        let mut cache = QueryCache::new(normalized);
        for &entity in &self.spawn_order {
            let record = &self.entities[&entity];
            if cache
                .shape()
                .iter()
                .all(|id| record.components.contains_key(id))
            {
                cache.push(entity);
            }
        }
        self.queries.push(cache);
        self.queries.len() - 1
    }

    fn queries_component_attached(&mut self, entity: Entity, id: ComponentId) {
        let entities = &self.entities;
        for cache in &mut self.queries {
            if !cache.involves(id) || cache.contains(entity) {
                continue;
            }
            let record = &entities[&entity];
            if cache
                .shape()
                .iter()
                .all(|c| record.components.contains_key(c))
            {
                cache.push(entity);
            }
        }
    }

    fn queries_component_removed(&mut self, entity: Entity, id: ComponentId) {
        for cache in &mut self.queries {
            if cache.involves(id) {
                cache.remove(entity);
            }
        }
    }

    // -- Systems --

    /// Register a per-tick system.
    ///
    /// `components` is the shape entities must fully match to be handed to
    /// the callback; `None` means the system ignores entities and runs once
    /// per tick. The callback is skipped for any tick on which one of
    /// `resources` has not been added yet — an expected transient state
    /// during async startup, not an error.
    ///
    /// Within its phase the system runs in registration order unless
    /// reordered by [`World::run_after`] / [`World::run_before`].
    ///
    /// # Errors
    ///
    /// Fails if the system name is already registered.
    pub fn add_system(
        &mut self,
        name: &str,
        phase: Phase,
        components: Option<&[ComponentId]>,
        resources: &[ResourceId],
        callback: impl FnMut(&mut World, &[Entity]) + 'static,
    ) -> Result<(), EcsError> {
        if self.system_names.contains_key(name) {
            return Err(EcsError::DuplicateSystem(name.to_string()));
        }
        let query = components.map(|shape| self.find_or_create_query(shape));
        self.system_names.insert(name.to_string(), self.systems.len());
        self.systems.push(SystemRecord {
            name: name.to_string(),
            phase,
            shape: components.map(<[ComponentId]>::to_vec),
            resources: resources.to_vec(),
            callback: Some(CallbackSlot(Box::new(callback))),
            query,
        });
        self.graph_version += 1;
        debug!(system = name, ?phase, "system registered");
        Ok(())
    }

    /// Declare that `system` must run after `dependency` (same phase only;
    /// across phases the phase order already decides).
    pub fn run_after(&mut self, system: &str, dependency: &str) {
        self.constraints.push(OrderConstraint {
            before: dependency.to_string(),
            after: system.to_string(),
        });
        self.graph_version += 1;
    }

    /// Declare that `system` must run before `dependent`.
    pub fn run_before(&mut self, system: &str, dependent: &str) {
        self.constraints.push(OrderConstraint {
            before: system.to_string(),
            after: dependent.to_string(),
        });
        self.graph_version += 1;
    }

    /// Returns the number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Compute (or reuse) the full execution order across all phases.
    fn execution_plan(&mut self) -> Result<Vec<usize>, EcsError> {
        if let Some((version, plan)) = &self.plan {
            if *version == self.graph_version {
                return Ok(plan.clone());
            }
        }

        let mut resolved: Vec<(usize, usize)> = Vec::new();
        for constraint in &self.constraints {
            let before = self.system_names.get(&constraint.before).copied();
            let after = self.system_names.get(&constraint.after).copied();
            let (Some(before), Some(after)) = (before, after) else {
                warn!(
                    before = %constraint.before,
                    after = %constraint.after,
                    "ordering constraint references an unregistered system; ignoring"
                );
                continue;
            };
            resolved.push((before, after));
        }

        let mut order = Vec::with_capacity(self.systems.len());
        for phase in Phase::ALL {
            let members: Vec<usize> = (0..self.systems.len())
                .filter(|&i| self.systems[i].phase == phase)
                .collect();
            if members.is_empty() {
                continue;
            }
            let mut graph = DepGraph::new(members.len());
            for &(before, after) in &resolved {
                let before_pos = members.iter().position(|&m| m == before);
                let after_pos = members.iter().position(|&m| m == after);
                if let (Some(b), Some(a)) = (before_pos, after_pos) {
                    graph.add_edge(b, a);
                }
            }
            let sorted = graph.topo_sort().map_err(|cycle| {
                EcsError::SchedulingCycle(
                    cycle
                        .into_iter()
                        .map(|local| self.systems[members[local]].name.clone())
                        .collect(),
                )
            })?;
            order.extend(sorted.into_iter().map(|local| members[local]));
        }

        info!(
            systems = order.len(),
            version = self.graph_version,
            "recomputed system execution plan"
        );
        self.plan = Some((self.graph_version, order.clone()));
        Ok(order)
    }

    // -- Init hooks --

    /// Register a one-shot setup action.
    ///
    /// Fires synchronously, exactly once, on the first activation pass where
    /// every trigger component exists on some entity, every trigger resource
    /// is present, and every named system is registered. Typically used to
    /// call [`World::add_system`] so subsystems self-register the first time
    /// their trigger component appears.
    pub fn add_eager_init(
        &mut self,
        components: &[ComponentId],
        resources: &[ResourceId],
        systems: &[&str],
        callback: impl FnOnce(&mut World) + 'static,
    ) {
        self.eager_inits.push(EagerInit {
            components: components.to_vec(),
            resources: resources.to_vec(),
            systems: systems.iter().map(|s| (*s).to_string()).collect(),
            callback: Some(Box::new(callback)),
        });
    }

    /// Register an asynchronous one-shot producer for `provides`.
    ///
    /// Once every resource in `requires` exists, `callback` runs synchronously
    /// with the world (to read or clone its inputs, and to create
    /// [`World::when_resources`] futures it wants to await) and returns a
    /// future. The future is polled once per tick; when it completes, its
    /// output is published as `provides`, waking `when_resources` waiters.
    pub fn add_lazy_init<T, A, F>(
        &mut self,
        requires: &[ResourceId],
        provides: ResourceDef<T, A>,
        callback: impl FnOnce(&mut World) -> F + 'static,
    ) where
        T: 'static,
        A: 'static,
        F: Future<Output = T> + 'static,
    {
        let starter: Box<dyn FnOnce(&mut World) -> LazyFuture> = Box::new(move |world| {
            let future = callback(world);
            Box::pin(async move { Box::new(future.await) as Box<dyn Any> })
        });
        self.lazy_inits.push(LazyInit {
            requires: requires.to_vec(),
            provides: provides.id(),
            provides_name: provides.name(),
            state: LazyState::Pending(starter),
        });
    }

    fn fire_eager_inits(&mut self) {
        loop {
            let mut fired = false;
            let mut index = 0;
            // A fired callback may push more records or satisfy other
            // records' triggers, so scan until a pass fires nothing.
            while index < self.eager_inits.len() {
                let ready = self.eager_inits[index].callback.is_some()
                    && self.eager_init_ready(&self.eager_inits[index]);
                if ready {
                    if let Some(callback) = self.eager_inits[index].callback.take() {
                        callback(self);
                        fired = true;
                    }
                }
                index += 1;
            }
            if !fired {
                break;
            }
        }
        self.eager_inits.retain(|record| record.callback.is_some());
    }

    fn eager_init_ready(&self, record: &EagerInit) -> bool {
        record
            .components
            .iter()
            .all(|id| self.component_counts.get(id).map_or(false, |&c| c > 0))
            && record
                .resources
                .iter()
                .all(|id| self.resources.contains_key(id))
            && record
                .systems
                .iter()
                .all(|name| self.system_names.contains_key(name))
    }

    fn poll_lazy_inits(&mut self) {
        // Trigger pending records whose inputs are all present.
        let mut index = 0;
        while index < self.lazy_inits.len() {
            let ready = matches!(self.lazy_inits[index].state, LazyState::Pending(_))
                && self.lazy_inits[index]
                    .requires
                    .iter()
                    .all(|id| self.resources.contains_key(id));
            if ready {
                let state = std::mem::replace(&mut self.lazy_inits[index].state, LazyState::Done);
                if let LazyState::Pending(starter) = state {
                    debug!(
                        resource = self.lazy_inits[index].provides_name,
                        "lazy init triggered"
                    );
                    let future = starter(self);
                    self.lazy_inits[index].state = LazyState::Running(future);
                }
            }
            index += 1;
        }

        // Drive in-flight futures one step. Progress comes from this
        // once-per-tick re-poll, so a no-op waker suffices.
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        let mut completed = Vec::new();
        for (index, record) in self.lazy_inits.iter_mut().enumerate() {
            if let LazyState::Running(future) = &mut record.state {
                if let Poll::Ready(value) = future.as_mut().poll(&mut cx) {
                    record.state = LazyState::Done;
                    completed.push((index, value));
                }
            }
        }
        for (index, value) in completed {
            let id = self.lazy_inits[index].provides;
            let name = self.lazy_inits[index].provides_name;
            assert!(
                !self.resources.contains_key(&id),
                "resource '{name}' already exists"
            );
            self.resources.insert(id, value);
            debug!(resource = name, "lazy init published resource");
            self.satisfy_waiters();
        }
        self.lazy_inits
            .retain(|record| !matches!(record.state, LazyState::Done));
    }

    // -- Serializers --

    /// Register the (serialize, deserialize) pair for a networked component.
    ///
    /// The core only stores the pair; the networking layer looks it up via
    /// [`World::serializer`] and invokes it.
    ///
    /// # Errors
    ///
    /// Fails if the component already has a pair registered.
    pub fn register_serializer_pair<T: 'static, A: 'static>(
        &mut self,
        def: ComponentDef<T, A>,
        serialize: fn(&T, &mut Vec<u8>),
        deserialize: fn(&mut T, &[u8]),
    ) -> Result<(), EcsError> {
        if self.serializers.contains(def.id()) {
            return Err(EcsError::DuplicateSerializer(def.name().to_string()));
        }
        let name = def.name();
        self.serializers.insert(
            def.id(),
            SerializerPair {
                serialize: Box::new(move |value, buf| {
                    let value = value
                        .downcast_ref::<T>()
                        .unwrap_or_else(|| panic!("serializer for '{name}' got a mismatched value"));
                    serialize(value, buf);
                }),
                deserialize: Box::new(move |value, bytes| {
                    let value = value.downcast_mut::<T>().unwrap_or_else(|| {
                        panic!("deserializer for '{name}' got a mismatched value")
                    });
                    deserialize(value, bytes);
                }),
            },
        );
        Ok(())
    }

    /// Look up the serializer pair for a component id.
    #[must_use]
    pub fn serializer(&self, id: ComponentId) -> Option<&SerializerPair> {
        self.serializers.get(id)
    }

    // -- Tick driver --

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick
    }

    /// Execute one tick: activation pass, then every system in phase order.
    ///
    /// Systems whose required resources are missing are skipped for this
    /// tick. Systems registered during the tick first run on the next one.
    /// Component mutations and spawns take effect immediately and are seen by
    /// systems scheduled later in the same tick.
    ///
    /// # Errors
    ///
    /// Fails if the ordering constraints contain a cycle; the error lists
    /// the systems forming it.
    pub fn run_tick(&mut self) -> Result<(), EcsError> {
        self.tick += 1;
        self.poll_lazy_inits();
        self.fire_eager_inits();

        let plan = self.execution_plan()?;
        debug!(tick = self.tick, systems = plan.len(), "tick start");
        for index in plan {
            let ready = self.systems[index]
                .resources
                .iter()
                .all(|id| self.resources.contains_key(id));
            if !ready {
                trace!(
                    tick = self.tick,
                    system = %self.systems[index].name,
                    "skipped: required resource not ready"
                );
                continue;
            }
            let matched: Vec<Entity> = match self.systems[index].query {
                Some(query) => self.queries[query].members().to_vec(),
                None => Vec::new(),
            };
            // The callback is taken out of its slot while it runs so it can
            // borrow the world mutably; an empty slot means this system is
            // already running further up the stack.
            let Some(mut slot) = self.systems[index].callback.take() else {
                continue;
            };
            (slot.0)(self, &matched);
            self.systems[index].callback = Some(slot);
        }
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// A read view of one entity with a caller-asserted component shape.
///
/// Produced by [`World::find_entity`]; accessors for the asserted components
/// are guaranteed to succeed.
pub struct EntityView<'w> {
    world: &'w World,
    entity: Entity,
}

impl<'w> EntityView<'w> {
    /// The entity this view wraps.
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Read one of the asserted components.
    ///
    /// # Panics
    ///
    /// Panics if the component was not part of the asserted shape.
    #[must_use]
    pub fn get<T: 'static, A: 'static>(&self, def: ComponentDef<T, A>) -> &'w T {
        self.world.component(self.entity, def)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pos {
        x: f32,
        y: f32,
    }

    fn mk_pos(args: (f32, f32)) -> Pos {
        Pos {
            x: args.0,
            y: args.1,
        }
    }

    fn up_pos(pos: &mut Pos, args: (f32, f32)) {
        pos.x = args.0;
        pos.y = args.1;
    }

    #[derive(Debug)]
    struct Vel {
        dx: f32,
    }

    fn mk_vel(dx: f32) -> Vel {
        Vel { dx }
    }

    struct Marker;

    fn mk_marker(_: ()) -> Marker {
        Marker
    }

    #[derive(Debug, PartialEq)]
    struct Wind {
        strength: f32,
    }

    fn mk_wind(strength: f32) -> Wind {
        Wind { strength }
    }

    fn mk_clock(start: u64) -> u64 {
        start
    }

    fn mk_table(values: Vec<f32>) -> Vec<f32> {
        values
    }

    #[test]
    fn test_duplicate_component_name_fails() {
        let mut world = World::new();
        world.define_component("pos", mk_pos, up_pos).unwrap();
        let err = world.define_component("pos", mk_pos, up_pos).unwrap_err();
        assert!(matches!(err, EcsError::Def(_)));
    }

    #[test]
    fn test_component_and_resource_share_one_name_space() {
        let mut world = World::new();
        world.define_component("wind", mk_pos, up_pos).unwrap();
        assert!(world.define_resource("wind", mk_wind).is_err());
    }

    #[test]
    fn test_def_ids_are_bijective() {
        let mut world = World::new();
        let pos = world.define_component("pos", mk_pos, up_pos).unwrap();
        let wind = world.define_resource("wind", mk_wind).unwrap();
        assert_ne!(pos.id().0, wind.id().0);
        assert_eq!(world.defs().lookup("pos").unwrap().id, pos.id().0);
        assert_eq!(world.defs().get(wind.id().0).unwrap().name, "wind");
        assert_eq!(world.defs().len(), 2);
    }

    #[test]
    fn test_multiple_worlds_are_independent() {
        let mut a = World::new();
        let mut b = World::new();
        a.define_component("pos", mk_pos, up_pos).unwrap();
        // Same name in a different world is fine; the registry is per-world.
        b.define_component("pos", mk_pos, up_pos).unwrap();
        let e = a.spawn();
        assert!(a.exists(e));
        assert!(!b.exists(e));
    }

    #[test]
    fn test_spawn_uses_active_id_range() {
        let mut world = World::new();
        world.define_id_range("net", 1 << 32, 1 << 33).unwrap();
        let local = world.spawn();
        world.set_id_range("net").unwrap();
        let net = world.spawn();
        assert_eq!(local.id(), 1);
        assert_eq!(net.id(), 1 << 32);
    }

    #[test]
    fn test_ensure_attaches_once_nonupdatable() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let e = world.spawn();
        world.ensure_component_on(e, pos, (1.0, 2.0));
        // Second ensure must not re-apply arguments.
        world.ensure_component_on(e, pos, (9.0, 9.0));
        assert_eq!(world.component(e, pos), &Pos { x: 1.0, y: 2.0 });
    }

    #[test]
    fn test_ensure_merges_for_updatable() {
        let mut world = World::new();
        let pos = world.define_component("pos", mk_pos, up_pos).unwrap();
        let e = world.spawn();
        world.ensure_component_on(e, pos, (1.0, 2.0));
        world.ensure_component_on(e, pos, (3.0, 4.0));
        assert_eq!(world.component(e, pos), &Pos { x: 3.0, y: 4.0 });
    }

    #[test]
    fn test_remove_component_is_consistent_no_op_when_absent() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let e = world.spawn();
        assert!(!world.remove_component(e, pos));
        world.ensure_component_on(e, pos, (0.0, 0.0));
        assert!(world.remove_component(e, pos));
        assert!(!world.has_component(e, pos));
    }

    #[test]
    #[should_panic(expected = "has no component 'pos'")]
    fn test_strict_component_access_panics_when_missing() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let e = world.spawn();
        let _ = world.component(e, pos);
    }

    #[test]
    fn test_find_entity_asserts_shape() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let vel = world.define_nonupdatable_component("vel", mk_vel).unwrap();
        let e = world.spawn();
        world.ensure_component_on(e, pos, (5.0, 6.0));

        assert!(world.find_entity(e, &[pos.id(), vel.id()]).is_none());
        let view = world.find_entity(e, &[pos.id()]).unwrap();
        assert_eq!(view.entity(), e);
        assert_eq!(view.get(pos), &Pos { x: 5.0, y: 6.0 });
        assert!(world.find_entity(Entity::from_raw(999), &[pos.id()]).is_none());
    }

    #[test]
    fn test_query_membership_follows_component_changes() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let vel = world.define_nonupdatable_component("vel", mk_vel).unwrap();
        let shape = [pos.id(), vel.id()];

        let e = world.spawn();
        assert!(world.filter_entities(&shape).is_empty());

        world.ensure_component_on(e, pos, (0.0, 0.0));
        assert!(world.filter_entities(&shape).is_empty());

        world.ensure_component_on(e, vel, 1.0);
        assert_eq!(world.filter_entities(&shape), vec![e]);

        world.remove_component(e, vel);
        assert!(world.filter_entities(&shape).is_empty());
    }

    #[test]
    fn test_query_order_is_first_satisfied_order() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let shape = [pos.id()];

        let e1 = world.spawn();
        let e2 = world.spawn();
        let e3 = world.spawn();
        for &e in &[e1, e2, e3] {
            world.ensure_component_on(e, pos, (0.0, 0.0));
        }
        assert_eq!(world.filter_entities(&shape), vec![e1, e2, e3]);

        // Dropping and re-adding moves e2 to the back, but the first element
        // stays the oldest match.
        world.remove_component(e2, pos);
        world.ensure_component_on(e2, pos, (0.0, 0.0));
        let members = world.filter_entities(&shape);
        assert_eq!(members[0], e1);
        assert_eq!(members, vec![e1, e3, e2]);
    }

    #[test]
    fn test_uncached_query_always_recomputes() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let e1 = world.spawn();
        let e2 = world.spawn();
        world.ensure_component_on(e1, pos, (0.0, 0.0));
        assert_eq!(world.filter_entities_uncached(&[pos.id()]), vec![e1]);
        world.ensure_component_on(e2, pos, (0.0, 0.0));
        assert_eq!(world.filter_entities_uncached(&[pos.id()]), vec![e1, e2]);
    }

    #[test]
    fn test_despawn_removes_entity_from_queries() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let e1 = world.spawn();
        let e2 = world.spawn();
        world.ensure_component_on(e1, pos, (0.0, 0.0));
        world.ensure_component_on(e2, pos, (0.0, 0.0));
        assert_eq!(world.filter_entities(&[pos.id()]).len(), 2);

        assert!(world.despawn(e1));
        assert!(!world.exists(e1));
        assert_eq!(world.filter_entities(&[pos.id()]), vec![e2]);
        assert!(!world.despawn(e1));
    }

    #[test]
    fn test_resource_add_and_get() {
        let mut world = World::new();
        let wind = world.define_resource("wind", mk_wind).unwrap();
        assert!(world.try_resource(wind).is_none());
        world.add_resource(wind, 7.5);
        assert_eq!(world.resource(wind), &Wind { strength: 7.5 });
        world.resource_mut(wind).strength = 8.0;
        assert_eq!(world.try_resource(wind).unwrap().strength, 8.0);
    }

    #[test]
    #[should_panic(expected = "resource 'wind' already exists")]
    fn test_double_add_resource_panics() {
        let mut world = World::new();
        let wind = world.define_resource("wind", mk_wind).unwrap();
        world.add_resource(wind, 1.0);
        world.add_resource(wind, 2.0);
    }

    #[test]
    fn test_when_resources_resolves_after_last_add() {
        let mut world = World::new();
        let wind = world.define_resource("wind", mk_wind).unwrap();
        let clock = world.define_resource("clock", mk_clock).unwrap();

        let wait = world.when_resources(&[wind.id(), clock.id()]);
        world.add_resource(wind, 1.0);
        // Only one of two resources is ready; the future must still pend.
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        let mut wait = Box::pin(wait);
        assert!(wait.as_mut().poll(&mut cx).is_pending());

        world.add_resource(clock, 0);
        futures::executor::block_on(wait);
    }

    #[test]
    fn test_when_resources_already_satisfied() {
        let mut world = World::new();
        let wind = world.define_resource("wind", mk_wind).unwrap();
        world.add_resource(wind, 1.0);
        futures::executor::block_on(world.when_resources(&[wind.id()]));
    }

    #[test]
    fn test_phase_ordering_overrides_registration_order() {
        let mut world = World::new();
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let draw_log = Rc::clone(&log);
        world
            .add_system("draw", Phase::RenderPreDraw, None, &[], move |_, _| {
                draw_log.borrow_mut().push("draw");
            })
            .unwrap();
        let input_log = Rc::clone(&log);
        world
            .add_system("input", Phase::ReadInputs, None, &[], move |_, _| {
                input_log.borrow_mut().push("input");
            })
            .unwrap();

        world.run_tick().unwrap();
        assert_eq!(*log.borrow(), vec!["input", "draw"]);
    }

    #[test]
    fn test_constraint_reorders_within_phase() {
        let mut world = World::new();
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let a_log = Rc::clone(&log);
        world
            .add_system("aim", Phase::GameWorld, None, &[], move |_, _| {
                a_log.borrow_mut().push("aim");
            })
            .unwrap();
        let b_log = Rc::clone(&log);
        world
            .add_system("steer", Phase::GameWorld, None, &[], move |_, _| {
                b_log.borrow_mut().push("steer");
            })
            .unwrap();

        // Registration order alone would run aim first.
        world.run_after("aim", "steer");
        world.run_tick().unwrap();
        assert_eq!(*log.borrow(), vec!["steer", "aim"]);
    }

    #[test]
    fn test_constraint_cycle_is_reported() {
        let mut world = World::new();
        world
            .add_system("aim", Phase::GameWorld, None, &[], |_, _| {})
            .unwrap();
        world
            .add_system("steer", Phase::GameWorld, None, &[], |_, _| {})
            .unwrap();
        world.run_after("aim", "steer");
        world.run_after("steer", "aim");

        let err = world.run_tick().unwrap_err();
        match err {
            EcsError::SchedulingCycle(names) => {
                assert!(names.contains(&"aim".to_string()));
                assert!(names.contains(&"steer".to_string()));
            }
            other => panic!("expected SchedulingCycle, got {other:?}"),
        }
    }

    #[test]
    fn test_constraint_to_unknown_system_is_ignored() {
        let mut world = World::new();
        world
            .add_system("aim", Phase::GameWorld, None, &[], |_, _| {})
            .unwrap();
        world.run_after("aim", "not-loaded");
        world.run_tick().unwrap();
    }

    #[test]
    fn test_duplicate_system_name_fails() {
        let mut world = World::new();
        world
            .add_system("aim", Phase::GameWorld, None, &[], |_, _| {})
            .unwrap();
        let err = world
            .add_system("aim", Phase::GameWorld, None, &[], |_, _| {})
            .unwrap_err();
        assert!(matches!(err, EcsError::DuplicateSystem(_)));
    }

    #[test]
    fn test_system_skipped_until_resource_ready() {
        let mut world = World::new();
        let wind = world.define_resource("wind", mk_wind).unwrap();
        let runs = Rc::new(RefCell::new(0u32));

        let counter = Rc::clone(&runs);
        world
            .add_system("gusts", Phase::GameWorld, None, &[wind.id()], move |_, _| {
                *counter.borrow_mut() += 1;
            })
            .unwrap();

        for _ in 0..5 {
            world.run_tick().unwrap();
        }
        assert_eq!(*runs.borrow(), 0);

        world.add_resource(wind, 3.0);
        world.run_tick().unwrap();
        world.run_tick().unwrap();
        assert_eq!(*runs.borrow(), 2);
    }

    #[test]
    fn test_shaped_system_receives_current_matches() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let seen: Rc<RefCell<Vec<Vec<Entity>>>> = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        world
            .add_system(
                "track",
                Phase::GameWorld,
                Some(&[pos.id()]),
                &[],
                move |_, entities| {
                    sink.borrow_mut().push(entities.to_vec());
                },
            )
            .unwrap();

        world.run_tick().unwrap();
        let e = world.spawn();
        world.ensure_component_on(e, pos, (0.0, 0.0));
        world.run_tick().unwrap();

        let seen = seen.borrow();
        assert_eq!(seen[0], Vec::<Entity>::new());
        assert_eq!(seen[1], vec![e]);
    }

    #[test]
    fn test_mutations_visible_same_tick_to_later_phases() {
        let mut world = World::new();
        let flag = world.define_nonupdatable_component("flag", mk_marker).unwrap();
        let observed = Rc::new(RefCell::new(Vec::new()));

        let e = world.spawn();
        world
            .add_system("raise", Phase::PrePhysics, None, &[], move |world, _| {
                world.ensure_component_on(e, flag, ());
            })
            .unwrap();
        let sink = Rc::clone(&observed);
        world
            .add_system(
                "watch",
                Phase::GameWorld,
                Some(&[flag.id()]),
                &[],
                move |_, entities| {
                    sink.borrow_mut().push(entities.len());
                },
            )
            .unwrap();

        world.run_tick().unwrap();
        // The flag raised in PrePhysics is already visible in GameWorld.
        assert_eq!(*observed.borrow(), vec![1]);
    }

    #[test]
    fn test_eager_init_fires_exactly_once() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let fired = Rc::new(RefCell::new(0u32));

        let counter = Rc::clone(&fired);
        world.add_eager_init(&[pos.id()], &[], &[], move |_| {
            *counter.borrow_mut() += 1;
        });

        world.run_tick().unwrap();
        assert_eq!(*fired.borrow(), 0);

        let e = world.spawn();
        world.ensure_component_on(e, pos, (0.0, 0.0));
        for _ in 0..4 {
            world.run_tick().unwrap();
        }
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn test_eager_init_waits_for_all_trigger_kinds() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let wind = world.define_resource("wind", mk_wind).unwrap();
        let fired = Rc::new(RefCell::new(false));

        let flag = Rc::clone(&fired);
        world.add_eager_init(&[pos.id()], &[wind.id()], &["steer"], move |_| {
            *flag.borrow_mut() = true;
        });

        let e = world.spawn();
        world.ensure_component_on(e, pos, (0.0, 0.0));
        world.run_tick().unwrap();
        assert!(!*fired.borrow());

        world.add_resource(wind, 1.0);
        world.run_tick().unwrap();
        assert!(!*fired.borrow());

        world
            .add_system("steer", Phase::GamePlayers, None, &[], |_, _| {})
            .unwrap();
        world.run_tick().unwrap();
        assert!(*fired.borrow());
    }

    #[test]
    fn test_eager_init_registers_system_that_then_runs() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let runs = Rc::new(RefCell::new(0u32));

        let counter = Rc::clone(&runs);
        world.add_eager_init(&[pos.id()], &[], &[], move |world| {
            let counter = Rc::clone(&counter);
            world
                .add_system(
                    "drift",
                    Phase::GameWorld,
                    Some(&[pos.id()]),
                    &[],
                    move |_, entities| {
                        *counter.borrow_mut() += entities.len() as u32;
                    },
                )
                .unwrap();
        });

        let e = world.spawn();
        world.ensure_component_on(e, pos, (0.0, 0.0));
        // Activation happens at the top of the tick, so the system already
        // runs within this same tick.
        world.run_tick().unwrap();
        assert_eq!(*runs.borrow(), 1);
        world.run_tick().unwrap();
        assert_eq!(*runs.borrow(), 2);
    }

    #[test]
    fn test_lazy_init_publishes_resource() {
        let mut world = World::new();
        let wind = world.define_resource("wind", mk_wind).unwrap();
        let gust_table = world.define_resource("gust_table", mk_table).unwrap();

        world.add_lazy_init(&[wind.id()], gust_table, move |world| {
            let strength = world.resource(wind).strength;
            async move { vec![strength, strength * 2.0] }
        });

        world.run_tick().unwrap();
        assert!(!world.resource_ready(gust_table.id()));

        world.add_resource(wind, 2.0);
        world.run_tick().unwrap();
        assert_eq!(world.resource(gust_table), &vec![2.0, 4.0]);

        // Awaiting the published resource resolves immediately now.
        futures::executor::block_on(world.when_resources(&[gust_table.id()]));
    }

    #[test]
    fn test_lazy_init_future_can_await_more_resources() {
        let mut world = World::new();
        let wind = world.define_resource("wind", mk_wind).unwrap();
        let clock = world.define_resource("clock", mk_clock).unwrap();
        let gust_table = world.define_resource("gust_table", mk_table).unwrap();

        world.add_lazy_init(&[wind.id()], gust_table, move |world| {
            let strength = world.resource(wind).strength;
            let clock_ready = world.when_resources(&[clock.id()]);
            async move {
                clock_ready.await;
                vec![strength]
            }
        });

        world.add_resource(wind, 5.0);
        world.run_tick().unwrap();
        // Triggered, but its future is parked on the clock resource.
        assert!(!world.resource_ready(gust_table.id()));

        world.add_resource(clock, 1);
        world.run_tick().unwrap();
        assert_eq!(world.resource(gust_table), &vec![5.0]);
    }

    #[test]
    fn test_build_system_converges_and_stops() {
        let mut world = World::new();
        let construct = world
            .define_nonupdatable_component("sail_construct", mk_marker)
            .unwrap();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let vel = world.define_nonupdatable_component("vel", mk_vel).unwrap();
        let finished = world
            .define_nonupdatable_component("sail_finished", mk_marker)
            .unwrap();
        let body_runs = Rc::new(RefCell::new(0u32));

        let counter = Rc::clone(&body_runs);
        world
            .add_system(
                "build_sails",
                Phase::PrePhysics,
                Some(&[construct.id()]),
                &[],
                move |world, entities| {
                    for &e in entities {
                        if world.has_component(e, finished) {
                            continue;
                        }
                        *counter.borrow_mut() += 1;
                        world.ensure_component_on(e, pos, (0.0, 0.0));
                        world.ensure_component_on(e, vel, 0.0);
                        world.ensure_component_on(e, finished, ());
                    }
                },
            )
            .unwrap();

        let e = world.spawn();
        world.ensure_component_on(e, construct, ());
        for _ in 0..5 {
            world.run_tick().unwrap();
        }

        // Exactly the expected final component set, built exactly once.
        assert!(world.has_component(e, construct));
        assert!(world.has_component(e, pos));
        assert!(world.has_component(e, vel));
        assert!(world.has_component(e, finished));
        assert_eq!(*body_runs.borrow(), 1);
    }

    #[test]
    fn test_serializer_pair_registration_and_lookup() {
        let mut world = World::new();
        let pos = world.define_nonupdatable_component("pos", mk_pos).unwrap();
        let vel = world.define_nonupdatable_component("vel", mk_vel).unwrap();

        fn ser(pos: &Pos, buf: &mut Vec<u8>) {
            buf.extend_from_slice(&pos.x.to_le_bytes());
            buf.extend_from_slice(&pos.y.to_le_bytes());
        }
        fn deser(pos: &mut Pos, bytes: &[u8]) {
            pos.x = f32::from_le_bytes(bytes[0..4].try_into().unwrap());
            pos.y = f32::from_le_bytes(bytes[4..8].try_into().unwrap());
        }

        world.register_serializer_pair(pos, ser, deser).unwrap();
        assert!(world.serializer(pos.id()).is_some());
        assert!(world.serializer(vel.id()).is_none());

        let err = world.register_serializer_pair(pos, ser, deser).unwrap_err();
        assert!(matches!(err, EcsError::DuplicateSerializer(_)));

        // The stored pair round-trips through the type-erased interface.
        let pair = world.serializer(pos.id()).unwrap();
        let source = Pos { x: 1.5, y: -2.5 };
        let mut buf = Vec::new();
        (pair.serialize)(&source, &mut buf);
        let mut target = Pos { x: 0.0, y: 0.0 };
        (pair.deserialize)(&mut target, &buf);
        assert_eq!(source, target);
    }

    #[test]
    fn test_tick_counter_advances() {
        let mut world = World::new();
        assert_eq!(world.tick_id(), 0);
        world.run_tick().unwrap();
        world.run_tick().unwrap();
        assert_eq!(world.tick_id(), 2);
    }
}
