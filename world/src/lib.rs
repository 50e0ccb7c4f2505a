#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Sanctum simulation.
//!
//! The [`World`] owns every entity, its component records and tags, the
//! registered systems, the event bus and an optional [`SpatialGrid`]. Systems
//! never hold references into the world between frames; they receive it
//! mutably for the duration of their phase and communicate through
//! component mutations and [`Event`]s.

pub mod bus;
pub mod chain;
pub mod grid;
pub mod store;

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt, mem,
    time::Duration,
};

use sanctum_core::{
    Collider, ComponentKind, ComponentValue, Config, Entity, Event, EventKind, Phase, Position,
};
use tracing::trace;

pub use bus::{BusEvent, EventBus, ListenerId};
pub use grid::SpatialGrid;
pub use store::{Component, ComponentReader, ComponentStores, Mutable};

/// Simulated time as seen by systems.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    now: Duration,
    dt: Duration,
    frame: u64,
}

impl Clock {
    /// Total simulated time elapsed since the world was created.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Duration of the frame currently being simulated.
    #[must_use]
    pub const fn dt(&self) -> Duration {
        self.dt
    }

    /// Number of frames advanced so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }
}

struct SystemEntry {
    name: String,
    phase: Phase,
    run: Box<dyn FnMut(&mut World)>,
}

/// Represents the authoritative Sanctum world state.
pub struct World {
    next_entity: u32,
    alive: BTreeSet<Entity>,
    components: ComponentStores,
    tags: BTreeMap<Entity, BTreeSet<String>>,
    systems: Vec<SystemEntry>,
    bus: EventBus<World, Event>,
    grid: Option<SpatialGrid>,
    clock: Clock,
}

impl World {
    /// Creates an empty world without a spatial grid.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_entity: 1,
            alive: BTreeSet::new(),
            components: ComponentStores::default(),
            tags: BTreeMap::new(),
            systems: Vec::new(),
            bus: EventBus::new(),
            grid: None,
            clock: Clock::default(),
        }
    }

    /// Creates an empty world with an attached grid of the provided size.
    #[must_use]
    pub fn with_grid(columns: u32, rows: u32) -> Self {
        let mut world = Self::new();
        world.attach_grid(SpatialGrid::new(columns, rows));
        world
    }

    /// Creates an empty world whose grid matches the configured dimensions.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_grid(config.grid.columns, config.grid.rows)
    }

    /// Creates an entity carrying every provided component.
    ///
    /// A positioned entity is registered in the grid across its whole
    /// collider footprint before this call returns.
    pub fn spawn<I>(&mut self, components: I) -> Entity
    where
        I: IntoIterator<Item = ComponentValue>,
    {
        let entity = Entity::new(self.next_entity);
        self.next_entity += 1;
        let _ = self.alive.insert(entity);
        for value in components {
            self.components.insert(entity, value);
        }
        self.sync_grid(entity);
        trace!(%entity, "Spawned entity");
        entity
    }

    /// Reports whether the handle refers to a live entity.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.contains(&entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.alive.len()
    }

    /// Removes the entity with all of its components, tags and grid cells,
    /// then emits [`Event::EntityDestroyed`].
    ///
    /// Destroying a dead or unknown handle does nothing.
    pub fn destroy(&mut self, entity: Entity) {
        if !self.alive.remove(&entity) {
            return;
        }
        self.components.remove_all(entity);
        let _ = self.tags.remove(&entity);
        if let Some(grid) = self.grid.as_mut() {
            grid.remove(entity);
        }
        trace!(%entity, "Destroyed entity");
        self.emit(Event::EntityDestroyed { entity });
    }

    /// Attaches or replaces a component. Dead entities are ignored.
    pub fn add(&mut self, entity: Entity, component: impl Into<ComponentValue>) {
        if !self.is_alive(entity) {
            return;
        }
        let value = component.into();
        let kind = value.kind();
        self.components.insert(entity, value);
        if affects_footprint(kind) {
            self.sync_grid(entity);
        }
    }

    /// Record of type `C` held by the entity, if any.
    #[must_use]
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.components.get(entity)
    }

    /// Mutable record of type `C` held by the entity, if any.
    ///
    /// [`Position`] and [`Collider`] are excluded; use [`World::relocate`] or
    /// [`World::add`] so the grid follows.
    pub fn get_mut<C: Mutable>(&mut self, entity: Entity) -> Option<&mut C> {
        self.components.get_mut(entity)
    }

    /// Reports whether the entity holds a record of `kind`.
    #[must_use]
    pub fn has(&self, entity: Entity, kind: ComponentKind) -> bool {
        self.components.contains(entity, kind)
    }

    /// Detaches a component. Returns `false` when nothing was removed.
    pub fn remove(&mut self, entity: Entity, kind: ComponentKind) -> bool {
        let removed = self.components.remove(entity, kind);
        if removed && affects_footprint(kind) {
            self.sync_grid(entity);
        }
        removed
    }

    /// Read-only view of every component store.
    #[must_use]
    pub fn components(&self) -> &ComponentStores {
        &self.components
    }

    /// Moves a positioned entity and its grid registration together.
    ///
    /// Returns `false` when the entity is dead or has no position.
    pub fn relocate(&mut self, entity: Entity, x: i32, y: i32) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let Some(position) = Position::column_mut(&mut self.components).get_mut(&entity) else {
            return false;
        };
        let from = *position;
        *position = Position::new(x, y);

        let single_cell = self
            .components
            .get::<Collider>(entity)
            .map_or(true, |collider| collider.footprint() == (1, 1));
        if single_cell {
            if let Some(grid) = self.grid.as_mut() {
                grid.move_entity(entity, from.x, from.y, x, y);
            }
        } else {
            self.sync_grid(entity);
        }
        debug_assert!(
            self.grid_consistent(entity),
            "grid registration of {entity} diverged from its position"
        );
        true
    }

    /// Reports whether the grid registers the entity at exactly the in-bounds
    /// cells of its position and footprint. Always `true` without a grid.
    #[must_use]
    pub fn grid_consistent(&self, entity: Entity) -> bool {
        let Some(grid) = self.grid.as_ref() else {
            return true;
        };
        let expected: BTreeSet<(i32, i32)> = self
            .components
            .get::<Position>(entity)
            .map(|position| {
                grid::footprint(*position, self.components.get::<Collider>(entity))
                    .into_iter()
                    .filter(|(x, y)| grid.in_bounds(*x, *y))
                    .collect()
            })
            .unwrap_or_default();
        let actual: BTreeSet<(i32, i32)> = grid.cells_of(entity).into_iter().collect();
        expected == actual
    }

    fn sync_grid(&mut self, entity: Entity) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        grid.remove(entity);
        if let Some(position) = self.components.get::<Position>(entity) {
            for (x, y) in grid::footprint(*position, self.components.get::<Collider>(entity)) {
                grid.add(entity, x, y);
            }
        }
    }

    /// Attaches a grid and registers every positioned entity in it.
    pub fn attach_grid(&mut self, grid: SpatialGrid) {
        self.grid = Some(grid);
        for entity in self.components.entities(ComponentKind::Position) {
            self.sync_grid(entity);
        }
    }

    /// Spatial grid, when one is attached.
    #[must_use]
    pub fn grid(&self) -> Option<&SpatialGrid> {
        self.grid.as_ref()
    }

    /// Mutable spatial grid, when one is attached.
    ///
    /// Intended for static data such as blocked cells; entity registrations
    /// are maintained by the world itself.
    pub fn grid_mut(&mut self) -> Option<&mut SpatialGrid> {
        self.grid.as_mut()
    }

    /// Attaches a role tag. Dead entities are ignored.
    pub fn tag(&mut self, entity: Entity, tag: impl Into<String>) {
        if self.is_alive(entity) {
            let _ = self.tags.entry(entity).or_default().insert(tag.into());
        }
    }

    /// Detaches a role tag. Returns `false` when the tag was absent.
    pub fn untag(&mut self, entity: Entity, tag: &str) -> bool {
        let Some(tags) = self.tags.get_mut(&entity) else {
            return false;
        };
        let removed = tags.remove(tag);
        if tags.is_empty() {
            let _ = self.tags.remove(&entity);
        }
        removed
    }

    /// Reports whether the entity carries the tag.
    #[must_use]
    pub fn has_tag(&self, entity: Entity, tag: &str) -> bool {
        self.tags.get(&entity).is_some_and(|tags| tags.contains(tag))
    }

    /// Entities holding every kind in `kinds`, in ascending handle order.
    ///
    /// Candidates come from the smallest store, so rare combinations stay
    /// cheap. An empty request matches nothing.
    #[must_use]
    pub fn query(&self, kinds: &[ComponentKind]) -> Vec<Entity> {
        let Some(smallest) = kinds.iter().min_by_key(|kind| self.components.len(**kind)) else {
            return Vec::new();
        };
        let mut candidates = self.components.entities(*smallest);
        candidates.retain(|entity| kinds.iter().all(|kind| self.has(*entity, *kind)));
        candidates
    }

    /// Entities carrying `tag` and holding every kind in `kinds`.
    #[must_use]
    pub fn query_tagged(&self, tag: &str, kinds: &[ComponentKind]) -> Vec<Entity> {
        self.tags
            .iter()
            .filter(|(_, tags)| tags.contains(tag))
            .map(|(entity, _)| *entity)
            .filter(|entity| kinds.iter().all(|kind| self.has(*entity, *kind)))
            .collect()
    }

    /// First entity carrying `tag`, used to locate session-wide singletons.
    #[must_use]
    pub fn singleton(&self, tag: &str) -> Option<Entity> {
        self.tags
            .iter()
            .find(|(_, tags)| tags.contains(tag))
            .map(|(entity, _)| *entity)
    }

    /// Registers a system to run during `phase`, after those already
    /// registered for it.
    pub fn add_system<F>(&mut self, name: impl Into<String>, system: F, phase: Phase)
    where
        F: FnMut(&mut World) + 'static,
    {
        self.systems.push(SystemEntry {
            name: name.into(),
            phase,
            run: Box::new(system),
        });
    }

    /// Names of the systems registered for `phase`, in execution order.
    #[must_use]
    pub fn systems(&self, phase: Phase) -> Vec<&str> {
        self.systems
            .iter()
            .filter(|entry| entry.phase == phase)
            .map(|entry| entry.name.as_str())
            .collect()
    }

    /// Runs every system registered for `phase` in registration order.
    ///
    /// Systems registered while the phase runs first execute on its next run.
    pub fn run_phase(&mut self, phase: Phase) {
        let mut systems = mem::take(&mut self.systems);
        for entry in systems.iter_mut().filter(|entry| entry.phase == phase) {
            trace!(system = %entry.name, %phase, "Running system");
            (entry.run)(self);
        }
        let added = mem::replace(&mut self.systems, systems);
        self.systems.extend(added);
    }

    /// Advances the clock by `dt`, runs every phase in [`Phase::ORDER`] and
    /// flushes the deferred events once.
    pub fn run_frame(&mut self, dt: Duration) {
        self.advance(dt);
        for phase in Phase::ORDER {
            self.run_phase(phase);
        }
        self.flush_events();
    }

    /// Advances the clock by `dt` without running any system.
    pub fn advance(&mut self, dt: Duration) {
        self.clock.now = self.clock.now.saturating_add(dt);
        self.clock.dt = dt;
        self.clock.frame += 1;
    }

    /// Current simulated time.
    #[must_use]
    pub const fn clock(&self) -> Clock {
        self.clock
    }

    /// Registers a listener for every future event of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&mut World, &Event) + 'static,
    {
        self.bus.subscribe(kind, listener)
    }

    /// Removes a listener. Returns `false` when the handle is unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Number of listeners subscribed to `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.bus.listener_count(kind)
    }

    /// Delivers the event synchronously to every listener of its kind.
    pub fn emit(&mut self, event: Event) {
        bus::dispatch(self, World::bus_mut, event);
    }

    /// Queues the event for the next flush.
    pub fn defer(&mut self, event: Event) {
        self.bus.defer(event);
    }

    /// Delivers every event deferred before this call.
    pub fn flush_events(&mut self) {
        bus::flush(self, World::bus_mut);
    }

    /// Number of events waiting for the next flush.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.bus.pending()
    }

    fn bus_mut(&mut self) -> &mut EventBus<World, Event> {
        &mut self.bus
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentReader for World {
    fn read<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.components.get(entity)
    }

    fn has(&self, entity: Entity, kind: ComponentKind) -> bool {
        self.components.contains(entity, kind)
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let systems: Vec<(&str, Phase)> = self
            .systems
            .iter()
            .map(|entry| (entry.name.as_str(), entry.phase))
            .collect();
        f.debug_struct("World")
            .field("alive", &self.alive.len())
            .field("tags", &self.tags)
            .field("systems", &systems)
            .field("bus", &self.bus)
            .field("grid", &self.grid.as_ref().map(|g| (g.columns(), g.rows())))
            .field("clock", &self.clock)
            .finish()
    }
}

fn affects_footprint(kind: ComponentKind) -> bool {
    matches!(kind, ComponentKind::Position | ComponentKind::Collider)
}
