#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Input system translating host direction requests into validated headings.
//!
//! Hosts (keyboard handlers, autopilots, tests) write into an [`InputQueue`].
//! The queue holds a single pending heading; a newer request replaces an
//! older one that has not yet been processed. Once per INPUT phase the
//! [`Input`] system offers the pending heading to every controllable chain
//! head and clears it whether or not any head accepted it.

use std::{cell::Cell, collections::BTreeMap, rc::Rc};

use sanctum_core::{
    tags, ComponentKind, Event, GameState, Heading, Phase, PlayerControlled, Velocity,
};
use sanctum_world::World;
use tracing::{debug, info};

/// Shared handle used by hosts to request a heading for the next INPUT phase.
#[derive(Clone, Debug, Default)]
pub struct InputQueue {
    pending: Rc<Cell<Option<Heading>>>,
}

impl InputQueue {
    /// Replaces any pending request with `heading`.
    pub fn enqueue(&self, heading: Heading) {
        self.pending.set(Some(heading));
    }

    /// Enqueues the heading bound to `key`. Returns `false` for unbound keys.
    pub fn press(&self, bindings: &KeyBindings, key: &str) -> bool {
        match bindings.heading_for(key) {
            Some(heading) => {
                self.enqueue(heading);
                true
            }
            None => false,
        }
    }

    /// Request waiting for the next INPUT phase, if any.
    #[must_use]
    pub fn pending(&self) -> Option<Heading> {
        self.pending.get()
    }

    fn take(&self) -> Option<Heading> {
        self.pending.take()
    }
}

/// Mapping from host key names to headings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBindings {
    keys: BTreeMap<String, Heading>,
}

impl KeyBindings {
    /// Creates an empty binding table.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            keys: BTreeMap::new(),
        }
    }

    /// Binds `key` to `heading`, replacing any previous binding.
    pub fn bind(&mut self, key: impl Into<String>, heading: Heading) {
        let _ = self.keys.insert(key.into(), heading);
    }

    /// Removes the binding for `key`. Returns `false` when it was unbound.
    pub fn unbind(&mut self, key: &str) -> bool {
        self.keys.remove(key).is_some()
    }

    /// Heading bound to `key`, if any.
    #[must_use]
    pub fn heading_for(&self, key: &str) -> Option<Heading> {
        self.keys.get(key).copied()
    }
}

impl Default for KeyBindings {
    /// Arrow keys plus WASD in either case.
    fn default() -> Self {
        let mut bindings = Self::empty();
        for (keys, heading) in [
            (["ArrowUp", "w", "W"], Heading::UP),
            (["ArrowDown", "s", "S"], Heading::DOWN),
            (["ArrowLeft", "a", "A"], Heading::LEFT),
            (["ArrowRight", "d", "D"], Heading::RIGHT),
        ] {
            for key in keys {
                bindings.bind(key, heading);
            }
        }
        bindings
    }
}

/// INPUT-phase system applying the pending request to controllable heads.
#[derive(Debug, Default)]
pub struct Input {
    queue: InputQueue,
}

impl Input {
    /// Creates a system reading from `queue`.
    #[must_use]
    pub fn new(queue: InputQueue) -> Self {
        Self { queue }
    }

    /// Handle hosts use to feed this system.
    #[must_use]
    pub fn queue(&self) -> InputQueue {
        self.queue.clone()
    }

    /// Registers a fresh input system in the INPUT phase and returns its queue.
    pub fn install(world: &mut World) -> InputQueue {
        let mut input = Self::default();
        let queue = input.queue();
        world.add_system(
            "input",
            move |world: &mut World| input.handle(world),
            Phase::Input,
        );
        queue
    }

    /// Offers the pending request to every controllable head, then clears it.
    ///
    /// A request is refused by a head when it is the zero heading or exactly
    /// reverses the head's current velocity. The first accepted request of a
    /// session starts it.
    pub fn handle(&mut self, world: &mut World) {
        let Some(heading) = self.queue.take() else {
            return;
        };

        let heads = world.query_tagged(
            tags::SNAKE_HEAD,
            &[ComponentKind::PlayerControlled, ComponentKind::Velocity],
        );
        let mut accepted = false;
        for head in heads {
            let Some(current) = world.get::<Velocity>(head).map(|velocity| velocity.heading) else {
                continue;
            };
            if heading.is_zero() || heading.is_reverse_of(current) {
                debug!(%head, ?heading, ?current, "Rejected heading request");
                continue;
            }
            if let Some(controlled) = world.get_mut::<PlayerControlled>(head) {
                controlled.next = heading;
                accepted = true;
                debug!(%head, ?heading, "Accepted heading request");
            }
        }

        if accepted {
            start_session(world);
        }
    }
}

fn start_session(world: &mut World) {
    let Some(entity) = world.singleton(tags::GAME_STATE) else {
        return;
    };
    let Some(state) = world.get_mut::<GameState>(entity) else {
        return;
    };
    if state.started || !state.alive {
        return;
    }
    state.started = true;
    info!("Session started");
    world.emit(Event::GameStarted);
}
