#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-interval movement system that steps chain heads one cell at a time.
//!
//! Each head accumulates frame time and takes one step per elapsed interval,
//! catching up with several steps after a long frame. A step commits the
//! requested heading, rejects blocked or self-occupied destinations with
//! [`Event::ChainKilled`], then cascades the chain follow-the-leader style
//! and reports [`Event::ChainMoved`] followed by any
//! [`Event::CollectibleEaten`]. Consequences of a pickup are left to its
//! listeners.

use std::time::Duration;

use sanctum_core::{
    tags, Collectible, ComponentKind, Entity, Event, GameState, KillCause, Lifetime, Phase,
    PlayerControlled, Position, Velocity,
};
use sanctum_world::{chain, World};
use tracing::{debug, trace, warn};

/// Stateful system that advances every chain head once per frame.
#[derive(Debug, Default)]
pub struct Movement {
    steps: u64,
}

enum Step {
    Moved,
    Idle,
    Killed,
    Halted,
}

struct Pickup {
    collectible: Entity,
    kind: String,
    freshness: f32,
    position: Position,
}

impl Movement {
    /// Registers a fresh movement system in the UPDATE phase.
    pub fn install(world: &mut World) {
        let mut movement = Self::default();
        world.add_system(
            "movement",
            move |world: &mut World| movement.handle(world),
            Phase::Update,
        );
    }

    /// Number of successful steps taken since creation.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Advances every chain head by the current frame's duration.
    ///
    /// Does nothing without a grid or once the session is over.
    pub fn handle(&mut self, world: &mut World) {
        if world.grid().is_none() {
            return;
        }
        let dt = world.clock().dt();
        let heads = world.query_tagged(
            tags::SNAKE_HEAD,
            &[
                ComponentKind::Velocity,
                ComponentKind::ChainLink,
                ComponentKind::Position,
            ],
        );
        for head in heads {
            if session_over(world) {
                return;
            }
            self.advance_head(world, head, dt);
        }
    }

    fn advance_head(&mut self, world: &mut World, head: Entity, dt: Duration) {
        let Some(velocity) = world.get_mut::<Velocity>(head) else {
            return;
        };
        if velocity.interval.is_zero() {
            warn!(%head, "Chain head has a zero step interval and will not move");
            return;
        }
        velocity.accumulator = velocity.accumulator.saturating_add(dt);

        while world
            .get::<Velocity>(head)
            .is_some_and(|velocity| velocity.accumulator >= velocity.interval)
        {
            match step(world, head) {
                Step::Moved => self.steps += 1,
                Step::Idle => {}
                Step::Killed | Step::Halted => break,
            }
        }
    }
}

fn step(world: &mut World, head: Entity) -> Step {
    let requested = world
        .get::<PlayerControlled>(head)
        .map(|controlled| controlled.next);
    let Some(velocity) = world.get_mut::<Velocity>(head) else {
        return Step::Halted;
    };
    velocity.accumulator = velocity.accumulator.saturating_sub(velocity.interval);
    if let Some(heading) = requested {
        velocity.heading = heading;
    }
    let heading = velocity.heading;
    if heading.is_zero() {
        return Step::Idle;
    }

    let Some(from) = world.get::<Position>(head).copied() else {
        return Step::Halted;
    };
    let to = from.offset(heading);
    let Some(grid) = world.grid() else {
        return Step::Halted;
    };

    if grid.is_blocked(to.x, to.y, world) {
        kill(world, head, head, to, KillCause::Wall);
        return Step::Killed;
    }

    let occupants = grid.at(to.x, to.y).to_vec();
    if let Some(killer) = occupants
        .iter()
        .copied()
        .find(|occupant| *occupant != head && chain::is_member(world, *occupant, head))
    {
        kill(world, head, killer, to, KillCause::SelfCollision);
        return Step::Killed;
    }

    let pickup = occupants
        .iter()
        .copied()
        .find(|occupant| {
            world.has_tag(*occupant, tags::COLLECTIBLE)
                && world.has(*occupant, ComponentKind::Collectible)
        })
        .map(|collectible| snapshot(world, collectible, to));

    cascade(world, head, to);
    trace!(%head, x = to.x, y = to.y, "Chain stepped");
    world.emit(Event::ChainMoved {
        head,
        x: to.x,
        y: to.y,
    });

    if let Some(pickup) = pickup {
        world.emit(Event::CollectibleEaten {
            collectible: pickup.collectible,
            eater: head,
            kind: pickup.kind,
            freshness: pickup.freshness,
            x: pickup.position.x,
            y: pickup.position.y,
        });
    }
    Step::Moved
}

fn kill(world: &mut World, head: Entity, killer: Entity, at: Position, cause: KillCause) {
    if let Some(velocity) = world.get_mut::<Velocity>(head) {
        velocity.accumulator = Duration::ZERO;
    }
    debug!(%head, %killer, x = at.x, y = at.y, %cause, "Chain killed");
    world.emit(Event::ChainKilled {
        head,
        killer,
        x: at.x,
        y: at.y,
        cause,
    });
}

fn session_over(world: &World) -> bool {
    world
        .singleton(tags::GAME_STATE)
        .and_then(|entity| world.get::<GameState>(entity))
        .is_some_and(|state| !state.alive)
}

fn snapshot(world: &World, collectible: Entity, fallback: Position) -> Pickup {
    Pickup {
        collectible,
        kind: world
            .get::<Collectible>(collectible)
            .map_or_else(|| "unknown".to_owned(), |record| record.kind.clone()),
        freshness: world
            .get::<Lifetime>(collectible)
            .map_or(1.0, |lifetime| lifetime.freshness),
        position: world
            .get::<Position>(collectible)
            .copied()
            .unwrap_or(fallback),
    }
}

/// Moves the head to `to` and every following link into the cell its
/// predecessor just left.
fn cascade(world: &mut World, head: Entity, to: Position) {
    let mut vacated = to;
    for link in chain::links(world, head) {
        let Some(previous) = world.get::<Position>(link).copied() else {
            break;
        };
        let _ = world.relocate(link, vacated.x, vacated.y);
        vacated = previous;
    }
}
