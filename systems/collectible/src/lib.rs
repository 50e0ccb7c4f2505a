#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reactive consequences of pickups and deaths, plus the session clock.
//!
//! Nothing in here polls. The listeners react to [`Event::CollectibleEaten`]
//! by destroying the collectible, growing the eater's chain and crediting the
//! score, and to [`Event::ChainKilled`] by ending the session exactly once.

use sanctum_core::{
    config::CollectibleConfig, tags, ChainLink, Collectible, Corruption, Entity, Event, EventKind,
    GameState, KillCause, Phase, Position,
};
use sanctum_system_spawning::spawn_segment;
use sanctum_world::{chain, ListenerId, World};
use tracing::{debug, info, warn};

/// Subscriptions created by [`install`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectibleListeners {
    /// Listener for [`EventKind::CollectibleEaten`].
    pub eaten: ListenerId,
    /// Listener for [`EventKind::ChainKilled`].
    pub killed: ListenerId,
}

/// Subscribes the pickup and death listeners on the world's bus.
pub fn install(world: &mut World, config: CollectibleConfig) -> CollectibleListeners {
    let eaten = world.subscribe(EventKind::CollectibleEaten, move |world: &mut World, event: &Event| {
        if let Event::CollectibleEaten {
            collectible,
            eater,
            freshness,
            ..
        } = event
        {
            on_eaten(world, &config, *collectible, *eater, *freshness);
        }
    });
    let killed = world.subscribe(EventKind::ChainKilled, |world: &mut World, event: &Event| {
        if let Event::ChainKilled { cause, .. } = event {
            on_killed(world, *cause);
        }
    });
    CollectibleListeners { eaten, killed }
}

fn on_eaten(
    world: &mut World,
    config: &CollectibleConfig,
    collectible: Entity,
    head: Entity,
    freshness: f32,
) {
    let (segments, base_score) = world.get::<Collectible>(collectible).map_or(
        (config.fallback.segments, config.fallback.base_score),
        |record| (record.segments, record.base_score),
    );
    world.destroy(collectible);

    let count = config.growth_for(segments, freshness);
    let score = config.score_for(base_score, freshness);

    let grown = grow(world, head, count);

    if let Some(state) = game_state_mut(world) {
        state.score = state.score.saturating_add(score);
    }

    if let Some(new_segment) = grown {
        debug!(%head, count, "Chain grew");
        world.emit(Event::ChainGrew {
            head,
            new_segment,
            count,
        });
    }
}

/// Appends `count` segments at the tail's current cell. Returns the new
/// tail (the old one when `count` is zero), or `None` when the chain has no
/// positioned tail.
fn grow(world: &mut World, head: Entity, count: u32) -> Option<Entity> {
    let tail = chain::tail(world, head);
    let anchor = tail.and_then(|tail| {
        let position = world.get::<Position>(tail).copied()?;
        let index = world.get::<ChainLink>(tail)?.index;
        Some((tail, position, index))
    });
    let Some((tail, position, mut index)) = anchor else {
        warn!(%head, "Cannot grow a chain without a positioned tail");
        return None;
    };

    let mut parent = tail;
    for _ in 0..count {
        index += 1;
        parent = spawn_segment(world, head, parent, position.x, position.y, index);
    }
    debug_assert!(chain::is_well_formed(world, head), "growth broke chain {head}");
    Some(parent)
}

fn on_killed(world: &mut World, cause: KillCause) {
    let Some(state) = game_state_mut(world) else {
        return;
    };
    if !state.alive {
        return;
    }
    state.alive = false;
    let score = state.score;

    let corruption = world
        .singleton(tags::CORRUPTION)
        .and_then(|entity| world.get::<Corruption>(entity))
        .map_or(0.0, |corruption| corruption.value);

    info!(score, corruption, %cause, "Game over");
    world.emit(Event::GameOver {
        score,
        corruption,
        cause,
    });
}

fn game_state_mut(world: &mut World) -> Option<&mut GameState> {
    let entity = world.singleton(tags::GAME_STATE)?;
    world.get_mut::<GameState>(entity)
}

/// Accumulates played time into [`GameState::game_time`] while the session
/// is started and alive.
#[derive(Debug, Default)]
pub struct SessionClock;

impl SessionClock {
    /// Registers the clock in the UPDATE phase.
    pub fn install(world: &mut World) {
        let mut clock = Self;
        world.add_system(
            "session-clock",
            move |world: &mut World| clock.handle(world),
            Phase::Update,
        );
    }

    /// Adds the current frame's duration to the running session.
    pub fn handle(&mut self, world: &mut World) {
        let dt = world.clock().dt();
        if let Some(state) = game_state_mut(world) {
            if state.started && state.alive {
                state.game_time = state.game_time.saturating_add(dt);
            }
        }
    }
}
