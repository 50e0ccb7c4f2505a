#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn helpers that assemble entities from core components.
//!
//! Level generation, growth and tests all go through these functions so a
//! given role always carries the same components, tags and drawable.

use std::time::Duration;

use sanctum_core::{
    config::{CollectibleConfig, Reward},
    layers::{LAYER_ENTITY, LAYER_FLOOR, LAYER_STRUCTURE, Z_BASE, Z_DETAIL, Z_SNAKE, Z_SNAKE_HEAD},
    tags, ChainLink, Collectible, Collider, Config, Corruption, Drawable, Entity, GameState,
    Heading, Lifetime, PlayerControlled, Position, Velocity,
};
use sanctum_world::World;
use tracing::trace;

/// Handles of a freshly spawned chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnakeIds {
    /// Head of the chain.
    pub head: Entity,
    /// Body segments from just behind the head to the tail.
    pub segments: Vec<Entity>,
}

/// Spawns a player-controlled chain of `length` links with its head at
/// `(x, y)`, heading right, and body segments trailing toward decreasing
/// columns. A zero length still spawns the head.
pub fn spawn_snake(world: &mut World, x: i32, y: i32, length: u32, interval: Duration) -> SnakeIds {
    let head = world.spawn([
        Position::new(x, y).into(),
        Drawable::new(tags::SNAKE_HEAD, LAYER_ENTITY, Z_SNAKE_HEAD).into(),
        Velocity::new(Heading::RIGHT, interval).into(),
        PlayerControlled {
            next: Heading::RIGHT,
        }
        .into(),
        Collider::trigger().into(),
    ]);
    world.add(
        head,
        ChainLink {
            head: Some(head),
            parent: None,
            child: None,
            index: 0,
        },
    );
    world.tag(head, tags::SNAKE_HEAD);

    let mut segments = Vec::new();
    let mut parent = head;
    for index in 1..length.max(1) {
        let offset = i32::try_from(index).unwrap_or(i32::MAX);
        let segment = spawn_segment(world, head, parent, x.saturating_sub(offset), y, index);
        segments.push(segment);
        parent = segment;
    }
    trace!(%head, length = segments.len() + 1, x, y, "Spawned snake");
    SnakeIds { head, segments }
}

/// Spawns the configured player chain at `(x, y)`.
pub fn spawn_player(world: &mut World, config: &Config, x: i32, y: i32) -> SnakeIds {
    spawn_snake(
        world,
        x,
        y,
        config.snake.initial_length,
        config.snake.move_interval(),
    )
}

/// Spawns a body segment behind `parent` and links the parent to it.
pub fn spawn_segment(
    world: &mut World,
    head: Entity,
    parent: Entity,
    x: i32,
    y: i32,
    index: u32,
) -> Entity {
    let segment = world.spawn([
        Position::new(x, y).into(),
        Drawable::new(tags::SNAKE_SEGMENT, LAYER_ENTITY, Z_SNAKE).into(),
        ChainLink {
            head: Some(head),
            parent: Some(parent),
            child: None,
            index,
        }
        .into(),
        Collider::trigger().into(),
    ]);
    world.tag(segment, tags::SNAKE_SEGMENT);
    if let Some(link) = world.get_mut::<ChainLink>(parent) {
        link.child = Some(segment);
    }
    segment
}

/// Spawns a collectible of `kind` granting `reward`, born at the current
/// world time.
pub fn spawn_collectible(
    world: &mut World,
    kind: &str,
    reward: Reward,
    lifetime: Duration,
    x: i32,
    y: i32,
) -> Entity {
    let birth = world.clock().now();
    let entity = world.spawn([
        Position::new(x, y).into(),
        Drawable::new(kind, LAYER_ENTITY, Z_BASE).into(),
        Collectible {
            kind: kind.to_owned(),
            base_score: reward.base_score,
            segments: reward.segments,
        }
        .into(),
        Lifetime::new(birth, lifetime).into(),
    ]);
    world.tag(entity, kind);
    world.tag(entity, tags::COLLECTIBLE);
    trace!(%entity, kind, x, y, "Spawned collectible");
    entity
}

/// Spawns a candle.
pub fn spawn_candle(world: &mut World, config: &CollectibleConfig, x: i32, y: i32) -> Entity {
    spawn_collectible(world, tags::CANDLE, config.candle, config.lifetime(), x, y)
}

/// Spawns a hellfire.
pub fn spawn_hellfire(world: &mut World, config: &CollectibleConfig, x: i32, y: i32) -> Entity {
    spawn_collectible(world, tags::HELLFIRE, config.hellfire, config.lifetime(), x, y)
}

/// Spawns a solid single-cell wall.
pub fn spawn_wall(world: &mut World, x: i32, y: i32) -> Entity {
    let entity = world.spawn([
        Position::new(x, y).into(),
        Drawable::new(tags::WALL, LAYER_FLOOR, Z_DETAIL).into(),
        Collider::solid().into(),
    ]);
    world.tag(entity, tags::WALL);
    entity
}

/// Spawns a solid static obstacle anchored at `(x, y)` and covering
/// `width` x `height` cells, such as an altar.
pub fn spawn_obstacle(
    world: &mut World,
    kind: &str,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
) -> Entity {
    let entity = world.spawn([
        Position::new(x, y).into(),
        Drawable::new(kind, LAYER_STRUCTURE, Z_BASE).into(),
        Collider::solid().with_footprint(width, height).into(),
    ]);
    world.tag(entity, kind);
    world.tag(entity, tags::OBSTACLE);
    entity
}

/// Spawns the session's [`GameState`] singleton.
pub fn spawn_game_state(world: &mut World) -> Entity {
    let entity = world.spawn([GameState::default().into()]);
    world.tag(entity, tags::GAME_STATE);
    entity
}

/// Spawns the ambient [`Corruption`] singleton.
pub fn spawn_corruption(world: &mut World) -> Entity {
    let entity = world.spawn([Corruption::default().into()]);
    world.tag(entity, tags::CORRUPTION);
    entity
}

/// Handles of the session singletons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SingletonIds {
    /// Entity carrying [`GameState`].
    pub game_state: Entity,
    /// Entity carrying [`Corruption`].
    pub corruption: Entity,
}

/// Spawns every session singleton.
pub fn spawn_singletons(world: &mut World) -> SingletonIds {
    SingletonIds {
        game_state: spawn_game_state(world),
        corruption: spawn_corruption(world),
    }
}
