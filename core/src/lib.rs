#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sanctum simulation.
//!
//! This crate defines the vocabulary every other crate speaks: opaque
//! [`Entity`] handles, the plain component records stored by the world,
//! the closed [`Phase`] schedule and the [`Event`] surface broadcast on the
//! world's bus. Nothing in here holds behaviour; systems live in their own
//! crates and communicate exclusively through world mutations and events.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

pub mod components;
pub mod config;

pub use components::{
    ChainLink, Collectible, Collider, ComponentKind, ComponentValue, Corruption, Drawable,
    GameState, Lifetime, PlayerControlled, Position, Velocity,
};
pub use config::{Config, ConfigError};

/// Opaque handle identifying an entity inside a world.
///
/// Handles carry no data of their own; every relationship between entities is
/// expressed as an `Option<Entity>` field resolved through the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(u32);

impl Entity {
    /// Creates a new entity handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unit step along one grid axis, or no motion at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Heading {
    /// Column delta, one of -1, 0 or 1.
    pub dx: i32,
    /// Row delta, one of -1, 0 or 1.
    pub dy: i32,
}

impl Heading {
    /// No motion.
    pub const NONE: Self = Self::new(0, 0);
    /// Toward decreasing row indices.
    pub const UP: Self = Self::new(0, -1);
    /// Toward increasing row indices.
    pub const DOWN: Self = Self::new(0, 1);
    /// Toward decreasing column indices.
    pub const LEFT: Self = Self::new(-1, 0);
    /// Toward increasing column indices.
    pub const RIGHT: Self = Self::new(1, 0);

    /// Creates a heading from raw deltas.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Reports whether the heading describes no motion.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Heading pointing the opposite way.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self::new(-self.dx, -self.dy)
    }

    /// Reports whether `self` exactly undoes `other`.
    #[must_use]
    pub fn is_reverse_of(self, other: Heading) -> bool {
        self == other.reversed()
    }
}

/// Named stage of the per-frame update order.
///
/// Phases form a closed set evaluated once per frame in [`Phase::ORDER`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Phase {
    /// Translates host input into intents.
    Input,
    /// Optional autopilot writing intents through the input path.
    Ai,
    /// Simulation: lifetimes, movement, session bookkeeping.
    Update,
    /// Presentation adapters reading world state.
    Render,
    /// Audio adapters reading world state.
    Audio,
}

impl Phase {
    /// Fixed evaluation order used by the frame driver.
    pub const ORDER: [Phase; 5] = [
        Phase::Input,
        Phase::Ai,
        Phase::Update,
        Phase::Render,
        Phase::Audio,
    ];
}

/// Reason a chain was killed.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize, Deserialize,
)]
pub enum KillCause {
    /// The head tried to leave the grid or enter a blocked cell.
    #[strum(serialize = "wall")]
    Wall,
    /// The head tried to enter a cell held by its own chain.
    #[strum(serialize = "self")]
    SelfCollision,
}

/// Events broadcast on the world's bus.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// An entity and all of its data left the world.
    EntityDestroyed {
        /// Handle that was destroyed.
        entity: Entity,
    },
    /// A chain head completed a step.
    ChainMoved {
        /// Head of the chain that moved.
        head: Entity,
        /// Column the head now occupies.
        x: i32,
        /// Row the head now occupies.
        y: i32,
    },
    /// A chain head collided and may not move further this frame.
    ChainKilled {
        /// Head of the chain that died.
        head: Entity,
        /// Entity that was struck, or the head itself for walls and bounds.
        killer: Entity,
        /// Column of the destination that was refused.
        x: i32,
        /// Row of the destination that was refused.
        y: i32,
        /// Why the step was refused.
        cause: KillCause,
    },
    /// New segments were appended to a chain's tail.
    ChainGrew {
        /// Head of the chain that grew.
        head: Entity,
        /// Last segment appended, which is now the tail.
        new_segment: Entity,
        /// Number of segments appended.
        count: u32,
    },
    /// A chain head stepped onto a collectible.
    CollectibleEaten {
        /// Collectible that was stepped on.
        collectible: Entity,
        /// Head that ate it.
        eater: Entity,
        /// Semantic type tag of the collectible.
        kind: String,
        /// Remaining life fraction in `0.0..=1.0` at the time of eating.
        freshness: f32,
        /// Column of the collectible.
        x: i32,
        /// Row of the collectible.
        y: i32,
    },
    /// A collectible's lifetime ran out before anything ate it.
    CollectibleExpired {
        /// Collectible that expired.
        collectible: Entity,
        /// Semantic type tag of the collectible.
        kind: String,
        /// Column of the collectible.
        x: i32,
        /// Row of the collectible.
        y: i32,
    },
    /// The first accepted input started the session.
    GameStarted,
    /// The session ended. Emitted at most once per session.
    GameOver {
        /// Final score.
        score: u32,
        /// Ambient corruption reading at the moment of death.
        corruption: f32,
        /// Cause of the killing blow.
        cause: KillCause,
    },
}

impl Event {
    /// Discriminant used to route the event to subscribers.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::EntityDestroyed { .. } => EventKind::EntityDestroyed,
            Self::ChainMoved { .. } => EventKind::ChainMoved,
            Self::ChainKilled { .. } => EventKind::ChainKilled,
            Self::ChainGrew { .. } => EventKind::ChainGrew,
            Self::CollectibleEaten { .. } => EventKind::CollectibleEaten,
            Self::CollectibleExpired { .. } => EventKind::CollectibleExpired,
            Self::GameStarted => EventKind::GameStarted,
            Self::GameOver { .. } => EventKind::GameOver,
        }
    }
}

/// Payload-free discriminant of [`Event`], used as the subscription key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum EventKind {
    /// See [`Event::EntityDestroyed`].
    EntityDestroyed,
    /// See [`Event::ChainMoved`].
    ChainMoved,
    /// See [`Event::ChainKilled`].
    ChainKilled,
    /// See [`Event::ChainGrew`].
    ChainGrew,
    /// See [`Event::CollectibleEaten`].
    CollectibleEaten,
    /// See [`Event::CollectibleExpired`].
    CollectibleExpired,
    /// See [`Event::GameStarted`].
    GameStarted,
    /// See [`Event::GameOver`].
    GameOver,
}

/// Role tags attached to entities for role-based queries.
pub mod tags {
    /// Head of a player-controlled chain.
    pub const SNAKE_HEAD: &str = "snakeHead";
    /// Body segment of a chain.
    pub const SNAKE_SEGMENT: &str = "snakeSegment";
    /// Anything a chain head can eat.
    pub const COLLECTIBLE: &str = "collectible";
    /// Candle collectible.
    pub const CANDLE: &str = "candle";
    /// Hellfire collectible.
    pub const HELLFIRE: &str = "hellfire";
    /// Solid perimeter or interior wall tile.
    pub const WALL: &str = "wall";
    /// Solid multi-tile static obstacle.
    pub const OBSTACLE: &str = "obstacle";
    /// Singleton holding the session's [`GameState`](crate::GameState).
    pub const GAME_STATE: &str = "gameState";
    /// Singleton holding the ambient [`Corruption`](crate::Corruption) reading.
    pub const CORRUPTION: &str = "corruption";
}

/// Render layers and within-layer ordering. Lower values draw first.
pub mod layers {
    /// Floor tiles.
    pub const LAYER_FLOOR: i32 = 0;
    /// Walls and static structures.
    pub const LAYER_STRUCTURE: i32 = 1;
    /// Collectibles and chains.
    pub const LAYER_ENTITY: i32 = 2;
    /// Overlays drawn above everything else.
    pub const LAYER_OVERLAY: i32 = 3;

    /// Default ordering within a layer.
    pub const Z_BASE: i32 = 0;
    /// Detail drawn above base items.
    pub const Z_DETAIL: i32 = 1;
    /// Chain body segments.
    pub const Z_SNAKE: i32 = 9;
    /// Chain heads, drawn above their own body.
    pub const Z_SNAKE_HEAD: i32 = 10;
}

#[cfg(test)]
mod tests {
    use super::{Event, EventKind, Heading, KillCause, Entity, Phase};

    #[test]
    fn reversal_detects_exact_opposites_only() {
        assert!(Heading::LEFT.is_reverse_of(Heading::RIGHT));
        assert!(Heading::UP.is_reverse_of(Heading::DOWN));
        assert!(!Heading::UP.is_reverse_of(Heading::RIGHT));
        assert_eq!(Heading::RIGHT.reversed(), Heading::LEFT);
    }

    #[test]
    fn zero_heading_is_its_own_reverse() {
        assert!(Heading::NONE.is_zero());
        assert!(Heading::NONE.is_reverse_of(Heading::NONE));
        assert!(!Heading::RIGHT.is_reverse_of(Heading::NONE));
    }

    #[test]
    fn phase_order_is_fixed() {
        assert_eq!(
            Phase::ORDER,
            [Phase::Input, Phase::Ai, Phase::Update, Phase::Render, Phase::Audio]
        );
        assert_eq!(Phase::Update.to_string(), "UPDATE");
    }

    #[test]
    fn kill_cause_displays_wire_names() {
        assert_eq!(KillCause::Wall.to_string(), "wall");
        assert_eq!(KillCause::SelfCollision.to_string(), "self");
    }

    #[test]
    fn event_kind_matches_variant() {
        let event = Event::ChainMoved {
            head: Entity::new(1),
            x: 3,
            y: 4,
        };
        assert_eq!(event.kind(), EventKind::ChainMoved);
        assert_eq!(Event::GameStarted.kind(), EventKind::GameStarted);
        assert_eq!(EventKind::CollectibleEaten.to_string(), "collectibleEaten");
    }
}
