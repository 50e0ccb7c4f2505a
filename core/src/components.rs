//! Plain component records stored by the world.
//!
//! Components are pure data keyed by entity and by [`ComponentKind`]. None of
//! them holds behaviour and every cross-entity reference is an optional
//! [`Entity`] handle.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::{Entity, Heading};

/// Closed set of component kinds known to the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, IntoStaticStr, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "camelCase")]
pub enum ComponentKind {
    /// [`Position`] record.
    Position,
    /// [`Velocity`] record.
    Velocity,
    /// [`Collider`] record.
    Collider,
    /// [`ChainLink`] record.
    ChainLink,
    /// [`PlayerControlled`] record.
    PlayerControlled,
    /// [`Collectible`] record.
    Collectible,
    /// [`Lifetime`] record.
    Lifetime,
    /// [`GameState`] record.
    GameState,
    /// [`Corruption`] record.
    Corruption,
    /// [`Drawable`] record.
    Drawable,
}

/// Integer grid coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based column.
    pub x: i32,
    /// Zero-based row.
    pub y: i32,
}

impl Position {
    /// Creates a position at the provided column and row.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position one step away along `heading`.
    #[must_use]
    pub const fn offset(self, heading: Heading) -> Self {
        Self::new(self.x + heading.dx, self.y + heading.dy)
    }
}

/// Discrete stepping state of a moving entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Velocity {
    /// Direction taken on the next step.
    pub heading: Heading,
    /// Simulated time between successive steps.
    pub interval: Duration,
    /// Time accumulated toward the next step.
    pub accumulator: Duration,
}

impl Velocity {
    /// Creates a velocity with an empty accumulator.
    #[must_use]
    pub const fn new(heading: Heading, interval: Duration) -> Self {
        Self {
            heading,
            interval,
            accumulator: Duration::ZERO,
        }
    }
}

/// Physical presence of an entity on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collider {
    /// Blocks movement into every cell of the footprint.
    pub solid: bool,
    /// Detectable without blocking.
    pub trigger: bool,
    /// Footprint width in cells, anchored at the entity's position.
    pub width: u32,
    /// Footprint height in cells, anchored at the entity's position.
    pub height: u32,
}

impl Collider {
    /// Solid single-cell collider.
    #[must_use]
    pub const fn solid() -> Self {
        Self {
            solid: true,
            trigger: false,
            width: 1,
            height: 1,
        }
    }

    /// Non-blocking single-cell trigger.
    #[must_use]
    pub const fn trigger() -> Self {
        Self {
            solid: false,
            trigger: true,
            width: 1,
            height: 1,
        }
    }

    /// Same collider spanning `width` x `height` cells.
    #[must_use]
    pub const fn with_footprint(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    /// Footprint dimensions, never smaller than one cell.
    #[must_use]
    pub fn footprint(&self) -> (u32, u32) {
        (self.width.max(1), self.height.max(1))
    }
}

/// Membership of an entity in a singly linked chain.
///
/// Index 0 is the head. Every link, the head included, names the head.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    /// Head of the chain this link belongs to.
    pub head: Option<Entity>,
    /// Link directly in front of this one, `None` for the head.
    pub parent: Option<Entity>,
    /// Link directly behind this one, `None` for the tail.
    pub child: Option<Entity>,
    /// Zero-based position along the chain.
    pub index: u32,
}

/// Marks an entity as steerable by the input path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerControlled {
    /// Heading committed into [`Velocity`] at the next step boundary.
    pub next: Heading,
}

/// Something a chain head can eat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collectible {
    /// Semantic type tag, e.g. `"candle"`.
    pub kind: String,
    /// Score granted before the freshness bonus.
    pub base_score: u32,
    /// Segments granted before the freshness bonus.
    pub segments: u32,
}

/// Bounded lifespan with a derived freshness fraction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    /// World time at which the entity was created.
    pub birth: Duration,
    /// Total lifespan.
    pub duration: Duration,
    /// Remaining life fraction in `0.0..=1.0`.
    pub freshness: f32,
}

impl Lifetime {
    /// Creates a fresh lifetime starting at `birth`.
    #[must_use]
    pub const fn new(birth: Duration, duration: Duration) -> Self {
        Self {
            birth,
            duration,
            freshness: 1.0,
        }
    }

    /// Remaining life fraction at world time `now`.
    #[must_use]
    pub fn freshness_at(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 0.0;
        }
        let elapsed = now.saturating_sub(self.birth);
        let spent = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        (1.0 - spent).clamp(0.0, 1.0) as f32
    }

    /// Reports whether the lifespan has fully elapsed at world time `now`.
    #[must_use]
    pub fn expired_at(&self, now: Duration) -> bool {
        now.saturating_sub(self.birth) >= self.duration
    }
}

/// Session-wide state carried by a singleton entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Accumulated score.
    pub score: u32,
    /// Flips from `true` to `false` exactly once per session.
    pub alive: bool,
    /// Set by the first accepted input.
    pub started: bool,
    /// Simulated time spent playing.
    pub game_time: Duration,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            score: 0,
            alive: true,
            started: false,
            game_time: Duration::ZERO,
        }
    }
}

/// Ambient corruption reading maintained outside the core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Corruption {
    /// Current value.
    pub value: f32,
    /// Value the ambient layer is easing toward.
    pub target: f32,
}

/// Presentation hint consumed by render adapters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drawable {
    /// Renderer lookup key.
    pub kind: String,
    /// Coarse draw order.
    pub layer: i32,
    /// Draw order within the layer.
    pub z_index: i32,
    /// Hidden drawables are skipped by the render queue.
    pub visible: bool,
}

impl Drawable {
    /// Creates a visible drawable.
    #[must_use]
    pub fn new(kind: impl Into<String>, layer: i32, z_index: i32) -> Self {
        Self {
            kind: kind.into(),
            layer,
            z_index,
            visible: true,
        }
    }
}

macro_rules! component_values {
    ($($variant:ident),+ $(,)?) => {
        /// Any component record tagged with its kind, used to spawn entities
        /// with several components in one call.
        #[derive(Clone, Debug, PartialEq)]
        pub enum ComponentValue {
            $(
                #[doc = concat!("A [`", stringify!($variant), "`] record.")]
                $variant($variant),
            )+
        }

        impl ComponentValue {
            /// Kind of the wrapped record.
            #[must_use]
            pub const fn kind(&self) -> ComponentKind {
                match self {
                    $(Self::$variant(_) => ComponentKind::$variant,)+
                }
            }
        }

        $(
            impl From<$variant> for ComponentValue {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

component_values!(
    Position,
    Velocity,
    Collider,
    ChainLink,
    PlayerControlled,
    Collectible,
    Lifetime,
    GameState,
    Corruption,
    Drawable,
);
