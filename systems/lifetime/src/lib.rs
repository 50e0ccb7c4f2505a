#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Freshness decay and expiry of short-lived collectibles.

use sanctum_core::{tags, Collectible, ComponentKind, Event, Lifetime, Phase, Position};
use sanctum_world::World;
use tracing::debug;

/// UPDATE-phase system refreshing [`Lifetime::freshness`] and removing
/// collectibles whose lifespan has elapsed.
#[derive(Debug, Default)]
pub struct Lifetimes {
    expired: u64,
}

impl Lifetimes {
    /// Registers a fresh lifetime system in the UPDATE phase.
    ///
    /// Install it before movement so a pickup reports the freshness of the
    /// frame it happened in.
    pub fn install(world: &mut World) {
        let mut lifetimes = Self::default();
        world.add_system(
            "lifetimes",
            move |world: &mut World| lifetimes.handle(world),
            Phase::Update,
        );
    }

    /// Number of collectibles that expired since creation.
    #[must_use]
    pub const fn expired(&self) -> u64 {
        self.expired
    }

    /// Recomputes freshness at the current world time and expires spent
    /// collectibles with [`Event::CollectibleExpired`].
    ///
    /// Entities with a lifetime but no collectible tag only decay.
    pub fn handle(&mut self, world: &mut World) {
        let now = world.clock().now();
        for entity in world.query(&[ComponentKind::Lifetime]) {
            let Some(lifetime) = world.get_mut::<Lifetime>(entity) else {
                continue;
            };
            lifetime.freshness = lifetime.freshness_at(now);
            let spent = lifetime.expired_at(now);

            if !spent || !world.has_tag(entity, tags::COLLECTIBLE) {
                continue;
            }
            let kind = world
                .get::<Collectible>(entity)
                .map_or_else(String::new, |record| record.kind.clone());
            let position = world.get::<Position>(entity).copied().unwrap_or_default();
            world.destroy(entity);
            self.expired += 1;
            debug!(%entity, kind = %kind, "Collectible expired");
            world.emit(Event::CollectibleExpired {
                collectible: entity,
                kind,
                x: position.x,
                y: position.y,
            });
        }
    }
}
