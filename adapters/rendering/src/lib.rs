#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Sanctum adapters.
//!
//! The simulation never draws. Adapters read an ordered snapshot of every
//! visible drawable through [`render_queue`] and hand each item to the
//! handler registered for its [`Drawable::kind`].

use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

use sanctum_core::{ComponentKind, Drawable, Entity, Phase, Position};
use sanctum_world::World;
use tracing::trace;

/// One visible entity ready to be drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderItem {
    /// Entity being drawn.
    pub entity: Entity,
    /// Grid cell of the entity's anchor.
    pub position: Position,
    /// Presentation hint of the entity.
    pub drawable: Drawable,
}

/// Collects every visible drawable with a position, ordered by layer, then
/// z-index, then entity handle.
#[must_use]
pub fn render_queue(world: &World) -> Vec<RenderItem> {
    let mut items: Vec<RenderItem> = world
        .query(&[ComponentKind::Position, ComponentKind::Drawable])
        .into_iter()
        .filter_map(|entity| {
            let position = *world.get::<Position>(entity)?;
            let drawable = world.get::<Drawable>(entity)?;
            drawable.visible.then(|| RenderItem {
                entity,
                position,
                drawable: drawable.clone(),
            })
        })
        .collect();
    items.sort_by_key(|item| (item.drawable.layer, item.drawable.z_index, item.entity));
    items
}

/// Handler drawing one item onto a target of type `T`.
pub type RenderHandler<T> = Box<dyn FnMut(&mut T, &RenderItem)>;

/// String-keyed table of per-kind draw handlers.
pub struct RendererRegistry<T> {
    handlers: BTreeMap<String, RenderHandler<T>>,
}

impl<T> RendererRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Registers `handler` for `kind`, replacing any previous handler.
    pub fn register<F>(&mut self, kind: impl Into<String>, handler: F)
    where
        F: FnMut(&mut T, &RenderItem) + 'static,
    {
        let _ = self.handlers.insert(kind.into(), Box::new(handler));
    }

    /// Reports whether a handler exists for `kind`.
    #[must_use]
    pub fn handles(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Draws `items` in order. Items whose kind has no handler are skipped.
    ///
    /// Returns the number of items drawn.
    pub fn draw(&mut self, target: &mut T, items: &[RenderItem]) -> usize {
        let mut drawn = 0;
        for item in items {
            match self.handlers.get_mut(&item.drawable.kind) {
                Some(handler) => {
                    handler(target, item);
                    drawn += 1;
                }
                None => trace!(entity = %item.entity, kind = %item.drawable.kind, "No renderer"),
            }
        }
        drawn
    }

    /// Draws the world's current render queue onto `target`.
    pub fn render(&mut self, world: &World, target: &mut T) -> usize {
        let items = render_queue(world);
        self.draw(target, &items)
    }
}

impl<T: 'static> RendererRegistry<T> {
    /// Registers the registry as a RENDER-phase system drawing onto the
    /// shared `target` every frame.
    ///
    /// A frame is skipped while the host still borrows the target.
    pub fn install(mut self, world: &mut World, target: Rc<RefCell<T>>) {
        world.add_system(
            "render",
            move |world: &mut World| match target.try_borrow_mut() {
                Ok(mut target) => {
                    let _ = self.render(world, &mut target);
                }
                Err(_) => trace!(frame = world.clock().frame(), "Render target busy"),
            },
            Phase::Render,
        );
    }
}

impl<T> Default for RendererRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RendererRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(entity: u32, kind: &str) -> RenderItem {
        RenderItem {
            entity: Entity::new(entity),
            position: Position::new(0, 0),
            drawable: Drawable::new(kind, 0, 0),
        }
    }

    #[test]
    fn unknown_kinds_are_skipped() {
        let mut registry = RendererRegistry::<Vec<u32>>::new();
        registry.register("candle", |drawn: &mut Vec<u32>, item: &RenderItem| {
            drawn.push(item.entity.get());
        });
        let mut drawn = Vec::new();

        let items = [item(1, "candle"), item(2, "pew"), item(3, "candle")];

        let count = registry.draw(&mut drawn, &items);

        assert_eq!(count, 2);
        assert_eq!(drawn, vec![1, 3]);
    }

    #[test]
    fn registering_twice_replaces_the_handler() {
        let mut registry = RendererRegistry::<Vec<&'static str>>::default();
        registry.register("wall", |drawn: &mut Vec<&'static str>, _: &RenderItem| {
            drawn.push("old");
        });
        registry.register("wall", |drawn: &mut Vec<&'static str>, _: &RenderItem| {
            drawn.push("new");
        });
        let mut drawn = Vec::new();

        let _ = registry.draw(&mut drawn, &[item(1, "wall")]);

        assert_eq!(drawn, vec!["new"]);
        assert!(registry.handles("wall"));
        assert!(!registry.handles("candle"));
    }
}
