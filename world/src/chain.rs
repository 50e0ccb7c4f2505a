//! Walking helpers for chains of [`ChainLink`]s.

use sanctum_core::{ChainLink, ComponentKind, Entity};

use crate::World;

/// Links of the chain headed by `head`, from head to tail.
///
/// The walk stops at the first handle without a [`ChainLink`]. A head without
/// a link yields an empty chain.
#[must_use]
pub fn links(world: &World, head: Entity) -> Vec<Entity> {
    let bound = world.components().len(ComponentKind::ChainLink);
    let mut walked = Vec::new();
    let mut cursor = Some(head);
    while let Some(entity) = cursor {
        let Some(link) = world.get::<ChainLink>(entity) else {
            break;
        };
        let cyclic = walked.len() >= bound;
        debug_assert!(!cyclic, "chain headed by {head} contains a cycle");
        if cyclic {
            break;
        }
        walked.push(entity);
        cursor = link.child;
    }
    walked
}

/// Last link of the chain headed by `head`.
#[must_use]
pub fn tail(world: &World, head: Entity) -> Option<Entity> {
    links(world, head).last().copied()
}

/// Reports whether `entity` belongs to the chain headed by `head`, the head
/// itself included.
#[must_use]
pub fn is_member(world: &World, entity: Entity, head: Entity) -> bool {
    entity == head
        || world
            .get::<ChainLink>(entity)
            .is_some_and(|link| link.head == Some(head))
}

/// Reports whether every link agrees with its neighbours: each names `head`,
/// points back at its predecessor and carries its position as index, and the
/// last link has no child.
#[must_use]
pub fn is_well_formed(world: &World, head: Entity) -> bool {
    let walked = links(world, head);
    if walked.first() != Some(&head) {
        return false;
    }
    let mut parent = None;
    for (index, entity) in walked.iter().enumerate() {
        let Some(link) = world.get::<ChainLink>(*entity) else {
            return false;
        };
        let index_matches = usize::try_from(link.index).is_ok_and(|value| value == index);
        if link.head != Some(head) || link.parent != parent || !index_matches {
            return false;
        }
        parent = Some(*entity);
    }
    walked
        .last()
        .and_then(|last| world.get::<ChainLink>(*last))
        .is_some_and(|link| link.child.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanctum_core::Position;

    fn linked(world: &mut World, length: u32) -> Vec<Entity> {
        let entities: Vec<Entity> = (0..length)
            .map(|offset| world.spawn([Position::new(10 - offset as i32, 0).into()]))
            .collect();
        for (index, entity) in entities.iter().enumerate() {
            world.add(
                *entity,
                ChainLink {
                    head: Some(entities[0]),
                    parent: index.checked_sub(1).map(|previous| entities[previous]),
                    child: entities.get(index + 1).copied(),
                    index: index as u32,
                },
            );
        }
        entities
    }

    #[test]
    fn walks_head_to_tail() {
        let mut world = World::new();
        let chain = linked(&mut world, 4);
        assert_eq!(links(&world, chain[0]), chain);
        assert_eq!(tail(&world, chain[0]), Some(chain[3]));
        assert!(is_well_formed(&world, chain[0]));
    }

    #[test]
    fn membership_includes_the_head() {
        let mut world = World::new();
        let chain = linked(&mut world, 2);
        let stranger = world.spawn([Position::new(0, 0).into()]);
        assert!(is_member(&world, chain[0], chain[0]));
        assert!(is_member(&world, chain[1], chain[0]));
        assert!(!is_member(&world, stranger, chain[0]));
    }

    #[test]
    fn broken_back_pointer_is_detected() {
        let mut world = World::new();
        let chain = linked(&mut world, 3);
        if let Some(link) = world.get_mut::<ChainLink>(chain[2]) {
            link.parent = Some(chain[0]);
        }
        assert!(!is_well_formed(&world, chain[0]));
    }
}
