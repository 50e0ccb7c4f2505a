//! Arena-of-components storage keyed by entity handle.

use std::collections::BTreeMap;

use sanctum_core::{
    ChainLink, Collectible, Collider, ComponentKind, ComponentValue, Corruption, Drawable, Entity,
    GameState, Lifetime, PlayerControlled, Position, Velocity,
};

/// Component record with a dedicated column in [`ComponentStores`].
pub trait Component: Sized + 'static {
    /// Kind under which the record is stored and queried.
    const KIND: ComponentKind;

    /// Column holding every record of this kind.
    fn column(stores: &ComponentStores) -> &BTreeMap<Entity, Self>;

    /// Mutable column holding every record of this kind.
    fn column_mut(stores: &mut ComponentStores) -> &mut BTreeMap<Entity, Self>;
}

/// Components that can be edited in place without touching the spatial index.
///
/// [`Position`] and [`Collider`] decide which grid cells an entity occupies, so
/// they are only replaced through the world, which keeps the grid in step.
pub trait Mutable: Component {}

macro_rules! component_stores {
    ($($ty:ident => $field:ident),+ $(,)?) => {
        /// One ordered column per component kind.
        #[derive(Clone, Debug, Default)]
        pub struct ComponentStores {
            $($field: BTreeMap<Entity, $ty>,)+
        }

        $(
            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                fn column(stores: &ComponentStores) -> &BTreeMap<Entity, Self> {
                    &stores.$field
                }

                fn column_mut(stores: &mut ComponentStores) -> &mut BTreeMap<Entity, Self> {
                    &mut stores.$field
                }
            }
        )+

        impl ComponentStores {
            /// Number of live records of `kind`.
            #[must_use]
            pub fn len(&self, kind: ComponentKind) -> usize {
                match kind {
                    $(ComponentKind::$ty => self.$field.len(),)+
                }
            }

            /// Reports whether `entity` holds a record of `kind`.
            #[must_use]
            pub fn contains(&self, entity: Entity, kind: ComponentKind) -> bool {
                match kind {
                    $(ComponentKind::$ty => self.$field.contains_key(&entity),)+
                }
            }

            pub(crate) fn entities(&self, kind: ComponentKind) -> Vec<Entity> {
                match kind {
                    $(ComponentKind::$ty => self.$field.keys().copied().collect(),)+
                }
            }

            pub(crate) fn insert(&mut self, entity: Entity, value: ComponentValue) {
                match value {
                    $(ComponentValue::$ty(record) => {
                        let _ = self.$field.insert(entity, record);
                    })+
                }
            }

            pub(crate) fn remove(&mut self, entity: Entity, kind: ComponentKind) -> bool {
                match kind {
                    $(ComponentKind::$ty => self.$field.remove(&entity).is_some(),)+
                }
            }

            pub(crate) fn remove_all(&mut self, entity: Entity) {
                $(let _ = self.$field.remove(&entity);)+
            }
        }
    };
}

component_stores!(
    Position => positions,
    Velocity => velocities,
    Collider => colliders,
    ChainLink => chain_links,
    PlayerControlled => player_controlled,
    Collectible => collectibles,
    Lifetime => lifetimes,
    GameState => game_states,
    Corruption => corruptions,
    Drawable => drawables,
);

impl Mutable for Velocity {}
impl Mutable for ChainLink {}
impl Mutable for PlayerControlled {}
impl Mutable for Collectible {}
impl Mutable for Lifetime {}
impl Mutable for GameState {}
impl Mutable for Corruption {}
impl Mutable for Drawable {}

/// Read-only access to component records, implemented by every container
/// that stores them.
pub trait ComponentReader {
    /// Record of type `C` held by `entity`, if any.
    fn read<C: Component>(&self, entity: Entity) -> Option<&C>;

    /// Reports whether `entity` holds a record of `kind`.
    fn has(&self, entity: Entity, kind: ComponentKind) -> bool;
}

impl ComponentReader for ComponentStores {
    fn read<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.get(entity)
    }

    fn has(&self, entity: Entity, kind: ComponentKind) -> bool {
        self.contains(entity, kind)
    }
}

impl ComponentStores {
    /// Record of type `C` held by `entity`, if any.
    #[must_use]
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        C::column(self).get(&entity)
    }

    /// Mutable record of type `C` held by `entity`, if any.
    pub fn get_mut<C: Mutable>(&mut self, entity: Entity) -> Option<&mut C> {
        C::column_mut(self).get_mut(&entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_routes_values_to_their_column() {
        let mut stores = ComponentStores::default();
        let entity = Entity::new(4);
        stores.insert(entity, Position::new(2, 3).into());
        stores.insert(entity, Collider::solid().into());

        assert_eq!(stores.get::<Position>(entity), Some(&Position::new(2, 3)));
        assert!(stores.contains(entity, ComponentKind::Collider));
        assert!(!stores.contains(entity, ComponentKind::Velocity));
        assert_eq!(stores.len(ComponentKind::Position), 1);
    }

    #[test]
    fn remove_all_clears_every_column() {
        let mut stores = ComponentStores::default();
        let entity = Entity::new(1);
        stores.insert(entity, Position::new(0, 0).into());
        stores.insert(entity, GameState::default().into());
        stores.remove_all(entity);

        assert_eq!(stores.len(ComponentKind::Position), 0);
        assert_eq!(stores.len(ComponentKind::GameState), 0);
        assert!(!stores.remove(entity, ComponentKind::Position));
    }
}
