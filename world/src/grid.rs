//! Cell-to-entity index with a static blocked bitmap.

use std::collections::BTreeMap;

use sanctum_core::{Collider, ComponentKind, Entity, Position};
use smallvec::SmallVec;
use tracing::trace;

use crate::store::ComponentReader;

/// Spatial index mapping every grid cell to the entities occupying it.
///
/// The grid never reads the entity store directly. Queries that need
/// component data take a [`ComponentReader`].
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    columns: u32,
    rows: u32,
    cells: Vec<SmallVec<[Entity; 4]>>,
    blocked: Vec<bool>,
    registrations: BTreeMap<Entity, SmallVec<[usize; 1]>>,
}

impl SpatialGrid {
    /// Creates an empty grid of `columns` x `rows` cells.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![SmallVec::new(); capacity],
            blocked: vec![false; capacity],
            registrations: BTreeMap::new(),
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let column = u32::try_from(x).ok()?;
        let row = u32::try_from(y).ok()?;
        if column < self.columns && row < self.rows {
            let width = usize::try_from(self.columns).ok()?;
            Some(usize::try_from(row).ok()? * width + usize::try_from(column).ok()?)
        } else {
            None
        }
    }

    fn coordinates(&self, index: usize) -> (i32, i32) {
        let width = usize::try_from(self.columns).unwrap_or(1).max(1);
        let x = i32::try_from(index % width).unwrap_or(i32::MAX);
        let y = i32::try_from(index / width).unwrap_or(i32::MAX);
        (x, y)
    }

    /// Entities registered at the cell. Empty when out of bounds.
    #[must_use]
    pub fn at(&self, x: i32, y: i32) -> &[Entity] {
        self.index(x, y)
            .and_then(|index| self.cells.get(index))
            .map(|cell| cell.as_slice())
            .unwrap_or(&[])
    }

    /// Marks or clears the static blocked flag of a cell. Out-of-bounds cells
    /// are ignored.
    pub fn set_blocked(&mut self, x: i32, y: i32, blocked: bool) {
        if let Some(flag) = self.index(x, y).and_then(|index| self.blocked.get_mut(index)) {
            *flag = blocked;
        }
    }

    /// Registers `entity` at the cell. Out-of-bounds coordinates are ignored
    /// and registering the same cell twice has no further effect.
    pub fn add(&mut self, entity: Entity, x: i32, y: i32) {
        let Some(index) = self.index(x, y) else {
            trace!(%entity, x, y, "Ignoring out-of-bounds grid registration");
            return;
        };
        let Some(cell) = self.cells.get_mut(index) else {
            return;
        };
        if cell.contains(&entity) {
            return;
        }
        cell.push(entity);
        self.registrations.entry(entity).or_default().push(index);
    }

    /// Removes `entity` from every cell it occupies. Unknown entities are
    /// ignored.
    pub fn remove(&mut self, entity: Entity) {
        let Some(indices) = self.registrations.remove(&entity) else {
            return;
        };
        for index in indices {
            if let Some(cell) = self.cells.get_mut(index) {
                cell.retain(|occupant| *occupant != entity);
            }
        }
    }

    /// Moves `entity` to the destination cell.
    ///
    /// Removal is keyed by identity, so the origin coordinates only document
    /// the caller's intent.
    pub fn move_entity(&mut self, entity: Entity, from_x: i32, from_y: i32, to_x: i32, to_y: i32) {
        trace!(%entity, from_x, from_y, to_x, to_y, "Moving grid registration");
        self.remove(entity);
        self.add(entity, to_x, to_y);
    }

    /// Reports whether `entity` occupies at least one cell.
    #[must_use]
    pub fn is_registered(&self, entity: Entity) -> bool {
        self.registrations.contains_key(&entity)
    }

    /// Cells occupied by `entity` in registration order.
    #[must_use]
    pub fn cells_of(&self, entity: Entity) -> Vec<(i32, i32)> {
        self.registrations.get(&entity).map_or_else(Vec::new, |indices| {
            indices.iter().map(|index| self.coordinates(*index)).collect()
        })
    }

    /// Reports whether a step into the cell must be refused.
    ///
    /// Out-of-bounds cells, statically blocked cells and cells holding a
    /// solid collider are blocked.
    #[must_use]
    pub fn is_blocked<R: ComponentReader + ?Sized>(&self, x: i32, y: i32, reader: &R) -> bool {
        let Some(index) = self.index(x, y) else {
            return true;
        };
        self.cell_blocked(index, reader)
    }

    fn cell_blocked<R: ComponentReader + ?Sized>(&self, index: usize, reader: &R) -> bool {
        if self.blocked.get(index).copied().unwrap_or(true) {
            return true;
        }
        self.cells.get(index).is_some_and(|cell| {
            cell.iter().any(|occupant| {
                reader
                    .read::<Collider>(*occupant)
                    .is_some_and(|collider| collider.solid)
            })
        })
    }

    /// Entities within Chebyshev distance `radius` of the centre that hold
    /// every kind in `required`.
    ///
    /// Each entity appears once, in row-major order of the first cell it was
    /// found in. An empty requirement matches every occupant.
    #[must_use]
    pub fn query_area<R: ComponentReader + ?Sized>(
        &self,
        cx: i32,
        cy: i32,
        radius: u32,
        reader: &R,
        required: &[ComponentKind],
    ) -> Vec<Entity> {
        let radius = i32::try_from(radius).unwrap_or(i32::MAX);
        let max_x = i32::try_from(self.columns).unwrap_or(i32::MAX) - 1;
        let max_y = i32::try_from(self.rows).unwrap_or(i32::MAX) - 1;
        let mut found = Vec::new();
        for y in cy.saturating_sub(radius).max(0)..=cy.saturating_add(radius).min(max_y) {
            for x in cx.saturating_sub(radius).max(0)..=cx.saturating_add(radius).min(max_x) {
                for occupant in self.at(x, y) {
                    if found.contains(occupant) {
                        continue;
                    }
                    if required.iter().all(|kind| reader.has(*occupant, *kind)) {
                        found.push(*occupant);
                    }
                }
            }
        }
        found
    }

    /// Dense row-major occupancy map for path planners: `1` where a cell is
    /// blocked and `0` where it is free.
    #[must_use]
    pub fn to_path_grid<R: ComponentReader + ?Sized>(&self, reader: &R) -> Vec<u8> {
        (0..self.cells.len())
            .map(|index| u8::from(self.cell_blocked(index, reader)))
            .collect()
    }
}

/// Cells covered by an entity anchored at `position`, row by row.
///
/// Entities without a collider cover a single cell.
#[must_use]
pub fn footprint(position: Position, collider: Option<&Collider>) -> Vec<(i32, i32)> {
    let (width, height) = collider.map_or((1, 1), Collider::footprint);
    let width = i32::try_from(width).unwrap_or(i32::MAX);
    let height = i32::try_from(height).unwrap_or(i32::MAX);
    (0..height)
        .flat_map(|dy| (0..width).map(move |dx| (position.x + dx, position.y + dy)))
        .collect()
}
