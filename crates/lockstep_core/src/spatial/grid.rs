//! # Uniform Grid
//!
//! Broad-phase index stored as embedded singly linked lists:
//! - `heads[cell]` is the first slot in that cell
//! - `next[slot]` is the following slot in the same cell
//!
//! Both arrays are sized at construction, so rebuilding never allocates.

use tracing::info;

use crate::ecs::EntityStore;

/// Edge length of one grid cell in world units.
pub const CELL_SIZE: f32 = 64.0;

/// End-of-list / empty-cell marker.
const EMPTY: u32 = u32::MAX;

/// Write-once-per-tick, read-many spatial index over entity slots.
///
/// The index owns no entity data, only slot indices. It is cleared and
/// rebuilt every tick; there is deliberately no remove or move operation.
///
/// Coordinates outside the world are clamped to the nearest edge cell on
/// insert and ignored on query. Neither path raises an error.
pub struct SpatialIndex {
    grid_width: usize,
    grid_height: usize,
    /// First slot per cell, or `EMPTY`.
    heads: Box<[u32]>,
    /// Next slot in the same cell, or `EMPTY`.
    next: Box<[u32]>,
}

impl SpatialIndex {
    /// Creates an index covering `world_width` x `world_height` for up to
    /// `max_entities` slots.
    ///
    /// Grid dimensions are `ceil(width / CELL_SIZE)` x `ceil(height / CELL_SIZE)`.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is not a positive finite number, if the
    /// cell count overflows `usize`, or if `max_entities` does not fit in
    /// `u32`.
    #[must_use]
    pub fn new(world_width: f32, world_height: f32, max_entities: usize) -> Self {
        assert!(
            world_width.is_finite() && world_width > 0.0,
            "World width must be positive and finite"
        );
        assert!(
            world_height.is_finite() && world_height > 0.0,
            "World height must be positive and finite"
        );
        assert!(
            max_entities < EMPTY as usize,
            "max_entities must fit below the empty marker"
        );

        let grid_width = cells_along(world_width);
        let grid_height = cells_along(world_height);
        let Some(cells) = grid_width.checked_mul(grid_height) else {
            panic!("World of {world_width} x {world_height} has too many cells to index");
        };

        info!(grid_width, grid_height, cells, max_entities, "spatial index initialized");

        Self {
            grid_width,
            grid_height,
            heads: vec![EMPTY; cells].into_boxed_slice(),
            next: vec![EMPTY; max_entities].into_boxed_slice(),
        }
    }

    /// Number of cells a `world_width` x `world_height` index would
    /// allocate, or `None` if the count overflows `usize`.
    ///
    /// Lets callers reject a world size before [`Self::new`] would panic.
    #[must_use]
    pub fn cell_count(world_width: f32, world_height: f32) -> Option<usize> {
        let valid = |extent: f32| extent.is_finite() && extent > 0.0;
        if !(valid(world_width) && valid(world_height)) {
            return None;
        }
        cells_along(world_width).checked_mul(cells_along(world_height))
    }

    /// Number of cell columns.
    #[inline]
    #[must_use]
    pub const fn grid_width(&self) -> usize {
        self.grid_width
    }

    /// Number of cell rows.
    #[inline]
    #[must_use]
    pub const fn grid_height(&self) -> usize {
        self.grid_height
    }

    /// Cell edge length in world units.
    #[inline]
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        CELL_SIZE
    }

    /// Maximum slot index + 1 this index accepts.
    #[inline]
    #[must_use]
    pub fn max_entities(&self) -> usize {
        self.next.len()
    }

    /// Empties every cell and link. O(cells + entities), no allocation.
    pub fn clear(&mut self) {
        self.heads.fill(EMPTY);
        self.next.fill(EMPTY);
    }

    /// Prepends `slot` to the list of the cell containing `(x, y)`.
    ///
    /// Out-of-world positions land in the nearest edge cell. Slots at or
    /// beyond [`Self::max_entities`] are ignored.
    pub fn insert(&mut self, slot: usize, x: f32, y: f32) {
        if slot >= self.next.len() {
            return;
        }

        let cell_x = clamp_cell(cell_coord(x), self.grid_width);
        let cell_y = clamp_cell(cell_coord(y), self.grid_height);
        let cell = cell_y * self.grid_width + cell_x;

        #[allow(clippy::cast_possible_truncation)]
        let head = slot as u32;
        self.next[slot] = self.heads[cell];
        self.heads[cell] = head;
    }

    /// Clears the index and inserts every live slot of `store`.
    pub fn rebuild(&mut self, store: &EntityStore) {
        self.clear();
        let xs = store.positions_x();
        let ys = store.positions_y();
        for slot in store.active_slots() {
            self.insert(slot, xs[slot], ys[slot]);
        }
    }

    /// Visits every slot in the single cell containing `(x, y)`.
    ///
    /// Does nothing if that cell lies outside the grid.
    pub fn query_cell<F>(&self, x: f32, y: f32, mut visitor: F)
    where
        F: FnMut(usize),
    {
        if let Some(cell) = self.cell_index(cell_coord(x), cell_coord(y)) {
            self.walk(cell, &mut visitor);
        }
    }

    /// Visits every slot in the 3x3 block of cells centered on the cell
    /// containing `(x, y)`, skipping neighbors outside the grid.
    pub fn query_neighborhood<F>(&self, x: f32, y: f32, mut visitor: F)
    where
        F: FnMut(usize),
    {
        let center_x = cell_coord(x);
        let center_y = cell_coord(y);

        for dy in -1..=1 {
            for dx in -1..=1 {
                let neighbor = self.cell_index(
                    center_x.saturating_add(dx),
                    center_y.saturating_add(dy),
                );
                if let Some(cell) = neighbor {
                    self.walk(cell, &mut visitor);
                }
            }
        }
    }

    fn cell_index(&self, cell_x: i32, cell_y: i32) -> Option<usize> {
        let cx = usize::try_from(cell_x).ok().filter(|&c| c < self.grid_width)?;
        let cy = usize::try_from(cell_y).ok().filter(|&c| c < self.grid_height)?;
        Some(cy * self.grid_width + cx)
    }

    fn walk<F>(&self, cell: usize, visitor: &mut F)
    where
        F: FnMut(usize),
    {
        let mut slot = self.heads[cell];
        while slot != EMPTY {
            let index = slot as usize;
            visitor(index);
            slot = self.next[index];
        }
    }
}

/// Cells needed to cover `extent`; saturates at `usize::MAX`.
#[inline]
fn cells_along(extent: f32) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cells = (extent / CELL_SIZE).ceil() as usize;
    cells
}

/// World coordinate to (unclamped) cell coordinate. NaN maps to cell 0.
#[inline]
fn cell_coord(value: f32) -> i32 {
    #[allow(clippy::cast_possible_truncation)]
    let cell = (value / CELL_SIZE).floor() as i32;
    cell
}

#[inline]
fn clamp_cell(cell: i32, cells: usize) -> usize {
    usize::try_from(cell).map_or(0, |c| c.min(cells - 1))
}
