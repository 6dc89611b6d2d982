use std::collections::HashMap;

use bitvec::prelude::{BitVec, Lsb0};
use model::{FloatRect, IntRect, TileCoordinate};
use smallvec::SmallVec;
use view::TileGeometry;

use crate::{Tile, TilePainter};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub evicted: usize,
    pub resized: usize,
    pub removed: usize,
    pub created: SmallVec<[TileCoordinate; 8]>,
    pub shortest_distance: Option<u32>,
    /// Cover coordinates still without a tile after this pass.
    pub remaining: usize,
}

impl ReconcileReport {
    pub fn has_pending_creation(&self) -> bool {
        self.remaining > 0
    }

    pub fn needs_buffer_update(&self) -> bool {
        !self.created.is_empty() || self.resized > 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferUpdate {
    pub repainted: usize,
    pub failed: usize,
}

impl BufferUpdate {
    pub fn changed(&self) -> bool {
        self.repainted > 0
    }
}

/// Grid cells of a cover rect with a bit set for every cell lacking a tile.
struct CoverGrid {
    origin: TileCoordinate,
    columns: u32,
    missing: BitVec<usize, Lsb0>,
}

impl CoverGrid {
    fn scan(
        geometry: &TileGeometry,
        cover_rect: IntRect,
        tiles: &HashMap<TileCoordinate, Tile>,
    ) -> Self {
        let (top_left, bottom_right) = geometry.tile_range_for_rect(cover_rect);
        let columns = bottom_right.x.saturating_sub(top_left.x) + 1;
        let rows = bottom_right.y.saturating_sub(top_left.y) + 1;
        let mut missing = BitVec::repeat(false, columns as usize * rows as usize);
        for row in 0..rows {
            for column in 0..columns {
                let coordinate = TileCoordinate::new(top_left.x + column, top_left.y + row);
                if !tiles.contains_key(&coordinate) {
                    missing.set((row * columns + column) as usize, true);
                }
            }
        }
        Self {
            origin: top_left,
            columns,
            missing,
        }
    }

    fn missing_count(&self) -> usize {
        self.missing.count_ones()
    }

    fn missing_coordinates(&self) -> impl Iterator<Item = TileCoordinate> + '_ {
        self.missing.iter_ones().map(|index| {
            let index = index as u32;
            TileCoordinate::new(
                self.origin.x + index % self.columns,
                self.origin.y + index / self.columns,
            )
        })
    }
}

/// Owns every live tile, keyed by grid coordinate.
#[derive(Debug, Default)]
pub struct TileStore {
    tiles: HashMap<TileCoordinate, Tile>,
    keep_rect: IntRect,
}

impl TileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, coordinate: TileCoordinate) -> Option<&Tile> {
        self.tiles.get(&coordinate)
    }

    pub fn contains(&self, coordinate: TileCoordinate) -> bool {
        self.tiles.contains_key(&coordinate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn keep_rect(&self) -> IntRect {
        self.keep_rect
    }

    /// Drops every tile; returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.tiles.len();
        self.tiles.clear();
        dropped
    }

    /// One evict, resize, create pass over the tile set.
    pub fn reconcile(
        &mut self,
        geometry: &TileGeometry,
        cover_rect: IntRect,
        keep_rect: IntRect,
        visible_rect: IntRect,
    ) -> ReconcileReport {
        let mut report = ReconcileReport {
            evicted: self.set_keep_rect(keep_rect),
            ..ReconcileReport::default()
        };
        if cover_rect.is_empty() {
            return report;
        }

        let (resized, removed) = self.resize_edge_tiles(geometry);
        report.resized = resized;
        report.removed = removed;

        self.create_tiles(geometry, cover_rect, visible_rect, &mut report);
        report
    }

    /// Evicts tiles whose rect does not overlap `keep_rect`; shared edges
    /// do not count as overlap.
    pub fn set_keep_rect(&mut self, keep_rect: IntRect) -> usize {
        let keep_rect_f = FloatRect::from(keep_rect);
        let before = self.tiles.len();
        self.tiles
            .retain(|_, tile| FloatRect::from(tile.rect()).intersects(&keep_rect_f));
        self.keep_rect = keep_rect;

        let evicted = before - self.tiles.len();
        if evicted > 0 {
            tracing::trace!(evicted, ?keep_rect, "evicted tiles outside keep rect");
        }
        evicted
    }

    /// Re-clips every tile against the current content rect. Returns
    /// `(resized, removed)`.
    pub fn resize_edge_tiles(&mut self, geometry: &TileGeometry) -> (usize, usize) {
        let mut resized = 0;
        let before = self.tiles.len();
        self.tiles.retain(|coordinate, tile| {
            let expected = geometry.tile_rect_for_coordinate(*coordinate);
            if expected.is_empty() {
                return false;
            }
            if expected != tile.rect() {
                tile.resize(expected);
                resized += 1;
            }
            true
        });
        let removed = before - self.tiles.len();
        if resized > 0 || removed > 0 {
            tracing::trace!(resized, removed, "re-clipped edge tiles");
        }
        (resized, removed)
    }

    /// Creates the missing cover tiles closest to the viewport and no more.
    fn create_tiles(
        &mut self,
        geometry: &TileGeometry,
        cover_rect: IntRect,
        visible_rect: IntRect,
        report: &mut ReconcileReport,
    ) {
        let grid = CoverGrid::scan(geometry, cover_rect, &self.tiles);
        let required = grid.missing_count();

        let mut shortest_distance = u32::MAX;
        let mut to_create = SmallVec::<[TileCoordinate; 8]>::new();
        for coordinate in grid.missing_coordinates() {
            let distance = geometry.tile_distance(visible_rect, coordinate);
            if distance > shortest_distance {
                continue;
            }
            if distance < shortest_distance {
                to_create.clear();
                shortest_distance = distance;
            }
            to_create.push(coordinate);
        }

        for coordinate in &to_create {
            let rect = geometry.tile_rect_for_coordinate(*coordinate);
            self.tiles.insert(*coordinate, Tile::new(*coordinate, rect));
        }

        report.remaining = required - to_create.len();
        report.shortest_distance = (!to_create.is_empty()).then_some(shortest_distance);
        tracing::debug!(
            created = to_create.len(),
            shortest_distance = ?report.shortest_distance,
            remaining = report.remaining,
            "tile creation pass"
        );
        report.created = to_create;
    }

    /// Marks the tiles overlapping `dirty_rect` (backing-store space). Each
    /// tile receives the whole rect and clips it itself. Returns how many
    /// tiles became dirty.
    pub fn invalidate(&mut self, geometry: &TileGeometry, dirty_rect: IntRect) -> usize {
        if self.keep_rect.is_empty() || dirty_rect.is_empty() {
            return 0;
        }
        let (keep_top_left, keep_bottom_right) = geometry.tile_range_for_rect(self.keep_rect);
        let keep_rect_fit_to_tile_size = geometry
            .tile_rect_for_coordinate(keep_top_left)
            .union(&geometry.tile_rect_for_coordinate(keep_bottom_right));

        let covered_dirty_rect = dirty_rect.intersection(&keep_rect_fit_to_tile_size);
        if covered_dirty_rect.is_empty() {
            return 0;
        }

        let (top_left, bottom_right) = geometry.tile_range_for_rect(covered_dirty_rect);
        let mut marked = 0;
        for y in top_left.y..=bottom_right.y {
            for x in top_left.x..=bottom_right.x {
                let Some(tile) = self.tiles.get_mut(&TileCoordinate::new(x, y)) else {
                    continue;
                };
                if tile.invalidate(dirty_rect) {
                    marked += 1;
                }
            }
        }
        marked
    }

    /// Repaints every dirty tile through `painter`.
    pub fn update_buffers(
        &mut self,
        painter: &mut dyn TilePainter,
        supports_alpha: bool,
    ) -> BufferUpdate {
        let mut update = BufferUpdate::default();
        for tile in self.tiles.values_mut() {
            if !tile.is_dirty() {
                continue;
            }
            match tile.update_back_buffer(painter, supports_alpha) {
                Ok(true) => update.repainted += 1,
                Ok(false) => {}
                Err(error) => {
                    update.failed += 1;
                    tracing::warn!(
                        coordinate = ?tile.coordinate(),
                        %error,
                        "tile paint failed, keeping it dirty"
                    );
                }
            }
        }
        update
    }

    /// Fraction of `rect` (backing-store space) covered by ready tiles.
    /// An empty rect counts as fully covered.
    pub fn coverage_ratio(&self, geometry: &TileGeometry, rect: IntRect) -> f32 {
        if rect.is_empty() {
            return 1.0;
        }
        let (top_left, bottom_right) = geometry.tile_range_for_rect(rect);
        let mut covered_area = 0i64;
        for y in top_left.y..=bottom_right.y {
            for x in top_left.x..=bottom_right.x {
                let Some(tile) = self.tiles.get(&TileCoordinate::new(x, y)) else {
                    continue;
                };
                if tile.is_ready_to_paint() {
                    covered_area += rect.intersection(&tile.rect()).area();
                }
            }
        }
        (covered_area as f64 / rect.area() as f64) as f32
    }
}
