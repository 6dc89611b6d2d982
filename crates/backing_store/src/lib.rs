//! Viewport-driven tiled backing store.
//!
//! [`TiledBackingStore`] reacts to discrete host events (viewport or content
//! changes, invalidations, configuration changes), recomputes the cover and
//! keep rects, and drives the [`TileStore`] so tiles nearest the viewport are
//! created and painted first.

mod config;

pub use config::BackingStoreConfig;
pub use model::{FloatPoint, IntRect, IntSize, TileCoordinate};
pub use tiles::{
    BufferUpdate, ReconcileReport, Tile, TileBuffer, TilePaintError, TilePaintRequest,
    TilePainter, TileStore,
};
pub use view::{GeometryError, TileGeometry};

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum BackingStoreError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Surface owner. Rects are reported in content space.
pub trait BackingStoreClient: TilePainter {
    fn visible_rect(&self) -> IntRect;

    fn contents_rect(&self) -> IntRect;

    /// Some tile buffer changed and the surface should be redisplayed.
    fn did_update_tile_buffers(&mut self);

    /// More tiles remain to be created; schedule a call to
    /// [`TiledBackingStore::process_pending_tile_creation`].
    fn has_pending_tile_creation(&mut self);
}

pub struct TiledBackingStore<C: BackingStoreClient> {
    client: C,
    geometry: TileGeometry,
    tiles: TileStore,
    supports_alpha: bool,
    visible_rect: IntRect,
    cover_rect: IntRect,
    keep_rect: IntRect,
    trajectory: FloatPoint,
    pending_trajectory: FloatPoint,
    pending_tile_creation: bool,
    geometry_changed: bool,
}

impl<C: BackingStoreClient> TiledBackingStore<C> {
    pub fn new(client: C, config: BackingStoreConfig) -> Result<Self, BackingStoreError> {
        let geometry = config.geometry()?;
        Ok(Self {
            client,
            geometry,
            tiles: TileStore::new(),
            supports_alpha: config.supports_alpha,
            visible_rect: IntRect::default(),
            cover_rect: IntRect::default(),
            keep_rect: IntRect::default(),
            trajectory: FloatPoint::ZERO,
            pending_trajectory: FloatPoint::ZERO,
            pending_tile_creation: false,
            geometry_changed: true,
        })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn geometry(&self) -> &TileGeometry {
        &self.geometry
    }

    pub fn tiles(&self) -> &TileStore {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile_size(&self) -> IntSize {
        self.geometry.tile_size()
    }

    pub fn contents_scale(&self) -> f32 {
        self.geometry.contents_scale()
    }

    pub fn cover_area_multiplier(&self) -> f32 {
        self.geometry.cover_area_multiplier()
    }

    pub fn supports_alpha(&self) -> bool {
        self.supports_alpha
    }

    /// Trajectory used by the next geometry computation.
    pub fn trajectory_vector(&self) -> FloatPoint {
        self.pending_trajectory
    }

    /// Backing-store space rects from the last creation pass.
    pub fn visible_rect(&self) -> IntRect {
        self.visible_rect
    }

    pub fn cover_rect(&self) -> IntRect {
        self.cover_rect
    }

    pub fn keep_rect(&self) -> IntRect {
        self.keep_rect
    }

    pub fn has_pending_tile_creation(&self) -> bool {
        self.pending_tile_creation
    }

    pub fn map_from_contents(&self, rect: IntRect) -> IntRect {
        self.geometry.map_from_contents(rect)
    }

    pub fn map_to_contents(&self, rect: IntRect) -> IntRect {
        self.geometry.map_to_contents(rect)
    }

    /// Drops every tile; the next pass rebuilds them on the new grid.
    pub fn set_tile_size(&mut self, tile_size: IntSize) -> Result<(), BackingStoreError> {
        if tile_size == self.geometry.tile_size() {
            return Ok(());
        }
        self.geometry.set_tile_size(tile_size)?;
        let dropped = self.tiles.clear();
        self.geometry_changed = true;
        tracing::debug!(?tile_size, dropped, "tile size changed");
        Ok(())
    }

    pub fn set_cover_area_multiplier(&mut self, multiplier: f32) -> Result<(), BackingStoreError> {
        if multiplier == self.geometry.cover_area_multiplier() {
            return Ok(());
        }
        self.geometry.set_cover_area_multiplier(multiplier)?;
        self.geometry_changed = true;
        Ok(())
    }

    /// Tile content is scale dependent, so every tile is dropped.
    pub fn set_contents_scale(&mut self, scale: f32) -> Result<(), BackingStoreError> {
        if scale == self.geometry.contents_scale() {
            return Ok(());
        }
        self.geometry.set_contents_scale(scale)?;
        let dropped = self.tiles.clear();
        self.geometry_changed = true;
        tracing::debug!(scale, dropped, "contents scale changed");
        Ok(())
    }

    pub fn set_supports_alpha(&mut self, supports_alpha: bool) {
        if supports_alpha == self.supports_alpha {
            return;
        }
        self.supports_alpha = supports_alpha;
        let rect = self.geometry.rect();
        self.tiles.invalidate(&self.geometry, rect);
    }

    pub fn set_trajectory_vector(&mut self, trajectory: FloatPoint) {
        self.pending_trajectory = trajectory.normalized();
    }

    /// Runs a creation pass if the viewport, the contents, the trajectory
    /// or the configuration changed, or if tiles are still pending.
    pub fn cover_with_tiles_if_needed(&mut self) -> Option<ReconcileReport> {
        let visible_rect = self.mapped_visible_rect();
        let rect = self.geometry.map_from_contents(self.client.contents_rect());

        let did_change = self.trajectory != self.pending_trajectory
            || self.visible_rect != visible_rect
            || self.geometry.rect() != rect
            || self.geometry_changed;
        if did_change || self.pending_tile_creation {
            return Some(self.create_tiles());
        }
        None
    }

    /// Runs one deferred creation pass. Returns whether tiles are still
    /// pending afterwards.
    pub fn process_pending_tile_creation(&mut self) -> bool {
        if !self.pending_tile_creation {
            return false;
        }
        self.create_tiles();
        self.pending_tile_creation
    }

    /// Marks tiles under `contents_dirty_rect` dirty. Painting waits for the
    /// next [`Self::update_tile_buffers`].
    pub fn invalidate(&mut self, contents_dirty_rect: IntRect) -> usize {
        let dirty_rect = self.geometry.map_from_contents(contents_dirty_rect);
        self.tiles.invalidate(&self.geometry, dirty_rect)
    }

    /// Repaints dirty tiles and tells the host when anything changed.
    pub fn update_tile_buffers(&mut self) -> bool {
        let update = self
            .tiles
            .update_buffers(&mut self.client, self.supports_alpha);
        if update.changed() {
            self.client.did_update_tile_buffers();
        }
        update.changed()
    }

    pub fn coverage_ratio(&self, contents_rect: IntRect) -> f32 {
        let rect = self.geometry.map_from_contents(contents_rect);
        self.tiles.coverage_ratio(&self.geometry, rect)
    }

    pub fn visible_area_is_covered(&self) -> bool {
        let bounded_visible_rect = self.bounded_visible_contents_rect();
        (self.coverage_ratio(bounded_visible_rect) - 1.0).abs() <= f32::EPSILON
    }

    /// Keeps only the tiles overlapping the visible part of the contents.
    pub fn remove_all_non_visible_tiles(&mut self) -> usize {
        let bounded_visible_rect = self
            .geometry
            .map_from_contents(self.bounded_visible_contents_rect());
        self.keep_rect = bounded_visible_rect;
        self.tiles.set_keep_rect(bounded_visible_rect)
    }

    fn bounded_visible_contents_rect(&self) -> IntRect {
        self.client
            .visible_rect()
            .intersection(&self.client.contents_rect())
    }

    fn mapped_visible_rect(&self) -> IntRect {
        self.geometry.map_from_contents(self.client.visible_rect())
    }

    fn create_tiles(&mut self) -> ReconcileReport {
        let rect = self.geometry.map_from_contents(self.client.contents_rect());
        self.geometry.set_rect(rect);
        self.trajectory = self.pending_trajectory;
        self.visible_rect = self.mapped_visible_rect();
        self.geometry_changed = false;

        // Cover and keep derive from the raw visible rect, not its overlap
        // with the contents: a layer may be visible without overlapping them.
        let rects = self
            .geometry
            .compute_cover_and_keep_rect(self.visible_rect, self.trajectory);
        self.cover_rect = rects.cover_rect;
        self.keep_rect = rects.keep_rect;

        let report = self.tiles.reconcile(
            &self.geometry,
            rects.cover_rect,
            rects.keep_rect,
            self.visible_rect,
        );

        if report.needs_buffer_update() {
            self.update_tile_buffers();
        }

        self.pending_tile_creation = report.has_pending_creation();
        if self.pending_tile_creation {
            self.client.has_pending_tile_creation();
        }
        report
    }
}
