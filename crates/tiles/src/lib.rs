//! Tile cache for a scrollable surface.
//!
//! Tiles are keyed by grid coordinate and exclusively own their raster
//! buffers. The store decides which tiles exist; pixel production goes
//! through the host's [`TilePainter`].

mod store;
mod tile;

pub use store::{BufferUpdate, ReconcileReport, TileStore};
pub use tile::{BYTES_PER_PIXEL, MAX_DIRTY_RECTS, Tile, TileBuffer, TileDirtyRegion};

use model::{IntRect, TileCoordinate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePaintRequest {
    pub coordinate: TileCoordinate,
    /// Tile rect in backing-store space; the buffer's origin maps here.
    pub tile_rect: IntRect,
    /// Area to repaint, inside `tile_rect`.
    pub dirty_rect: IntRect,
}

impl TilePaintRequest {
    pub fn local_dirty_rect(&self) -> IntRect {
        self.dirty_rect
            .translated(-self.tile_rect.x, -self.tile_rect.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TilePaintError {
    #[error("painter is not ready to rasterize")]
    NotReady,
    #[error("tile rasterization failed: {0}")]
    Failed(String),
}

/// Rasterizes backing-store content into a tile buffer.
pub trait TilePainter {
    fn paint_tile(
        &mut self,
        request: &TilePaintRequest,
        buffer: &mut TileBuffer,
    ) -> Result<(), TilePaintError>;
}
