use model::{IntRect, IntSize, TileCoordinate};
use smallvec::SmallVec;

use crate::{TilePaintError, TilePaintRequest, TilePainter};

pub const BYTES_PER_PIXEL: usize = 4;
pub const MAX_DIRTY_RECTS: usize = 4;

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// RGBA8 pixels for one tile, row-major with no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileBuffer {
    size: IntSize,
    pixels: Vec<u8>,
}

impl TileBuffer {
    pub fn new(size: IntSize) -> Self {
        Self {
            size,
            pixels: vec![0; Self::byte_len_for(size)],
        }
    }

    fn byte_len_for(size: IntSize) -> usize {
        if size.is_empty() {
            return 0;
        }
        size.width as usize * size.height as usize * BYTES_PER_PIXEL
    }

    pub fn size(&self) -> IntSize {
        self.size
    }

    pub fn stride(&self) -> usize {
        self.size.width.max(0) as usize * BYTES_PER_PIXEL
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Reallocates for the new size; previous content is dropped.
    pub fn resize(&mut self, size: IntSize) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.pixels.clear();
        self.pixels.resize(Self::byte_len_for(size), 0);
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        if x < 0 || y < 0 || x >= self.size.width || y >= self.size.height {
            return None;
        }
        let offset = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.pixels[offset..offset + BYTES_PER_PIXEL]);
        Some(rgba)
    }

    /// Fills `local_rect` (buffer-local coordinates), clipped to the buffer.
    pub fn fill_rect(&mut self, local_rect: IntRect, rgba: [u8; 4]) {
        let bounds = IntRect::new(0, 0, self.size.width, self.size.height);
        let clipped = local_rect.intersection(&bounds);
        if clipped.is_empty() {
            return;
        }
        let stride = self.stride();
        for row in clipped.y..clipped.max_y() {
            let row_start = row as usize * stride;
            let begin = row_start + clipped.x as usize * BYTES_PER_PIXEL;
            let end = row_start + clipped.max_x() as usize * BYTES_PER_PIXEL;
            for pixel in self.pixels[begin..end].chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.copy_from_slice(&rgba);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileDirtyRegion {
    Clean,
    Rects(SmallVec<[IntRect; MAX_DIRTY_RECTS]>),
    Full,
}

impl TileDirtyRegion {
    pub fn is_clean(&self) -> bool {
        matches!(self, TileDirtyRegion::Clean)
    }

    /// `dirty_rect` must already be clipped to `tile_rect`.
    fn add(&mut self, dirty_rect: IntRect, tile_rect: IntRect) {
        if dirty_rect.contains(&tile_rect) {
            *self = TileDirtyRegion::Full;
            return;
        }
        match self {
            TileDirtyRegion::Full => {}
            TileDirtyRegion::Clean => {
                let mut rects = SmallVec::new();
                rects.push(dirty_rect);
                *self = TileDirtyRegion::Rects(rects);
            }
            TileDirtyRegion::Rects(rects) => {
                if rects.iter().any(|existing| existing.contains(&dirty_rect)) {
                    return;
                }
                rects.retain(|existing| !dirty_rect.contains(existing));
                rects.push(dirty_rect);
                if rects.len() <= MAX_DIRTY_RECTS {
                    return;
                }
                let bounds = rects
                    .iter()
                    .fold(IntRect::default(), |bounds, rect| bounds.union(rect));
                if bounds.contains(&tile_rect) {
                    *self = TileDirtyRegion::Full;
                } else {
                    rects.clear();
                    rects.push(bounds);
                }
            }
        }
    }

    pub fn rects(&self, tile_rect: IntRect) -> SmallVec<[IntRect; MAX_DIRTY_RECTS]> {
        match self {
            TileDirtyRegion::Clean => SmallVec::new(),
            TileDirtyRegion::Rects(rects) => rects.clone(),
            TileDirtyRegion::Full => {
                let mut rects = SmallVec::new();
                rects.push(tile_rect);
                rects
            }
        }
    }
}

/// One cached grid cell and its raster buffer.
#[derive(Debug)]
pub struct Tile {
    coordinate: TileCoordinate,
    rect: IntRect,
    buffer: TileBuffer,
    dirty: TileDirtyRegion,
    painted: bool,
}

impl Tile {
    pub fn new(coordinate: TileCoordinate, rect: IntRect) -> Self {
        Self {
            coordinate,
            rect,
            buffer: TileBuffer::new(rect.size()),
            dirty: TileDirtyRegion::Full,
            painted: false,
        }
    }

    pub fn coordinate(&self) -> TileCoordinate {
        self.coordinate
    }

    pub fn rect(&self) -> IntRect {
        self.rect
    }

    pub fn buffer(&self) -> &TileBuffer {
        &self.buffer
    }

    pub fn dirty_region(&self) -> &TileDirtyRegion {
        &self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_clean()
    }

    pub fn has_painted(&self) -> bool {
        self.painted
    }

    /// Painted at least once and nothing pending.
    pub fn is_ready_to_paint(&self) -> bool {
        self.painted && !self.is_dirty()
    }

    /// Returns whether any part of the tile became dirty.
    pub fn invalidate(&mut self, dirty_rect: IntRect) -> bool {
        let tile_dirty_rect = dirty_rect.intersection(&self.rect);
        if tile_dirty_rect.is_empty() {
            return false;
        }
        self.dirty.add(tile_dirty_rect, self.rect);
        true
    }

    pub fn resize(&mut self, rect: IntRect) {
        self.rect = rect;
        self.buffer.resize(rect.size());
        self.dirty = TileDirtyRegion::Full;
    }

    /// Repaints every dirty rect. A failure keeps the tile dirty so the next
    /// update retries it.
    pub fn update_back_buffer(
        &mut self,
        painter: &mut dyn TilePainter,
        supports_alpha: bool,
    ) -> Result<bool, TilePaintError> {
        if !self.is_dirty() {
            return Ok(false);
        }
        for dirty_rect in self.dirty.rects(self.rect) {
            if supports_alpha {
                let local = dirty_rect.translated(-self.rect.x, -self.rect.y);
                self.buffer.fill_rect(local, TRANSPARENT);
            }
            let request = TilePaintRequest {
                coordinate: self.coordinate,
                tile_rect: self.rect,
                dirty_rect,
            };
            painter.paint_tile(&request, &mut self.buffer)?;
        }
        self.dirty = TileDirtyRegion::Clean;
        self.painted = true;
        Ok(true)
    }
}
