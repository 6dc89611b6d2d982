//! Geometry engine for the tiled backing store.
//!
//! Maps between content space and backing-store space, between points and
//! tile-grid coordinates, and derives the cover and keep rects from the
//! visible rect, a trajectory hint and the cover-area multiplier.

use model::{FloatPoint, FloatRect, IntPoint, IntRect, IntSize, TileCoordinate};

pub const DEFAULT_TILE_DIMENSION: i32 = 512;
pub const DEFAULT_COVER_AREA_MULTIPLIER: f32 = 2.0;
pub const DEFAULT_CONTENTS_SCALE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("tile size must be positive, got {width}x{height}")]
    InvalidTileSize { width: i32, height: i32 },
    #[error("contents scale must be finite and positive, got {0}")]
    InvalidContentsScale(f32),
    #[error("cover area multiplier must be finite and positive, got {0}")]
    InvalidCoverAreaMultiplier(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverAndKeep {
    pub cover_rect: IntRect,
    pub keep_rect: IntRect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGeometry {
    tile_size: IntSize,
    contents_scale: f32,
    cover_area_multiplier: f32,
    /// Content rect in backing-store space.
    rect: IntRect,
}

impl Default for TileGeometry {
    fn default() -> Self {
        Self {
            tile_size: IntSize::new(DEFAULT_TILE_DIMENSION, DEFAULT_TILE_DIMENSION),
            contents_scale: DEFAULT_CONTENTS_SCALE,
            cover_area_multiplier: DEFAULT_COVER_AREA_MULTIPLIER,
            rect: IntRect::default(),
        }
    }
}

impl TileGeometry {
    pub fn new(
        tile_size: IntSize,
        contents_scale: f32,
        cover_area_multiplier: f32,
    ) -> Result<Self, GeometryError> {
        let mut geometry = Self::default();
        geometry.set_tile_size(tile_size)?;
        geometry.set_contents_scale(contents_scale)?;
        geometry.set_cover_area_multiplier(cover_area_multiplier)?;
        Ok(geometry)
    }

    pub fn tile_size(&self) -> IntSize {
        self.tile_size
    }

    pub fn contents_scale(&self) -> f32 {
        self.contents_scale
    }

    pub fn cover_area_multiplier(&self) -> f32 {
        self.cover_area_multiplier
    }

    pub fn rect(&self) -> IntRect {
        self.rect
    }

    pub fn set_tile_size(&mut self, tile_size: IntSize) -> Result<(), GeometryError> {
        if tile_size.is_empty() {
            return Err(GeometryError::InvalidTileSize {
                width: tile_size.width,
                height: tile_size.height,
            });
        }
        self.tile_size = tile_size;
        Ok(())
    }

    pub fn set_contents_scale(&mut self, scale: f32) -> Result<(), GeometryError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(GeometryError::InvalidContentsScale(scale));
        }
        self.contents_scale = scale;
        Ok(())
    }

    pub fn set_cover_area_multiplier(&mut self, multiplier: f32) -> Result<(), GeometryError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(GeometryError::InvalidCoverAreaMultiplier(multiplier));
        }
        self.cover_area_multiplier = multiplier;
        Ok(())
    }

    /// Sets the content rect, already mapped into backing-store space.
    pub fn set_rect(&mut self, rect: IntRect) {
        self.rect = rect;
    }

    pub fn map_from_contents(&self, rect: IntRect) -> IntRect {
        FloatRect::from(rect)
            .scaled(self.contents_scale as f64)
            .enclosing_int_rect()
    }

    pub fn map_to_contents(&self, rect: IntRect) -> IntRect {
        FloatRect::from(rect)
            .scaled(1.0 / self.contents_scale as f64)
            .enclosing_int_rect()
    }

    pub fn tile_coordinate_for_point(&self, point: IntPoint) -> TileCoordinate {
        let x = point.x / self.tile_size.width;
        let y = point.y / self.tile_size.height;
        TileCoordinate::new(x.max(0) as u32, y.max(0) as u32)
    }

    /// Nominal grid cell clipped to the content rect.
    pub fn tile_rect_for_coordinate(&self, coordinate: TileCoordinate) -> IntRect {
        let x = i32::try_from(coordinate.x)
            .unwrap_or(i32::MAX)
            .saturating_mul(self.tile_size.width);
        let y = i32::try_from(coordinate.y)
            .unwrap_or(i32::MAX)
            .saturating_mul(self.tile_size.height);
        let mut rect = IntRect::new(x, y, self.tile_size.width, self.tile_size.height);
        rect.intersect(&self.rect);
        rect
    }

    /// Inclusive range of grid coordinates touched by `rect`.
    pub fn tile_range_for_rect(&self, rect: IntRect) -> (TileCoordinate, TileCoordinate) {
        (
            self.tile_coordinate_for_point(rect.location()),
            self.tile_coordinate_for_point(rect.inner_bottom_right()),
        )
    }

    /// Zero for tiles touching the viewport, otherwise the chessboard distance
    /// from the tile to the grid cell holding the viewport center.
    pub fn tile_distance(&self, viewport: IntRect, coordinate: TileCoordinate) -> u32 {
        if viewport.intersects(&self.tile_rect_for_coordinate(coordinate)) {
            return 0;
        }
        let center = self.tile_coordinate_for_point(viewport.center());
        center.chebyshev_distance(coordinate)
    }

    pub fn compute_cover_and_keep_rect(
        &self,
        visible_rect: IntRect,
        trajectory: FloatPoint,
    ) -> CoverAndKeep {
        if self.rect.is_empty() {
            return CoverAndKeep {
                cover_rect: IntRect::default(),
                keep_rect: IntRect::default(),
            };
        }

        let mut cover_rect = visible_rect;
        let mut keep_rect = visible_rect;

        if self.cover_area_multiplier > 1.0 {
            let halo = (self.cover_area_multiplier - 1.0) / 2.0;
            cover_rect.inflate_x((visible_rect.width as f32 * halo) as i32);
            cover_rect.inflate_y((visible_rect.height as f32 * halo) as i32);
            keep_rect = cover_rect;

            if !trajectory.is_zero() {
                // Visible rect united with a ghost of itself pushed toward the
                // cover edge along the trajectory.
                cover_rect = visible_rect;
                cover_rect.move_by(
                    (visible_rect.width as f32 * trajectory.x * halo) as i32,
                    (visible_rect.height as f32 * trajectory.y * halo) as i32,
                );
                cover_rect.unite(&visible_rect);
            }
            debug_assert!(keep_rect.contains(&cover_rect));
        }

        self.adjust_for_contents_rect(&mut cover_rect);

        keep_rect.unite(&cover_rect);
        keep_rect.inflate_x(self.tile_size.width / 2);
        keep_rect.inflate_y(self.tile_size.height / 2);
        keep_rect.intersect(&self.rect);

        debug_assert!(cover_rect.is_empty() || keep_rect.contains(&cover_rect));
        CoverAndKeep {
            cover_rect,
            keep_rect,
        }
    }

    /// Clamps `rect` to the content rect, then tries to win back the clipped
    /// area along the other axis. Width is compensated before height.
    fn adjust_for_contents_rect(&self, rect: &mut IntRect) {
        let candidate_size = rect.size();
        rect.intersect(&self.rect);

        if rect.size() == candidate_size || rect.is_empty() {
            return;
        }

        let pixels_covered = candidate_size.area();
        if rect.width < candidate_size.width {
            let target_height = pixels_covered / rect.width as i64;
            rect.inflate_y(clamp_to_i32((target_height - rect.height as i64) / 2));
        }
        if rect.height < candidate_size.height {
            let target_width = pixels_covered / rect.height as i64;
            rect.inflate_x(clamp_to_i32((target_width - rect.width as i64) / 2));
        }

        rect.intersect(&self.rect);
    }
}

fn clamp_to_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{TestResult, quickcheck};

    fn geometry_with_rect(tile: i32, multiplier: f32, rect: IntRect) -> TileGeometry {
        let mut geometry =
            TileGeometry::new(IntSize::new(tile, tile), 1.0, multiplier).expect("geometry");
        geometry.set_rect(rect);
        geometry
    }

    #[test]
    fn rejects_degenerate_configuration() {
        assert_eq!(
            TileGeometry::new(IntSize::new(0, 512), 1.0, 2.0),
            Err(GeometryError::InvalidTileSize {
                width: 0,
                height: 512
            })
        );
        assert_eq!(
            TileGeometry::new(IntSize::new(512, 512), 0.0, 2.0),
            Err(GeometryError::InvalidContentsScale(0.0))
        );
        assert!(matches!(
            TileGeometry::new(IntSize::new(512, 512), 1.0, f32::NAN),
            Err(GeometryError::InvalidCoverAreaMultiplier(_))
        ));

        let mut geometry = TileGeometry::default();
        assert!(geometry.set_tile_size(IntSize::new(-4, 4)).is_err());
        assert_eq!(geometry.tile_size(), IntSize::new(512, 512));
    }

    #[test]
    fn tile_coordinate_clamps_negative_points_to_zero() {
        let geometry = TileGeometry::default();
        assert_eq!(
            geometry.tile_coordinate_for_point(IntPoint::new(-700, 1023)),
            TileCoordinate::new(0, 1)
        );
        assert_eq!(
            geometry.tile_coordinate_for_point(IntPoint::new(1024, 511)),
            TileCoordinate::new(2, 0)
        );
    }

    #[test]
    fn edge_tiles_are_clipped_to_contents() {
        let geometry = geometry_with_rect(512, 2.0, IntRect::new(0, 0, 1000, 600));
        assert_eq!(
            geometry.tile_rect_for_coordinate(TileCoordinate::new(1, 1)),
            IntRect::new(512, 512, 488, 88)
        );
        assert!(
            geometry
                .tile_rect_for_coordinate(TileCoordinate::new(2, 0))
                .is_empty()
        );
    }

    #[test]
    fn map_from_contents_scales_and_rounds_outward() {
        let mut geometry = TileGeometry::default();
        geometry.set_contents_scale(1.5).expect("scale");
        assert_eq!(
            geometry.map_from_contents(IntRect::new(1, 1, 3, 3)),
            IntRect::new(1, 1, 5, 5)
        );
        assert_eq!(
            geometry.map_to_contents(IntRect::new(3, 3, 6, 6)),
            IntRect::new(2, 2, 4, 4)
        );
    }

    #[test]
    fn empty_contents_yield_empty_cover_and_keep() {
        let geometry = geometry_with_rect(512, 2.0, IntRect::default());
        let rects =
            geometry.compute_cover_and_keep_rect(IntRect::new(0, 0, 800, 600), FloatPoint::ZERO);
        assert!(rects.cover_rect.is_empty());
        assert!(rects.keep_rect.is_empty());
    }

    #[test]
    fn symmetric_halo_inside_contents() {
        let geometry = geometry_with_rect(512, 3.0, IntRect::new(0, 0, 10_000, 10_000));
        let visible = IntRect::new(4000, 4000, 500, 400);
        let rects = geometry.compute_cover_and_keep_rect(visible, FloatPoint::ZERO);
        assert_eq!(rects.cover_rect, IntRect::new(3500, 3600, 1500, 1200));
        assert_eq!(rects.keep_rect, IntRect::new(3244, 3344, 2012, 1712));
    }

    #[test]
    fn multiplier_of_one_covers_only_visible_rect() {
        let geometry = geometry_with_rect(100, 1.0, IntRect::new(0, 0, 1000, 1000));
        let visible = IntRect::new(200, 200, 300, 300);
        let rects = geometry.compute_cover_and_keep_rect(visible, FloatPoint::new(1.0, 0.0));
        assert_eq!(rects.cover_rect, visible);
        assert_eq!(rects.keep_rect, IntRect::new(150, 150, 400, 400));
    }

    #[test]
    fn trajectory_biases_cover_toward_motion() {
        let geometry = geometry_with_rect(5, 3.0, IntRect::new(0, 0, 100, 100));
        let visible = IntRect::new(10, 10, 5, 5);

        let still = geometry.compute_cover_and_keep_rect(visible, FloatPoint::ZERO);
        assert_eq!(still.cover_rect, IntRect::new(5, 5, 15, 15));

        let right = geometry.compute_cover_and_keep_rect(visible, FloatPoint::new(1.0, 0.0));
        assert_eq!(right.cover_rect, IntRect::new(10, 10, 10, 5));

        let diagonal = FloatPoint::new(1.0, 1.0).normalized();
        let down_right = geometry.compute_cover_and_keep_rect(visible, diagonal);
        assert_eq!(down_right.cover_rect, IntRect::new(10, 10, 8, 8));
        assert!(down_right.keep_rect.contains(&down_right.cover_rect));
    }

    #[test]
    fn cover_clipped_on_both_axes_is_compensated_width_first() {
        let geometry = geometry_with_rect(512, 2.0, IntRect::new(0, 0, 2048, 2048));
        let rects =
            geometry.compute_cover_and_keep_rect(IntRect::new(0, 0, 512, 512), FloatPoint::ZERO);
        // Clamped to 768x768, then the lost width is traded for height.
        assert!(rects.cover_rect.contains(&IntRect::new(0, 0, 768, 768)));
        assert_eq!(rects.cover_rect, IntRect::new(0, 0, 768, 1066));
        assert_eq!(rects.keep_rect, IntRect::new(0, 0, 1024, 1322));
    }

    #[test]
    fn cover_clipped_on_one_axis_grows_along_the_other() {
        let geometry = geometry_with_rect(256, 2.0, IntRect::new(0, 0, 800, 20_000));
        let visible = IntRect::new(0, 5000, 800, 600);
        let rects = geometry.compute_cover_and_keep_rect(visible, FloatPoint::ZERO);
        assert_eq!(rects.cover_rect, IntRect::new(0, 4100, 800, 2400));
    }

    #[test]
    fn cover_outside_contents_stays_empty() {
        let geometry = geometry_with_rect(512, 2.0, IntRect::new(0, 0, 100, 100));
        let rects = geometry
            .compute_cover_and_keep_rect(IntRect::new(5000, 5000, 100, 100), FloatPoint::ZERO);
        assert!(rects.cover_rect.is_empty());
    }

    #[test]
    fn tile_distance_is_zero_inside_viewport_and_chebyshev_outside() {
        let geometry = geometry_with_rect(512, 2.0, IntRect::new(0, 0, 4096, 4096));
        let viewport = IntRect::new(1024, 1024, 512, 512);
        assert_eq!(geometry.tile_distance(viewport, TileCoordinate::new(2, 2)), 0);
        assert_eq!(geometry.tile_distance(viewport, TileCoordinate::new(3, 2)), 1);
        assert_eq!(geometry.tile_distance(viewport, TileCoordinate::new(0, 5)), 3);
    }

    fn keep_contains_cover(
        vx: i16,
        vy: i16,
        vw: u16,
        vh: u16,
        cw: u16,
        ch: u16,
        tile: u16,
        multiplier_tenths: u8,
    ) -> TestResult {
        let geometry = geometry_with_rect(
            (tile % 1024) as i32 + 1,
            1.0 + (multiplier_tenths % 50) as f32 / 10.0,
            IntRect::new(0, 0, cw as i32, ch as i32),
        );
        let visible = IntRect::new(vx as i32, vy as i32, vw as i32, vh as i32);
        let rects = geometry.compute_cover_and_keep_rect(visible, FloatPoint::ZERO);
        TestResult::from_bool(
            rects.cover_rect.is_empty() || rects.keep_rect.contains(&rects.cover_rect),
        )
    }

    #[test]
    fn keep_rect_contains_cover_rect() {
        quickcheck(keep_contains_cover as fn(i16, i16, u16, u16, u16, u16, u16, u8) -> TestResult);
    }

    fn keep_contains_cover_with_trajectory(
        vx: i16,
        vy: i16,
        vw: u16,
        vh: u16,
        tx: i8,
        ty: i8,
        multiplier_tenths: u8,
    ) -> TestResult {
        let geometry = geometry_with_rect(
            256,
            1.0 + (multiplier_tenths % 50) as f32 / 10.0,
            IntRect::new(-1000, -1000, 30_000, 30_000),
        );
        let visible = IntRect::new(vx as i32, vy as i32, vw as i32, vh as i32);
        let trajectory = FloatPoint::new(tx as f32, ty as f32).normalized();
        let rects = geometry.compute_cover_and_keep_rect(visible, trajectory);
        TestResult::from_bool(
            rects.cover_rect.is_empty() || rects.keep_rect.contains(&rects.cover_rect),
        )
    }

    #[test]
    fn keep_rect_contains_cover_rect_under_motion() {
        quickcheck(
            keep_contains_cover_with_trajectory
                as fn(i16, i16, u16, u16, i8, i8, u8) -> TestResult,
        );
    }

    fn round_trip_contains_input(x: i16, y: i16, w: u16, h: u16, scale_step: u8) -> TestResult {
        let mut geometry = TileGeometry::default();
        if geometry
            .set_contents_scale(0.25 + (scale_step % 64) as f32 / 16.0)
            .is_err()
        {
            return TestResult::discard();
        }
        let rect = IntRect::new(x as i32, y as i32, w as i32, h as i32);
        let round_trip = geometry.map_to_contents(geometry.map_from_contents(rect));
        TestResult::from_bool(round_trip.contains(&rect))
    }

    #[test]
    fn map_round_trip_contains_input() {
        quickcheck(round_trip_contains_input as fn(i16, i16, u16, u16, u8) -> TestResult);
    }
}
