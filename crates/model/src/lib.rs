use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct IntPoint {
    pub x: i32,
    pub y: i32,
}

impl IntPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntSize {
    pub width: i32,
    pub height: i32,
}

impl IntSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub const fn area(self) -> i64 {
        if self.is_empty() {
            return 0;
        }
        self.width as i64 * self.height as i64
    }
}

/// Integer rect with a half-open extent: `[x, x + width) x [y, y + height)`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl IntRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn location(&self) -> IntPoint {
        IntPoint::new(self.x, self.y)
    }

    pub const fn size(&self) -> IntSize {
        IntSize::new(self.width, self.height)
    }

    pub const fn max_x(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub const fn max_y(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub const fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    pub const fn area(&self) -> i64 {
        self.size().area()
    }

    /// Last pixel still inside the rect. Meaningless for empty rects.
    pub const fn inner_bottom_right(&self) -> IntPoint {
        IntPoint::new(self.max_x() - 1, self.max_y() - 1)
    }

    pub const fn center(&self) -> IntPoint {
        IntPoint::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn intersects(&self, other: &IntRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.max_x()
            && other.x < self.max_x()
            && self.y < other.max_y()
            && other.y < self.max_y()
    }

    /// Containment by extent; an empty `other` sitting inside the bounds counts.
    pub fn contains(&self, other: &IntRect) -> bool {
        self.x <= other.x
            && self.max_x() >= other.max_x()
            && self.y <= other.y
            && self.max_y() >= other.max_y()
    }

    /// Collapses to the zero rect when the two do not overlap.
    pub fn intersect(&mut self, other: &IntRect) {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.max_x().min(other.max_x());
        let bottom = self.max_y().min(other.max_y());
        if left >= right || top >= bottom {
            *self = IntRect::default();
            return;
        }
        *self = IntRect::new(left, top, right - left, bottom - top);
    }

    pub fn intersection(&self, other: &IntRect) -> IntRect {
        let mut result = *self;
        result.intersect(other);
        result
    }

    /// Bounding rect of both; empty operands are ignored.
    pub fn unite(&mut self, other: &IntRect) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
            return;
        }
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.max_x().max(other.max_x());
        let bottom = self.max_y().max(other.max_y());
        *self = IntRect::new(left, top, right - left, bottom - top);
    }

    pub fn union(&self, other: &IntRect) -> IntRect {
        let mut result = *self;
        result.unite(other);
        result
    }

    pub fn inflate_x(&mut self, dx: i32) {
        self.x = self.x.saturating_sub(dx);
        self.width = self.width.saturating_add(dx.saturating_mul(2));
    }

    pub fn inflate_y(&mut self, dy: i32) {
        self.y = self.y.saturating_sub(dy);
        self.height = self.height.saturating_add(dy.saturating_mul(2));
    }

    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.x = self.x.saturating_add(dx);
        self.y = self.y.saturating_add(dy);
    }

    pub fn translated(&self, dx: i32, dy: i32) -> IntRect {
        let mut result = *self;
        result.move_by(dx, dy);
        result
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FloatPoint {
    pub x: f32,
    pub y: f32,
}

impl FloatPoint {
    pub const ZERO: FloatPoint = FloatPoint::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Unit vector in the same direction; zero, tiny or non-finite input yields zero.
    pub fn normalized(self) -> FloatPoint {
        let length = self.length();
        if !length.is_finite() || length <= f32::EPSILON {
            return FloatPoint::ZERO;
        }
        FloatPoint::new(self.x / length, self.y / length)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FloatRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FloatRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Strict overlap: rects that only share an edge do not intersect.
    pub fn intersects(&self, other: &FloatRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.max_x()
            && other.x < self.max_x()
            && self.y < other.max_y()
            && other.y < self.max_y()
    }

    pub fn scaled(&self, scale: f64) -> FloatRect {
        FloatRect::new(
            self.x * scale,
            self.y * scale,
            self.width * scale,
            self.height * scale,
        )
    }

    /// Smallest integer rect containing this one.
    pub fn enclosing_int_rect(&self) -> IntRect {
        let left = self.x.floor();
        let top = self.y.floor();
        let right = self.max_x().ceil();
        let bottom = self.max_y().ceil();
        let left = left as i32;
        let top = top as i32;
        IntRect::new(
            left,
            top,
            (right as i32).saturating_sub(left),
            (bottom as i32).saturating_sub(top),
        )
    }
}

impl From<IntRect> for FloatRect {
    fn from(rect: IntRect) -> Self {
        FloatRect::new(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        )
    }
}

/// Position of a tile in the uniform tile grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoordinate {
    pub x: u32,
    pub y: u32,
}

impl TileCoordinate {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (chessboard) distance in grid units.
    pub const fn chebyshev_distance(self, other: TileCoordinate) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_collapses_disjoint_rects_to_zero() {
        let mut rect = IntRect::new(0, 0, 10, 10);
        rect.intersect(&IntRect::new(20, 20, 5, 5));
        assert_eq!(rect, IntRect::default());
        assert!(rect.is_empty());
    }

    #[test]
    fn edge_adjacent_rects_do_not_intersect() {
        let left = IntRect::new(0, 0, 512, 512);
        let right = IntRect::new(512, 0, 512, 512);
        assert!(!left.intersects(&right));
        assert!(!FloatRect::from(left).intersects(&FloatRect::from(right)));

        let overlapping = IntRect::new(511, 0, 512, 512);
        assert!(left.intersects(&overlapping));
        assert!(FloatRect::from(left).intersects(&FloatRect::from(overlapping)));
    }

    #[test]
    fn unite_ignores_empty_operands() {
        let mut rect = IntRect::default();
        rect.unite(&IntRect::new(5, 5, 10, 10));
        assert_eq!(rect, IntRect::new(5, 5, 10, 10));

        rect.unite(&IntRect::new(100, 100, 0, 3));
        assert_eq!(rect, IntRect::new(5, 5, 10, 10));

        rect.unite(&IntRect::new(-5, 10, 2, 20));
        assert_eq!(rect, IntRect::new(-5, 5, 20, 25));
    }

    #[test]
    fn inflate_grows_both_sides() {
        let mut rect = IntRect::new(0, 0, 512, 512);
        rect.inflate_x(256);
        rect.inflate_y(128);
        assert_eq!(rect, IntRect::new(-256, -128, 1024, 768));
        assert!(rect.contains(&IntRect::new(0, 0, 512, 512)));
    }

    #[test]
    fn enclosing_int_rect_rounds_outward() {
        let rect = FloatRect::new(0.5, -0.25, 10.0, 1.0).enclosing_int_rect();
        assert_eq!(rect, IntRect::new(0, -1, 11, 2));
    }

    #[test]
    fn normalized_trajectory_is_unit_or_zero() {
        let unit = FloatPoint::new(3.0, 4.0).normalized();
        assert!((unit.x - 0.6).abs() < 1e-6);
        assert!((unit.y - 0.8).abs() < 1e-6);
        assert_eq!(FloatPoint::ZERO.normalized(), FloatPoint::ZERO);
        assert_eq!(FloatPoint::new(f32::NAN, 1.0).normalized(), FloatPoint::ZERO);
    }

    #[test]
    fn chebyshev_distance_takes_larger_axis() {
        let origin = TileCoordinate::new(2, 2);
        assert_eq!(origin.chebyshev_distance(TileCoordinate::new(2, 2)), 0);
        assert_eq!(origin.chebyshev_distance(TileCoordinate::new(5, 3)), 3);
        assert_eq!(origin.chebyshev_distance(TileCoordinate::new(0, 6)), 4);
    }
}
