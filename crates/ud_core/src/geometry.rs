use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in screen-pixel space.
///
/// `width`/`height` are never negative when built through [`BoundingRect::new`] or
/// [`BoundingRect::from_ltrb`]; every operation below also treats a negative extent as zero,
/// so a hand-built rectangle degrades to an empty one instead of producing nonsense areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingRect {
    #[inline]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Construct a normalized rectangle from two corners.
    #[inline]
    pub fn from_ltrb(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        let left = x1.min(x2);
        let top = y1.min(y2);
        Self::new(left, top, x1.max(x2) - left, y1.max(y2) - top)
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width.max(0))
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height.max(0))
    }

    #[inline]
    pub fn center_x(&self) -> i32 {
        self.x.saturating_add(self.width.max(0) / 2)
    }

    #[inline]
    pub fn center_y(&self) -> i32 {
        self.y.saturating_add(self.height.max(0) / 2)
    }

    #[inline]
    pub fn center(&self) -> (i32, i32) {
        (self.center_x(), self.center_y())
    }

    #[inline]
    pub fn area(&self) -> i64 {
        i64::from(self.width.max(0)) * i64::from(self.height.max(0))
    }

    /// True when the rectangle covers no pixels.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.area() == 0
    }

    /// Point containment, inclusive of all four edges.
    #[inline]
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.left() && px <= self.right() && py >= self.top() && py <= self.bottom()
    }

    /// Overlapping region, or `None` when the rectangles share no area.
    pub fn intersection(&self, other: &BoundingRect) -> Option<BoundingRect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right > left && bottom > top {
            Some(BoundingRect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &BoundingRect) -> BoundingRect {
        BoundingRect::from_ltrb(
            self.left().min(other.left()),
            self.top().min(other.top()),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Intersection-over-union.
    ///
    /// 0 when either rectangle is degenerate or they do not overlap; exactly 1.0 for
    /// identical non-degenerate rectangles.
    pub fn iou(&self, other: &BoundingRect) -> f64 {
        let (area_a, area_b) = (self.area(), other.area());
        if area_a == 0 || area_b == 0 {
            return 0.0;
        }

        let Some(inter) = self.intersection(other) else {
            return 0.0;
        };
        let inter_area = inter.area();
        let union_area = area_a + area_b - inter_area;
        if union_area <= 0 {
            return 0.0;
        }

        inter_area as f64 / union_area as f64
    }

    /// Euclidean distance between the two rectangle centers.
    pub fn center_distance(&self, other: &BoundingRect) -> f64 {
        let (ax, ay) = self.exact_center();
        let (bx, by) = other.exact_center();
        (ax - bx).hypot(ay - by)
    }

    /// Translate by a screen-space offset.
    #[inline]
    pub fn offset(&self, dx: i32, dy: i32) -> BoundingRect {
        BoundingRect {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..*self
        }
    }

    #[inline]
    fn exact_center(&self) -> (f64, f64) {
        (
            f64::from(self.x) + f64::from(self.width.max(0)) / 2.0,
            f64::from(self.y) + f64::from(self.height.max(0)) / 2.0,
        )
    }
}
