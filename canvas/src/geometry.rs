//! Pure geometry over axis-aligned boxes: union, overlap, resize, and
//! freehand path normalization. Nothing here touches shared state.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::color::Color;
use crate::doc::{Layer, LayerId, PathPoint, Shape, Storage};

/// Error returned by [`normalize_path_points`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// A stroke needs at least two samples.
    #[error("cannot build a path from {count} point(s); at least 2 are required")]
    TooFewPoints { count: usize },
}

/// An axis-aligned box: top-left corner plus non-negative extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// The box spanned by two opposite corners, in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Closed containment test; points on the border count as inside.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// A set of active box edges. Corners combine two edges with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Side(u8);

impl Side {
    pub const TOP: Side = Side(1);
    pub const BOTTOM: Side = Side(2);
    pub const LEFT: Side = Side(4);
    pub const RIGHT: Side = Side(8);

    /// Raw flag bits (`Top = 1`, `Bottom = 2`, `Left = 4`, `Right = 8`).
    #[must_use]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Build from raw bits, dropping anything outside the four edges.
    #[must_use]
    pub fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    #[must_use]
    pub fn contains(self, other: Side) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Side {
    type Output = Side;

    fn bitor(self, rhs: Side) -> Side {
        Side(self.0 | rhs.0)
    }
}

impl BitOrAssign for Side {
    fn bitor_assign(&mut self, rhs: Side) {
        self.0 |= rhs.0;
    }
}

/// Minimal box covering every input, or `None` for an empty input.
pub fn bounding_box_union<I>(boxes: I) -> Option<Bounds>
where
    I: IntoIterator<Item = Bounds>,
{
    let mut iter = boxes.into_iter();
    let first = iter.next()?;

    let (mut left, mut top, mut right, mut bottom) = (first.x, first.y, first.right(), first.bottom());
    for b in iter {
        left = left.min(b.x);
        top = top.min(b.y);
        right = right.max(b.right());
        bottom = bottom.max(b.bottom());
    }

    Some(Bounds::new(left, top, right - left, bottom - top))
}

/// Whether two boxes overlap with non-zero area (half-open on every edge).
#[must_use]
pub fn rect_intersects(rect: &Bounds, layer: &Bounds) -> bool {
    rect.x + rect.width > layer.x
        && rect.x < layer.x + layer.width
        && rect.y + rect.height > layer.y
        && rect.y < layer.y + layer.height
}

/// Move the active edge(s) of `bounds` to `point`, keeping the opposite edges fixed.
///
/// Dragging past the fixed edge flips the box: the anchor becomes
/// `min(point, fixed_edge)` and the extent stays non-negative.
#[must_use]
pub fn resize_bounds(bounds: Bounds, corner: Side, point: Point) -> Bounds {
    let mut result = bounds;

    if corner.contains(Side::LEFT) {
        result.x = point.x.min(bounds.right());
        result.width = (bounds.right() - point.x).abs();
    }
    if corner.contains(Side::RIGHT) {
        result.x = point.x.min(bounds.x);
        result.width = (point.x - bounds.x).abs();
    }
    if corner.contains(Side::TOP) {
        result.y = point.y.min(bounds.bottom());
        result.height = (bounds.bottom() - point.y).abs();
    }
    if corner.contains(Side::BOTTOM) {
        result.y = point.y.min(bounds.y);
        result.height = (point.y - bounds.y).abs();
    }

    result
}

/// Build a path layer from raw board-space samples.
///
/// The layer's box is the tight box of the samples and the stored points are
/// re-expressed relative to its top-left corner.
///
/// # Errors
///
/// Returns [`GeometryError::TooFewPoints`] for fewer than two samples.
pub fn normalize_path_points(points: &[PathPoint], fill: Color) -> Result<Layer, GeometryError> {
    if points.len() < 2 {
        return Err(GeometryError::TooFewPoints { count: points.len() });
    }

    let mut left = f64::INFINITY;
    let mut top = f64::INFINITY;
    let mut right = f64::NEG_INFINITY;
    let mut bottom = f64::NEG_INFINITY;
    for p in points {
        left = left.min(p.x);
        top = top.min(p.y);
        right = right.max(p.x);
        bottom = bottom.max(p.y);
    }

    let relative = points
        .iter()
        .map(|p| PathPoint::new(p.x - left, p.y - top, p.pressure))
        .collect();

    Ok(Layer::new(
        Shape::Path { points: relative },
        Bounds::new(left, top, right - left, bottom - top),
        fill,
    ))
}

/// Ids of every layer overlapping the marquee spanned by `origin` and `current`,
/// in z-order.
#[must_use]
pub fn find_intersecting_layers(storage: &Storage, origin: Point, current: Point) -> Vec<LayerId> {
    let rect = Bounds::from_corners(origin, current);
    storage
        .ordered()
        .filter(|(_, layer)| rect_intersects(&rect, &layer.bounds()))
        .map(|(id, _)| id)
        .collect()
}
