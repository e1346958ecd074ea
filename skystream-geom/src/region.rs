//! A closed sum type over the supported region shapes, with pairwise
//! containment and intersection dispatch.

use crate::bbox::SphericalBox;
use crate::circle::SphericalCircle;
use crate::polygon::SphericalConvexPolygon;
use crate::vector::SphericalCoord;

/// A region on the unit sphere. Every search region is one of these
/// three shapes; pairwise predicates dispatch on both operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Box(SphericalBox),
    Circle(SphericalCircle),
    Polygon(SphericalConvexPolygon),
}

impl Region {
    /// A bounding box for this region (not necessarily minimal for
    /// circles and polygons).
    pub fn bounding_box(&self) -> SphericalBox {
        match self {
            Region::Box(b) => b.clone(),
            Region::Circle(c) => c.bounding_box(),
            Region::Polygon(p) => p.bounding_box(),
        }
    }

    pub fn center(&self) -> SphericalCoord {
        match self {
            Region::Box(b) => b.center(),
            Region::Circle(c) => c.center(),
            Region::Polygon(p) => p.center(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Region::Box(b) => b.is_empty(),
            Region::Circle(c) => c.is_empty(),
            Region::Polygon(_) => false,
        }
    }

    pub fn contains_point(&self, p: SphericalCoord) -> bool {
        match self {
            Region::Box(b) => b.contains_point(p),
            Region::Circle(c) => c.contains_point(p),
            Region::Polygon(poly) => poly.contains_point(p),
        }
    }

    /// True if this region completely contains the other region.
    /// A box containing a circle or polygon is decided through the
    /// other region's bounding box, so the answer is sufficient but
    /// not necessary for containment of the region itself.
    pub fn contains(&self, other: &Region) -> bool {
        match (self, other) {
            (Region::Box(a), Region::Box(b)) => a.contains_box(b),
            (Region::Box(a), _) => a.contains_box(&other.bounding_box()),
            (Region::Circle(a), Region::Box(b)) => a.contains_box(b),
            (Region::Circle(a), Region::Circle(b)) => a.contains_circle(b),
            (Region::Circle(a), Region::Polygon(b)) => a.contains_polygon(b),
            (Region::Polygon(a), Region::Box(b)) => a.contains_box(b),
            (Region::Polygon(a), Region::Circle(b)) => a.contains_circle(b),
            (Region::Polygon(a), Region::Polygon(b)) => a.contains_polygon(b),
        }
    }

    /// True if this region intersects the other region.
    pub fn intersects(&self, other: &Region) -> bool {
        match (self, other) {
            (Region::Box(a), Region::Box(b)) => a.intersects_box(b),
            (Region::Box(a), Region::Circle(b)) => b.intersects_box(a),
            (Region::Box(a), Region::Polygon(b)) => b.intersects_box(a),
            (Region::Circle(a), Region::Box(b)) => a.intersects_box(b),
            (Region::Circle(a), Region::Circle(b)) => a.intersects_circle(b),
            (Region::Circle(a), Region::Polygon(b)) => b.intersects_circle(a),
            (Region::Polygon(a), Region::Box(b)) => a.intersects_box(b),
            (Region::Polygon(a), Region::Circle(b)) => a.intersects_circle(b),
            (Region::Polygon(a), Region::Polygon(b)) => a.intersects_polygon(b),
        }
    }
}

impl From<SphericalBox> for Region {
    fn from(b: SphericalBox) -> Region {
        Region::Box(b)
    }
}

impl From<SphericalCircle> for Region {
    fn from(c: SphericalCircle) -> Region {
        Region::Circle(c)
    }
}

impl From<SphericalConvexPolygon> for Region {
    fn from(p: SphericalConvexPolygon) -> Region {
        Region::Polygon(p)
    }
}
