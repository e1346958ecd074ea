//! Spherical geometry kernel for sky-coverage queries.
//!
//! Coordinates are spherical longitude/latitude angle pairs in degrees;
//! computational geometry runs on cartesian unit 3-vectors. Three region
//! shapes are supported, longitude/latitude boxes (which may wrap across
//! the 0/360 discontinuity), circles (spherical caps) and convex
//! polygons with great circle edges, each with exact point containment
//! and pairwise contains/intersects predicates. Polygons are built
//! either from validated vertex lists or as the convex hull of an
//! unordered hemispherical point set.

pub mod bbox;
pub mod circle;
pub mod error;
pub mod hull;
pub mod polygon;
pub mod region;
pub mod vector;

pub use bbox::SphericalBox;
pub use circle::SphericalCircle;
pub use error::{ConvexityError, GeomError, Result};
pub use hull::{convex, convex_hull, hemispherical, median, Winding};
pub use polygon::SphericalConvexPolygon;
pub use region::Region;
pub use vector::{
    cartesian_angular_sep, spherical_angular_sep, spherical_coords, unit_vector, SphericalCoord,
    Vec3, ANGLE_EPSILON, POLE_EPSILON,
};
