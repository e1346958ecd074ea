//! Construction of search region and candidate footprint polygons.

use skystream_core::{Scale, TanWcs};
use skystream_geom::{convex_hull, unit_vector, SphericalConvexPolygon, SphericalCoord};

use crate::error::{Result, SearchError};

/// Builds the rectangular search polygon for a center and size, by
/// pushing a one pixel image through a gnomonic projection centered at
/// the query point and taking the convex hull of the reprojected pixel
/// corners. Not an RA/Dec box: the rectangle lives on the tangent
/// plane.
pub fn make_rectangle(theta: f64, phi: f64, s1: f64, s2: f64) -> Result<SphericalConvexPolygon> {
    let wcs = TanWcs::new(
        (theta, phi),
        (1.0, 1.0),
        Scale::Cd {
            cd1_1: -s1,
            cd1_2: 0.0,
            cd2_1: 0.0,
            cd2_2: s2,
        },
        (1.0, 1.0),
    )?;
    let mut verts = Vec::with_capacity(4);
    for (x, y) in [(0.5, 0.5), (1.5, 0.5), (1.5, 1.5), (0.5, 1.5)] {
        let (t, p) = wcs.pixel_to_sky(x, y);
        verts.push(unit_vector(SphericalCoord::new(t, p)?));
    }
    convex_hull(&verts).ok_or(SearchError::DegenerateRegion)
}

/// Builds a footprint polygon from four corner coordinates in degrees.
/// Corners may wind in either direction.
pub fn corners_to_polygon(corners: [(f64, f64); 4]) -> Result<SphericalConvexPolygon> {
    let mut verts = Vec::with_capacity(4);
    for (theta, phi) in corners {
        verts.push(unit_vector(SphericalCoord::new(theta, phi)?));
    }
    Ok(SphericalConvexPolygon::new(verts)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_contains_its_center() {
        let poly = make_rectangle(20.0, 10.0, 1.0, 0.5).unwrap();
        let center = SphericalCoord::new(20.0, 10.0).unwrap();
        assert!(poly.contains_point(center));
        assert!(!poly.contains_point(SphericalCoord::new(21.5, 10.0).unwrap()));
    }

    #[test]
    fn rectangle_area_tracks_requested_size() {
        let poly = make_rectangle(0.0, 0.0, 1.0, 1.0).unwrap();
        let expected = 1.0f64.to_radians() * 1.0f64.to_radians();
        let area = poly.area();
        assert!((area - expected).abs() < 0.1 * expected, "area {area}");
    }

    #[test]
    fn rectangle_works_at_the_meridian() {
        let poly = make_rectangle(0.0, 0.0, 1.0, 1.0).unwrap();
        assert!(poly.contains_point(SphericalCoord::new(359.8, 0.0).unwrap()));
        assert!(poly.contains_point(SphericalCoord::new(0.2, 0.0).unwrap()));
    }

    #[test]
    fn corner_winding_is_normalized() {
        let ccw = corners_to_polygon([(1.0, -1.0), (359.0, -1.0), (359.0, 1.0), (1.0, 1.0)]);
        let cw = corners_to_polygon([(1.0, 1.0), (359.0, 1.0), (359.0, -1.0), (1.0, -1.0)]);
        let p = SphericalCoord::new(0.0, 0.0).unwrap();
        assert!(ccw.unwrap().contains_point(p));
        assert!(cw.unwrap().contains_point(p));
    }
}
