//! Cross-shape predicates exercised through the `Region` dispatch,
//! the way the search layer consumes the kernel.

use skystream_geom::vector::{spherical_coords, unit_vector, SphericalCoord, Vec3};
use skystream_geom::{
    convex_hull, hemispherical, Region, SphericalBox, SphericalCircle, SphericalConvexPolygon,
};

fn coord(theta: f64, phi: f64) -> SphericalCoord {
    SphericalCoord::new(theta, phi).unwrap()
}

fn quad(corners: [(f64, f64); 4]) -> SphericalConvexPolygon {
    let verts: Vec<Vec3> = corners
        .iter()
        .map(|&(t, p)| unit_vector(coord(t, p)))
        .collect();
    SphericalConvexPolygon::new(verts).unwrap()
}

#[test]
fn circle_inside_box_inside_circle() {
    let small = SphericalCircle::new(coord(45.0, 10.0), 0.5).unwrap();
    let bx = SphericalBox::new(coord(43.0, 8.0), coord(47.0, 12.0)).unwrap();
    let big = SphericalCircle::new(coord(45.0, 10.0), 10.0).unwrap();

    let small = Region::Circle(small);
    let bx = Region::Box(bx);
    let big = Region::Circle(big);

    assert!(bx.contains(&small));
    assert!(big.contains(&bx));
    assert!(big.contains(&small));
    assert!(!small.contains(&bx));
    assert!(small.intersects(&bx));
    assert!(bx.intersects(&big));
}

#[test]
fn wrapping_box_predicates() {
    // box straddling the 0/360 meridian
    let bx = SphericalBox::new(coord(355.0, -5.0), coord(5.0, 5.0)).unwrap();
    assert!(bx.wraps());
    let bx = Region::Box(bx);
    assert!(bx.contains_point(coord(0.0, 0.0)));
    assert!(bx.contains_point(coord(358.0, 3.0)));
    assert!(!bx.contains_point(coord(10.0, 0.0)));

    let east = Region::Box(SphericalBox::new(coord(3.0, -1.0), coord(8.0, 1.0)).unwrap());
    assert!(bx.intersects(&east));
    assert!(!bx.contains(&east));
}

#[test]
fn polygon_circle_dispatch() {
    let poly = Region::Polygon(quad([
        (10.0, -2.0),
        (14.0, -2.0),
        (14.0, 2.0),
        (10.0, 2.0),
    ]));
    let inner = Region::Circle(SphericalCircle::new(coord(12.0, 0.0), 0.5).unwrap());
    let crossing = Region::Circle(SphericalCircle::new(coord(14.0, 0.0), 1.0).unwrap());
    let outside = Region::Circle(SphericalCircle::new(coord(20.0, 0.0), 1.0).unwrap());

    assert!(poly.contains(&inner));
    assert!(!poly.contains(&crossing));
    assert!(poly.intersects(&crossing));
    assert!(!poly.intersects(&outside));
}

#[test]
fn polygon_polygon_clipping_predicates() {
    let a = quad([(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
    let shifted = quad([(2.0, 2.0), (6.0, 2.0), (6.0, 6.0), (2.0, 6.0)]);
    let hole = quad([(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);

    assert!(a.intersects_polygon(&shifted));
    assert!(!a.contains_polygon(&shifted));
    assert!(a.contains_polygon(&hole));

    let overlap = a.intersect(&shifted).unwrap();
    let expected = quad([(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0)]);
    assert!((overlap.area() - expected.area()).abs() < 1e-6);
}

#[test]
fn hull_of_scattered_points_contains_their_centroid() {
    let pts: Vec<Vec3> = [
        (100.0, 20.0),
        (102.0, 20.5),
        (101.0, 22.0),
        (99.5, 21.5),
        (100.5, 21.0), // interior point, must not appear as a vertex
    ]
    .iter()
    .map(|&(t, p)| unit_vector(coord(t, p)))
    .collect();
    assert!(hemispherical(&pts));

    let hull = convex_hull(&pts).unwrap();
    assert_eq!(hull.vertices().len(), 4);
    assert!(hull.contains_point(coord(100.5, 21.0)));
    let center = spherical_coords(hull.vertices().iter().fold(Vec3::new(0.0, 0.0, 0.0), |a, &v| {
        Vec3::new(a.x + v.x, a.y + v.y, a.z + v.z)
    }));
    assert!(hull.contains_point(center));
}

#[test]
fn antipodal_points_are_not_hemispherical() {
    let pts = vec![
        unit_vector(coord(0.0, 0.0)),
        unit_vector(coord(180.0, 0.0)),
        unit_vector(coord(90.0, 0.0)),
        unit_vector(coord(270.0, 0.0)),
        unit_vector(coord(0.0, 90.0)),
    ];
    assert!(!hemispherical(&pts));
    assert!(convex_hull(&pts).is_none());
}
