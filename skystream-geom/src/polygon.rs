//! Convex polygons on the unit sphere with great circle edges.

use crate::bbox::SphericalBox;
use crate::circle::SphericalCircle;
use crate::error::{GeomError, Result};
use crate::hull::{convex, Winding};
use crate::vector::{
    centroid, min_edge_sep, spherical_coords, unit_vector, SphericalCoord, Vec3, COS_MAX, SIN_MIN,
};

const MIN_FLOAT: f64 = f64::MIN_POSITIVE;

/// A convex polygon on the unit sphere with great circle edges. Points
/// falling exactly on polygon edges are considered to be inside
/// (contained by) the polygon.
///
/// Vertices are stored in counter-clockwise order as seen from outside
/// the unit sphere in a right handed coordinate system. The i-th edge
/// is the plane equation of the great circle connecting vertices
/// `i - 1` and `i`, i.e. a unit vector parallel to `v[i-1] x v[i]`.
/// All edge plane normals therefore point into the polygon interior.
#[derive(Debug, Clone)]
pub struct SphericalConvexPolygon {
    vertices: Vec<Vec3>,
    edges: Vec<Vec3>,
}

impl SphericalConvexPolygon {
    /// Creates a polygon from a list of vertices (cartesian unit
    /// vectors), validating hemisphericity and convexity. Clockwise
    /// input is reversed into counter-clockwise order.
    pub fn new(mut vertices: Vec<Vec3>) -> Result<Self> {
        match convex(&vertices)? {
            Winding::CounterClockwise => {}
            Winding::Clockwise => vertices.reverse(),
        }
        let edges = compute_edges(&vertices)?;
        Ok(SphericalConvexPolygon { vertices, edges })
    }

    /// Unchecked constructor for vertex and edge lists already known
    /// to describe a counter-clockwise convex polygon.
    pub(crate) fn from_parts(vertices: Vec<Vec3>, edges: Vec<Vec3>) -> Self {
        SphericalConvexPolygon { vertices, edges }
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// The i-th edge is the plane equation for the great circle edge
    /// formed by vertices i-1 and i.
    pub fn edges(&self) -> &[Vec3] {
        &self.edges
    }

    fn center_vector(&self) -> Vec3 {
        // the vertex sum of a hemispherical vertex list cannot vanish
        centroid(&self.vertices).unwrap_or(self.vertices[0])
    }

    /// Returns the centroid of the polygon vertices.
    pub fn center(&self) -> SphericalCoord {
        spherical_coords(self.center_vector())
    }

    /// Returns a bounding circle (not necessarily minimal) for this
    /// polygon.
    pub fn bounding_circle(&self) -> SphericalCircle {
        let center = self.center_vector();
        let mut radius = 0.0_f64;
        for &v in &self.vertices {
            radius = radius.max(crate::vector::cartesian_angular_sep(center, v));
        }
        SphericalCircle::from_parts(spherical_coords(center), radius)
    }

    /// Returns a bounding box for this polygon.
    pub fn bounding_box(&self) -> SphericalBox {
        let mut bbox = SphericalBox::empty();
        let n = self.vertices.len();
        for i in 0..n {
            if let Ok(e) = SphericalBox::edge(
                self.vertices[(i + n - 1) % n],
                self.vertices[i],
                self.edges[i],
            ) {
                bbox.extend_box(&e);
            }
        }
        bbox
    }

    /// Returns the z coordinate range spanned by this polygon.
    pub fn z_range(&self) -> (f64, f64) {
        let bbox = self.bounding_box();
        (
            bbox.min().phi.to_radians().sin(),
            bbox.max().phi.to_radians().sin(),
        )
    }

    /// Returns the intersection of this polygon with the positive half
    /// space of the given plane, which must be specified as a cartesian
    /// unit normal and always passes through the origin. Returns `None`
    /// when the intersection is empty or degenerate (fewer than 3
    /// vertices survive, or the polygon is coplanar with the plane).
    ///
    /// Clipping uses the Sutherland-Hodgman algorithm adapted for
    /// spherical polygons.
    pub fn clip(&self, plane: Vec3) -> Option<SphericalConvexPolygon> {
        let n = self.vertices.len();
        let mut vin = false;
        let mut vout = false;
        let mut classification = Vec::with_capacity(n);
        for &v in &self.vertices {
            let mut d = plane.dot(v);
            if d > SIN_MIN {
                vin = true;
            } else if d < -SIN_MIN {
                vout = true;
            } else {
                d = 0.0;
            }
            classification.push(d);
        }
        if !vin && !vout {
            // polygon and clipping plane are coplanar
            return None;
        }
        if !vout {
            return Some(self.clone());
        } else if !vin {
            return None;
        }
        let mut vertices = Vec::new();
        let mut edges = Vec::new();
        let mut v0 = self.vertices[n - 1];
        let mut d0 = classification[n - 1];
        for i in 0..n {
            let v1 = self.vertices[i];
            let d1 = classification[i];
            if d0 > 0.0 {
                if d1 >= 0.0 {
                    // positive to positive, positive to zero: no
                    // intersection, emit the current input vertex
                    vertices.push(v1);
                    edges.push(self.edges[i]);
                } else {
                    // positive to negative: emit the intersection point
                    if let Some(v) = edge_plane_intersection(v0, v1, d0, d1) {
                        vertices.push(v);
                        edges.push(self.edges[i]);
                    }
                }
            } else if d0 == 0.0 {
                if d1 >= 0.0 {
                    // zero to positive: no intersection, emit the
                    // current input vertex
                    vertices.push(v1);
                    edges.push(self.edges[i]);
                }
                // zero to zero: a coplanar edge with vertices on both
                // sides of the plane implies a near-duplicate vertex
                // under the convexity assumption, so skip it.
                //
                // zero to negative: no intersection, skip the vertex
            } else if d1 > 0.0 {
                // negative to positive: emit the intersection point
                // followed by the current input vertex
                if let Some(v) = edge_plane_intersection(v0, v1, d0, d1) {
                    vertices.push(v);
                    edges.push(plane);
                }
                vertices.push(v1);
                edges.push(self.edges[i]);
            } else if d1 == 0.0 {
                // negative to zero: emit the current input vertex
                vertices.push(v1);
                edges.push(plane);
            }
            // negative to negative: no intersection, skip the vertex
            v0 = v1;
            d0 = d1;
        }
        if vertices.len() < 3 {
            return None;
        }
        Some(SphericalConvexPolygon::from_parts(vertices, edges))
    }

    /// Returns the intersection of this polygon with another, or
    /// `None` if the polygons do not intersect.
    pub fn intersect(&self, poly: &SphericalConvexPolygon) -> Option<SphericalConvexPolygon> {
        let mut p = self.clone();
        for &edge in poly.edges() {
            p = p.clip(edge)?;
        }
        Some(p)
    }

    /// Returns the area of this polygon in steradians, computed from
    /// the spherical excess of its interior angles.
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        let mut angle_sum = 0.0;
        for i in 0..n {
            let prev = self.edges[(i + n - 1) % n];
            let cur = self.edges[i];
            let tmp = prev.cross(cur);
            let sina = tmp.dot(tmp).sqrt();
            let cosa = -prev.dot(cur);
            angle_sum += sina.atan2(cosa);
        }
        angle_sum - (n as f64 - 2.0) * std::f64::consts::PI
    }

    /// True if the given unit vector is inside all polygon edges.
    pub fn contains_vector(&self, v: Vec3) -> bool {
        self.edges.iter().all(|&e| v.dot(e) >= 0.0)
    }

    pub fn contains_point(&self, p: SphericalCoord) -> bool {
        self.contains_vector(unit_vector(p))
    }

    /// True if this polygon completely contains the other polygon.
    pub fn contains_polygon(&self, poly: &SphericalConvexPolygon) -> bool {
        poly.vertices.iter().all(|&v| self.contains_vector(v))
    }

    fn min_boundary_sep(&self, cv: Vec3) -> f64 {
        let n = self.vertices.len();
        let mut min_sep = f64::INFINITY;
        for i in 0..n {
            let s = min_edge_sep(cv, self.edges[i], self.vertices[(i + n - 1) % n], self.vertices[i]);
            min_sep = min_sep.min(s);
        }
        min_sep
    }

    /// True if this polygon completely contains the given circle.
    pub fn contains_circle(&self, circle: &SphericalCircle) -> bool {
        let cv = unit_vector(circle.center());
        if !self.contains_vector(cv) {
            return false;
        }
        self.min_boundary_sep(cv) >= circle.radius()
    }

    /// True if this polygon completely contains the given box.
    pub fn contains_box(&self, b: &SphericalBox) -> bool {
        if b.is_empty() {
            return false;
        }
        let bmin = b.min();
        let bmax = b.max();
        let bz_min = bmin.phi.to_radians().sin();
        let bz_max = bmax.phi.to_radians().sin();
        // all box vertices must be inside the polygon
        let corners = [
            bmin,
            bmax,
            SphericalCoord {
                theta: bmin.theta,
                phi: bmax.phi,
            },
            SphericalCoord {
                theta: bmax.theta,
                phi: bmin.phi,
            },
        ];
        if !corners.iter().all(|&c| self.contains_point(c)) {
            return false;
        }
        // intersections of the box small circles with polygon edges
        // must either not exist or fall outside the box
        for e in &self.edges {
            let d = e.x * e.x + e.y * e.y;
            if e.z.abs() >= COS_MAX || d < MIN_FLOAT {
                // polygon edge is approximately described by z = +/-1;
                // box vertices are inside the polygon, so they cannot
                // intersect the edge
                continue;
            }
            for bz in [bz_min, bz_max] {
                let disc = d - bz * bz;
                if disc >= 0.0 {
                    // polygon edge intersects z = bz
                    let disc = disc.sqrt();
                    let xr = -e.x * e.z * bz;
                    let yr = -e.y * e.z * bz;
                    let i1 = Vec3::new((xr + e.y * disc) / d, (yr - e.x * disc) / d, bz);
                    let i2 = Vec3::new((xr - e.y * disc) / d, (yr + e.x * disc) / d, bz);
                    if b.contains_point(spherical_coords(i1))
                        || b.contains_point(spherical_coords(i2))
                    {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// True if this polygon intersects the other polygon.
    pub fn intersects_polygon(&self, poly: &SphericalConvexPolygon) -> bool {
        self.intersect(poly).is_some()
    }

    /// True if this polygon intersects the given circle.
    pub fn intersects_circle(&self, circle: &SphericalCircle) -> bool {
        if circle.is_empty() {
            return false;
        }
        let cv = unit_vector(circle.center());
        if self.contains_vector(cv) {
            return true;
        }
        self.min_boundary_sep(cv) <= circle.radius()
    }

    /// True if this polygon intersects the given box. The polygon is
    /// clipped to the half spaces bounding the box longitude range and
    /// the z range of the remainder is compared to the box z range.
    pub fn intersects_box(&self, b: &SphericalBox) -> bool {
        if b.is_empty() {
            return false;
        }
        let min_theta = b.min().theta.to_radians();
        let max_theta = b.max().theta.to_radians();
        let bz_min = b.min().phi.to_radians().sin();
        let bz_max = b.max().phi.to_radians().sin();
        let mut p = self.clip(Vec3::new(-min_theta.sin(), min_theta.cos(), 0.0));
        if b.theta_extent() > 180.0 {
            if let Some(ref q) = p {
                let (z_min, z_max) = q.z_range();
                if z_min <= bz_max && z_max >= bz_min {
                    return true;
                }
            }
            p = self.clip(Vec3::new(max_theta.sin(), -max_theta.cos(), 0.0));
        } else if let Some(q) = p {
            p = q.clip(Vec3::new(max_theta.sin(), -max_theta.cos(), 0.0));
        }
        match p {
            None => false,
            Some(q) => {
                let (z_min, z_max) = q.z_range();
                z_min <= bz_max && z_max >= bz_min
            }
        }
    }
}

/// Equality up to cyclic permutation of vertices and edges.
impl PartialEq for SphericalConvexPolygon {
    fn eq(&self, other: &Self) -> bool {
        let n = self.vertices.len();
        if n != other.vertices.len() {
            return false;
        }
        let offset = match other.vertices.iter().position(|&v| v == self.vertices[0]) {
            Some(o) => o,
            None => return false,
        };
        for i in 0..n {
            let j = (offset + i) % n;
            if self.vertices[i] != other.vertices[j] || self.edges[i] != other.edges[j] {
                return false;
            }
        }
        true
    }
}

fn compute_edges(vertices: &[Vec3]) -> Result<Vec<Vec3>> {
    let n = vertices.len();
    if n < 3 {
        return Err(GeomError::TooFewVertices);
    }
    let mut edges = Vec::with_capacity(n);
    for i in 0..n {
        edges.push(vertices[(i + n - 1) % n].cross(vertices[i]).normalized()?);
    }
    Ok(edges)
}

/// Point where the great-circle edge from `v0` to `v1` crosses the
/// clipping plane, given the signed distances of the endpoints.
fn edge_plane_intersection(v0: Vec3, v1: Vec3, d0: f64, d1: f64) -> Option<Vec3> {
    let f = d0 / (d0 - d1);
    Vec3::new(
        v0.x + (v1.x - v0.x) * f,
        v0.y + (v1.y - v0.y) * f,
        v0.z + (v1.z - v0.z) * f,
    )
    .normalized()
    .ok()
}
