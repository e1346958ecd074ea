//! Hemisphericity testing, convexity testing and convex hull
//! construction for point sets on the unit sphere.
//!
//! The hemisphericity test decides whether a plane through the origin
//! exists with all points strictly on one side. It runs in O(n) time
//! using Megiddo's algorithm for linear programming in R2:
//!
//! Megiddo, N. 1982. Linear-time algorithms for linear programming in
//! R3 and related problems. In Proceedings of the 23rd Annual Symposium
//! on Foundations of Computer Science. IEEE, 329-338.

use crate::error::ConvexityError;
use crate::polygon::SphericalConvexPolygon;
use crate::vector::{
    cartesian_angular_sep, centroid, Vec3, COS_MAX, CROSS_N2MIN, SIN_MIN,
};

/// Winding order of a convex vertex list, as seen from outside the
/// unit sphere in a right handed coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    CounterClockwise,
    Clockwise,
}

// -- Linear time median finding ----

/// Partitions `array[left..right]` around the pivot value at index `i`,
/// returning the new index of the pivot value.
fn partition<T: PartialOrd + Copy>(array: &mut [T], left: usize, right: usize, i: usize) -> usize {
    let pivot = array[i];
    array[i] = array[right - 1];
    let mut j = left;
    for k in left..right - 1 {
        if array[k] < pivot {
            array.swap(j, k);
            j += 1;
        }
    }
    array[right - 1] = array[j];
    array[j] = pivot;
    j
}

/// Finds the median of `n` consecutive elements starting at index `i`
/// (efficient for small `n`). Returns the index of the median element.
fn median_of_n<T: PartialOrd + Copy>(array: &mut [T], i: usize, n: usize) -> usize {
    if n == 1 {
        return i;
    }
    let k = n >> 1;
    for j in i..i + k + 1 {
        let mut min_index = j;
        for s in j + 1..i + n {
            if array[s] < array[min_index] {
                min_index = s;
            }
        }
        array.swap(j, min_index);
    }
    i + k
}

/// Median-of-medians pivot selection primitive.
fn median_of_medians<T: PartialOrd + Copy>(array: &mut [T], left: usize, mut right: usize) -> usize {
    loop {
        if right - left <= 5 {
            return median_of_n(array, left, right - left);
        }
        let mut i = left;
        let mut j = left;
        while i + 4 < right {
            let k = median_of_n(array, i, 5);
            array.swap(j, k);
            j += 1;
            i += 5;
        }
        right = j;
    }
}

/// Finds the median element of `array` in linear time. The array is
/// reordered in the process.
pub fn median<T: PartialOrd + Copy>(array: &mut [T]) -> Option<T> {
    let mut left = 0;
    let mut right = array.len();
    if right == 0 {
        return None;
    }
    let k = array.len() >> 1;
    loop {
        let i = median_of_medians(array, left, right);
        let i = partition(array, left, right, i);
        if k == i {
            return Some(array[k]);
        } else if k < i {
            right = i;
        } else {
            left = i + 1;
        }
    }
}

// -- Megiddo's algorithm, specialized to the hemisphericity test ----

const MIN_FLOAT: f64 = f64::MIN_POSITIVE;
const EPSILON: f64 = f64::EPSILON;

/// Removes redundant constraints in place and reports intersection
/// points of non-redundant pairs.
fn prune(
    constraints: &mut Vec<(f64, f64)>,
    xmin: f64,
    xmax: f64,
    op: fn(f64, f64) -> bool,
) -> Vec<(f64, f64)> {
    let mut intersections = Vec::new();
    let mut i = 0;
    while i + 1 < constraints.len() {
        let (a1, b1) = constraints[i];
        let (a2, b2) = constraints[i + 1];
        // if constraints are near parallel or intersect to the left or
        // right of the feasible x range, remove the higher/lower one
        let da = a1 - a2;
        let (xi, xierr) = if da.abs() < MIN_FLOAT / EPSILON {
            (f64::INFINITY, 0.0)
        } else {
            let xi = (b2 - b1) / da;
            (xi, 2.0 * EPSILON * xi.abs())
        };
        if xi.is_infinite() {
            if op(b1, b2) {
                constraints.swap_remove(i + 1);
            } else {
                constraints.swap_remove(i);
            }
        } else if xi + xierr <= xmin {
            if op(a1, a2) {
                constraints.swap_remove(i + 1);
            } else {
                constraints.swap_remove(i);
            }
        } else if xi - xierr >= xmax {
            if op(a1, a2) {
                constraints.swap_remove(i);
            } else {
                constraints.swap_remove(i + 1);
            }
        } else {
            intersections.push((xi, xierr));
            i += 2;
        }
    }
    intersections
}

/// Interval of values `a*x' + b` can take for `x'` within `xerr`
/// of `x`, accounting for round-off.
fn vrange(x: f64, xerr: f64, a: f64, b: f64) -> (f64, f64) {
    let p = a * (x - xerr);
    let v = p + b;
    let verr = EPSILON * p.abs() + EPSILON * v.abs();
    let mut vmin = v - verr;
    let mut vmax = v + verr;
    let p = a * (x + xerr);
    let v = p + b;
    let verr = EPSILON * p.abs() + EPSILON * v.abs();
    vmin = vmin.min(v - verr);
    vmax = vmax.max(v + verr);
    (vmin, vmax)
}

/// Evaluates the upper (or lower) envelope of a constraint set at `x`,
/// returning the envelope value interval and the slope range of the
/// constraints attaining it.
fn gh(constraints: &[(f64, f64)], x: f64, xerr: f64, op: fn(f64, f64) -> bool) -> (f64, f64, f64, f64) {
    let (a, b) = constraints[0];
    let mut amin = a;
    let mut amax = a;
    let (mut vmin, mut vmax) = vrange(x, xerr, a, b);
    for &(a, b) in &constraints[1..] {
        let (vimin, vimax) = vrange(x, xerr, a, b);
        if vimax < vmin || vimin > vmax {
            if op(vimin, vmin) {
                amin = a;
                amax = a;
                vmin = vimin;
                vmax = vimax;
            }
        } else {
            amin = amin.min(a);
            amax = amax.max(a);
        }
    }
    (vmin, vmax, amin, amax)
}

fn feasible_2d(points: &[Vec3], z: f64) -> bool {
    let mut i1: Vec<(f64, f64)> = Vec::new();
    let mut i2: Vec<(f64, f64)> = Vec::new();
    let mut xmin = f64::NEG_INFINITY;
    let mut xmax = f64::INFINITY;
    // transform each constraint of the form x*v.x + y*v.y + z*v.z > 0
    // into y op a*x + b or x op c, where op is < or >
    for v in points {
        if v.y.abs() <= MIN_FLOAT {
            if v.x.abs() <= MIN_FLOAT {
                if z * v.z <= 0.0 {
                    // inequalities trivially lack a solution
                    return false;
                }
                // current inequality is trivially true, skip it
            } else {
                let xlim = -z * v.z / v.x;
                if v.x > 0.0 {
                    xmin = xmin.max(xlim);
                } else {
                    xmax = xmax.min(xlim);
                }
                if xmax <= xmin {
                    return false;
                }
            }
        } else {
            // finite since |z|, |v.i| <= 1 and 1/MIN_FLOAT is finite
            let coeffs = (v.x / v.y, -z * v.z / v.y);
            if v.y > 0.0 {
                i1.push(coeffs);
            } else {
                i2.push(coeffs);
            }
        }
    }
    // (xmin, xmax) is non-empty here, so if either I1 or I2 is empty
    // a solution trivially exists
    if i1.is_empty() || i2.is_empty() {
        return true;
    }
    // Check for a feasible solution to the inequalities I1 of the form
    // y > a*x + b, I2 of the form y < a*x + b, x > xmin and x < xmax
    let mut num_constraints = 0;
    loop {
        let mut intersections = prune(&mut i1, xmin, xmax, |a, b| a > b);
        intersections.extend(prune(&mut i2, xmin, xmax, |a, b| a < b));
        if intersections.is_empty() {
            // I1 and I2 each contain exactly one constraint
            let (a1, b1) = i1[0];
            let (a2, b2) = i2[0];
            let xi = if a1 == a2 {
                f64::INFINITY
            } else {
                (b2 - b1) / (a1 - a2)
            };
            if xi.is_infinite() {
                return b1 < b2;
            }
            return (xi > xmin || a1 < a2) && (xi < xmax || a1 > a2);
        } else if num_constraints == i1.len() + i2.len() {
            // No constraints were pruned during search interval
            // refinement, and g was not conclusively less than h.
            // Conservatively report infeasible to avoid looping.
            return false;
        }
        num_constraints = i1.len() + i2.len();
        let (x, xerr) = match median(&mut intersections) {
            Some(m) => m,
            None => return false,
        };
        // If g(x) < h(x), x is a feasible solution. Otherwise refine
        // the search interval using the one-sided derivatives of g/h.
        let (_gmin, gmax, sg, big_sg) = gh(&i1, x, xerr, |a, b| a > b);
        let (hmin, _hmax, sh, big_sh) = gh(&i2, x, xerr, |a, b| a < b);
        if gmax <= hmin {
            return true;
        } else if sg > big_sh {
            xmax = x + xerr;
        } else if big_sg < sh {
            xmin = x - xerr;
        } else {
            return false;
        }
    }
}

fn feasible_1d(points: &[Vec3], y: f64) -> bool {
    let mut xmin = f64::NEG_INFINITY;
    let mut xmax = f64::INFINITY;
    for v in points {
        if v.x.abs() <= MIN_FLOAT {
            if y * v.y <= 0.0 {
                return false;
            }
            // inequality is trivially true, skip it
        } else {
            let xlim = -y * v.y / v.x;
            if v.x > 0.0 {
                xmin = xmin.max(xlim);
            } else {
                xmax = xmax.min(xlim);
            }
            if xmax <= xmin {
                return false;
            }
        }
    }
    true
}

/// Tests whether a set of points (cartesian unit vectors) is
/// hemispherical, i.e. whether a plane through the origin exists such
/// that all points are strictly on one side of it. Runs in O(n) time.
pub fn hemispherical(points: &[Vec3]) -> bool {
    // Check whether x*v.x + y*v.y + z*v.z > 0 for all v has a solution
    // (x, y, z). Solutions are scale invariant, so fix z to 1, -1 and
    // perform 2D feasibility tests.
    if feasible_2d(points, 1.0) {
        return true;
    }
    if feasible_2d(points, -1.0) {
        return true;
    }
    // Any feasible solution now has z = 0. Fix y to 1, -1 and perform
    // 1D feasibility tests.
    if feasible_1d(points, 1.0) {
        return true;
    }
    if feasible_1d(points, -1.0) {
        return true;
    }
    // Any feasible solution now has y = z = 0. Feasible iff all v.x
    // are non-zero and share a sign.
    let mut have_pos = false;
    let mut have_neg = false;
    for v in points {
        if v.x > 0.0 {
            if have_neg {
                return false;
            }
            have_pos = true;
        } else if v.x < 0.0 {
            if have_pos {
                return false;
            }
            have_neg = true;
        } else {
            return false;
        }
    }
    true
}

// -- Convexity test and convex hull construction ----

/// Tests whether an ordered list of vertices (cartesian unit vectors)
/// forms a spherical convex polygon, and if so reports the winding
/// order. Runs in O(n) time.
pub fn convex(vertices: &[Vec3]) -> Result<Winding, ConvexityError> {
    let n = vertices.len();
    if n < 3 {
        return Err(ConvexityError::TooFewVertices);
    }
    if !hemispherical(vertices) {
        return Err(ConvexityError::NotHemispherical);
    }
    let center = centroid(vertices).map_err(|_| ConvexityError::DegenerateVertices)?;
    let mut winding_angle = 0.0;
    let mut clockwise = false;
    let mut counter_clockwise = false;
    let mut p1 = center.cross(vertices[n - 1]);
    if p1.dot(p1).abs() < CROSS_N2MIN {
        return Err(ConvexityError::CentroidNearVertex);
    }
    for i in 0..n {
        let beg = vertices[(i + n - 2) % n];
        let mid = vertices[(i + n - 1) % n];
        let end = vertices[i];
        let plane = mid.cross(end);
        let n2 = plane.dot(plane);
        if mid.dot(end) >= COS_MAX || n2 < CROSS_N2MIN {
            return Err(ConvexityError::DegenerateVertices);
        }
        let plane = plane.inv_scale(n2.sqrt());
        let d = plane.dot(beg);
        if d > SIN_MIN {
            if clockwise {
                return Err(ConvexityError::MixedWinding);
            }
            counter_clockwise = true;
        } else if d < -SIN_MIN {
            if counter_clockwise {
                return Err(ConvexityError::MixedWinding);
            }
            clockwise = true;
        }
        // center must be inside the polygon if the vertices are convex,
        // which is equivalent to the vertices always winding around it
        // in the same direction
        let d = plane.dot(center);
        if (d < SIN_MIN && counter_clockwise) || (d > -SIN_MIN && clockwise) {
            return Err(ConvexityError::CentroidOutsideEdge);
        }
        // sum up winding angle for edge (mid, end)
        let p2 = center.cross(end);
        if p2.dot(p2).abs() < CROSS_N2MIN {
            return Err(ConvexityError::CentroidNearVertex);
        }
        winding_angle += cartesian_angular_sep(p1, p2);
        p1 = p2;
    }
    // for convex polygons the winding angle is within (180, 540) and
    // the closest multiple of 360 to it is 1
    let m = (winding_angle / 360.0).floor();
    if (m == 0.0 && winding_angle > 180.0) || (m == 1.0 && winding_angle < 540.0) {
        if counter_clockwise {
            Ok(Winding::CounterClockwise)
        } else {
            Ok(Winding::Clockwise)
        }
    } else {
        Err(ConvexityError::IncompleteWinding)
    }
}

/// Computes the convex hull (a spherical convex polygon) of an
/// unordered set of points on the unit sphere, passed in as cartesian
/// unit vectors. Returns `None` if the points have no convex hull,
/// e.g. because they are not hemispherical or span fewer than 3
/// distinct directions. Takes O(n log n) time.
pub fn convex_hull(points: &[Vec3]) -> Option<SphericalConvexPolygon> {
    if points.len() < 3 {
        return None;
    }
    if !hemispherical(points) {
        return None;
    }
    let center = centroid(points).ok()?;
    // the point furthest from the center is on the hull
    let mut max_sep = 0.0;
    let mut extremum = 0;
    for (i, p) in points.iter().enumerate() {
        let sep = cartesian_angular_sep(*p, center);
        if sep > max_sep {
            extremum = i;
            max_sep = sep;
        }
    }
    let mut anchor = points[extremum];
    let ref_plane = center.cross(anchor);
    let n2 = ref_plane.dot(ref_plane);
    if n2 < CROSS_N2MIN {
        // extremum and center are too close
        return None;
    }
    let ref_plane = ref_plane.inv_scale(n2.sqrt());
    // order points by winding angle from the extreme vertex
    let mut av: Vec<(f64, Vec3)> = vec![(0.0, anchor)];
    for (i, &v) in points.iter().enumerate() {
        if i == extremum {
            continue;
        }
        let plane = center.cross(v);
        let n2 = plane.dot(plane);
        if n2 >= CROSS_N2MIN {
            let plane = plane.inv_scale(n2.sqrt());
            let p = ref_plane.cross(plane);
            let mut sa = p.dot(p).sqrt();
            if p.dot(center) < 0.0 {
                sa = -sa;
            }
            let mut angle = sa.atan2(ref_plane.dot(plane));
            if angle < 0.0 {
                angle += 2.0 * std::f64::consts::PI;
            }
            av.push((angle, v));
        }
    }
    if av.len() < 3 {
        return None;
    }
    // stable, so av[0] still holds the anchor
    av.sort_by(|a, b| a.0.total_cmp(&b.0));
    // Graham scan adapted for spherical geometry. Chan's algorithm
    // would be asymptotically better but is likely slower for the
    // small vertex counts expected here.
    let mut verts = vec![av[0].1];
    let mut edges: Vec<Vec3> = vec![Vec3 { x: 0.0, y: 0.0, z: 0.0 }];
    let mut edge: Option<Vec3> = None;
    let mut i = 1;
    while i < av.len() {
        let v = av[i].1;
        let p = anchor.cross(v);
        let n2 = p.dot(p);
        if anchor.dot(v) < COS_MAX && n2 >= CROSS_N2MIN {
            match edge {
                None => {
                    let e = p.inv_scale(n2.sqrt());
                    edge = Some(e);
                    verts.push(v);
                    edges.push(e);
                    anchor = v;
                }
                Some(e) => {
                    let d = v.dot(e);
                    if d > SIN_MIN {
                        // v is inside the edge defined by the last two
                        // hull vertices
                        let e = p.inv_scale(n2.sqrt());
                        edge = Some(e);
                        verts.push(v);
                        edges.push(e);
                        anchor = v;
                    } else if d < -SIN_MIN {
                        // backtrack, the most recently added hull
                        // vertex is not actually on the hull
                        verts.pop();
                        edges.pop();
                        anchor = verts[verts.len() - 1];
                        edge = Some(edges[edges.len() - 1]);
                        // reprocess v to decide whether to add it or
                        // whether further backtracking is necessary
                        continue;
                    }
                    // v is coplanar with edge, skip it
                }
            }
        }
        i += 1;
    }
    // handle backtracking necessary for the last edge
    if verts.len() < 3 {
        return None;
    }
    let v = verts[0];
    loop {
        let p = anchor.cross(v);
        let n2 = p.dot(p);
        if anchor.dot(v) < COS_MAX && n2 >= CROSS_N2MIN {
            if let Some(e) = edge {
                if v.dot(e) > SIN_MIN {
                    edges[0] = p.inv_scale(n2.sqrt());
                    break;
                }
            }
        }
        verts.pop();
        edges.pop();
        anchor = verts[verts.len() - 1];
        edge = Some(edges[edges.len() - 1]);
        if verts.len() < 3 {
            return None;
        }
    }
    Some(SphericalConvexPolygon::from_parts(verts, edges))
}
