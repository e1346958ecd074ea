//! Circles on the unit sphere.

use crate::bbox::SphericalBox;
use crate::error::{GeomError, Result};
use crate::polygon::SphericalConvexPolygon;
use crate::vector::{
    alpha, cartesian_angular_sep, clamp_phi, max_alpha, min_phi_edge_sep, min_theta_edge_sep,
    reduce_theta, spherical_angular_sep, unit_vector, SphericalCoord, ANGLE_EPSILON,
};

/// A circle on the unit sphere. Points falling exactly on the circle are
/// inside (contained by) the circle.
///
/// A radius of 0 is a point; a radius of 180 or more covers the full
/// sphere. Negative radii are rejected at construction (the canonical
/// empty circle is not constructible through `new`).
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalCircle {
    center: SphericalCoord,
    radius: f64,
}

impl SphericalCircle {
    /// Creates a circle with the given center and radius in degrees.
    pub fn new(center: SphericalCoord, radius: f64) -> Result<Self> {
        if radius < 0.0 || radius > 180.0 {
            return Err(GeomError::RadiusOutOfRange(radius));
        }
        Ok(SphericalCircle {
            center: SphericalCoord {
                theta: reduce_theta(center.theta),
                phi: center.phi,
            },
            radius,
        })
    }

    /// Unchecked constructor for internally derived circles whose
    /// center and radius are already known to be valid.
    pub(crate) fn from_parts(center: SphericalCoord, radius: f64) -> Self {
        SphericalCircle { center, radius }
    }

    pub fn center(&self) -> SphericalCoord {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn is_empty(&self) -> bool {
        self.radius < 0.0
    }

    pub fn is_full(&self) -> bool {
        self.radius >= 180.0
    }

    /// Bounding box for this circle, using the closed-form longitude
    /// half-extent of a small circle (clamped near the poles).
    pub fn bounding_box(&self) -> SphericalBox {
        if self.is_empty() {
            return SphericalBox::empty();
        }
        if self.is_full() {
            return SphericalBox::full();
        }
        let a = max_alpha(self.radius, self.center.phi);
        let min_phi = clamp_phi(self.center.phi - self.radius);
        let max_phi = clamp_phi(self.center.phi + self.radius);
        let (min_theta, max_theta) = if a > 180.0 - ANGLE_EPSILON {
            (0.0, 360.0)
        } else {
            (self.center.theta - a, self.center.theta + a)
        };
        // bounds are valid by construction
        SphericalBox::new(
            SphericalCoord {
                theta: min_theta,
                phi: min_phi,
            },
            SphericalCoord {
                theta: max_theta,
                phi: max_phi,
            },
        )
        .unwrap_or_else(|_| SphericalBox::full())
    }

    /// True if this circle contains the given point.
    pub fn contains_point(&self, p: SphericalCoord) -> bool {
        if self.is_empty() {
            return false;
        }
        spherical_angular_sep(self.center, p) <= self.radius
    }

    /// True if this circle completely contains the given box.
    pub fn contains_box(&self, b: &SphericalBox) -> bool {
        if self.is_empty() || b.is_empty() {
            return false;
        }
        let c = self.center;
        let r = self.radius;
        let minp = b.min();
        let maxp = b.max();
        // all four box vertices must be inside
        let corners = [
            minp,
            maxp,
            SphericalCoord {
                theta: minp.theta,
                phi: maxp.phi,
            },
            SphericalCoord {
                theta: maxp.theta,
                phi: minp.phi,
            },
        ];
        if corners
            .iter()
            .any(|&p| spherical_angular_sep(c, p) > r)
        {
            return false;
        }
        // circle boundary must not dip inside the box along either
        // small-circle edge
        for phi in [minp.phi, maxp.phi] {
            if let Some(a) = alpha(r, c.phi, phi) {
                if b.contains_point(SphericalCoord {
                    theta: c.theta + a,
                    phi,
                }) || b.contains_point(SphericalCoord {
                    theta: c.theta - a,
                    phi,
                }) {
                    return false;
                }
            }
        }
        true
    }

    /// True if this circle completely contains the other circle.
    pub fn contains_circle(&self, other: &SphericalCircle) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        spherical_angular_sep(self.center, other.center) <= self.radius - other.radius
    }

    /// True if this circle completely contains the given polygon.
    pub fn contains_polygon(&self, poly: &SphericalConvexPolygon) -> bool {
        if self.is_empty() {
            return false;
        }
        let p = unit_vector(self.center);
        poly.vertices()
            .iter()
            .all(|&v| cartesian_angular_sep(p, v) <= self.radius)
    }

    /// True if this circle intersects the given box.
    pub fn intersects_box(&self, b: &SphericalBox) -> bool {
        if self.is_empty() || b.is_empty() {
            return false;
        }
        if b.contains_point(self.center) {
            return true;
        }
        let c = self.center;
        let r = self.radius;
        let minp = b.min();
        let maxp = b.max();
        if min_phi_edge_sep(c, minp.phi, minp.theta, maxp.theta) <= r
            || min_phi_edge_sep(c, maxp.phi, minp.theta, maxp.theta) <= r
        {
            return true;
        }
        let p = unit_vector(c);
        min_theta_edge_sep(p, minp.theta, minp.phi, maxp.phi) <= r
            || min_theta_edge_sep(p, maxp.theta, minp.phi, maxp.phi) <= r
    }

    /// True if this circle intersects the other circle.
    pub fn intersects_circle(&self, other: &SphericalCircle) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        spherical_angular_sep(self.center, other.center) <= self.radius + other.radius
    }

    /// True if this circle intersects the given polygon.
    pub fn intersects_polygon(&self, poly: &SphericalConvexPolygon) -> bool {
        poly.intersects_circle(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(theta: f64, phi: f64) -> SphericalCoord {
        SphericalCoord::new(theta, phi).unwrap()
    }

    #[test]
    fn membership_matches_angular_sep() {
        let c = SphericalCircle::new(coord(120.0, 30.0), 12.5).unwrap();
        for &theta in &[0.0, 60.0, 110.0, 120.0, 130.0, 240.0] {
            for &phi in &[-60.0, 0.0, 20.0, 30.0, 40.0, 80.0] {
                let p = coord(theta, phi);
                let sep = spherical_angular_sep(c.center(), p);
                assert_eq!(c.contains_point(p), sep <= c.radius(), "{theta} {phi}");
            }
        }
    }

    #[test]
    fn radius_bounds_enforced() {
        assert!(matches!(
            SphericalCircle::new(coord(0.0, 0.0), -1.0),
            Err(GeomError::RadiusOutOfRange(_))
        ));
        assert!(matches!(
            SphericalCircle::new(coord(0.0, 0.0), 180.5),
            Err(GeomError::RadiusOutOfRange(_))
        ));
    }

    #[test]
    fn full_circle_bounding_box() {
        let c = SphericalCircle::new(coord(10.0, 10.0), 180.0).unwrap();
        assert!(c.is_full());
        assert!(c.bounding_box().is_full());
    }

    #[test]
    fn bounding_box_contains_boundary_samples() {
        let c = SphericalCircle::new(coord(45.0, 60.0), 10.0).unwrap();
        let bb = c.bounding_box();
        // sample points on the circle boundary
        for k in 0..36 {
            let ang = f64::from(k) * 10.0_f64.to_radians();
            // walk 10 deg from the center along bearing ang
            let phi = (c.center().phi.to_radians().sin() * 10.0_f64.to_radians().cos()
                + c.center().phi.to_radians().cos()
                    * 10.0_f64.to_radians().sin()
                    * ang.cos())
            .asin()
            .to_degrees();
            let dtheta = (ang.sin() * 10.0_f64.to_radians().sin())
                .atan2(
                    10.0_f64.to_radians().cos()
                        - c.center().phi.to_radians().sin() * phi.to_radians().sin(),
                )
                .to_degrees();
            let p = coord(reduce_theta(c.center().theta + dtheta), phi);
            assert!(bb.contains_point(p), "boundary point {p:?} outside bbox");
        }
    }

    #[test]
    fn circle_circle_relations() {
        let big = SphericalCircle::new(coord(0.0, 0.0), 20.0).unwrap();
        let small = SphericalCircle::new(coord(5.0, 0.0), 5.0).unwrap();
        let far = SphericalCircle::new(coord(90.0, 0.0), 5.0).unwrap();
        assert!(big.contains_circle(&small));
        assert!(!small.contains_circle(&big));
        assert!(big.intersects_circle(&small));
        assert!(!big.intersects_circle(&far));
    }

    #[test]
    fn circle_box_intersection() {
        let c = SphericalCircle::new(coord(0.0, 0.0), 5.0).unwrap();
        let near = SphericalBox::new(coord(3.0, -2.0), coord(20.0, 2.0)).unwrap();
        let far = SphericalBox::new(coord(90.0, -2.0), coord(120.0, 2.0)).unwrap();
        assert!(c.intersects_box(&near));
        assert!(!c.intersects_box(&far));
        let tiny = SphericalBox::new(coord(359.0, -1.0), coord(1.0, 1.0)).unwrap();
        assert!(c.contains_box(&tiny));
        assert!(!c.contains_box(&near));
    }
}
