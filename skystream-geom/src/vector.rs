//! Cartesian/spherical coordinate primitives and angular separations.
//!
//! Everything here is a pure value computation on degrees and unit
//! 3-vectors. The epsilon constants are calibrated tolerances against
//! known numerical failure modes; reuse them, do not re-derive.

use crate::error::{GeomError, Result};

/// Degrees per arcsecond.
pub const DEG_PER_ARCSEC: f64 = 1.0 / 3600.0;

/// Angle comparison slack: 1 milli-arcsec in degrees.
pub const ANGLE_EPSILON: f64 = 0.001 * DEG_PER_ARCSEC;

/// Pole proximity slack: 1 arcsec in degrees.
pub const POLE_EPSILON: f64 = 1.0 * DEG_PER_ARCSEC;

/// Dot product of 2 unit vectors must be < COS_MAX, or they are
/// considered identical.
pub const COS_MAX: f64 = 1.0 - 1.0e-15;

/// Squared norm of the cross product of 2 unit vectors must be
/// >= CROSS_N2MIN, or the edge joining them is considered degenerate.
pub const CROSS_N2MIN: f64 = 2e-15;

/// Dot product of a unit plane normal and a unit vector must exceed
/// SIN_MIN in magnitude, or the vector is considered to lie on the plane.
/// Equal to CROSS_N2MIN.sqrt().
pub const SIN_MIN: f64 = 4.47213595499958e-8;

/// A cartesian 3-vector. Most operations expect unit vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3 { x, y, z }
    }

    /// Dot product.
    pub fn dot(self, o: Vec3) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    /// Cross product.
    pub fn cross(self, o: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * o.z - self.z * o.y,
            y: self.z * o.x - self.x * o.z,
            z: self.x * o.y - self.y * o.x,
        }
    }

    /// Component-wise scale by `1 / s`.
    pub fn inv_scale(self, s: f64) -> Vec3 {
        Vec3 {
            x: self.x / s,
            y: self.y / s,
            z: self.z / s,
        }
    }

    /// Additive inverse.
    pub fn neg(self) -> Vec3 {
        Vec3 {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Normalized copy, or an error for a zero-magnitude vector.
    pub fn normalized(self) -> Result<Vec3> {
        let n = self.dot(self).sqrt();
        if n == 0.0 {
            return Err(GeomError::ZeroVector);
        }
        Ok(self.inv_scale(n))
    }
}

/// A point on the unit sphere in degrees: longitude angle theta in
/// [0, 360) and latitude angle phi in [-90, 90].
///
/// The latitude bound is enforced at construction; longitude is kept
/// as given (range reduction happens where the semantics require it,
/// e.g. box membership tests).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalCoord {
    pub theta: f64,
    pub phi: f64,
}

impl SphericalCoord {
    /// Create a coordinate, rejecting out-of-range latitudes.
    pub fn new(theta: f64, phi: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&phi) {
            return Err(GeomError::LatitudeOutOfRange(phi));
        }
        Ok(SphericalCoord { theta, phi })
    }
}

/// Converts a cartesian 3-vector (not necessarily unit length) to
/// spherical coordinates in degrees.
pub fn spherical_coords(v: Vec3) -> SphericalCoord {
    let d2 = v.x * v.x + v.y * v.y;
    let theta = if d2 == 0.0 {
        0.0
    } else {
        let t = v.y.atan2(v.x).to_degrees();
        if t < 0.0 {
            t + 360.0
        } else {
            t
        }
    };
    let phi = if v.z == 0.0 {
        0.0
    } else {
        v.z.atan2(d2.sqrt()).to_degrees()
    };
    SphericalCoord { theta, phi }
}

/// Converts spherical coordinates in degrees to a cartesian unit vector.
pub fn unit_vector(p: SphericalCoord) -> Vec3 {
    let theta = p.theta.to_radians();
    let phi = p.phi.to_radians();
    let cos_phi = phi.cos();
    Vec3 {
        x: theta.cos() * cos_phi,
        y: theta.sin() * cos_phi,
        z: phi.sin(),
    }
}

/// Angular separation in degrees between two spherical points, using the
/// haversine formula (stable for small separations).
pub fn spherical_angular_sep(p1: SphericalCoord, p2: SphericalCoord) -> f64 {
    let sdt = ((p1.theta - p2.theta).to_radians() * 0.5).sin();
    let sdp = ((p1.phi - p2.phi).to_radians() * 0.5).sin();
    let cc = p1.phi.to_radians().cos() * p2.phi.to_radians().cos();
    let s = (sdp * sdp + cc * sdt * sdt).sqrt();
    if s > 1.0 {
        180.0
    } else {
        2.0 * s.asin().to_degrees()
    }
}

/// Angular separation in degrees between two cartesian unit vectors,
/// using atan2(|cross|, dot) (stable near both 0 and 180 degrees).
pub fn cartesian_angular_sep(v1: Vec3, v2: Vec3) -> f64 {
    let cs = v1.dot(v2);
    let n = v1.cross(v2);
    let ss = n.dot(n).sqrt();
    if cs == 0.0 && ss == 0.0 {
        return 0.0;
    }
    ss.atan2(cs).to_degrees()
}

/// Clamps a latitude angle to [-90, 90] degrees.
pub fn clamp_phi(phi: f64) -> f64 {
    if phi < -90.0 {
        -90.0
    } else if phi >= 90.0 {
        90.0
    } else {
        phi
    }
}

/// Range-reduces a longitude angle to [0, 360) degrees.
pub fn reduce_theta(theta: f64) -> f64 {
    let t = theta % 360.0;
    if t < 0.0 {
        t + 360.0
    } else {
        t
    }
}

/// Longitude angle alpha of the intersections `(alpha, phi)`,
/// `(-alpha, phi)` of the circle centered on `(0, center_phi)` with
/// radius `r` and the plane `z = sin(phi)`. `None` if there is no
/// intersection.
pub fn alpha(r: f64, center_phi: f64, phi: f64) -> Option<f64> {
    if phi < center_phi - r || phi > center_phi + r {
        return None;
    }
    let a = (center_phi - phi).abs();
    if a <= r - (90.0 - phi) || a <= r - (90.0 + phi) {
        return None;
    }
    let cp = center_phi.to_radians();
    let x = r.to_radians().cos() - cp.sin() * cp.sin();
    let u = cp.cos() * phi.to_radians().cos();
    let y = (u * u - x * x).abs().sqrt();
    Some(y.atan2(x).abs().to_degrees())
}

/// Half-extent in longitude angle of the small circle with radius `r`
/// centered at latitude `center_phi`, both in degrees. Clamped to 180
/// within POLE_EPSILON of a pole.
pub fn max_alpha(r: f64, center_phi: f64) -> f64 {
    if r == 0.0 {
        return 0.0;
    }
    let c = clamp_phi(center_phi);
    if c.abs() + r > 90.0 - POLE_EPSILON {
        return 180.0;
    }
    let r = r.to_radians();
    let c = c.to_radians();
    let y = r.sin();
    let x = ((c - r).cos() * (c + r).cos()).abs().sqrt();
    (y / x).atan().abs().to_degrees()
}

/// Tests whether `p` lies on the shortest great-circle arc from `v1` to
/// `v2` with plane normal `n`, assuming `p` is a unit vector on the plane
/// defined by the origin, `v1` and `v2`.
pub fn between(p: Vec3, n: Vec3, v1: Vec3, v2: Vec3) -> bool {
    let p1 = n.cross(v1);
    let p2 = n.cross(v2);
    p1.dot(p) >= 0.0 && p2.dot(p) <= 0.0
}

/// Minimum angular separation in degrees between `p` and points on the
/// great-circle edge with plane normal `n` and vertices `v1`, `v2`.
pub fn min_edge_sep(p: Vec3, n: Vec3, v1: Vec3, v2: Vec3) -> f64 {
    let p1 = n.cross(v1);
    let p2 = n.cross(v2);
    if p1.dot(p) >= 0.0 && p2.dot(p) <= 0.0 {
        (90.0 - cartesian_angular_sep(p, n)).abs()
    } else {
        cartesian_angular_sep(p, v1).min(cartesian_angular_sep(p, v2))
    }
}

/// Minimum angular separation in degrees between the spherical point `p`
/// and the small-circle edge at constant latitude `phi` spanning
/// `[min_theta, max_theta]`.
pub fn min_phi_edge_sep(p: SphericalCoord, phi: f64, min_theta: f64, max_theta: f64) -> f64 {
    let on_edge = if min_theta > max_theta {
        p.theta >= min_theta || p.theta <= max_theta
    } else {
        p.theta >= min_theta && p.theta <= max_theta
    };
    if on_edge {
        return (p.phi - phi).abs();
    }
    let s1 = spherical_angular_sep(
        p,
        SphericalCoord {
            theta: min_theta,
            phi,
        },
    );
    let s2 = spherical_angular_sep(
        p,
        SphericalCoord {
            theta: max_theta,
            phi,
        },
    );
    s1.min(s2)
}

/// Minimum angular separation in degrees between the unit vector `p` and
/// the great-circle edge at constant longitude `theta` spanning
/// `[min_phi, max_phi]`.
pub fn min_theta_edge_sep(p: Vec3, theta: f64, min_phi: f64, max_phi: f64) -> f64 {
    let v1 = unit_vector(SphericalCoord {
        theta,
        phi: min_phi,
    });
    let v2 = unit_vector(SphericalCoord {
        theta,
        phi: max_phi,
    });
    let n = v1.cross(v2);
    let d2 = n.dot(n);
    if d2 == 0.0 {
        return cartesian_angular_sep(p, v1).min(cartesian_angular_sep(p, v2));
    }
    min_edge_sep(p, n.inv_scale(d2.sqrt()), v1, v2)
}

/// Centroid (normalized vector sum) of a set of unit vectors.
///
/// Errors only if the vectors sum to zero.
pub fn centroid(vertices: &[Vec3]) -> Result<Vec3> {
    let mut sum = Vec3::new(0.0, 0.0, 0.0);
    for v in vertices {
        sum.x += v.x;
        sum.y += v.y;
        sum.z += v.z;
    }
    sum.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(theta: f64, phi: f64) -> SphericalCoord {
        SphericalCoord::new(theta, phi).unwrap()
    }

    #[test]
    fn spherical_roundtrip_within_angle_epsilon() {
        for &theta in &[0.0, 37.5, 90.0, 180.0, 271.25, 359.9] {
            for &phi in &[-89.0, -45.0, 0.0, 30.0, 89.0] {
                let p = coord(theta, phi);
                let q = spherical_coords(unit_vector(p));
                assert!(spherical_angular_sep(p, q) < ANGLE_EPSILON, "{theta} {phi}");
            }
        }
    }

    #[test]
    fn latitude_out_of_range_rejected() {
        assert!(matches!(
            SphericalCoord::new(0.0, 90.5),
            Err(GeomError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            SphericalCoord::new(0.0, -91.0),
            Err(GeomError::LatitudeOutOfRange(_))
        ));
    }

    #[test]
    fn angular_sep_agreement() {
        let p1 = coord(10.0, 20.0);
        let p2 = coord(80.0, -30.0);
        let s = spherical_angular_sep(p1, p2);
        let c = cartesian_angular_sep(unit_vector(p1), unit_vector(p2));
        assert!((s - c).abs() < ANGLE_EPSILON);
    }

    #[test]
    fn angular_sep_extremes() {
        let p = coord(123.0, 45.0);
        assert!(spherical_angular_sep(p, p) < ANGLE_EPSILON);
        let v = unit_vector(p);
        assert!((cartesian_angular_sep(v, v.neg()) - 180.0).abs() < ANGLE_EPSILON);
    }

    #[test]
    fn reduce_theta_range() {
        assert_eq!(reduce_theta(370.0), 10.0);
        assert_eq!(reduce_theta(-10.0), 350.0);
        assert_eq!(reduce_theta(360.0), 0.0);
        assert_eq!(reduce_theta(0.0), 0.0);
    }

    #[test]
    fn max_alpha_pole_clamp() {
        // circle touching a pole spans all longitudes
        assert_eq!(max_alpha(5.0, 88.0), 180.0);
        // equatorial circle: alpha slightly greater than radius
        let a = max_alpha(1.0, 0.0);
        assert!(a >= 1.0 && a < 1.01);
    }

    #[test]
    fn zero_vector_rejected() {
        assert!(matches!(
            Vec3::new(0.0, 0.0, 0.0).normalized(),
            Err(GeomError::ZeroVector)
        ));
    }

    #[test]
    fn centroid_of_symmetric_points() {
        let verts = [
            unit_vector(coord(0.0, 10.0)),
            unit_vector(coord(90.0, 10.0)),
            unit_vector(coord(180.0, 10.0)),
            unit_vector(coord(270.0, 10.0)),
        ];
        let c = centroid(&verts).unwrap();
        // symmetric about the pole
        assert!(c.x.abs() < 1e-15 && c.y.abs() < 1e-15);
        assert!(c.z > 0.0);
    }
}
