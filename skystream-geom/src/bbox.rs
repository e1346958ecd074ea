//! Spherical coordinate-space bounding boxes.

use crate::error::{GeomError, Result};
use crate::vector::{
    between, reduce_theta, spherical_coords, SphericalCoord, Vec3, SIN_MIN,
};

/// A spherical coordinate-space bounding box.
///
/// Similar to a cartesian bounding box in that it is specified by a pair
/// of points, but a spherical box may correspond to the entire unit
/// sphere, a spherical cap, a lune or the traditional rectangle. Boxes
/// can span the 0/360 degree longitude angle discontinuity ("wrap"):
/// a box with min/max longitudes of 350/10 deg covers [350, 360) and
/// [0, 10].
///
/// Points falling exactly on box edges are inside the box. The canonical
/// empty box is (0, 90)-(0, -90); the full box is (0, -90)-(360, 90).
#[derive(Debug, Clone)]
pub struct SphericalBox {
    min: SphericalCoord,
    max: SphericalCoord,
}

impl SphericalBox {
    /// Creates a box from minimum and maximum coordinates.
    ///
    /// The minimum latitude must not exceed the maximum. If both
    /// longitudes lie in [0, 360], the maximum may be less than the
    /// minimum (the box wraps). Otherwise the minimum must not exceed
    /// the maximum; ranges spanning 360 degrees or more become the full
    /// longitude range, and everything else is range-reduced.
    pub fn new(min: SphericalCoord, max: SphericalCoord) -> Result<Self> {
        if min.phi > max.phi {
            return Err(GeomError::BoxLatitudeOrder {
                min: min.phi,
                max: max.phi,
            });
        }
        if max.theta < min.theta && (max.theta < 0.0 || min.theta > 360.0) {
            return Err(GeomError::BoxLongitudeOrder {
                min: min.theta,
                max: max.theta,
            });
        }
        let (min, max) = if max.theta - min.theta >= 360.0 {
            (
                SphericalCoord {
                    theta: 0.0,
                    phi: min.phi,
                },
                SphericalCoord {
                    theta: 360.0,
                    phi: max.phi,
                },
            )
        } else {
            (
                SphericalCoord {
                    theta: reduce_theta(min.theta),
                    phi: min.phi,
                },
                SphericalCoord {
                    theta: reduce_theta(max.theta),
                    phi: max.phi,
                },
            )
        };
        Ok(SphericalBox { min, max })
    }

    /// The canonical empty box.
    pub fn empty() -> Self {
        SphericalBox {
            min: SphericalCoord {
                theta: 0.0,
                phi: 90.0,
            },
            max: SphericalCoord {
                theta: 0.0,
                phi: -90.0,
            },
        }
    }

    /// The box covering the entire unit sphere.
    pub fn full() -> Self {
        SphericalBox {
            min: SphericalCoord {
                theta: 0.0,
                phi: -90.0,
            },
            max: SphericalCoord {
                theta: 360.0,
                phi: 90.0,
            },
        }
    }

    pub fn min(&self) -> SphericalCoord {
        self.min
    }

    pub fn max(&self) -> SphericalCoord {
        self.max
    }

    /// True if this box spans the 0/360 longitude discontinuity.
    pub fn wraps(&self) -> bool {
        self.min.theta > self.max.theta
    }

    pub fn is_empty(&self) -> bool {
        self.min.phi > self.max.phi
    }

    pub fn is_full(&self) -> bool {
        self.min.theta == 0.0
            && self.min.phi == -90.0
            && self.max.theta == 360.0
            && self.max.phi == 90.0
    }

    /// Extent in longitude angle of this box.
    pub fn theta_extent(&self) -> f64 {
        if self.wraps() {
            360.0 - self.min.theta + self.max.theta
        } else {
            self.max.theta - self.min.theta
        }
    }

    /// Longitude/latitude angles of the center of this box.
    pub fn center(&self) -> SphericalCoord {
        let mut theta = 0.5 * (self.min.theta + self.max.theta);
        let phi = 0.5 * (self.min.phi + self.max.phi);
        if self.wraps() {
            if theta >= 180.0 {
                theta -= 180.0;
            } else {
                theta += 180.0;
            }
        }
        SphericalCoord { theta, phi }
    }

    /// True if this box contains the given point.
    pub fn contains_point(&self, p: SphericalCoord) -> bool {
        if p.phi < self.min.phi || p.phi > self.max.phi {
            return false;
        }
        let theta = reduce_theta(p.theta);
        if self.wraps() {
            theta >= self.min.theta || theta <= self.max.theta
        } else {
            theta >= self.min.theta && theta <= self.max.theta
        }
    }

    /// True if this box completely contains the other box.
    pub fn contains_box(&self, b: &SphericalBox) -> bool {
        if self.is_empty() || b.is_empty() {
            return false;
        }
        if b.min.phi < self.min.phi || b.max.phi > self.max.phi {
            return false;
        }
        if self.wraps() {
            if b.wraps() {
                b.min.theta >= self.min.theta && b.max.theta <= self.max.theta
            } else {
                b.min.theta >= self.min.theta || b.max.theta <= self.max.theta
            }
        } else if b.wraps() {
            self.min.theta == 0.0 && self.max.theta == 360.0
        } else {
            b.min.theta >= self.min.theta && b.max.theta <= self.max.theta
        }
    }

    /// True if this box intersects the other box.
    pub fn intersects_box(&self, b: &SphericalBox) -> bool {
        if self.is_empty() || b.is_empty() {
            return false;
        }
        if b.min.phi > self.max.phi || b.max.phi < self.min.phi {
            return false;
        }
        if self.wraps() {
            if b.wraps() {
                true
            } else {
                b.min.theta <= self.max.theta || b.max.theta >= self.min.theta
            }
        } else if b.wraps() {
            self.min.theta <= b.max.theta || self.max.theta >= b.min.theta
        } else {
            self.min.theta <= b.max.theta && self.max.theta >= b.min.theta
        }
    }

    /// Extends this box to the smallest box containing the union of this
    /// box and the given point. When the point can be reached by growing
    /// either longitude bound, the side producing the smaller resulting
    /// range wins.
    pub fn extend_point(&mut self, p: SphericalCoord) {
        let theta = reduce_theta(p.theta);
        let phi = p.phi;
        if self.contains_point(p) {
            return;
        }
        if self.is_empty() {
            self.min = SphericalCoord { theta, phi };
            self.max = SphericalCoord { theta, phi };
            return;
        }
        let min_phi = self.min.phi.min(phi);
        let max_phi = self.max.phi.max(phi);
        let mut min_theta = self.min.theta;
        let mut max_theta = self.max.theta;
        if self.wraps() {
            if self.min.theta - theta > theta - self.max.theta {
                max_theta = theta;
            } else {
                min_theta = theta;
            }
        } else if theta < self.min.theta {
            if self.min.theta - theta <= 360.0 - self.max.theta + theta {
                min_theta = theta;
            } else {
                max_theta = theta;
            }
        } else if theta - self.max.theta <= 360.0 - theta + self.min.theta {
            max_theta = theta;
        } else {
            min_theta = theta;
        }
        self.min = SphericalCoord {
            theta: min_theta,
            phi: min_phi,
        };
        self.max = SphericalCoord {
            theta: max_theta,
            phi: max_phi,
        };
    }

    /// Extends this box to the smallest box containing the union of this
    /// box and `b`. Ambiguous longitude growth is broken toward the
    /// smaller resulting range.
    pub fn extend_box(&mut self, b: &SphericalBox) {
        if b.is_empty() {
            return;
        }
        if self.is_empty() {
            self.min = b.min;
            self.max = b.max;
        }
        let min_phi = self.min.phi.min(b.min.phi);
        let max_phi = self.max.phi.max(b.max.phi);
        let mut min_theta = self.min.theta;
        let mut max_theta = self.max.theta;
        if self.wraps() {
            if b.wraps() {
                let min_min = self.min.theta.min(b.min.theta);
                let max_max = self.max.theta.max(b.max.theta);
                if max_max >= min_min {
                    min_theta = 0.0;
                    max_theta = 360.0;
                } else {
                    min_theta = min_min;
                    max_theta = max_max;
                }
            } else if b.min.theta <= self.max.theta && b.max.theta >= self.min.theta {
                min_theta = 0.0;
                max_theta = 360.0;
            } else if b.min.theta - self.max.theta > self.min.theta - b.max.theta {
                min_theta = b.min.theta;
            } else {
                max_theta = b.max.theta;
            }
        } else if b.wraps() {
            if self.min.theta <= b.max.theta && self.max.theta >= b.min.theta {
                min_theta = 0.0;
                max_theta = 360.0;
            } else if self.min.theta - b.max.theta > b.min.theta - self.max.theta {
                max_theta = b.max.theta;
            } else {
                min_theta = b.min.theta;
            }
        } else if b.min.theta > self.max.theta {
            if 360.0 - b.min.theta + self.max.theta < b.max.theta - self.min.theta {
                min_theta = b.min.theta;
            } else {
                max_theta = b.max.theta;
            }
        } else if self.min.theta > b.max.theta {
            if 360.0 - self.min.theta + b.max.theta < self.max.theta - b.min.theta {
                max_theta = b.max.theta;
            } else {
                min_theta = b.min.theta;
            }
        } else {
            min_theta = self.min.theta.min(b.min.theta);
            max_theta = self.max.theta.max(b.max.theta);
        }
        self.min = SphericalCoord {
            theta: min_theta,
            phi: min_phi,
        };
        self.max = SphericalCoord {
            theta: max_theta,
            phi: max_phi,
        };
    }

    /// Shrinks this box to the smallest box containing its intersection
    /// with `b`. Ambiguous results are broken toward the smaller range.
    pub fn shrink(&mut self, b: &SphericalBox) {
        if self.is_empty() {
            return;
        }
        if b.is_empty() {
            *self = SphericalBox::empty();
            return;
        }
        let mut min_phi = self.min.phi.max(b.min.phi);
        let mut max_phi = self.max.phi.min(b.max.phi);
        let mut min_theta = self.min.theta;
        let mut max_theta = self.max.theta;
        if self.wraps() {
            if b.wraps() {
                min_theta = min_theta.max(b.min.theta);
                max_theta = max_theta.min(b.max.theta);
            } else if b.max.theta >= min_theta {
                if b.min.theta <= max_theta {
                    if b.max.theta - b.min.theta <= 360.0 - min_theta + max_theta {
                        min_theta = b.min.theta;
                        max_theta = b.max.theta;
                    }
                } else {
                    min_theta = min_theta.max(b.min.theta);
                    max_theta = b.max.theta;
                }
            } else if b.min.theta <= max_theta {
                min_theta = b.min.theta;
                max_theta = max_theta.min(b.max.theta);
            } else {
                min_phi = 90.0;
                max_phi = -90.0;
            }
        } else if b.wraps() {
            if max_theta >= b.min.theta {
                if min_theta <= b.max.theta {
                    if max_theta - min_theta > 360.0 - b.min.theta + b.max.theta {
                        min_theta = b.min.theta;
                        max_theta = b.max.theta;
                    }
                } else {
                    min_theta = min_theta.max(b.min.theta);
                }
            } else if min_theta <= b.max.theta {
                max_theta = b.max.theta;
            } else {
                min_phi = 90.0;
                max_phi = -90.0;
            }
        } else if min_theta > b.max.theta || max_theta < b.min.theta {
            min_phi = 90.0;
            max_phi = -90.0;
        } else {
            min_theta = min_theta.max(b.min.theta);
            max_theta = max_theta.min(b.max.theta);
        }
        self.min = SphericalCoord {
            theta: min_theta,
            phi: min_phi,
        };
        self.max = SphericalCoord {
            theta: max_theta,
            phi: max_phi,
        };
    }

    /// Bounding box for the great-circle edge connecting `v1` to `v2`
    /// with plane normal `n`. All arguments must be unit vectors.
    pub fn edge(v1: Vec3, v2: Vec3, n: Vec3) -> Result<SphericalBox> {
        let p1 = spherical_coords(v1);
        let p2 = spherical_coords(v2);
        let mut min_phi = p1.phi.min(p2.phi);
        let mut max_phi = p1.phi.max(p2.phi);
        // Latitude range: check the two antipodal latitude extrema of
        // the great circle for membership in the edge.
        let d = n.x * n.x + n.y * n.y;
        if d.abs() > f64::MIN_POSITIVE {
            let ex = if n.z.abs() <= SIN_MIN {
                Vec3::new(0.0, 0.0, -1.0)
            } else {
                Vec3::new(n.x * n.z / d, n.y * n.z / d, -d)
            };
            if between(ex, n, v1, v2) {
                min_phi = min_phi.min(spherical_coords(ex).phi);
            }
            let ex = ex.neg();
            if between(ex, n, v1, v2) {
                max_phi = max_phi.max(spherical_coords(ex).phi);
            }
        }
        // Longitude range
        let (min_theta, max_theta);
        if n.z.abs() <= SIN_MIN {
            // great circle passes very close to a pole
            let d = (p1.theta - p2.theta)
                .abs()
                .min((360.0 - p1.theta + p2.theta).abs());
            if (90.0..=270.0).contains(&d) {
                // edge crosses over a pole
                min_theta = 0.0;
                max_theta = 360.0;
            } else {
                // theta1 and theta2 are nearly identical
                let lo = p1.theta.min(p2.theta);
                let hi = p1.theta.max(p2.theta);
                if hi - lo > 180.0 {
                    // endpoints straddle the 0/360 discontinuity
                    min_theta = hi;
                    max_theta = lo;
                } else {
                    min_theta = lo;
                    max_theta = hi;
                }
            }
        } else if n.z > 0.0 {
            min_theta = p1.theta;
            max_theta = p2.theta;
        } else {
            min_theta = p2.theta;
            max_theta = p1.theta;
        }
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
    }
}

impl PartialEq for SphericalBox {
    fn eq(&self, other: &Self) -> bool {
        if self.is_empty() && other.is_empty() {
            return true;
        }
        self.min == other.min && self.max == other.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(theta: f64, phi: f64) -> SphericalCoord {
        SphericalCoord::new(theta, phi).unwrap()
    }

    fn mkbox(t0: f64, p0: f64, t1: f64, p1: f64) -> SphericalBox {
        SphericalBox::new(coord(t0, p0), coord(t1, p1)).unwrap()
    }

    #[test]
    fn wrapping_box_membership() {
        let b = mkbox(350.0, -10.0, 10.0, 10.0);
        assert!(b.wraps());
        assert!(b.contains_point(coord(355.0, 0.0)));
        assert!(b.contains_point(coord(5.0, 0.0)));
        assert!(!b.contains_point(coord(180.0, 0.0)));
    }

    #[test]
    fn longitude_range_reduction() {
        // 350..370 covers the same longitudes as 350..10
        let b = mkbox(350.0, -10.0, 370.0, 10.0);
        assert!(b.wraps());
        assert!(b.contains_point(coord(5.0, 0.0)));
        // a span of 360 or more is the full longitude range
        let b = mkbox(-20.0, -10.0, 340.0, 10.0);
        assert_eq!(b.min().theta, 0.0);
        assert_eq!(b.max().theta, 360.0);
    }

    #[test]
    fn empty_and_full() {
        let e = SphericalBox::empty();
        assert!(e.is_empty());
        assert!(!e.contains_point(coord(0.0, 0.0)));
        let f = SphericalBox::full();
        assert!(f.is_full());
        assert!(f.contains_point(coord(123.0, -45.0)));
    }

    #[test]
    fn latitude_order_enforced() {
        assert!(matches!(
            SphericalBox::new(coord(0.0, 10.0), coord(0.0, -10.0)),
            Err(GeomError::BoxLatitudeOrder { .. })
        ));
    }

    #[test]
    fn box_box_containment_and_intersection() {
        let outer = mkbox(10.0, -20.0, 60.0, 20.0);
        let inner = mkbox(20.0, -10.0, 50.0, 10.0);
        assert!(outer.contains_box(&inner));
        assert!(!inner.contains_box(&outer));
        assert!(outer.intersects_box(&inner));

        let wrap = mkbox(350.0, -10.0, 10.0, 10.0);
        let east = mkbox(5.0, -5.0, 20.0, 5.0);
        assert!(wrap.intersects_box(&east));
        assert!(!wrap.contains_box(&east));
        let tucked = mkbox(355.0, -5.0, 5.0, 5.0);
        assert!(wrap.contains_box(&tucked));
    }

    #[test]
    fn extend_point_takes_smaller_range() {
        let mut b = mkbox(10.0, 0.0, 20.0, 10.0);
        // 350 deg is closer going west across 0/360 than east
        b.extend_point(coord(350.0, 5.0));
        assert!(b.wraps());
        assert_eq!(b.min().theta, 350.0);
        assert_eq!(b.max().theta, 20.0);
    }

    #[test]
    fn extend_into_empty() {
        let mut b = SphericalBox::empty();
        b.extend_point(coord(42.0, 7.0));
        assert!(b.contains_point(coord(42.0, 7.0)));
        assert_eq!(b.theta_extent(), 0.0);
    }

    #[test]
    fn shrink_disjoint_is_empty() {
        let mut b = mkbox(10.0, -10.0, 20.0, 10.0);
        b.shrink(&mkbox(200.0, -10.0, 210.0, 10.0));
        assert!(b.is_empty());
    }

    #[test]
    fn shrink_overlap() {
        let mut b = mkbox(10.0, -10.0, 30.0, 10.0);
        b.shrink(&mkbox(20.0, -5.0, 40.0, 20.0));
        assert_eq!(b.min().theta, 20.0);
        assert_eq!(b.max().theta, 30.0);
        assert_eq!(b.min().phi, -5.0);
        assert_eq!(b.max().phi, 10.0);
    }

    #[test]
    fn wrapping_center() {
        let b = mkbox(350.0, -10.0, 10.0, 10.0);
        let c = b.center();
        assert!((c.theta - 0.0).abs() < 1e-12 || (c.theta - 360.0).abs() < 1e-12);
        assert_eq!(c.phi, 0.0);
    }
}
