//! Gnomonic (TAN) astrometric transforms.
//!
//! Pixel coordinates are 1-based; the image interior spans
//! `(0.5, naxis + 0.5)` on each axis. Sky coordinates are FK5 J2000
//! longitude/latitude pairs in degrees.

use crate::error::{CoreError, Result};

/// Logical column names holding per-row WCS parameters.
#[derive(Debug, Clone)]
pub struct WcsColumns {
    pub ctype1: String,
    pub ctype2: String,
    pub naxis1: String,
    pub naxis2: String,
    pub crpix1: String,
    pub crpix2: String,
    pub crval1: String,
    pub crval2: String,
    pub scale: ScaleColumns,
}

/// The three supported scale parameterizations, by column name.
#[derive(Debug, Clone)]
pub enum ScaleColumns {
    Cd {
        cd1_1: String,
        cd1_2: String,
        cd2_1: String,
        cd2_2: String,
    },
    CdeltPc {
        cdelt1: String,
        cdelt2: String,
        pc1_1: String,
        pc1_2: String,
        pc2_1: String,
        pc2_2: String,
    },
    CdeltRot {
        cdelt1: String,
        cdelt2: String,
        crota2: Option<String>,
    },
}

impl WcsColumns {
    /// All column names needed to build a transform.
    pub fn names(&self) -> Vec<&str> {
        let mut v = vec![
            self.ctype1.as_str(),
            self.ctype2.as_str(),
            self.naxis1.as_str(),
            self.naxis2.as_str(),
            self.crpix1.as_str(),
            self.crpix2.as_str(),
            self.crval1.as_str(),
            self.crval2.as_str(),
        ];
        match &self.scale {
            ScaleColumns::Cd {
                cd1_1,
                cd1_2,
                cd2_1,
                cd2_2,
            } => v.extend([cd1_1.as_str(), cd1_2.as_str(), cd2_1.as_str(), cd2_2.as_str()]),
            ScaleColumns::CdeltPc {
                cdelt1,
                cdelt2,
                pc1_1,
                pc1_2,
                pc2_1,
                pc2_2,
            } => v.extend([
                cdelt1.as_str(),
                cdelt2.as_str(),
                pc1_1.as_str(),
                pc1_2.as_str(),
                pc2_1.as_str(),
                pc2_2.as_str(),
            ]),
            ScaleColumns::CdeltRot { cdelt1, cdelt2, crota2 } => {
                v.extend([cdelt1.as_str(), cdelt2.as_str()]);
                if let Some(c) = crota2 {
                    v.push(c.as_str());
                }
            }
        }
        v
    }
}

/// Resolved scale parameters for one row.
#[derive(Debug, Clone, Copy)]
pub enum Scale {
    Cd {
        cd1_1: f64,
        cd1_2: f64,
        cd2_1: f64,
        cd2_2: f64,
    },
    CdeltPc {
        cdelt1: f64,
        cdelt2: f64,
        pc1_1: f64,
        pc1_2: f64,
        pc2_1: f64,
        pc2_2: f64,
    },
    CdeltRot {
        cdelt1: f64,
        cdelt2: f64,
        crota2: f64,
    },
}

impl Scale {
    /// The 2x2 matrix mapping pixel offsets to intermediate world
    /// coordinates in degrees.
    fn matrix(self) -> [[f64; 2]; 2] {
        match self {
            Scale::Cd {
                cd1_1,
                cd1_2,
                cd2_1,
                cd2_2,
            } => [[cd1_1, cd1_2], [cd2_1, cd2_2]],
            Scale::CdeltPc {
                cdelt1,
                cdelt2,
                pc1_1,
                pc1_2,
                pc2_1,
                pc2_2,
            } => [
                [cdelt1 * pc1_1, cdelt1 * pc1_2],
                [cdelt2 * pc2_1, cdelt2 * pc2_2],
            ],
            Scale::CdeltRot {
                cdelt1,
                cdelt2,
                crota2,
            } => {
                let (s, c) = crota2.to_radians().sin_cos();
                [[cdelt1 * c, -cdelt2 * s], [cdelt1 * s, cdelt2 * c]]
            }
        }
    }
}

/// A gnomonic projection centered at (crval1, crval2) with a linear
/// pixel-to-intermediate transform.
#[derive(Debug, Clone)]
pub struct TanWcs {
    crval1: f64,
    crval2: f64,
    crpix1: f64,
    crpix2: f64,
    cd: [[f64; 2]; 2],
    inv: [[f64; 2]; 2],
    naxis1: f64,
    naxis2: f64,
}

impl TanWcs {
    pub fn new(crval: (f64, f64), crpix: (f64, f64), scale: Scale, naxis: (f64, f64)) -> Result<TanWcs> {
        let cd = scale.matrix();
        let det = cd[0][0] * cd[1][1] - cd[0][1] * cd[1][0];
        if det == 0.0 || !det.is_finite() {
            return Err(CoreError::SingularScale);
        }
        let inv = [
            [cd[1][1] / det, -cd[0][1] / det],
            [-cd[1][0] / det, cd[0][0] / det],
        ];
        Ok(TanWcs {
            crval1: crval.0,
            crval2: crval.1,
            crpix1: crpix.0,
            crpix2: crpix.1,
            cd,
            inv,
            naxis1: naxis.0,
            naxis2: naxis.1,
        })
    }

    pub fn naxis(&self) -> (f64, f64) {
        (self.naxis1, self.naxis2)
    }

    /// Projects a sky position to 1-based pixel coordinates. Fails when
    /// the position is on or behind the tangent plane horizon.
    pub fn sky_to_pixel(&self, theta: f64, phi: f64) -> Result<(f64, f64)> {
        let ra0 = self.crval1.to_radians();
        let dec0 = self.crval2.to_radians();
        let ra = theta.to_radians();
        let dec = phi.to_radians();
        let (sin_d, cos_d) = dec.sin_cos();
        let (sin_d0, cos_d0) = dec0.sin_cos();
        let (sin_dra, cos_dra) = (ra - ra0).sin_cos();
        let w = sin_d * sin_d0 + cos_d * cos_d0 * cos_dra;
        if w <= 0.0 {
            return Err(CoreError::OffScale(theta, phi));
        }
        let xi = (cos_d * sin_dra / w).to_degrees();
        let eta = ((sin_d * cos_d0 - cos_d * sin_d0 * cos_dra) / w).to_degrees();
        Ok((
            self.crpix1 + self.inv[0][0] * xi + self.inv[0][1] * eta,
            self.crpix2 + self.inv[1][0] * xi + self.inv[1][1] * eta,
        ))
    }

    /// Deprojects 1-based pixel coordinates to a sky position with
    /// longitude reduced to [0, 360).
    pub fn pixel_to_sky(&self, x: f64, y: f64) -> (f64, f64) {
        let dx = x - self.crpix1;
        let dy = y - self.crpix2;
        let xi = (self.cd[0][0] * dx + self.cd[0][1] * dy).to_radians();
        let eta = (self.cd[1][0] * dx + self.cd[1][1] * dy).to_radians();
        let dec0 = self.crval2.to_radians();
        let (sin_d0, cos_d0) = dec0.sin_cos();
        let denom = cos_d0 - eta * sin_d0;
        let dra = xi.atan2(denom);
        let mut theta = self.crval1 + dra.to_degrees();
        let phi = (sin_d0 + eta * cos_d0)
            .atan2((xi * xi + denom * denom).sqrt())
            .to_degrees();
        theta -= 360.0 * (theta / 360.0).floor();
        if theta == 360.0 {
            theta = 0.0;
        }
        (theta, phi)
    }

    /// Sky positions of the four image corners, counter-clockwise in
    /// pixel space starting at the lower-left corner.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            self.pixel_to_sky(0.5, 0.5),
            self.pixel_to_sky(self.naxis1 + 0.5, 0.5),
            self.pixel_to_sky(self.naxis1 + 0.5, self.naxis2 + 0.5),
            self.pixel_to_sky(0.5, self.naxis2 + 0.5),
        ]
    }

    /// Sky position of the image center.
    pub fn center_sky(&self) -> (f64, f64) {
        self.pixel_to_sky(self.naxis1 * 0.5 + 0.5, self.naxis2 * 0.5 + 0.5)
    }

    /// True if the pixel position lies strictly inside the image.
    pub fn interior(&self, x: f64, y: f64) -> bool {
        x > 0.5 && y > 0.5 && x < self.naxis1 + 0.5 && y < self.naxis2 + 0.5
    }

    /// Minimum pixel distance from the position to an image edge, or
    /// `None` when the position falls outside the image.
    pub fn edge_distance(&self, x: f64, y: f64) -> Option<f64> {
        if !self.interior(x, y) {
            return None;
        }
        let xmax = self.naxis1 + 0.5;
        let ymax = self.naxis2 + 0.5;
        Some((x - 0.5).min(y - 0.5).min(xmax - x).min(ymax - y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_wcs() -> TanWcs {
        // 1 arcsec/pixel, north up, centered at (180, 30)
        TanWcs::new(
            (180.0, 30.0),
            (50.5, 100.5),
            Scale::CdeltRot {
                cdelt1: -1.0 / 3600.0,
                cdelt2: 1.0 / 3600.0,
                crota2: 0.0,
            },
            (100.0, 200.0),
        )
        .unwrap()
    }

    #[test]
    fn reference_pixel_maps_to_reference_value() {
        let w = simple_wcs();
        let (t, p) = w.pixel_to_sky(50.5, 100.5);
        assert!((t - 180.0).abs() < 1e-12);
        assert!((p - 30.0).abs() < 1e-12);
        let (x, y) = w.sky_to_pixel(180.0, 30.0).unwrap();
        assert!((x - 50.5).abs() < 1e-9 && (y - 100.5).abs() < 1e-9);
    }

    #[test]
    fn round_trip_inside_image() {
        let w = simple_wcs();
        for &(px, py) in &[(1.0, 1.0), (25.0, 180.0), (99.9, 0.6), (60.0, 140.0)] {
            let (t, p) = w.pixel_to_sky(px, py);
            let (x, y) = w.sky_to_pixel(t, p).unwrap();
            assert!((x - px).abs() < 1e-8, "x {x} vs {px}");
            assert!((y - py).abs() < 1e-8, "y {y} vs {py}");
        }
    }

    #[test]
    fn antipode_is_off_scale() {
        let w = simple_wcs();
        assert!(matches!(
            w.sky_to_pixel(0.0, -30.0),
            Err(CoreError::OffScale(_, _))
        ));
    }

    #[test]
    fn singular_matrix_rejected() {
        let r = TanWcs::new(
            (0.0, 0.0),
            (1.0, 1.0),
            Scale::Cd {
                cd1_1: 1.0,
                cd1_2: 2.0,
                cd2_1: 2.0,
                cd2_2: 4.0,
            },
            (10.0, 10.0),
        );
        assert!(matches!(r, Err(CoreError::SingularScale)));
    }

    #[test]
    fn cd_and_crota_forms_agree() {
        let rot = 30.0_f64;
        let (s, c) = rot.to_radians().sin_cos();
        let cdelt = (-2.0e-4, 2.0e-4);
        let a = TanWcs::new(
            (10.0, -5.0),
            (5.0, 5.0),
            Scale::CdeltRot {
                cdelt1: cdelt.0,
                cdelt2: cdelt.1,
                crota2: rot,
            },
            (10.0, 10.0),
        )
        .unwrap();
        let b = TanWcs::new(
            (10.0, -5.0),
            (5.0, 5.0),
            Scale::Cd {
                cd1_1: cdelt.0 * c,
                cd1_2: -cdelt.1 * s,
                cd2_1: cdelt.0 * s,
                cd2_2: cdelt.1 * c,
            },
            (10.0, 10.0),
        )
        .unwrap();
        let (ta, pa) = a.pixel_to_sky(2.0, 8.0);
        let (tb, pb) = b.pixel_to_sky(2.0, 8.0);
        assert!((ta - tb).abs() < 1e-12 && (pa - pb).abs() < 1e-12);
    }

    #[test]
    fn edge_distance_and_interior() {
        let w = simple_wcs();
        assert!(w.interior(50.0, 100.0));
        assert!(!w.interior(0.5, 100.0));
        assert!(!w.interior(50.0, 200.5));
        assert_eq!(w.edge_distance(0.4, 5.0), None);
        let d = w.edge_distance(3.0, 100.0).unwrap();
        assert!((d - 2.5).abs() < 1e-12);
    }

    #[test]
    fn wraps_longitude_to_domain() {
        let w = TanWcs::new(
            (0.1, 0.0),
            (5.0, 5.0),
            Scale::CdeltRot {
                cdelt1: -0.1,
                cdelt2: 0.1,
                crota2: 0.0,
            },
            (10.0, 10.0),
        )
        .unwrap();
        let (t, _) = w.pixel_to_sky(9.0, 5.0);
        assert!((0.0..360.0).contains(&t));
        assert!(t > 350.0, "t {t}");
    }
}
