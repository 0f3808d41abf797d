//! SVG path generation
//!
//! Projects feature rings and serializes them as SVG path data. Each ring becomes a
//! `M x,yLx,y...Z` subpath. Points without a finite projection split the ring into
//! open subpaths.

use crate::FeatureGeometry;
use crate::projection::Projection;
use geo::{Coord, LineString};
use std::fmt::Write;

/// Turns decoded feature geometry into path data
pub trait PathGenerator {
    /// Path data for the geometry, or `None` if nothing is drawable
    fn path(&self, geometry: &FeatureGeometry) -> Option<String>;
}

/// More decimal digits than an `f64` can carry; larger precisions are clamped
pub const MAX_PRECISION: u32 = 15;

/// Path generator emitting SVG path data through a projection
#[derive(Clone, Debug)]
pub struct SvgPathGenerator<P> {
    projection: P,
    /// Decimal digits kept in the output (`None` = shortest exact representation)
    precision: Option<u32>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<P: Projection> SvgPathGenerator<P> {
    pub fn new(projection: P) -> Self {
        Self {
            projection,
            precision: None,
        }
    }

    /// Round coordinates to `digits` decimal places
    pub fn with_precision(mut self, digits: Option<u32>) -> Self {
        self.precision = digits;
        self
    }

    #[inline]
    pub fn projection(&self) -> &P {
        &self.projection
    }

    /// Project a single longitude/latitude position
    #[inline]
    pub fn project_point(&self, lon_lat: Coord<f64>) -> Option<Coord<f64>> {
        self.projection.project(lon_lat)
    }

    /// Append the subpaths of one ring to `out`
    ///
    /// Returns the number of subpaths written. Runs of fewer than two projected
    /// points are dropped; only a ring projected without gaps is closed with `Z`.
    pub fn write_ring(&self, ring: &LineString<f64>, out: &mut String) -> usize {
        let mut runs: Vec<Vec<Coord<f64>>> = vec![Vec::new()];
        for &point in ring.coords() {
            match self.projection.project(point) {
                Some(projected) => {
                    if let Some(run) = runs.last_mut() {
                        run.push(projected);
                    }
                }
                None => {
                    if runs.last().is_some_and(|run| !run.is_empty()) {
                        runs.push(Vec::new());
                    }
                }
            }
        }

        let closed = runs.len() == 1;
        let mut written = 0;
        for run in runs.iter().filter(|run| run.len() >= 2) {
            for (i, point) in run.iter().enumerate() {
                out.push(if i == 0 { 'M' } else { 'L' });
                self.write_number(out, point.x);
                out.push(',');
                self.write_number(out, point.y);
            }
            if closed {
                out.push('Z');
            }
            written += 1;
        }
        written
    }

    fn write_number(&self, out: &mut String, value: f64) {
        let value = match self.precision {
            Some(digits) => {
                let factor = 10f64.powi(digits.min(MAX_PRECISION) as i32);
                let rounded = (value * factor).round() / factor;
                if rounded.is_finite() { rounded } else { value }
            }
            None => value,
        };
        // Avoid "-0" in the output
        let value = if value == 0.0 { 0.0 } else { value };
        let _ = write!(out, "{value}");
    }
}

impl<P: Projection> PathGenerator for SvgPathGenerator<P> {
    fn path(&self, geometry: &FeatureGeometry) -> Option<String> {
        let mut out = String::new();
        let mut written = 0;
        for ring in geometry.rings() {
            written += self.write_ring(ring, &mut out);
        }
        (written > 0).then_some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{Equirectangular, ProjectionParams};

    /// Maps degrees straight to pixels without flipping the y axis
    struct Identity;

    impl Projection for Identity {
        fn project(&self, lon_lat: Coord<f64>) -> Option<Coord<f64>> {
            Some(lon_lat)
        }
    }

    /// Fails for any point east of 100 degrees
    struct WestOnly;

    impl Projection for WestOnly {
        fn project(&self, lon_lat: Coord<f64>) -> Option<Coord<f64>> {
            (lon_lat.x <= 100.0).then_some(lon_lat)
        }
    }

    fn square(offset: f64, size: f64) -> LineString<f64> {
        vec![
            (offset, offset),
            (offset, offset + size),
            (offset + size, offset + size),
            (offset + size, offset),
            (offset, offset),
        ]
        .into()
    }

    #[test]
    fn test_polygon_path() {
        let generator = SvgPathGenerator::new(Identity);
        let geometry = FeatureGeometry::Polygon {
            rings: vec![square(0.0, 10.0)],
        };
        assert_eq!(
            generator.path(&geometry).unwrap(),
            "M0,0L0,10L10,10L10,0L0,0Z"
        );
    }

    #[test]
    fn test_holes_and_multipolygons() {
        let generator = SvgPathGenerator::new(Identity);
        let geometry = FeatureGeometry::MultiPolygon {
            polygons: vec![
                vec![square(0.0, 4.0), square(1.0, 2.0)],
                vec![square(10.0, 1.0)],
            ],
        };
        let path = generator.path(&geometry).unwrap();
        assert_eq!(path.matches('M').count(), 3);
        assert_eq!(path.matches('Z').count(), 3);
        assert!(path.starts_with("M0,0L0,4"));
        assert!(path.contains("ZM1,1L1,3"));
    }

    #[test]
    fn test_precision() {
        let generator = SvgPathGenerator::new(Identity).with_precision(Some(1));
        let ring: LineString<f64> = vec![(0.123, -0.04), (1.25, 2.0), (0.123, -0.04)].into();
        let mut out = String::new();
        assert_eq!(generator.write_ring(&ring, &mut out), 1);
        assert_eq!(out, "M0.1,0L1.3,2L0.1,0Z");
    }

    #[test]
    fn test_huge_precision_is_clamped() {
        let ring: LineString<f64> = vec![(0.5, -2.25), (1.0e300, 3.0), (0.5, -2.25)].into();
        for digits in [MAX_PRECISION, 400, u32::MAX] {
            let generator = SvgPathGenerator::new(Identity).with_precision(Some(digits));
            let mut out = String::new();
            assert_eq!(generator.write_ring(&ring, &mut out), 1);
            assert!(!out.contains("NaN"));
            assert!(!out.contains("inf"));
            assert!(out.starts_with("M0.5,-2.25L"));
        }
    }

    #[test]
    fn test_unprojectable_points_split_ring() {
        let generator = SvgPathGenerator::new(WestOnly);
        let ring: LineString<f64> = vec![
            (0.0, 0.0),
            (50.0, 0.0),
            (150.0, 0.0),
            (60.0, 10.0),
            (0.0, 10.0),
            (0.0, 0.0),
        ]
        .into();
        let mut out = String::new();
        assert_eq!(generator.write_ring(&ring, &mut out), 2);
        assert_eq!(out, "M0,0L50,0M60,10L0,10L0,0");
    }

    #[test]
    fn test_nothing_drawable() {
        let generator = SvgPathGenerator::new(WestOnly);
        let geometry = FeatureGeometry::Polygon {
            rings: vec![square(120.0, 5.0)],
        };
        assert_eq!(generator.path(&geometry), None);
    }

    #[test]
    fn test_with_real_projection() {
        let projection = Equirectangular::new(ProjectionParams {
            scale: 1.0,
            translate: [0.0, 0.0],
            ..ProjectionParams::default()
        });
        let generator = SvgPathGenerator::new(&projection).with_precision(Some(3));
        let p = generator.project_point(Coord { x: 180.0, y: 90.0 }).unwrap();
        assert!((p.x - std::f64::consts::PI).abs() < 1e-12);
        assert!((p.y + std::f64::consts::FRAC_PI_2).abs() < 1e-12);

        let geometry = FeatureGeometry::Polygon {
            rings: vec![vec![(0.0, 0.0), (180.0, 0.0), (0.0, 0.0)].into()],
        };
        assert_eq!(generator.path(&geometry).unwrap(), "M0,0L3.142,0L0,0Z");
    }
}
