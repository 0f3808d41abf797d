//! Cartographic projections
//!
//! Projections map longitude/latitude in degrees to screen coordinates (pixels, y
//! growing downward). Each projection is a raw formula in radians combined with a
//! scale, a translation, a projection center and a longitude rotation:
//!
//! ```text
//! x = tx + k * (px - cx)
//! y = ty - k * (py - cy)
//! ```
//!
//! where `(px, py)` is the raw projection of the rotated point and `(cx, cy)` the raw
//! projection of the center.

use geo::Coord;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, PI};

/// Maximum latitude that can be represented in Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Standard parallels of the conterminous-U.S. Albers projection
pub const USA_PARALLELS: [f64; 2] = [29.5, 45.5];

/// Longitude rotation of the conterminous-U.S. Albers projection
pub const USA_ROTATE: f64 = 96.0;

/// Center of the conterminous-U.S. Albers projection
pub const USA_CENTER: [f64; 2] = [-0.6, 38.7];

/// Maps longitude/latitude to screen coordinates
pub trait Projection: Send + Sync {
    /// Project a `(lon, lat)` position in degrees; `None` if it has no finite image
    fn project(&self, lon_lat: Coord<f64>) -> Option<Coord<f64>>;
}

impl<P: Projection + ?Sized> Projection for &P {
    #[inline]
    fn project(&self, lon_lat: Coord<f64>) -> Option<Coord<f64>> {
        (**self).project(lon_lat)
    }
}

impl<P: Projection + ?Sized> Projection for Box<P> {
    #[inline]
    fn project(&self, lon_lat: Coord<f64>) -> Option<Coord<f64>> {
        (**self).project(lon_lat)
    }
}

/// Scale, translation, center and rotation shared by all projections
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionParams {
    /// Pixels per radian
    pub scale: f64,
    /// Screen position of the projection center
    pub translate: [f64; 2],
    /// `(lon, lat)` in degrees mapped to `translate`
    pub center: [f64; 2],
    /// Longitude rotation in degrees, added to every longitude before projecting
    pub rotate: f64,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            scale: 150.0,
            translate: [480.0, 250.0],
            center: [0.0, 0.0],
            rotate: 0.0,
        }
    }
}

impl ProjectionParams {
    fn apply(
        &self,
        raw: impl Fn(f64, f64) -> (f64, f64),
        lon_lat: Coord<f64>,
    ) -> Option<Coord<f64>> {
        let lambda = wrap_longitude(lon_lat.x + self.rotate).to_radians();
        let phi = lon_lat.y.to_radians();
        let (px, py) = raw(lambda, phi);
        let (cx, cy) = raw(self.center[0].to_radians(), self.center[1].to_radians());

        let x = self.translate[0] + self.scale * (px - cx);
        let y = self.translate[1] - self.scale * (py - cy);
        (x.is_finite() && y.is_finite()).then_some(Coord { x, y })
    }
}

/// Wrap a longitude into [-180, 180]
#[inline]
fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// Plate carrée: longitude and latitude used directly as planar coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Equirectangular {
    pub params: ProjectionParams,
}

impl Equirectangular {
    pub fn new(params: ProjectionParams) -> Self {
        Self { params }
    }
}

impl Projection for Equirectangular {
    fn project(&self, lon_lat: Coord<f64>) -> Option<Coord<f64>> {
        self.params.apply(|lambda, phi| (lambda, phi), lon_lat)
    }
}

/// Spherical Mercator, with latitudes clamped to the representable range
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Mercator {
    pub params: ProjectionParams,
}

impl Mercator {
    pub fn new(params: ProjectionParams) -> Self {
        Self { params }
    }
}

impl Projection for Mercator {
    fn project(&self, lon_lat: Coord<f64>) -> Option<Coord<f64>> {
        let limit = MAX_LATITUDE.to_radians();
        self.params.apply(
            |lambda, phi| (lambda, (FRAC_PI_4 + phi.clamp(-limit, limit) / 2.0).tan().ln()),
            lon_lat,
        )
    }
}

/// Albers conic equal-area projection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Albers {
    pub params: ProjectionParams,
    /// Standard parallels in degrees
    pub parallels: [f64; 2],
    /// Cone constant
    n: f64,
    c: f64,
    rho0: f64,
}

impl Albers {
    pub fn new(params: ProjectionParams, parallels: [f64; 2]) -> Self {
        let sin_phi0 = parallels[0].to_radians().sin();
        let n = (sin_phi0 + parallels[1].to_radians().sin()) / 2.0;
        let c = 1.0 + sin_phi0 * (2.0 * n - sin_phi0);
        let rho0 = c.sqrt() / n;
        Self {
            params,
            parallels,
            n,
            c,
            rho0,
        }
    }

    /// Albers centered on the conterminous United States
    pub fn usa(scale: f64, translate: [f64; 2]) -> Self {
        Self::new(
            ProjectionParams {
                scale,
                translate,
                center: USA_CENTER,
                rotate: USA_ROTATE,
            },
            USA_PARALLELS,
        )
    }

    fn raw(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let rho = (self.c - 2.0 * self.n * phi.sin()).sqrt() / self.n;
        let theta = lambda * self.n;
        (rho * theta.sin(), self.rho0 - rho * theta.cos())
    }
}

impl Projection for Albers {
    fn project(&self, lon_lat: Coord<f64>) -> Option<Coord<f64>> {
        self.params.apply(|lambda, phi| self.raw(lambda, phi), lon_lat)
    }
}

/// Placement of one part of the composite U.S. projection
///
/// `scale`, `offset` and `extent` are multiples of the composite scale, relative to
/// the composite translation.
#[derive(Clone, Copy, Debug)]
struct InsetSpec {
    parallels: [f64; 2],
    rotate: f64,
    center: [f64; 2],
    scale: f64,
    offset: [f64; 2],
    extent: [[f64; 2]; 2],
}

const LOWER_48: InsetSpec = InsetSpec {
    parallels: USA_PARALLELS,
    rotate: USA_ROTATE,
    center: USA_CENTER,
    scale: 1.0,
    offset: [0.0, 0.0],
    extent: [[-0.455, -0.238], [0.455, 0.238]],
};

const ALASKA: InsetSpec = InsetSpec {
    parallels: [55.0, 65.0],
    rotate: 154.0,
    center: [-2.0, 58.5],
    scale: 0.35,
    offset: [-0.307, 0.201],
    extent: [[-0.425, 0.120], [-0.214, 0.234]],
};

const HAWAII: InsetSpec = InsetSpec {
    parallels: [8.0, 18.0],
    rotate: 157.0,
    center: [-3.0, 19.9],
    scale: 1.0,
    offset: [-0.205, 0.212],
    extent: [[-0.214, 0.166], [-0.115, 0.234]],
};

/// One Albers part of [`AlbersUsa`] and the screen rectangle it draws into
#[derive(Clone, Copy, Debug, PartialEq)]
struct Inset {
    projection: Albers,
    min: Coord<f64>,
    max: Coord<f64>,
}

impl Inset {
    fn new(spec: &InsetSpec, scale: f64, translate: [f64; 2]) -> Self {
        let [x, y] = translate;
        let corner = |[dx, dy]: [f64; 2]| Coord {
            x: x + dx * scale,
            y: y + dy * scale,
        };
        let params = ProjectionParams {
            scale: scale * spec.scale,
            translate: [x + spec.offset[0] * scale, y + spec.offset[1] * scale],
            center: spec.center,
            rotate: spec.rotate,
        };
        Self {
            projection: Albers::new(params, spec.parallels),
            min: corner(spec.extent[0]),
            max: corner(spec.extent[1]),
        }
    }

    fn project(&self, lon_lat: Coord<f64>) -> Option<Coord<f64>> {
        self.projection.project(lon_lat).filter(|p| {
            (self.min.x..=self.max.x).contains(&p.x) && (self.min.y..=self.max.y).contains(&p.y)
        })
    }
}

/// Composite U.S. projection: the conterminous states with Alaska and Hawaii
/// moved into insets below the west coast
///
/// A point is drawn by the first part (lower 48, Alaska, Hawaii) whose screen
/// rectangle contains its image. Points outside every rectangle have no image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlbersUsa {
    insets: [Inset; 3],
}

impl AlbersUsa {
    pub fn new(scale: f64, translate: [f64; 2]) -> Self {
        Self {
            insets: [LOWER_48, ALASKA, HAWAII].map(|spec| Inset::new(&spec, scale, translate)),
        }
    }

    /// The conterminous-U.S. part
    #[inline]
    pub fn lower48(&self) -> &Albers {
        &self.insets[0].projection
    }
}

impl Projection for AlbersUsa {
    fn project(&self, lon_lat: Coord<f64>) -> Option<Coord<f64>> {
        self.insets
            .iter()
            .find_map(|inset| inset.project(lon_lat))
    }
}

/// Projection families selectable from configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    #[default]
    Equirectangular,
    Mercator,
    Albers,
    /// Composite U.S. projection; only `scale` and `translate` are used
    AlbersUsa,
}

impl ProjectionKind {
    /// Parameters fitting a whole-world map into a `width` x `height` viewport
    pub fn world_params(self, width: f64, height: f64) -> ProjectionParams {
        let divisor = match self {
            Self::Mercator => 1.45,
            _ => 1.8,
        };
        ProjectionParams {
            scale: (width + 1.0) / 2.0 / PI,
            translate: [width / 2.0, height / divisor],
            ..ProjectionParams::default()
        }
    }

    /// Parameters fitting the conterminous United States into a viewport
    pub fn usa_params(width: f64, height: f64) -> ProjectionParams {
        ProjectionParams {
            scale: width,
            translate: [width / 2.0, height / 2.0],
            center: USA_CENTER,
            rotate: USA_ROTATE,
        }
    }

    /// Build a projection of this kind
    ///
    /// Albers always uses the U.S. standard parallels.
    pub fn build(self, params: ProjectionParams) -> Box<dyn Projection> {
        match self {
            Self::Equirectangular => Box::new(Equirectangular::new(params)),
            Self::Mercator => Box::new(Mercator::new(params)),
            Self::Albers => Box::new(Albers::new(params, USA_PARALLELS)),
            Self::AlbersUsa => Box::new(AlbersUsa::new(params.scale, params.translate)),
        }
    }
}

impl std::str::FromStr for ProjectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "equirectangular" => Ok(Self::Equirectangular),
            "mercator" => Ok(Self::Mercator),
            "albers" => Ok(Self::Albers),
            "albersusa" | "albers-usa" => Ok(Self::AlbersUsa),
            other => Err(format!("unknown projection: {other}")),
        }
    }
}
