//! Quantization transform
//!
//! Quantized topologies store positions as integers. The transform maps a decoded
//! integer position back to longitude/latitude; it is applied after delta decoding.

use crate::{Result, TopoError};
use geo::Coord;
use serde::{Deserialize, Serialize};

/// Affine dequantization transform
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransform")]
pub struct Transform {
    /// Scale factors `[sx, sy]`
    pub scale: [f64; 2],
    /// Translation `[tx, ty]`
    pub translate: [f64; 2],
}

/// Wire form of the transform, validated into [`Transform`]
///
/// Fields are kept as untyped JSON so that missing or non-numeric components are
/// reported as `InvalidTransform` rather than as a generic parse error.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct RawTransform {
    scale: Option<serde_json::Value>,
    translate: Option<serde_json::Value>,
}

impl TryFrom<RawTransform> for Transform {
    type Error = TopoError;

    fn try_from(raw: RawTransform) -> Result<Self> {
        Self::new(
            pair("scale", raw.scale.as_ref())?,
            pair("translate", raw.translate.as_ref())?,
        )
    }
}

fn pair(field: &str, value: Option<&serde_json::Value>) -> Result<[f64; 2]> {
    let Some(value) = value else {
        return Err(TopoError::InvalidTransform(format!("missing {field}")));
    };
    let components = value
        .as_array()
        .ok_or_else(|| TopoError::InvalidTransform(format!("{field} must be an array")))?;
    match components.as_slice() {
        [a, b] => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => Ok([a, b]),
            _ => Err(TopoError::InvalidTransform(format!(
                "{field} components must be numbers"
            ))),
        },
        other => Err(TopoError::InvalidTransform(format!(
            "{field} must have 2 components, found {}",
            other.len()
        ))),
    }
}

impl Transform {
    /// Create a transform, rejecting non-finite components
    pub fn new(scale: [f64; 2], translate: [f64; 2]) -> Result<Self> {
        if scale.iter().chain(translate.iter()).any(|v| !v.is_finite()) {
            return Err(TopoError::InvalidTransform(
                "non-finite scale or translate".to_string(),
            ));
        }
        Ok(Self { scale, translate })
    }

    /// The transform that leaves coordinates unchanged
    pub fn identity() -> Self {
        Self {
            scale: [1.0, 1.0],
            translate: [0.0, 0.0],
        }
    }

    /// Map a quantized position to longitude/latitude
    #[inline(always)]
    pub fn apply(&self, point: Coord<i64>) -> Coord<f64> {
        Coord {
            x: point.x as f64 * self.scale[0] + self.translate[0],
            y: point.y as f64 * self.scale[1] + self.translate[1],
        }
    }

    /// Map longitude/latitude to the nearest quantized position
    ///
    /// Inverse of [`Transform::apply`] up to rounding. A zero scale component maps
    /// everything on that axis to 0.
    pub fn quantize(&self, lon_lat: Coord<f64>) -> Coord<i64> {
        let axis = |value: f64, scale: f64, translate: f64| {
            if scale == 0.0 {
                0
            } else {
                ((value - translate) / scale).round() as i64
            }
        };
        Coord {
            x: axis(lon_lat.x, self.scale[0], self.translate[0]),
            y: axis(lon_lat.y, self.scale[1], self.translate[1]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let transform = Transform::identity();
        let point = transform.apply(Coord { x: 12, y: -7 });
        assert_eq!(point, Coord { x: 12.0, y: -7.0 });
    }

    #[test]
    fn test_apply() {
        let transform = Transform::new([0.036, 0.017], [-180.0, -90.0]).unwrap();
        let point = transform.apply(Coord { x: 5000, y: 5000 });
        assert!((point.x - 0.0).abs() < 1e-9);
        assert!((point.y - -5.0).abs() < 1e-9);
    }

    #[test]
    fn test_linearity() {
        let a = Transform::new([2.0, 3.0], [1.0, -1.0]).unwrap();
        let b = Transform::new([4.0, 3.0], [1.0, 5.0]).unwrap();

        for (x, y) in [(0, 0), (1, 2), (-3, 7), (100, -50)] {
            let p = Coord { x, y };
            let pa = a.apply(p);
            let pb = b.apply(p);
            assert_eq!(pa.x, x as f64 * 2.0 + 1.0);
            assert_eq!(pa.y, y as f64 * 3.0 - 1.0);
            // Doubling sx doubles the scaled part of x; y only moves by the translate delta
            assert_eq!(pb.x - 1.0, 2.0 * (pa.x - 1.0));
            assert_eq!(pb.y - pa.y, 6.0);
        }
    }

    #[test]
    fn test_quantize_inverts_apply() {
        let transform = Transform::new([0.01, 0.02], [-10.0, 40.0]).unwrap();
        let q = Coord { x: 1234, y: -56 };
        assert_eq!(transform.quantize(transform.apply(q)), q);
    }

    #[test]
    fn test_deserialize() {
        let transform: Transform =
            serde_json::from_str(r#"{"scale": [0.5, 0.25], "translate": [-180, -90]}"#).unwrap();
        assert_eq!(transform.scale, [0.5, 0.25]);
        assert_eq!(transform.translate, [-180.0, -90.0]);
    }

    #[test]
    fn test_missing_field_rejected() {
        let result: std::result::Result<Transform, _> =
            serde_json::from_str(r#"{"scale": [0.5, 0.25]}"#);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("missing translate"), "{message}");
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let result: std::result::Result<Transform, _> =
            serde_json::from_str(r#"{"scale": [0.5], "translate": [0, 0]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_non_numeric_rejected() {
        let raw: RawTransform =
            serde_json::from_str(r#"{"scale": ["a", 1], "translate": [0, 0]}"#).unwrap();
        let result = Transform::try_from(raw);
        assert!(matches!(result, Err(TopoError::InvalidTransform(_))));
    }

    #[test]
    fn test_non_finite_rejected() {
        let result = Transform::new([f64::NAN, 1.0], [0.0, 0.0]);
        assert!(matches!(result, Err(TopoError::InvalidTransform(_))));
    }
}
