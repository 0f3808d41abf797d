//! Fill color resolution for choropleth data
//!
//! Each feature id may carry a data value describing its fill. The value is
//! classified once into a [`ColorSource`] and resolved against a [`FillPalette`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Fill used when neither the data nor the palette provides one
pub const DEFAULT_FILL: &str = "#ABDDA4";

/// Palette key holding the default fill
const DEFAULT_FILL_KEY: &str = "defaultFill";

/// Where a feature's fill color comes from
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ColorSource {
    /// A literal CSS color
    Direct(String),
    /// A named palette entry
    FillKeyRef(String),
    /// The palette's default fill
    #[default]
    Default,
}

impl ColorSource {
    /// Classify a data value
    ///
    /// Priority: a bare string, then `fillColor`, then `color` (all literal colors),
    /// then `fillKey` (palette reference). Anything else uses the default fill.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(color) => Self::Direct(color.clone()),
            Value::Object(datum) => {
                let text = |key: &str| datum.get(key).and_then(Value::as_str);
                if let Some(color) = text("fillColor").or_else(|| text("color")) {
                    Self::Direct(color.to_string())
                } else if let Some(key) = text("fillKey") {
                    Self::FillKeyRef(key.to_string())
                } else {
                    Self::Default
                }
            }
            _ => Self::Default,
        }
    }
}

impl<'de> Deserialize<'de> for ColorSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Named fills plus the default fill
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, String>", into = "HashMap<String, String>")]
pub struct FillPalette {
    pub default_fill: String,
    pub fills: HashMap<String, String>,
}

impl Default for FillPalette {
    fn default() -> Self {
        Self {
            default_fill: DEFAULT_FILL.to_string(),
            fills: HashMap::new(),
        }
    }
}

impl From<HashMap<String, String>> for FillPalette {
    fn from(mut fills: HashMap<String, String>) -> Self {
        let default_fill = fills
            .remove(DEFAULT_FILL_KEY)
            .unwrap_or_else(|| DEFAULT_FILL.to_string());
        Self {
            default_fill,
            fills,
        }
    }
}

impl From<FillPalette> for HashMap<String, String> {
    fn from(palette: FillPalette) -> Self {
        let mut fills = palette.fills;
        fills.insert(DEFAULT_FILL_KEY.to_string(), palette.default_fill);
        fills
    }
}

impl FillPalette {
    /// Add or replace a named fill
    pub fn with_fill(mut self, key: impl Into<String>, color: impl Into<String>) -> Self {
        self.fills.insert(key.into(), color.into());
        self
    }

    /// Resolve a color source to a concrete color
    ///
    /// Unknown palette keys fall back to the default fill.
    pub fn resolve<'a>(&'a self, source: &'a ColorSource) -> &'a str {
        match source {
            ColorSource::Direct(color) => color,
            ColorSource::FillKeyRef(key) => self
                .fills
                .get(key)
                .map_or(self.default_fill.as_str(), String::as_str),
            ColorSource::Default => &self.default_fill,
        }
    }
}

/// Choropleth data: feature id to color source
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ChoroplethData {
    entries: HashMap<String, ColorSource>,
}

impl ChoroplethData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `{ "<id>": <data value> }`
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, id: impl Into<String>, source: ColorSource) {
        self.entries.insert(id.into(), source);
    }

    /// The color source of a feature; `Default` for ids without data
    pub fn get(&self, id: Option<&str>) -> &ColorSource {
        const NONE: &ColorSource = &ColorSource::Default;
        id.and_then(|id| self.entries.get(id)).unwrap_or(NONE)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classification_priority() {
        assert_eq!(
            ColorSource::from_value(&json!("#fff")),
            ColorSource::Direct("#fff".to_string())
        );
        assert_eq!(
            ColorSource::from_value(&json!({"fillColor": "#111", "color": "#222", "fillKey": "k"})),
            ColorSource::Direct("#111".to_string())
        );
        assert_eq!(
            ColorSource::from_value(&json!({"color": "#222", "fillKey": "k"})),
            ColorSource::Direct("#222".to_string())
        );
        assert_eq!(
            ColorSource::from_value(&json!({"fillKey": "visited", "numberOfThings": 3})),
            ColorSource::FillKeyRef("visited".to_string())
        );
        assert_eq!(
            ColorSource::from_value(&json!({"numberOfThings": 3})),
            ColorSource::Default
        );
        assert_eq!(ColorSource::from_value(&json!(42)), ColorSource::Default);
    }

    #[test]
    fn test_palette_resolution() {
        let palette = FillPalette::default().with_fill("visited", "#fa0fa0");

        assert_eq!(
            palette.resolve(&ColorSource::Direct("red".to_string())),
            "red"
        );
        assert_eq!(
            palette.resolve(&ColorSource::FillKeyRef("visited".to_string())),
            "#fa0fa0"
        );
        assert_eq!(
            palette.resolve(&ColorSource::FillKeyRef("unknown".to_string())),
            DEFAULT_FILL
        );
        assert_eq!(palette.resolve(&ColorSource::Default), DEFAULT_FILL);
    }

    #[test]
    fn test_palette_json() {
        let palette: FillPalette =
            serde_json::from_str(r##"{"defaultFill": "#dddddd", "high": "#ff0000"}"##).unwrap();
        assert_eq!(palette.default_fill, "#dddddd");
        assert_eq!(palette.fills.get("high").map(String::as_str), Some("#ff0000"));
        assert!(!palette.fills.contains_key("defaultFill"));

        let without_default: FillPalette = serde_json::from_str(r##"{"low": "#00f"}"##).unwrap();
        assert_eq!(without_default.default_fill, DEFAULT_FILL);
    }

    #[test]
    fn test_choropleth_data() {
        let data = ChoroplethData::from_json_str(
            r##"{"USA": {"fillKey": "visited"}, "CAN": "#00ff00", "MEX": {"numberOfThings": 2}}"##,
        )
        .unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(
            data.get(Some("USA")),
            &ColorSource::FillKeyRef("visited".to_string())
        );
        assert_eq!(
            data.get(Some("CAN")),
            &ColorSource::Direct("#00ff00".to_string())
        );
        assert_eq!(data.get(Some("MEX")), &ColorSource::Default);
        assert_eq!(data.get(Some("FRA")), &ColorSource::Default);
        assert_eq!(data.get(None), &ColorSource::Default);
    }
}
