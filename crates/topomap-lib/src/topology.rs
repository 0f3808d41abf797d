//! Topology storage and parsing module
//!
//! This module provides the `Topology` struct: the shared arc table, the quantization
//! transform and the named geometry collections of one topology document. It is
//! read-only after loading and can be shared freely between render passes.

use crate::transform::RawTransform;
use crate::{ArcRef, Result, TopoError, Transform};
use serde::Deserialize;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// A raw arc: first pair absolute, every later pair a delta from the previous point
pub type RawArc = Vec<[i64; 2]>;

/// The arc references forming one ring, in traversal order
///
/// Most rings reference only a handful of arcs, so they are stored inline.
pub type RingSpec = SmallVec<[ArcRef; 4]>;

/// Shape of a geometry entry, decided once when the document is parsed
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryShape {
    /// One polygon: outer ring first, holes after
    Polygon { rings: Vec<RingSpec> },
    /// Several polygons, each a list of rings
    MultiPolygon { polygons: Vec<Vec<RingSpec>> },
    /// Any other geometry type; reported when the entry is reconstructed
    Unsupported { type_name: String },
    /// An entry whose id or arcs could not be read; reported when reconstructed
    Malformed { type_name: String, reason: String },
}

impl GeometryShape {
    /// The TopoJSON type name of this shape
    pub fn type_name(&self) -> &str {
        match self {
            Self::Polygon { .. } => "Polygon",
            Self::MultiPolygon { .. } => "MultiPolygon",
            Self::Unsupported { type_name } | Self::Malformed { type_name, .. } => type_name,
        }
    }
}

/// One entry of a geometry collection
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryEntry {
    /// Feature identifier (country/state code). Not unique: several entries may share it
    pub id: Option<String>,
    /// Free-form metadata, usually carrying at least `name`
    pub properties: Map<String, Value>,
    /// Arc references of the geometry
    pub shape: GeometryShape,
}

impl GeometryEntry {
    /// Build a polygon entry from signed (wire format) arc indices
    pub fn polygon(id: impl Into<String>, rings: &[&[i64]]) -> Self {
        Self {
            id: Some(id.into()),
            properties: Map::new(),
            shape: GeometryShape::Polygon {
                rings: rings.iter().map(|ring| signed_ring(ring)).collect(),
            },
        }
    }

    /// Build a multipolygon entry from signed (wire format) arc indices
    pub fn multi_polygon(id: impl Into<String>, polygons: &[&[&[i64]]]) -> Self {
        Self {
            id: Some(id.into()),
            properties: Map::new(),
            shape: GeometryShape::MultiPolygon {
                polygons: polygons
                    .iter()
                    .map(|rings| rings.iter().map(|ring| signed_ring(ring)).collect())
                    .collect(),
            },
        }
    }

    /// Set the `name` property
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.properties
            .insert("name".to_string(), Value::String(name.into()));
        self
    }

    /// The `name` property, if present and a string
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }
}

fn signed_ring(ring: &[i64]) -> RingSpec {
    ring.iter().copied().map(ArcRef::from_signed).collect()
}

/// An ordered collection of geometry entries (one scope)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryCollection {
    pub geometries: Vec<GeometryEntry>,
}

impl GeometryCollection {
    pub fn new(geometries: Vec<GeometryEntry>) -> Self {
        Self { geometries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

/// Shared-arc topology for one set of geographic scopes
#[derive(Clone, Debug, PartialEq)]
pub struct Topology {
    /// Quantized, delta-encoded arcs shared by all rings
    arcs: Vec<RawArc>,
    /// Dequantization transform (required for reconstruction)
    transform: Option<Transform>,
    /// Geometry collections by scope name
    objects: HashMap<String, GeometryCollection>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Topology {
    /// Create a topology from already-parsed parts
    pub fn new(
        arcs: Vec<RawArc>,
        transform: Option<Transform>,
        objects: HashMap<String, GeometryCollection>,
    ) -> Self {
        Self {
            arcs,
            transform,
            objects,
        }
    }

    /// Parse a TopoJSON document
    ///
    /// # Errors
    /// `Json` for syntax errors, `MalformedTopology` for documents that are not
    /// topologies or whose geometry entries are shaped wrongly, `InvalidTransform`
    /// for a transform with missing or non-numeric components.
    pub fn from_json_str(json: &str) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("topology::from_json_str");

        let document: TopologyDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Parse a TopoJSON document from a reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let document: TopologyDocument = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    /// Load a TopoJSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    fn from_document(document: TopologyDocument) -> Result<Self> {
        if document.kind != "Topology" {
            return Err(TopoError::MalformedTopology(format!(
                "expected type \"Topology\", found \"{}\"",
                document.kind
            )));
        }

        let transform = document.transform.map(Transform::try_from).transpose()?;

        let objects = document
            .objects
            .into_iter()
            .map(|(scope, object)| (scope, object.into_collection()))
            .collect::<HashMap<_, _>>();

        tracing::debug!(
            "Loaded topology with {} arcs and {} scopes",
            document.arcs.len(),
            objects.len()
        );

        Ok(Self {
            arcs: document.arcs,
            transform,
            objects,
        })
    }

    /// The shared arc table
    #[inline]
    pub fn arcs(&self) -> &[RawArc] {
        &self.arcs
    }

    /// The dequantization transform
    ///
    /// # Errors
    /// `InvalidTransform` if the document carried no transform.
    #[inline]
    pub fn transform(&self) -> Result<&Transform> {
        self.transform
            .as_ref()
            .ok_or_else(|| TopoError::InvalidTransform("missing transform".to_string()))
    }

    /// All geometry collections by scope name
    #[inline]
    pub fn objects(&self) -> &HashMap<String, GeometryCollection> {
        &self.objects
    }

    /// The geometry collection of a scope
    ///
    /// # Errors
    /// `UnknownScope` if the topology has no object of that name.
    pub fn collection(&self, scope: &str) -> Result<&GeometryCollection> {
        self.objects
            .get(scope)
            .ok_or_else(|| TopoError::UnknownScope(scope.to_string()))
    }

    /// Scope names, sorted
    pub fn scopes(&self) -> Vec<&str> {
        let mut scopes: Vec<&str> = self.objects.keys().map(String::as_str).collect();
        scopes.sort_unstable();
        scopes
    }
}

/// Wire form of a topology document
#[derive(Deserialize)]
struct TopologyDocument {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    objects: HashMap<String, GeometryDocument>,
    #[serde(default)]
    arcs: Vec<RawArc>,
    transform: Option<RawTransform>,
}

/// Wire form of a geometry object or collection
#[derive(Deserialize)]
struct GeometryDocument {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    arcs: Option<Value>,
    #[serde(default)]
    geometries: Option<Vec<GeometryDocument>>,
}

impl GeometryDocument {
    /// Collections map entry by entry; a bare geometry becomes a one-entry collection
    fn into_collection(self) -> GeometryCollection {
        if self.kind.as_deref() == Some("GeometryCollection") {
            let geometries = self
                .geometries
                .unwrap_or_default()
                .into_iter()
                .map(GeometryDocument::into_entry)
                .collect();
            GeometryCollection::new(geometries)
        } else {
            GeometryCollection::new(vec![self.into_entry()])
        }
    }

    /// Convert one entry; a broken entry keeps its place as `Malformed`
    fn into_entry(self) -> GeometryEntry {
        let type_name = self.kind.as_deref().unwrap_or("null").to_string();
        let (id, id_error) = match self.id {
            None | Some(Value::Null) => (None, None),
            Some(Value::String(id)) => (Some(id), None),
            Some(Value::Number(id)) => (Some(id.to_string()), None),
            Some(other) => (
                None,
                Some(format!(
                    "geometry id must be a string or number, found {other}"
                )),
            ),
        };

        let shape = match (id_error, self.kind.as_deref()) {
            (Some(reason), _) => Err(reason),
            (None, Some("Polygon")) => {
                arcs_as(self.arcs, "Polygon").map(|rings| GeometryShape::Polygon { rings })
            }
            (None, Some("MultiPolygon")) => arcs_as(self.arcs, "MultiPolygon")
                .map(|polygons| GeometryShape::MultiPolygon { polygons }),
            (None, _) => Ok(GeometryShape::Unsupported {
                type_name: type_name.clone(),
            }),
        }
        .unwrap_or_else(|reason| {
            tracing::debug!("Keeping malformed {} entry: {}", type_name, reason);
            GeometryShape::Malformed { type_name, reason }
        });

        GeometryEntry {
            id,
            properties: self.properties.unwrap_or_default(),
            shape,
        }
    }
}

fn arcs_as<T: serde::de::DeserializeOwned>(
    arcs: Option<Value>,
    kind: &str,
) -> std::result::Result<T, String> {
    let arcs = arcs.ok_or_else(|| format!("{kind} without arcs"))?;
    serde_json::from_value(arcs).map_err(|e| format!("{kind} arcs: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    const SQUARE: &str = r#"{
        "type": "Topology",
        "transform": {"scale": [1, 1], "translate": [0, 0]},
        "arcs": [[[0, 0], [0, 10], [10, 0], [0, -10], [-10, 0]]],
        "objects": {
            "world": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "id": "SQR", "properties": {"name": "Square"}, "arcs": [[0]]}
                ]
            }
        }
    }"#;

    #[test]
    fn test_parse_square() {
        let topology = Topology::from_json_str(SQUARE).unwrap();

        assert_eq!(topology.arcs().len(), 1);
        assert_eq!(topology.arcs()[0].len(), 5);
        assert_eq!(topology.transform().unwrap(), &Transform::identity());
        assert_eq!(topology.scopes(), vec!["world"]);

        let collection = topology.collection("world").unwrap();
        assert_eq!(collection.len(), 1);

        let entry = &collection.geometries[0];
        assert_eq!(entry.id.as_deref(), Some("SQR"));
        assert_eq!(entry.name(), Some("Square"));
        let expected: Vec<RingSpec> = vec![smallvec![ArcRef::forward(0)]];
        assert_eq!(entry.shape, GeometryShape::Polygon { rings: expected });
    }

    #[test]
    fn test_parse_multipolygon_with_negative_indices() {
        let json = r#"{
            "type": "Topology",
            "transform": {"scale": [1, 1], "translate": [0, 0]},
            "arcs": [[[0, 0], [1, 0]], [[1, 0], [0, 1]]],
            "objects": {"usa": {"type": "GeometryCollection", "geometries": [
                {"type": "MultiPolygon", "id": "MI", "arcs": [[[0, -2]], [[1]]]}
            ]}}
        }"#;
        let topology = Topology::from_json_str(json).unwrap();
        let entry = &topology.collection("usa").unwrap().geometries[0];

        match &entry.shape {
            GeometryShape::MultiPolygon { polygons } => {
                assert_eq!(polygons.len(), 2);
                assert_eq!(
                    polygons[0][0].as_slice(),
                    &[ArcRef::forward(0), ArcRef::reversed(1)]
                );
                assert_eq!(polygons[1][0].as_slice(), &[ArcRef::forward(1)]);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_numeric_ids_are_stringified() {
        let json = r#"{"type": "Topology", "arcs": [], "objects": {"world": {
            "type": "GeometryCollection",
            "geometries": [{"type": "Polygon", "id": 840, "arcs": []}]
        }}}"#;
        let topology = Topology::from_json_str(json).unwrap();
        let entry = &topology.collection("world").unwrap().geometries[0];
        assert_eq!(entry.id.as_deref(), Some("840"));
    }

    #[test]
    fn test_unsupported_type_is_kept() {
        let json = r#"{"type": "Topology", "arcs": [], "objects": {"world": {
            "type": "GeometryCollection",
            "geometries": [{"type": "LineString", "id": "X", "arcs": [0]}, {"type": null}]
        }}}"#;
        let topology = Topology::from_json_str(json).unwrap();
        let geometries = &topology.collection("world").unwrap().geometries;
        assert_eq!(geometries[0].shape.type_name(), "LineString");
        assert_eq!(geometries[1].shape.type_name(), "null");
        assert_eq!(geometries[1].id, None);
    }

    #[test]
    fn test_bare_geometry_object() {
        let json = r#"{"type": "Topology", "arcs": [[[0, 0], [1, 1]]], "objects": {
            "virginia": {"type": "Polygon", "id": "VA", "arcs": [[0]]}
        }}"#;
        let topology = Topology::from_json_str(json).unwrap();
        let collection = topology.collection("virginia").unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.geometries[0].id.as_deref(), Some("VA"));
    }

    #[test]
    fn test_missing_transform() {
        let json = r#"{"type": "Topology", "arcs": [], "objects": {}}"#;
        let topology = Topology::from_json_str(json).unwrap();
        assert!(matches!(
            topology.transform(),
            Err(TopoError::InvalidTransform(_))
        ));
    }

    #[test]
    fn test_invalid_transform() {
        let json = r#"{"type": "Topology", "arcs": [], "objects": {},
            "transform": {"scale": [1, "x"], "translate": [0, 0]}}"#;
        let result = Topology::from_json_str(json);
        assert!(matches!(result, Err(TopoError::InvalidTransform(_))));
    }

    #[test]
    fn test_wrong_document_type() {
        let json = r#"{"type": "FeatureCollection", "features": []}"#;
        let result = Topology::from_json_str(json);
        assert!(matches!(result, Err(TopoError::MalformedTopology(_))));
    }

    #[test]
    fn test_misshapen_arcs_stay_in_place() {
        let json = r#"{"type": "Topology", "arcs": [[[0, 0], [1, 0]]], "objects": {"world": {
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Polygon", "id": "OK", "arcs": [[0]]},
                {"type": "Polygon", "id": "BAD", "arcs": [[0.5]]},
                {"type": "MultiPolygon", "id": "NOARCS"},
                {"type": "Polygon", "id": {"nested": true}, "arcs": [[0]]}
            ]
        }}}"#;
        let topology = Topology::from_json_str(json).unwrap();
        let entries = &topology.collection("world").unwrap().geometries;
        assert_eq!(entries.len(), 4);

        assert!(matches!(entries[0].shape, GeometryShape::Polygon { .. }));
        assert_eq!(entries[1].id.as_deref(), Some("BAD"));
        assert!(matches!(
            &entries[1].shape,
            GeometryShape::Malformed { type_name, reason }
                if type_name == "Polygon" && reason.starts_with("Polygon arcs")
        ));
        assert!(matches!(
            &entries[2].shape,
            GeometryShape::Malformed { reason, .. } if reason == "MultiPolygon without arcs"
        ));
        assert_eq!(entries[3].id, None);
        assert!(matches!(entries[3].shape, GeometryShape::Malformed { .. }));
        assert_eq!(entries[3].shape.type_name(), "Polygon");
    }

    #[test]
    fn test_invalid_json() {
        let result = Topology::from_json_str("{not json");
        assert!(matches!(result, Err(TopoError::Json(_))));
    }

    #[test]
    fn test_unknown_scope() {
        let topology = Topology::from_json_str(SQUARE).unwrap();
        assert!(matches!(
            topology.collection("usa"),
            Err(TopoError::UnknownScope(scope)) if scope == "usa"
        ));
    }

    #[test]
    fn test_entry_builders() {
        let entry = GeometryEntry::polygon("ATA", &[&[0, -3]]).with_name("Antarctica");
        assert_eq!(entry.name(), Some("Antarctica"));
        assert_eq!(
            entry.shape,
            GeometryShape::Polygon {
                rings: vec![smallvec![ArcRef::forward(0), ArcRef::reversed(2)]]
            }
        );
    }
}
