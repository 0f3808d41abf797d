//! Feature reconstruction
//!
//! Walks the geometry collection of one scope and turns every entry into a
//! [`Feature`] with decoded longitude/latitude rings. Reconstruction is lazy and
//! fails per feature: a broken entry yields an error and iteration continues.

use crate::ring::ArcTable;
use crate::{GeometryEntry, GeometryShape, Result, RingSpec, TopoError, Topology, Transform};
use geo::{Area, Geometry, LineString, MultiPolygon, Polygon};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::iter::Enumerate;
use std::slice;

/// Decoded geometry of a feature, in longitude/latitude
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureGeometry {
    /// Rings of a single polygon, in input order (outer ring first, holes after)
    Polygon { rings: Vec<LineString<f64>> },
    /// Ring lists of several polygons, in input order
    MultiPolygon { polygons: Vec<Vec<LineString<f64>>> },
}

impl FeatureGeometry {
    /// The TopoJSON type name of this geometry
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Polygon { .. } => "Polygon",
            Self::MultiPolygon { .. } => "MultiPolygon",
        }
    }

    /// Iterate over the ring lists of every polygon (one for `Polygon`)
    pub fn polygons(&self) -> Box<dyn Iterator<Item = &[LineString<f64>]> + '_> {
        match self {
            Self::Polygon { rings } => Box::new(std::iter::once(rings.as_slice())),
            Self::MultiPolygon { polygons } => Box::new(polygons.iter().map(Vec::as_slice)),
        }
    }

    /// Iterate over every ring of every polygon
    pub fn rings(&self) -> impl Iterator<Item = &LineString<f64>> {
        self.polygons().flat_map(|rings| rings.iter())
    }

    /// Convert to a `geo` geometry: first ring exterior, later rings interiors
    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            Self::Polygon { rings } => Geometry::Polygon(to_polygon(rings)),
            Self::MultiPolygon { polygons } => Geometry::MultiPolygon(MultiPolygon::new(
                polygons.iter().map(|rings| to_polygon(rings)).collect(),
            )),
        }
    }

    /// The polygon with the largest unsigned area, holes subtracted
    pub fn largest_polygon(&self) -> Option<Polygon<f64>> {
        self.polygons()
            .map(to_polygon)
            .map(|polygon| (polygon.unsigned_area(), polygon))
            .max_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, polygon)| polygon)
    }
}

fn to_polygon(rings: &[LineString<f64>]) -> Polygon<f64> {
    match rings.split_first() {
        Some((exterior, interiors)) => Polygon::new(exterior.clone(), interiors.to_vec()),
        None => Polygon::new(LineString::new(Vec::new()), Vec::new()),
    }
}

/// A reconstructed, renderable geographic entity
///
/// Built fresh on every reconstruction from the immutable topology and never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    /// Feature identifier; used as the rendering class key, not necessarily unique
    pub id: Option<String>,
    /// Metadata copied from the geometry entry
    pub properties: Map<String, Value>,
    /// Decoded rings
    pub geometry: FeatureGeometry,
}

impl Feature {
    /// The `name` property, if present and a string
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }
}

/// A geometry entry that could not be reconstructed
#[derive(Debug, thiserror::Error)]
#[error("feature #{index} ({}): {error}", .id.as_deref().unwrap_or("no id"))]
pub struct FeatureError {
    /// Position of the entry in its geometry collection
    pub index: usize,
    /// Identifier of the entry, if it had one
    pub id: Option<String>,
    /// What went wrong
    #[source]
    pub error: TopoError,
}

/// Outcome of reconstructing a whole scope with skip-and-continue semantics
#[derive(Debug, Default)]
pub struct Reconstruction {
    /// Successfully reconstructed features, in collection order
    pub features: Vec<Feature>,
    /// Entries that failed, in collection order
    pub errors: Vec<FeatureError>,
}

impl Reconstruction {
    /// Whether every entry was reconstructed
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Lazy iterator over the features of one scope
///
/// Yields one item per geometry entry. Iterating again (by calling
/// [`reconstruct_features`] again) yields identical features since the topology is
/// never modified.
#[derive(Debug)]
pub struct Features<'a> {
    table: ArcTable<'a>,
    transform: &'a Transform,
    entries: Enumerate<slice::Iter<'a, GeometryEntry>>,
    excluded: HashSet<String>,
}

impl<'a> Features<'a> {
    pub(crate) fn new(
        table: ArcTable<'a>,
        transform: &'a Transform,
        entries: &'a [GeometryEntry],
    ) -> Self {
        Self {
            table,
            transform,
            entries: entries.iter().enumerate(),
            excluded: HashSet::new(),
        }
    }

    /// Skip entries whose id is in `ids`
    ///
    /// This only filters what is yielded; the topology is untouched. Errors of
    /// excluded entries are skipped as well.
    pub fn excluding<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Drain the iterator, separating features from per-entry errors
    ///
    /// Errors are returned, not logged; callers decide how to surface them.
    pub fn collect_report(self) -> Reconstruction {
        let mut report = Reconstruction::default();
        for item in self {
            match item {
                Ok(feature) => report.features.push(feature),
                Err(error) => report.errors.push(error),
            }
        }
        report
    }

    fn build(&self, entry: &GeometryEntry) -> Result<Feature> {
        let geometry = match &entry.shape {
            GeometryShape::Polygon { rings } => FeatureGeometry::Polygon {
                rings: self.decode_rings(rings)?,
            },
            GeometryShape::MultiPolygon { polygons } => FeatureGeometry::MultiPolygon {
                polygons: polygons
                    .iter()
                    .map(|rings| self.decode_rings(rings))
                    .collect::<Result<_>>()?,
            },
            GeometryShape::Unsupported { type_name } => {
                return Err(TopoError::UnsupportedGeometryType(type_name.clone()));
            }
            GeometryShape::Malformed { reason, .. } => {
                return Err(TopoError::MalformedTopology(reason.clone()));
            }
        };

        Ok(Feature {
            id: entry.id.clone(),
            properties: entry.properties.clone(),
            geometry,
        })
    }

    fn decode_rings(&self, rings: &[RingSpec]) -> Result<Vec<LineString<f64>>> {
        rings
            .iter()
            .map(|ring| self.table.decode(ring, self.transform))
            .collect()
    }

    fn is_excluded(&self, entry: &GeometryEntry) -> bool {
        entry
            .id
            .as_ref()
            .is_some_and(|id| self.excluded.contains(id))
    }
}

impl Iterator for Features<'_> {
    type Item = std::result::Result<Feature, FeatureError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (index, entry) = self.entries.next()?;
            if self.is_excluded(entry) {
                continue;
            }
            return Some(self.build(entry).map_err(|error| FeatureError {
                index,
                id: entry.id.clone(),
                error,
            }));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.entries.size_hint().1)
    }
}

/// Reconstruct the features of one scope
///
/// # Errors
/// `UnknownScope` if the scope does not exist and `InvalidTransform` if the topology
/// has no transform. Both are reported before any feature is produced; everything
/// else is reported per feature by the returned iterator.
pub fn reconstruct_features<'a>(topology: &'a Topology, scope: &str) -> Result<Features<'a>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("feature::reconstruct_features");

    let collection = topology.collection(scope)?;
    let transform = topology.transform()?;
    tracing::debug!(
        "Reconstructing {} geometries for scope '{}'",
        collection.len(),
        scope
    );
    Ok(Features::new(
        ArcTable::Raw(topology.arcs()),
        transform,
        &collection.geometries,
    ))
}
