//! Memoized reconstruction
//!
//! [`CachedTopology`] decodes the whole arc table once up front and remembers the
//! features of recently reconstructed scopes. Output is identical to
//! [`reconstruct_features`](crate::reconstruct_features).

use crate::arc::decode_arc;
use crate::feature::{Features, Reconstruction};
use crate::ring::ArcTable;
use crate::{Result, Topology};
use geo::Coord;
use lru::LruCache;
use rayon::prelude::*;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

/// A topology with pre-decoded arcs and an LRU of reconstructed scopes
#[derive(Debug)]
pub struct CachedTopology {
    topology: Arc<Topology>,
    /// Absolute quantized points per arc; `None` where decoding failed
    decoded_arcs: Vec<Option<Vec<Coord<i64>>>>,
    scopes: Mutex<LruCache<String, Arc<Reconstruction>>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl CachedTopology {
    /// Decode every arc of `topology` and keep up to `capacity` scopes
    pub fn new(topology: Arc<Topology>, capacity: NonZeroUsize) -> Self {
        let start = instant::Instant::now();
        let decoded_arcs: Vec<Option<Vec<Coord<i64>>>> = topology
            .arcs()
            .par_iter()
            .map(|raw| decode_arc(raw, false).ok())
            .collect();
        tracing::trace!(
            "Pre-decoded {} arcs ({} failed) in {:?}",
            decoded_arcs.len(),
            decoded_arcs.iter().filter(|arc| arc.is_none()).count(),
            start.elapsed()
        );

        Self {
            topology,
            decoded_arcs,
            scopes: Mutex::new(LruCache::new(capacity)),
        }
    }

    #[inline]
    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    /// Lazy reconstruction of one scope using the pre-decoded arcs
    pub fn features(&self, scope: &str) -> Result<Features<'_>> {
        let collection = self.topology.collection(scope)?;
        let transform = self.topology.transform()?;
        Ok(Features::new(
            ArcTable::Decoded {
                raw: self.topology.arcs(),
                decoded: &self.decoded_arcs,
            },
            transform,
            &collection.geometries,
        ))
    }

    /// All features and per-feature errors of one scope, memoized
    ///
    /// No id filtering is applied; the cached entry covers the whole scope.
    pub fn reconstruct(&self, scope: &str) -> Result<Arc<Reconstruction>> {
        if let Some(hit) = self.lock().get(scope) {
            tracing::trace!("Reconstruction cache hit for scope '{}'", scope);
            return Ok(Arc::clone(hit));
        }

        #[cfg(feature = "profiling")]
        profiling::scope!("cache::reconstruct");
        tracing::debug!("Reconstruction cache miss for scope '{}'", scope);
        let report = Arc::new(self.features(scope)?.collect_report());
        self.lock().put(scope.to_string(), Arc::clone(&report));
        Ok(report)
    }

    /// Cached scopes, most recently used first
    pub fn cached_scopes(&self) -> Vec<String> {
        self.lock().iter().map(|(scope, _)| scope.clone()).collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, Arc<Reconstruction>>> {
        // The cache holds no invariants a panicking holder could break
        self.scopes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
