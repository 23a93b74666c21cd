//! HNSW Index Implementation
//!
//! Wraps the `hnsw_rs` crate to implement the `Index` trait for
//! approximate nearest neighbor search.
//!
//! ## Distance Metrics
//!
//! HNSW supports multiple distance metrics:
//! - Cosine: Normalized dot product (1 - similarity)
//! - Euclidean (L2): Standard Euclidean distance
//! - Dot Product: Inner product (negated for distance)

use crate::index_manager::{DistanceMetric, HnswConfig, Index, TupleId};
use hnsw_rs::hnsw::Hnsw;
use hnsw_rs::prelude::*;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// HNSW index for approximate nearest neighbor search
///
/// This implementation uses the `hnsw_rs` crate with L2 distance internally
/// and applies distance transformations at the API boundary to support
/// multiple metrics.
pub struct HnswIndex {
    /// The underlying HNSW structure (Euclidean distance)
    /// We use L2 internally and transform for other metrics
    inner: RwLock<Option<HnswInnerOwned>>,
    /// Configuration
    config: HnswConfig,
    /// Tombstoned IDs (marked for deletion)
    tombstones: RwLock<HashSet<TupleId>>,
    /// Storage for vectors - maps tuple_id to vector
    vectors: RwLock<Vec<(TupleId, Vec<f32>)>>,
    /// Vector dimension (0 if not yet determined)
    dimension: RwLock<usize>,
}

/// Owned HNSW structure that stores vectors internally
struct HnswInnerOwned {
    /// The actual HNSW graph
    hnsw: Box<Hnsw<'static, f32, DistL2>>,
    /// Stored vectors that the HNSW references
    _storage: Arc<Vec<Vec<f32>>>,
    /// Mapping from HNSW internal index to tuple_id
    index_to_tuple_id: Vec<TupleId>,
}

// Safety: HnswInnerOwned is Send + Sync because:
// - The HNSW graph uses atomic operations for concurrent access
// - The storage is Arc<Vec<Vec<f32>>> which is Send + Sync
// - index_to_tuple_id is Vec<TupleId> which is Send + Sync
unsafe impl Send for HnswInnerOwned {}
unsafe impl Sync for HnswInnerOwned {}

impl HnswIndex {
    /// Create a new HNSW index with the given configuration
    pub fn new(config: HnswConfig) -> Self {
        Self {
            inner: RwLock::new(None),
            config,
            tombstones: RwLock::new(HashSet::new()),
            vectors: RwLock::new(Vec::new()),
            dimension: RwLock::new(0),
        }
    }

    /// Initialize or rebuild the HNSW structure from stored vectors
    fn rebuild_hnsw(&self) -> Result<(), String> {
        let vectors = self.vectors.read();
        let tombstones = self.tombstones.read();

        // Filter out tombstoned vectors, keeping tuple_ids
        let active_vectors: Vec<(TupleId, &Vec<f32>)> = vectors
            .iter()
            .filter(|(tuple_id, _)| !tombstones.contains(tuple_id))
            .map(|(tuple_id, vec)| (*tuple_id, vec))
            .collect();

        if active_vectors.is_empty() {
            *self.inner.write() = None;
            return Ok(());
        }

        // Create storage for vectors and mapping
        let dim = active_vectors[0].1.len();
        let storage: Vec<Vec<f32>> = active_vectors.iter().map(|(_, v)| (*v).clone()).collect();
        let index_to_tuple_id: Vec<TupleId> = active_vectors.iter().map(|(id, _)| *id).collect();
        let storage = Arc::new(storage);

        // Create a &'static reference to storage backed by the Arc.
        //
        // SAFETY: This transmute extends the borrow lifetime to 'static. This is sound because:
        // 1. `storage` (the Arc) is moved into `HnswInnerOwned._storage`, keeping refcount >= 1
        // 2. `HnswInnerOwned` is stored inside `self.inner` (behind a RwLock)
        // 3. The HNSW graph (which holds this reference) is dropped BEFORE `_storage` because
        //    Rust drops struct fields in declaration order: `hnsw` (uses ref) then `_storage` (owns data)
        // 4. No code path clones or moves `_storage` out of HnswInnerOwned
        // 5. The RwLock write guard in rebuild_hnsw() replaces the entire Option<HnswInnerOwned>,
        //    dropping old graph + storage atomically
        let storage_ref: &'static Vec<Vec<f32>> =
            unsafe { &*Arc::as_ptr(&storage).cast::<Vec<Vec<f32>>>() };

        let max_elements = storage_ref.len();
        // Scale max_layer to dataset size: log_M(N), clamped to [4, 16]
        let max_layer = if storage_ref.len() <= 1 {
            4
        } else {
            let m = (self.config.m as f64).max(2.0);
            let n = storage_ref.len() as f64;
            let layers = (n.ln() / m.ln()).ceil() as usize;
            layers.clamp(4, 16)
        };
        let mut hnsw: Hnsw<'static, f32, DistL2> = Hnsw::new(
            self.config.m,
            max_elements,
            max_layer,
            self.config.ef_construction,
            DistL2,
        );
        // Keep pruned connections to prevent graph disconnection.
        // Without this, Navarro's heuristic can over-prune small-to-medium
        // datasets, causing search to return fewer than k results.
        hnsw.set_keeping_pruned(true);
        hnsw.set_extend_candidates(true);
        // Flatten the graph: reduce level scale to keep more nodes at lower
        // layers, improving connectivity for small-to-medium datasets.
        hnsw.modify_level_scale(0.2);

        // Insert all vectors with their indices
        for (idx, vec) in storage_ref.iter().enumerate() {
            hnsw.insert((vec, idx));
        }

        *self.inner.write() = Some(HnswInnerOwned {
            hnsw: Box::new(hnsw),
            _storage: storage,
            index_to_tuple_id,
        });

        *self.dimension.write() = dim;

        Ok(())
    }

    /// Get the ef_search parameter to use
    fn get_ef_search(&self, ef_override: Option<usize>) -> usize {
        ef_override.unwrap_or(self.config.ef_search)
    }

    /// Transform raw L2 distance from hnsw_rs into the user-facing metric.
    ///
    /// hnsw_rs `DistL2.eval()` returns actual L2 distance (not squared):
    ///   dist = sqrt(sum((a_i - b_i)^2))
    fn transform_distance(&self, dist: f32) -> f64 {
        match self.config.metric {
            DistanceMetric::Euclidean => dist as f64,
            DistanceMetric::Cosine => {
                // Vectors are pre-normalized to unit length before insertion.
                // For unit vectors: L2^2 = |a-b|^2 = 2(1 - cos(θ))
                // Therefore: cosine_distance = 1 - cos(θ) = L2^2 / 2 = dist^2 / 2
                (dist * dist / 2.0) as f64
            }
            DistanceMetric::DotProduct => {
                // For unit vectors: dot(a,b) = cos(θ) = 1 - L2^2/2 = 1 - dist^2/2
                // Negate so lower = more similar (consistent with distance semantics)
                -(1.0 - dist * dist / 2.0) as f64
            }
            DistanceMetric::Manhattan => {
                // Manhattan distance is recomputed from stored vectors in search(),
                // so this branch is only a fallback (should not be reached).
                dist as f64
            }
        }
    }

    /// Compute actual L1 (Manhattan) distance between two vectors.
    fn manhattan_distance(a: &[f32], b: &[f32]) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (*x as f64 - *y as f64).abs())
            .sum()
    }

    /// Normalize a vector (for cosine similarity)
    fn normalize_vector(vec: &[f32]) -> Vec<f32> {
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 1e-10 {
            vec.iter().map(|x| x / norm).collect()
        } else {
            vec.to_vec()
        }
    }

    /// Prepare vector for insertion based on metric
    fn prepare_vector(&self, vec: &[f32]) -> Vec<f32> {
        match self.config.metric {
            DistanceMetric::Cosine | DistanceMetric::DotProduct => Self::normalize_vector(vec),
            _ => vec.to_vec(),
        }
    }
}

impl Index for HnswIndex {
    fn search(&self, query: &[f32], k: usize, ef: Option<usize>) -> Vec<(TupleId, f64)> {
        let inner_guard = self.inner.read();
        let inner = match &*inner_guard {
            Some(h) => h,
            None => return Vec::new(),
        };

        let ef_search = self.get_ef_search(ef);
        let is_manhattan = matches!(self.config.metric, DistanceMetric::Manhattan);

        // Prepare query vector
        let prepared_query = self.prepare_vector(query);

        // For Manhattan, request more candidates since L2 ordering != L1 ordering.
        // Reranking from a larger candidate set improves recall.
        let search_k = if is_manhattan { k * 4 } else { k };
        let raw_results = inner.hnsw.search(&prepared_query, search_k, ef_search);

        // Map internal indices to tuple IDs using the stored mapping
        let mut results: Vec<(TupleId, f64)> = if is_manhattan {
            // Recompute actual L1 distance from stored vectors
            let vectors = self.vectors.read();
            raw_results
                .into_iter()
                .filter_map(|neighbour| {
                    let internal_idx = neighbour.d_id;
                    if internal_idx < inner.index_to_tuple_id.len() {
                        let tuple_id = inner.index_to_tuple_id[internal_idx];
                        // Find the stored vector for this tuple_id
                        if let Some((_, stored_vec)) =
                            vectors.iter().find(|(id, _)| *id == tuple_id)
                        {
                            let dist = Self::manhattan_distance(&prepared_query, stored_vec);
                            Some((tuple_id, dist))
                        } else {
                            None
                        }
                    } else {
                        None
                    }
                })
                .collect()
        } else {
            raw_results
                .into_iter()
                .filter_map(|neighbour| {
                    let internal_idx = neighbour.d_id;
                    if internal_idx < inner.index_to_tuple_id.len() {
                        let tuple_id = inner.index_to_tuple_id[internal_idx];
                        let dist = self.transform_distance(neighbour.distance);
                        Some((tuple_id, dist))
                    } else {
                        None
                    }
                })
                .collect()
        };

        // Sort by distance and take top-k (important for Manhattan reranking)
        results.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        results
    }

    fn insert(&mut self, id: TupleId, vector: &[f32]) -> Result<(), String> {
        // Reject empty vectors
        if vector.is_empty() {
            return Err("Cannot insert empty vector into HNSW index".to_string());
        }

        // Reject zero-norm vectors for metrics that require normalization
        if matches!(
            self.config.metric,
            DistanceMetric::Cosine | DistanceMetric::DotProduct
        ) {
            let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm <= 1e-10 {
                return Err(
                    "Cannot insert zero-norm vector for cosine/dot product metric".to_string(),
                );
            }
        }

        // Track dimension
        {
            let mut dim = self.dimension.write();
            if *dim == 0 {
                *dim = vector.len();
            } else if *dim != vector.len() {
                return Err(format!(
                    "Dimension mismatch: index has dimension {}, got vector of dimension {}",
                    *dim,
                    vector.len()
                ));
            }
        }

        // Check for duplicate ID and update in place if found
        {
            let mut vectors = self.vectors.write();
            if let Some(pos) = vectors
                .iter()
                .position(|(existing_id, _)| *existing_id == id)
            {
                let prepared = self.prepare_vector(vector);
                vectors[pos] = (id, prepared);
            } else {
                let prepared = self.prepare_vector(vector);
                vectors.push((id, prepared));
            }
        }

        // Rebuild HNSW structure
        // Note: For better performance, we could batch inserts and rebuild less frequently
        self.rebuild_hnsw()?;

        Ok(())
    }

    fn insert_batch(&mut self, entries: &[(TupleId, Vec<f32>)]) -> Result<(), String> {
        for (id, vector) in entries {
            if vector.is_empty() {
                return Err("Cannot insert empty vector into HNSW index".to_string());
            }
            if matches!(
                self.config.metric,
                DistanceMetric::Cosine | DistanceMetric::DotProduct
            ) {
                let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm <= 1e-10 {
                    return Err(
                        "Cannot insert zero-norm vector for cosine/dot product metric".to_string(),
                    );
                }
            }
            {
                let mut dim = self.dimension.write();
                if *dim == 0 {
                    *dim = vector.len();
                } else if *dim != vector.len() {
                    return Err(format!(
                        "Dimension mismatch: index has dimension {}, got vector of dimension {}",
                        *dim,
                        vector.len()
                    ));
                }
            }
            {
                let mut vectors = self.vectors.write();
                if let Some(pos) = vectors
                    .iter()
                    .position(|(existing_id, _)| *existing_id == *id)
                {
                    let prepared = self.prepare_vector(vector);
                    vectors[pos] = (*id, prepared);
                } else {
                    let prepared = self.prepare_vector(vector);
                    vectors.push((*id, prepared));
                }
            }
        }
        // Single rebuild after all inserts (key optimization)
        self.rebuild_hnsw()
    }

    fn delete(&mut self, id: TupleId) {
        self.tombstones.write().insert(id);

        // Auto-compact when tombstone ratio exceeds 30% (#49)
        if self.tombstone_ratio() > 0.3 {
            let active: Vec<(TupleId, Vec<f32>)> = {
                let vectors = self.vectors.read();
                let tombstones = self.tombstones.read();
                vectors
                    .iter()
                    .filter(|(id, _)| !tombstones.contains(id))
                    .cloned()
                    .collect()
            };
            let _ = self.rebuild(&active);
        }
    }

    fn tombstone_ratio(&self) -> f64 {
        let vectors = self.vectors.read();
        let tombstones = self.tombstones.read();

        if vectors.is_empty() {
            0.0
        } else {
            tombstones.len() as f64 / vectors.len() as f64
        }
    }

    fn rebuild(&mut self, vectors: &[(TupleId, Vec<f32>)]) -> Result<(), String> {
        // Clear state
        self.tombstones.write().clear();
        *self.inner.write() = None;

        // Reset dimension
        if let Some((_, vec)) = vectors.first() {
            *self.dimension.write() = vec.len();
        } else {
            *self.dimension.write() = 0;
            self.vectors.write().clear();
            return Ok(());
        }

        // Prepare and store vectors
        {
            let mut stored = self.vectors.write();
            stored.clear();
            for (id, vec) in vectors {
                let prepared = self.prepare_vector(vec);
                stored.push((*id, prepared));
            }
        }

        // Rebuild HNSW
        self.rebuild_hnsw()
    }

    fn len(&self) -> usize {
        self.vectors.read().len()
    }

    fn index_type(&self) -> &'static str {
        "hnsw"
    }

    fn metric(&self) -> DistanceMetric {
        self.config.metric
    }

    fn tombstone_count(&self) -> usize {
        self.tombstones.read().len()
    }

    fn dimension(&self) -> usize {
        *self.dimension.read()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// Safety: HnswIndex uses RwLock internally for thread safety
unsafe impl Send for HnswIndex {}
unsafe impl Sync for HnswIndex {}

// ── Index Persistence ──────────────────────────────────────────────────────

/// Serializable representation of an HNSW index for persistence.
/// The HNSW graph topology is NOT saved — it's rebuilt from vectors on load.
#[derive(Serialize, Deserialize)]
struct PersistedHnswIndex {
    /// Index configuration
    m: usize,
    ef_construction: usize,
    ef_search: usize,
    metric: String,
    /// Vector dimension
    dimension: usize,
    /// All stored vectors (including tombstoned)
    vectors: Vec<(TupleId, Vec<f32>)>,
    /// Tombstoned (deleted) IDs
    tombstones: Vec<TupleId>,
}

impl HnswIndex {
    /// Save the index state to a directory.
    /// Creates `{dir}/index.json` containing config, vectors, and tombstones.
    /// The HNSW graph is reconstructed on load from the persisted vectors.
    pub fn save(&self, dir: &Path) -> Result<(), String> {
        std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create index dir: {e}"))?;

        let persisted = PersistedHnswIndex {
            m: self.config.m,
            ef_construction: self.config.ef_construction,
            ef_search: self.config.ef_search,
            metric: format!("{:?}", self.config.metric).to_lowercase(),
            dimension: *self.dimension.read(),
            vectors: self.vectors.read().clone(),
            tombstones: self.tombstones.read().iter().copied().collect(),
        };

        let json = serde_json::to_string(&persisted)
            .map_err(|e| format!("Failed to serialize index: {e}"))?;

        // Atomic write: write to temp then rename
        let tmp_path = dir.join("index.json.tmp");
        let final_path = dir.join("index.json");

        std::fs::write(&tmp_path, &json).map_err(|e| format!("Failed to write index file: {e}"))?;
        std::fs::rename(&tmp_path, &final_path)
            .map_err(|e| format!("Failed to finalize index file: {e}"))?;

        tracing::debug!(
            vectors = persisted.vectors.len(),
            tombstones = persisted.tombstones.len(),
            dim = persisted.dimension,
            "hnsw_index_saved"
        );

        Ok(())
    }

    /// Load an index from a directory.
    /// Reads `{dir}/index.json` and rebuilds the HNSW graph from persisted vectors.
    pub fn load(dir: &Path) -> Result<Self, String> {
        let path = dir.join("index.json");
        let json =
            std::fs::read_to_string(&path).map_err(|e| format!("Failed to read index: {e}"))?;

        let persisted: PersistedHnswIndex =
            serde_json::from_str(&json).map_err(|e| format!("Failed to parse index: {e}"))?;

        let metric = match persisted.metric.as_str() {
            "euclidean" => DistanceMetric::Euclidean,
            "cosine" => DistanceMetric::Cosine,
            "dotproduct" | "dot_product" => DistanceMetric::DotProduct,
            "manhattan" => DistanceMetric::Manhattan,
            other => return Err(format!("Unknown distance metric: {other}")),
        };

        let config = HnswConfig {
            m: persisted.m,
            ef_construction: persisted.ef_construction,
            ef_search: persisted.ef_search,
            metric,
        };

        let index = Self {
            inner: RwLock::new(None),
            config,
            tombstones: RwLock::new(persisted.tombstones.into_iter().collect()),
            vectors: RwLock::new(persisted.vectors),
            dimension: RwLock::new(persisted.dimension),
        };

        // Rebuild the HNSW graph from persisted vectors
        index.rebuild_hnsw()?;

        tracing::debug!(
            vectors = index.vectors.read().len(),
            tombstones = index.tombstones.read().len(),
            dim = persisted.dimension,
            "hnsw_index_loaded"
        );

        Ok(index)
    }

    /// Check if a persisted index exists at the given directory.
    pub fn persisted_exists(dir: &Path) -> bool {
        dir.join("index.json").exists()
    }

    /// Get the index configuration (for saving with registered index metadata).
    pub fn config(&self) -> &HnswConfig {
        &self.config
    }
}
