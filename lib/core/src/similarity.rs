//! Similarity Engine
//!
//! Cosine nearest neighbours within one embedding space. The default search
//! scores every row; any other strategy can be plugged in behind
//! [`NeighborSearch`] as long as it returns the same ordering.

use crate::embedding_store::EmbeddingSpace;
use crate::track::TrackKey;
use crate::simd::cosine_f64;
use crate::vector::Vector;
use crate::{Error, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub key: TrackKey,
    pub similarity: f32,
}

/// Scores a query vector against a space.
///
/// Returns `(position, similarity)` for every row, sorted by descending
/// similarity with ties in store order.
pub trait NeighborSearch: Send + Sync {
    fn search(&self, space: &EmbeddingSpace, query: &Vector) -> Result<Vec<(usize, f32)>>;
}

/// Exhaustive O(N·D) scan
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSearch;

impl NeighborSearch for ExactSearch {
    fn search(&self, space: &EmbeddingSpace, query: &Vector) -> Result<Vec<(usize, f32)>> {
        if query.dim() != space.dim() {
            return Err(Error::schema(format!(
                "query has dimension {}, embedding space '{}' has {}",
                query.dim(),
                space.name(),
                space.dim()
            )));
        }
        if query.is_zero() {
            return Err(Error::DegenerateVector("<query vector>".to_string()));
        }
        let query_norm = query.norm();
        if let Some(idx) = space.first_degenerate() {
            return Err(Error::DegenerateVector(space.key(idx).to_string()));
        }

        let mut scored: Vec<(usize, f32)> = (0..space.len())
            .into_par_iter()
            .map(|idx| {
                let dot = space.vector(idx).dot(query);
                // both norms are non-zero here
                let sim = cosine_f64(dot, space.norm(idx), query_norm).unwrap_or(0.0);
                (idx, sim as f32)
            })
            .collect();

        // collect() keeps index order, and sort_by is stable
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(scored)
    }
}

/// Nearest neighbours of a stored track using [`ExactSearch`].
///
/// `limit == 0` returns every candidate.
pub fn nearest_neighbors(
    query_key: &str,
    space: &EmbeddingSpace,
    exclude_query: bool,
    limit: usize,
) -> Result<Vec<Neighbor>> {
    nearest_neighbors_with(&ExactSearch, query_key, space, exclude_query, limit)
}

pub fn nearest_neighbors_with(
    search: &dyn NeighborSearch,
    query_key: &str,
    space: &EmbeddingSpace,
    exclude_query: bool,
    limit: usize,
) -> Result<Vec<Neighbor>> {
    let query_idx = space
        .position(query_key)
        .ok_or_else(|| Error::NotFound(query_key.to_string()))?;
    let query = space.vector(query_idx);
    if query.is_zero() {
        return Err(Error::DegenerateVector(query_key.to_string()));
    }

    let scored = search.search(space, query)?;
    let cap = if limit == 0 { usize::MAX } else { limit };

    let neighbors: Vec<Neighbor> = scored
        .into_iter()
        .filter(|(idx, _)| !(exclude_query && *idx == query_idx))
        .take(cap)
        .map(|(idx, similarity)| Neighbor {
            key: space.key(idx).to_string(),
            similarity,
        })
        .collect();

    debug!(
        "Nearest neighbours of '{}' in '{}': {} of {} tracks",
        query_key,
        space.name(),
        neighbors.len(),
        space.len()
    );
    Ok(neighbors)
}
