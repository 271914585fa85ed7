//! Embedding Store
//!
//! Named embedding spaces, each mapping track keys to fixed-dimension
//! vectors. Each table row is `key, v_0, ..., v_{d-1}` with no header.
//! Norms are computed once at load; a space remembers its first all-zero
//! row so similarity queries can reject it without rescanning.

use crate::table;
use crate::track::TrackKey;
use crate::vector::Vector;
use crate::{Error, Result};
use ahash::AHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Dimension of the embedding spaces produced by the feature extractor
pub fn known_dimension(name: &str) -> Option<usize> {
    match name {
        "discogs" => Some(1280),
        "musicnn" => Some(200),
        _ => None,
    }
}

#[derive(Debug)]
pub struct EmbeddingSpace {
    name: String,
    dim: usize,
    keys: Vec<TrackKey>,
    vectors: Vec<Vector>,
    norms: Vec<f64>,
    index: AHashMap<TrackKey, usize>,
    first_degenerate: Option<usize>,
}

impl EmbeddingSpace {
    /// Build a space from `(key, vector)` entries in order.
    ///
    /// All vectors must share one dimension and keys must be unique.
    pub fn new<I>(name: impl Into<String>, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (TrackKey, Vector)>,
    {
        let name = name.into();
        let mut dim = None;
        let mut keys = Vec::new();
        let mut vectors = Vec::new();
        let mut norms = Vec::new();
        let mut index = AHashMap::new();
        let mut first_degenerate = None;

        for (key, vector) in entries {
            let expected = *dim.get_or_insert(vector.dim());
            if vector.dim() != expected {
                return Err(Error::schema(format!(
                    "embedding space '{}': track '{}' has dimension {}, expected {}",
                    name,
                    key,
                    vector.dim(),
                    expected
                )));
            }
            let pos = keys.len();
            if index.insert(key.clone(), pos).is_some() {
                return Err(Error::schema(format!(
                    "embedding space '{}': track '{}' appears more than once",
                    name, key
                )));
            }
            if first_degenerate.is_none() && vector.is_zero() {
                first_degenerate = Some(pos);
            }
            norms.push(vector.norm());
            keys.push(key);
            vectors.push(vector);
        }

        if let Some(pos) = first_degenerate {
            warn!(
                "Embedding space '{}' contains an all-zero vector for '{}'; similarity queries will fail",
                name, keys[pos]
            );
        }

        Ok(Self {
            name,
            dim: dim.unwrap_or(0),
            keys,
            vectors,
            norms,
            index,
            first_degenerate,
        })
    }

    /// Read a space from a table. When `expected_dim` is set every row
    /// must carry exactly that many values.
    pub fn from_reader<R: BufRead>(
        name: impl Into<String>,
        reader: R,
        source_name: &str,
        expected_dim: Option<usize>,
    ) -> Result<Self> {
        let records = table::read_records(reader, source_name)?;
        let mut entries = Vec::with_capacity(records.len());

        for record in records {
            let (key, values) = match record.fields.split_first() {
                Some((key, values)) if !key.is_empty() => (key, values),
                _ => return Err(Error::parse(source_name, record.line, "empty track key")),
            };
            if values.is_empty() {
                return Err(Error::schema(format!(
                    "{} line {}: no embedding values for '{}'",
                    source_name, record.line, key
                )));
            }
            if let Some(dim) = expected_dim {
                if values.len() != dim {
                    return Err(Error::schema(format!(
                        "{} line {}: expected {} embedding values, found {}",
                        source_name,
                        record.line,
                        dim,
                        values.len()
                    )));
                }
            }

            let data = values
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let column = format!("dim {}", i);
                    let value = table::parse_float(cell, &column, source_name, record.line)?;
                    let value = value as f32;
                    if !value.is_finite() {
                        return Err(Error::parse(
                            source_name,
                            record.line,
                            format!("dim {}: non-finite embedding value '{}'", i, cell),
                        ));
                    }
                    Ok(value)
                })
                .collect::<Result<Vec<f32>>>()?;

            entries.push((key.clone(), Vector::new(data)));
        }

        Self::new(name, entries)
    }

    pub fn load<P: AsRef<Path>>(
        name: impl Into<String>,
        path: P,
        expected_dim: Option<usize>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let space = Self::from_reader(
            name,
            BufReader::new(file),
            &path.display().to_string(),
            expected_dim,
        )?;
        info!(
            "Loaded embedding space '{}' from {:?}: {} tracks, dim {}",
            space.name,
            path,
            space.len(),
            space.dim
        );
        Ok(space)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vector dimension; 0 for an empty space
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Track keys in load order
    #[inline]
    pub fn keys(&self) -> &[TrackKey] {
        &self.keys
    }

    #[inline]
    pub fn key(&self, idx: usize) -> &str {
        &self.keys[idx]
    }

    #[inline]
    pub fn vector(&self, idx: usize) -> &Vector {
        &self.vectors[idx]
    }

    #[inline]
    pub fn norm(&self, idx: usize) -> f64 {
        self.norms[idx]
    }

    #[inline]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn get(&self, key: &str) -> Option<&Vector> {
        self.position(key).map(|idx| &self.vectors[idx])
    }

    /// Position of the first all-zero vector, if any
    #[inline]
    pub fn first_degenerate(&self) -> Option<usize> {
        self.first_degenerate
    }

    /// Look a track up by exact key, falling back to the first key that
    /// ends with `query` (so a bare file name finds `audio/.../name.mp3`).
    pub fn resolve(&self, query: &str) -> Result<usize> {
        if let Some(idx) = self.position(query) {
            return Ok(idx);
        }
        if !query.is_empty() {
            if let Some(idx) = self.keys.iter().position(|k| k.ends_with(query)) {
                return Ok(idx);
            }
        }
        Err(Error::NotFound(query.to_string()))
    }
}

/// Embedding spaces by name, kept in insertion order
#[derive(Debug, Default)]
pub struct EmbeddingStore {
    spaces: Vec<EmbeddingSpace>,
}

impl EmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, space: EmbeddingSpace) -> Result<()> {
        if self.space(space.name()).is_some() {
            return Err(Error::schema(format!(
                "embedding space '{}' is already loaded",
                space.name()
            )));
        }
        self.spaces.push(space);
        Ok(())
    }

    pub fn space(&self, name: &str) -> Option<&EmbeddingSpace> {
        self.spaces.iter().find(|s| s.name() == name)
    }

    pub fn spaces(&self) -> &[EmbeddingSpace] {
        &self.spaces
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.spaces.iter().map(EmbeddingSpace::name)
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }
}
