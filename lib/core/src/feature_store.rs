//! Feature Store
//!
//! Read-only, keyed access to per-track feature rows. Rows are loaded from a
//! header-less table whose column meaning is positional:
//!
//! ```text
//! key, tempo, key_temperley, scale_temperley, key_krumhansl, scale_krumhansl,
//! key_edma, scale_edma, loudness, instrumental_voice, danceability, arousal,
//! valence, activation_0, ..., activation_{N-1}
//! ```
//!
//! where `N` is the length of the style vocabulary. The load step fails fast
//! when the column count does not match the vocabulary.

use crate::field::{Field, ResolvedField};
use crate::table::{self, Record};
use crate::track::{FeatureRow, InstrumentalOrVoice, KeyScale, TrackKey};
use crate::{Error, Result, StyleVocabulary};
use ahash::AHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Number of columns before the style activations
pub const FIXED_COLUMNS: usize = 13;

#[derive(Debug)]
pub struct FeatureStore {
    vocabulary: Arc<StyleVocabulary>,
    rows: Vec<FeatureRow>,
    index: AHashMap<TrackKey, usize>,
}

impl FeatureStore {
    /// Build a store from rows, checking activation lengths and key uniqueness
    pub fn new(vocabulary: Arc<StyleVocabulary>, rows: Vec<FeatureRow>) -> Result<Self> {
        let mut index = AHashMap::with_capacity(rows.len());
        for (pos, row) in rows.iter().enumerate() {
            if row.genre_activations.len() != vocabulary.len() {
                return Err(Error::schema(format!(
                    "track '{}' has {} style activations, vocabulary has {} classes",
                    row.key,
                    row.genre_activations.len(),
                    vocabulary.len()
                )));
            }
            if index.insert(row.key.clone(), pos).is_some() {
                return Err(Error::schema(format!(
                    "track '{}' appears more than once in the feature table",
                    row.key
                )));
            }
        }

        Ok(Self {
            vocabulary,
            rows,
            index,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P, vocabulary: Arc<StyleVocabulary>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let store = Self::from_reader(
            BufReader::new(file),
            vocabulary,
            &path.display().to_string(),
        )?;
        info!("Loaded feature table from {:?}: {} tracks", path, store.len());
        Ok(store)
    }

    pub fn from_reader<R: BufRead>(
        reader: R,
        vocabulary: Arc<StyleVocabulary>,
        source_name: &str,
    ) -> Result<Self> {
        let records = table::read_records(reader, source_name)?;
        let expected_columns = FIXED_COLUMNS + vocabulary.len();

        let rows = records
            .iter()
            .map(|record| parse_row(record, expected_columns, source_name))
            .collect::<Result<Vec<_>>>()?;

        Self::new(vocabulary, rows)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn vocabulary(&self) -> &StyleVocabulary {
        &self.vocabulary
    }

    /// Rows in store order
    #[inline]
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Track keys in store order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.key.as_str())
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&FeatureRow> {
        self.index.get(key).map(|&pos| &self.rows[pos])
    }

    /// Like [`get`](Self::get) but reports a missing key as `NotFound`
    pub fn require(&self, key: &str) -> Result<&FeatureRow> {
        self.get(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn resolve(&self, field: &Field) -> Result<ResolvedField> {
        field.resolve(&self.vocabulary)
    }
}

fn parse_row(record: &Record, expected_columns: usize, source_name: &str) -> Result<FeatureRow> {
    let fields = &record.fields;
    let line = record.line;

    if fields.len() != expected_columns {
        return Err(Error::schema(format!(
            "{} line {}: expected {} columns ({} fixed + {} style activations), found {}",
            source_name,
            line,
            expected_columns,
            FIXED_COLUMNS,
            expected_columns - FIXED_COLUMNS,
            fields.len()
        )));
    }

    let key = fields[0].clone();
    if key.is_empty() {
        return Err(Error::parse(source_name, line, "empty track key"));
    }

    let float =
        |idx: usize, column: &str| table::parse_float(&fields[idx], column, source_name, line);
    let key_scale = |idx: usize| {
        KeyScale::from_parts(&fields[idx], &fields[idx + 1])
            .map_err(|message| Error::parse(source_name, line, message))
    };

    let instrumental_or_voice = fields[9]
        .parse::<InstrumentalOrVoice>()
        .map_err(|message| Error::parse(source_name, line, message))?;

    let genre_activations = fields[FIXED_COLUMNS..]
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            table::parse_float(cell, &format!("activation {}", i), source_name, line)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureRow {
        key,
        tempo: float(1, "tempo")?,
        key_scales: [key_scale(2)?, key_scale(4)?, key_scale(6)?],
        loudness: float(8, "loudness")?,
        instrumental_or_voice,
        danceability: float(10, "danceability")?,
        arousal: float(11, "arousal")?,
        valence: float(12, "valence")?,
        genre_activations,
    })
}
