//! Query Engine
//!
//! Predicates over feature rows, combined as a logical AND. A query is
//! compiled against the store schema before any row is read, so a malformed
//! query fails without producing a partial result.

use crate::field::{Field, ResolvedField};
use crate::track::{FeatureRow, InstrumentalOrVoice, KeyProfile, KeyScale, Scale};
use crate::{Error, FeatureStore, ResultSet, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub trait Filter {
    fn matches(&self, row: &FeatureRow) -> bool;
}

/// A filter on one named field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Keep rows with `lo <= value <= hi`
    Range { field: Field, lo: f64, hi: f64 },
    /// Keep rows whose categorical value is in `allowed`; an empty set keeps everything
    OneOf { field: Field, allowed: Vec<String> },
    /// Keep rows whose key estimate for `profile` is exactly `"<pitch> <scale>"`
    KeyScale {
        profile: KeyProfile,
        pitch: String,
        scale: Scale,
    },
}

impl Predicate {
    pub fn range(field: Field, lo: f64, hi: f64) -> Self {
        Predicate::Range { field, lo, hi }
    }

    pub fn one_of<I, S>(field: Field, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::OneOf {
            field,
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn key_scale(profile: KeyProfile, pitch: impl Into<String>, scale: Scale) -> Self {
        Predicate::KeyScale {
            profile,
            pitch: pitch.into(),
            scale,
        }
    }

    /// The field this predicate reads
    pub fn field(&self) -> Field {
        match self {
            Predicate::Range { field, .. } | Predicate::OneOf { field, .. } => field.clone(),
            Predicate::KeyScale { profile, .. } => Field::Key(*profile),
        }
    }

    fn compile(&self, store: &FeatureStore) -> Result<Condition> {
        match self {
            Predicate::Range { field, lo, hi } => {
                if !field.is_numeric() {
                    return Err(Error::schema(format!(
                        "field '{}' is categorical and cannot take a range predicate",
                        field
                    )));
                }
                if lo.is_nan() || hi.is_nan() || lo > hi {
                    return Err(Error::InvalidRange {
                        field: field.to_string(),
                        lo: *lo,
                        hi: *hi,
                    });
                }
                Ok(Condition::Range {
                    field: store.resolve(field)?,
                    lo: *lo,
                    hi: *hi,
                })
            }
            Predicate::OneOf { field, allowed } => match field {
                Field::InstrumentalOrVoice => {
                    let labels = allowed
                        .iter()
                        .map(|label| label.parse::<InstrumentalOrVoice>())
                        .collect::<std::result::Result<Vec<_>, _>>()
                        .map_err(Error::Schema)?;
                    Ok(Condition::Labels(labels))
                }
                Field::Key(profile) => {
                    let keys = allowed
                        .iter()
                        .map(|value| value.parse::<KeyScale>())
                        .collect::<std::result::Result<Vec<_>, _>>()
                        .map_err(Error::Schema)?;
                    Ok(Condition::Keys {
                        profile: *profile,
                        allowed: keys,
                    })
                }
                numeric => Err(Error::schema(format!(
                    "field '{}' is numeric and cannot take a set-membership predicate",
                    numeric
                ))),
            },
            Predicate::KeyScale {
                profile,
                pitch,
                scale,
            } => {
                let key_scale =
                    KeyScale::from_parts(pitch, &scale.to_string()).map_err(Error::Schema)?;
                Ok(Condition::Keys {
                    profile: *profile,
                    allowed: vec![key_scale],
                })
            }
        }
    }
}

/// A predicate checked against the store schema
#[derive(Debug, Clone)]
enum Condition {
    Range { field: ResolvedField, lo: f64, hi: f64 },
    Labels(Vec<InstrumentalOrVoice>),
    Keys {
        profile: KeyProfile,
        allowed: Vec<KeyScale>,
    },
}

impl Filter for Condition {
    fn matches(&self, row: &FeatureRow) -> bool {
        match self {
            Condition::Range { field, lo, hi } => field
                .numeric(row)
                .map(|value| *lo <= value && value <= *hi)
                .unwrap_or(false),
            Condition::Labels(labels) => {
                labels.is_empty() || labels.contains(&row.instrumental_or_voice)
            }
            Condition::Keys { profile, allowed } => {
                allowed.is_empty() || allowed.contains(row.key_scale(*profile))
            }
        }
    }
}

/// A validated conjunction of predicates
#[derive(Debug, Clone)]
pub struct Query {
    conditions: Vec<Condition>,
}

impl Query {
    /// Validate every predicate against the store before any row is touched
    pub fn compile(store: &FeatureStore, predicates: &[Predicate]) -> Result<Self> {
        let conditions = predicates
            .iter()
            .map(|p| p.compile(store))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { conditions })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl Filter for Query {
    fn matches(&self, row: &FeatureRow) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }
}

/// Filter the whole store. With no predicates every key is returned, in store order.
pub fn filter(store: &FeatureStore, predicates: &[Predicate]) -> Result<ResultSet> {
    let query = Query::compile(store, predicates)?;
    let result: ResultSet = store
        .rows()
        .iter()
        .filter(|row| query.matches(row))
        .map(|row| row.key.clone())
        .collect();

    debug!(
        "Filtered {} tracks with {} predicates: {} kept",
        store.len(),
        query.len(),
        result.len()
    );
    Ok(result)
}

/// Filter an existing result set, preserving its order
pub fn refine(
    store: &FeatureStore,
    input: &ResultSet,
    predicates: &[Predicate],
) -> Result<ResultSet> {
    let query = Query::compile(store, predicates)?;
    let rows = input
        .iter()
        .map(|key| store.require(key))
        .collect::<Result<Vec<_>>>()?;

    let result: ResultSet = rows
        .into_iter()
        .filter(|row| query.matches(row))
        .map(|row| row.key.clone())
        .collect();

    debug!(
        "Refined {} tracks with {} predicates: {} kept",
        input.len(),
        query.len(),
        result.len()
    );
    Ok(result)
}
