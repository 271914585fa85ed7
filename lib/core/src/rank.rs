//! Ranking Engine
//!
//! Orders a result set by a single numeric field or by the product of
//! several style activations. Sorting is stable: rows with equal sort keys
//! keep their input order, so the same query always yields the same playlist.

use crate::field::{Field, ResolvedField};
use crate::track::TrackKey;
use crate::{Error, FeatureStore, ResultSet, Result};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => f.write_str("asc"),
            SortOrder::Descending => f.write_str("desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(Error::schema(format!(
                "unknown sort order '{}' (expected asc or desc)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingSpec {
    /// Stable sort by one numeric field
    ByField { field: Field, order: SortOrder },
    /// Descending by the product of the named style activations
    StyleProduct { styles: Vec<String> },
}

impl RankingSpec {
    pub fn by_field(field: Field, order: SortOrder) -> Self {
        RankingSpec::ByField { field, order }
    }

    pub fn style_product<I, S>(styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RankingSpec::StyleProduct {
            styles: styles.into_iter().map(Into::into).collect(),
        }
    }

    /// Check the ranking against the store schema without touching any row.
    ///
    /// [`rank`] performs the same check; calling this first lets a caller
    /// reject a bad ranking before filtering.
    pub fn validate(&self, store: &FeatureStore) -> Result<()> {
        self.compile(store).map(|_| ())
    }

    fn compile(&self, store: &FeatureStore) -> Result<CompiledRanking> {
        match self {
            RankingSpec::ByField { field, order } => {
                if !field.is_numeric() {
                    return Err(Error::schema(format!(
                        "field '{}' is categorical and cannot be ranked",
                        field
                    )));
                }
                Ok(CompiledRanking {
                    factors: vec![store.resolve(field)?],
                    order: *order,
                })
            }
            RankingSpec::StyleProduct { styles } => {
                if styles.is_empty() {
                    return Err(Error::schema(
                        "style product ranking needs at least one style",
                    ));
                }
                let factors = styles
                    .iter()
                    .map(|name| store.resolve(&Field::Style(name.clone())))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledRanking {
                    factors,
                    order: SortOrder::Descending,
                })
            }
        }
    }
}

impl FromStr for RankingSpec {
    type Err = Error;

    /// Parses `<field>` or `<field>:<asc|desc>`; the order defaults to ascending
    fn from_str(s: &str) -> Result<Self> {
        if let Some((field, order)) = s.rsplit_once(':') {
            if let Ok(order) = order.parse::<SortOrder>() {
                return Ok(RankingSpec::by_field(field.parse()?, order));
            }
        }
        Ok(RankingSpec::by_field(s.parse()?, SortOrder::Ascending))
    }
}

/// A ranked track with the key it was sorted by (`None` when unranked)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTrack {
    pub key: TrackKey,
    pub sort_key: Option<f64>,
}

struct CompiledRanking {
    factors: Vec<ResolvedField>,
    order: SortOrder,
}

impl CompiledRanking {
    fn score(&self, row: &crate::FeatureRow) -> f64 {
        self.factors
            .iter()
            .map(|f| f.numeric(row).unwrap_or(f64::NAN))
            .product()
    }
}

/// Rank a result set.
///
/// Without a ranking the input order is passed through unchanged. NaN sort keys
/// are placed after every number regardless of direction.
pub fn rank(
    results: &ResultSet,
    store: &FeatureStore,
    spec: Option<&RankingSpec>,
) -> Result<Vec<RankedTrack>> {
    let Some(spec) = spec else {
        return Ok(results
            .iter()
            .map(|key| RankedTrack {
                key: key.to_string(),
                sort_key: None,
            })
            .collect());
    };

    let ranking = spec.compile(store)?;

    let mut ranked = results
        .iter()
        .map(|key| {
            let row = store.require(key)?;
            Ok(RankedTrack {
                key: row.key.clone(),
                sort_key: Some(ranking.score(row)),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // slice::sort_by_key is stable
    let value = |t: &RankedTrack| t.sort_key.unwrap_or(f64::NAN);
    match ranking.order {
        SortOrder::Ascending => {
            ranked.sort_by_key(|t| (value(t).is_nan(), OrderedFloat(value(t))))
        }
        SortOrder::Descending => {
            ranked.sort_by_key(|t| (value(t).is_nan(), Reverse(OrderedFloat(value(t)))))
        }
    }

    debug!("Ranked {} tracks by {:?}", ranked.len(), spec);
    Ok(ranked)
}
