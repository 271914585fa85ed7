//! Collection statistics: numeric summaries and label distributions
//! over a [`FeatureStore`].

use crate::field::Field;
use crate::track::KeyProfile;
use crate::{Error, FeatureStore, Result, StyleVocabulary};
use ahash::AHashMap;
use ordered_float::OrderedFloat;
use serde::Serialize;

/// Summary of a numeric column. NaN values are not counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1); `None` below two values
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    fn empty() -> Self {
        Self {
            count: 0,
            mean: None,
            std: None,
            min: None,
            p25: None,
            p50: None,
            p75: None,
            max: None,
        }
    }
}

pub fn describe(values: &[f64]) -> Summary {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Summary::empty();
    }
    sorted.sort_by_key(|v| OrderedFloat(*v));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    });

    Summary {
        count: n,
        mean: Some(mean),
        std,
        min: sorted.first().copied(),
        p25: Some(quantile(&sorted, 0.25)),
        p50: Some(quantile(&sorted, 0.50)),
        p75: Some(quantile(&sorted, 0.75)),
        max: sorted.last().copied(),
    }
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// A label with the number of tracks carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    pub label: String,
    pub count: usize,
}

/// Most frequent first, then alphabetical
fn sorted_counts(counts: AHashMap<String, usize>) -> Vec<Count> {
    let mut out: Vec<Count> = counts
        .into_iter()
        .map(|(label, count)| Count { label, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    out
}

fn tally<I: IntoIterator<Item = String>>(labels: I) -> Vec<Count> {
    let mut counts: AHashMap<String, usize> = AHashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    sorted_counts(counts)
}

impl FeatureStore {
    /// Summary of one numeric field, style activations included
    pub fn describe_field(&self, field: &Field) -> Result<Summary> {
        if !field.is_numeric() {
            return Err(Error::schema(format!(
                "field '{}' is categorical and has no numeric summary",
                field
            )));
        }
        let resolved = self.resolve(field)?;
        let values: Vec<f64> = self
            .rows()
            .iter()
            .filter_map(|row| resolved.numeric(row))
            .collect();
        Ok(describe(&values))
    }

    /// Summaries of tempo, loudness, danceability, arousal and valence
    pub fn describe_all(&self) -> Result<Vec<(Field, Summary)>> {
        Field::scalars()
            .into_iter()
            .map(|field| {
                let summary = self.describe_field(&field)?;
                Ok((field, summary))
            })
            .collect()
    }

    /// Tracks per arg-max style
    pub fn top_style_counts(&self) -> Vec<Count> {
        let vocab = self.vocabulary();
        tally(self.top_styles().filter_map(|idx| vocab.name(idx).map(str::to_string)))
    }

    /// Tracks per parent genre of their arg-max style
    pub fn parent_genre_counts(&self) -> Vec<Count> {
        let vocab = self.vocabulary();
        tally(self.top_styles().filter_map(|idx| {
            vocab
                .name(idx)
                .map(|name| StyleVocabulary::parent_genre(name).to_string())
        }))
    }

    /// Distribution of `"<pitch> <scale>"` for one key profile
    pub fn key_scale_counts(&self, profile: KeyProfile) -> Vec<Count> {
        tally(
            self.rows()
                .iter()
                .map(|row| row.key_scale(profile).to_string()),
        )
    }

    pub fn instrumental_voice_counts(&self) -> Vec<Count> {
        tally(
            self.rows()
                .iter()
                .map(|row| row.instrumental_or_voice.to_string()),
        )
    }

    fn top_styles(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows().iter().filter_map(|row| row.top_style())
    }
}
