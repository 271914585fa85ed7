use crate::track::{FeatureRow, KeyProfile};
use crate::{Error, Result, StyleVocabulary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named field of a [`FeatureRow`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Tempo,
    Loudness,
    Danceability,
    Arousal,
    Valence,
    InstrumentalOrVoice,
    /// Key and scale estimated by one profile
    Key(KeyProfile),
    /// Activation of one style from the vocabulary
    Style(String),
}

impl Field {
    /// The five scalar fields, in table column order
    pub fn scalars() -> [Field; 5] {
        [
            Field::Tempo,
            Field::Loudness,
            Field::Danceability,
            Field::Arousal,
            Field::Valence,
        ]
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Field::InstrumentalOrVoice | Field::Key(_))
    }

    pub fn style(name: impl Into<String>) -> Self {
        Field::Style(name.into())
    }

    /// Check the field against a vocabulary and produce a row accessor
    pub(crate) fn resolve(&self, vocabulary: &StyleVocabulary) -> Result<ResolvedField> {
        Ok(match self {
            Field::Tempo => ResolvedField::Tempo,
            Field::Loudness => ResolvedField::Loudness,
            Field::Danceability => ResolvedField::Danceability,
            Field::Arousal => ResolvedField::Arousal,
            Field::Valence => ResolvedField::Valence,
            Field::InstrumentalOrVoice => ResolvedField::InstrumentalOrVoice,
            Field::Key(profile) => ResolvedField::Key(*profile),
            Field::Style(name) => {
                let idx = vocabulary.index_of(name).ok_or_else(|| {
                    Error::schema(format!("unknown style '{}' (not in the style vocabulary)", name))
                })?;
                ResolvedField::Style(idx)
            }
        })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Tempo => f.write_str("tempo"),
            Field::Loudness => f.write_str("loudness"),
            Field::Danceability => f.write_str("danceability"),
            Field::Arousal => f.write_str("arousal"),
            Field::Valence => f.write_str("valence"),
            Field::InstrumentalOrVoice => f.write_str("instrumental_voice"),
            Field::Key(profile) => write!(f, "key_{}", profile.name().to_ascii_lowercase()),
            Field::Style(name) => write!(f, "style:{}", name),
        }
    }
}

impl FromStr for Field {
    type Err = Error;

    /// Accepts `tempo`, `loudness`, `danceability`, `arousal`, `valence`,
    /// `instrumental_voice`, `key_<profile>` and `style:<name>`.
    fn from_str(s: &str) -> Result<Self> {
        if let Some(name) = s.strip_prefix("style:") {
            if name.is_empty() {
                return Err(Error::schema("empty style name in field 'style:'"));
            }
            return Ok(Field::Style(name.to_string()));
        }

        let lowered = s.trim().to_ascii_lowercase();
        if let Some(profile) = lowered
            .strip_prefix("key_")
            .or_else(|| lowered.strip_prefix("key:"))
        {
            return profile
                .parse::<KeyProfile>()
                .map(Field::Key)
                .map_err(Error::Schema);
        }

        match lowered.as_str() {
            "tempo" | "bpm" => Ok(Field::Tempo),
            "loudness" => Ok(Field::Loudness),
            "danceability" => Ok(Field::Danceability),
            "arousal" => Ok(Field::Arousal),
            "valence" => Ok(Field::Valence),
            "instrumental_voice" | "instrumental/voice" | "voice_instrumental" => {
                Ok(Field::InstrumentalOrVoice)
            }
            _ => Err(Error::schema(format!("unknown field '{}'", s))),
        }
    }
}

/// A field validated against a store, addressing row data directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolvedField {
    Tempo,
    Loudness,
    Danceability,
    Arousal,
    Valence,
    InstrumentalOrVoice,
    Key(KeyProfile),
    Style(usize),
}

impl ResolvedField {
    /// Numeric value of the field, `None` for categorical fields
    #[inline]
    pub(crate) fn numeric(self, row: &FeatureRow) -> Option<f64> {
        match self {
            ResolvedField::Tempo => Some(row.tempo),
            ResolvedField::Loudness => Some(row.loudness),
            ResolvedField::Danceability => Some(row.danceability),
            ResolvedField::Arousal => Some(row.arousal),
            ResolvedField::Valence => Some(row.valence),
            ResolvedField::Style(idx) => row.genre_activations.get(idx).copied(),
            ResolvedField::InstrumentalOrVoice | ResolvedField::Key(_) => None,
        }
    }
}
