use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique track identifier: the audio file path relative to the collection root
pub type TrackKey = String;

/// Key detection profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyProfile {
    Temperley,
    Krumhansl,
    Edma,
}

impl KeyProfile {
    /// All profiles in table column order
    pub const ALL: [KeyProfile; 3] = [
        KeyProfile::Temperley,
        KeyProfile::Krumhansl,
        KeyProfile::Edma,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            KeyProfile::Temperley => 0,
            KeyProfile::Krumhansl => 1,
            KeyProfile::Edma => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            KeyProfile::Temperley => "Temperley",
            KeyProfile::Krumhansl => "Krumhansl",
            KeyProfile::Edma => "Edma",
        }
    }
}

impl fmt::Display for KeyProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperley" => Ok(KeyProfile::Temperley),
            "krumhansl" => Ok(KeyProfile::Krumhansl),
            "edma" => Ok(KeyProfile::Edma),
            other => Err(format!(
                "unknown key profile '{}' (expected temperley, krumhansl or edma)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Major,
    Minor,
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scale::Major => f.write_str("major"),
            Scale::Minor => f.write_str("minor"),
        }
    }
}

impl FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Scale::Major),
            "minor" => Ok(Scale::Minor),
            other => Err(format!("unknown scale '{}' (expected major or minor)", other)),
        }
    }
}

/// Estimated key and scale, rendered as `"<pitch> <scale>"`.
///
/// The pitch class keeps the spelling produced by the extractor; no
/// enharmonic folding is applied, so `D#` and `Eb` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyScale {
    pub pitch: String,
    pub scale: Scale,
}

impl KeyScale {
    pub fn new(pitch: impl Into<String>, scale: Scale) -> Self {
        Self {
            pitch: pitch.into(),
            scale,
        }
    }

    /// Build from separate pitch and scale cells
    pub fn from_parts(pitch: &str, scale: &str) -> Result<Self, String> {
        let pitch = pitch.trim();
        if pitch.is_empty() {
            return Err("empty pitch class".to_string());
        }
        Ok(Self::new(pitch, scale.parse()?))
    }
}

impl fmt::Display for KeyScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.pitch, self.scale)
    }
}

impl FromStr for KeyScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(pitch), Some(scale), None) => KeyScale::from_parts(pitch, scale),
            _ => Err(format!("'{}' is not of the form '<pitch> <major|minor>'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstrumentalOrVoice {
    Instrumental,
    Voice,
}

impl InstrumentalOrVoice {
    pub fn name(self) -> &'static str {
        match self {
            InstrumentalOrVoice::Instrumental => "Instrumental",
            InstrumentalOrVoice::Voice => "Voice",
        }
    }
}

impl fmt::Display for InstrumentalOrVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InstrumentalOrVoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instrumental" => Ok(InstrumentalOrVoice::Instrumental),
            "voice" => Ok(InstrumentalOrVoice::Voice),
            other => Err(format!(
                "unknown instrumental/voice label '{}' (expected Instrumental or Voice)",
                other
            )),
        }
    }
}

/// Per-track scalar features and style activations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub key: TrackKey,
    pub tempo: f64,
    /// Indexed by [`KeyProfile::index`]
    pub key_scales: [KeyScale; 3],
    pub loudness: f64,
    pub instrumental_or_voice: InstrumentalOrVoice,
    pub danceability: f64,
    pub arousal: f64,
    pub valence: f64,
    /// Aligned with the store's style vocabulary
    pub genre_activations: Vec<f64>,
}

impl FeatureRow {
    #[inline]
    pub fn key_scale(&self, profile: KeyProfile) -> &KeyScale {
        &self.key_scales[profile.index()]
    }

    /// Index of the strongest style activation (first one on ties)
    pub fn top_style(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, &value) in self.genre_activations.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((idx, value));
            }
        }
        best.map(|(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_scale_display_and_parse() {
        let ks = KeyScale::from_parts("C#", "Minor").unwrap();
        assert_eq!(ks.to_string(), "C# minor");
        assert_eq!("C# minor".parse::<KeyScale>().unwrap(), ks);
        assert!("C#".parse::<KeyScale>().is_err());
        assert!("C# dorian".parse::<KeyScale>().is_err());
    }

    #[test]
    fn test_no_enharmonic_folding() {
        let sharp: KeyScale = "D# major".parse().unwrap();
        let flat: KeyScale = "Eb major".parse().unwrap();
        assert_ne!(sharp, flat);
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!("EDMA".parse::<KeyProfile>().unwrap(), KeyProfile::Edma);
        assert_eq!(KeyProfile::Krumhansl.index(), 1);
        assert!("shaath".parse::<KeyProfile>().is_err());
    }

    #[test]
    fn test_instrumental_voice_parse() {
        assert_eq!(
            "voice".parse::<InstrumentalOrVoice>().unwrap(),
            InstrumentalOrVoice::Voice
        );
        assert_eq!(InstrumentalOrVoice::Instrumental.to_string(), "Instrumental");
        assert!("choir".parse::<InstrumentalOrVoice>().is_err());
    }

    #[test]
    fn test_top_style_first_on_ties() {
        let row = FeatureRow {
            key: "a.mp3".to_string(),
            tempo: 120.0,
            key_scales: [
                KeyScale::new("C", Scale::Major),
                KeyScale::new("C", Scale::Major),
                KeyScale::new("C", Scale::Major),
            ],
            loudness: -9.0,
            instrumental_or_voice: InstrumentalOrVoice::Voice,
            danceability: 0.5,
            arousal: 5.0,
            valence: 5.0,
            genre_activations: vec![0.1, 0.7, 0.7, 0.2],
        };
        assert_eq!(row.top_style(), Some(1));
    }
}
