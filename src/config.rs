//! Data file locations and playlist naming.
//!
//! The defaults mirror the layout produced by the feature extraction scripts:
//! tables under `data/`, classifier metadata under `metadata/` and playlists
//! written to `playlists/`.

use anyhow::{bail, Context, Result};
use playsift_core::{
    known_dimension, EmbeddingSpace, EmbeddingStore, FeatureStore, Field, Predicate,
    StyleVocabulary,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_FEATURES_PATH: &str = "data/features.csv";
pub const DEFAULT_VOCABULARY_PATH: &str = "metadata/discogs-effnet-bs64-1.json";
pub const DEFAULT_PLAYLIST_DIR: &str = "playlists";
pub const DEFAULT_EMBEDDINGS: [(&str, &str); 2] = [
    ("discogs", "data/discogs_effnet_embeddings.csv"),
    ("musicnn", "data/musicnn_embeddings.csv"),
];

/// One embedding space to load, given on the command line as `NAME=PATH`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingSource {
    pub name: String,
    pub path: PathBuf,
}

impl EmbeddingSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Dimension enforced at load time, for the spaces we know
    pub fn expected_dim(&self) -> Option<usize> {
        known_dimension(&self.name)
    }
}

impl FromStr for EmbeddingSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
                Ok(EmbeddingSource::new(name.trim(), path.trim()))
            }
            _ => Err(format!("expected NAME=PATH, got '{}'", s)),
        }
    }
}

/// Resolved data locations, passed to every command
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub features: PathBuf,
    pub vocabulary: PathBuf,
    pub embeddings: Vec<EmbeddingSource>,
    pub playlist_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            features: PathBuf::from(DEFAULT_FEATURES_PATH),
            vocabulary: PathBuf::from(DEFAULT_VOCABULARY_PATH),
            embeddings: default_embeddings(),
            playlist_dir: PathBuf::from(DEFAULT_PLAYLIST_DIR),
        }
    }
}

pub fn default_embeddings() -> Vec<EmbeddingSource> {
    DEFAULT_EMBEDDINGS
        .iter()
        .map(|(name, path)| EmbeddingSource::new(*name, *path))
        .collect()
}

impl DataConfig {
    /// Build a config from command line values. An empty embedding list
    /// selects the default spaces.
    pub fn resolve(
        features: Option<PathBuf>,
        vocabulary: Option<PathBuf>,
        embeddings: Vec<EmbeddingSource>,
        playlist_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let defaults = Self::default();

        let embeddings = if embeddings.is_empty() {
            defaults.embeddings
        } else {
            embeddings
        };
        for (i, source) in embeddings.iter().enumerate() {
            if embeddings[..i].iter().any(|s| s.name == source.name) {
                bail!("Embedding space '{}' is configured more than once", source.name);
            }
        }

        Ok(Self {
            features: features.unwrap_or(defaults.features),
            vocabulary: vocabulary.unwrap_or(defaults.vocabulary),
            embeddings,
            playlist_dir: playlist_dir.unwrap_or(defaults.playlist_dir),
        })
    }

    pub fn load_vocabulary(&self) -> Result<Arc<StyleVocabulary>> {
        let vocabulary = StyleVocabulary::load(&self.vocabulary)
            .with_context(|| format!("Failed to load style vocabulary {:?}", self.vocabulary))?;
        Ok(Arc::new(vocabulary))
    }

    pub fn load_feature_store(&self) -> Result<FeatureStore> {
        let vocabulary = self.load_vocabulary()?;
        FeatureStore::load(&self.features, vocabulary)
            .with_context(|| format!("Failed to load feature table {:?}", self.features))
    }

    pub fn load_embedding_store(&self) -> Result<EmbeddingStore> {
        let mut store = EmbeddingStore::new();
        for source in &self.embeddings {
            let space = EmbeddingSpace::load(&source.name, &source.path, source.expected_dim())
                .with_context(|| {
                    format!(
                        "Failed to load embedding space '{}' from {:?}",
                        source.name, source.path
                    )
                })?;
            store.insert(space)?;
        }
        info!("Loaded {} embedding spaces", store.len());
        Ok(store)
    }

    /// `<playlist_dir>/<label>_playlist.m3u8`
    pub fn feature_playlist_path(&self, label: &str) -> PathBuf {
        self.playlist_dir.join(format!("{}_playlist.m3u8", label))
    }

    /// `<playlist_dir>/<space>_playlist.m3u`
    pub fn similarity_playlist_path(&self, space: &str) -> PathBuf {
        self.playlist_dir.join(format!("{}_playlist.m3u", space))
    }
}

/// Playlist label describing what a query selects on.
///
/// A query on a single concern gets that concern's name (`genre`, `tempo`,
/// `arousal_valence`, `Voice`, `C_major_Temperley`, ...); anything else is
/// `features`.
pub fn playlist_label(predicates: &[Predicate]) -> String {
    let mut labels: Vec<String> = Vec::new();
    for predicate in predicates {
        let label = match predicate {
            Predicate::KeyScale {
                profile,
                pitch,
                scale,
            } => format!("{}_{}_{}", pitch, scale, profile.name()),
            Predicate::OneOf {
                field: Field::InstrumentalOrVoice,
                allowed,
            } if allowed.len() == 1 => allowed[0].clone(),
            other => match other.field() {
                Field::Style(_) => "genre".to_string(),
                Field::Arousal | Field::Valence => "arousal_valence".to_string(),
                Field::InstrumentalOrVoice => "instrumental_voice".to_string(),
                field => field.to_string(),
            },
        };
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    match labels.as_slice() {
        [single] => sanitize(single),
        _ => "features".to_string(),
    }
}

/// Keep labels usable as file names (`C#` and friends)
fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}
