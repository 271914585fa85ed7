//! # playsift
//!
//! Track selection, ranking and similarity retrieval over music feature
//! tables.
//!
//! playsift reads a per-track feature table (tempo, key estimates, loudness,
//! danceability, arousal/valence, instrumental/voice and style activations)
//! plus one or more embedding tables, and builds playlists from them:
//!
//! - filter tracks by feature ranges and labels
//! - rank the survivors by a field or by a product of style activations
//! - cap and optionally shuffle, then write an M3U playlist
//! - find the nearest neighbours of a track in an embedding space
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! playsift filter --tempo 120..130 --rank tempo:desc --max-tracks 20
//! playsift filter --style "Electronic---House" --rank-style "Electronic---House"
//! playsift similar --track "my_song.mp3"
//! playsift stats
//! ```
//!
//! ### As a library
//!
//! ```rust,no_run
//! use playsift::prelude::*;
//! use std::sync::Arc;
//!
//! let vocab = Arc::new(StyleVocabulary::load("metadata/discogs-effnet-bs64-1.json").unwrap());
//! let store = FeatureStore::load("data/features.csv", vocab).unwrap();
//!
//! let hits = filter(&store, &[Predicate::range(Field::Danceability, 0.8, 1.0)]).unwrap();
//! let by_tempo = RankingSpec::by_field(Field::Tempo, SortOrder::Descending);
//! let ranked = rank(&hits, &store, Some(&by_tempo)).unwrap();
//!
//! let keys = ranked.into_iter().map(|t| t.key).collect();
//! let playlist = PostProcessor::new(25, true).finalize(keys);
//! playlist.write_to("playlists/danceability_playlist.m3u8").unwrap();
//! ```
//!
//! ## Crate Structure
//!
//! - `playsift-core` - Feature and embedding stores, query, ranking and similarity engines
//! - `playsift-playlist` - Post-processing (cap, shuffle) and M3U output

pub mod config;

// Re-export core types
pub use playsift_core::{
    filter, nearest_neighbors, rank, refine, EmbeddingSpace, EmbeddingStore, Error,
    FeatureRow, FeatureStore, Field, InstrumentalOrVoice, KeyProfile, KeyScale, Neighbor,
    Predicate, RankedTrack, RankingSpec, Result, ResultSet, Scale, SortOrder, StyleVocabulary,
    TrackKey, Vector,
};

// Re-export playlist output
pub use playsift_playlist::{finalize_to, Playlist, PostProcessor};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        filter, finalize_to, nearest_neighbors, rank, refine, EmbeddingSpace, EmbeddingStore,
        Error, FeatureRow, FeatureStore, Field, InstrumentalOrVoice, KeyProfile, KeyScale,
        Neighbor, Playlist, PostProcessor, Predicate, RankedTrack, RankingSpec, Result,
        ResultSet, Scale, SortOrder, StyleVocabulary, TrackKey, Vector,
    };
}

/// Collection statistics
pub mod stats {
    pub use playsift_core::stats::{describe, Count, Summary};
}
