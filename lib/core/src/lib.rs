//! # playsift Core
//!
//! Core library for the playsift track selection engine.
//!
//! This crate provides the data model and the engines built on it:
//!
//! - [`FeatureStore`] - Keyed per-track features loaded from a feature table
//! - [`StyleVocabulary`] - Ordered style labels aligned with genre activations
//! - [`filter()`] / [`refine()`] - Query Engine, conjunctions of [`Predicate`]s
//! - [`rank()`] - Ranking Engine, by field or by style activation product
//! - [`EmbeddingStore`] - Named embedding spaces
//! - [`nearest_neighbors()`] - Cosine similarity search within a space
//!
//! ## Example
//!
//! ```rust
//! use playsift_core::{
//!     filter, rank, FeatureStore, Field, Predicate, RankingSpec, SortOrder, StyleVocabulary,
//! };
//! use std::io::Cursor;
//! use std::sync::Arc;
//!
//! let vocab = Arc::new(StyleVocabulary::new(vec!["Rock---Punk".into()]).unwrap());
//! let table = "a.mp3,120,C,major,C,major,C,major,-8,Voice,0.7,5,6,0.9\n\
//!              b.mp3,95,A,minor,A,minor,A,minor,-9,Voice,0.4,4,4,0.2\n";
//! let store = FeatureStore::from_reader(Cursor::new(table), vocab, "features.csv").unwrap();
//!
//! let hits = filter(&store, &[Predicate::range(Field::Tempo, 90.0, 130.0)]).unwrap();
//! let ranked = rank(
//!     &hits,
//!     &store,
//!     Some(&RankingSpec::by_field(Field::Tempo, SortOrder::Ascending)),
//! )
//! .unwrap();
//! assert_eq!(ranked[0].key, "b.mp3");
//! ```

pub mod embedding_store;
pub mod error;
pub mod feature_store;
pub mod field;
pub mod filter;
pub mod rank;
pub mod result_set;
pub mod similarity;
pub mod stats;
pub mod table;
pub mod track;
pub mod vector;
pub mod vocabulary;

/// f64-accumulating dot, norm and cosine kernels
pub mod simd;

pub use embedding_store::{known_dimension, EmbeddingSpace, EmbeddingStore};
pub use error::{Error, Result};
pub use feature_store::{FeatureStore, FIXED_COLUMNS};
pub use field::Field;
pub use filter::{filter, refine, Filter, Predicate, Query};
pub use rank::{rank, RankedTrack, RankingSpec, SortOrder};
pub use result_set::ResultSet;
pub use similarity::{
    nearest_neighbors, nearest_neighbors_with, ExactSearch, Neighbor, NeighborSearch,
};
pub use stats::{describe, Count, Summary};
pub use track::{FeatureRow, InstrumentalOrVoice, KeyProfile, KeyScale, Scale, TrackKey};
pub use vector::Vector;
pub use vocabulary::StyleVocabulary;
