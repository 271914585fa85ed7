//! Post-Processor: cap the ordered track sequence, then optionally shuffle it.

use crate::m3u::Playlist;
use playsift_core::TrackKey;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessor {
    /// 0 keeps every track
    pub max_tracks: usize,
    pub shuffle: bool,
    /// Fixed seed for reproducible shuffles; `None` draws from the thread RNG
    pub seed: Option<u64>,
}

impl PostProcessor {
    pub fn new(max_tracks: usize, shuffle: bool) -> Self {
        Self {
            max_tracks,
            shuffle,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Truncate to `max_tracks`, then shuffle what is left.
    ///
    /// The shuffle only ever sees the capped prefix, so a shuffled playlist
    /// always holds the top-ranked tracks.
    pub fn finalize(&self, mut keys: Vec<TrackKey>) -> Playlist {
        let input = keys.len();
        if self.max_tracks > 0 {
            keys.truncate(self.max_tracks);
        }

        if self.shuffle {
            match self.seed {
                Some(seed) => keys.shuffle(&mut StdRng::seed_from_u64(seed)),
                None => keys.shuffle(&mut rand::rng()),
            }
        }

        debug!(
            "Post-processed {} tracks into {} (max {}, shuffle {})",
            input,
            keys.len(),
            self.max_tracks,
            self.shuffle
        );
        Playlist::new(keys)
    }
}
