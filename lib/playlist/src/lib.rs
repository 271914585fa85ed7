//! # playsift Playlist
//!
//! Turns an ordered track sequence into a playlist: cap, optional shuffle,
//! and atomic M3U output.

pub mod m3u;
pub mod postprocess;

pub use m3u::Playlist;
pub use postprocess::PostProcessor;

use playsift_core::TrackKey;
use std::path::Path;

/// Finalize `keys` and write the result to `path`, returning the playlist
/// for display
pub fn finalize_to<P: AsRef<Path>>(
    processor: &PostProcessor,
    keys: Vec<TrackKey>,
    path: P,
) -> anyhow::Result<Playlist> {
    let playlist = processor.finalize(keys);
    playlist.write_to(path)?;
    Ok(playlist)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_to_writes_capped_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discogs_playlist.m3u");
        let keys = vec!["x.mp3".to_string(), "y.mp3".to_string(), "z.mp3".to_string()];

        let playlist = finalize_to(&PostProcessor::new(2, false), keys, &path).unwrap();
        assert_eq!(playlist.len(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "../x.mp3\n../y.mp3");
    }
}
