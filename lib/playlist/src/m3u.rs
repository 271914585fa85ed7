//! Plain M3U playlist rendering and output.
//!
//! Playlists live one directory below the collection root, so each track key
//! is written relative to the parent directory (`../<key>`). No `#EXTM3U`
//! tags are emitted.

use anyhow::{Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use playsift_core::TrackKey;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Playlist {
    tracks: Vec<TrackKey>,
}

impl Playlist {
    pub fn new(tracks: Vec<TrackKey>) -> Self {
        Self { tracks }
    }

    #[inline]
    pub fn tracks(&self) -> &[TrackKey] {
        &self.tracks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// First `n` tracks, for display
    pub fn preview(&self, n: usize) -> &[TrackKey] {
        &self.tracks[..n.min(self.tracks.len())]
    }

    pub fn into_tracks(self) -> Vec<TrackKey> {
        self.tracks
    }

    /// One path per line, newline separated, no trailing newline
    pub fn text(&self) -> String {
        self.tracks
            .iter()
            .map(|key| playlist_entry(key))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Atomically replace `path` with this playlist.
    ///
    /// The text is written to a temporary file in the target directory and
    /// renamed into place, so a failed write leaves the previous file intact.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create playlist directory {:?}", dir))?;

        let text = self.text();
        AtomicFile::new_with_tmpdir(path, OverwriteBehavior::AllowOverwrite, dir)
            .write(|f| f.write_all(text.as_bytes()))
            .with_context(|| format!("Failed to write playlist {:?}", path))?;

        info!("Wrote {} tracks to {:?}", self.len(), path);
        Ok(())
    }
}

impl From<Vec<TrackKey>> for Playlist {
    fn from(tracks: Vec<TrackKey>) -> Self {
        Playlist::new(tracks)
    }
}

/// `../<key>`; absolute keys are kept as they are
fn playlist_entry(key: &str) -> String {
    Path::new("..").join(key).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(keys: &[&str]) -> Playlist {
        Playlist::new(keys.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_text_relative_paths() {
        let p = playlist(&["audio/a.mp3", "audio/b.mp3"]);
        assert_eq!(p.text(), "../audio/a.mp3\n../audio/b.mp3");
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_key_kept() {
        let p = playlist(&["/music/a.mp3"]);
        assert_eq!(p.text(), "/music/a.mp3");
    }

    #[test]
    fn test_preview() {
        let p = playlist(&["a", "b", "c"]);
        assert_eq!(p.preview(2), &["a".to_string(), "b".to_string()][..]);
        assert_eq!(p.preview(10).len(), 3);
        assert!(p.preview(0).is_empty());
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlists").join("tempo_playlist.m3u8");
        playlist(&["audio/a.mp3", "audio/b.mp3"]).write_to(&path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "../audio/a.mp3\n../audio/b.mp3"
        );
    }

    #[test]
    fn test_write_replaces_previous_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_playlist.m3u8");
        playlist(&["a.mp3", "b.mp3", "c.mp3"]).write_to(&path).unwrap();
        playlist(&["z.mp3"]).write_to(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "../z.mp3");

        // no temporary files left behind
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_write_keeps_previous_playlist() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let playlists = dir.path().join("playlists");
        let path = playlists.join("tempo_playlist.m3u8");
        playlist(&["a.mp3", "b.mp3"]).write_to(&path).unwrap();

        std::fs::set_permissions(&playlists, std::fs::Permissions::from_mode(0o555)).unwrap();
        // permission bits do not bind a privileged user
        let writable = std::fs::File::create(playlists.join("check")).is_ok();
        let result = if writable {
            None
        } else {
            Some(playlist(&["z.mp3"]).write_to(&path))
        };
        std::fs::set_permissions(&playlists, std::fs::Permissions::from_mode(0o755)).unwrap();

        if let Some(result) = result {
            assert!(result.is_err());
            assert_eq!(
                std::fs::read_to_string(&path).unwrap(),
                "../a.mp3\n../b.mp3"
            );
            assert_eq!(std::fs::read_dir(&playlists).unwrap().count(), 1);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_rename_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory cannot be replaced by a file, even by root
        let path = dir.path().join("taken.m3u");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("inside"), "kept").unwrap();

        let err = playlist(&["z.mp3"]).write_to(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("taken.m3u"));
        assert!(path.is_dir());
        assert_eq!(std::fs::read_to_string(path.join("inside")).unwrap(), "kept");
    }

    #[test]
    fn test_write_empty_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.m3u");
        Playlist::default().write_to(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
