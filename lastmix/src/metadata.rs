//! Track tag extraction.
//!
//! Tags are read best-effort: a file that cannot be opened or carries no tag
//! yields empty fields rather than an error. Callers treat an empty artist or
//! title as "unknown".

use std::collections::HashMap;

use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::ItemKey;
use tracing::debug;

use crate::track::Track;

/// Descriptive tags of a track. Missing tags are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub album_artist: String,
}

impl TrackMetadata {
    /// Creates metadata with just an artist and a title.
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// True if both artist and title are known.
    pub fn is_identifiable(&self) -> bool {
        !self.artist.is_empty() && !self.title.is_empty()
    }
}

/// Source of track tags.
///
/// This abstraction lets grouping and ranking run against in-memory tags in
/// tests.
pub trait TagReader: Send + Sync {
    /// Reads the tags of `track`. Never fails; unknown fields are empty.
    fn read(&self, track: &Track) -> TrackMetadata;
}

/// Tag reader backed by `lofty` (ID3, Vorbis comments, MP4 atoms, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

impl LoftyTagReader {
    pub fn new() -> Self {
        Self
    }
}

impl TagReader for LoftyTagReader {
    fn read(&self, track: &Track) -> TrackMetadata {
        if track.is_uri() {
            return TrackMetadata::default();
        }

        let tagged_file = match Probe::open(track.path()).and_then(|p| p.read()) {
            Ok(file) => file,
            Err(e) => {
                debug!(track = %track, error = %e, "Failed to read tags");
                return TrackMetadata::default();
            }
        };

        let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
            debug!(track = %track, "No tags found");
            return TrackMetadata::default();
        };

        let text = |value: Option<std::borrow::Cow<'_, str>>| {
            value.map(|v| v.trim().to_string()).unwrap_or_default()
        };

        TrackMetadata {
            artist: text(tag.artist()),
            title: text(tag.title()),
            album: text(tag.album()),
            album_artist: tag
                .get_string(&ItemKey::AlbumArtist)
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Fixed tag table, keyed by track.
///
/// Useful when tags come from somewhere other than the files themselves, and
/// in tests. Unknown tracks read as empty metadata.
#[derive(Debug, Default, Clone)]
pub struct StaticTagReader {
    tags: HashMap<Track, TrackMetadata>,
}

impl StaticTagReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the tags of a track.
    pub fn with(mut self, track: impl Into<Track>, metadata: TrackMetadata) -> Self {
        self.tags.insert(track.into(), metadata);
        self
    }
}

impl TagReader for StaticTagReader {
    fn read(&self, track: &Track) -> TrackMetadata {
        self.tags.get(track).cloned().unwrap_or_default()
    }
}
