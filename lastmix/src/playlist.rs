//! Reading and writing playlists.
//!
//! A playlist on disk is either an M3U file (one entry per line, `#` lines
//! are comments) or a directory, which stands for every MP3 file below it.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{LastmixError, Result};
use crate::track::Track;

/// File extension picked up when a directory is loaded as a playlist.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Loads the playlist at `path`.
///
/// Directories are walked recursively; anything else is read as M3U.
pub fn load(path: &Path) -> Result<Vec<Track>> {
    let metadata = fs::metadata(path).map_err(|source| LastmixError::PlaylistRead {
        path: path.to_path_buf(),
        source,
    })?;

    let tracks = if metadata.is_dir() {
        load_directory(path)?
    } else {
        let bytes = fs::read(path).map_err(|source| LastmixError::PlaylistRead {
            path: path.to_path_buf(),
            source,
        })?;
        parse_m3u(&bytes)
    };

    info!(path = %path.display(), tracks = tracks.len(), "Loaded playlist");
    Ok(tracks)
}

/// Every MP3 file below `dir`, relative to the current directory, sorted.
///
/// The extension match is case-insensitive. Entries that cannot be read are
/// skipped.
pub fn load_directory(dir: &Path) -> Result<Vec<Track>> {
    let cwd = current_dir(dir)?;
    let mut tracks: Vec<Track> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path()))
        .map(|entry| {
            let absolute = absolutize(entry.path(), &cwd);
            Track::from(relative_path(&absolute, &cwd).as_path())
        })
        .collect();

    tracks.sort();
    Ok(tracks)
}

/// Parses M3U content. Comment lines and blank lines are skipped.
///
/// Entries are taken byte for byte; the content does not have to be UTF-8.
pub fn parse_m3u(content: &[u8]) -> Vec<Track> {
    content
        .split(|&b| b == b'\n')
        .map(<[u8]>::trim_ascii)
        .filter(|line| !line.is_empty() && !line.starts_with(b"#"))
        .map(Track::from_bytes)
        .collect()
}

/// One entry per line, each followed by a newline.
pub fn render(tracks: &[Track]) -> Vec<u8> {
    let mut out = Vec::new();
    for track in tracks {
        out.extend_from_slice(&track.as_bytes());
        out.push(b'\n');
    }
    out
}

/// Rewrites `track` relative to `base_dir`.
///
/// Relative entries are taken to be relative to `cwd`. URIs are returned
/// unchanged.
pub fn relativize(track: &Track, base_dir: &Path, cwd: &Path) -> Track {
    if track.is_uri() {
        return track.clone();
    }
    let target = absolutize(track.path(), cwd);
    let base = absolutize(base_dir, cwd);
    Track::from(relative_path(&target, &base).as_path())
}

/// Rewrites `track` as an absolute, normalized path. URIs are returned
/// unchanged.
pub fn absolute(track: &Track, cwd: &Path) -> Track {
    if track.is_uri() {
        return track.clone();
    }
    Track::from(absolutize(track.path(), cwd).as_path())
}

/// Writes the playlist to `out` and, if given, to `destination`.
///
/// File entries are rewritten relative to `base_dir` when one is given and
/// made absolute otherwise. URIs are written as they are.
pub fn write<W: Write>(
    tracks: &[Track],
    out: &mut W,
    destination: Option<&Path>,
    base_dir: Option<&Path>,
) -> Result<()> {
    let cwd = current_dir(base_dir.unwrap_or_else(|| Path::new(".")))?;
    let tracks: Vec<Track> = match base_dir {
        Some(base) => tracks
            .iter()
            .map(|track| relativize(track, base, &cwd))
            .collect(),
        None => tracks.iter().map(|track| absolute(track, &cwd)).collect(),
    };
    let content = render(&tracks);

    out.write_all(&content)
        .map_err(|source| LastmixError::PlaylistWrite {
            path: PathBuf::from("<stdout>"),
            source,
        })?;

    if let Some(path) = destination {
        fs::write(path, &content).map_err(|source| LastmixError::PlaylistWrite {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), tracks = tracks.len(), "Wrote playlist");
    }

    Ok(())
}

/// [`write`] to standard output.
pub fn write_stdout(
    tracks: &[Track],
    destination: Option<&Path>,
    base_dir: Option<&Path>,
) -> Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write(tracks, &mut lock, destination, base_dir)
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(AUDIO_EXTENSION))
}

fn current_dir(context: &Path) -> Result<PathBuf> {
    std::env::current_dir().map_err(|source| LastmixError::PlaylistRead {
        path: context.to_path_buf(),
        source,
    })
}

/// Joins `path` onto `cwd` if relative and removes `.` and `..` lexically.
fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Path from `base` to `target`. Both must be absolute and normalized.
fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target: Vec<Component<'_>> = target.components().collect();
    let base: Vec<Component<'_>> = base.components().collect();
    let shared = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in shared..base.len() {
        relative.push("..");
    }
    for component in &target[shared..] {
        relative.push(component);
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}
