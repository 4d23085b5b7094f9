//! Track references.
//!
//! A [`Track`] is the atomic element of every playlist: an opaque identifier
//! that is either a filesystem path or a URI. Two tracks are the same track
//! exactly when their identifiers are equal.
//!
//! Identifiers are kept as raw OS strings, so entries that are not valid
//! UTF-8 (Latin-1 playlists, odd file names) survive a load and write
//! unchanged.

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;

/// An opaque reference to a media track (file path or URI).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Track(OsString);

impl Track {
    /// Creates a track reference from its identifier.
    pub fn new(id: impl Into<OsString>) -> Self {
        Self(id.into())
    }

    /// Creates a track from the raw bytes of a playlist entry.
    ///
    /// On Unix the bytes are kept as they are. Elsewhere they are decoded as
    /// UTF-8, falling back to Latin-1.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes_to_os_string(bytes))
    }

    /// Raw identifier.
    pub fn as_os_str(&self) -> &OsStr {
        &self.0
    }

    /// The identifier as text, with invalid sequences replaced.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        self.0.to_string_lossy()
    }

    /// The identifier as bytes, for writing it back out.
    pub fn as_bytes(&self) -> Cow<'_, [u8]> {
        os_str_to_bytes(&self.0)
    }

    /// Returns true if the identifier looks like a URI (`scheme://...`).
    pub fn is_uri(&self) -> bool {
        let id = self.to_string_lossy();
        match id.find("://") {
            Some(idx) if idx > 0 => id[..idx]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
            _ => false,
        }
    }

    /// Returns the identifier as a filesystem path.
    pub fn path(&self) -> &Path {
        Path::new(&self.0)
    }
}

#[cfg(unix)]
fn bytes_to_os_string(bytes: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStrExt;
    OsStr::from_bytes(bytes).to_os_string()
}

#[cfg(not(unix))]
fn bytes_to_os_string(bytes: &[u8]) -> OsString {
    match std::str::from_utf8(bytes) {
        Ok(text) => OsString::from(text),
        Err(_) => OsString::from(bytes.iter().map(|&b| char::from(b)).collect::<String>()),
    }
}

#[cfg(unix)]
fn os_str_to_bytes(id: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(id.as_bytes())
}

#[cfg(not(unix))]
fn os_str_to_bytes(id: &OsStr) -> Cow<'_, [u8]> {
    match id.to_string_lossy() {
        Cow::Borrowed(text) => Cow::Borrowed(text.as_bytes()),
        Cow::Owned(text) => Cow::Owned(text.into_bytes()),
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl From<&str> for Track {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Track {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&Path> for Track {
    fn from(path: &Path) -> Self {
        Self::new(path.as_os_str())
    }
}

impl AsRef<Path> for Track {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}
