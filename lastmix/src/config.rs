//! Configuration file support.
//!
//! Settings live in `~/.lastmix/config.ini`:
//!
//! ```ini
//! [lastfm]
//! api_key = 0123456789abcdef
//! timeout = 30
//! attempts = 5
//! pace_every = 100
//! pace_secs = 10
//!
//! [defaults]
//! merge = slide
//! group = artist
//! order = playcount
//! base_dir = /home/me/Music
//!
//! [logging]
//! file = /home/me/.lastmix/lastmix.log
//! ```
//!
//! Every key is optional and a missing file means all defaults. Command line
//! flags take precedence over the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use tracing::debug;

use crate::error::{LastmixError, Result};
use crate::rating::{
    AttemptPolicy, PacingPolicy, DEFAULT_ATTEMPTS, DEFAULT_DEADLINE_SECS, DEFAULT_PACE_EVERY,
    DEFAULT_PACE_SECS,
};

/// Directory name under the home directory.
pub const CONFIG_DIR_NAME: &str = ".lastmix";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Environment variable holding the Last.fm API key.
pub const API_KEY_ENV: &str = "LASTMIX_API_KEY";

/// `~/.lastmix`, if the home directory is known.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME))
}

/// `~/.lastmix/config.ini`, if the home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// The `[lastfm]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastFmSettings {
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub attempts: u32,
    pub pace_every: usize,
    pub pace: Duration,
}

impl Default for LastFmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            attempts: DEFAULT_ATTEMPTS,
            pace_every: DEFAULT_PACE_EVERY,
            pace: Duration::from_secs(DEFAULT_PACE_SECS),
        }
    }
}

impl LastFmSettings {
    pub fn attempt_policy(&self) -> AttemptPolicy {
        AttemptPolicy::new(self.timeout, self.attempts)
    }

    pub fn pacing(&self) -> PacingPolicy {
        PacingPolicy::new(self.pace_every, self.pace)
    }
}

/// The `[defaults]` section: strategy names and output base directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultSettings {
    pub merge: Option<String>,
    pub group: Option<String>,
    pub order: Option<String>,
    pub base_dir: Option<PathBuf>,
}

/// The `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    pub file: Option<PathBuf>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub lastfm: LastFmSettings,
    pub defaults: DefaultSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Loads `~/.lastmix/config.ini`, or defaults if there is none.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads `path`, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)
            .map_err(|e| LastmixError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Loaded configuration file");
        Self::from_ini(&ini)
    }

    /// Parses configuration text.
    pub fn parse(text: &str) -> Result<Self> {
        let ini = Ini::load_from_str(text).map_err(|e| LastmixError::Config(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("lastfm")) {
            let lastfm = &mut config.lastfm;
            lastfm.api_key = text(section.get("api_key"));
            if let Some(secs) = number::<u64>(section.get("timeout"), "lastfm.timeout")? {
                lastfm.timeout = Duration::from_secs(secs);
            }
            if let Some(attempts) = number(section.get("attempts"), "lastfm.attempts")? {
                lastfm.attempts = attempts;
            }
            if let Some(every) = number(section.get("pace_every"), "lastfm.pace_every")? {
                lastfm.pace_every = every;
            }
            if let Some(secs) = number::<u64>(section.get("pace_secs"), "lastfm.pace_secs")? {
                lastfm.pace = Duration::from_secs(secs);
            }
        }

        if let Some(section) = ini.section(Some("defaults")) {
            config.defaults = DefaultSettings {
                merge: text(section.get("merge")),
                group: text(section.get("group")),
                order: text(section.get("order")),
                base_dir: text(section.get("base_dir")).map(PathBuf::from),
            };
        }

        if let Some(section) = ini.section(Some("logging")) {
            config.logging.file = text(section.get("file")).map(PathBuf::from);
        }

        Ok(config)
    }

    /// API key from the command line, the environment, or this file, in
    /// that order.
    pub fn resolve_api_key(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string)
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .and_then(|key| text(Some(key.as_str())))
            .or_else(|| self.lastfm.api_key.clone())
    }
}

/// Trimmed value, `None` when absent or empty.
fn text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn number<T: FromStr>(value: Option<&str>, key: &str) -> Result<Option<T>> {
    match text(value) {
        None => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| {
            LastmixError::Config(format!(
                "{} must be a non-negative integer, got '{}'",
                key, v
            ))
        }),
    }
}
