//! Configuration for the file access server.
//!
//! Use [`ConfigBuilder`] to adjust the defaults, or [`Config::from_json`] to
//! load them from a settings file. The resulting [`Config`] is handed to
//! [`FileAccessServer::builder`](crate::FileAccessServer::builder); there is
//! no process-wide configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Extensions skipped by default.
///
/// Opens of dynamic code are left alone so on-demand code loading never
/// re-enters the server.
pub const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &["dll"];

/// Runtime configuration for the file access server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File extensions (without the dot) never offered to emulators.
    /// Matched case-insensitively.
    pub excluded_extensions: Vec<String>,

    /// Log every size override at info level.
    pub log_size_overrides: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            excluded_extensions: DEFAULT_EXCLUDED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            log_size_overrides: true,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use file_emulation::config::Config;
    ///
    /// let config = Config::from_json(r#"{ "excluded_extensions": ["dll", "exe"] }"#).unwrap();
    /// assert!(config.is_excluded(std::path::Path::new("game.EXE")));
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check if the file name of `path` ends with `.` plus an excluded
    /// extension (ASCII case-insensitive). Dot-files such as `.dll` count.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.as_encoded_bytes();
        self.excluded_extensions.iter().any(|excluded| {
            let ext = excluded.trim_start_matches('.').as_bytes();
            if ext.is_empty() || name.len() <= ext.len() {
                return false;
            }
            let (stem, tail) = name.split_at(name.len() - ext.len());
            stem.ends_with(b".") && tail.eq_ignore_ascii_case(ext)
        })
    }
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    excluded_extensions: Option<Vec<String>>,
    log_size_overrides: Option<bool>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extension to the exclusion list.
    ///
    /// Default: `["dll"]`
    pub fn exclude_extension(mut self, ext: impl Into<String>) -> Self {
        self.excluded_extensions
            .get_or_insert_with(|| Config::default().excluded_extensions)
            .push(ext.into());
        self
    }

    /// Replace the exclusion list. An empty list offers every file.
    pub fn excluded_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_extensions = Some(exts.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable info-level logging of size overrides.
    ///
    /// Default: `true`
    pub fn log_size_overrides(mut self, enabled: bool) -> Self {
        self.log_size_overrides = Some(enabled);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Config {
        let defaults = Config::default();
        Config {
            excluded_extensions: self
                .excluded_extensions
                .unwrap_or(defaults.excluded_extensions),
            log_size_overrides: self.log_size_overrides.unwrap_or(defaults.log_size_overrides),
        }
    }
}
