//! Flat `KEY=VALUE` file source.
//!
//! Keys are stored lower-cased so lookups are case-insensitive. Later lines
//! overwrite earlier ones with the same normalized key.

use crate::error::{ConfigError, ConfigResult};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parsed representation of an environment file.
#[derive(Clone, Default)]
pub struct ConfigSource {
    /// Lower-cased key to raw value
    entries: HashMap<String, String>,
    /// Path the entries were read from (None for in-memory sources)
    path: Option<PathBuf>,
}

impl ConfigSource {
    /// Load a source from a file.
    ///
    /// A missing file yields an empty source. A file that exists but cannot be
    /// read (permissions, I/O fault, invalid UTF-8) is an error.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("Config file {} not found, using an empty source", path.display());
                return Ok(Self {
                    entries: HashMap::new(),
                    path: Some(path.to_path_buf()),
                });
            }
            Err(source) => {
                return Err(ConfigError::SourceUnreadable {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut source = Self::parse(&content);
        source.path = Some(path.to_path_buf());
        debug!(
            "Loaded {} entries from {}",
            source.entries.len(),
            path.display()
        );
        Ok(source)
    }

    /// Parse file content line by line.
    ///
    /// Lines without `=` and lines starting with `#` are skipped. The value is
    /// everything after the first `=` and may itself contain `=`.
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();
        for line in content.lines() {
            if line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            entries.insert(key.to_lowercase(), value.to_string());
        }

        Self {
            entries,
            path: None,
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Whether the source holds a value for `key` (case-insensitive).
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// Normalized keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path the source was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

// Values are often secrets; only keys are shown.
impl std::fmt::Debug for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSource")
            .field("path", &self.path)
            .field("keys", &self.keys())
            .finish()
    }
}
