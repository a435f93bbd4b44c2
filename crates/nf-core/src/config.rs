//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML and carries the
//! server settings, the list of media collections to scan, and the Jellyfin
//! compatibility knobs. Every section defaults sensibly so an empty file is
//! valid.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(rename = "collections")]
    pub collections: Vec<CollectionConfig>,
    pub jellyfin: JellyfinConfig,
    pub library: LibraryConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.collections.is_empty() {
            warnings.push("no collections configured; the catalog will be empty".into());
        }

        let mut seen = HashSet::new();
        for (i, c) in self.collections.iter().enumerate() {
            if !seen.insert(c.id) {
                warnings.push(format!("collections[{i}].id {} is used more than once", c.id));
            }
            if c.name.is_empty() {
                warnings.push(format!("collections[{i}].name is empty"));
            }
            if !c.directory.is_dir() {
                warnings.push(format!(
                    "collections[{i}].directory {} is not a directory",
                    c.directory.display()
                ));
            }
        }

        let quality = self.jellyfin.image_quality_poster;
        if !(1..=100).contains(&quality) {
            warnings.push(format!(
                "jellyfin.image_quality_poster {quality} is outside 1..=100; posters are served unmodified"
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory for transformed (quality-reduced) images.
    pub cache_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8096,
            cache_dir: None,
        }
    }
}

/// What a collection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Movies,
    Shows,
}

impl CollectionKind {
    /// Jellyfin `CollectionType` value.
    pub fn collection_type(self) -> &'static str {
        match self {
            CollectionKind::Movies => "movies",
            CollectionKind::Shows => "tvshows",
        }
    }
}

/// A directory of media to scan and publish as one library view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    /// Stable small integer; the collection's external id is derived from it.
    pub id: u32,
    pub directory: PathBuf,
}

/// Jellyfin API compatibility settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JellyfinConfig {
    pub server_id: String,
    pub server_name: String,
    /// JPEG quality used when serving posters.
    pub image_quality_poster: u8,
    /// If set, only this user name may log in.
    pub username: Option<String>,
}

impl Default for JellyfinConfig {
    fn default() -> Self {
        Self {
            server_id: "2b11644442754f02a0c1e45d2a9f5c71".into(),
            server_name: "notflix".into(),
            image_quality_poster: 40,
            username: None,
        }
    }
}

/// Catalog scanning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Seconds between background rescans; 0 disables rescanning.
    pub rescan_interval_secs: u64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            rescan_interval_secs: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_valid() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 8096);
        assert!(config.collections.is_empty());
        assert_eq!(config.jellyfin.image_quality_poster, 40);
        assert_eq!(config.library.rescan_interval_secs, 3600);
    }

    #[test]
    fn parses_collections() {
        let config = Config::from_toml_str(
            r#"
            [server]
            port = 9090

            [[collections]]
            name = "Movies"
            type = "movies"
            id = 1
            directory = "/media/movies"

            [[collections]]
            name = "TV Shows"
            type = "shows"
            id = 2
            directory = "/media/tv"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.collections.len(), 2);
        assert_eq!(config.collections[0].kind, CollectionKind::Movies);
        assert_eq!(config.collections[1].kind.collection_type(), "tvshows");
        assert_eq!(config.collections[1].id, 2);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = Config::from_toml_str("[server\nport = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn validate_flags_duplicates_and_quality() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        for name in ["A", "B"] {
            config.collections.push(CollectionConfig {
                name: name.into(),
                kind: CollectionKind::Movies,
                id: 7,
                directory: dir.path().to_path_buf(),
            });
        }
        config.jellyfin.image_quality_poster = 0;

        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("used more than once")));
        assert!(warnings.iter().any(|w| w.contains("image_quality_poster")));
        assert!(!warnings.iter().any(|w| w.contains("not a directory")));
    }
}
