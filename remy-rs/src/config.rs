//! Configuration for notecard caches and the user's defaults.

use crate::error::{RemyError, Result};
use crate::parser::field_value::ValueParser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-cache configuration file.
pub const CACHE_CONFIG_FILE: &str = ".remy.toml";

/// Per-cache configuration, read from `.remy.toml` in the cache root.
///
/// ```toml
/// [fields]
/// TAGS = "tags"
/// PRIORITY = "number"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Value parser by uppercased field name.
    #[serde(default)]
    pub fields: BTreeMap<String, ValueParser>,
}

impl CacheConfig {
    /// Load the configuration for the cache at `root`.
    ///
    /// For a single-file cache the file's directory is searched. A missing
    /// file gives an empty configuration.
    pub fn load(root: &Path) -> Result<Self> {
        let dir = if root.is_dir() {
            root
        } else {
            root.parent().unwrap_or(Path::new("."))
        };
        let path = dir.join(CACHE_CONFIG_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "no cache config, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), fields = config.fields.len(), "loaded cache config");
        Ok(config)
    }

    /// Parse configuration text, uppercasing field names.
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: CacheConfig = toml::from_str(content)?;
        Ok(Self {
            fields: raw
                .fields
                .into_iter()
                .map(|(name, parser)| (name.to_uppercase(), parser))
                .collect(),
        })
    }

    /// Parser configured for a field, looked up case-insensitively.
    pub fn parser(&self, name: &str) -> Option<ValueParser> {
        self.fields.get(&name.to_uppercase()).copied()
    }

    /// Configured field names, sorted.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }
}

/// User-level defaults from `~/.config/remy/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Default cache location, a path or a `file://` URL.
    #[serde(default)]
    pub cache: Option<String>,
}

impl UserConfig {
    /// Path of the user config file, if the platform has a config dir.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("remy").join("config.toml"))
    }

    /// Load the user config. A missing file gives the defaults.
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: UserConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the cache location: an explicit value first (the `--cache`
    /// flag or `REMY_CACHE`), then this config.
    pub fn resolve_cache_path(&self, explicit: Option<&str>) -> Result<PathBuf> {
        let chosen = explicit
            .filter(|s| !s.trim().is_empty())
            .or(self.cache.as_deref().filter(|s| !s.trim().is_empty()));
        match chosen {
            Some(location) => location_to_path(location),
            None => Err(RemyError::ConfigError(
                "No cache specified. Use --cache, set REMY_CACHE, or set 'cache' in the user config"
                    .to_string(),
            )),
        }
    }
}

/// Turn a path or a `file://` URL into a path.
pub fn location_to_path(location: &str) -> Result<PathBuf> {
    let location = location.trim();
    if let Some(rest) = location.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if let Some((scheme, _)) = location.split_once("://") {
        if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
            return Err(RemyError::UnsupportedUrl(format!(
                "only 'file' is supported, got '{}'",
                location
            )));
        }
    }
    Ok(PathBuf::from(location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_toml_uppercases_names() {
        let config = CacheConfig::from_toml("[fields]\ntag = \"string\"\nPriority = \"number\"\n").unwrap();
        assert_eq!(config.field_names(), vec!["PRIORITY", "TAG"]);
        assert_eq!(config.parser("tag"), Some(ValueParser::String));
        assert_eq!(config.parser("PRIORITY"), Some(ValueParser::Number));
        assert_eq!(config.parser("missing"), None);
    }

    #[test]
    fn test_unknown_parser_name_is_an_error() {
        let result = CacheConfig::from_toml("[fields]\nTAG = \"nonsense\"\n");
        assert!(matches!(result, Err(RemyError::TomlParse(_))));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = CacheConfig::load(dir.path()).unwrap();
        assert!(config.fields.is_empty());
    }

    #[test]
    fn test_load_for_single_file_cache() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CACHE_CONFIG_FILE), "[fields]\nTAGS = \"tags\"\n").unwrap();
        let file = dir.path().join("notes.ntc");
        std::fs::write(&file, "NOTECARD a\n").unwrap();
        let config = CacheConfig::load(&file).unwrap();
        assert_eq!(config.parser("tags"), Some(ValueParser::Tags));
    }

    #[test]
    fn test_resolve_prefers_explicit() {
        let user = UserConfig {
            cache: Some("/from/config".to_string()),
        };
        assert_eq!(
            user.resolve_cache_path(Some("/from/flag")).unwrap(),
            PathBuf::from("/from/flag")
        );
        assert_eq!(
            user.resolve_cache_path(None).unwrap(),
            PathBuf::from("/from/config")
        );
        assert_eq!(
            user.resolve_cache_path(Some("")).unwrap(),
            PathBuf::from("/from/config")
        );
    }

    #[test]
    fn test_resolve_without_any_location() {
        let user = UserConfig::default();
        assert!(matches!(
            user.resolve_cache_path(None),
            Err(RemyError::ConfigError(_))
        ));
    }

    #[test]
    fn test_location_to_path() {
        assert_eq!(
            location_to_path("file:///tmp/notes").unwrap(),
            PathBuf::from("/tmp/notes")
        );
        assert_eq!(location_to_path("notes").unwrap(), PathBuf::from("notes"));
        assert!(matches!(
            location_to_path("https://example.com/notes"),
            Err(RemyError::UnsupportedUrl(_))
        ));
    }

    #[test]
    fn test_user_config_load_from() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cache = \"file:///srv/notes\"\n").unwrap();
        let user = UserConfig::load_from(&path).unwrap();
        assert_eq!(user.cache.as_deref(), Some("file:///srv/notes"));
    }
}
