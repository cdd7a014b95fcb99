//! Dotenv-style config file (`KEY=value` lines)

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Config file location relative to the project root
pub const DEFAULT_CONFIG_PATH: &str = "tools/config/current.cfg";

/// Key/value pairs loaded once from the project's config file.
///
/// The process environment is never touched: the values are handed to the
/// resolver explicitly.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    path: PathBuf,
    values: IndexMap<String, String>,
}

impl LoadedConfig {
    /// Load a config file. Any I/O or syntax problem is fatal for the caller.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let iter = dotenvy::from_path_iter(path).map_err(|e| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut values = IndexMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| ConfigLoadError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
            values.insert(key, value);
        }

        log::debug!(
            "Loaded {} config keys from {}",
            values.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    /// Build an in-memory config (no backing file)
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            path: PathBuf::new(),
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Path the config was read from (empty for in-memory configs)
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn app_name(&self) -> Option<&str> {
        self.get("APP_NAME")
    }

    pub fn app_version(&self) -> Option<&str> {
        self.get("APP_VERSION")
    }

    /// Keys in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Errors that can occur when loading the config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Failed to load config file from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

impl ConfigLoadError {
    /// Path that was attempted
    pub fn path(&self) -> &Path {
        match self {
            ConfigLoadError::Read { path, .. } | ConfigLoadError::Parse { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_config_file() {
        let file = write_config(
            "APP_NAME=cas-foundation\nAPP_VERSION=1.4.0\n# comment\nSCRIPT=build.mjs\n",
        );

        let config = LoadedConfig::from_file(file.path()).unwrap();
        assert_eq!(config.get("APP_NAME"), Some("cas-foundation"));
        assert_eq!(config.app_version(), Some("1.4.0"));
        assert_eq!(config.get("SCRIPT"), Some("build.mjs"));
        assert_eq!(config.len(), 3);
        assert_eq!(config.path(), file.path());
    }

    #[test]
    fn test_keys_keep_file_order() {
        let file = write_config("ZETA=1\nALPHA=2\nMID=3\n");

        let config = LoadedConfig::from_file(file.path()).unwrap();
        let keys: Vec<&str> = config.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["ZETA", "ALPHA", "MID"]);
    }

    #[test]
    fn test_empty_value_is_present() {
        let file = write_config("ENVIRONMENT=\n");

        let config = LoadedConfig::from_file(file.path()).unwrap();
        assert!(config.contains("ENVIRONMENT"));
        assert_eq!(config.get("ENVIRONMENT"), Some(""));
    }

    #[test]
    fn test_comment_only_file_is_empty() {
        let file = write_config("# nothing configured yet\n");

        let config = LoadedConfig::from_file(file.path()).unwrap();
        assert!(config.is_empty());
        assert_eq!(config.len(), 0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools/config/current.cfg");

        let err = LoadedConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Read { .. }));
        assert_eq!(err.path(), path.as_path());
        assert!(err.to_string().contains("current.cfg"));
    }

    #[test]
    fn test_from_pairs() {
        let config = LoadedConfig::from_pairs([("PACKAGE", "base")]);
        assert_eq!(config.get("PACKAGE"), Some("base"));
        assert!(config.app_name().is_none());
    }
}
