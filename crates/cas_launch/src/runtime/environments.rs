//! Discovery of environment targets

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Directory (under the project root) holding one entry per environment
pub const ENV_DIR: &str = "env";

/// Source of the environment names used to expand `all`
#[async_trait]
pub trait EnvironmentSource: Send + Sync {
    /// Available environment names. Empty when none are found; never an error.
    async fn list_environments(&self) -> Vec<String>;

    /// Where the names come from, for error messages
    fn location(&self) -> String;
}

/// Lists the entries of an `env` directory.
///
/// Directories contribute their name, files their stem (`staging.env` ->
/// `staging`). Hidden entries are skipped. Names come back sorted and
/// deduplicated.
#[derive(Debug, Clone)]
pub struct DirectoryEnumerator {
    dir: PathBuf,
}

impl DirectoryEnumerator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Enumerator for `<root>/env`
    pub fn for_root(root: &Path) -> Self {
        Self::new(root.join(ENV_DIR))
    }
}

#[async_trait]
impl EnvironmentSource for DirectoryEnumerator {
    async fn list_environments(&self) -> Vec<String> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!(
                    "Environment directory {} does not exist",
                    self.dir.display()
                );
                return Vec::new();
            }
            Err(e) => {
                log::warn!(
                    "Cannot read environment directory {}: {}",
                    self.dir.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut names = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Error reading {}: {}", self.dir.display(), e);
                    break;
                }
            };

            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                log::warn!("Skipping non UTF-8 entry in {}", self.dir.display());
                continue;
            };
            if file_name.starts_with('.') {
                continue;
            }

            let is_dir = match entry.file_type().await {
                Ok(file_type) => file_type.is_dir(),
                Err(e) => {
                    log::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let name = if is_dir {
                file_name.to_string()
            } else {
                Path::new(file_name)
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or(file_name)
                    .to_string()
            };
            names.push(name);
        }

        names.sort();
        names.dedup();
        names
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lists_directories_and_file_stems() {
        let root = tempfile::tempdir().unwrap();
        let env_dir = root.path().join(ENV_DIR);
        std::fs::create_dir_all(env_dir.join("staging")).unwrap();
        std::fs::create_dir_all(env_dir.join("prod")).unwrap();
        std::fs::write(env_dir.join("qa.env"), "").unwrap();

        let names = DirectoryEnumerator::for_root(root.path())
            .list_environments()
            .await;
        assert_eq!(names, vec!["prod", "qa", "staging"]);
    }

    #[tokio::test]
    async fn test_skips_hidden_entries_and_dedups() {
        let root = tempfile::tempdir().unwrap();
        let env_dir = root.path().join(ENV_DIR);
        std::fs::create_dir_all(env_dir.join("staging")).unwrap();
        std::fs::write(env_dir.join("staging.cfg"), "").unwrap();
        std::fs::write(env_dir.join(".gitkeep"), "").unwrap();

        let names = DirectoryEnumerator::for_root(root.path())
            .list_environments()
            .await;
        assert_eq!(names, vec!["staging"]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let root = tempfile::tempdir().unwrap();

        let enumerator = DirectoryEnumerator::for_root(root.path());
        assert!(enumerator.list_environments().await.is_empty());
        assert!(enumerator.location().ends_with(ENV_DIR));
    }

    #[tokio::test]
    async fn test_empty_directory_is_empty() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join(ENV_DIR)).unwrap();

        let names = DirectoryEnumerator::for_root(root.path())
            .list_environments()
            .await;
        assert!(names.is_empty());
    }
}
