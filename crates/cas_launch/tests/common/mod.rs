//! Test helpers for launch integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cas_launch::{
    CommandExecutionError, CommandOutput, CommandRunner, FailureKind, LoadedConfig, RunOptions,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A call seen by [`RecordingRunner`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub options: RunOptions,
}

impl RecordedCall {
    /// Value of `CAS_ENVIRONMENT` passed to the child
    pub fn environment(&self) -> &str {
        self.options
            .env
            .get("CAS_ENVIRONMENT")
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Runner that records calls and fails for selected environments
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    failing: Vec<String>,
}

impl RecordingRunner {
    pub fn failing_for(environments: &[&str]) -> Self {
        Self {
            failing: environments.iter().map(|e| e.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &RunOptions,
    ) -> Result<CommandOutput, CommandExecutionError> {
        let call = RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            options: options.clone(),
        };
        let fails = self.failing.iter().any(|e| e == call.environment());
        self.calls.lock().unwrap().push(call);

        if fails {
            return Err(CommandExecutionError::new(
                program,
                args,
                FailureKind::Exit(1),
            ));
        }
        Ok(CommandOutput::default())
    }
}

/// Temporary project with a config file and an `env` directory
pub struct TestProject {
    dir: tempfile::TempDir,
}

impl TestProject {
    pub fn new(config: &str, environments: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(cas_launch::config::DEFAULT_CONFIG_PATH);
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(&config_path, config).unwrap();

        let env_dir = dir.path().join(cas_launch::runtime::ENV_DIR);
        std::fs::create_dir_all(&env_dir).unwrap();
        for environment in environments {
            std::fs::create_dir_all(env_dir.join(environment)).unwrap();
        }

        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join(cas_launch::config::DEFAULT_CONFIG_PATH)
    }

    pub fn load_config(&self) -> LoadedConfig {
        LoadedConfig::from_file(self.config_path()).unwrap()
    }

    /// Write a file under the project root
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }
}
