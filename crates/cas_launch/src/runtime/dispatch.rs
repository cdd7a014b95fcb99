//! Builds and runs the launch command for one environment

use crate::runtime::command::{
    CommandExecutionError, CommandOutput, CommandRunner, RunOptions, StdioMode,
};
use std::path::PathBuf;
use std::time::Duration;

/// Program used to run launch scripts unless the config sets `RUNTIME`
pub const DEFAULT_RUNTIME: &str = "node";

/// Directory (under the project root) holding the root packages
pub const PACKAGES_DIR: &str = "packages";

/// Fully built command for one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchInvocation {
    pub environment: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Extra child environment, in insertion order
    pub env: Vec<(String, String)>,
    pub stdio: StdioMode,
}

impl LaunchInvocation {
    pub fn command_line(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }

    fn run_options(&self, timeout: Option<Duration>) -> RunOptions {
        let mut options = RunOptions {
            stdio: self.stdio,
            ..RunOptions::default()
        }
        .with_cwd(self.cwd.clone())
        .with_timeout(timeout);
        for (name, value) in &self.env {
            options = options.with_env(name.clone(), value.clone());
        }
        options
    }
}

/// Launches a script of one root package under a given environment.
///
/// The package is resolved once by the caller and shared by every launch.
/// A relative project root is made absolute on construction.
#[derive(Debug, Clone)]
pub struct Dispatcher<R> {
    runner: R,
    project_root: PathBuf,
    package: String,
    runtime: String,
    timeout: Option<Duration>,
}

impl<R: CommandRunner> Dispatcher<R> {
    pub fn new(runner: R, project_root: impl Into<PathBuf>, package: impl Into<String>) -> Self {
        let project_root = project_root.into();
        Self {
            runner,
            project_root: std::path::absolute(&project_root).unwrap_or(project_root),
            package: package.into(),
            runtime: DEFAULT_RUNTIME.to_string(),
            timeout: None,
        }
    }

    /// Program used to execute the script
    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Command that runs `script` of the package for `environment`
    pub fn invocation(&self, environment: &str, script: &str) -> LaunchInvocation {
        let script_path = self
            .project_root
            .join(PACKAGES_DIR)
            .join(&self.package)
            .join(script);

        LaunchInvocation {
            environment: environment.to_string(),
            program: self.runtime.clone(),
            args: vec![
                script_path.to_string_lossy().into_owned(),
                "--environment".to_string(),
                environment.to_string(),
            ],
            cwd: self.project_root.clone(),
            env: vec![
                ("CAS_ENVIRONMENT".to_string(), environment.to_string()),
                ("CAS_PACKAGE".to_string(), self.package.clone()),
                ("CAS_SCRIPT".to_string(), script.to_string()),
            ],
            stdio: StdioMode::Inherit,
        }
    }

    /// Run the launch and wait for it to finish
    pub async fn launch(
        &self,
        environment: &str,
        script: &str,
    ) -> Result<CommandOutput, LaunchFailure> {
        let invocation = self.invocation(environment, script);
        log::info!("[{}] Starting: {}", environment, invocation.command_line());

        let output = self
            .runner
            .run(
                &invocation.program,
                &invocation.args,
                &invocation.run_options(self.timeout),
            )
            .await
            .map_err(|e| LaunchFailure {
                environment: environment.to_string(),
                source: e,
            })?;

        log::info!("[{}] Finished", environment);
        Ok(output)
    }
}

/// The launch for one environment failed
#[derive(Debug, thiserror::Error)]
#[error("Launch failed for environment '{environment}': {source}")]
pub struct LaunchFailure {
    pub environment: String,
    #[source]
    pub source: CommandExecutionError,
}
