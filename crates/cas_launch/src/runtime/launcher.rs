//! Launch orchestration: expands the environment selection and dispatches

use crate::config::{LoadedConfig, OptionError, OptionValue, ResolvedOption, ResolvedOptions};
use crate::runtime::command::{CommandRunner, SystemRunner};
use crate::runtime::dispatch::{Dispatcher, LaunchFailure, LaunchInvocation, DEFAULT_RUNTIME};
use crate::runtime::environments::{DirectoryEnumerator, EnvironmentSource};
use std::fmt;
use std::path::Path;
use tokio::sync::watch;

/// Environment value that launches every discovered environment
pub const ALL_ENVIRONMENTS: &str = "all";

/// Runs the resolved launch over one or many environments
pub struct Launcher<E, R> {
    environments: E,
    dispatcher: Dispatcher<R>,
}

/// What a dry run would execute
#[derive(Debug)]
pub struct LaunchPlan {
    pub package: String,
    pub script: String,
    /// Invocations in launch order
    pub invocations: Vec<LaunchInvocation>,
}

/// Per-environment results of a batch
#[derive(Debug, Default)]
pub struct LaunchReport {
    /// Environments whose launch exited successfully
    pub launched: Vec<String>,
    /// Launches that failed; the batch carried on past them
    pub failed: Vec<LaunchFailure>,
    /// Environments not started because shutdown was requested
    pub skipped: Vec<String>,
}

impl LaunchReport {
    /// Number of environments that were actually started
    pub fn attempted(&self) -> usize {
        self.launched.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

impl Launcher<DirectoryEnumerator, SystemRunner> {
    /// Launcher for a project on disk, wired from the resolved options.
    ///
    /// `RUNTIME` in the config selects the script runtime.
    pub fn for_project(
        root: &Path,
        config: &LoadedConfig,
        options: &ResolvedOptions,
    ) -> Result<Self, LaunchError> {
        let package = options.package.text()?;
        let runtime = config.get("RUNTIME").unwrap_or(DEFAULT_RUNTIME);
        let dispatcher = Dispatcher::new(SystemRunner, root, package)
            .with_runtime(runtime)
            .with_timeout(options.timeout_duration()?);

        Ok(Self::new(DirectoryEnumerator::for_root(root), dispatcher))
    }
}

impl<E: EnvironmentSource, R: CommandRunner> Launcher<E, R> {
    pub fn new(environments: E, dispatcher: Dispatcher<R>) -> Self {
        Self {
            environments,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<R> {
        &self.dispatcher
    }

    /// Environments to launch, in launch order.
    ///
    /// `all` expands through the environment source and must yield at least
    /// one name.
    pub async fn dispatch_set(
        &self,
        environment: &ResolvedOption,
    ) -> Result<Vec<String>, LaunchError> {
        if environment.value == OptionValue::Unset {
            return Err(LaunchError::NoEnvironment);
        }

        let name = environment.text()?;
        if name.is_empty() {
            return Err(LaunchError::NoEnvironment);
        }
        if name != ALL_ENVIRONMENTS {
            return Ok(vec![name.to_string()]);
        }

        let names = self.environments.list_environments().await;
        if names.is_empty() {
            return Err(LaunchError::EmptyEnumeration {
                location: self.environments.location(),
            });
        }
        log::info!(
            "Expanding '{}' to {} environments: {}",
            ALL_ENVIRONMENTS,
            names.len(),
            names.join(", ")
        );
        Ok(names)
    }

    /// Build every invocation without running anything
    pub async fn plan(&self, options: &ResolvedOptions) -> Result<LaunchPlan, LaunchError> {
        let script = options.script.text()?;
        let invocations = self
            .dispatch_set(&options.environment)
            .await?
            .iter()
            .map(|env| self.dispatcher.invocation(env, script))
            .collect();

        Ok(LaunchPlan {
            package: self.dispatcher.package().to_string(),
            script: script.to_string(),
            invocations,
        })
    }

    /// Launch sequentially; each launch finishes before the next starts.
    ///
    /// A failed launch is logged and recorded but does not stop the batch.
    /// Errors returned here all happen before the first launch.
    pub async fn run(
        &self,
        options: &ResolvedOptions,
        shutdown_rx: watch::Receiver<()>,
    ) -> Result<LaunchReport, LaunchError> {
        let script = options.script.text()?;
        let targets = self.dispatch_set(&options.environment).await?;
        let mut report = LaunchReport::default();

        for (index, environment) in targets.iter().enumerate() {
            if shutdown_rx.has_changed().unwrap_or(false) {
                log::info!("Shutdown requested, skipping remaining environments");
                report.skipped.extend(targets[index..].iter().cloned());
                break;
            }

            match self.dispatcher.launch(environment, script).await {
                Ok(_) => report.launched.push(environment.clone()),
                Err(failure) => {
                    log::warn!("{}", failure);
                    if let Some(output) = failure.source.captured_output() {
                        log::warn!("[{}] {}", environment, output);
                    }
                    report.failed.push(failure);
                }
            }
        }

        Ok(report)
    }
}

/// Fatal launcher errors
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("No environment targets found in {location}")]
    EmptyEnumeration { location: String },

    #[error("No environment selected: pass --environment or set ENVIRONMENT in the config file")]
    NoEnvironment,

    #[error("Invalid option: {0}")]
    InvalidOption(#[from] OptionError),
}

impl fmt::Display for LaunchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Launch Plan")?;
        writeln!(f, "===========")?;
        writeln!(f)?;
        writeln!(f, "Package: {}", self.package)?;
        writeln!(f, "Script:  {}", self.script)?;
        writeln!(f)?;
        writeln!(f, "Environments (in launch order):")?;

        for (i, invocation) in self.invocations.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "  {}. {}", i + 1, invocation.environment)?;
            writeln!(f, "     Command: {}", invocation.command_line())?;
            writeln!(f, "     Working dir: {}", invocation.cwd.display())?;
            for (name, value) in &invocation.env {
                writeln!(f, "       {}={}", name, value)?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for LaunchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Launched {} of {} environment(s)",
            self.launched.len(),
            self.attempted() + self.skipped.len()
        )?;
        if !self.failed.is_empty() {
            let failed: Vec<&str> = self
                .failed
                .iter()
                .map(|failure| failure.environment.as_str())
                .collect();
            write!(f, "; failed: {}", failed.join(", "))?;
        }
        if !self.skipped.is_empty() {
            write!(f, "; skipped: {}", self.skipped.join(", "))?;
        }
        Ok(())
    }
}
