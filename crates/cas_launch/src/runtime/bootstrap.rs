//! Project bootstrap: git submodules and npm dependencies

use crate::runtime::command::{CommandExecutionError, CommandRunner, RunOptions, StdioMode};
use std::fmt;
use std::path::PathBuf;

/// Runs `npm install` in every submodule without stopping at the first failure
const SUBMODULE_NPM_INSTALL: &str = r#"npm install || echo "npm install failed in $name""#;

/// Runs the `cas-install` npm script in submodules whose package.json declares it
const SUBMODULE_CAS_INSTALL: &str = r#"if [ -f package.json ] && grep -q '"cas-install"' package.json; then npm run cas-install || echo "cas-install failed in $name"; else echo "Skipping $name (no cas-install script)"; fi"#;

/// What a failed step means for the rest of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Abort the bootstrap
    Fatal,
    /// Warn and continue
    BestEffort,
}

/// One external command of the bootstrap sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapStep {
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    pub stdio: StdioMode,
    pub policy: StepPolicy,
}

impl BootstrapStep {
    /// Fatal step with live output
    pub fn new(label: impl Into<String>, program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            stdio: StdioMode::Inherit,
            policy: StepPolicy::Fatal,
        }
    }

    pub fn quiet(mut self) -> Self {
        self.stdio = StdioMode::Quiet;
        self
    }

    pub fn best_effort(mut self) -> Self {
        self.policy = StepPolicy::BestEffort;
        self
    }

    pub fn command_line(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

impl fmt::Display for BootstrapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policy = match self.policy {
            StepPolicy::Fatal => "required",
            StepPolicy::BestEffort => "best effort",
        };
        write!(
            f,
            "{} [{}, {}]: {}",
            self.label,
            self.stdio,
            policy,
            self.command_line()
        )
    }
}

/// Results of a bootstrap run
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub completed: Vec<String>,
    /// Best-effort steps that failed
    pub warnings: Vec<(String, CommandExecutionError)>,
}

/// Ordered install sequence run in the project root
pub struct Bootstrap<R> {
    runner: R,
    root: PathBuf,
    steps: Vec<BootstrapStep>,
}

impl<R: CommandRunner> Bootstrap<R> {
    /// Bootstrap with the standard install sequence
    pub fn new(runner: R, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
            steps: Self::standard_steps(false),
        }
    }

    /// Submodule sync, root install, then per-submodule installs.
    ///
    /// `skip_remote` leaves submodules at their recorded commits.
    pub fn standard_steps(skip_remote: bool) -> Vec<BootstrapStep> {
        let mut steps = vec![BootstrapStep::new(
            "Initialize submodules",
            "git",
            &["submodule", "update", "--init", "--recursive"],
        )];
        if !skip_remote {
            steps.push(BootstrapStep::new(
                "Update submodules from remote",
                "git",
                &["submodule", "update", "--recursive", "--remote"],
            ));
        }
        let root_install = BootstrapStep::new("Install root dependencies", "npm", &["install"]);
        steps.push(root_install.quiet());
        steps.push(
            BootstrapStep::new(
                "Install submodule dependencies",
                "git",
                &["submodule", "foreach", "--recursive", SUBMODULE_NPM_INSTALL],
            )
            .quiet()
            .best_effort(),
        );
        steps.push(
            BootstrapStep::new(
                "Run cas-install in submodules",
                "git",
                &["submodule", "foreach", "--recursive", SUBMODULE_CAS_INSTALL],
            )
            .best_effort(),
        );
        steps
    }

    pub fn with_steps(mut self, steps: Vec<BootstrapStep>) -> Self {
        self.steps = steps;
        self
    }

    pub fn steps(&self) -> &[BootstrapStep] {
        &self.steps
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run every step in order. The first failing fatal step aborts the run.
    pub async fn run(&self) -> Result<BootstrapReport, BootstrapError> {
        let mut report = BootstrapReport::default();

        for step in &self.steps {
            log::info!("{}: {}", step.label, step.command_line());

            let options = RunOptions {
                stdio: step.stdio,
                ..RunOptions::default()
            }
            .with_cwd(self.root.clone());

            match self.runner.run(&step.program, &step.args, &options).await {
                Ok(_) => report.completed.push(step.label.clone()),
                Err(e) => {
                    if let Some(output) = e.captured_output() {
                        log::debug!("{} output:\n{}", step.label, output);
                    }
                    match step.policy {
                        StepPolicy::Fatal => {
                            return Err(BootstrapError {
                                step: step.label.clone(),
                                source: e,
                            });
                        }
                        StepPolicy::BestEffort => {
                            log::warn!("{} may have partially failed: {}", step.label, e);
                            report.warnings.push((step.label.clone(), e));
                        }
                    }
                }
            }
        }

        Ok(report)
    }
}

/// A required bootstrap step failed
#[derive(Debug, thiserror::Error)]
#[error("Install step '{step}' failed: {source}")]
pub struct BootstrapError {
    pub step: String,
    #[source]
    pub source: CommandExecutionError,
}
