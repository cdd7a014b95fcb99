//! External command execution

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// How the child's standard streams are wired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    /// Connected to the parent's streams (live output)
    #[default]
    Inherit,
    /// Captured; only surfaced on failure
    Quiet,
}

impl fmt::Display for StdioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StdioMode::Inherit => write!(f, "inherit"),
            StdioMode::Quiet => write!(f, "quiet"),
        }
    }
}

/// Options for a single command run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Working directory
    pub cwd: Option<PathBuf>,
    /// Stream wiring
    pub stdio: StdioMode,
    /// Extra environment variables for the child
    pub env: HashMap<String, String>,
    /// Kill the child if it runs longer than this
    pub timeout: Option<Duration>,
}

impl RunOptions {
    pub fn inherit() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self {
            stdio: StdioMode::Quiet,
            ..Self::default()
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    /// Captured stdout (empty in inherit mode)
    pub stdout: String,
    /// Captured stderr (empty in inherit mode)
    pub stderr: String,
}

/// Runs external programs. One attempt per call, no retries.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &RunOptions,
    ) -> Result<CommandOutput, CommandExecutionError>;
}

/// [`CommandRunner`] backed by real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &RunOptions,
    ) -> Result<CommandOutput, CommandExecutionError> {
        log::debug!(
            "Running ({}): {} {}",
            options.stdio,
            program,
            args.join(" ")
        );

        let mut cmd = Command::new(program);
        cmd.args(args).envs(&options.env).kill_on_drop(true);

        if let Some(dir) = &options.cwd {
            cmd.current_dir(dir);
        }

        match options.stdio {
            StdioMode::Inherit => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
            StdioMode::Quiet => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
            }
        }

        let child = cmd.spawn().map_err(|e| {
            CommandExecutionError::new(program, args, FailureKind::Spawn(e))
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let waited = match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    log::warn!(
                        "'{}' did not finish within {:?}, killing it",
                        program,
                        limit
                    );
                    return Err(CommandExecutionError::new(
                        program,
                        args,
                        FailureKind::TimedOut(limit),
                    ));
                }
            },
            None => child.wait_with_output().await,
        };

        let output = waited.map_err(|e| {
            CommandExecutionError::new(program, args, FailureKind::Wait(e))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        match output.status.code() {
            Some(0) => Ok(CommandOutput {
                code: 0,
                stdout,
                stderr,
            }),
            Some(code) => Err(CommandExecutionError::new(program, args, FailureKind::Exit(code))
                .with_output(stdout, stderr)),
            None => Err(CommandExecutionError::new(program, args, FailureKind::Signal)
                .with_output(stdout, stderr)),
        }
    }
}

/// Why a command failed
#[derive(Debug, thiserror::Error)]
pub enum FailureKind {
    #[error("could not be started: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("exited with code {0}")]
    Exit(i32),

    #[error("was terminated by a signal")]
    Signal,

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("could not be awaited: {0}")]
    Wait(#[source] std::io::Error),
}

/// A single external invocation failed
#[derive(Debug)]
pub struct CommandExecutionError {
    pub program: String,
    pub args: Vec<String>,
    pub kind: FailureKind,
    /// Captured stdout (quiet mode only)
    pub stdout: String,
    /// Captured stderr (quiet mode only)
    pub stderr: String,
}

impl CommandExecutionError {
    pub fn new(program: &str, args: &[String], kind: FailureKind) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
            kind,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn with_output(mut self, stdout: String, stderr: String) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    /// Exit code, when the process ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match self.kind {
            FailureKind::Exit(code) => Some(code),
            _ => None,
        }
    }

    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Captured stderr, or stdout when stderr is empty
    pub fn captured_output(&self) -> Option<&str> {
        [self.stderr.trim(), self.stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

impl fmt::Display for CommandExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command `{}` {}", self.command_line(), self.kind)
    }
}

impl std::error::Error for CommandExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_quiet_run_captures_output() {
        let output = SystemRunner
            .run("sh", &sh("echo hello"), &RunOptions::quiet())
            .await
            .unwrap();
        assert_eq!(output.code, 0);
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let err = SystemRunner
            .run("sh", &sh("echo oops >&2; exit 3"), &RunOptions::quiet())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(err.program, "sh");
        assert_eq!(err.captured_output(), Some("oops"));
        assert!(err.to_string().contains("exited with code 3"));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let err = SystemRunner
            .run("cas-no-such-program", &[], &RunOptions::quiet())
            .await
            .unwrap_err();
        assert!(matches!(err.kind, FailureKind::Spawn(_)));
        assert_eq!(err.exit_code(), None);
    }

    #[tokio::test]
    async fn test_working_directory_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions::quiet()
            .with_cwd(dir.path())
            .with_env("CAS_ENVIRONMENT", "staging");

        let output = SystemRunner
            .run("sh", &sh("pwd; echo $CAS_ENVIRONMENT"), &options)
            .await
            .unwrap();
        let lines: Vec<&str> = output.stdout.lines().collect();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(lines[0]).canonicalize().unwrap(),
            expected
        );
        assert_eq!(lines[1], "staging");
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let options = RunOptions::quiet().with_timeout(Some(Duration::from_millis(100)));
        let started = std::time::Instant::now();

        let err = SystemRunner
            .run("sleep", &["5".to_string()], &options)
            .await
            .unwrap_err();
        assert!(matches!(err.kind, FailureKind::TimedOut(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_inherit_mode_captures_nothing() {
        let output = SystemRunner
            .run("true", &[], &RunOptions::inherit())
            .await
            .unwrap();
        assert!(output.stdout.is_empty());
    }
}
