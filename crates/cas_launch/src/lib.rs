//! CAS Foundation launch tooling
//!
//! Two small tools for a project made of many git submodules:
//!
//! - `cas_install` initializes submodules and installs npm dependencies in the
//!   root and in every submodule.
//! - `cas_launch` resolves a launch configuration (environment, package,
//!   script, verbosity) from the command line, a dotenv-style config file and
//!   built-in defaults, then runs the selected script once per environment.
//!
//! # Option precedence
//!
//! Every option is resolved independently: a value given on the command line
//! wins, then the matching upper-case key from the config file, then the
//! default. The environment `all` fans the launch out over every entry of the
//! project's `env` directory.
//!
//! # Example Config File
//!
//! ```text
//! APP_NAME=cas-foundation
//! APP_VERSION=1.4.0
//! ENVIRONMENT=staging
//! PACKAGE=base
//! SCRIPT=start.mjs
//! VERBOSE=false
//! ```

pub mod cli;
pub mod config;
pub mod logging;
pub mod runtime;

pub use cli::{
    parse_arguments, ArgumentParseError, InstallArgs, LaunchArgs, ParseOutcome, ParsedArguments,
};
pub use config::{
    resolve, ConfigLoadError, LoadedConfig, OptionSource, OptionValue, ResolvedOption,
    ResolvedOptions,
};
pub use runtime::{
    Bootstrap, BootstrapError, BootstrapStep, CommandExecutionError, CommandOutput, CommandRunner,
    DirectoryEnumerator, Dispatcher, EnvironmentSource, FailureKind, LaunchError, LaunchFailure,
    LaunchInvocation, LaunchPlan, LaunchReport, Launcher, RunOptions, StdioMode, StepPolicy,
    SystemRunner,
};
