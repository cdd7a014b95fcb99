//! Command-line interfaces for cas_launch and cas_install

use crate::config::{OptionValue, DEFAULT_CONFIG_PATH};
use argh::{EarlyExit, FromArgs};
use serde::Serialize;
use std::path::{Path, PathBuf};

static UNSET: OptionValue = OptionValue::Unset;

/// Launch a script from the selected environment with the selected root package
#[derive(FromArgs, Debug)]
pub struct LaunchArgs {
    /// environment to launch, or "all" for every entry under env/
    #[argh(option, short = 'e')]
    pub environment: Option<String>,

    /// root package that provides the script
    #[argh(option, short = 'p')]
    pub package: Option<String>,

    /// script to run inside the package (default: start.mjs)
    #[argh(option, short = 's')]
    pub script: Option<String>,

    /// print parsed arguments and debug logs
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// stop a launch that runs longer than this many seconds
    #[argh(option, short = 't')]
    pub timeout: Option<String>,

    /// config file (default: tools/config/current.cfg under the project root)
    #[argh(option, short = 'c')]
    pub config: Option<String>,

    /// project root directory (default: current directory)
    #[argh(option, short = 'r')]
    pub root: Option<String>,

    /// show the launch plan without executing
    #[argh(switch)]
    pub dry_run: bool,
}

/// Initialize git submodules and install npm dependencies everywhere
#[derive(FromArgs, Debug)]
pub struct InstallArgs {
    /// project root directory (default: current directory)
    #[argh(option, short = 'r')]
    pub root: Option<String>,

    /// do not pull the latest remote commit of each submodule
    #[argh(switch)]
    pub skip_remote: bool,

    /// show the install steps without executing
    #[argh(switch)]
    pub dry_run: bool,

    /// print debug logs
    #[argh(switch, short = 'v')]
    pub verbose: bool,
}

/// Launch arguments as seen by the option resolver.
///
/// Flags that were not given are [`OptionValue::Unset`], never empty strings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedArguments {
    pub environment: OptionValue,
    pub package: OptionValue,
    pub script: OptionValue,
    pub verbose: OptionValue,
    pub timeout: OptionValue,
    pub config: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub dry_run: bool,
}

impl ParsedArguments {
    /// Command-line value of a resolvable option
    pub fn option(&self, name: &str) -> &OptionValue {
        match name {
            "environment" => &self.environment,
            "package" => &self.package,
            "script" => &self.script,
            "verbose" => &self.verbose,
            "timeout" => &self.timeout,
            _ => &UNSET,
        }
    }

    /// Project root, falling back to the current directory
    pub fn project_root(&self) -> PathBuf {
        project_root(self.root.as_deref())
    }

    /// Config file path; relative `--config` values are taken as given
    pub fn config_path(&self, root: &Path) -> PathBuf {
        match &self.config {
            Some(path) => path.clone(),
            None => root.join(DEFAULT_CONFIG_PATH),
        }
    }
}

impl From<LaunchArgs> for ParsedArguments {
    fn from(args: LaunchArgs) -> Self {
        Self {
            environment: args.environment.into(),
            package: args.package.into(),
            script: args.script.into(),
            verbose: if args.verbose {
                OptionValue::Bool(true)
            } else {
                OptionValue::Unset
            },
            timeout: args.timeout.into(),
            config: args.config.map(PathBuf::from),
            root: args.root.map(PathBuf::from),
            dry_run: args.dry_run,
        }
    }
}

/// Result of parsing a command line
#[derive(Debug)]
pub enum ParseOutcome<T> {
    Parsed(T),
    /// `--help` was requested; holds the usage text
    Help(String),
}

/// Command line could not be parsed
#[derive(Debug, thiserror::Error)]
#[error("{message}\nRun with --help for usage.")]
pub struct ArgumentParseError {
    pub message: String,
}

/// Parse `args` (without the program name) for the command `command_name`
pub fn parse_arguments<T: FromArgs>(
    command_name: &str,
    args: &[&str],
) -> Result<ParseOutcome<T>, ArgumentParseError> {
    match T::from_args(&[command_name], args) {
        Ok(parsed) => Ok(ParseOutcome::Parsed(parsed)),
        Err(EarlyExit {
            output,
            status: Ok(()),
        }) => Ok(ParseOutcome::Help(output)),
        Err(EarlyExit {
            output,
            status: Err(()),
        }) => Err(ArgumentParseError {
            message: output.trim_end().to_string(),
        }),
    }
}

/// Parse the current process arguments
pub fn parse_env_arguments<T: FromArgs>() -> Result<ParseOutcome<T>, ArgumentParseError> {
    let raw: Vec<String> = std::env::args().collect();
    let command_name = raw
        .first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("cas_launch")
        .to_string();
    let rest: Vec<&str> = raw.iter().skip(1).map(String::as_str).collect();
    parse_arguments(&command_name, &rest)
}

/// `root` if given, else the current directory; always absolute
pub fn project_root(root: Option<&Path>) -> PathBuf {
    match root {
        Some(root) => std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf()),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_launch(args: &[&str]) -> ParsedArguments {
        match parse_arguments::<LaunchArgs>("cas_launch", args).unwrap() {
            ParseOutcome::Parsed(args) => args.into(),
            ParseOutcome::Help(_) => panic!("unexpected help"),
        }
    }

    #[test]
    fn test_parse_options() {
        let parsed = parse_launch(&["-e", "staging", "--script", "build.mjs"]);
        assert_eq!(parsed.environment, OptionValue::from("staging"));
        assert_eq!(parsed.script, OptionValue::from("build.mjs"));
        assert_eq!(parsed.package, OptionValue::Unset);
        assert_eq!(parsed.verbose, OptionValue::Unset);
        assert!(!parsed.dry_run);
    }

    #[test]
    fn test_verbose_switch() {
        let parsed = parse_launch(&["-v"]);
        assert_eq!(parsed.verbose, OptionValue::Bool(true));
    }

    #[test]
    fn test_explicit_empty_value() {
        let parsed = parse_launch(&["--package", ""]);
        assert_eq!(parsed.package, OptionValue::from(""));
    }

    #[test]
    fn test_help_is_not_an_error() {
        let outcome = parse_arguments::<LaunchArgs>("cas_launch", &["--help"]).unwrap();
        match outcome {
            ParseOutcome::Help(usage) => assert!(usage.contains("--environment")),
            ParseOutcome::Parsed(_) => panic!("expected help"),
        }
    }

    #[test]
    fn test_unknown_flag_is_an_error() {
        let result = parse_arguments::<LaunchArgs>("cas_launch", &["--bogus"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_option_value_is_an_error() {
        let result = parse_arguments::<LaunchArgs>("cas_launch", &["--environment"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_path_defaults_under_root() {
        let parsed = parse_launch(&["--root", "/srv/cas"]);
        let root = parsed.project_root();
        assert_eq!(root, PathBuf::from("/srv/cas"));
        assert_eq!(
            parsed.config_path(&root),
            PathBuf::from("/srv/cas/tools/config/current.cfg")
        );

        let parsed = parse_launch(&["-c", "local.cfg"]);
        assert_eq!(parsed.config_path(&root), PathBuf::from("local.cfg"));
    }

    #[test]
    fn test_relative_root_is_made_absolute() {
        let cwd = std::env::current_dir().unwrap();

        let parsed = parse_launch(&["-r", "proj"]);
        assert_eq!(parsed.project_root(), cwd.join("proj"));
        assert!(project_root(None).is_absolute());
    }

    #[test]
    fn test_unknown_option_name_is_unset() {
        let parsed = parse_launch(&["-e", "prod"]);
        assert_eq!(parsed.option("region"), &OptionValue::Unset);
        assert_eq!(parsed.option("environment"), &OptionValue::from("prod"));
    }

    #[test]
    fn test_parsed_arguments_json() {
        let parsed = parse_launch(&["-e", "prod", "-v"]);
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["environment"], "prod");
        assert_eq!(json["verbose"], true);
        assert!(json["package"].is_null());
    }

    #[test]
    fn test_install_args() {
        match parse_arguments::<InstallArgs>("cas_install", &["--skip-remote", "-r", "/srv/cas"])
            .unwrap()
        {
            ParseOutcome::Parsed(args) => {
                assert!(args.skip_remote);
                assert_eq!(args.root.as_deref(), Some("/srv/cas"));
                assert!(!args.dry_run);
            }
            ParseOutcome::Help(_) => panic!("unexpected help"),
        }
    }
}
