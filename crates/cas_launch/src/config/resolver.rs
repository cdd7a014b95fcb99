//! Option resolution: command line > config file > default

use crate::cli::ParsedArguments;
use crate::config::LoadedConfig;
use serde::{Serialize, Serializer};
use std::fmt;
use std::num::ParseIntError;
use std::time::Duration;

pub const DEFAULT_PACKAGE: &str = "base";
pub const DEFAULT_SCRIPT: &str = "start.mjs";

/// Value of a single option.
///
/// `Unset` means "not provided", which is distinct from an explicitly provided
/// empty string or `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OptionValue {
    #[default]
    Unset,
    Str(String),
    Bool(bool),
}

impl OptionValue {
    pub fn is_set(&self) -> bool {
        !matches!(self, OptionValue::Unset)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<Option<String>> for OptionValue {
    fn from(value: Option<String>) -> Self {
        value.map(OptionValue::Str).unwrap_or_default()
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Unset => write!(f, "(not set)"),
            OptionValue::Str(s) => write!(f, "{}", s),
            OptionValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl Serialize for OptionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OptionValue::Unset => serializer.serialize_none(),
            OptionValue::Str(s) => serializer.serialize_str(s),
            OptionValue::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Which tier supplied a resolved value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSource {
    Cli,
    Config,
    Default,
}

impl fmt::Display for OptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionSource::Cli => "cli",
            OptionSource::Config => "config",
            OptionSource::Default => "default",
        };
        write!(f, "{}", name)
    }
}

/// Effective value of one option and where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedOption {
    pub name: String,
    pub value: OptionValue,
    pub source: OptionSource,
}

impl ResolvedOption {
    /// The value as text; anything else is an error naming the option
    pub fn text(&self) -> Result<&str, OptionError> {
        match &self.value {
            OptionValue::Str(s) => Ok(s),
            OptionValue::Unset => Err(OptionError::Missing(self.name.clone())),
            OptionValue::Bool(b) => Err(OptionError::NotText {
                name: self.name.clone(),
                value: b.to_string(),
            }),
        }
    }

    /// Boolean view; text values go through [`parse_flag`]
    pub fn flag(&self) -> bool {
        match &self.value {
            OptionValue::Bool(b) => *b,
            OptionValue::Str(s) => parse_flag(s),
            OptionValue::Unset => false,
        }
    }
}

impl fmt::Display for ResolvedOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (from {})", self.value, self.source)
    }
}

/// Config key for an option name: `environment` -> `ENVIRONMENT`, `dry-run` -> `DRY_RUN`
pub fn config_key(name: &str) -> String {
    name.replace('-', "_").to_ascii_uppercase()
}

/// Truthiness of a config string
pub fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value == "1"
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value.eq_ignore_ascii_case("on")
}

/// Resolve one option from the three ranked sources.
///
/// A tier supplies the value only when it holds something other than
/// [`OptionValue::Unset`]. Config strings are converted to booleans when the
/// default is a boolean.
pub fn resolve(
    parsed: &ParsedArguments,
    config: &LoadedConfig,
    name: &str,
    default: OptionValue,
) -> ResolvedOption {
    let from_cli = parsed.option(name);
    if from_cli.is_set() {
        return ResolvedOption {
            name: name.to_string(),
            value: from_cli.clone(),
            source: OptionSource::Cli,
        };
    }

    if let Some(raw) = config.get(&config_key(name)) {
        let value = match default {
            OptionValue::Bool(_) => OptionValue::Bool(parse_flag(raw)),
            _ => OptionValue::Str(raw.to_string()),
        };
        return ResolvedOption {
            name: name.to_string(),
            value,
            source: OptionSource::Config,
        };
    }

    ResolvedOption {
        name: name.to_string(),
        value: default,
        source: OptionSource::Default,
    }
}

/// The launcher's option set, resolved once per process
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedOptions {
    pub environment: ResolvedOption,
    pub package: ResolvedOption,
    pub script: ResolvedOption,
    pub verbose: ResolvedOption,
    pub timeout: ResolvedOption,
}

impl ResolvedOptions {
    pub fn resolve(parsed: &ParsedArguments, config: &LoadedConfig) -> Self {
        Self {
            environment: resolve(parsed, config, "environment", OptionValue::Unset),
            package: resolve(parsed, config, "package", DEFAULT_PACKAGE.into()),
            script: resolve(parsed, config, "script", DEFAULT_SCRIPT.into()),
            verbose: resolve(parsed, config, "verbose", false.into()),
            timeout: resolve(parsed, config, "timeout", OptionValue::Unset),
        }
    }

    pub fn verbose(&self) -> bool {
        self.verbose.flag()
    }

    /// Per-launch time limit, if one was configured
    pub fn timeout_duration(&self) -> Result<Option<Duration>, OptionError> {
        let raw = match &self.timeout.value {
            OptionValue::Unset => return Ok(None),
            _ => self.timeout.text()?.trim(),
        };
        if raw.is_empty() {
            return Ok(None);
        }

        let secs: u64 = raw.parse().map_err(|e| OptionError::InvalidTimeout {
            value: raw.to_string(),
            source: e,
        })?;
        if secs == 0 {
            return Ok(None);
        }
        Ok(Some(Duration::from_secs(secs)))
    }
}

impl fmt::Display for ResolvedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Environment:  {}", self.environment)?;
        writeln!(f, "Package:      {}", self.package)?;
        writeln!(f, "Script:       {}", self.script)?;
        write!(f, "Verbose:      {}", self.verbose)?;
        if self.timeout.value.is_set() {
            write!(f, "\nTimeout:      {}", self.timeout)?;
        }
        Ok(())
    }
}

/// A resolved option has the wrong shape for its use
#[derive(Debug, thiserror::Error)]
pub enum OptionError {
    #[error("Option '{0}' has no value")]
    Missing(String),

    #[error("Option '{name}' expects text, got '{value}'")]
    NotText { name: String, value: String },

    #[error("Timeout must be a whole number of seconds, got '{value}': {source}")]
    InvalidTimeout {
        value: String,
        #[source]
        source: ParseIntError,
    },
}
