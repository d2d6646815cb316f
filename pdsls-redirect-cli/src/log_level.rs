//! Validated log directives of the `[logging]` config section.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::{Directive, LevelFilter};

/// Level applied to every target without a more specific directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogLevel(pub LevelFilter);

/// A `target=level` directive, e.g. `pdsls_redirect=debug`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetLevel(pub Directive);

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(Self)
            .map_err(|_| anyhow::anyhow!("invalid log level: {s}"))
    }
}

impl FromStr for TargetLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A bare level parses as a Directive too; it belongs in `level`.
        let Some((target, _)) = s.split_once('=') else {
            anyhow::bail!("'{s}' has no target, use `level` for the global level");
        };
        if target.trim().is_empty() {
            anyhow::bail!("'{s}' has an empty target");
        }
        s.parse()
            .map(Self)
            .map_err(|_| anyhow::anyhow!("invalid target log level directive: {s}"))
    }
}

impl TryFrom<String> for LogLevel {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for TargetLevel {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}

impl From<TargetLevel> for String {
    fn from(level: TargetLevel) -> Self {
        level.to_string()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for TargetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self(LevelFilter::INFO)
    }
}

impl From<LogLevel> for Directive {
    fn from(level: LogLevel) -> Self {
        level.0.into()
    }
}

impl From<TargetLevel> for Directive {
    fn from(level: TargetLevel) -> Self {
        level.0
    }
}
