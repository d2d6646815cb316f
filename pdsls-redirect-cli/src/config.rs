//! Configuration file of the command line front end.
//!
//! All default values live in `config.default.toml`, embedded at compile
//! time. A user file only lists what it changes and is merged over it.

use std::{fs, num::NonZeroUsize, path::Path, str::FromStr, time::Duration};

use pdsls_redirect::{BuildError, Endpoints, RedirectHttpClient, Settings};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    log_level::{LogLevel, TargetLevel},
    toml_merge,
};

/// Embedded copy of the default configuration.
pub const DEFAULT_CONFIG: &str = include_str!("config.default.toml");

/// Error that can occur when reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigReadError {
    /// The file did not exist or could not be read.
    #[error("config file not found: {0}")]
    ConfigFileNotFound(#[from] std::io::Error),
    /// The TOML was invalid, or a value had the wrong type.
    #[error("config file is not valid TOML: {0}")]
    ConfigFileNotValid(#[from] toml::de::Error),
}

/// Upstreams and transport limits.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NetworkToml {
    /// Handle resolution and thread fetches.
    pub appview: Url,
    pub plc_directory: Url,
    /// Root every result is rendered against.
    pub viewer_root: Url,
    /// Per-request timeout, `0` for none.
    pub request_timeout_ms: u64,
    pub user_agent_extra: String,
    pub title_search_max_pages: NonZeroUsize,
    /// Serve every `did:web` document from this origin instead of its domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did_web_origin: Option<Url>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoggingToml {
    pub level: LogLevel,
    pub module_levels: Vec<TargetLevel>,
}

/// The whole configuration file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConfigToml {
    /// Translation options, in the same camelCase keys the extension stores.
    pub settings: Settings,
    pub network: NetworkToml,
    pub logging: LoggingToml,
}

impl Default for ConfigToml {
    fn default() -> Self {
        ConfigToml::from_str(DEFAULT_CONFIG).expect("Embedded config.default.toml must be valid")
    }
}

impl ConfigToml {
    /// Read a configuration file and overlay it on the embedded defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigReadError> {
        let raw = fs::read_to_string(path)?;
        Self::from_str_with_defaults(&raw)
    }

    /// Overlay a raw TOML string on the embedded defaults.
    pub fn from_str_with_defaults(raw: &str) -> Result<Self, ConfigReadError> {
        let defaults: toml::Value = DEFAULT_CONFIG
            .parse()
            .expect("embedded defaults invalid TOML");
        let user: toml::Value = raw.parse()?;

        Ok(toml_merge::merge(defaults, user).try_into()?)
    }
}

impl NetworkToml {
    /// Upstream bases for the library.
    pub fn endpoints(&self) -> Result<Endpoints, BuildError> {
        Endpoints::new(
            self.appview.as_str(),
            self.plc_directory.as_str(),
            self.viewer_root.as_str(),
        )
    }

    /// HTTP client honouring every `[network]` option.
    pub fn client(&self) -> Result<RedirectHttpClient, BuildError> {
        let timeout = (self.request_timeout_ms > 0)
            .then(|| Duration::from_millis(self.request_timeout_ms));

        let mut builder = RedirectHttpClient::builder();
        builder
            .endpoints(self.endpoints()?)
            .request_timeout(timeout)
            .title_search_max_pages(self.title_search_max_pages.get());
        if !self.user_agent_extra.trim().is_empty() {
            builder.user_agent_extra(self.user_agent_extra.trim());
        }
        if let Some(origin) = &self.did_web_origin {
            builder.did_web_origin(origin.clone());
        }
        builder.build()
    }
}

impl FromStr for ConfigToml {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}
