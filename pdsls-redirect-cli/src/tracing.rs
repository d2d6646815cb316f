//! Tracing setup for the command line.
//!
//! Precedence: `--tracing-env-filter`, then `RUST_LOG`, then the `[logging]`
//! section of the config file. Logs go to stderr; stdout carries results only.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingToml;

/// Filter built from the `[logging]` section alone.
fn filter_from_config(config: &LoggingToml) -> EnvFilter {
    let mut filter = EnvFilter::new("");
    filter = filter.add_directive(config.level.to_owned().into());
    for directive in &config.module_levels {
        filter = filter.add_directive(directive.to_owned().into());
    }
    filter
}

/// Install the global subscriber.
pub fn init_tracing_logs(cli_filter: Option<&str>, config: &LoggingToml) -> anyhow::Result<()> {
    let env_filter = match cli_filter {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_from_config(config)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
