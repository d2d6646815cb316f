use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use pdsls_redirect::{MemorySettingsStore, Translator};
use tokio::io::{AsyncBufReadExt, BufReader};

mod config;
mod log_level;
mod report;
mod toml_merge;
mod tracing;

use config::ConfigToml;
use report::{Mode, Report};

/// Translate AT Protocol viewer URLs into PDSls links.
///
/// Prints one line per input URL: the URL to open, or an empty line when
/// there is nothing to open.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// TOML config file, merged over the built-in defaults.
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// [tracing_subscriber::EnvFilter]
    #[clap(short, long)]
    tracing_env_filter: Option<String>,
    /// Print the at:// URI instead of the viewer URL.
    #[clap(long, conflicts_with = "public_viewer")]
    at_uri: bool,
    /// Print the public page for the record (bsky.app, whtwnd.com, ...).
    #[clap(long)]
    public_viewer: bool,
    /// Print one JSON object per input.
    #[clap(long)]
    json: bool,
    /// URLs to translate. Read from stdin, one per line, when omitted.
    urls: Vec<String>,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.at_uri {
            Mode::AtUri
        } else if self.public_viewer {
            Mode::PublicViewer
        } else {
            Mode::Translate
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => ConfigToml::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ConfigToml::default(),
    };
    tracing::init_tracing_logs(args.tracing_env_filter.as_deref(), &config.logging)?;
    ::tracing::debug!(?config, "Configuration loaded");

    let client = config.network.client()?;
    let store = Arc::new(MemorySettingsStore::new(config.settings.clone()));
    let translator = Translator::with_client(&client, store);
    let mode = args.mode();

    if !args.urls.is_empty() {
        for url in &args.urls {
            print_report(&translator, mode, url, args.json).await?;
        }
        return Ok(());
    }

    // One at a time: each line sees the settings as they are when it starts.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let url = line.trim();
        if url.is_empty() {
            continue;
        }
        print_report(&translator, mode, url, args.json).await?;
    }

    Ok(())
}

async fn print_report(translator: &Translator, mode: Mode, url: &str, json: bool) -> Result<()> {
    let report = Report::run(translator, mode, url).await;
    println!("{}", report.to_line(json)?);
    Ok(())
}
