//! Command-line client for the local prompt library.

mod cli;
mod commands;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use commands::Session;
use log::{LevelFilter, debug, info};
use promptlib::PromptResolver;
use promptlib::config::PromptLibConfig;
use promptlib::core::PromptLibrary;
use std::io;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .filter_level(default_level)
        .parse_default_env()
        .try_init();

    info!(
        "starting promptlib (config_set={}, data_dir_set={})",
        cli.config.is_some(),
        cli.data_dir.is_some()
    );
    let mut config = if let Some(path) = cli.config.as_ref() {
        PromptLibConfig::load_from_path(path).context("failed to load config")?
    } else {
        let cwd = std::env::current_dir().context("cwd")?;
        let layered =
            PromptLibConfig::load_layered(&cwd).context("failed to load layered config")?;
        debug!("layered config loaded (layers={})", layered.layers.len());
        layered.config
    };
    if let Some(dir) = cli.data_dir.as_ref() {
        config.storage.path = Some(dir.to_string_lossy().to_string());
    }

    let library = PromptLibrary::from_config(&config).context("failed to open prompt library")?;
    let ask = PromptResolver::stdio();
    let session = Session {
        library: &library,
        config: &config,
        ask: &ask,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    commands::run(&session, cli.command, &mut out)
}
