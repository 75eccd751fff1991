//! Save and reopen sets of file-manager folders.

mod cli;
mod config;
mod discovery;
mod folder;
mod logging;
mod manager;
mod resolver;
mod session;
mod shell;
mod store;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::discovery::FolderDiscovery;
use crate::manager::SessionManager;
use crate::resolver::{NullWindowSource, WindowSource};
use crate::shell::{ShellFolderOpener, X11WindowSource};
use crate::store::SessionStore;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or_else(config::default_data_dir);

    let (config, config_error) = match AppConfig::load(&data_dir) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    logging::init(cli.verbose, &config.log_level);
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "using default configuration");
    }
    tracing::debug!(data_dir = %data_dir.display(), "starting");

    let windows: Arc<dyn WindowSource> = if cli.command.needs_windows() {
        match X11WindowSource::connect(&config.file_manager_classes) {
            Ok(source) => Arc::new(source),
            Err(e) => {
                tracing::warn!(error = %e, "no X11 display, window discovery disabled");
                Arc::new(NullWindowSource)
            }
        }
    } else {
        Arc::new(NullWindowSource)
    };

    let manager = SessionManager::new(
        FolderDiscovery::new(windows),
        SessionStore::open(&data_dir),
        Arc::new(ShellFolderOpener::new(config.open_command.clone())),
    )
    .with_open_delay(config.open_delay());

    match cli::run(cli.command, &manager, &config, &data_dir).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
