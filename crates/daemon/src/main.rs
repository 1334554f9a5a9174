//! Synctool
//!
//! Serves the files below a folder over HTTP.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use daemon::config::{default_config_path, Config};
use daemon::files::FolderIndexer;
use daemon::{logging, AppState, FileServer};
use protocol::{encode_file_list, FileRecord};

/// Synctool - serve a folder's files over HTTP.
#[derive(Parser, Debug)]
#[command(name = "synctool")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Folder to look up for files and directories [default: /]
    #[arg(long, global = true, value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// Address to serve the folder from, e.g. ":8080" [default: :8080]
    #[arg(long, global = true, value_name = "ADDR")]
    pub port: Option<String>,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the folder until interrupted
    Serve,

    /// Print the folder's file inventory and exit
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Write the effective configuration to the config file and exit
    Init {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// The config file in use: `--config` or the per-user default.
    fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }

    /// Load the configuration file and apply flag overrides on top.
    fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config_path())?;

        if let Some(folder) = &self.folder {
            config.server.folder = folder.clone();
        }
        if let Some(port) = &self.port {
            config.server.listen = port.clone();
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = cli.resolve_config()?;
    let _log_guard = logging::init(&config.logging.level, config.logging.file.as_deref())?;

    let config_path = cli.config_path();
    if config_path.exists() {
        tracing::info!("Using config file: {}", config_path.display());
    } else {
        tracing::debug!("No config file at {}, using defaults", config_path.display());
    }

    config.validate()?;

    match cli.command.clone().unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config).await,
        Commands::List { json } => list(&config, json).await,
        Commands::Init { force } => init(&config, &config_path, force),
    }
}

/// Run the HTTP server until SIGINT or SIGTERM.
async fn serve(config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    tracing::info!("Serving folder {}", state.indexer.root().path().display());

    let server = FileServer::bind(config.listen_addr()?, state).await?;
    server.run_until(wait_for_shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Print the inventory once.
async fn list(config: &Config, json: bool) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let indexer: FolderIndexer = state.indexer;
    let records = tokio::task::spawn_blocking(move || indexer.list()).await??;

    if json {
        println!("{}", encode_file_list(records)?);
    } else {
        print_records_table(&records);
    }
    Ok(())
}

/// Write the resolved configuration, flags included, to `path`.
fn init(config: &Config, path: &Path, force: bool) -> anyhow::Result<()> {
    config.write_to(path, force)?;
    println!("Wrote configuration to {}", path.display());
    Ok(())
}

/// Print records as an aligned table.
fn print_records_table(records: &[FileRecord]) {
    if records.is_empty() {
        println!("No files found.");
        return;
    }

    let width = table_width(records);
    println!("{:<width$}  {:>12}", "PATH", "SIZE");
    for record in records {
        println!("{:<width$}  {:>12}", record.short_path, record.size);
    }
    println!();
    println!("{} file(s)", records.len());
}

/// Width of the path column in chars.
fn table_width(records: &[FileRecord]) -> usize {
    records
        .iter()
        .map(|r| r.short_path.chars().count())
        .max()
        .unwrap_or(0)
        .max("PATH".len())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        _ => {
            tracing::warn!("Failed to register signal handlers, falling back to Ctrl-C");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT");
        }
    }
}

/// Wait for Ctrl-C.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Received Ctrl-C");
}
