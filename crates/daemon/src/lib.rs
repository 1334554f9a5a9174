//! # Synctool Daemon Library
//!
//! This crate serves a directory subtree over HTTP.
//!
//! ## Overview
//!
//! The daemon runs on the machine that holds the files. It provides:
//!
//! - **Folder Index**: a flat inventory of every non-hidden file below the
//!   configured folder, with root-relative paths
//! - **File Retrieval**: opening one file with its size and a sniffed
//!   content type, ready to stream
//! - **HTTP Transport**: `GET /api/v1/files` and `GET /api/v1/file`
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               HTTP transport                 │
//! │   /api/v1/files            /api/v1/file      │
//! ├──────────────────────┬───────────────────────┤
//! │    FolderIndexer     │     FileRetriever     │
//! ├──────────────────────┴───────────────────────┤
//! │                 FolderRoot                   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use daemon::{AppState, Config, FileServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     config.validate()?;
//!
//!     let state = AppState::from_config(&config)?;
//!     let server = FileServer::bind(config.listen_addr()?, state).await?;
//!
//!     server.run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`files`]: Folder indexing, file retrieval, content sniffing
//! - [`http`]: Routes, error mapping, server lifecycle
//! - [`logging`]: Tracing subscriber setup

pub mod config;
pub mod files;
pub mod http;
pub mod logging;

// Re-export protocol for convenience
pub use protocol;

// Re-export config types for convenience
pub use config::{Config, ConfigError};

// Re-export files types for convenience
pub use files::{
    FileRetriever, FolderIndexer, FolderRoot, IndexError, OpenFile, RetrieveError,
    HEADER_SNIFF_LEN,
};

// Re-export HTTP types for convenience
pub use http::{router, ApiError, AppState, FileServer, ServerHandle};
