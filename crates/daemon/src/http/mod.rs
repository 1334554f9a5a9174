//! HTTP transport for the folder index and file downloads.
//!
//! The server owns nothing beyond the two engine components; every request
//! re-walks or re-opens from scratch on a blocking worker thread.

pub mod error;
pub mod handlers;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use protocol::{FILES_ROUTE, FILE_ROUTE};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::files::{FileRetriever, FolderIndexer, FolderRoot, RootError};

pub use error::ApiError;
pub use handlers::content_disposition;

/// Shared state handed to every route.
#[derive(Debug, Clone)]
pub struct AppState {
    pub indexer: FolderIndexer,
    pub retriever: FileRetriever,
}

impl AppState {
    /// Build both components over the same root.
    pub fn new(root: FolderRoot, confine_to_root: bool) -> Self {
        Self {
            indexer: FolderIndexer::new(root.clone()),
            retriever: FileRetriever::new(root).confine_to_root(confine_to_root),
        }
    }

    /// Build state from the daemon configuration.
    pub fn from_config(config: &Config) -> Result<Self, RootError> {
        let root = FolderRoot::new(&config.server.folder)?;
        Ok(Self::new(root, config.files.confine_to_root))
    }
}

/// Build the router serving the files and file routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(FILES_ROUTE, get(handlers::list_files))
        .route(FILE_ROUTE, get(handlers::download_file))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// A bound but not yet running file server.
pub struct FileServer {
    listener: TcpListener,
    addr: SocketAddr,
    app: Router,
}

impl FileServer {
    /// Bind to `addr`. Port 0 picks a free port; see [`FileServer::addr`].
    pub async fn bind(addr: SocketAddr, state: AppState) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;

        Ok(Self {
            listener,
            addr,
            app: router(Arc::new(state)),
        })
    }

    /// The address actually bound.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Listening requests at {}", self.addr);
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
    }

    /// Serve on a background task.
    pub fn spawn(self) -> ServerHandle {
        let addr = self.addr;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(self.run_until(async move {
            let _ = shutdown_rx.await;
        }));

        ServerHandle {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a server started with [`FileServer::spawn`].
///
/// Dropping the handle signals shutdown without waiting for it.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<io::Result<()>>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal shutdown and wait for the server to finish.
    pub async fn shutdown(mut self) -> io::Result<()> {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }

        match self.task.take() {
            Some(task) => task.await.map_err(io::Error::other)?,
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }
    }
}
