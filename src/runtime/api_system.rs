use crate::config::Settings;
use crate::mock_api::{build_router, Database, StoreActor, StoreClient, StoreError};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

/// Errors starting or stopping the mock API.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Server error: {0}")]
    Serve(#[source] io::Error),
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

/// The running mock API: the store actor plus the HTTP server in front of it.
///
/// # Example
///
/// ```ignore
/// let system = ApiSystem::start(&settings).await?;
/// let engine = Engine::<User>::new(system.base_url().parse()?, "users");
/// // ...
/// system.shutdown().await?;
/// ```
pub struct ApiSystem {
    /// Direct access to the store, bypassing HTTP.
    pub store: StoreClient,
    local_addr: SocketAddr,
    stop: oneshot::Sender<()>,
    server: JoinHandle<io::Result<()>>,
    actor: JoinHandle<()>,
}

impl ApiSystem {
    /// Loads `db_path`, persists changes back to it and listens on `bind_addr`.
    pub async fn start(settings: &Settings) -> Result<Self, RuntimeError> {
        let db = Database::load(&settings.db_path)?;
        Self::start_with(db, Some(settings.db_path.clone()), &settings.bind_addr).await
    }

    /// Starts on an in-memory database. Use port 0 to pick a free port.
    pub async fn start_with(
        db: Database,
        persist_to: Option<PathBuf>,
        bind_addr: &str,
    ) -> Result<Self, RuntimeError> {
        let bind_err = |source| RuntimeError::Bind {
            addr: bind_addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(bind_addr).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        let (actor, store) = StoreActor::new(64, db, || Uuid::new_v4().to_string());
        let actor = match persist_to {
            Some(path) => actor.persist_to(path),
            None => actor,
        };
        let actor = tokio::spawn(actor.run());

        let app = build_router(store.clone());
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = stopped.await;
                })
                .await
        });
        info!(%local_addr, "Mock API listening");

        Ok(Self {
            store,
            local_addr,
            stop,
            server,
            actor,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `http://<addr>`, suitable as an engine base URL.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Serves until `signal` resolves, then shuts down.
    pub async fn run_until(self, signal: impl Future<Output = ()>) -> Result<(), RuntimeError> {
        signal.await;
        self.shutdown().await
    }

    /// Stops the server, then the store actor once its last client is gone.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        info!("Shutting down mock API...");
        let _ = self.stop.send(());

        match self.server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(RuntimeError::Serve(e)),
            Err(e) => {
                error!("Server task failed: {:?}", e);
                return Err(RuntimeError::TaskFailed(e.to_string()));
            }
        }

        // The router's client went with the server; this is the last one.
        drop(self.store);
        if let Err(e) = self.actor.await {
            error!("Store task failed: {:?}", e);
            return Err(RuntimeError::TaskFailed(e.to_string()));
        }

        info!("Mock API shutdown complete.");
        Ok(())
    }
}
