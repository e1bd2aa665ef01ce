//! Serving sessions.
//!
//! # Responsibilities
//! - Own everything one served folder needs: resolver, routes, watcher, server
//! - Start in dependency order, tear down in reverse
//! - Never let two sessions serve at once
//!
//! # Design Decisions
//! - Root folder and resolver are fixed for a session's lifetime
//! - A failed start leaves nothing running (watcher joined, listener dropped)
//! - Lifecycle calls take `&mut self`; callers serialize them

pub mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use tokio::task::JoinHandle;

use crate::config::watcher::{load_routes, ConfigWatcher, RouteReloader, WatchError};
use crate::config::ServerConfig;
use crate::http::{HttpServer, ServeState};
use crate::lifecycle::Shutdown;
use crate::net::{self, ListenerError};
use crate::observability::metrics;
use crate::resolver::LocalResolver;
use crate::routing::{shared_routes, RequestMapper, RouteSet, SharedRoutes};

pub use state::SessionState;

/// How long a stopping server may take to drain in-flight requests.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Error type for session startup.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0} is not a folder that can be served")]
    InvalidRoot(PathBuf),
    #[error("invalid server name: {0}")]
    InvalidServerName(String),
    #[error(transparent)]
    Bind(#[from] ListenerError),
    #[error(transparent)]
    Watch(#[from] WatchError),
}

struct RunningSession {
    root: PathBuf,
    local_addr: SocketAddr,
    routes: SharedRoutes,
    watcher: ConfigWatcher,
    shutdown: Shutdown,
    server: JoinHandle<Result<(), std::io::Error>>,
}

/// Composition root for serving one folder at a time.
pub struct Session {
    config: ServerConfig,
    state: SessionState,
    running: Option<RunningSession>,
}

impl Session {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            running: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Canonical root folder of the running session.
    pub fn root(&self) -> Option<&Path> {
        self.running.as_ref().map(|r| r.root.as_path())
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Base URL clients can use, e.g. `http://127.0.0.1:8080/`.
    pub fn server_url(&self) -> Option<String> {
        self.local_addr().map(|addr| format!("http://{addr}/"))
    }

    /// Snapshot of the currently published routes.
    pub fn routes(&self) -> Option<Arc<RouteSet>> {
        self.running.as_ref().map(|r| r.routes.load_full())
    }

    /// Start serving `root`, stopping any running session first.
    pub async fn start(&mut self, root: impl AsRef<Path>) -> Result<SocketAddr, SessionError> {
        self.stop().await;

        self.state = SessionState::Starting;
        match self.launch(root.as_ref()).await {
            Ok(running) => {
                let addr = running.local_addr;
                tracing::info!(root = %running.root.display(), address = %addr, "Session running");
                self.running = Some(running);
                self.state = SessionState::Running;
                Ok(addr)
            }
            Err(e) => {
                tracing::error!(
                    root = %root.as_ref().display(),
                    error = %e,
                    "Session failed to start"
                );
                self.state = SessionState::Idle;
                Err(e)
            }
        }
    }

    async fn launch(&self, root: &Path) -> Result<RunningSession, SessionError> {
        let root = tokio::fs::canonicalize(root)
            .await
            .map_err(|_| SessionError::InvalidRoot(root.to_path_buf()))?;
        let is_dir = tokio::fs::metadata(&root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(SessionError::InvalidRoot(root));
        }

        let name = &self.config.listener.server_name;
        let server_name = HeaderValue::from_str(name)
            .map_err(|_| SessionError::InvalidServerName(name.clone()))?;

        let resolver = Arc::new(LocalResolver::new(&root));

        let routes_file = root.join(&self.config.routing.routes_file);
        let initial = {
            let routes_file = routes_file.clone();
            let reload = self.config.reload.clone();
            tokio::task::spawn_blocking(move || load_routes(&routes_file, &reload))
                .await
                .unwrap_or_else(|_| RouteSet::empty())
        };
        tracing::info!(
            path = %routes_file.display(),
            routes = initial.len(),
            "Initial routes loaded"
        );
        metrics::set_routes_loaded(initial.len());
        let routes = shared_routes(initial);

        let watcher = ConfigWatcher::start(
            &root,
            RouteReloader::new(routes_file, routes.clone(), self.config.reload.clone()),
        )?;

        let server = HttpServer::new(
            ServeState {
                resolver,
                routes: routes.clone(),
                mapper: Arc::new(RequestMapper::new(self.config.routing.matcher_order.clone())),
            },
            server_name,
        );

        let listener = match net::bind(&self.config.listener).await {
            Ok(listener) => listener,
            Err(e) => {
                stop_watcher(watcher).await;
                return Err(e.into());
            }
        };
        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                stop_watcher(watcher).await;
                let requested = net::listener::socket_addr(&self.config.listener)?;
                return Err(ListenerError::Bind(requested, e).into());
            }
        };

        let shutdown = Shutdown::new();
        let server = tokio::spawn(server.run(listener, shutdown.subscribe()));

        Ok(RunningSession {
            root,
            local_addr,
            routes,
            watcher,
            shutdown,
            server,
        })
    }

    /// Stop serving. A no-op when idle.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        self.state = SessionState::Stopping;
        tracing::info!(root = %running.root.display(), "Stopping session");

        running.shutdown.trigger();
        let mut server = running.server;
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => tracing::error!(error = %e, "HTTP server exited with error"),
            Ok(Err(e)) => tracing::error!(error = %e, "HTTP server task failed"),
            Err(_) => {
                tracing::warn!(
                    grace = ?SHUTDOWN_GRACE,
                    "HTTP server did not drain in time; aborting"
                );
                server.abort();
            }
        }

        stop_watcher(running.watcher).await;
        self.state = SessionState::Idle;
        tracing::info!("Session stopped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.shutdown.trigger();
            running.server.abort();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("root", &self.root())
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

/// Join the watcher's reload thread off the async workers.
async fn stop_watcher(mut watcher: ConfigWatcher) {
    if tokio::task::spawn_blocking(move || watcher.stop()).await.is_err() {
        tracing::error!("Failed to stop routes watcher");
    }
}
