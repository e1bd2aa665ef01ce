//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all handler
//! - Wire up middleware (tracing, `Server` header)
//! - Bind server to listener, stop on the shutdown broadcast
//! - Canonicalize, map, read, render

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, Uri},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::http::request::Request;
use crate::http::response;
use crate::observability::metrics;
use crate::resolver::Resolver;
use crate::routing::{self, RequestMapper, ResponseErrorCode, SharedRoutes};

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct ServeState {
    pub resolver: Arc<dyn Resolver>,
    pub routes: SharedRoutes,
    pub mapper: Arc<RequestMapper>,
}

/// HTTP server for one serving session.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around the session's state.
    pub fn new(state: ServeState, server_name: HeaderValue) -> Self {
        let router = Self::build_router(state, server_name);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: ServeState, server_name: HeaderValue) -> Router {
        Router::new()
            .route("/{*path}", any(serve_handler))
            .route("/", any(serve_handler))
            .with_state(state)
            .layer(SetResponseHeaderLayer::overriding(header::SERVER, server_name))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler. Matching and file reads run on the blocking pool.
async fn serve_handler(State(state): State<ServeState>, method: Method, uri: Uri) -> Response {
    let start_time = Instant::now();
    let method_str = method.as_str().to_string();
    let url = uri.to_string();

    let response = {
        let method_str = method_str.clone();
        tokio::task::spawn_blocking(move || process(&state, &method_str, &uri)).await
    };

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Request worker failed");
            response::failure(ResponseErrorCode::InternalError, &method_str, &url)
        }
    };

    metrics::record_request(
        metrics::method_label(&method_str),
        response.status().as_u16(),
        start_time,
    );
    response
}

/// Process one request against the current routes snapshot.
pub fn process(state: &ServeState, method: &str, uri: &Uri) -> Response {
    let url = uri.to_string();
    let request = match Request::canonicalize(method, uri.path(), state.resolver.as_ref()) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(method = %method, url = %url, error = %e, "Rejecting request");
            return response::failure(ResponseErrorCode::InternalError, method, &url);
        }
    };

    let routes = state.routes.load();
    match state.mapper.map(&request, state.resolver.as_ref(), &routes) {
        routing::Response::Success(resolved) => match state.resolver.read(&resolved.path) {
            Ok(mut resource) => {
                if let Some(content_type) = resolved.content_type {
                    resource.content_type = content_type;
                }
                response::resource(resource)
            }
            Err(e) => {
                tracing::error!(
                    resolved = %resolved.path.display(),
                    error = %e,
                    "Matched resource could not be read"
                );
                response::failure(ResponseErrorCode::InternalError, method, &url)
            }
        },
        routing::Response::Failure(code) => {
            tracing::debug!(method = %method, url = %url, status = code.as_u16(), "Request failed");
            response::failure(code, method, &url)
        }
    }
}
