//! Axum-based HTTP server.

use std::net::SocketAddr;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use prometheus::Registry;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::Instrument;

use acme_store::SnapshotReader;

use crate::handlers;

/// Shared handler state: a snapshot reader and, when metrics are enabled,
/// the registry to encode at `/metrics`.
#[derive(Clone)]
pub struct RpcState {
    pub reader: SnapshotReader,
    pub registry: Option<Registry>,
}

impl RpcState {
    pub fn new(reader: SnapshotReader) -> Self {
        Self {
            reader,
            registry: None,
        }
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }
}

async fn api_span(request: Request, next: Next) -> Response {
    let span = tracing::debug_span!(
        "api",
        method = %request.method(),
        path = %request.uri().path(),
    );
    async move {
        let response = next.run(request).await;
        tracing::debug!(status = response.status().as_u16(), "request served");
        response
    }
    .instrument(span)
    .await
}

/// Register `path` and `path/` for the same handler.
fn route_both(router: Router<RpcState>, path: &str, handler: axum::routing::MethodRouter<RpcState>) -> Router<RpcState> {
    router
        .route(path, handler.clone())
        .route(&format!("{path}/"), handler)
}

/// Build the full router. CORS is open to any origin.
pub fn router(state: RpcState) -> Router {
    let mut router = Router::new();
    for (path, handler) in [
        ("/supply", get(handlers::get_supply)),
        ("/supply/:filter", get(handlers::get_supply_filtered)),
        ("/staking", get(handlers::get_staking_summary)),
        ("/staking/stakers", get(handlers::get_stakers)),
        ("/staking/stakers/search", get(handlers::search_staker)),
        ("/validators", get(handlers::get_validators)),
        ("/validators/search", get(handlers::search_validator)),
        ("/tokens", get(handlers::get_tokens)),
        ("/tokens/search", get(handlers::search_token)),
        ("/health", get(handlers::health)),
        ("/metrics", get(handlers::metrics)),
    ] {
        router = route_both(router, path, handler);
    }

    router
        .layer(middleware::from_fn(api_span))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The HTTP server, configured with a port and shared state.
pub struct RpcServer {
    pub port: u16,
    pub state: RpcState,
}

impl RpcServer {
    pub fn new(port: u16, state: RpcState) -> Self {
        Self { port, state }
    }

    /// Serve until `shutdown` fires. In-flight requests are allowed to
    /// finish.
    pub async fn start(self, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "HTTP server listening");
        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server shutting down");
            })
            .await
    }
}
