// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTTP server for the development asset pipeline.
//!
//! Entry points are served under their logical source paths (the same paths
//! the application's asset helper emits), backed by the staged watch-mode
//! bundles on disk. Everything else falls through to the staging directory
//! and then to the public directory. CORS is wide open: the page originates
//! from the application server, not from here.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, services::ServeDir};

use refract::TlsMaterial;

use super::livereload::{relay_reloads, CLIENT_SCRIPT};

/// Shared application state for the asset server.
pub struct AppState {
    /// Logical entry path (`/resources/js/app.jsx`) to staged bundle on disk.
    pub entry_routes: HashMap<String, PathBuf>,
    /// Channel for sending reload notifications.
    pub reload_tx: Arc<broadcast::Sender<()>>,
    /// Watch-mode build output directory.
    pub staging_dir: PathBuf,
    /// Project web root.
    pub public_dir: PathBuf,
}

/// Builds the axum application for the asset server.
pub fn create_app(state: AppState) -> Router {
    let serve_dirs =
        ServeDir::new(&state.staging_dir).fallback(ServeDir::new(&state.public_dir));

    let mut app = Router::new()
        .route("/__refract/livereload", get(livereload_ws))
        .route("/__refract/livereload.js", get(client_script_handler));

    for path in state.entry_routes.keys() {
        app = app.route(path, get(entry_handler));
    }

    app.fallback_service(serve_dirs)
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn livereload_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let notices = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| relay_reloads(socket, notices))
}

async fn client_script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        CLIENT_SCRIPT,
    )
}

/// Serves the staged bundle behind a logical entry path.
async fn entry_handler(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let Some(staged) = state.entry_routes.get(uri.path()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(staged).await {
        Ok(bytes) => {
            let content_type = match staged.extension().and_then(|e| e.to_str()) {
                Some("css") => "text/css; charset=utf-8",
                _ => "text/javascript; charset=utf-8",
            };
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(err) => {
            tracing::debug!(path = %staged.display(), %err, "staged bundle not readable");
            (
                StatusCode::NOT_FOUND,
                format!("bundle not built yet: {}", staged.display()),
            )
                .into_response()
        }
    }
}

/// A dev server bound to its address but not yet serving.
///
/// Binding is separate from serving so the advertised URL can be published
/// only once the socket is actually accepting connections.
pub enum BoundServer {
    /// Plain HTTP.
    Plain(tokio::net::TcpListener),
    /// HTTPS via rustls.
    Tls(std::net::TcpListener, RustlsConfig),
}

impl BoundServer {
    /// Binds `addr`, with TLS when material is provided.
    pub async fn bind(addr: &str, tls: Option<TlsMaterial>) -> anyhow::Result<Self> {
        match tls {
            Some(material) => {
                let rustls = RustlsConfig::from_pem(material.cert, material.key).await?;
                let listener = std::net::TcpListener::bind(addr)?;
                listener.set_nonblocking(true)?;
                Ok(Self::Tls(listener, rustls))
            }
            None => Ok(Self::Plain(tokio::net::TcpListener::bind(addr).await?)),
        }
    }

    /// The address actually bound (a port of 0 resolves here).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        match self {
            Self::Plain(listener) => listener.local_addr(),
            Self::Tls(listener, _) => listener.local_addr(),
        }
    }

    /// Serves the application until the process exits or the listener fails.
    pub async fn serve(self, app: Router) -> anyhow::Result<()> {
        match self {
            Self::Plain(listener) => axum::serve(listener, app).await?,
            Self::Tls(listener, rustls) => {
                axum_server::from_tcp_rustls(listener, rustls)
                    .serve(app.into_make_service())
                    .await?
            }
        }
        Ok(())
    }
}
