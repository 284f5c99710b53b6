//! HTTP API over the document store and the generation invoker.
//!
//! Handlers move store and engine work onto tokio's blocking pool; the only
//! shared mutable state is the generator's run state, which it guards itself.
use crate::config::ResolvedConfig;
use crate::generate::Generator;
use crate::store::DocumentStore;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

mod errors;
mod handlers;

pub use errors::{error_body, error_status, ApiError};

const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    generator: Arc<Generator>,
}

impl AppState {
    pub fn new(generator: Generator) -> Self {
        Self {
            generator: Arc::new(generator),
        }
    }

    pub fn generator(&self) -> Arc<Generator> {
        Arc::clone(&self.generator)
    }

    pub fn store(&self) -> DocumentStore {
        self.generator.store().clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/documents", get(handlers::list_documents))
        .route(
            "/documents/:name",
            get(handlers::get_document)
                .put(handlers::put_document)
                .delete(handlers::delete_document),
        )
        .route(
            "/documents/:name/validation",
            get(handlers::document_validation),
        )
        .route("/stage", post(handlers::stage))
        .route("/generate", post(handlers::generate))
        .route("/bundles", get(handlers::list_bundles))
        .route("/bundles/:bundle_id", get(handlers::fetch_bundle))
        .route("/status", get(handlers::status))
        .route("/diag", get(handlers::diag))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Build the store and generator from `config`, bind, and serve until
/// SIGINT or SIGTERM.
pub async fn serve(config: &ResolvedConfig) -> Result<()> {
    let store = DocumentStore::new(config.paths(), config.limits);
    store
        .init()
        .with_context(|| format!("initialize data dir {}", config.data_dir.display()))?;
    let state = AppState::new(Generator::new(store, config.generator_settings()));
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("bind {}", config.bind))?;
    tracing::info!(
        addr = %listener.local_addr().context("read bound address")?,
        data_dir = %config.data_dir.display(),
        "listening"
    );
    serve_on(listener, state, wait_for_shutdown_signal()).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve_on<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("serve http")
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("shutdown requested");
}
