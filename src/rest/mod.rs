use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tokio_util::sync::CancellationToken;

use crate::import::ContactSource;
use crate::repository::ContactRepository;
use crate::store::ContactStore;

mod handlers;
mod models;

use handlers::{
    add_contact, delete_contact, health, list_contacts, not_found, run_import, toggle_favorite,
    update_contact,
};

pub struct AppState<S, F> {
    pub repository: Arc<ContactRepository<S>>,
    pub source: Arc<F>,
    pub started_at: std::time::SystemTime,
}

impl<S, F> Clone for AppState<S, F> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            source: self.source.clone(),
            started_at: self.started_at,
        }
    }
}

pub fn router<S, F>(state: AppState<S, F>) -> Router
where
    S: ContactStore + Send + Sync + 'static,
    F: ContactSource + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health::<S, F>))
        .route(
            "/contacts",
            get(list_contacts::<S, F>).post(add_contact::<S, F>),
        )
        .route(
            "/contacts/:id",
            put(update_contact::<S, F>).delete(delete_contact::<S, F>),
        )
        .route("/contacts/:id/favorite", post(toggle_favorite::<S, F>))
        .route("/import", post(run_import::<S, F>))
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve<S, F>(
    addr: SocketAddr,
    repository: Arc<ContactRepository<S>>,
    source: Arc<F>,
    shutdown: CancellationToken,
) -> anyhow::Result<()>
where
    S: ContactStore + Send + Sync + 'static,
    F: ContactSource + Send + Sync + 'static,
{
    log::info!("🌐 REST service on http://{}", addr);

    let state = AppState {
        repository,
        source,
        started_at: std::time::SystemTime::now(),
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
