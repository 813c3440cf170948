pub mod assets;
pub mod config;
pub mod middleware;
pub mod openapi;
pub mod pages;
pub mod routes;
pub mod static_files;

use assets::{AssetHost, UploadError};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use config::Config;
use eh_core::{EventHub, HubError};
use eh_db::{ConnectionPool, DbStore, PooledConnection};
use middleware::correlation::correlation_middleware;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub type Hub = EventHub<DbStore<PooledConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<ConnectionPool>,
    pub assets: Arc<dyn AssetHost>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, assets: Arc<dyn AssetHost>) -> Self {
        let pool = ConnectionPool::new(config.db_path.clone(), config.pool_max_idle);
        Self {
            pool,
            assets,
            config: Arc::new(config),
        }
    }

    /// State with the asset host chosen by `config.assets`.
    pub fn from_config(config: Config) -> Result<Self, UploadError> {
        let assets = assets::from_config(&config)?;
        Ok(Self::new(config, assets))
    }
}

/// Checks a connection out of the pool and wraps it in a hub for the
/// duration of one request.
pub async fn build_hub(state: &AppState) -> Result<Hub, HubError> {
    let conn = state.pool.get().await.map_err(|err| {
        error!(error = %err, "failed to acquire database connection");
        HubError::Internal {
            message: err.to_string(),
        }
    })?;
    Ok(EventHub::new(DbStore::new(conn)))
}

pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);
    Router::new()
        .merge(routes::router(state.clone()))
        .merge(pages::router(state))
        .merge(static_files::router())
        .nest_service("/uploads", uploads)
        .layer(body_limit)
        .layer(axum::middleware::from_fn(correlation_middleware))
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState) -> Result<(), std::io::Error> {
    let addr = state.config.addr();
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app(state)).await
}
