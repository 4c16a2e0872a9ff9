use std::sync::Arc;

use axum::middleware;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tandem_matching::config::AppConfig;
use tandem_matching::storage::PgStorage;
use tandem_matching::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tandem_shared::middleware::init_tracing("tandem-matching");

    let config = AppConfig::load()?;
    let port = config.port;

    if std::env::var("JWT_SECRET").is_err() {
        tracing::warn!("JWT_SECRET is not set, tokens are checked against the development secret");
    }

    let pool = tandem_shared::clients::db::create_pool(&config.database_url, config.max_pool_size)?;
    let metrics_handle = tandem_shared::middleware::init_metrics()?;

    let state = Arc::new(AppState {
        storage: Arc::new(PgStorage::new(pool)),
        metrics_handle,
    });

    let app = tandem_matching::router(state)
        .layer(middleware::from_fn(tandem_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "tandem-matching starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
