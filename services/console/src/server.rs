use crate::cli::SandboxArgs;
use crate::infra::{with_operational_routes, AppState};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use listing_review::config::AppConfig;
use listing_review::error::AppError;
use listing_review::workflows::sandbox::{
    demo_listings, load_seed_file, sandbox_router, InMemoryListingStore,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut config: AppConfig, args: SandboxArgs) -> Result<(), AppError> {
    let SandboxArgs {
        host,
        port,
        seed,
        require_token,
    } = args;

    if let Some(host) = host {
        config.sandbox.host = host;
    }
    if let Some(port) = port {
        config.sandbox.port = port;
    }

    let listings = match seed.as_ref() {
        Some(path) => load_seed_file(path)?,
        None => demo_listings(),
    };
    let listing_count = listings.len();
    let mut store = InMemoryListingStore::new(listings)?;
    if let Some(token) = require_token {
        store = store.with_required_token(token);
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Some(Arc::new(prometheus_handle)),
    };

    let app = with_operational_routes(sandbox_router(Arc::new(store)))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.sandbox.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        listings = listing_count,
        seed = ?seed,
        "listing sandbox ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
