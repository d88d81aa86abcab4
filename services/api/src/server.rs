use crate::cli::ServeArgs;
use crate::infra::{AppState, DealServices};
use crate::routes::with_deal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use dealroom::config::AppConfig;
use dealroom::error::AppError;
use dealroom::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if config.documents.ephemeral_key {
        warn!("DOCUMENT_ENCRYPTION_KEY not set; uploaded documents will be unreadable after restart");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = DealServices::in_memory(&config.lifecycle, &config.documents);
    let app = with_deal_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "deal room ready");

    axum::serve(listener, app).await?;
    Ok(())
}
