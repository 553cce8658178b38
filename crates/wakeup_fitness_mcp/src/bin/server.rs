use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::tower::{
    StreamableHttpServerConfig, StreamableHttpService,
};
use tokio::signal;
use tracing::info;

use wakeup_fitness_client::HealthDataSource;
use wakeup_fitness_client::config::Config;
use wakeup_fitness_client::http_client::ReqwestHealthDataSource;
use wakeup_fitness_mcp::http::{AppState, router};
use wakeup_fitness_mcp::{FitnessService, LoggingSource, WakeupFitnessHandler, log_filter};

fn listen_addr(raw: Option<String>) -> SocketAddr {
    raw.and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)))
}


#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let log_env = log_filter(
        std::env::var("WAKEUP_FITNESS_LOG_LEVEL").ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let env_filter = tracing_subscriber::EnvFilter::new(&log_env);
    tracing_subscriber::fmt()
        .compact()
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!(%log_env, "wakeup_fitness_mcp:http: log filter");

    let handle = PrometheusBuilder::new().install_recorder()?;

    let cfg = Config::from_env()?;
    let source: Arc<dyn HealthDataSource> =
        Arc::new(LoggingSource::new(ReqwestHealthDataSource::from_config(&cfg)));
    if !source.has_session() {
        tracing::warn!("GOOGLE_FIT_ACCESS_TOKEN is not set; fitness routes will return 503");
    }
    let service = FitnessService::new(source).with_window_days(cfg.window_days);

    let handler = WakeupFitnessHandler::new(service.clone());
    let factory = move || -> Result<_, std::io::Error> { Ok(handler.clone()) };
    let mcp_service = StreamableHttpService::new(
        factory,
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );

    let state = Arc::new(AppState {
        service,
        metrics: Some(handle),
    });
    let app = router(state).nest_service("/mcp", mcp_service);

    let addr = listen_addr(std::env::var("ADDRESS").ok());
    info!(%addr, "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("failed to listen for ctrl+c: {e}");
            }
        })
        .await?;

    Ok(())
}
