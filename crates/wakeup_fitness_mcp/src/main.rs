use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use wakeup_fitness_client::HealthDataSource;
use wakeup_fitness_client::config::Config;
use wakeup_fitness_client::http_client::ReqwestHealthDataSource;
use wakeup_fitness_mcp::{FitnessService, LoggingSource, WakeupFitnessHandler, log_filter};

/// Parse the optional metrics listener address, warning when it is unusable.
fn metrics_addr(raw: &str) -> Option<SocketAddr> {
    match raw.trim().parse::<SocketAddr>() {
        Ok(addr) => Some(addr),
        Err(e) => {
            tracing::warn!(
                value = %raw,
                error = %e,
                "wakeup_fitness_mcp: ignoring invalid WAKEUP_FITNESS_METRICS_ADDR"
            );
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::items_after_test_module)]
mod tests {
    use super::*;

    #[test]
    fn metrics_addr_accepts_socket_addresses() {
        assert_eq!(
            metrics_addr(" 127.0.0.1:9000 "),
            Some(SocketAddr::from(([127, 0, 0, 1], 9000)))
        );
    }

    #[test]
    fn metrics_addr_rejects_malformed_values() {
        assert_eq!(metrics_addr("localhost"), None);
        assert_eq!(metrics_addr("127.0.0.1"), None);
        assert_eq!(metrics_addr(""), None);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // `WAKEUP_FITNESS_LOG_LEVEL`, then `RUST_LOG`, then `info`. Logs go to stderr; stdout carries MCP.
    let log_env = log_filter(
        std::env::var("WAKEUP_FITNESS_LOG_LEVEL").ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let env_filter = tracing_subscriber::EnvFilter::new(&log_env);
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!("wakeup_fitness_mcp: log filter: {}", log_env);

    let cfg = Config::from_env()?;

    if let Some(addr) = std::env::var("WAKEUP_FITNESS_METRICS_ADDR")
        .ok()
        .and_then(|raw| metrics_addr(&raw))
    {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        tracing::info!(%addr, "wakeup_fitness_mcp: serving metrics");
    }

    let source = LoggingSource::new(ReqwestHealthDataSource::from_config(&cfg));
    if !source.has_session() {
        tracing::warn!(
            "wakeup_fitness_mcp: GOOGLE_FIT_ACCESS_TOKEN is not set; fitness tools will report unavailable"
        );
    }
    let service = FitnessService::new(Arc::new(source)).with_window_days(cfg.window_days);
    let handler = WakeupFitnessHandler::new(service);

    tracing::info!(
        "wakeup_fitness_mcp: registered {} tools and {} prompts",
        handler.tool_count(),
        handler.prompt_count()
    );

    tracing::info!("wakeup_fitness_mcp: starting stdio MCP server...");

    use rmcp::serve_server;
    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let server = serve_server(handler, transport).await?;

    tracing::info!("wakeup_fitness_mcp: service initialized as server");

    server.waiting().await?;

    Ok(())
}
