use service_core::observability::{LogFormat, init_tracing};
use session_service::config::SessionServiceConfig;
use session_service::startup::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty());
    let log_format = std::env::var("LOG_FORMAT")
        .map(|v| LogFormat::parse(&v))
        .unwrap_or(LogFormat::Json);
    let log_level = std::env::var("APP__LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    init_tracing(
        "session-service",
        &log_level,
        otlp_endpoint.as_deref(),
        log_format,
    );

    let config = SessionServiceConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await
}
