//! Application startup and lifecycle management.

use crate::config::{ProviderKind, SessionServiceConfig, StoreBackend};
use crate::handlers;
use crate::services::metrics::init_metrics;
use crate::services::providers::TextProvider;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::mock::MockTextProvider;
use crate::services::{
    AnalysisEngine, InMemorySessionStore, MongoSessionStore, SessionService, SessionStore,
};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware,
};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: SessionServiceConfig,
    pub sessions: SessionService,
}

type ServerFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    server: ServerFuture,
    state: AppState,
}

/// Build the text provider selected by configuration.
pub fn build_provider(config: &SessionServiceConfig) -> Result<Arc<dyn TextProvider>, AppError> {
    match config.analysis.provider {
        ProviderKind::Gemini => {
            let gemini_config = GeminiConfig {
                timeout: Duration::from_secs(config.analysis.timeout_secs),
                ..GeminiConfig::new(
                    config.analysis.gemini_api_key.clone(),
                    config.analysis.model.clone(),
                )
            };
            let provider = GeminiTextProvider::new(gemini_config).map_err(|e| {
                tracing::error!("Failed to initialize Gemini provider: {}", e);
                AppError::ConfigError(anyhow::Error::new(e))
            })?;
            tracing::info!(model = %config.analysis.model, "Initialized Gemini text provider");
            Ok(Arc::new(provider))
        }
        ProviderKind::Mock => {
            tracing::warn!("Using mock analysis provider");
            Ok(Arc::new(MockTextProvider::new()))
        }
    }
}

/// Build the session store selected by configuration, creating indexes for Mongo.
pub async fn build_store(config: &SessionServiceConfig) -> Result<Arc<dyn SessionStore>, AppError> {
    match config.store {
        StoreBackend::Mongo => {
            let store = MongoSessionStore::connect(&config.mongodb.uri, &config.mongodb.database)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to MongoDB: {}", e);
                    AppError::from(e)
                })?;
            store.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                AppError::from(e)
            })?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory session store; sessions are lost on restart");
            Ok(Arc::new(InMemorySessionStore::new()))
        }
    }
}

fn cors_layer(config: &SessionServiceConfig) -> Result<CorsLayer, AppError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(match &config.cors_allowed_origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin).map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid CORS_ALLOWED_ORIGIN: {}", e))
            })?;
            layer.allow_origin(origin)
        }
        None => layer.allow_origin(Any),
    })
}

pub fn router(state: AppState) -> Result<Router, AppError> {
    let api = Router::new()
        .route("/save", post(handlers::save_session))
        .route("/quick-mood", post(handlers::quick_mood))
        .route("/user/:user_id", get(handlers::get_user_sessions))
        .route("/analytics/:user_id", get(handlers::mood_analytics))
        .route("/:session_id", get(handlers::get_session));

    Ok(Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest("/api/session", api)
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config)?)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state))
}

impl Application {
    /// Build the application with the provider and store named in configuration.
    pub async fn build(config: SessionServiceConfig) -> Result<Self, AppError> {
        let provider = build_provider(&config)?;
        let store = build_store(&config).await?;
        Self::build_with(config, provider, store).await
    }

    /// Build the application around an explicit provider and store.
    pub async fn build_with(
        config: SessionServiceConfig,
        provider: Arc<dyn TextProvider>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, AppError> {
        init_metrics();
        service_core::error::expose_internal_details(config.diagnostics);

        let engine = AnalysisEngine::new(provider)
            .with_temperature(config.analysis.temperature)
            .with_max_tokens(config.analysis.max_output_tokens);
        let sessions = SessionService::new(engine, store, config.analytics_default_days);

        let state = AppState {
            config: config.clone(),
            sessions,
        };

        let app = router(state.clone())?;

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("session-service listening on port {}", port);

        let server = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .into_future();

        Ok(Self {
            port,
            server: Box::pin(server),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
