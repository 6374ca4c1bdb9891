//! Application startup and lifecycle management.

use crate::auth::{PrincipalResolver, TokenVerifier};
use crate::config::{NotificationConfig, StoreBackend};
use crate::handlers;
use crate::services::{
    InMemoryNotificationStore, NotificationDb, NotificationRepository, NotificationService,
};
use axum::{body::Body, extract::FromRef, http::Request, middleware, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub notification_service: NotificationService,
    pub principal_resolver: PrincipalResolver,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        principal_resolver: PrincipalResolver,
    ) -> Self {
        Self {
            notification_service: NotificationService::new(repository),
            principal_resolver,
        }
    }
}

impl FromRef<AppState> for PrincipalResolver {
    fn from_ref(state: &AppState) -> Self {
        state.principal_resolver.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/notifications", get(handlers::get_notifications))
        .route("/notifications/", get(handlers::get_notifications))
        .route("/notifications/count", get(handlers::count_notifications))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = req
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request_id,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: NotificationConfig) -> Result<Self, AppError> {
        let repository: Arc<dyn NotificationRepository> = match config.store {
            StoreBackend::Mongo => {
                let db = NotificationDb::connect(&config.mongodb.uri, &config.mongodb.database)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to MongoDB: {}", e);
                        e
                    })?;

                db.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;

                Arc::new(db)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory notification store; data is not persisted");
                Arc::new(InMemoryNotificationStore::new())
            }
        };

        let verifier = TokenVerifier::from_config(&config.auth).map_err(|e| {
            tracing::error!("Failed to initialize token verifier: {}", e);
            e
        })?;
        if config.auth.trust_user_header {
            tracing::warn!("Trusting X-User-ID from gateway when no bearer token is sent");
        }

        let state = AppState::new(
            repository,
            PrincipalResolver::new(verifier, config.auth.trust_user_header),
        );

        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Notification service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until `shutdown` resolves.
    pub async fn run_until_stopped<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}
