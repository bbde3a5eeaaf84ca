//! Web front end.
//!
//! Serves a single HTML page and a small JSON API over the agent. The server
//! shuts down gracefully on SIGINT/SIGTERM; a second signal or the timeout
//! forces exit.

pub mod handlers;

use crate::agent::Agent;
use crate::error::{AgentError, AgentResult};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the application router.
pub fn router(agent: Agent) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/v0/generate_sql", get(handlers::generate_sql))
        .route("/api/v0/run_sql", post(handlers::run_sql))
        .route("/api/v0/ask", post(handlers::ask))
        .route("/api/v0/get_training_data", get(handlers::get_training_data))
        .route("/api/v0/train", post(handlers::train))
        .route(
            "/api/v0/remove_training_data",
            post(handlers::remove_training_data),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(agent)
}

pub struct WebServer {
    agent: Agent,
    host: String,
    port: u16,
}

impl WebServer {
    pub fn new(agent: Agent, host: impl Into<String>, port: u16) -> Self {
        Self {
            agent,
            host: host.into(),
            port,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Serve until a shutdown signal arrives.
    pub async fn run(&self) -> AgentResult<()> {
        let bind_addr = self.bind_addr();
        let app = router(self.agent.clone());

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            AgentError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", bind_addr, e),
            ))
        })?;
        info!("Web app listening on http://{}", bind_addr);

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();

        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("Web server stopped"),
                    Err(e) => {
                        error!(error = %e, "Web server error");
                        return Err(AgentError::Io(e));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for requests to finish (send signal again to force exit)..."
                );

                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        Ok(())
    }
}

/// Wait for SIGINT or SIGTERM.
async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
