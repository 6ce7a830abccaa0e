//! Minimal liveness probe for orchestration platforms.

use axum::{Router, routing::get};
use tokio::task::JoinHandle;
use tracing::{error, info};

async fn healthz() -> &'static str {
    "ok"
}

pub fn router() -> Router {
    Router::new().route("/healthz", get(healthz))
}

/// Spawn the probe server on `0.0.0.0:{port}`.
pub fn spawn(port: u16) -> JoinHandle<()> {
    tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(port, error = %e, "Failed to bind health probe port");
                return;
            }
        };
        info!(port, "Health probe listening");
        axum::serve(listener, router()).await.ok();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn healthz_returns_200() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router()).await.ok();
        });

        let resp = reqwest::get(format!("http://{addr}/healthz")).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "ok");
    }
}
