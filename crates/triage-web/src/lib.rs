//! # triage-web
//!
//! Single-page web form for triage requests.
//! Serves an embedded page and a JSON API via an Axum web server.

mod assets;
mod server;

pub use server::{parse_report, router, serve, AnalyzeRequest, AnalyzeResponse};

use std::sync::Arc;
use tracing::info;
use triage_orchestrator::Triage;

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Port to serve on
    pub port: u16,
    /// Open browser automatically on launch
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 8501,
            open_browser: false,
        }
    }
}

/// Run the web server until interrupted
pub async fn run(triage: Arc<dyn Triage>, config: WebConfig) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", config.port);
    let url = format!("http://localhost:{}", config.port);

    info!("Starting triage web server on {}", addr);

    if config.open_browser {
        let url_clone = url.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url_clone) {
                tracing::warn!(error = %e, "Failed to open browser");
            }
        });
    }

    println!("Triage web running at {}", url);
    println!("Press Ctrl+C to stop");

    serve(triage, &addr).await
}
