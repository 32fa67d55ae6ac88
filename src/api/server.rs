use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use super::{build_router, AppState};
use crate::analyzer::{AnalysisPipeline, GeminiClient};
use crate::config::Config;
use crate::error::Result;
use crate::store::AnalysisStore;

/// 設定からパイプラインを組み立てる
pub fn build_state(config: &Config) -> Result<AppState> {
    let store = Arc::new(AnalysisStore::open(&config.database_location())?);
    let client = GeminiClient::new(config)?;
    Ok(AppState::new(AnalysisPipeline::new(client, store)))
}

/// サーバーを起動し、Ctrl+C で終了する
pub async fn serve(config: &Config, bind: SocketAddr) -> Result<()> {
    let state = build_state(config)?;
    let app = build_router(state);

    if config.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; /api/analyze will fail until it is configured");
    }

    let listener = TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, model = %config.model, "Defect Detective API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
