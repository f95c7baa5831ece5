use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use docqa_backend::config::AppPaths;
use docqa_backend::logging;
use docqa_backend::server::router::router;
use docqa_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = AppPaths::new();
    let _log_guard = logging::init(&paths);

    let state = AppState::initialize(paths).await?;

    let bind_addr = format!("127.0.0.1:{}", state.settings.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let app: Router = router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
