use axum::http::StatusCode;
use axum::{Router, response::IntoResponse, routing::get};
use futures::FutureExt;
use movie_info_app::state::AppState;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::Result;

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let app = main_router(state);

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    debug!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

fn main_router(state: AppState) -> Router<()> {
    Router::new()
        .nest("/v1", movie_info_app::movie_info::router())
        .with_state(state)
        .route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let pool = movie_info_dal::new_pool(&config.database_url()).await?;
    Ok(AppState::new(pool))
}
