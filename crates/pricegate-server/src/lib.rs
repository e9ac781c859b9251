//! # Pricegate Server
//!
//! axum HTTP surface over [`pricegate_core::Engine`].
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /price/{symbol}` | classify and resolve |
//! | `GET /futures/{symbol}` | resolve as a future |
//! | `GET /index/{symbol}` | resolve as an index |
//! | `GET /crypto/{symbol}` | CoinGecko price, `400` on failure |
//! | `GET /history/{symbol}?asset_type=` | closes plus change and volatility summary |
//! | `GET /health` | liveness |
//! | `GET\|POST /proxy` | allow-listed forwarding |

pub mod app;
pub mod cli;
pub mod error;
pub mod keepalive;
pub mod logging;
pub mod models;
pub mod routes;

use std::sync::Arc;

use pricegate_core::{Engine, EngineConfig, ReqwestHttpClient};
use tracing::info;

pub use app::{app_router, AppState};
pub use cli::ServerArgs;
pub use error::{ApiError, ServerError};
pub use keepalive::{KeepAlive, KeepAliveHandle};

/// Build the engine, start keep-alive, and serve until Ctrl-C.
pub async fn run(args: ServerArgs) -> Result<(), ServerError> {
    let config = EngineConfig::from_env()?;
    let user_agent = config.user_agent.clone();
    let state = AppState::new(Engine::new(config));

    let keepalive = args.self_ping_target().map(|url| {
        KeepAlive::new(url, Arc::new(ReqwestHttpClient::with_user_agent(&user_agent)))
            .with_interval(args.self_ping_interval())
            .spawn()
    });

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!("Listening on {}", args.listen);

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = keepalive {
        handle.stop();
    }
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
