//! todo-start server: backend API, admin shell and the todo pages on one listener.
//!
//! Configuration comes from the environment (a `.env` file is read if present).

use std::error::Error;
use todo_start::{app_router, AppConfig, Backend};
use tokio::net::TcpListener;

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                tracing::warn!("could not register signal handlers, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("todo_start=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr;
    let backend = Backend::init(config).await?;
    let app = app_router(backend.clone());

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("todo-start listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;

    backend.shutdown().await;
    Ok(())
}
