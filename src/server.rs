use crate::{
    config::Config,
    coordinator::Coordinator,
    db::Database,
    error::Result,
    middleware::rate_limit::RateLimiter,
    routes,
    session::{CookieTransport, SessionTransport},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Arc<Database>,
    pub sessions: Arc<dyn SessionTransport>,
    pub coordinator: Arc<Coordinator>,
    pub rate_limiter: Arc<RateLimiter>,
}

pub async fn run(config: Config) -> Result<()> {
    let db = Arc::new(Database::open(&config.data.dir, config.session.ttl_hours)?);

    let sessions: Arc<dyn SessionTransport> = Arc::new(CookieTransport::new(&config.session));
    let coordinator = Arc::new(Coordinator::new(&config.coordinator));

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit.requests,
        Duration::from_secs(config.rate_limit.window_secs),
    ));
    rate_limiter.spawn_sweeper();

    let state = AppState {
        config: config.clone(),
        db,
        sessions,
        coordinator,
        rate_limiter,
    };

    let app = routes::build_router(state);

    let addr = SocketAddr::new(config.server.host.parse().map_err(anyhow::Error::from)?, config.server.port);
    info!("IronConsole listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        },
    }
}
