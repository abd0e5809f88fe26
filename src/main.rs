use ironconsole::{config::Config, server};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ironconsole=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting IronConsole storage admin API...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Rate limiting: {} requests per {}s window",
        config.rate_limit.requests, config.rate_limit.window_secs
    );

    if let Err(e) = server::run(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
