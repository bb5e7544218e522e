use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gala_worker::{Watchdog, WatchdogConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gala_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WatchdogConfig::from_env();
    tracing::info!(
        interval_secs = config.scan_interval_secs,
        stall_secs = config.stall_after_secs,
        api = %config.api_base_url,
        "Watchdog starting"
    );

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = gala_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");

    let cancel = CancellationToken::new();
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received SIGINT, stopping watchdog");
            shutdown_cancel.cancel();
        }
    });

    Watchdog::new(pool, config).run(cancel).await;
    tracing::info!("Watchdog stopped");
}
