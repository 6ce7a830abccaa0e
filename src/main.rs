use std::sync::Arc;

use thread_relay::config::RelayConfig;
use thread_relay::delivery::{RetryPolicy, TelegramSink};
use thread_relay::health;
use thread_relay::media::MediaFetcher;
use thread_relay::relay::{Relay, RelayDeps};
use thread_relay::source::HttpPostSource;
use thread_relay::store::LibSqlStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RelayConfig::from_env()?;

    eprintln!("📡 thread-relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Feed: {}", config.thread_url);
    eprintln!("   Channel: {}", config.channel_id);
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!(
        "   Sweep: every {}s (+1-5s jitter), reserve {}",
        config.check_interval.as_secs(),
        match config.reserve_order {
            thread_relay::config::ReserveOrder::BeforeSend => "before send",
            thread_relay::config::ReserveOrder::AfterSend => "after send",
        }
    );

    let store = Arc::new(LibSqlStore::new_local(&config.db_path).await?);
    let source = Arc::new(HttpPostSource::new(
        &config.thread_url,
        config.fetch_timeout,
    )?);
    let sink = Arc::new(TelegramSink::new(
        config.bot_token.clone(),
        config.channel_id.clone(),
        config.send_delay,
        config.send_timeout,
    ));
    let media = MediaFetcher::new(config.fetch_timeout);

    let _health = health::spawn(config.health_port);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let relay = Arc::new(Relay::new(
        RelayDeps {
            source,
            store,
            sink,
            media,
        },
        RetryPolicy::new(config.max_attempts),
        config.reserve_order,
        shutdown_rx,
    ));

    let loop_handle = tokio::spawn(Arc::clone(&relay).run(config.check_interval));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
    loop_handle.await?;

    Ok(())
}
