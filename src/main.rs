use chit_auction::{
    config::{self, database},
    core::AuctionEngine,
    errors::Result,
    notify::{Delivery, Notifier},
    scheduler::Scheduler,
};
use dotenvy::dotenv;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Logs every published delivery until the notifier goes away.
async fn log_deliveries(mut rx: Receiver<Delivery>) {
    loop {
        match rx.recv().await {
            Ok(delivery) => match delivery.event.to_json() {
                Ok(payload) => info!(channel = %delivery.channel, "{}", payload),
                Err(e) => warn!(channel = %delivery.channel, "Unserializable event: {}", e),
            },
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Settings (chit.toml is optional)
    let settings = config::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Database and schema
    let db = database::create_connection(&settings.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Engine, with a log sink for published events
    let notifier = Notifier::new(settings.event_buffer);
    tokio::spawn(log_deliveries(notifier.subscribe()));
    let engine = AuctionEngine::new(db, notifier, settings.transaction_timeout());

    // 6. Run the scheduler until Ctrl-C
    let scheduler = Scheduler::new(engine, settings.tick_interval());
    scheduler
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested");
        })
        .await;

    Ok(())
}
