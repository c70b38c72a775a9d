use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;

use stockwatch_api::app::{build_app, services::AppServices};
use stockwatch_api::config::AppConfig;
use stockwatch_auth::Hs256Tokens;
use stockwatch_infra::{
    AdminRepository, InMemoryAdminRepository, InMemoryStockRepository, LogOnlySender,
    LowStockNotifier, ManualTrigger, NotificationScheduler, NotificationSender, PgStore,
    SmtpSender, StockRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockwatch_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let (admins, stock): (Arc<dyn AdminRepository>, Arc<dyn StockRepository>) =
        match &config.database_url {
            Some(url) => {
                let store = Arc::new(
                    PgStore::connect(url.expose_secret())
                        .await
                        .context("failed to connect to database")?,
                );
                tracing::info!("using postgres storage");
                let admins: Arc<dyn AdminRepository> = store.clone();
                let stock: Arc<dyn StockRepository> = store;
                (admins, stock)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory storage");
                let admins: Arc<dyn AdminRepository> = Arc::new(InMemoryAdminRepository::new());
                let stock: Arc<dyn StockRepository> = Arc::new(InMemoryStockRepository::new());
                (admins, stock)
            }
        };

    let sender: Arc<dyn NotificationSender> = match &config.smtp {
        Some(settings) => Arc::new(
            SmtpSender::new(settings).context("failed to configure smtp transport")?,
        ),
        None => {
            tracing::warn!("SMTP credentials not set; low-stock emails will only be logged");
            Arc::new(LogOnlySender)
        }
    };

    let notifier = LowStockNotifier::new(stock.clone(), admins.clone(), sender);
    let trigger = ManualTrigger::new(notifier);
    let tokens = Arc::new(Hs256Tokens::new(config.jwt_secret.expose_secret().as_bytes()));

    let scheduler = NotificationScheduler::new(
        config.cron_schedule.clone(),
        config.timezone,
        trigger.clone(),
    )
    .start();

    let app = build_app(AppServices::new(admins, stock, tokens, trigger));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    scheduler.shutdown().await;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
