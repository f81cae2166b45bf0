use std::sync::Arc;
use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tontine={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    if let Some(server) = settings.server {
        let ledger = settings.ledger;
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let db = match parse_database(&server.database).await {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!("failed to initialize database: {err}");
                    return;
                }
            };

            let engine = match build_engine(db.clone(), ledger.as_ref()).await {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::error!("failed to build engine from database: {err}");
                    return;
                }
            };

            if let Some(ledger) = &ledger {
                let interval_minutes = ledger.sync_interval_minutes.unwrap_or(0);
                if interval_minutes > 0 {
                    match build_engine(db.clone(), Some(ledger)).await {
                        Ok(sync_engine) => {
                            tokio::spawn(run_sync_loop(sync_engine, interval_minutes));
                        }
                        Err(err) => {
                            tracing::error!("failed to build engine for sync task: {err}");
                        }
                    }
                }
            }

            let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) = server::run_with_listener(engine, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn build_engine(
    db: sea_orm::DatabaseConnection,
    ledger: Option<&settings::Ledger>,
) -> engine::ResultEngine<engine::Engine> {
    let mut builder = engine::Engine::builder().database(db);
    if let Some(ledger) = ledger {
        let client = engine::HttpLedgerClient::new(
            &ledger.base_url,
            ledger.user_agent.as_deref().unwrap_or("tontine"),
        )?;
        builder = builder
            .ledger(Arc::new(client))
            .treasury_account(ledger.treasury_account_id);
    }
    builder.build().await
}

/// Scheduled reconciliation. One task, one tick at a time, so runs never
/// overlap.
async fn run_sync_loop(engine: engine::Engine, interval_minutes: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_minutes * 60));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if let Err(err) = engine.sync().await {
            tracing::warn!("scheduled sync failed: {err}");
        }
    }
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
