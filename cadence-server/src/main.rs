use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use cadence_core::store::PgStore;
use cadence_core::{ai, db, tracker, CadenceConfig};
use cadence_server::{Cadence, TickHandler, TickScheduler};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "cadence.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

/// Records each tick by creating one pending collection per configured user.
struct CollectionTickHandler {
    store: Arc<PgStore>,
    users_by_tenant: HashMap<String, Vec<String>>,
}

#[async_trait]
impl TickHandler for CollectionTickHandler {
    async fn on_tick(&self, tenant_id: &str, fired_at: DateTime<Utc>) -> anyhow::Result<()> {
        let Some(users) = self.users_by_tenant.get(tenant_id) else {
            tracing::warn!(tenant_id, "tick fired for a tenant with no configured users");
            return Ok(());
        };
        for user_id in users {
            tracker::create_for_tick(self.store.as_ref(), tenant_id, user_id, fired_at).await?;
        }
        tracing::info!(tenant_id, users = users.len(), %fired_at, "tick recorded");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Load config
    let config = match CadenceConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Connect to DB
    let store = match PgStore::connect(&config.database).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match db::health_check(store.pool()).await {
            Ok(v) => println!("✅ PostgreSQL connected: {}", v),
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }
        println!("✅ Cadence DB health check passed");
        return Ok(());
    }

    store.migrate().await?;

    let provider = ai::create_provider(&config.ai)?;
    tracing::info!(provider = provider.name(), "text provider ready");

    // Shutdown signal
    let (tx, mut shutdown_rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    // Per-tenant tick triggers. Cadence strings fail fast, before anything
    // is scheduled.
    let scheduler = TickScheduler::new();
    let users_by_tenant: HashMap<String, Vec<String>> = config
        .tenants
        .iter()
        .map(|t| (t.tenant_id.clone(), t.users.clone()))
        .collect();
    scheduler.register_handler(Arc::new(CollectionTickHandler {
        store: store.clone(),
        users_by_tenant,
    }));

    for tenant in &config.tenants {
        let expr = tenant
            .cadence
            .as_deref()
            .unwrap_or(&config.scheduler.default_cadence);
        let cadence = Cadence::parse(expr)?;
        scheduler.schedule(&tenant.tenant_id, cadence);
    }
    tracing::info!(tenants = config.tenants.len(), "tick scheduler running");

    let _ = shutdown_rx.recv().await;
    scheduler.shutdown();
    Ok(())
}
