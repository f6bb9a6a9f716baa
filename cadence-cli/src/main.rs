//! cadence-cli — operational frontend for the Cadence lifecycle engine
//!
//! Talks straight to the Cadence database; the long-running server only owns
//! tick scheduling, so every job here is safe to run alongside it.
//!
//! # Subcommands
//! - `ticks --tenant <id> [-n <limit>]`                    — recent collections
//! - `summarize --tenant <id> --user <id> --day <date>`    — build one daily summary
//! - `mark-no-response --tenant <id> --collection <id>`    — close an overdue collection
//! - `report --tenant <id> --start <date> --end <date>`    — response counts per user/day
//! - `health`                                              — database connectivity check

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use cadence_core::store::{PgStore, Store};
use cadence_core::{ai, db, tracker, CadenceConfig};
use cadence_server::subsystems::{reporting, summary};

const DEFAULT_LIMIT: i64 = 20;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "cadence-cli",
    version,
    about = "Cadence lifecycle engine — operational CLI"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "cadence.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List a tenant's most recent collections, newest first
    Ticks {
        /// Tenant to inspect
        #[arg(long)]
        tenant: String,

        /// Maximum number of collections to show
        #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT)]
        limit: i64,
    },

    /// Build (or rebuild) the daily summary for one user and day
    Summarize {
        #[arg(long)]
        tenant: String,

        #[arg(long)]
        user: String,

        /// UTC day, e.g. 2025-01-01
        #[arg(long)]
        day: NaiveDate,
    },

    /// Close a pending collection as no_response if its tick time has passed
    MarkNoResponse {
        #[arg(long)]
        tenant: String,

        /// Collection id, e.g. c:t1:u1:1735722000
        #[arg(long)]
        collection: String,
    },

    /// Count stored responses per user and day over an inclusive window
    Report {
        #[arg(long)]
        tenant: String,

        /// First UTC day of the window
        #[arg(long)]
        start: NaiveDate,

        /// Last UTC day of the window
        #[arg(long)]
        end: NaiveDate,

        /// Emit the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check database connectivity
    Health,
}

// ============================================================================
// Subcommand Implementations
// ============================================================================

async fn do_ticks(store: &PgStore, tenant: &str, limit: i64) -> anyhow::Result<()> {
    let collections = tracker::list_recent(store, tenant, limit).await?;
    if collections.is_empty() {
        eprintln!("No collections found for tenant: {}", tenant);
        return Ok(());
    }
    for c in &collections {
        println!("{}  {}  {}  {}", c.id, c.user_id, c.scheduled_at, c.status);
    }
    Ok(())
}

async fn do_summarize(
    store: &PgStore,
    config: &CadenceConfig,
    tenant: &str,
    user: &str,
    day: NaiveDate,
) -> anyhow::Result<()> {
    let provider = ai::create_provider(&config.ai)?;
    let s = summary::build_and_store(store, provider.as_ref(), &config.ai, tenant, user, day).await?;
    println!("{}", s.summary_text);
    Ok(())
}

async fn do_mark_no_response(store: &PgStore, tenant: &str, collection: &str) -> anyhow::Result<()> {
    tracker::mark_no_response_if_due(store, tenant, collection, Utc::now()).await?;
    match store.get_collection(tenant, collection).await? {
        Some(c) => println!("{}  {}", c.id, c.status),
        None => {
            eprintln!("cadence-cli: no such collection: {}", collection);
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn do_report(
    store: &PgStore,
    tenant: &str,
    start: NaiveDate,
    end: NaiveDate,
    json: bool,
) -> anyhow::Result<()> {
    let report = reporting::aggregate(store, tenant, start, end).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if report.rows.is_empty() {
        eprintln!("No responses between {} and {}", start, end);
        return Ok(());
    }
    for row in &report.rows {
        println!("{}  {}  {}", row.day, row.user_id, row.count);
    }
    Ok(())
}

async fn do_health(store: &PgStore) -> anyhow::Result<()> {
    match db::health_check(store.pool()).await {
        Ok(v) => println!("✅ PostgreSQL connected: {}", v),
        Err(e) => {
            println!("❌ PostgreSQL connection failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match CadenceConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", cli.config, e);
            std::process::exit(1);
        }
    };

    let store = match PgStore::connect(&config.database).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Ticks { tenant, limit } => do_ticks(&store, &tenant, limit).await,
        Commands::Summarize { tenant, user, day } => {
            do_summarize(&store, &config, &tenant, &user, day).await
        }
        Commands::MarkNoResponse { tenant, collection } => {
            do_mark_no_response(&store, &tenant, &collection).await
        }
        Commands::Report {
            tenant,
            start,
            end,
            json,
        } => do_report(&store, &tenant, start, end, json).await,
        Commands::Health => do_health(&store).await,
    };

    if let Err(e) = result {
        eprintln!("cadence-cli: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
