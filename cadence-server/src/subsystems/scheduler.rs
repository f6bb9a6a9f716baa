//! Per-tenant tick scheduler.
//!
//! One background task per tenant owns that tenant's trigger. The task
//! awaits the handler before arming the next fire, so same-tenant
//! deliveries never overlap while tenants run concurrently, with no
//! global lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use cadence_core::CadenceError;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Callback invoked on every tick. Errors are logged and do not unregister
/// the trigger.
#[async_trait]
pub trait TickHandler: Send + Sync {
    async fn on_tick(&self, tenant_id: &str, fired_at: DateTime<Utc>) -> anyhow::Result<()>;
}

/// A tenant's tick cadence: a fixed interval in hours or a five-field cron
/// expression evaluated in UTC.
#[derive(Debug, Clone)]
pub enum Cadence {
    IntervalHours(u64),
    Cron(Box<Schedule>),
}

impl Cadence {
    /// Parse `interval_hours=N` or a cron expression. Invalid strings fail
    /// here, at schedule time, never inside the running loop.
    pub fn parse(expr: &str) -> Result<Self, CadenceError> {
        if let Some(rest) = expr.strip_prefix("interval_hours=") {
            let hours: u64 = rest
                .trim()
                .parse()
                .map_err(|_| invalid(expr, "interval hours must be an integer"))?;
            if hours == 0 {
                return Err(invalid(expr, "interval hours must be at least 1"));
            }
            // The loop converts hours to whole seconds; reject values that
            // would overflow that conversion.
            if hours.checked_mul(3600).is_none() {
                return Err(invalid(expr, "interval hours too large"));
            }
            return Ok(Cadence::IntervalHours(hours));
        }

        // The cron crate expects 6 fields (with seconds); operators write 5.
        let full_expr = format!("0 {expr}");
        let schedule =
            Schedule::from_str(&full_expr).map_err(|e| invalid(expr, &e.to_string()))?;
        Ok(Cadence::Cron(Box::new(schedule)))
    }
}

fn invalid(expr: &str, reason: &str) -> CadenceError {
    CadenceError::InvalidCadence {
        expr: expr.to_string(),
        reason: reason.to_string(),
    }
}

type SharedHandler = Arc<RwLock<Option<Arc<dyn TickHandler>>>>;

/// Owns one recurring trigger per tenant. Re-scheduling a tenant replaces
/// its trigger (last-write-wins); at most one handler is registered.
pub struct TickScheduler {
    handler: SharedHandler,
    jobs: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickScheduler {
    pub fn new() -> Self {
        Self {
            handler: Arc::new(RwLock::new(None)),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Install the tick callback. Firing before registration is a silent
    /// no-op because registration order relative to scheduling is not
    /// guaranteed.
    pub fn register_handler(&self, handler: Arc<dyn TickHandler>) {
        *self.handler.write().unwrap() = Some(handler);
    }

    pub fn schedule(&self, tenant_id: &str, cadence: Cadence) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(previous) = jobs.remove(tenant_id) {
            previous.abort();
            tracing::info!(tenant_id, "replacing existing tick trigger");
        }

        tracing::info!(tenant_id, cadence = ?cadence, "tick trigger scheduled");
        let handle = tokio::spawn(run_tenant_loop(
            tenant_id.to_string(),
            cadence,
            self.handler.clone(),
        ));
        jobs.insert(tenant_id.to_string(), handle);
    }

    /// Remove a tenant's trigger. Returns whether one existed.
    pub fn cancel(&self, tenant_id: &str) -> bool {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.remove(tenant_id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn shutdown(&self) {
        let mut jobs = self.jobs.lock().unwrap();
        for (tenant_id, handle) in jobs.drain() {
            tracing::debug!(tenant_id, "tick trigger stopped");
            handle.abort();
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

async fn run_tenant_loop(tenant_id: String, cadence: Cadence, handler: SharedHandler) {
    match cadence {
        Cadence::IntervalHours(hours) => {
            let period = Duration::from_secs(hours * 3600);
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            // A slow handler drops missed fires instead of bursting.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                fire(&tenant_id, &handler).await;
            }
        }
        Cadence::Cron(schedule) => loop {
            let Some(next) = schedule.upcoming(Utc).next() else {
                tracing::warn!(tenant_id, "cron schedule has no upcoming fire; trigger stopped");
                return;
            };
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            fire(&tenant_id, &handler).await;
        },
    }
}

async fn fire(tenant_id: &str, handler: &SharedHandler) {
    // Clone out of the lock; never hold it across the await.
    let current = handler.read().unwrap().clone();
    match current {
        Some(h) => {
            let fired_at = Utc::now();
            if let Err(e) = h.on_tick(tenant_id, fired_at).await {
                tracing::error!(tenant_id, error = %e, "tick handler failed");
            }
        }
        None => {
            tracing::debug!(tenant_id, "tick fired with no handler registered");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
