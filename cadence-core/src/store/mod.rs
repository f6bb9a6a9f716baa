//! Storage abstraction. The store is the single source of truth and the only
//! shared mutable resource; dedupe and deterministic-id invariants are
//! enforced here, at the storage boundary, not by check-then-insert in
//! callers.

mod memory;
mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::CadenceError;
use crate::models::{Collection, CollectionStatus, DailySummary, DayCount, OrgPolicy, Response};

/// Outcome of a response insert under the (tenant_id, dedupe_key) constraint.
#[derive(Debug, Clone)]
pub enum ResponseInsert {
    Inserted,
    /// The dedupe key was already recorded; the stored row is returned and
    /// the caller treats the delivery as already processed.
    Duplicate(Response),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert-or-ignore on (tenant_id, id). Returns `false` when the row
    /// already existed — success with no new effect, never an error.
    async fn insert_collection(&self, collection: &Collection) -> Result<bool, CadenceError>;

    async fn get_collection(
        &self,
        tenant_id: &str,
        id: &str,
    ) -> Result<Option<Collection>, CadenceError>;

    /// Apply a terminal status, but only while the row is still pending.
    /// Returns `false` when nothing changed (missing row or terminal state).
    async fn transition_collection(
        &self,
        tenant_id: &str,
        id: &str,
        status: CollectionStatus,
    ) -> Result<bool, CadenceError>;

    /// Collections ordered by `scheduled_at` descending, newest first.
    async fn list_recent_collections(
        &self,
        tenant_id: &str,
        limit: i64,
    ) -> Result<Vec<Collection>, CadenceError>;

    async fn insert_response(&self, response: &Response) -> Result<ResponseInsert, CadenceError>;

    async fn set_processed_text(
        &self,
        tenant_id: &str,
        response_id: &str,
        processed: &str,
    ) -> Result<(), CadenceError>;

    /// Processed texts for one user on one UTC calendar day, ascending by
    /// receipt time. Rows not yet processed yield an empty string.
    async fn list_day_texts(
        &self,
        tenant_id: &str,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Vec<String>, CadenceError>;

    /// Response counts per (user, day) over an inclusive date range.
    async fn count_responses_by_day(
        &self,
        tenant_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayCount>, CadenceError>;

    async fn upsert_daily_summary(&self, summary: &DailySummary) -> Result<(), CadenceError>;

    async fn get_daily_summary(
        &self,
        tenant_id: &str,
        day: NaiveDate,
        user_id: &str,
    ) -> Result<Option<DailySummary>, CadenceError>;

    async fn get_org_policy(&self, tenant_id: &str) -> Result<Option<OrgPolicy>, CadenceError>;

    async fn put_org_policy(&self, policy: &OrgPolicy) -> Result<(), CadenceError>;
}
