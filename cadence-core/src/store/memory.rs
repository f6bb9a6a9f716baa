//! In-memory store for tests and single-process local runs. Mirrors the
//! uniqueness guarantees the Postgres schema enforces with constraints.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::CadenceError;
use crate::models::{Collection, CollectionStatus, DailySummary, DayCount, OrgPolicy, Response};
use crate::store::{ResponseInsert, Store};

#[derive(Default)]
struct Inner {
    /// (tenant_id, id) -> collection
    collections: HashMap<(String, String), Collection>,
    /// (tenant_id, id) -> response
    responses: HashMap<(String, String), Response>,
    /// (tenant_id, dedupe_key) -> response id
    dedupe: HashMap<(String, String), String>,
    /// (tenant_id, date, user_id) -> summary
    summaries: HashMap<(String, NaiveDate, String), DailySummary>,
    policies: HashMap<String, OrgPolicy>,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn insert_collection(&self, collection: &Collection) -> Result<bool, CadenceError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (collection.tenant_id.clone(), collection.id.clone());
        if inner.collections.contains_key(&key) {
            return Ok(false);
        }
        inner.collections.insert(key, collection.clone());
        Ok(true)
    }

    async fn get_collection(
        &self,
        tenant_id: &str,
        id: &str,
    ) -> Result<Option<Collection>, CadenceError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .collections
            .get(&(tenant_id.to_string(), id.to_string()))
            .cloned())
    }

    async fn transition_collection(
        &self,
        tenant_id: &str,
        id: &str,
        status: CollectionStatus,
    ) -> Result<bool, CadenceError> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .collections
            .get_mut(&(tenant_id.to_string(), id.to_string()))
        {
            Some(c) if c.status == CollectionStatus::Pending => {
                c.status = status;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_recent_collections(
        &self,
        tenant_id: &str,
        limit: i64,
    ) -> Result<Vec<Collection>, CadenceError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Collection> = inner
            .collections
            .values()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn insert_response(&self, response: &Response) -> Result<ResponseInsert, CadenceError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(key) = &response.dedupe_key {
            let dedupe_key = (response.tenant_id.clone(), key.clone());
            if let Some(existing_id) = inner.dedupe.get(&dedupe_key) {
                let existing = inner
                    .responses
                    .get(&(response.tenant_id.clone(), existing_id.clone()))
                    .cloned()
                    .expect("dedupe index points at a stored response");
                return Ok(ResponseInsert::Duplicate(existing));
            }
            inner.dedupe.insert(dedupe_key, response.id.clone());
        }
        inner.responses.insert(
            (response.tenant_id.clone(), response.id.clone()),
            response.clone(),
        );
        Ok(ResponseInsert::Inserted)
    }

    async fn set_processed_text(
        &self,
        tenant_id: &str,
        response_id: &str,
        processed: &str,
    ) -> Result<(), CadenceError> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .responses
            .get_mut(&(tenant_id.to_string(), response_id.to_string()))
        {
            Some(r) => {
                r.processed_text = Some(processed.to_string());
                Ok(())
            }
            None => Err(CadenceError::NotFound(format!(
                "response {response_id} for tenant {tenant_id}"
            ))),
        }
    }

    async fn list_day_texts(
        &self,
        tenant_id: &str,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Vec<String>, CadenceError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<&Response> = inner
            .responses
            .values()
            .filter(|r| {
                r.tenant_id == tenant_id
                    && r.user_id == user_id
                    && r.received_at.date_naive() == day
            })
            .collect();
        rows.sort_by_key(|r| r.received_at);
        Ok(rows
            .into_iter()
            .map(|r| r.processed_text.clone().unwrap_or_default())
            .collect())
    }

    async fn count_responses_by_day(
        &self,
        tenant_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayCount>, CadenceError> {
        let inner = self.inner.lock().unwrap();
        let mut counts: HashMap<(String, NaiveDate), i64> = HashMap::new();
        for r in inner.responses.values() {
            let day = r.received_at.date_naive();
            if r.tenant_id == tenant_id && day >= start && day <= end {
                *counts.entry((r.user_id.clone(), day)).or_insert(0) += 1;
            }
        }
        let mut rows: Vec<DayCount> = counts
            .into_iter()
            .map(|((user_id, day), count)| DayCount {
                user_id,
                day,
                count,
            })
            .collect();
        rows.sort_by(|a, b| (a.day, &a.user_id).cmp(&(b.day, &b.user_id)));
        Ok(rows)
    }

    async fn upsert_daily_summary(&self, summary: &DailySummary) -> Result<(), CadenceError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (
            summary.tenant_id.clone(),
            summary.date,
            summary.user_id.clone(),
        );
        match inner.summaries.get_mut(&key) {
            Some(existing) => {
                // Upsert overwrites the text only, never the identity fields.
                existing.summary_text = summary.summary_text.clone();
            }
            None => {
                inner.summaries.insert(key, summary.clone());
            }
        }
        Ok(())
    }

    async fn get_daily_summary(
        &self,
        tenant_id: &str,
        day: NaiveDate,
        user_id: &str,
    ) -> Result<Option<DailySummary>, CadenceError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .summaries
            .get(&(tenant_id.to_string(), day, user_id.to_string()))
            .cloned())
    }

    async fn get_org_policy(&self, tenant_id: &str) -> Result<Option<OrgPolicy>, CadenceError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.policies.get(tenant_id).cloned())
    }

    async fn put_org_policy(&self, policy: &OrgPolicy) -> Result<(), CadenceError> {
        let mut inner = self.inner.lock().unwrap();
        inner.policies.insert(policy.tenant_id.clone(), policy.clone());
        Ok(())
    }
}
