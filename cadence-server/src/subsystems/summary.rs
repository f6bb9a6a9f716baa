//! Daily summary builder. Invoked by an external job trigger with an
//! explicit (tenant, user, day); the core never decides who to summarize.

use chrono::NaiveDate;

use cadence_core::config::AiConfig;
use cadence_core::models::{DailySummary, OrgPolicy};
use cadence_core::store::Store;
use cadence_core::{pipeline, CadenceError, TextCapability};

/// Roll one user's processed texts for `day` into a single summary row.
///
/// Safe to re-run: the upsert is keyed on (tenant, day, user) and only the
/// text is overwritten, so a retried job never duplicates rows.
pub async fn build_and_store(
    store: &dyn Store,
    capability: &dyn TextCapability,
    ai: &AiConfig,
    tenant_id: &str,
    user_id: &str,
    day: NaiveDate,
) -> Result<DailySummary, CadenceError> {
    // Ascending receipt order; this fixes the concatenation order fed to
    // the summarizer.
    let texts = store.list_day_texts(tenant_id, user_id, day).await?;
    let policy = store
        .get_org_policy(tenant_id)
        .await?
        .unwrap_or_else(|| OrgPolicy::defaults(tenant_id, ai.default_summary_limit));

    let summary_text = pipeline::summarize_day(
        capability,
        &texts,
        &policy.pre_prompt,
        &policy,
        ai.max_cost_per_day_cents,
    )
    .await?;

    let summary = DailySummary {
        tenant_id: tenant_id.to_string(),
        id: DailySummary::row_id(tenant_id, user_id, day),
        date: day,
        user_id: user_id.to_string(),
        summary_text,
    };
    store.upsert_daily_summary(&summary).await?;

    tracing::info!(
        tenant_id,
        user_id,
        %day,
        texts = texts.len(),
        summary_chars = summary.summary_text.chars().count(),
        "daily summary stored"
    );
    Ok(summary)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::models::Response;
    use cadence_core::store::MemStore;
    use cadence_core::{DummyProvider, COST_LIMIT_MESSAGE};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn ai() -> AiConfig {
        AiConfig::default()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    async fn seed_response(store: &MemStore, hour: u32, processed: &str) {
        let r = Response {
            tenant_id: "t1".to_string(),
            id: Uuid::new_v4().to_string(),
            collection_id: "c1".to_string(),
            user_id: "u1".to_string(),
            received_at: Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0).unwrap(),
            raw_text: processed.to_lowercase(),
            processed_text: Some(processed.to_string()),
            dedupe_key: None,
        };
        store.insert_response(&r).await.unwrap();
    }

    #[tokio::test]
    async fn test_build_and_store_concatenates_in_receipt_order() {
        let store = MemStore::new();
        seed_response(&store, 17, "Closed the release").await;
        seed_response(&store, 9, "Opened the sprint").await;

        let s = build_and_store(&store, &DummyProvider, &ai(), "t1", "u1", day())
            .await
            .unwrap();
        assert_eq!(s.summary_text, "Opened the sprint Closed the release");
        assert_eq!(s.id, "sum:t1:u1:2025-01-01");
    }

    #[tokio::test]
    async fn test_rerun_overwrites_single_row() {
        let store = MemStore::new();
        seed_response(&store, 9, "First pass").await;
        build_and_store(&store, &DummyProvider, &ai(), "t1", "u1", day())
            .await
            .unwrap();

        seed_response(&store, 10, "Second pass").await;
        let second = build_and_store(&store, &DummyProvider, &ai(), "t1", "u1", day())
            .await
            .unwrap();

        let stored = store.get_daily_summary("t1", day(), "u1").await.unwrap().unwrap();
        assert_eq!(stored.summary_text, second.summary_text);
        assert_eq!(stored.summary_text, "First pass Second pass");
    }

    #[tokio::test]
    async fn test_policy_limit_and_pre_prompt_apply() {
        let store = MemStore::new();
        let mut policy = OrgPolicy::defaults("t1", 280);
        policy.pre_prompt = "Standup:".to_string();
        policy.summary_char_limit = 12;
        store.put_org_policy(&policy).await.unwrap();
        seed_response(&store, 9, "shipped it").await;

        let s = build_and_store(&store, &DummyProvider, &ai(), "t1", "u1", day())
            .await
            .unwrap();
        assert_eq!(s.summary_text, "Standup:ship");
    }

    #[tokio::test]
    async fn test_cost_gate_stores_placeholder_summary() {
        let store = MemStore::new();
        // 250k chars => 62_500 tokens => 625 cents, over the 500-cent default.
        let big = "x".repeat(250_000);
        let r = Response {
            tenant_id: "t1".to_string(),
            id: Uuid::new_v4().to_string(),
            collection_id: "c1".to_string(),
            user_id: "u1".to_string(),
            received_at: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
            raw_text: big.clone(),
            processed_text: Some(big),
            dedupe_key: None,
        };
        store.insert_response(&r).await.unwrap();

        let s = build_and_store(&store, &DummyProvider, &ai(), "t1", "u1", day())
            .await
            .unwrap();
        assert_eq!(s.summary_text, COST_LIMIT_MESSAGE);

        // The placeholder still occupies the summary slot.
        let stored = store.get_daily_summary("t1", day(), "u1").await.unwrap().unwrap();
        assert_eq!(stored.summary_text, COST_LIMIT_MESSAGE);
    }

    #[tokio::test]
    async fn test_empty_day_produces_empty_summary_row() {
        let store = MemStore::new();
        let s = build_and_store(&store, &DummyProvider, &ai(), "t1", "u1", day())
            .await
            .unwrap();
        assert_eq!(s.summary_text, "");
        assert!(store
            .get_daily_summary("t1", day(), "u1")
            .await
            .unwrap()
            .is_some());
    }
}
