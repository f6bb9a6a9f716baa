//! Response ingestion: at-most-once recording of inbound answers and the
//! transition of the owning collection.
//!
//! Ordering matters: the response row is persisted before the collection
//! transition, so a crash between the two leaves a recoverable state
//! (response recorded, collection still pending) rather than data loss.

use chrono::Utc;
use uuid::Uuid;

use cadence_core::models::{OrgPolicy, Response};
use cadence_core::store::{ResponseInsert, Store};
use cadence_core::{pipeline, tracker, CadenceError, TextCapability};

/// Outcome of an ingestion call. `created` is false when the dedupe key had
/// already been recorded; the returned response is then the stored original.
#[derive(Debug, Clone)]
pub struct ReceiveOutcome {
    pub response: Response,
    pub created: bool,
}

/// Record an inbound response and mark its collection responded.
///
/// Empty-after-trim text is rejected before any mutation. A redelivered
/// event (same tenant + dedupe key) returns the existing row without error,
/// without a second insert, and without touching the collection again.
pub async fn receive(
    store: &dyn Store,
    tenant_id: &str,
    collection_id: &str,
    user_id: &str,
    text: &str,
    dedupe_key: Option<&str>,
) -> Result<ReceiveOutcome, CadenceError> {
    if text.trim().is_empty() {
        return Err(CadenceError::Validation("empty response text".into()));
    }

    let response = Response {
        tenant_id: tenant_id.to_string(),
        id: Uuid::new_v4().to_string(),
        collection_id: collection_id.to_string(),
        user_id: user_id.to_string(),
        received_at: Utc::now(),
        raw_text: text.to_string(),
        processed_text: None,
        dedupe_key: dedupe_key.map(str::to_string),
    };

    match store.insert_response(&response).await? {
        ResponseInsert::Duplicate(existing) => {
            tracing::info!(
                tenant_id,
                dedupe_key = dedupe_key.unwrap_or_default(),
                "duplicate delivery ignored"
            );
            Ok(ReceiveOutcome {
                response: existing,
                created: false,
            })
        }
        ResponseInsert::Inserted => {
            tracker::mark_responded(store, tenant_id, collection_id).await?;
            Ok(ReceiveOutcome {
                response,
                created: true,
            })
        }
    }
}

/// `receive`, then run the freshly created response through the text
/// pipeline and persist the treated form. Duplicates skip processing — the
/// stored row was treated when it was first accepted.
pub async fn receive_and_treat(
    store: &dyn Store,
    capability: &dyn TextCapability,
    tenant_id: &str,
    collection_id: &str,
    user_id: &str,
    text: &str,
    dedupe_key: Option<&str>,
    default_summary_limit: usize,
) -> Result<ReceiveOutcome, CadenceError> {
    let mut outcome = receive(store, tenant_id, collection_id, user_id, text, dedupe_key).await?;
    if !outcome.created {
        return Ok(outcome);
    }

    let policy = store
        .get_org_policy(tenant_id)
        .await?
        .unwrap_or_else(|| OrgPolicy::defaults(tenant_id, default_summary_limit));
    let persona = policy.persona_for(user_id);

    let treated = pipeline::treat(capability, &outcome.response.raw_text, &policy, persona).await?;
    store
        .set_processed_text(tenant_id, &outcome.response.id, &treated.text)
        .await?;
    outcome.response.processed_text = Some(treated.text);

    Ok(outcome)
}

// ============================================================================
// TESTS
// ============================================================================
