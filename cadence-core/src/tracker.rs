//! Collection lifecycle tracker.
//!
//! State machine: `pending --(response received)--> responded` and
//! `pending --(due, no response)--> no_response`. Both targets are terminal;
//! every operation here is idempotent so re-fired ticks and redelivered
//! events are absorbed instead of erroring.

use chrono::{DateTime, Utc};

use crate::error::CadenceError;
use crate::models::{Collection, CollectionStatus};
use crate::store::Store;

/// Deterministic collection id for one logical tick. Re-firing the same
/// (tenant, user, scheduled_at) maps to the same row, so idempotency falls
/// out of the storage key instead of a lock.
pub fn tick_collection_id(tenant_id: &str, user_id: &str, scheduled_at: DateTime<Utc>) -> String {
    format!("c:{}:{}:{}", tenant_id, user_id, scheduled_at.timestamp())
}

/// Create the pending collection for a tick. A duplicate insert means the
/// tick already fired for this slot; that is success, not an error.
pub async fn create_for_tick(
    store: &dyn Store,
    tenant_id: &str,
    user_id: &str,
    scheduled_at: DateTime<Utc>,
) -> Result<Collection, CadenceError> {
    let collection = Collection {
        tenant_id: tenant_id.to_string(),
        id: tick_collection_id(tenant_id, user_id, scheduled_at),
        user_id: user_id.to_string(),
        scheduled_at,
        status: CollectionStatus::Pending,
    };

    let created = store.insert_collection(&collection).await?;
    if !created {
        tracing::debug!(
            tenant_id,
            collection_id = %collection.id,
            "tick re-fired for an existing collection"
        );
        if let Some(existing) = store.get_collection(tenant_id, &collection.id).await? {
            return Ok(existing);
        }
    }
    Ok(collection)
}

/// Idempotent: silent no-op when the collection is missing or terminal.
pub async fn mark_responded(
    store: &dyn Store,
    tenant_id: &str,
    collection_id: &str,
) -> Result<(), CadenceError> {
    store
        .transition_collection(tenant_id, collection_id, CollectionStatus::Responded)
        .await?;
    Ok(())
}

/// Close out a pending collection whose due time has elapsed. No-op when the
/// record is missing, already terminal, or not yet due.
pub async fn mark_no_response_if_due(
    store: &dyn Store,
    tenant_id: &str,
    collection_id: &str,
    now: DateTime<Utc>,
) -> Result<(), CadenceError> {
    let Some(collection) = store.get_collection(tenant_id, collection_id).await? else {
        return Ok(());
    };
    if collection.status.is_terminal() || collection.scheduled_at > now {
        return Ok(());
    }
    // The store re-checks `pending`, so a response racing us wins cleanly.
    store
        .transition_collection(tenant_id, collection_id, CollectionStatus::NoResponse)
        .await?;
    Ok(())
}

pub async fn list_recent(
    store: &dyn Store,
    tenant_id: &str,
    limit: i64,
) -> Result<Vec<Collection>, CadenceError> {
    store.list_recent_collections(tenant_id, limit).await
}

// ============================================================================
// TESTS
// ============================================================================
