//! Reporting aggregator. Read-only consumer of ingested responses; rendering
//! (CSV, dashboards) lives outside this crate.

use chrono::NaiveDate;
use serde::Serialize;

use cadence_core::models::DayCount;
use cadence_core::store::Store;
use cadence_core::CadenceError;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub tenant_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: Vec<DayCount>,
}

/// Response counts per (user, day) over an inclusive window.
pub async fn aggregate(
    store: &dyn Store,
    tenant_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Report, CadenceError> {
    if start > end {
        return Err(CadenceError::Validation(format!(
            "report window start {start} is after end {end}"
        )));
    }
    let rows = store.count_responses_by_day(tenant_id, start, end).await?;
    Ok(Report {
        tenant_id: tenant_id.to_string(),
        start,
        end,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::models::Response;
    use cadence_core::store::MemStore;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    async fn seed(store: &MemStore, user: &str, day: u32, hour: u32) {
        let r = Response {
            tenant_id: "t1".to_string(),
            id: Uuid::new_v4().to_string(),
            collection_id: "c1".to_string(),
            user_id: user.to_string(),
            received_at: Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap(),
            raw_text: "done".to_string(),
            processed_text: None,
            dedupe_key: None,
        };
        store.insert_response(&r).await.unwrap();
    }

    #[tokio::test]
    async fn test_aggregate_counts_per_user_day() {
        let store = MemStore::new();
        seed(&store, "u1", 1, 9).await;
        seed(&store, "u1", 1, 17).await;
        seed(&store, "u2", 2, 9).await;

        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let report = aggregate(&store, "t1", start, end).await.unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].user_id, "u1");
        assert_eq!(report.rows[0].count, 2);
        assert_eq!(report.rows[1].user_id, "u2");
        assert_eq!(report.rows[1].count, 1);
    }

    #[tokio::test]
    async fn test_aggregate_excludes_out_of_window_days() {
        let store = MemStore::new();
        seed(&store, "u1", 1, 9).await;
        seed(&store, "u1", 5, 9).await;

        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let report = aggregate(&store, "t1", day, day).await.unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].day, day);
    }

    #[tokio::test]
    async fn test_aggregate_rejects_inverted_window() {
        let store = MemStore::new();
        let start = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(matches!(
            aggregate(&store, "t1", start, end).await,
            Err(CadenceError::Validation(_))
        ));
    }
}
