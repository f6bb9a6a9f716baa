use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One user's rolled-up processed texts for one calendar day.
/// Upsert target keyed on (tenant_id, date, user_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub tenant_id: String,
    pub id: String,
    pub date: NaiveDate,
    pub user_id: String,
    pub summary_text: String,
}

impl DailySummary {
    pub fn row_id(tenant_id: &str, user_id: &str, date: NaiveDate) -> String {
        format!("sum:{tenant_id}:{user_id}:{date}")
    }
}

/// Response count for one user on one day, as consumed by reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub user_id: String,
    pub day: NaiveDate,
    pub count: i64,
}
