use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a collection. `Responded` and `NoResponse` are terminal;
/// no transition ever leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Pending,
    Responded,
    NoResponse,
}

impl CollectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::Pending => "pending",
            CollectionStatus::Responded => "responded",
            CollectionStatus::NoResponse => "no_response",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CollectionStatus::Pending)
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CollectionStatus::Pending),
            "responded" => Ok(CollectionStatus::Responded),
            "no_response" => Ok(CollectionStatus::NoResponse),
            other => Err(format!("unknown collection status: {other}")),
        }
    }
}

/// One scheduled prompt for one user. Identity is (tenant_id, id); the id is
/// derived deterministically from (tenant, user, scheduled_at) so a re-fired
/// tick maps to the same row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub tenant_id: String,
    pub id: String,
    pub user_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: CollectionStatus,
}
