use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-tenant processing policy. Read-only to the core; admin surfaces own
/// the writes. A missing policy means defaults at every call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgPolicy {
    pub tenant_id: String,
    pub normalize_case: bool,
    pub summary_char_limit: usize,
    /// Persona override per user id, prefixed to treated text as `[persona] `.
    #[serde(default)]
    pub persona_overrides_by_user: HashMap<String, String>,
    /// Context prefix handed to the summarizer.
    #[serde(default)]
    pub pre_prompt: String,
    /// Tick cadence expression for this tenant ("interval_hours=N" or cron).
    #[serde(default)]
    pub cadence: Option<String>,
}

impl OrgPolicy {
    pub fn defaults(tenant_id: &str, summary_char_limit: usize) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            normalize_case: true,
            summary_char_limit,
            persona_overrides_by_user: HashMap::new(),
            pre_prompt: String::new(),
            cadence: None,
        }
    }

    pub fn persona_for(&self, user_id: &str) -> Option<&str> {
        self.persona_overrides_by_user
            .get(user_id)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }
}
