use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CadenceConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    pub provider: String,
    pub timeout_seconds: u64,
    pub max_cost_per_day_cents: i64,
    pub default_summary_limit: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "dummy".to_string(),
            timeout_seconds: 10,
            max_cost_per_day_cents: 500,
            default_summary_limit: 280,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    pub default_cadence: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_cadence: "interval_hours=24".to_string(),
        }
    }
}

/// A tenant the server schedules ticks for. Each tick creates one pending
/// collection per listed user.
#[derive(Debug, Deserialize, Clone)]
pub struct TenantConfig {
    pub tenant_id: String,
    pub users: Vec<String>,
    pub cadence: Option<String>,
}

impl CadenceConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}
