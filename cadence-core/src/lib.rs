pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod tracker;

pub use ai::{
    create_provider, CapabilityError, DummyProvider, Interpretation, TextCapability,
    TimedCapability,
};
pub use config::CadenceConfig;
pub use error::CadenceError;
pub use models::{Collection, CollectionStatus, DailySummary, DayCount, OrgPolicy, Response};
pub use pipeline::{TreatedText, COST_LIMIT_MESSAGE};
pub use store::{MemStore, PgStore, ResponseInsert, Store};
