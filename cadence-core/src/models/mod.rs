pub mod collection;
pub mod policy;
pub mod response;
pub mod summary;

pub use collection::{Collection, CollectionStatus};
pub use policy::OrgPolicy;
pub use response::Response;
pub use summary::{DailySummary, DayCount};
