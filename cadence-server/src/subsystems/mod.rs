pub mod reporting;
pub mod scheduler;
pub mod summary;
