pub mod subsystems;

pub use subsystems::scheduler::{Cadence, TickHandler, TickScheduler};
