//! # Built-in subscribers
//!
//! - [`LogWriter`]: writes events through `tracing`.
//! - [`ServiceTally`]: folds events into run statistics.

mod log;
mod tally;

pub use log::LogWriter;
pub use tally::{ServiceTally, TallySnapshot};
