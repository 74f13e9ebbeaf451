//! Shared state of one simulation.
//!
//! - [`QueueStore`]: register queues, open flags, remaining-customers counter
//! - [`OperationArbiter`]: single-slot FIFO gate for breaks and shift changes
//! - identifiers and small enums shared by both
//!
//! Both components are created per simulation and handed to agents as
//! `Arc` handles; nothing here is process-global. Their locks are
//! independent and never nested.

mod arbiter;
mod ids;
mod queues;

pub use arbiter::OperationArbiter;
pub use ids::{CustomerId, OperationKind, RegisterId, RegisterStatus};
pub use queues::QueueStore;
