//! # Core subscriber trait
//!
//! `Subscribe` is the observer interface of the simulation: renderers, loggers
//! and test harnesses implement it to follow queue and register changes. Each
//! subscriber is driven by a dedicated worker fed by a bounded queue owned by
//! the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (rendering, I/O); they do **not** block
//!   agents nor other subscribers.
//! - Events arrive in publish order for a given subscriber.
//! - If a subscriber's queue overflows, events for that subscriber are
//!   **dropped** and a `SubscriberOverflow` event is published.
//!
//! ## Example
//! ```rust
//! use checkout::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct Departures;
//!
//! #[async_trait]
//! impl Subscribe for Departures {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::CustomerServed {
//!             // move the customer's shape off screen...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "departures" }
//! }
//! ```

use crate::events::Event;
use async_trait::async_trait;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
