//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait (the observer interface of the
//! simulation), the [`SubscriberSet`] fan-out, and built-in implementations.
//!
//! ## Architecture
//! ```text
//! QueueStore / Arbiter / Agents ── publish(Event) ──► Bus ──► driver listener
//!                                                                  │
//!                                                   ┌──────────────┴─────┐
//!                                                   ▼                    ▼
//!                                             AliveTracker         SubscriberSet
//!                                                                ┌──────┼───────┐
//!                                                                ▼      ▼       ▼
//!                                                           LogWriter Tally  Renderer...
//! ```

mod embedded;
mod subscribe;
mod subscriber_set;

pub use embedded::{LogWriter, ServiceTally, TallySnapshot};
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
