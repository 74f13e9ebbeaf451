//! # Cashier lifecycle tracker with sequence-based ordering.
//!
//! Keeps track of which cashier agents are currently running, so a shutdown
//! that exceeds its grace period can name the ones that are stuck.
//!
//! ## Architecture
//! ```text
//! CashierAgent ──► Bus ──► driver listener ──► AliveTracker::update()
//!                                                     │
//!                                                     ▼
//!                                    HashMap<String, AgentState>
//!                                 ("cashier-N@register-R" → {seq, alive})
//! ```
//!
//! ## Rules
//! - Only `CashierStarted` / `CashierStopped` change alive state
//! - Events with `seq <= last_seq` for the same agent are rejected (stale)
//! - Reads are **eventually consistent**

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};
use crate::store::RegisterId;

#[derive(Debug, Clone)]
struct AgentState {
    last_seq: u64,
    alive: bool,
}

/// Name under which a cashier shows up in stuck-agent reports.
pub(crate) fn cashier_name(cashier: u32, register: RegisterId) -> String {
    format!("cashier-{cashier}@{register}")
}

/// Thread-safe tracker of running cashier agents.
#[derive(Default)]
pub(crate) struct AliveTracker {
    state: RwLock<HashMap<String, AgentState>>,
}

impl AliveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a lifecycle event if it is newer than the last one seen for that agent.
    ///
    /// Returns `true` if the alive flag was updated.
    pub async fn update(&self, ev: &Event) -> bool {
        let alive = match ev.kind {
            EventKind::CashierStarted => true,
            EventKind::CashierStopped => false,
            _ => return false,
        };
        let (Some(cashier), Some(register)) = (ev.cashier, ev.register) else {
            return false;
        };

        let mut state = self.state.write().await;
        let entry = state
            .entry(cashier_name(cashier, register))
            .or_insert(AgentState {
                last_seq: 0,
                alive: false,
            });
        if ev.seq <= entry.last_seq && entry.last_seq != 0 {
            return false;
        }
        entry.last_seq = ev.seq;
        entry.alive = alive;
        true
    }

    /// Sorted names of agents still running.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut alive: Vec<String> = state
            .iter()
            .filter(|(_, st)| st.alive)
            .map(|(name, _)| name.clone())
            .collect();
        alive.sort_unstable();
        alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(cashier: u32, register: u32) -> Event {
        Event::new(EventKind::CashierStarted)
            .with_cashier(cashier)
            .with_register(RegisterId::new(register))
    }

    fn stopped(cashier: u32, register: u32) -> Event {
        Event::new(EventKind::CashierStopped)
            .with_cashier(cashier)
            .with_register(RegisterId::new(register))
    }

    #[tokio::test]
    async fn tracks_start_and_stop() {
        let tracker = AliveTracker::new();
        assert!(tracker.update(&started(1, 1)).await);
        assert!(tracker.update(&started(2, 2)).await);
        assert!(tracker.update(&stopped(1, 1)).await);

        assert_eq!(tracker.snapshot().await, vec!["cashier-2@register-2".to_string()]);
    }

    #[tokio::test]
    async fn stale_event_is_rejected() {
        let tracker = AliveTracker::new();
        let start = started(1, 1);
        let stop = stopped(1, 1);

        assert!(tracker.update(&stop).await);
        assert!(!tracker.update(&start).await);
        assert!(tracker.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn unrelated_events_are_ignored() {
        let tracker = AliveTracker::new();
        let ev = Event::new(EventKind::CustomerJoined).with_register(RegisterId::new(1));
        assert!(!tracker.update(&ev).await);
    }
}
