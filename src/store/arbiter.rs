//! # Single-slot operation arbiter.
//!
//! At most one register in the whole store may be on a break or in the middle
//! of a shift change at any time. [`OperationArbiter`] enforces that with a
//! FIFO of pending requests and a single "active" slot.
//!
//! ## Lifecycle of a request
//! ```text
//! request(R) ──► pending: [.., R]
//!                  │
//! try_acquire(R) ──┤ granted only when no holder AND head == R
//!                  ▼
//!               active = Some(R)      (R closes, drains, pauses / hands over)
//!                  │
//! release(R) ──────┘ pops head (if R), clears active (if R)
//!
//! cancel(R): drops a stale pending entry, or releases if R holds the slot
//! ```
//!
//! ## Rules
//! - Grants are strictly FIFO: a register never skips an earlier requester.
//! - `release` is idempotent and never pops another register's entry.
//! - The arbiter lock is never held together with the [`QueueStore`](crate::QueueStore) lock.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::ArbiterError;
use crate::events::{Bus, Event, EventKind};
use crate::store::ids::{OperationKind, RegisterId};

#[derive(Debug, Default)]
struct ArbiterState {
    pending: VecDeque<RegisterId>,
    active: Option<RegisterId>,
}

/// Shared FIFO gate serializing break/shift-change transitions across registers.
#[derive(Debug)]
pub struct OperationArbiter {
    state: Mutex<ArbiterState>,
    registers: usize,
    bus: Bus,
}

impl OperationArbiter {
    /// Creates an arbiter for registers `1..=registers`.
    pub fn new(registers: usize, bus: Bus) -> Self {
        Self {
            state: Mutex::new(ArbiterState::default()),
            registers,
            bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ArbiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, register: RegisterId) -> Result<(), ArbiterError> {
        match register.index() {
            Some(i) if i < self.registers => Ok(()),
            _ => Err(ArbiterError::InvalidRegisterId {
                register,
                registers: self.registers,
            }),
        }
    }

    /// Appends `register` to the pending FIFO.
    ///
    /// Fails with `DoubleRequest` while an earlier request of the same register
    /// is unresolved (pending or holding the slot).
    pub fn request(&self, register: RegisterId, kind: OperationKind) -> Result<(), ArbiterError> {
        self.check(register)?;
        let mut st = self.lock();
        if st.pending.contains(&register) || st.active == Some(register) {
            return Err(ArbiterError::DoubleRequest { register });
        }
        st.pending.push_back(register);
        self.bus.publish(
            Event::new(EventKind::OperationRequested)
                .with_register(register)
                .with_operation(kind),
        );
        Ok(())
    }

    /// Grants the slot iff nobody holds it and `register` heads the FIFO.
    pub fn try_acquire(&self, register: RegisterId) -> Result<bool, ArbiterError> {
        self.check(register)?;
        let mut st = self.lock();
        if st.active.is_some() || st.pending.front() != Some(&register) {
            return Ok(false);
        }
        st.active = Some(register);
        self.bus
            .publish(Event::new(EventKind::OperationGranted).with_register(register));
        Ok(true)
    }

    /// Finishes `register`'s operation: pops its head entry and clears the slot.
    ///
    /// Calling it again (or without a grant) is a no-op.
    pub fn release(&self, register: RegisterId) -> Result<(), ArbiterError> {
        self.check(register)?;
        let mut st = self.lock();
        let mut changed = false;
        if st.pending.front() == Some(&register) {
            st.pending.pop_front();
            changed = true;
        }
        if st.active == Some(register) {
            st.active = None;
            changed = true;
        }
        if changed {
            self.bus
                .publish(Event::new(EventKind::OperationReleased).with_register(register));
        }
        Ok(())
    }

    /// Drops any unresolved request of `register`, wherever it sits in the FIFO.
    ///
    /// Returns `true` if something was removed.
    pub fn cancel(&self, register: RegisterId) -> Result<bool, ArbiterError> {
        self.check(register)?;
        let mut st = self.lock();
        let before = st.pending.len();
        st.pending.retain(|r| *r != register);
        let mut changed = st.pending.len() != before;
        if st.active == Some(register) {
            st.active = None;
            changed = true;
        }
        if changed {
            self.bus
                .publish(Event::new(EventKind::OperationCancelled).with_register(register));
        }
        Ok(changed)
    }

    /// Pending requests in grant order.
    pub fn pending(&self) -> Vec<RegisterId> {
        self.lock().pending.iter().copied().collect()
    }

    /// Register currently holding the slot.
    pub fn active(&self) -> Option<RegisterId> {
        self.lock().active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn reg(n: u32) -> RegisterId {
        RegisterId::new(n)
    }

    fn arbiter(n: usize) -> OperationArbiter {
        OperationArbiter::new(n, Bus::new(64))
    }

    #[test]
    fn grants_in_request_order() {
        let a = arbiter(3);
        a.request(reg(2), OperationKind::Break).unwrap();
        a.request(reg(1), OperationKind::Break).unwrap();

        assert!(!a.try_acquire(reg(1)).unwrap(), "1 must not skip ahead of 2");
        assert!(a.try_acquire(reg(2)).unwrap());
        assert!(!a.try_acquire(reg(1)).unwrap(), "slot still held by 2");

        a.release(reg(2)).unwrap();
        assert!(a.try_acquire(reg(1)).unwrap());
        assert_eq!(a.active(), Some(reg(1)));
    }

    #[test]
    fn unrequested_register_is_never_granted() {
        let a = arbiter(2);
        assert!(!a.try_acquire(reg(1)).unwrap());
        assert_eq!(a.active(), None);
    }

    #[test]
    fn double_release_is_noop() {
        let a = arbiter(3);
        a.request(reg(1), OperationKind::Break).unwrap();
        a.request(reg(3), OperationKind::ShiftChange).unwrap();
        assert!(a.try_acquire(reg(1)).unwrap());

        a.release(reg(1)).unwrap();
        a.release(reg(1)).unwrap();

        assert_eq!(a.pending(), vec![reg(3)]);
        assert_eq!(a.active(), None);
        assert!(a.try_acquire(reg(3)).unwrap());
    }

    #[test]
    fn release_without_grant_keeps_others() {
        let a = arbiter(2);
        a.request(reg(2), OperationKind::Break).unwrap();
        a.release(reg(1)).unwrap();
        assert_eq!(a.pending(), vec![reg(2)]);
    }

    #[test]
    fn double_request_is_rejected() {
        let a = arbiter(2);
        a.request(reg(1), OperationKind::Break).unwrap();
        assert_eq!(
            a.request(reg(1), OperationKind::ShiftChange),
            Err(ArbiterError::DoubleRequest { register: reg(1) })
        );
        assert!(a.try_acquire(reg(1)).unwrap());
        assert!(a.request(reg(1), OperationKind::Break).is_err());
    }

    #[test]
    fn cancel_removes_stale_entry_behind_others() {
        let a = arbiter(3);
        a.request(reg(1), OperationKind::Break).unwrap();
        a.request(reg(2), OperationKind::Break).unwrap();
        a.request(reg(3), OperationKind::Break).unwrap();

        assert!(a.cancel(reg(2)).unwrap());
        assert_eq!(a.pending(), vec![reg(1), reg(3)]);
        assert!(!a.cancel(reg(2)).unwrap());
    }

    #[test]
    fn cancel_of_holder_frees_slot() {
        let a = arbiter(2);
        a.request(reg(1), OperationKind::Break).unwrap();
        a.request(reg(2), OperationKind::Break).unwrap();
        assert!(a.try_acquire(reg(1)).unwrap());
        assert!(a.cancel(reg(1)).unwrap());
        assert!(a.try_acquire(reg(2)).unwrap());
    }

    #[test]
    fn invalid_register_is_rejected() {
        let a = arbiter(2);
        assert!(matches!(
            a.request(reg(3), OperationKind::Break),
            Err(ArbiterError::InvalidRegisterId { registers: 2, .. })
        ));
        assert!(a.try_acquire(reg(0)).is_err());
    }

    #[test]
    fn at_most_one_holder_under_contention() {
        let a = Arc::new(arbiter(8));
        for r in RegisterId::all(8) {
            a.request(r, OperationKind::Break).unwrap();
        }
        let holders = Arc::new(AtomicUsize::new(0));
        let grants = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = RegisterId::all(8)
            .map(|r| {
                let a = Arc::clone(&a);
                let holders = Arc::clone(&holders);
                let grants = Arc::clone(&grants);
                std::thread::spawn(move || loop {
                    if a.try_acquire(r).unwrap() {
                        assert_eq!(holders.fetch_add(1, Ordering::SeqCst), 0, "two holders");
                        grants.fetch_add(1, Ordering::SeqCst);
                        holders.fetch_sub(1, Ordering::SeqCst);
                        a.release(r).unwrap();
                        break;
                    }
                    std::thread::yield_now();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(grants.load(Ordering::SeqCst), 8);
        assert!(a.pending().is_empty());
    }
}
