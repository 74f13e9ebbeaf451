//! # Per-register queue store.
//!
//! [`QueueStore`] owns the N register queues, their open flags and statuses,
//! and the remaining-customers counter.
//!
//! ## Architecture
//! ```text
//! CustomerAgent ── join_shortest_open_queue ──┐
//! CustomerAgent ── abandon ───────────────────┤
//!                                             ▼
//!                              Mutex<Inner> (coarse lock)
//!                         ┌──────────┬──────────┬──────────┐
//!                         │ reg 1    │ reg 2    │ reg N    │  open flag + status + VecDeque
//!                         └──────────┴──────────┴──────────┘
//!                         remaining, served, abandoned counters
//!                                             ▲
//! CashierAgent ── peek_front / remove_front ──┤
//! CashierAgent ── set_open / set_status ──────┘
//! ```
//!
//! ## Rules
//! - Every operation holds the coarse lock for its whole critical section, so
//!   shortest-queue selection and the counter decrement see one consistent snapshot.
//! - Events are published **under the lock**: their sequence order equals mutation order.
//! - The store never touches the [`OperationArbiter`](crate::OperationArbiter).
//! - `peek_front` never waits; idle cashiers use [`QueueStore::changed`] with a timeout.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio::sync::futures::Notified;

use crate::error::QueueError;
use crate::events::{Bus, Event, EventKind};
use crate::store::ids::{CustomerId, RegisterId, RegisterStatus};

#[derive(Debug)]
struct Register {
    open: bool,
    status: RegisterStatus,
    queue: VecDeque<CustomerId>,
}

#[derive(Debug)]
struct Inner {
    registers: Vec<Register>,
    remaining: usize,
    served: usize,
    abandoned: usize,
}

impl Inner {
    fn register(&self, id: RegisterId) -> Result<&Register, QueueError> {
        id.index()
            .and_then(|i| self.registers.get(i))
            .ok_or(QueueError::InvalidRegisterId {
                register: id,
                registers: self.registers.len(),
            })
    }

    fn register_mut(&mut self, id: RegisterId) -> Result<&mut Register, QueueError> {
        let registers = self.registers.len();
        id.index()
            .and_then(|i| self.registers.get_mut(i))
            .ok_or(QueueError::InvalidRegisterId {
                register: id,
                registers,
            })
    }

    /// Lowest-id open register among those with the fewest waiting customers.
    fn shortest_open(&self) -> Option<RegisterId> {
        let mut best: Option<(usize, usize)> = None;
        for (i, reg) in self.registers.iter().enumerate() {
            if !reg.open {
                continue;
            }
            if best.is_none_or(|(_, len)| reg.queue.len() < len) {
                best = Some((i, reg.queue.len()));
            }
        }
        best.map(|(i, _)| RegisterId::new(i as u32 + 1))
    }
}

/// Thread-safe store of register queues.
///
/// Shared by handle (`Arc<QueueStore>`) between all agents of one simulation.
#[derive(Debug)]
pub struct QueueStore {
    inner: Mutex<Inner>,
    changed: Notify,
    bus: Bus,
}

impl QueueStore {
    /// Creates `registers` open, empty registers and a counter of `customers`.
    pub fn new(registers: usize, customers: usize, bus: Bus) -> Self {
        let registers = (0..registers)
            .map(|_| Register {
                open: true,
                status: RegisterStatus::Open,
                queue: VecDeque::new(),
            })
            .collect();
        Self {
            inner: Mutex::new(Inner {
                registers,
                remaining: customers,
                served: 0,
                abandoned: 0,
            }),
            changed: Notify::new(),
            bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `customer` to the shortest open queue (ties → lowest id).
    ///
    /// Decrements the remaining-customers counter and publishes `CustomerJoined`.
    pub fn join_shortest_open_queue(&self, customer: CustomerId) -> Result<RegisterId, QueueError> {
        let mut inner = self.lock();
        let id = inner.shortest_open().ok_or(QueueError::NoOpenRegister)?;

        let reg = inner.register_mut(id)?;
        reg.queue.push_back(customer);
        let len = reg.queue.len();
        inner.remaining = inner.remaining.saturating_sub(1);

        self.bus.publish(
            Event::new(EventKind::CustomerJoined)
                .with_customer(customer)
                .with_register(id)
                .with_queue_len(len),
        );
        drop(inner);
        self.changed.notify_waiters();
        Ok(id)
    }

    /// Records a customer who left without joining; decrements the counter.
    pub fn abandon(&self, customer: CustomerId, reason: &str) {
        let mut inner = self.lock();
        inner.remaining = inner.remaining.saturating_sub(1);
        inner.abandoned += 1;
        self.bus.publish(
            Event::new(EventKind::CustomerAbandoned)
                .with_customer(customer)
                .with_reason(reason),
        );
        drop(inner);
        self.changed.notify_waiters();
    }

    /// Head of the register's queue, without removing it.
    pub fn peek_front(&self, register: RegisterId) -> Result<Option<CustomerId>, QueueError> {
        Ok(self.lock().register(register)?.queue.front().copied())
    }

    /// Pops the head, which must be `customer` (the one just served).
    ///
    /// Publishes `CustomerServed` followed by `QueueReflowed`.
    pub fn remove_front(
        &self,
        register: RegisterId,
        customer: CustomerId,
        service_units: u64,
    ) -> Result<(), QueueError> {
        let mut inner = self.lock();
        let reg = inner.register_mut(register)?;
        let front = reg.queue.front().copied();
        if front != Some(customer) {
            return Err(QueueError::NotAtFront {
                register,
                customer,
                front,
            });
        }
        reg.queue.pop_front();
        let rest: Vec<CustomerId> = reg.queue.iter().copied().collect();
        inner.served += 1;

        self.bus.publish(
            Event::new(EventKind::CustomerServed)
                .with_customer(customer)
                .with_register(register)
                .with_units(service_units),
        );
        self.bus.publish(
            Event::new(EventKind::QueueReflowed)
                .with_register(register)
                .with_queue(rest),
        );
        Ok(())
    }

    /// Toggles whether the register accepts new customers.
    ///
    /// Status becomes `Open` or `ClosedDraining`.
    pub fn set_open(&self, register: RegisterId, open: bool) -> Result<(), QueueError> {
        let status = if open {
            RegisterStatus::Open
        } else {
            RegisterStatus::ClosedDraining
        };
        let mut inner = self.lock();
        let reg = inner.register_mut(register)?;
        reg.open = open;
        reg.status = status;
        self.publish_status(register, status);
        drop(inner);
        self.changed.notify_waiters();
        Ok(())
    }

    /// Changes the visible status without touching the open flag.
    pub fn set_status(&self, register: RegisterId, status: RegisterStatus) -> Result<(), QueueError> {
        let mut inner = self.lock();
        inner.register_mut(register)?.status = status;
        self.publish_status(register, status);
        Ok(())
    }

    fn publish_status(&self, register: RegisterId, status: RegisterStatus) {
        self.bus.publish(
            Event::new(EventKind::RegisterStatusChanged)
                .with_register(register)
                .with_status(status),
        );
    }

    /// Future that resolves on the next join, abandon or open/close.
    ///
    /// Only wakes futures that exist when the change happens; pair it with a timeout.
    pub fn changed(&self) -> Notified<'_> {
        self.changed.notified()
    }

    pub fn is_empty(&self, register: RegisterId) -> Result<bool, QueueError> {
        Ok(self.lock().register(register)?.queue.is_empty())
    }

    pub fn is_open(&self, register: RegisterId) -> Result<bool, QueueError> {
        Ok(self.lock().register(register)?.open)
    }

    pub fn status(&self, register: RegisterId) -> Result<RegisterStatus, QueueError> {
        Ok(self.lock().register(register)?.status)
    }

    pub fn queue_len(&self, register: RegisterId) -> Result<usize, QueueError> {
        Ok(self.lock().register(register)?.queue.len())
    }

    /// Ordered ids currently waiting at the register.
    pub fn snapshot(&self, register: RegisterId) -> Result<Vec<CustomerId>, QueueError> {
        Ok(self.lock().register(register)?.queue.iter().copied().collect())
    }

    /// Queue lengths of all registers, in id order.
    pub fn queue_lengths(&self) -> Vec<usize> {
        self.lock().registers.iter().map(|r| r.queue.len()).collect()
    }

    /// Customers not yet joined (or abandoned).
    pub fn remaining_customers(&self) -> usize {
        self.lock().remaining
    }

    pub fn served_count(&self) -> usize {
        self.lock().served
    }

    pub fn abandoned_count(&self) -> usize {
        self.lock().abandoned
    }

    pub fn register_count(&self) -> usize {
        self.lock().registers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn reg(n: u32) -> RegisterId {
        RegisterId::new(n)
    }

    fn cust(n: u32) -> CustomerId {
        CustomerId::new(n)
    }

    fn store(registers: usize, customers: usize) -> QueueStore {
        QueueStore::new(registers, customers, Bus::new(64))
    }

    #[test]
    fn ties_go_to_lowest_register() {
        let s = store(3, 10);
        assert_eq!(s.join_shortest_open_queue(cust(1)).unwrap(), reg(1));
        assert_eq!(s.join_shortest_open_queue(cust(2)).unwrap(), reg(2));
        assert_eq!(s.join_shortest_open_queue(cust(3)).unwrap(), reg(3));
        assert_eq!(s.join_shortest_open_queue(cust(4)).unwrap(), reg(1));
        assert_eq!(s.queue_lengths(), vec![2, 1, 1]);
        assert_eq!(s.remaining_customers(), 6);
    }

    #[test]
    fn picks_strictly_shorter_queue() {
        let s = store(3, 10);
        for c in 1..=4 {
            s.join_shortest_open_queue(cust(c)).unwrap();
        }
        // lengths [2, 1, 1]; serving register 2's head leaves it the shortest
        s.remove_front(reg(2), cust(2), 0).unwrap();
        assert_eq!(s.join_shortest_open_queue(cust(5)).unwrap(), reg(2));
    }

    #[test]
    fn closed_register_is_skipped() {
        let s = store(2, 10);
        s.set_open(reg(1), false).unwrap();
        assert_eq!(s.join_shortest_open_queue(cust(1)).unwrap(), reg(2));
        assert_eq!(s.join_shortest_open_queue(cust(2)).unwrap(), reg(2));
        assert_eq!(s.status(reg(1)).unwrap(), RegisterStatus::ClosedDraining);

        s.set_open(reg(2), false).unwrap();
        assert_eq!(s.join_shortest_open_queue(cust(3)), Err(QueueError::NoOpenRegister));
        assert_eq!(s.remaining_customers(), 8);
    }

    #[test]
    fn fifo_within_register() {
        let s = store(1, 3);
        for c in 1..=3 {
            s.join_shortest_open_queue(cust(c)).unwrap();
        }
        assert_eq!(s.peek_front(reg(1)).unwrap(), Some(cust(1)));
        s.remove_front(reg(1), cust(1), 10).unwrap();
        assert_eq!(s.snapshot(reg(1)).unwrap(), vec![cust(2), cust(3)]);
        assert_eq!(s.served_count(), 1);
    }

    #[test]
    fn remove_front_rejects_wrong_customer() {
        let s = store(1, 2);
        s.join_shortest_open_queue(cust(1)).unwrap();
        s.join_shortest_open_queue(cust(2)).unwrap();
        let err = s.remove_front(reg(1), cust(2), 0).unwrap_err();
        assert_eq!(
            err,
            QueueError::NotAtFront {
                register: reg(1),
                customer: cust(2),
                front: Some(cust(1)),
            }
        );
        assert_eq!(s.queue_len(reg(1)).unwrap(), 2);
    }

    #[test]
    fn invalid_register_is_rejected() {
        let s = store(2, 1);
        assert!(matches!(
            s.peek_front(reg(0)),
            Err(QueueError::InvalidRegisterId { registers: 2, .. })
        ));
        assert!(s.set_open(reg(3), true).is_err());
    }

    #[test]
    fn abandon_counts_down_without_queueing() {
        let s = store(1, 2);
        s.abandon(cust(1), "closed");
        assert_eq!(s.remaining_customers(), 1);
        assert_eq!(s.abandoned_count(), 1);
        assert!(s.is_empty(reg(1)).unwrap());
    }

    #[test]
    fn counter_never_underflows() {
        let s = store(1, 1);
        s.join_shortest_open_queue(cust(1)).unwrap();
        s.abandon(cust(2), "late");
        assert_eq!(s.remaining_customers(), 0);
    }

    #[tokio::test]
    async fn events_follow_mutation_order() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let s = QueueStore::new(1, 1, bus);

        s.join_shortest_open_queue(cust(1)).unwrap();
        s.remove_front(reg(1), cust(1), 5).unwrap();

        let kinds: Vec<EventKind> = (0..3).filter_map(|_| rx.try_recv().ok()).map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::CustomerJoined, EventKind::CustomerServed, EventKind::QueueReflowed]
        );
    }

    #[test]
    fn concurrent_joins_place_each_customer_once() {
        let s = Arc::new(store(4, 400));
        let handles: Vec<_> = (0..8u32)
            .map(|t| {
                let s = Arc::clone(&s);
                std::thread::spawn(move || {
                    for i in 0..50u32 {
                        s.join_shortest_open_queue(cust(t * 50 + i + 1)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut seen = HashSet::new();
        for r in RegisterId::all(4) {
            for c in s.snapshot(r).unwrap() {
                assert!(seen.insert(c), "{c} queued twice");
            }
        }
        assert_eq!(seen.len(), 400);
        assert_eq!(s.remaining_customers(), 0);

        let lengths = s.queue_lengths();
        let (min, max) = (lengths.iter().min().unwrap(), lengths.iter().max().unwrap());
        assert!(max - min <= 1, "unbalanced {lengths:?}");
    }
}
