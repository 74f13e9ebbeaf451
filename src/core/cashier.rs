//! # CashierAgent: one cashier working one register.
//!
//! A cashier serves its register's queue head-first and, after enough
//! continuous service, asks the [`OperationArbiter`](crate::OperationArbiter)
//! for a break or a shift change. Only one register can be in an operation at
//! a time; the holder closes its register, drains it, then pauses or hands
//! over.
//!
//! ## State machine
//! ```text
//!             ┌──────────── threshold reached ────────────┐
//!             │                                           ▼
//!         Serving ◄──── slot refused ───── AwaitingOperationSlot
//!          ▲  │                                           │ slot granted
//!          │  │                                           ▼
//!          │  │                                       Draining
//!          │  │                  customers left? ┌────────┼─────────────┐
//!          │  │                      Break       ▼        │ ShiftChange ▼
//!          └──┼──── reopen + release ──────── OnBreak     │   AwaitingReplacement
//!             │                                           │        │ exit Replaced
//!             │           none left: release + reopen ────┘        ▼
//!             └── queue empty, nobody left ──────────────────► Terminated
//! ```
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► ask_for_operation()   request Break, later ShiftChange
//!   ├─► handle_operation()    try_acquire → drain → break / hand over
//!   ├─► peek_front()
//!   │     ├─► Some(c) → serve(c): ack → CustomerServeStarted → service → remove_front
//!   │     └─► None    → nobody left? finish() : wait for changed() or poll interval
//! }
//! ```
//!
//! ## Rules
//! - Every sleep is cancellable; cancellation exits with [`CashierExit::Cancelled`]
//! - Operations are only requested and started while customers remain
//! - On any exit but `Replaced` the cashier drops its arbiter entry
//! - A customer being served at cancellation stays at the head of its queue

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::context::AgentContext;
use crate::error::{AgentError, ArbiterError};
use crate::events::{Event, EventKind};
use crate::policies::RandomSource;
use crate::store::{CustomerId, OperationKind, RegisterId, RegisterStatus};

/// Where a cashier is in its work cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CashierState {
    Serving,
    AwaitingOperationSlot,
    Draining,
    OnBreak,
    AwaitingReplacement,
    Terminated,
}

/// Why a cashier agent stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CashierExit {
    /// Queue empty and no customers left.
    Finished,
    /// Shift change completed; a successor must take the register.
    Replaced,
    /// The run was cancelled.
    Cancelled,
}

impl CashierExit {
    pub fn as_label(&self) -> &'static str {
        match self {
            CashierExit::Finished => "finished",
            CashierExit::Replaced => "replaced",
            CashierExit::Cancelled => "cancelled",
        }
    }
}

/// One cashier instance bound to one register.
pub(crate) struct CashierAgent {
    ctx: AgentContext,
    register: RegisterId,
    cashier: u32,
    rng: RandomSource,
    state: CashierState,
    /// Service time accumulated since the start or the last break.
    continuous: u64,
    break_requested: bool,
    change_requested: bool,
    after_break: bool,
    pending: Option<OperationKind>,
    /// Successor after a shift change: reopens the register and frees the slot.
    takeover: bool,
}

impl CashierAgent {
    pub fn new(ctx: AgentContext, register: RegisterId, cashier: u32, takeover: bool) -> Self {
        let rng = ctx.rng(u64::from(cashier));
        Self {
            ctx,
            register,
            cashier,
            rng,
            state: CashierState::Serving,
            continuous: 0,
            break_requested: false,
            change_requested: false,
            after_break: false,
            pending: None,
            takeover,
        }
    }

    /// Works the register until it is finished, handed over, or cancelled.
    ///
    /// Only store or arbiter precondition violations surface as `Err`.
    pub async fn run(mut self, token: CancellationToken) -> Result<CashierExit, AgentError> {
        self.ctx.bus.publish(
            Event::new(EventKind::CashierStarted)
                .with_register(self.register)
                .with_cashier(self.cashier),
        );

        let res = match self.work(&token).await {
            Err(AgentError::Canceled) => Ok(CashierExit::Cancelled),
            other => other,
        };
        if !matches!(res, Ok(CashierExit::Replaced | CashierExit::Finished)) {
            if let Err(e) = self.ctx.arbiter.cancel(self.register) {
                warn!(register = %self.register, error = %e, "failed to drop arbiter entry");
            }
        }
        self.transition(CashierState::Terminated);

        let reason = match &res {
            Ok(exit) => exit.as_label().to_string(),
            Err(e) => e.as_message(),
        };
        self.ctx.bus.publish(
            Event::new(EventKind::CashierStopped)
                .with_register(self.register)
                .with_cashier(self.cashier)
                .with_reason(reason),
        );
        res
    }

    async fn work(&mut self, token: &CancellationToken) -> Result<CashierExit, AgentError> {
        if self.takeover {
            self.ctx.store.set_open(self.register, true)?;
            self.ctx.arbiter.release(self.register)?;
        }

        loop {
            self.ask_for_operation()?;
            if let Some(exit) = self.handle_operation(token).await? {
                return Ok(exit);
            }

            match self.ctx.store.peek_front(self.register)? {
                Some(customer) => self.serve(customer, token).await?,
                None => {
                    // `remaining` only shrinks, so read it before the queue.
                    if self.ctx.store.remaining_customers() == 0
                        && self.ctx.store.is_empty(self.register)?
                    {
                        return self.finish(token).await;
                    }
                    self.idle(token).await?;
                }
            }
        }
    }

    fn ask_for_operation(&mut self) -> Result<(), AgentError> {
        if self.pending.is_some()
            || self.continuous < self.ctx.cfg.break_threshold
            || self.ctx.store.remaining_customers() == 0
        {
            return Ok(());
        }

        let kind = if !self.break_requested {
            OperationKind::Break
        } else if !self.change_requested && self.after_break {
            OperationKind::ShiftChange
        } else {
            return Ok(());
        };

        match self.ctx.arbiter.request(self.register, kind) {
            Ok(()) => {}
            Err(ArbiterError::DoubleRequest { .. }) => {
                warn!(register = %self.register, operation = kind.as_label(), "operation already requested");
            }
            Err(e) => return Err(e.into()),
        }
        match kind {
            OperationKind::Break => self.break_requested = true,
            OperationKind::ShiftChange => self.change_requested = true,
        }
        self.pending = Some(kind);
        self.transition(CashierState::AwaitingOperationSlot);
        Ok(())
    }

    /// Runs the pending operation if the slot is free; `Some` ends the agent.
    async fn handle_operation(
        &mut self,
        token: &CancellationToken,
    ) -> Result<Option<CashierExit>, AgentError> {
        let Some(kind) = self.pending else {
            return Ok(None);
        };
        if self.ctx.store.remaining_customers() == 0 || !self.ctx.arbiter.try_acquire(self.register)? {
            return Ok(None);
        }

        self.transition(CashierState::Draining);
        self.ctx.store.set_open(self.register, false)?;
        while let Some(customer) = self.ctx.store.peek_front(self.register)? {
            self.serve(customer, token).await?;
        }
        self.pending = None;

        if self.ctx.store.remaining_customers() == 0 {
            debug!(register = %self.register, operation = kind.as_label(), "nobody left, operation dropped");
            self.reopen()?;
            return Ok(None);
        }

        match kind {
            OperationKind::Break if !self.after_break => {
                self.take_break(token).await?;
                Ok(None)
            }
            OperationKind::ShiftChange => {
                self.hand_over(token).await?;
                Ok(Some(CashierExit::Replaced))
            }
            OperationKind::Break => {
                self.reopen()?;
                Ok(None)
            }
        }
    }

    async fn take_break(&mut self, token: &CancellationToken) -> Result<(), AgentError> {
        self.transition(CashierState::OnBreak);
        self.ctx.store.set_status(self.register, RegisterStatus::OnBreak)?;
        self.ctx.clock.sleep(self.ctx.cfg.break_duration, token).await?;
        self.reopen()?;
        self.after_break = true;
        self.continuous = 0;
        Ok(())
    }

    async fn hand_over(&mut self, token: &CancellationToken) -> Result<(), AgentError> {
        self.transition(CashierState::AwaitingReplacement);
        self.ctx
            .store
            .set_status(self.register, RegisterStatus::AwaitingReplacement)?;
        self.ctx.clock.sleep(self.ctx.cfg.handoff_delay, token).await
    }

    fn reopen(&mut self) -> Result<(), AgentError> {
        self.ctx.store.set_open(self.register, true)?;
        self.ctx.arbiter.release(self.register)?;
        self.transition(CashierState::Serving);
        Ok(())
    }

    async fn serve(&mut self, customer: CustomerId, token: &CancellationToken) -> Result<(), AgentError> {
        self.ctx.clock.sleep(self.ctx.cfg.ack_delay, token).await?;

        let units = self.rng.sample(self.ctx.cfg.service);
        self.ctx.bus.publish(
            Event::new(EventKind::CustomerServeStarted)
                .with_register(self.register)
                .with_customer(customer)
                .with_cashier(self.cashier)
                .with_units(units),
        );
        self.ctx.clock.sleep(units, token).await?;

        self.continuous = self.continuous.saturating_add(units);
        self.ctx.store.remove_front(self.register, customer, units)?;
        Ok(())
    }

    async fn idle(&self, token: &CancellationToken) -> Result<(), AgentError> {
        let wake = self.ctx.store.changed();
        self.ctx
            .clock
            .wait_or_timeout(wake, self.ctx.cfg.poll_interval, token)
            .await
    }

    async fn finish(&mut self, token: &CancellationToken) -> Result<CashierExit, AgentError> {
        self.pending = None;
        self.ctx.arbiter.cancel(self.register)?;
        self.ctx.clock.sleep(self.ctx.cfg.closing_delay, token).await?;
        self.ctx.store.set_status(self.register, RegisterStatus::Idle)?;
        Ok(CashierExit::Finished)
    }

    fn transition(&mut self, next: CashierState) {
        if self.state == next {
            return;
        }
        debug!(
            register = %self.register,
            cashier = self.cashier,
            from = ?self.state,
            to = ?next,
            "cashier state change"
        );
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::time;

    use crate::config::Config;
    use crate::events::Bus;
    use crate::policies::UnitRange;

    fn cfg(registers: usize, customers: usize) -> Config {
        Config {
            registers,
            customers,
            service: UnitRange::fixed(100),
            unit: Duration::from_millis(1),
            ack_delay: 1,
            break_threshold: 100,
            break_duration: 50,
            handoff_delay: 20,
            closing_delay: 1,
            poll_interval: 10,
            seed: Some(7),
            ..Config::default()
        }
    }

    fn ctx(cfg: Config) -> AgentContext {
        AgentContext::new(Arc::new(cfg), Bus::new(4096))
    }

    fn statuses(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<RegisterStatus> {
        let mut out = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(ev) if ev.kind == EventKind::RegisterStatusChanged => out.extend(ev.status),
                Ok(_) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => {}
            }
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn serves_queue_then_goes_idle() {
        let ctx = ctx(Config {
            break_threshold: 10_000,
            ..cfg(1, 2)
        });
        let r1 = RegisterId::new(1);
        ctx.store.join_shortest_open_queue(CustomerId::new(1)).unwrap();
        ctx.store.join_shortest_open_queue(CustomerId::new(2)).unwrap();

        let exit = CashierAgent::new(ctx.clone(), r1, 1, false)
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(exit, CashierExit::Finished);
        assert_eq!(ctx.store.served_count(), 2);
        assert_eq!(ctx.store.status(r1).unwrap(), RegisterStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn takes_one_break_and_finishes() {
        let ctx = ctx(cfg(1, 3));
        let mut rx = ctx.bus.subscribe();
        let r1 = RegisterId::new(1);
        ctx.store.join_shortest_open_queue(CustomerId::new(1)).unwrap();

        let agent = CashierAgent::new(ctx.clone(), r1, 1, false);
        let handle = tokio::spawn(agent.run(CancellationToken::new()));

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ctx.store.status(r1).unwrap(), RegisterStatus::Open);
        ctx.store.join_shortest_open_queue(CustomerId::new(2)).unwrap();
        ctx.store.join_shortest_open_queue(CustomerId::new(3)).unwrap();

        let exit = handle.await.unwrap().unwrap();
        assert_eq!(exit, CashierExit::Finished);
        assert_eq!(ctx.store.served_count(), 3);
        assert_eq!(ctx.arbiter.active(), None);
        assert!(ctx.arbiter.pending().is_empty());

        let seen = statuses(&mut rx);
        let breaks = seen.iter().filter(|s| **s == RegisterStatus::OnBreak).count();
        assert_eq!(breaks, 1);
        assert_eq!(seen.last(), Some(&RegisterStatus::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn shift_change_keeps_slot_for_successor() {
        let ctx = ctx(cfg(1, 4));
        let r1 = RegisterId::new(1);
        ctx.store.join_shortest_open_queue(CustomerId::new(1)).unwrap();

        let handle = tokio::spawn(CashierAgent::new(ctx.clone(), r1, 1, false).run(CancellationToken::new()));
        time::sleep(Duration::from_millis(500)).await;
        ctx.store.join_shortest_open_queue(CustomerId::new(2)).unwrap();
        ctx.store.join_shortest_open_queue(CustomerId::new(3)).unwrap();

        let exit = handle.await.unwrap().unwrap();
        assert_eq!(exit, CashierExit::Replaced);
        assert_eq!(ctx.store.status(r1).unwrap(), RegisterStatus::AwaitingReplacement);
        assert!(!ctx.store.is_open(r1).unwrap());
        assert_eq!(ctx.arbiter.active(), Some(r1));

        let token = CancellationToken::new();
        let successor = tokio::spawn(CashierAgent::new(ctx.clone(), r1, 2, true).run(token.clone()));
        time::sleep(Duration::from_millis(5)).await;
        assert!(ctx.store.is_open(r1).unwrap());
        assert_eq!(ctx.arbiter.active(), None);

        token.cancel();
        assert_eq!(successor.await.unwrap().unwrap(), CashierExit::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_leaves_customer_at_head() {
        let ctx = ctx(Config {
            service: UnitRange::fixed(10_000),
            ..cfg(1, 1)
        });
        let r1 = RegisterId::new(1);
        ctx.store.join_shortest_open_queue(CustomerId::new(1)).unwrap();

        let token = CancellationToken::new();
        let handle = tokio::spawn(CashierAgent::new(ctx.clone(), r1, 1, false).run(token.clone()));
        time::sleep(Duration::from_millis(100)).await;
        token.cancel();

        assert_eq!(handle.await.unwrap().unwrap(), CashierExit::Cancelled);
        assert_eq!(ctx.store.peek_front(r1).unwrap(), Some(CustomerId::new(1)));
        assert_eq!(ctx.store.served_count(), 0);
    }
}
