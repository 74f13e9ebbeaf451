//! # Identifiers for registers and customers.
//!
//! Both are thin `u32` newtypes. Register ids are 1-based and stable for the
//! whole run; customer ids are assigned `1..=M` in arrival order.

use std::fmt;

/// Identity of a checkout register (`1..=N`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegisterId(u32);

impl RegisterId {
    /// Wraps a raw 1-based register number.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw 1-based number.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Zero-based slot index, or `None` for the invalid id `0`.
    #[inline]
    pub(crate) fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }

    /// Iterates `1..=count` as register ids.
    pub fn all(count: usize) -> impl Iterator<Item = RegisterId> {
        (1..=count as u32).map(RegisterId)
    }
}

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "register-{}", self.0)
    }
}

/// Opaque identity of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CustomerId(u32);

impl CustomerId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "customer-{}", self.0)
    }
}

/// Externally visible state of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterStatus {
    /// Accepting new customers.
    Open,
    /// Closed to new customers, still serving the ones already queued.
    ClosedDraining,
    /// Cashier is on a break; the register is closed.
    OnBreak,
    /// Cashier is handing over to a replacement; the register is closed.
    AwaitingReplacement,
    /// Cashier finished for good (no customers left).
    Idle,
}

impl RegisterStatus {
    /// Returns a short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegisterStatus::Open => "open",
            RegisterStatus::ClosedDraining => "closed_draining",
            RegisterStatus::OnBreak => "on_break",
            RegisterStatus::AwaitingReplacement => "awaiting_replacement",
            RegisterStatus::Idle => "idle",
        }
    }
}

/// Kind of operational interruption a cashier may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Break,
    ShiftChange,
}

impl OperationKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            OperationKind::Break => "break",
            OperationKind::ShiftChange => "shift_change",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_index_is_zero_based() {
        assert_eq!(RegisterId::new(1).index(), Some(0));
        assert_eq!(RegisterId::new(4).index(), Some(3));
        assert_eq!(RegisterId::new(0).index(), None);
    }

    #[test]
    fn all_yields_one_based_ids() {
        let ids: Vec<u32> = RegisterId::all(3).map(RegisterId::get).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
