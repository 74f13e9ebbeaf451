//! Error types used by the checkout simulation.
//!
//! This module defines four enums:
//!
//! - [`QueueError`]: rejected calls into the [`QueueStore`](crate::QueueStore).
//! - [`ArbiterError`]: rejected calls into the [`OperationArbiter`](crate::OperationArbiter).
//! - [`AgentError`]: why a cashier or customer agent stopped early.
//! - [`RuntimeError`]: failures of the simulation runtime itself.
//!
//! All of them provide `as_label` (stable snake_case, for logs/metrics) and
//! `as_message` helpers.

use std::time::Duration;
use thiserror::Error;

use crate::store::{CustomerId, RegisterId};

/// # Errors produced by the queue store.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Register id outside `1..=registers` (programming error).
    #[error("invalid register {register}: store has {registers} registers")]
    InvalidRegisterId {
        /// The rejected id.
        register: RegisterId,
        /// Number of registers in the store.
        registers: usize,
    },

    /// Every register is closed; the customer cannot join right now.
    #[error("no open register")]
    NoOpenRegister,

    /// `remove_front` was called for a customer that is not at the head.
    #[error("{customer} is not at the front of {register} (front: {front:?})")]
    NotAtFront {
        register: RegisterId,
        customer: CustomerId,
        front: Option<CustomerId>,
    },
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use checkout::QueueError;
    ///
    /// assert_eq!(QueueError::NoOpenRegister.as_label(), "queue_no_open_register");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::InvalidRegisterId { .. } => "queue_invalid_register",
            QueueError::NoOpenRegister => "queue_no_open_register",
            QueueError::NotAtFront { .. } => "queue_not_at_front",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            QueueError::InvalidRegisterId { register, registers } => {
                format!("invalid id: {register} (registers={registers})")
            }
            QueueError::NoOpenRegister => "all registers closed".to_string(),
            QueueError::NotAtFront {
                register,
                customer,
                front,
            } => format!("head mismatch at {register}: expected {customer}, found {front:?}"),
        }
    }
}

/// # Errors produced by the operation arbiter.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbiterError {
    /// Register id outside `1..=registers` (programming error).
    #[error("invalid register {register}: arbiter has {registers} registers")]
    InvalidRegisterId {
        register: RegisterId,
        registers: usize,
    },

    /// The register already has an unresolved request (caller bug).
    #[error("{register} already has an outstanding operation request")]
    DoubleRequest { register: RegisterId },
}

impl ArbiterError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ArbiterError::InvalidRegisterId { .. } => "arbiter_invalid_register",
            ArbiterError::DoubleRequest { .. } => "arbiter_double_request",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ArbiterError::InvalidRegisterId { register, registers } => {
                format!("invalid id: {register} (registers={registers})")
            }
            ArbiterError::DoubleRequest { register } => {
                format!("double request from {register}")
            }
        }
    }
}

/// # Reasons an agent stops before finishing its work.
///
/// `Canceled` is the designed shutdown path, not a failure.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The run was cancelled while the agent was waiting or sleeping.
    #[error("context cancelled")]
    Canceled,

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Arbiter(#[from] ArbiterError),
}

impl AgentError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AgentError::Canceled => "agent_canceled",
            AgentError::Queue(e) => e.as_label(),
            AgentError::Arbiter(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            AgentError::Canceled => "context cancelled".to_string(),
            AgentError::Queue(e) => e.as_message(),
            AgentError::Arbiter(e) => e.as_message(),
        }
    }

    /// Precondition violations that indicate a bug rather than a runtime condition.
    ///
    /// # Example
    /// ```
    /// use checkout::{AgentError, QueueError};
    ///
    /// assert!(!AgentError::Canceled.is_fatal());
    /// assert!(!AgentError::from(QueueError::NoOpenRegister).is_fatal());
    /// ```
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AgentError::Queue(QueueError::InvalidRegisterId { .. })
                | AgentError::Queue(QueueError::NotAtFront { .. })
                | AgentError::Arbiter(ArbiterError::InvalidRegisterId { .. })
        )
    }
}

/// # Errors produced by the simulation runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The configuration was rejected before anything was spawned.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Shutdown grace period was exceeded; some agents remained stuck.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Agents that did not stop in time.
        stuck: Vec<String>,
    },

    /// An agent task panicked or stopped on a fatal error.
    #[error("agent {agent} died: {reason}")]
    AgentDied { agent: String, reason: String },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use checkout::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidConfig { .. } => "runtime_invalid_config",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::AgentDied { .. } => "runtime_agent_died",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::InvalidConfig { reason } => format!("config rejected: {reason}"),
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck agents={stuck:?}")
            }
            RuntimeError::AgentDied { agent, reason } => format!("{agent}: {reason}"),
        }
    }
}
