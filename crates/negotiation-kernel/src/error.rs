//! Error types for the negotiation kernel.
//!
//! Three families exist: configuration errors abort the build, protocol errors
//! abort a run, and grid errors are raised by cell transitions and surface as
//! protocol errors once an agent handler sees them. Negotiation failures are not
//! errors at all; they end up as `Outcome::NotPlaced`.

use thiserror::Error;

use crate::grid::TimeSlot;
use crate::messages::{AgentAddress, MessageKind};

/// Problems detected while validating configuration or building agents.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid period: {reason}")]
    InvalidPeriod { reason: String },

    #[error("Malformed class '{class}' in group '{group}': {reason}")]
    MalformedClass {
        group: String,
        class: String,
        reason: String,
    },

    #[error("Duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Malformed room '{room}': {reason}")]
    MalformedRoom { room: String, reason: String },

    #[error("Teacher '{teacher}' owns no classes")]
    TeacherWithoutClasses { teacher: String },

    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },
}

/// Illegal cell transitions on a [`crate::grid::TimeslotGrid`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("Cell {slot} is outside the grid")]
    OutOfBounds { slot: TimeSlot },

    #[error("Cell {slot} is not free")]
    NotFree { slot: TimeSlot },

    #[error("Cell {slot} holds no pending reservation")]
    NotPending { slot: TimeSlot },
}

/// Violations of the negotiation protocol. These indicate a logic defect and are
/// never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("{agent} in state {state} received unexpected {kind}")]
    UnexpectedMessage {
        agent: AgentAddress,
        state: String,
        kind: MessageKind,
    },

    #[error("{agent} in state {state} expected {expected}, got {got:?}")]
    UnexpectedReply {
        agent: AgentAddress,
        state: String,
        expected: &'static str,
        got: Option<MessageKind>,
    },

    #[error("{agent} cannot apply {kind} at {slot}: {source}")]
    InvalidCell {
        agent: AgentAddress,
        kind: MessageKind,
        slot: TimeSlot,
        #[source]
        source: GridError,
    },

    #[error("No agent registered at {receiver} (message {kind} from {sender})")]
    UnknownReceiver {
        sender: AgentAddress,
        receiver: AgentAddress,
        kind: MessageKind,
    },
}

/// Umbrella error returned by the orchestrator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KernelError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Schedule did not converge within {max_rounds} rounds")]
    RoundLimit { max_rounds: usize },
}

pub type KernelResult<T> = Result<T, KernelError>;
