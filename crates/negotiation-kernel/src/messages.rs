//! Message types exchanged between agents.
//!
//! Every message is a closed enum variant carrying plain values: ids,
//! coordinates, occurrence copies, or a grid snapshot. No message ever holds a
//! reference into another agent's grid.
//!
//! ```text
//! Teacher                      Group                        Room
//!   |-- WhenAvail ------------->|
//!   |<------------- UserAvail --|
//!   |-- Evaluate -------------->|
//!   |<------------- SubjPrefs --|
//!   |-- TimeProposal ---------->|
//!   |<---------- Accept/Reject -|
//!   |-- LocProposal ---------------------------------------->|
//!   |<------------------------------------ Accept/Reject ----|
//!   |-- FixMeeting / CancelMeeting -->|
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::class::ClassOccurrence;
use crate::grid::{TimeSlot, TimeslotGrid};
use crate::registry::EntityId;

/// The three agent variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Teacher,
    Group,
    Room,
}

impl AgentKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Teacher => "Teacher",
            Self::Group => "Group",
            Self::Room => "Room",
        }
    }
}

/// Where a message is delivered: agent kind plus entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentAddress {
    pub kind: AgentKind,
    pub id: EntityId,
}

impl AgentAddress {
    pub fn teacher(id: EntityId) -> Self {
        Self {
            kind: AgentKind::Teacher,
            id,
        }
    }

    pub fn group(id: EntityId) -> Self {
        Self {
            kind: AgentKind::Group,
            id,
        }
    }

    pub fn room(id: EntityId) -> Self {
        Self {
            kind: AgentKind::Room,
            id,
        }
    }
}

impl fmt::Display for AgentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind.name(), self.id)
    }
}

/// Message payloads, one variant per protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Ask a group for its whole grid.
    WhenAvail,
    /// Read-only copy of the group grid.
    UserAvail(TimeslotGrid),
    /// Ask a group for its free cells in the occurrence's week.
    Evaluate(ClassOccurrence),
    /// Free cells in scan order.
    SubjPrefs(Vec<TimeSlot>),
    /// Tentatively reserve a group cell.
    TimeProposal { class_id: EntityId, at: TimeSlot },
    /// Positive answer; carries the room id for location proposals.
    Accept { room_id: Option<EntityId> },
    Reject,
    /// Ask the room pool for a matching room at a cell.
    LocProposal {
        occurrence: ClassOccurrence,
        at: TimeSlot,
    },
    /// Confirm a pending group cell with its room.
    FixMeeting { at: TimeSlot, room_id: EntityId },
    /// Drop a pending group cell.
    CancelMeeting { at: TimeSlot },
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::WhenAvail => MessageKind::WhenAvail,
            Self::UserAvail(_) => MessageKind::UserAvail,
            Self::Evaluate(_) => MessageKind::Evaluate,
            Self::SubjPrefs(_) => MessageKind::SubjPrefs,
            Self::TimeProposal { .. } => MessageKind::TimeProposal,
            Self::Accept { .. } => MessageKind::Accept,
            Self::Reject => MessageKind::Reject,
            Self::LocProposal { .. } => MessageKind::LocProposal,
            Self::FixMeeting { .. } => MessageKind::FixMeeting,
            Self::CancelMeeting { .. } => MessageKind::CancelMeeting,
        }
    }
}

/// Payload-free tag of a message, used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    WhenAvail,
    UserAvail,
    Evaluate,
    SubjPrefs,
    TimeProposal,
    Accept,
    Reject,
    LocProposal,
    FixMeeting,
    CancelMeeting,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A typed envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub payload: Payload,
    pub sender: AgentAddress,
    pub receiver: AgentAddress,
}

impl Message {
    pub fn new(sender: AgentAddress, receiver: AgentAddress, payload: Payload) -> Self {
        Self {
            payload,
            sender,
            receiver,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    /// Answer this message, swapping sender and receiver.
    pub fn reply(&self, payload: Payload) -> Message {
        Message::new(self.receiver, self.sender, payload)
    }
}

/// One entry of the delivery log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub sender: AgentAddress,
    pub receiver: AgentAddress,
    pub kind: MessageKind,
}

impl From<&Message> for DeliveryRecord {
    fn from(message: &Message) -> Self {
        Self {
            sender: message.sender,
            receiver: message.receiver,
            kind: message.kind(),
        }
    }
}

impl fmt::Display for DeliveryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} : {}", self.sender, self.receiver, self.kind)
    }
}
