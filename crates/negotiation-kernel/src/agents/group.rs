//! GroupAgent: purely reactive owner of one group's grid.

use tracing::debug;

use crate::error::{GridError, ProtocolError};
use crate::grid::{TimeSlot, TimeslotGrid};
use crate::messages::{AgentAddress, Message, MessageKind, Payload};
use crate::registry::EntityId;

/// Supply side of the negotiation.
///
/// Handles:
/// - `WhenAvail` - reply `UserAvail` with a snapshot of the grid
/// - `Evaluate` - reply `SubjPrefs` with the free cells of the target week
/// - `TimeProposal` - reserve a free cell (`Accept`) or refuse (`Reject`)
/// - `FixMeeting` - confirm a pending cell with its room
/// - `CancelMeeting` - release a pending cell
#[derive(Debug, Clone)]
pub struct GroupAgent {
    group_id: EntityId,
    grid: TimeslotGrid,
}

impl GroupAgent {
    pub fn new(group_id: EntityId, grid: TimeslotGrid) -> Self {
        Self { group_id, grid }
    }

    pub fn address(&self) -> AgentAddress {
        AgentAddress::group(self.group_id)
    }

    pub fn grid(&self) -> &TimeslotGrid {
        &self.grid
    }

    /// Groups never act on their own.
    pub fn step(&mut self) {}

    /// Handle one inbound message, returning the reply payload if any.
    pub fn handle(&mut self, message: &Message) -> Result<Option<Payload>, ProtocolError> {
        match &message.payload {
            Payload::WhenAvail => Ok(Some(Payload::UserAvail(self.grid.clone()))),

            Payload::Evaluate(occurrence) => {
                let free = self.grid.free_cells(occurrence.week);
                if free.is_empty() {
                    debug!(
                        group = self.group_id,
                        class = occurrence.class_id,
                        week = occurrence.week,
                        "No free cells to offer"
                    );
                }
                Ok(Some(Payload::SubjPrefs(free)))
            }

            Payload::TimeProposal { class_id, at } => {
                match self.grid.reserve(*at, *class_id, Some(message.sender.id)) {
                    Ok(()) => {
                        debug!(group = self.group_id, class = class_id, slot = %at, "Time accepted");
                        Ok(Some(Payload::Accept { room_id: None }))
                    }
                    Err(GridError::NotFree { .. }) => Ok(Some(Payload::Reject)),
                    Err(source) => Err(self.invalid_cell(MessageKind::TimeProposal, *at, source)),
                }
            }

            Payload::FixMeeting { at, room_id } => {
                self.grid
                    .confirm(*at, *room_id)
                    .map_err(|source| self.invalid_cell(MessageKind::FixMeeting, *at, source))?;
                Ok(None)
            }

            Payload::CancelMeeting { at } => {
                self.grid
                    .cancel(*at)
                    .map_err(|source| self.invalid_cell(MessageKind::CancelMeeting, *at, source))?;
                Ok(None)
            }

            other => Err(ProtocolError::UnexpectedMessage {
                agent: self.address(),
                state: "Reactive".to_string(),
                kind: other.kind(),
            }),
        }
    }

    fn invalid_cell(
        &self,
        kind: MessageKind,
        slot: TimeSlot,
        source: GridError,
    ) -> ProtocolError {
        ProtocolError::InvalidCell {
            agent: self.address(),
            kind,
            slot,
            source,
        }
    }
}
