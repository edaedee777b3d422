//! RoomAgent: single owner of every room grid.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::class::ClassOccurrence;
use crate::error::ProtocolError;
use crate::grid::{TimeSlot, TimeslotGrid};
use crate::messages::{AgentAddress, Message, MessageKind, Payload};
use crate::registry::EntityId;

/// One room in the pool.
#[derive(Debug, Clone)]
pub struct Room {
    pub room_id: EntityId,
    pub type_ids: BTreeSet<EntityId>,
    pub tool_ids: BTreeSet<EntityId>,
    grid: TimeslotGrid,
}

impl Room {
    pub fn new(
        room_id: EntityId,
        type_ids: BTreeSet<EntityId>,
        tool_ids: BTreeSet<EntityId>,
        grid: TimeslotGrid,
    ) -> Self {
        Self {
            room_id,
            type_ids,
            tool_ids,
            grid,
        }
    }

    pub fn grid(&self) -> &TimeslotGrid {
        &self.grid
    }

    /// Supports the class type, carries every required tool, and is free at `at`.
    fn fits(&self, occurrence: &ClassOccurrence, at: TimeSlot) -> bool {
        self.type_ids.contains(&occurrence.type_id)
            && occurrence.tool_ids.is_subset(&self.tool_ids)
            && self.grid.is_free(at)
    }
}

/// Matches location proposals against the room pool, first fit in pool order.
#[derive(Debug, Clone)]
pub struct RoomAgent {
    agent_id: EntityId,
    rooms: Vec<Room>,
}

impl RoomAgent {
    pub fn new(agent_id: EntityId, rooms: Vec<Room>) -> Self {
        Self { agent_id, rooms }
    }

    pub fn address(&self) -> AgentAddress {
        AgentAddress::room(self.agent_id)
    }

    /// All room grids keyed by room id.
    pub fn room_grids(&self) -> BTreeMap<EntityId, &TimeslotGrid> {
        self.rooms.iter().map(|r| (r.room_id, &r.grid)).collect()
    }

    /// Rooms never act on their own.
    pub fn step(&mut self) {}

    pub fn handle(&mut self, message: &Message) -> Result<Option<Payload>, ProtocolError> {
        let Payload::LocProposal { occurrence, at } = &message.payload else {
            return Err(ProtocolError::UnexpectedMessage {
                agent: self.address(),
                state: "Reactive".to_string(),
                kind: message.kind(),
            });
        };

        let address = self.address();
        let Some(room) = self.rooms.iter_mut().find(|r| r.fits(occurrence, *at)) else {
            debug!(
                class = occurrence.class_id,
                type_id = occurrence.type_id,
                slot = %at,
                "No room fits"
            );
            return Ok(Some(Payload::Reject));
        };

        let to_protocol = |source| ProtocolError::InvalidCell {
            agent: address,
            kind: MessageKind::LocProposal,
            slot: *at,
            source,
        };
        room.grid
            .reserve(*at, occurrence.class_id, Some(message.sender.id))
            .map_err(to_protocol)?;
        room.grid.confirm(*at, room.room_id).map_err(to_protocol)?;

        debug!(
            class = occurrence.class_id,
            room = room.room_id,
            slot = %at,
            "Room reserved"
        );
        Ok(Some(Payload::Accept {
            room_id: Some(room.room_id),
        }))
    }
}
