//! Synchronous message delivery between agents.
//!
//! The bus owns every responding agent (groups and the room pool). Sending a
//! message calls the receiver's handler in the caller's stack and hands back the
//! reply, so a teacher never holds a reference to anyone else's grid. Every
//! request and reply is appended to the delivery log.

use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::agents::{GroupAgent, RoomAgent};
use crate::error::ProtocolError;
use crate::messages::{AgentKind, DeliveryRecord, Message};
use crate::registry::EntityId;

/// Delivery capability handed to teachers: send and log, nothing else.
#[derive(Debug, Clone)]
pub struct MessageBus {
    groups: BTreeMap<EntityId, GroupAgent>,
    rooms: RoomAgent,
    log: Vec<DeliveryRecord>,
}

impl MessageBus {
    pub fn new(groups: Vec<GroupAgent>, rooms: RoomAgent) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.address().id, g)).collect(),
            rooms,
            log: Vec::new(),
        }
    }

    /// Deliver `message` and return the receiver's reply, if it sent one.
    pub fn send(&mut self, message: Message) -> Result<Option<Message>, ProtocolError> {
        self.record(&message);

        let reply = match message.receiver.kind {
            AgentKind::Group => match self.groups.get_mut(&message.receiver.id) {
                Some(group) => group.handle(&message),
                None => Err(Self::unknown_receiver(&message)),
            },
            AgentKind::Room if message.receiver == self.rooms.address() => {
                self.rooms.handle(&message)
            }
            _ => Err(Self::unknown_receiver(&message)),
        };

        let reply = reply.inspect_err(|err| warn!(error = %err, "Protocol violation"))?;
        Ok(reply.map(|payload| {
            let reply = message.reply(payload);
            self.record(&reply);
            reply
        }))
    }

    fn record(&mut self, message: &Message) {
        let record = DeliveryRecord::from(message);
        trace!(%record, "Delivered");
        self.log.push(record);
    }

    fn unknown_receiver(message: &Message) -> ProtocolError {
        ProtocolError::UnknownReceiver {
            sender: message.sender,
            receiver: message.receiver,
            kind: message.kind(),
        }
    }

    pub fn groups(&self) -> &BTreeMap<EntityId, GroupAgent> {
        &self.groups
    }

    pub fn group_mut(&mut self, id: EntityId) -> Option<&mut GroupAgent> {
        self.groups.get_mut(&id)
    }

    pub fn rooms(&self) -> &RoomAgent {
        &self.rooms
    }

    pub fn rooms_mut(&mut self) -> &mut RoomAgent {
        &mut self.rooms
    }

    /// Ordered delivery log.
    pub fn log(&self) -> &[DeliveryRecord] {
        &self.log
    }
}
