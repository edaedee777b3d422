//! Negotiating agents.
//!
//! Teachers drive the protocol; groups and the room pool only answer. Every
//! reply is produced synchronously inside the sender's step:
//!
//! ```text
//! Orchestrator::step (shuffled order)
//!   └─ TeacherAgent::step (one state)
//!        ├─ MessageBus::send → GroupAgent::handle → reply
//!        └─ MessageBus::send → RoomAgent::handle  → reply
//! ```
//!
//! Each grid has one owner: teachers keep their own, groups and rooms live
//! inside the bus and are reached only through `send`.

mod group;
mod room;
mod teacher;

pub use group::GroupAgent;
pub use room::{Room, RoomAgent};
pub use teacher::{TeacherAgent, TeacherState};
