//! Negotiation Kernel: decentralized timetable scheduling through agent negotiation
//!
//! Teachers, groups and a room pool exchange typed messages over a synchronous
//! bus. Each teacher walks its class occurrences through a small state machine
//! (availability, preferences, time proposal, location proposal) and every
//! agent writes only its own timeslot grid. The orchestrator shuffles the agent
//! list each round with a seeded RNG, so identical inputs reproduce identical
//! schedules.

pub mod agents;
pub mod bus;
pub mod class;
pub mod config;
pub mod error;
pub mod grid;
pub mod messages;
pub mod orchestrator;
pub mod registry;

pub use agents::{GroupAgent, Room, RoomAgent, TeacherAgent, TeacherState};
pub use bus::MessageBus;
pub use class::{ClassDefinition, ClassOccurrence, Outcome};
pub use config::{ClassConfig, GroupConfig, PeriodConfig, RoomConfig, ScheduleConfig};
pub use error::{ConfigError, GridError, KernelError, KernelResult, ProtocolError};
pub use grid::{Cell, Period, Reservation, TimeSlot, TimeslotGrid};
pub use messages::{AgentAddress, AgentKind, DeliveryRecord, Message, MessageKind, Payload};
pub use orchestrator::{ROOM_AGENT_NAME, ScheduleOrchestrator, ScheduleStats};
pub use registry::{BLOCKED_SLOT, EntityId, EntityRegistry};
