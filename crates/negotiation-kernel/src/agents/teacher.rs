//! TeacherAgent: the demand side of the negotiation.
//!
//! A teacher works through its class occurrences one at a time. Each round it
//! executes exactly one state of the negotiation below, talking to the owning
//! group and to the room pool through the [`MessageBus`].
//!
//! ```text
//! AskAvailability ──no common free cell──> ImpossibleMeeting ─┐
//!        │                                                    │
//!        v                                                    │
//! AskSubjectPrefs                                             │
//!        │                                                    │
//!        v        Reject (index++)                            │
//! ProposeTime <──────────────┐                                │
//!   │      │ exhausted       │                                │
//!   │      └──> SolutionNotFound ─────────────────────────────┤
//!   │ Accept                 │ room Reject                    │
//!   v                        │ (cancel, index++)              │
//! ProposeLocation ───────────┘                                │
//!   │ room Accept                                             │
//!   v                                                         v
//! FixMeeting ────────────────────────────────> next occurrence or WorkEnded
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bus::MessageBus;
use crate::class::{ClassDefinition, ClassOccurrence, Outcome};
use crate::error::{ConfigError, GridError, ProtocolError};
use crate::grid::{TimeSlot, TimeslotGrid};
use crate::messages::{AgentAddress, Message, MessageKind, Payload};
use crate::registry::EntityId;

/// Negotiation state of a teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeacherState {
    AskAvailability,
    ImpossibleMeeting,
    AskSubjectPrefs,
    ProposeTime,
    SolutionNotFound,
    ProposeLocation,
    FixMeeting,
    WorkEnded,
}

impl fmt::Display for TeacherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Demand-side agent owning one teacher's grid and occurrences.
#[derive(Debug, Clone)]
pub struct TeacherAgent {
    teacher_id: EntityId,
    name: String,
    room_agent: AgentAddress,
    grid: TimeslotGrid,
    occurrences: Vec<ClassOccurrence>,
    /// Index of the occurrence under negotiation.
    viewing: usize,
    state: TeacherState,
    /// Candidate cells offered by the group for the current occurrence.
    prefs: Vec<TimeSlot>,
    pref_index: usize,
}

impl TeacherAgent {
    /// Create a teacher from the classes it owns.
    ///
    /// `grid` should be an untouched copy of the period template.
    pub fn new(
        teacher_id: EntityId,
        name: impl Into<String>,
        classes: &[ClassDefinition],
        grid: TimeslotGrid,
        room_agent: AgentAddress,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if classes.is_empty() {
            return Err(ConfigError::TeacherWithoutClasses { teacher: name });
        }

        let occurrences: Vec<ClassOccurrence> =
            classes.iter().flat_map(ClassDefinition::occurrences).collect();
        let state = if occurrences.is_empty() {
            TeacherState::WorkEnded
        } else {
            TeacherState::AskAvailability
        };

        Ok(Self {
            teacher_id,
            name,
            room_agent,
            grid,
            occurrences,
            viewing: 0,
            state,
            prefs: Vec::new(),
            pref_index: 0,
        })
    }

    pub fn address(&self) -> AgentAddress {
        AgentAddress::teacher(self.teacher_id)
    }

    pub fn state(&self) -> TeacherState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == TeacherState::WorkEnded
    }

    pub fn grid(&self) -> &TimeslotGrid {
        &self.grid
    }

    pub fn occurrences(&self) -> &[ClassOccurrence] {
        &self.occurrences
    }

    pub fn count_outcome(&self, outcome: Outcome) -> usize {
        self.occurrences
            .iter()
            .filter(|o| o.outcome == outcome)
            .count()
    }

    /// Execute one state of the negotiation.
    pub fn step(&mut self, bus: &mut MessageBus) -> Result<(), ProtocolError> {
        let before = self.state;
        match self.state {
            TeacherState::AskAvailability => self.ask_availability(bus)?,
            TeacherState::ImpossibleMeeting | TeacherState::SolutionNotFound => {
                self.finish_occurrence(Outcome::NotPlaced)
            }
            TeacherState::AskSubjectPrefs => self.ask_subject_prefs(bus)?,
            TeacherState::ProposeTime => self.propose_time(bus)?,
            TeacherState::ProposeLocation => self.propose_location(bus)?,
            TeacherState::FixMeeting => self.finish_occurrence(Outcome::Placed),
            TeacherState::WorkEnded => return Ok(()),
        }
        if before != self.state {
            debug!(
                teacher = self.teacher_id,
                occurrence = self.viewing,
                from = %before,
                to = %self.state,
                "Teacher transition"
            );
        }
        Ok(())
    }

    fn current(&self) -> &ClassOccurrence {
        &self.occurrences[self.viewing]
    }

    fn ask_availability(&mut self, bus: &mut MessageBus) -> Result<(), ProtocolError> {
        let (group, week) = (self.current().group_id, self.current().week);
        match self.request(bus, AgentAddress::group(group), Payload::WhenAvail)? {
            Payload::UserAvail(group_grid) => {
                self.state = if self.grid.has_common_free_cell(&group_grid, week) {
                    TeacherState::AskSubjectPrefs
                } else {
                    TeacherState::ImpossibleMeeting
                };
                Ok(())
            }
            other => Err(self.unexpected_reply("UserAvail", Some(other.kind()))),
        }
    }

    fn ask_subject_prefs(&mut self, bus: &mut MessageBus) -> Result<(), ProtocolError> {
        let occurrence = self.current().clone();
        let group = AgentAddress::group(occurrence.group_id);
        match self.request(bus, group, Payload::Evaluate(occurrence))? {
            Payload::SubjPrefs(prefs) => {
                self.prefs = prefs;
                self.pref_index = 0;
                self.state = TeacherState::ProposeTime;
                Ok(())
            }
            other => Err(self.unexpected_reply("SubjPrefs", Some(other.kind()))),
        }
    }

    fn propose_time(&mut self, bus: &mut MessageBus) -> Result<(), ProtocolError> {
        // Candidates the teacher is already busy at are skipped without asking.
        while self
            .prefs
            .get(self.pref_index)
            .is_some_and(|at| !self.grid.is_free(*at))
        {
            self.pref_index += 1;
        }
        let Some(&at) = self.prefs.get(self.pref_index) else {
            self.state = TeacherState::SolutionNotFound;
            return Ok(());
        };

        let (class_id, group_id) = (self.current().class_id, self.current().group_id);
        let proposal = Payload::TimeProposal { class_id, at };
        match self.request(bus, AgentAddress::group(group_id), proposal)? {
            Payload::Accept { .. } => {
                self.grid
                    .reserve(at, class_id, Some(group_id))
                    .map_err(|source| self.invalid_cell(MessageKind::Accept, at, source))?;
                self.state = TeacherState::ProposeLocation;
            }
            Payload::Reject => self.pref_index += 1,
            other => return Err(self.unexpected_reply("Accept or Reject", Some(other.kind()))),
        }
        Ok(())
    }

    fn propose_location(&mut self, bus: &mut MessageBus) -> Result<(), ProtocolError> {
        let at = self.prefs[self.pref_index];
        let occurrence = self.current().clone();
        let group = AgentAddress::group(occurrence.group_id);

        match self.request(bus, self.room_agent, Payload::LocProposal { occurrence, at })? {
            Payload::Accept {
                room_id: Some(room_id),
            } => {
                self.grid
                    .confirm(at, room_id)
                    .map_err(|source| self.invalid_cell(MessageKind::Accept, at, source))?;
                self.notify(bus, group, Payload::FixMeeting { at, room_id })?;
                self.state = TeacherState::FixMeeting;
            }
            Payload::Reject => {
                self.grid
                    .cancel(at)
                    .map_err(|source| self.invalid_cell(MessageKind::Reject, at, source))?;
                self.notify(bus, group, Payload::CancelMeeting { at })?;
                self.pref_index += 1;
                self.state = TeacherState::ProposeTime;
            }
            other => {
                return Err(self.unexpected_reply("Accept(room) or Reject", Some(other.kind())));
            }
        }
        Ok(())
    }

    /// Settle the current occurrence and move to the next one.
    fn finish_occurrence(&mut self, outcome: Outcome) {
        let teacher_id = self.teacher_id;
        let occurrence = &mut self.occurrences[self.viewing];
        occurrence.settle(outcome);
        debug!(
            teacher = teacher_id,
            class = occurrence.class_id,
            week = occurrence.week,
            outcome = ?outcome,
            "Occurrence settled"
        );

        self.viewing += 1;
        self.prefs.clear();
        self.pref_index = 0;
        if self.viewing >= self.occurrences.len() {
            self.state = TeacherState::WorkEnded;
            info!(
                teacher = %self.name,
                placed = self.count_outcome(Outcome::Placed),
                not_placed = self.count_outcome(Outcome::NotPlaced),
                "Teacher finished"
            );
        } else {
            self.state = TeacherState::AskAvailability;
        }
    }

    /// Send a request that must be answered.
    fn request(
        &self,
        bus: &mut MessageBus,
        to: AgentAddress,
        payload: Payload,
    ) -> Result<Payload, ProtocolError> {
        match bus.send(Message::new(self.address(), to, payload))? {
            Some(reply) => Ok(reply.payload),
            None => Err(self.unexpected_reply("a reply", None)),
        }
    }

    /// Send a notification that must not be answered.
    fn notify(
        &self,
        bus: &mut MessageBus,
        to: AgentAddress,
        payload: Payload,
    ) -> Result<(), ProtocolError> {
        match bus.send(Message::new(self.address(), to, payload))? {
            None => Ok(()),
            Some(reply) => Err(self.unexpected_reply("no reply", Some(reply.kind()))),
        }
    }

    fn unexpected_reply(&self, expected: &'static str, got: Option<MessageKind>) -> ProtocolError {
        ProtocolError::UnexpectedReply {
            agent: self.address(),
            state: self.state.to_string(),
            expected,
            got,
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
