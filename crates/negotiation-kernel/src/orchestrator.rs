//! Schedule orchestrator: builds every agent from configuration and drives the
//! round loop until all teachers are done.
//!
//! ## Usage
//!
//! ```ignore
//! use negotiation_kernel::{EntityRegistry, ScheduleConfig, ScheduleOrchestrator};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = ScheduleConfig::from_json(&json)?;
//! let mut registry = EntityRegistry::new();
//! let mut schedule =
//!     ScheduleOrchestrator::new(&config, &mut registry, ChaCha8Rng::seed_from_u64(42))?;
//! let rounds = schedule.run(None)?;
//! println!("{:?} after {rounds} rounds", schedule.stats());
//! ```

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agents::{GroupAgent, Room, RoomAgent, TeacherAgent, TeacherState};
use crate::bus::MessageBus;
use crate::class::{ClassDefinition, Outcome};
use crate::config::ScheduleConfig;
use crate::error::{KernelError, KernelResult};
use crate::grid::{Period, TimeslotGrid};
use crate::messages::{AgentAddress, AgentKind, DeliveryRecord};
use crate::registry::{EntityId, EntityRegistry};

/// Registry name of the single room agent.
pub const ROOM_AGENT_NAME: &str = "<rooms>";

/// Occurrence counts across all teachers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStats {
    /// Occurrences owned by all teachers
    pub owned: usize,
    pub placed: usize,
    pub not_placed: usize,
}

impl ScheduleStats {
    /// Occurrences still under negotiation.
    pub fn undetermined(&self) -> usize {
        self.owned - self.placed - self.not_placed
    }

    pub fn placement_rate(&self) -> f64 {
        if self.owned == 0 {
            return 1.0;
        }
        self.placed as f64 / self.owned as f64
    }
}

/// Owns every agent and the shuffling RNG.
#[derive(Debug)]
pub struct ScheduleOrchestrator {
    period: Period,
    teachers: BTreeMap<EntityId, TeacherAgent>,
    bus: MessageBus,
    /// Step order, reshuffled every round.
    order: Vec<AgentAddress>,
    rng: ChaCha8Rng,
    rounds: usize,
}

impl ScheduleOrchestrator {
    /// Resolve names, build padded grids, and create the agents.
    pub fn new(
        config: &ScheduleConfig,
        registry: &mut EntityRegistry,
        rng: ChaCha8Rng,
    ) -> KernelResult<Self> {
        config.validate()?;
        let period = config.period();
        let template = TimeslotGrid::new(period);
        let room_agent = AgentAddress::room(registry.resolve(ROOM_AGENT_NAME));

        let mut groups = Vec::with_capacity(config.groups.len());
        let mut teacher_classes: BTreeMap<EntityId, Vec<ClassDefinition>> = BTreeMap::new();
        for group in &config.groups {
            let group_id = registry.resolve(&group.name);
            let mut definitions = Vec::with_capacity(group.classes.len());
            for class in &group.classes {
                let definition = ClassDefinition {
                    class_id: registry.resolve(&class.name),
                    group_id,
                    type_id: registry.resolve(&class.class_type),
                    tool_ids: class.tools.iter().map(|t| registry.resolve(t)).collect(),
                    times: class.times.iter().copied().enumerate().collect(),
                };
                let teacher_id = registry.resolve(&class.teacher);
                teacher_classes
                    .entry(teacher_id)
                    .or_default()
                    .push(definition.clone());
                definitions.push(definition);
            }

            let grid = padded_group_grid(&template, &definitions, config.class_min_count);
            groups.push(GroupAgent::new(group_id, grid));
        }

        let rooms = config
            .rooms
            .iter()
            .map(|room| {
                Room::new(
                    registry.resolve(&room.name),
                    room.types.iter().map(|t| registry.resolve(t)).collect(),
                    room.tools.iter().map(|t| registry.resolve(t)).collect(),
                    template.clone(),
                )
            })
            .collect::<Vec<_>>();

        let mut teachers = BTreeMap::new();
        for (teacher_id, classes) in teacher_classes {
            let name = registry.name(teacher_id).unwrap_or_default();
            let teacher =
                TeacherAgent::new(teacher_id, name, &classes, template.clone(), room_agent)?;
            teachers.insert(teacher_id, teacher);
        }

        let order: Vec<AgentAddress> = teachers
            .values()
            .map(TeacherAgent::address)
            .chain(groups.iter().map(GroupAgent::address))
            .chain(std::iter::once(room_agent))
            .collect();

        info!(
            days = period.days,
            slots_per_day = period.slots_per_day,
            parity_rank = period.parity_rank,
            groups = groups.len(),
            teachers = teachers.len(),
            rooms = rooms.len(),
            "Schedule built"
        );

        let schedule = Self {
            period,
            teachers,
            bus: MessageBus::new(groups, RoomAgent::new(room_agent.id, rooms)),
            order,
            rng,
            rounds: 0,
        };
        debug!(occurrences = schedule.stats().owned, "Occurrences expanded");
        Ok(schedule)
    }

    /// One round: shuffle the agent list and step every agent once.
    pub fn step(&mut self) -> KernelResult<()> {
        self.order.shuffle(&mut self.rng);
        for i in 0..self.order.len() {
            let address = self.order[i];
            match address.kind {
                AgentKind::Teacher => {
                    if let Some(teacher) = self.teachers.get_mut(&address.id) {
                        teacher.step(&mut self.bus)?;
                    }
                }
                AgentKind::Group => {
                    if let Some(group) = self.bus.group_mut(address.id) {
                        group.step();
                    }
                }
                AgentKind::Room => self.bus.rooms_mut().step(),
            }
        }
        self.rounds += 1;
        debug!(round = self.rounds, ready = self.schedule_ready(), "Round complete");
        Ok(())
    }

    /// Every teacher has reached `WorkEnded`.
    pub fn schedule_ready(&self) -> bool {
        self.teachers.values().all(TeacherAgent::is_done)
    }

    /// Step until the schedule is ready. Returns the number of rounds run.
    pub fn run(&mut self, max_rounds: Option<usize>) -> KernelResult<usize> {
        while !self.schedule_ready() {
            if let Some(max_rounds) = max_rounds {
                if self.rounds >= max_rounds {
                    return Err(KernelError::RoundLimit { max_rounds });
                }
            }
            self.step()?;
        }

        let stats = self.stats();
        info!(
            rounds = self.rounds,
            messages = self.bus.log().len(),
            owned = stats.owned,
            placed = stats.placed,
            not_placed = stats.not_placed,
            "Schedule ready"
        );
        Ok(self.rounds)
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn stats(&self) -> ScheduleStats {
        self.teachers
            .values()
            .fold(ScheduleStats::default(), |mut stats, teacher| {
                stats.owned += teacher.occurrences().len();
                stats.placed += teacher.count_outcome(Outcome::Placed);
                stats.not_placed += teacher.count_outcome(Outcome::NotPlaced);
                stats
            })
    }

    pub fn teacher_states(&self) -> BTreeMap<EntityId, TeacherState> {
        self.teachers
            .iter()
            .map(|(id, teacher)| (*id, teacher.state()))
            .collect()
    }

    pub fn teacher_grids(&self) -> BTreeMap<EntityId, &TimeslotGrid> {
        self.teachers
            .iter()
            .map(|(id, teacher)| (*id, teacher.grid()))
            .collect()
    }

    pub fn group_grids(&self) -> BTreeMap<EntityId, &TimeslotGrid> {
        self.bus
            .groups()
            .iter()
            .map(|(id, group)| (*id, group.grid()))
            .collect()
    }

    pub fn room_grids(&self) -> BTreeMap<EntityId, &TimeslotGrid> {
        self.bus.rooms().room_grids()
    }

    pub fn deliveries(&self) -> &[DeliveryRecord] {
        self.bus.log()
    }

    /// Delivery log rendered as `"Teacher[4] -> Group[1] : TimeProposal"` lines.
    pub fn message_log(&self) -> Vec<String> {
        self.bus.log().iter().map(ToString::to_string).collect()
    }
}

/// Copy the template and block the per-week surplus of trailing slots.
fn padded_group_grid(
    template: &TimeslotGrid,
    definitions: &[ClassDefinition],
    floor: usize,
) -> TimeslotGrid {
    let mut grid = template.clone();
    let period = template.period();
    for week in 0..period.parity_rank {
        let load: usize = definitions.iter().map(|d| d.load_in_week(week)).sum();
        let surplus = period.week_capacity().saturating_sub(load);
        let blocked = grid.pad_week(week, surplus, floor);
        if blocked < surplus {
            debug!(week, load, surplus, blocked, "Padding stopped at slot floor");
        }
    }
    grid
}
