//! Timetable decoder: turns final group grids back into named timetables.
//!
//! Output shape per group: `group_name` next to week parity name -> day name ->
//! slot name -> entry, where an entry is `[class, teacher, room]` or the free
//! marker `"---"`. Blocked padding cells are left out. Every level keeps the
//! order of the configured name lists.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use negotiation_kernel::{
    Cell, EntityId, EntityRegistry, PeriodConfig, ScheduleOrchestrator, TimeSlot, TimeslotGrid,
};

/// Marker written for free cells.
pub const FREE_MARKER: &str = "---";

/// One decoded cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimetableEntry {
    /// `[class, teacher, room]`
    Meeting([String; 3]),
    Free(String),
}

impl TimetableEntry {
    pub fn free() -> Self {
        Self::Free(FREE_MARKER.to_string())
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free(_))
    }
}

/// Slot name -> entry.
pub type DayTimetable = IndexMap<String, TimetableEntry>;

/// Day name -> slots.
pub type WeekTimetable = IndexMap<String, DayTimetable>;

/// Full timetable of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTimetable {
    pub group_name: String,
    /// Parity name -> days, flattened next to `group_name`.
    #[serde(flatten)]
    pub weeks: IndexMap<String, WeekTimetable>,
}

impl GroupTimetable {
    /// Entry at the given names, if the cell was not padded away.
    pub fn entry(&self, parity: &str, day: &str, slot: &str) -> Option<&TimetableEntry> {
        self.weeks.get(parity)?.get(day)?.get(slot)
    }

    /// Entries holding a meeting.
    pub fn meetings(&self) -> impl Iterator<Item = &[String; 3]> {
        self.weeks
            .values()
            .flat_map(IndexMap::values)
            .flat_map(IndexMap::values)
            .filter_map(|entry| match entry {
                TimetableEntry::Meeting(meeting) => Some(meeting),
                TimetableEntry::Free(_) => None,
            })
    }
}

/// Resolves ids back to names through the registry used to build the schedule.
pub struct TimetableDecoder<'a> {
    registry: &'a EntityRegistry,
    names: &'a PeriodConfig,
}

impl<'a> TimetableDecoder<'a> {
    pub fn new(registry: &'a EntityRegistry, names: &'a PeriodConfig) -> Self {
        Self { registry, names }
    }

    /// Decode every group grid of a finished schedule, in group id order.
    pub fn decode(&self, schedule: &ScheduleOrchestrator) -> Vec<GroupTimetable> {
        schedule
            .group_grids()
            .into_iter()
            .map(|(group_id, grid)| self.decode_group(group_id, grid))
            .collect()
    }

    pub fn decode_group(&self, group_id: EntityId, grid: &TimeslotGrid) -> GroupTimetable {
        let period = grid.period();
        let weeks: IndexMap<String, WeekTimetable> = self
            .names
            .week_parity
            .iter()
            .enumerate()
            .map(|(week, parity)| {
                let days: WeekTimetable = period
                    .week_days(week)
                    .zip(&self.names.week_days)
                    .map(|(day, day_name)| (day_name.clone(), self.decode_day(grid, day)))
                    .collect();
                (parity.clone(), days)
            })
            .collect();

        GroupTimetable {
            group_name: self.name(group_id),
            weeks,
        }
    }

    fn decode_day(&self, grid: &TimeslotGrid, day: usize) -> DayTimetable {
        self.names
            .class_times
            .iter()
            .enumerate()
            .filter_map(|(slot, slot_name)| {
                let entry = self.decode_cell(grid.get(TimeSlot::new(day, slot))?)?;
                Some((slot_name.clone(), entry))
            })
            .collect()
    }

    fn decode_cell(&self, cell: &Cell) -> Option<TimetableEntry> {
        match cell {
            Cell::Blocked => None,
            Cell::Free => Some(TimetableEntry::free()),
            Cell::Reserved(reservation) => {
                let optional = |id: Option<EntityId>| id.map(|id| self.name(id)).unwrap_or_default();
                Some(TimetableEntry::Meeting([
                    self.name(reservation.class_id),
                    optional(reservation.owner_id),
                    optional(reservation.room_id),
                ]))
            }
        }
    }

    fn name(&self, id: EntityId) -> String {
        self.registry
            .name(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{id}"))
    }
}
