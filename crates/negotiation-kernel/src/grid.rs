//! Timeslot grids: the day-major cell arrays every agent owns.
//!
//! A cell moves `Free -> Reserved(partial) -> Reserved(complete)` on commit or
//! `Free -> Reserved(partial) -> Free` on cancel. `Blocked` cells are placed at
//! build time and never change afterwards.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::registry::{BLOCKED_SLOT, EntityId};

/// A (day, slot) coordinate in the scheduling period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Day index within the whole period.
    pub day: usize,
    /// Slot index within the day.
    pub slot: usize,
}

impl TimeSlot {
    pub fn new(day: usize, slot: usize) -> Self {
        Self { day, slot }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}]", self.day, self.slot)
    }
}

/// Shape of the scheduling period.
///
/// The period is split into `parity_rank` equal-length weeks; week `w` is the
/// band every occurrence with parity `w` negotiates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub days: usize,
    pub slots_per_day: usize,
    pub parity_rank: usize,
}

impl Period {
    pub fn new(days: usize, slots_per_day: usize, parity_rank: usize) -> Self {
        Self {
            days,
            slots_per_day,
            parity_rank,
        }
    }

    pub fn days_per_week(&self) -> usize {
        self.days / self.parity_rank.max(1)
    }

    /// `day / (period_length / parity_rank)`.
    pub fn week_of(&self, day: usize) -> usize {
        day / self.days_per_week().max(1)
    }

    /// Day indices belonging to `week`.
    pub fn week_days(&self, week: usize) -> Range<usize> {
        let per_week = self.days_per_week();
        let start = (week * per_week).min(self.days);
        let end = (start + per_week).min(self.days);
        start..end
    }

    /// Number of cells in one week.
    pub fn week_capacity(&self) -> usize {
        self.days_per_week() * self.slots_per_day
    }
}

/// Placement data of a reserved cell, filled in progressively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reservation {
    pub class_id: EntityId,
    /// Counterpart that requested the reservation (the teacher on group grids).
    pub owner_id: Option<EntityId>,
    /// Set only when the location is confirmed.
    pub room_id: Option<EntityId>,
}

impl Reservation {
    /// A reservation without a confirmed room can still be cancelled.
    pub fn is_pending(&self) -> bool {
        self.room_id.is_none()
    }
}

/// One grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Free,
    Blocked,
    Reserved(Reservation),
}

impl Cell {
    pub fn is_free(&self) -> bool {
        matches!(self, Cell::Free)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Cell::Blocked)
    }

    pub fn reservation(&self) -> Option<&Reservation> {
        match self {
            Cell::Reserved(r) => Some(r),
            _ => None,
        }
    }

    /// Class id held by this cell. Blocked cells report the sentinel.
    pub fn class_id(&self) -> Option<EntityId> {
        match self {
            Cell::Free => None,
            Cell::Blocked => Some(BLOCKED_SLOT),
            Cell::Reserved(r) => Some(r.class_id),
        }
    }
}

/// Day-major grid of cells for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeslotGrid {
    period: Period,
    days: Vec<Vec<Cell>>,
}

impl TimeslotGrid {
    /// An all-free grid for the period.
    pub fn new(period: Period) -> Self {
        Self {
            period,
            days: vec![vec![Cell::Free; period.slots_per_day]; period.days],
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn days(&self) -> &[Vec<Cell>] {
        &self.days
    }

    pub fn get(&self, at: TimeSlot) -> Option<&Cell> {
        self.days.get(at.day).and_then(|d| d.get(at.slot))
    }

    pub fn is_free(&self, at: TimeSlot) -> bool {
        self.get(at).is_some_and(Cell::is_free)
    }

    fn cell_mut(&mut self, at: TimeSlot) -> Result<&mut Cell, GridError> {
        self.days
            .get_mut(at.day)
            .and_then(|d| d.get_mut(at.slot))
            .ok_or(GridError::OutOfBounds { slot: at })
    }

    /// `Free -> Reserved(partial)`.
    pub fn reserve(
        &mut self,
        at: TimeSlot,
        class_id: EntityId,
        owner_id: Option<EntityId>,
    ) -> Result<(), GridError> {
        let cell = self.cell_mut(at)?;
        if !cell.is_free() {
            return Err(GridError::NotFree { slot: at });
        }
        *cell = Cell::Reserved(Reservation {
            class_id,
            owner_id,
            room_id: None,
        });
        Ok(())
    }

    /// `Reserved(partial) -> Reserved(complete)`.
    pub fn confirm(&mut self, at: TimeSlot, room_id: EntityId) -> Result<(), GridError> {
        match self.cell_mut(at)? {
            Cell::Reserved(r) if r.is_pending() => {
                r.room_id = Some(room_id);
                Ok(())
            }
            _ => Err(GridError::NotPending { slot: at }),
        }
    }

    /// `Reserved(partial) -> Free`.
    pub fn cancel(&mut self, at: TimeSlot) -> Result<(), GridError> {
        let cell = self.cell_mut(at)?;
        if !matches!(cell, Cell::Reserved(r) if r.is_pending()) {
            return Err(GridError::NotPending { slot: at });
        }
        *cell = Cell::Free;
        Ok(())
    }

    /// `Free -> Blocked`. Only used while building grids.
    pub fn block(&mut self, at: TimeSlot) -> Result<(), GridError> {
        let cell = self.cell_mut(at)?;
        if !cell.is_free() {
            return Err(GridError::NotFree { slot: at });
        }
        *cell = Cell::Blocked;
        Ok(())
    }

    /// Every cell with its coordinate, day-major.
    pub fn cells(&self) -> impl Iterator<Item = (TimeSlot, &Cell)> {
        self.days.iter().enumerate().flat_map(|(day, slots)| {
            slots
                .iter()
                .enumerate()
                .map(move |(slot, cell)| (TimeSlot::new(day, slot), cell))
        })
    }

    /// Free cells of `week` in scan order: day ascending, then slot ascending.
    pub fn free_cells(&self, week: usize) -> Vec<TimeSlot> {
        let mut free = Vec::new();
        for day in self.period.week_days(week) {
            for (slot, cell) in self.days[day].iter().enumerate() {
                if cell.is_free() {
                    free.push(TimeSlot::new(day, slot));
                }
            }
        }
        free
    }

    /// Whether both grids are free at some cell of `week`.
    pub fn has_common_free_cell(&self, other: &TimeslotGrid, week: usize) -> bool {
        self.period.week_days(week).any(|day| {
            (0..self.period.slots_per_day).any(|slot| {
                let at = TimeSlot::new(day, slot);
                self.is_free(at) && other.is_free(at)
            })
        })
    }

    /// Block trailing slots of `week` until `surplus` cells are blocked.
    ///
    /// Days are visited in order. Each day is blocked from its last slot
    /// backwards, never below `floor`, before moving to the next day. Returns
    /// how many cells were blocked.
    pub fn pad_week(&mut self, week: usize, surplus: usize, floor: usize) -> usize {
        let mut blocked = 0;
        for day in self.period.week_days(week) {
            for slot in (floor..self.period.slots_per_day).rev() {
                if blocked >= surplus {
                    return blocked;
                }
                if self.block(TimeSlot::new(day, slot)).is_ok() {
                    blocked += 1;
                }
            }
        }
        blocked
    }

    pub fn count_reserved(&self) -> usize {
        self.cells().filter(|(_, c)| c.reservation().is_some()).count()
    }

    pub fn count_blocked(&self) -> usize {
        self.cells().filter(|(_, c)| c.is_blocked()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period() -> Period {
        Period::new(4, 3, 2)
    }

    #[test]
    fn test_week_of() {
        let p = Period::new(10, 4, 2);
        assert_eq!(p.days_per_week(), 5);
        assert_eq!(p.week_of(0), 0);
        assert_eq!(p.week_of(4), 0);
        assert_eq!(p.week_of(5), 1);
        assert_eq!(p.week_days(1), 5..10);
    }

    #[test]
    fn test_commit_path() {
        let mut grid = TimeslotGrid::new(period());
        let at = TimeSlot::new(1, 2);
        grid.reserve(at, 7, Some(3)).unwrap();
        assert!(grid.get(at).unwrap().reservation().unwrap().is_pending());
        grid.confirm(at, 9).unwrap();
        assert_eq!(
            grid.get(at),
            Some(&Cell::Reserved(Reservation {
                class_id: 7,
                owner_id: Some(3),
                room_id: Some(9),
            }))
        );
        assert_eq!(grid.cancel(at), Err(GridError::NotPending { slot: at }));
    }

    #[test]
    fn test_cancel_restores_free() {
        let mut grid = TimeslotGrid::new(period());
        let at = TimeSlot::new(0, 0);
        grid.reserve(at, 7, Some(3)).unwrap();
        grid.cancel(at).unwrap();
        assert_eq!(grid.get(at), Some(&Cell::Free));
    }

    #[test]
    fn test_illegal_transitions() {
        let mut grid = TimeslotGrid::new(period());
        let at = TimeSlot::new(0, 1);
        assert_eq!(grid.confirm(at, 1), Err(GridError::NotPending { slot: at }));
        assert_eq!(grid.cancel(at), Err(GridError::NotPending { slot: at }));

        grid.block(at).unwrap();
        assert_eq!(grid.reserve(at, 4, None), Err(GridError::NotFree { slot: at }));
        assert_eq!(grid.get(at).unwrap().class_id(), Some(BLOCKED_SLOT));

        let outside = TimeSlot::new(9, 0);
        assert_eq!(
            grid.reserve(outside, 4, None),
            Err(GridError::OutOfBounds { slot: outside })
        );
    }

    #[test]
    fn test_free_cells_scan_order() {
        let mut grid = TimeslotGrid::new(period());
        grid.block(TimeSlot::new(2, 0)).unwrap();
        let free = grid.free_cells(1);
        assert_eq!(
            free,
            vec![
                TimeSlot::new(2, 1),
                TimeSlot::new(2, 2),
                TimeSlot::new(3, 0),
                TimeSlot::new(3, 1),
                TimeSlot::new(3, 2),
            ]
        );
    }

    #[test]
    fn test_common_free_cell() {
        let mut a = TimeslotGrid::new(Period::new(1, 2, 1));
        let mut b = TimeslotGrid::new(Period::new(1, 2, 1));
        a.reserve(TimeSlot::new(0, 0), 1, None).unwrap();
        assert!(a.has_common_free_cell(&b, 0));
        b.block(TimeSlot::new(0, 1)).unwrap();
        assert!(!a.has_common_free_cell(&b, 0));
    }

    #[test]
    fn test_pad_week_fills_each_day_backwards() {
        let mut grid = TimeslotGrid::new(Period::new(2, 4, 1));
        let blocked = grid.pad_week(0, 3, 1);
        assert_eq!(blocked, 3);
        let cells: Vec<(usize, usize)> = grid
            .cells()
            .filter(|(_, c)| c.is_blocked())
            .map(|(at, _)| (at.day, at.slot))
            .collect();
        assert_eq!(cells, vec![(0, 1), (0, 2), (0, 3)]);
        assert!(grid.is_free(TimeSlot::new(1, 3)));
    }

    #[test]
    fn test_pad_week_moves_to_next_day_at_floor() {
        let mut grid = TimeslotGrid::new(Period::new(4, 3, 2));
        let blocked = grid.pad_week(1, 3, 1);
        assert_eq!(blocked, 3);
        assert!(grid.get(TimeSlot::new(2, 2)).unwrap().is_blocked());
        assert!(grid.get(TimeSlot::new(2, 1)).unwrap().is_blocked());
        assert!(grid.is_free(TimeSlot::new(2, 0)));
        assert!(grid.get(TimeSlot::new(3, 2)).unwrap().is_blocked());
        assert!(grid.is_free(TimeSlot::new(3, 1)));
        assert_eq!(grid.free_cells(0).len(), 6);
    }

    #[test]
    fn test_pad_week_respects_floor() {
        let mut grid = TimeslotGrid::new(Period::new(2, 4, 1));
        let blocked = grid.pad_week(0, 100, 2);
        assert_eq!(blocked, 4);
        for (at, cell) in grid.cells() {
            assert_eq!(cell.is_blocked(), at.slot >= 2);
        }
    }
}
