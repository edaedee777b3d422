//! Property-based tests over generated schedules.
//!
//! For any valid configuration and seed, a completed run SHALL:
//! - settle every occurrence as placed or not placed
//! - never book a room or a teacher twice in the same cell
//! - leave no pending reservation behind, on teacher, group or room grids
//! - keep padding at or above the slot floor
//! - reproduce itself exactly for the same seed

use std::collections::BTreeSet;

use negotiation_kernel::{
    Cell, ClassConfig, EntityRegistry, GroupConfig, PeriodConfig, RoomConfig, ScheduleConfig,
    ScheduleOrchestrator, TimeSlot, TimeslotGrid,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const TYPES: [&str; 3] = ["lecture", "lab", "seminar"];
const TOOLS: [&str; 2] = ["projector", "board"];

// ============================================================================
// STRATEGIES
// ============================================================================

fn names(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix}{i}")).collect()
}

fn arb_subset(pool: &'static [&'static str], min: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::sample::subsequence(pool.to_vec(), min..=pool.len())
        .prop_map(|picked| picked.into_iter().map(str::to_string).collect())
}

fn arb_class(parity_rank: usize) -> impl Strategy<Value = (String, Vec<u32>, usize, Vec<String>)> {
    (
        proptest::sample::select(TYPES.to_vec()).prop_map(str::to_string),
        prop::collection::vec(0u32..=2, parity_rank),
        0usize..3,
        arb_subset(&TOOLS, 0),
    )
}

fn arb_config() -> impl Strategy<Value = ScheduleConfig> {
    (1usize..=2, 1usize..=3, 1usize..=4, 0usize..=2).prop_flat_map(
        |(parity_rank, days, slots, floor)| {
            let groups = prop::collection::vec(
                prop::collection::vec(arb_class(parity_rank), 1..=3),
                1..=3,
            );
            let rooms = prop::collection::vec(
                (arb_subset(&TYPES, 1), arb_subset(&TOOLS, 0)),
                0..=3,
            );
            (groups, rooms).prop_map(move |(groups, rooms)| ScheduleConfig {
                period: PeriodConfig {
                    week_parity: names("parity", parity_rank),
                    week_days: names("day", days),
                    class_times: names("slot", slots),
                },
                class_min_count: floor,
                groups: groups
                    .into_iter()
                    .enumerate()
                    .map(|(g, classes)| GroupConfig {
                        name: format!("group{g}"),
                        classes: classes
                            .into_iter()
                            .enumerate()
                            .map(|(c, (class_type, times, teacher, tools))| ClassConfig {
                                name: format!("class{c}, {class_type}"),
                                class_type,
                                times,
                                teacher: format!("teacher{teacher}"),
                                tools,
                            })
                            .collect(),
                    })
                    .collect(),
                rooms: rooms
                    .into_iter()
                    .enumerate()
                    .map(|(r, (types, tools))| RoomConfig {
                        name: format!("room{r}"),
                        types,
                        tools,
                    })
                    .collect(),
                teachers: Vec::new(),
            })
        },
    )
}

fn run(config: &ScheduleConfig, seed: u64) -> ScheduleOrchestrator {
    let mut registry = EntityRegistry::new();
    let mut schedule =
        ScheduleOrchestrator::new(config, &mut registry, ChaCha8Rng::seed_from_u64(seed))
            .expect("generated config is valid");
    schedule.run(Some(10_000)).expect("negotiation converges");
    schedule
}

fn snapshot(schedule: &ScheduleOrchestrator) -> Vec<TimeslotGrid> {
    schedule
        .group_grids()
        .into_values()
        .chain(schedule.room_grids().into_values())
        .cloned()
        .collect()
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_outcomes_partition_occurrences(config in arb_config(), seed in any::<u64>()) {
        let schedule = run(&config, seed);
        let stats = schedule.stats();
        prop_assert_eq!(stats.placed + stats.not_placed, stats.owned);

        let reserved: usize = schedule.group_grids().values().map(|g| g.count_reserved()).sum();
        prop_assert_eq!(reserved, stats.placed);
    }

    #[test]
    fn prop_no_double_booking(config in arb_config(), seed in any::<u64>()) {
        let schedule = run(&config, seed);
        let mut room_cells: BTreeSet<(TimeSlot, u32)> = BTreeSet::new();
        let mut teacher_cells: BTreeSet<(TimeSlot, u32)> = BTreeSet::new();

        for grid in schedule.group_grids().values() {
            for (at, cell) in grid.cells() {
                if let Cell::Reserved(r) = cell {
                    let room = r.room_id.expect("no pending reservation survives a run");
                    let teacher = r.owner_id.expect("group cells record the teacher");
                    prop_assert!(room_cells.insert((at, room)));
                    prop_assert!(teacher_cells.insert((at, teacher)));

                    let room_cell = schedule.room_grids()[&room].get(at).copied();
                    prop_assert_eq!(room_cell.and_then(|c| c.class_id()), Some(r.class_id));
                }
            }
        }

        let room_reserved: usize = schedule.room_grids().values().map(|g| g.count_reserved()).sum();
        prop_assert_eq!(room_reserved, room_cells.len());
    }

    #[test]
    fn prop_every_cell_ends_settled(config in arb_config(), seed in any::<u64>()) {
        let schedule = run(&config, seed);
        let stats = schedule.stats();

        for (room_id, grid) in schedule.room_grids() {
            for (_, cell) in grid.cells() {
                match cell {
                    Cell::Free => {}
                    Cell::Reserved(r) => prop_assert_eq!(r.room_id, Some(room_id)),
                    Cell::Blocked => prop_assert!(false, "room grids are never padded"),
                }
            }
        }

        // Cancelled proposals leave nothing behind on either side of the negotiation.
        let group_grids = schedule.group_grids();
        let mut teacher_reserved = 0;
        for (teacher_id, grid) in schedule.teacher_grids() {
            for (at, cell) in grid.cells() {
                prop_assert!(!cell.is_blocked());
                let Cell::Reserved(r) = cell else { continue };
                prop_assert!(r.room_id.is_some());
                teacher_reserved += 1;

                let group = r.owner_id.expect("teacher cells record the group");
                let group_cell = group_grids[&group].get(at).and_then(Cell::reservation);
                prop_assert_eq!(group_cell.and_then(|g| g.owner_id), Some(teacher_id));
                prop_assert_eq!(group_cell.map(|g| g.class_id), Some(r.class_id));
                prop_assert_eq!(group_cell.and_then(|g| g.room_id), r.room_id);
            }
        }
        prop_assert_eq!(teacher_reserved, stats.placed);

        for grid in group_grids.values() {
            for (_, cell) in grid.cells() {
                prop_assert!(cell.reservation().is_none_or(|r| !r.is_pending()));
            }
        }
    }

    #[test]
    fn prop_padding_respects_floor(config in arb_config()) {
        let mut registry = EntityRegistry::new();
        let schedule =
            ScheduleOrchestrator::new(&config, &mut registry, ChaCha8Rng::seed_from_u64(0))
                .expect("generated config is valid");
        for grid in schedule.group_grids().values() {
            for (at, cell) in grid.cells() {
                prop_assert!(!cell.is_blocked() || at.slot >= config.class_min_count);
            }
        }
        for grid in schedule.teacher_grids().values().chain(schedule.room_grids().values()) {
            prop_assert_eq!(grid.count_blocked(), 0);
        }
    }

    #[test]
    fn prop_same_seed_same_schedule(config in arb_config(), seed in any::<u64>()) {
        let first = run(&config, seed);
        let second = run(&config, seed);
        prop_assert_eq!(snapshot(&first), snapshot(&second));
        prop_assert_eq!(first.deliveries().len(), second.deliveries().len());
        prop_assert_eq!(first.rounds(), second.rounds());
    }
}
