//! Schedule configuration generator.
//!
//! Generates random scheduling configurations: groups with subject classes of
//! every class type, split across week parities, and a room pool covering
//! every class type.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use negotiation_kernel::{ClassConfig, GroupConfig, PeriodConfig, RoomConfig, ScheduleConfig};

const SUBJECTS: [&str; 12] = [
    "Mathematics",
    "Physics",
    "Chemistry",
    "Biology",
    "History",
    "Literature",
    "Informatics",
    "Economics",
    "Philosophy",
    "Geography",
    "Statistics",
    "Linguistics",
];

const WEEK_DAYS: [&str; 6] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Configuration for generating schedule configurations.
#[derive(Debug, Clone)]
pub struct ScheduleGeneratorConfig {
    /// Week parity names.
    pub week_parity: Vec<String>,
    /// Days per week (at most 6).
    pub days_per_week: usize,
    /// Class slots per day.
    pub slots_per_day: usize,
    /// Slots below this index are never padded.
    pub class_min_count: usize,
    /// Number of groups.
    pub num_groups: usize,
    /// Subjects per group; each subject yields one class per class type.
    pub subjects_per_group: usize,
    /// Class types, e.g. lecture / practice.
    pub class_types: Vec<String>,
    /// Total meetings per class across all parities (min, max).
    pub class_times_range: (u32, u32),
    /// Number of distinct teachers.
    pub num_teachers: usize,
    /// Number of rooms.
    pub num_rooms: usize,
    /// Tools rooms may carry and classes may require.
    pub tools: Vec<String>,
    /// Probability that a class requires a given tool.
    pub tool_probability: f64,
}

impl Default for ScheduleGeneratorConfig {
    fn default() -> Self {
        Self::medium()
    }
}

impl ScheduleGeneratorConfig {
    fn base() -> Self {
        Self {
            week_parity: vec!["odd".to_string(), "even".to_string()],
            days_per_week: 5,
            slots_per_day: 5,
            class_min_count: 2,
            num_groups: 4,
            subjects_per_group: 4,
            class_types: vec!["lecture".to_string(), "practice".to_string()],
            class_times_range: (1, 3),
            num_teachers: 6,
            num_rooms: 4,
            tools: vec!["projector".to_string(), "whiteboard".to_string()],
            tool_probability: 0.2,
        }
    }

    /// Easy difficulty: few groups, plenty of rooms and teachers.
    pub fn easy() -> Self {
        Self {
            num_groups: 2,
            subjects_per_group: 3,
            class_times_range: (1, 2),
            num_teachers: 6,
            num_rooms: 4,
            tool_probability: 0.1,
            ..Self::base()
        }
    }

    /// Medium difficulty: moderate load and room pool.
    pub fn medium() -> Self {
        Self::base()
    }

    /// Hard difficulty: many groups and busy teachers sharing a small pool.
    pub fn hard() -> Self {
        Self {
            num_groups: 6,
            subjects_per_group: 5,
            class_times_range: (2, 4),
            num_teachers: 5,
            num_rooms: 3,
            tools: vec![
                "projector".to_string(),
                "whiteboard".to_string(),
                "lab bench".to_string(),
            ],
            tool_probability: 0.35,
            ..Self::base()
        }
    }
}

/// Generator for schedule configurations.
pub struct ScheduleGenerator {
    config: ScheduleGeneratorConfig,
    rng: ChaCha8Rng,
}

impl ScheduleGenerator {
    /// Create a new generator with the given config and seed.
    pub fn new(config: ScheduleGeneratorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generate a schedule configuration.
    pub fn generate(&mut self) -> ScheduleConfig {
        let teachers: Vec<String> = (1..=self.config.num_teachers.max(1))
            .map(|i| format!("Teacher {i}"))
            .collect();
        let groups = (1..=self.config.num_groups)
            .map(|i| self.generate_group(format!("Group {i}"), &teachers))
            .collect();
        let rooms = self.generate_rooms();

        ScheduleConfig {
            period: self.generate_period(),
            class_min_count: self.config.class_min_count,
            groups,
            rooms,
            teachers: Vec::new(),
        }
    }

    fn generate_period(&self) -> PeriodConfig {
        let days = self.config.days_per_week.clamp(1, WEEK_DAYS.len());
        PeriodConfig {
            week_parity: self.config.week_parity.clone(),
            week_days: WEEK_DAYS[..days].iter().map(|d| d.to_string()).collect(),
            class_times: (0..self.config.slots_per_day).map(slot_name).collect(),
        }
    }

    /// One group: distinct subjects, each expanded into one class per type.
    fn generate_group(&mut self, name: String, teachers: &[String]) -> GroupConfig {
        let mut subjects: Vec<&str> = SUBJECTS.to_vec();
        subjects.shuffle(&mut self.rng);
        subjects.truncate(self.config.subjects_per_group);

        let mut classes = Vec::with_capacity(subjects.len() * self.config.class_types.len());
        for subject in subjects {
            for class_type in self.config.class_types.clone() {
                let total = self
                    .rng
                    .random_range(self.config.class_times_range.0..=self.config.class_times_range.1);
                let teacher = teachers[self.rng.random_range(0..teachers.len())].clone();
                let tools = self
                    .config
                    .tools
                    .iter()
                    .filter(|_| self.rng.random_bool(self.config.tool_probability))
                    .cloned()
                    .collect();

                classes.push(ClassConfig {
                    name: format!("{subject}, {class_type}"),
                    times: self.split_times(total),
                    class_type,
                    teacher,
                    tools,
                });
            }
        }

        GroupConfig { name, classes }
    }

    /// Split `total` meetings randomly across the week parities.
    fn split_times(&mut self, total: u32) -> Vec<u32> {
        let parities = self.config.week_parity.len().max(1);
        let mut left = total;
        let mut times = Vec::with_capacity(parities);
        for _ in 1..parities {
            let here = self.rng.random_range(0..=left);
            times.push(here);
            left -= here;
        }
        times.push(left);
        times
    }

    /// Rooms cycle through the class types so every type has a room, and may
    /// pick up further types and tools at random.
    fn generate_rooms(&mut self) -> Vec<RoomConfig> {
        let types = &self.config.class_types;
        if types.is_empty() {
            return Vec::new();
        }
        (0..self.config.num_rooms)
            .map(|i| {
                let mut room_types = vec![types[i % types.len()].clone()];
                for (j, class_type) in types.iter().enumerate() {
                    if j != i % types.len() && self.rng.random_bool(0.5) {
                        room_types.push(class_type.clone());
                    }
                }
                let tools = self
                    .config
                    .tools
                    .iter()
                    .filter(|_| self.rng.random_bool(0.6))
                    .cloned()
                    .collect();
                RoomConfig {
                    name: format!("Room {}", 101 + i),
                    types: room_types,
                    tools,
                }
            })
            .collect()
    }
}

/// Slot start times: 8:00 plus 1h45 per slot.
fn slot_name(slot: usize) -> String {
    let minutes = 8 * 60 + slot * 105;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
