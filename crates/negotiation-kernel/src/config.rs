//! Configuration types for the scheduler.
//!
//! Loaded from JSON at runtime. Every collection is a list so declaration order
//! (and therefore id assignment) is stable across runs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid::Period;

/// Top-level scheduling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Shape of the scheduling period
    pub period: PeriodConfig,

    /// Slot indices below this floor are never padded away
    #[serde(default)]
    pub class_min_count: usize,

    /// Groups with their declared classes
    pub groups: Vec<GroupConfig>,

    /// Room pool, in matching order
    pub rooms: Vec<RoomConfig>,

    /// Optional roster; every listed teacher must own at least one class
    #[serde(default)]
    pub teachers: Vec<String>,
}

/// Period shape, given as name lists.
///
/// The period spans `week_parity.len()` weeks of `week_days.len()` days, each
/// day holding `class_times.len()` slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodConfig {
    /// Week parity names, e.g. `["odd", "even"]`
    pub week_parity: Vec<String>,

    /// Day names of one week
    pub week_days: Vec<String>,

    /// Slot names of one day
    pub class_times: Vec<String>,
}

/// One group and its classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    pub classes: Vec<ClassConfig>,
}

/// A class declared for a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfig {
    pub name: String,

    pub class_type: String,

    /// Meetings per week, indexed by parity
    pub times: Vec<u32>,

    pub teacher: String,

    /// Tools the room must provide
    #[serde(default)]
    pub tools: Vec<String>,
}

/// A room and what it supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    pub name: String,
    pub types: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl ScheduleConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Grid shape derived from the name lists.
    pub fn period(&self) -> Period {
        let parity_rank = self.period.week_parity.len();
        Period::new(
            self.period.week_days.len() * parity_rank,
            self.period.class_times.len(),
            parity_rank,
        )
    }

    /// Check everything that can be checked before ids are assigned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let period = &self.period;
        for (field, names) in [
            ("week_parity", &period.week_parity),
            ("week_days", &period.week_days),
            ("class_times", &period.class_times),
        ] {
            if names.is_empty() {
                return Err(ConfigError::InvalidPeriod {
                    reason: format!("{field} is empty"),
                });
            }
        }
        let parity_rank = period.week_parity.len();
        unique_names("parity", period.week_parity.iter().map(String::as_str))?;
        unique_names("day", period.week_days.iter().map(String::as_str))?;
        unique_names("slot", period.class_times.iter().map(String::as_str))?;

        unique_names("group", self.groups.iter().map(|g| g.name.as_str()))?;
        unique_names("room", self.rooms.iter().map(|r| r.name.as_str()))?;

        for group in &self.groups {
            let mut seen = BTreeSet::new();
            for class in &group.classes {
                let malformed = |reason: String| ConfigError::MalformedClass {
                    group: group.name.clone(),
                    class: class.name.clone(),
                    reason,
                };
                if !seen.insert(class.name.as_str()) {
                    return Err(malformed("declared twice".to_string()));
                }
                if class.class_type.is_empty() {
                    return Err(malformed("missing class type".to_string()));
                }
                if class.teacher.is_empty() {
                    return Err(malformed("missing teacher".to_string()));
                }
                if class.times.len() != parity_rank {
                    return Err(malformed(format!(
                        "expected {} per-parity counts, got {}",
                        parity_rank,
                        class.times.len()
                    )));
                }
            }
        }

        for room in &self.rooms {
            if room.types.is_empty() {
                return Err(ConfigError::MalformedRoom {
                    room: room.name.clone(),
                    reason: "supports no class type".to_string(),
                });
            }
        }

        for teacher in &self.teachers {
            let owns_class = self
                .groups
                .iter()
                .flat_map(|g| &g.classes)
                .any(|c| &c.teacher == teacher);
            if !owns_class {
                return Err(ConfigError::TeacherWithoutClasses {
                    teacher: teacher.clone(),
                });
            }
        }

        Ok(())
    }
}

fn unique_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "period": {
            "week_parity": ["odd", "even"],
            "week_days": ["Mon", "Tue", "Wed"],
            "class_times": ["8:00", "9:45"]
        },
        "class_min_count": 1,
        "groups": [
            {
                "name": "G1",
                "classes": [
                    {"name": "Math, lecture", "class_type": "lecture", "times": [1, 0], "teacher": "Smith"}
                ]
            }
        ],
        "rooms": [
            {"name": "R1", "types": ["lecture"], "tools": ["projector"]}
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = ScheduleConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.period(), Period::new(6, 2, 2));
        assert_eq!(config.class_min_count, 1);
        assert!(config.groups[0].classes[0].tools.is_empty());
        assert!(config.teachers.is_empty());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ScheduleConfig::from_json(SAMPLE).unwrap();
        let again = ScheduleConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, again);
    }

    #[test]
    fn test_parse_error() {
        let err = ScheduleConfig::from_json("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_empty_period_list() {
        let mut config = ScheduleConfig::from_json(SAMPLE).unwrap();
        config.period.class_times.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_times_must_cover_every_parity() {
        let mut config = ScheduleConfig::from_json(SAMPLE).unwrap();
        config.groups[0].classes[0].times = vec![1];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MalformedClass { .. })
        ));
    }

    #[test]
    fn test_duplicate_group_name() {
        let mut config = ScheduleConfig::from_json(SAMPLE).unwrap();
        config.groups.push(config.groups[0].clone());
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateName {
                kind: "group",
                name: "G1".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_period_names() {
        let mut config = ScheduleConfig::from_json(SAMPLE).unwrap();
        config.period.week_days.push("Tue".to_string());
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateName {
                kind: "day",
                name: "Tue".to_string()
            })
        );
    }

    #[test]
    fn test_room_without_types() {
        let mut config = ScheduleConfig::from_json(SAMPLE).unwrap();
        config.rooms[0].types.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MalformedRoom { .. })
        ));
    }

    #[test]
    fn test_roster_teacher_without_classes() {
        let mut config = ScheduleConfig::from_json(SAMPLE).unwrap();
        config.teachers = vec!["Smith".to_string(), "Jones".to_string()];
        assert_eq!(
            config.validate(),
            Err(ConfigError::TeacherWithoutClasses {
                teacher: "Jones".to_string()
            })
        );
    }
}
