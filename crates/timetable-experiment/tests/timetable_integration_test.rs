//! Integration tests for configuration loading, negotiation and decoding.

use proptest::prelude::*;

use negotiation_kernel::ScheduleConfig;
use timetable_experiment::decoder::{FREE_MARKER, TimetableEntry};
use timetable_experiment::{
    ExperimentRunner, ExperimentRunnerConfig, ScheduleGenerator, ScheduleGeneratorConfig,
};

const CONFIG: &str = r#"{
    "period": {
        "week_parity": ["odd", "even"],
        "week_days": ["Monday", "Tuesday"],
        "class_times": ["08:00", "09:45", "11:30"]
    },
    "class_min_count": 1,
    "groups": [
        {
            "name": "CS-101",
            "classes": [
                {"name": "Algebra, lecture", "class_type": "lecture", "times": [1, 1], "teacher": "Ivanova"},
                {"name": "Algebra, practice", "class_type": "practice", "times": [1, 0], "teacher": "Petrov"}
            ]
        },
        {
            "name": "CS-102",
            "classes": [
                {"name": "Physics, lab", "class_type": "practice", "times": [0, 2], "teacher": "Petrov", "tools": ["oscilloscope"]}
            ]
        }
    ],
    "rooms": [
        {"name": "Hall A", "types": ["lecture"]},
        {"name": "Lab 3", "types": ["practice"], "tools": ["oscilloscope"]}
    ],
    "teachers": ["Ivanova", "Petrov"]
}"#;

#[test]
fn test_json_config_is_fully_placed() {
    let config = ScheduleConfig::from_json(CONFIG).unwrap();
    let runner = ExperimentRunner::new(ExperimentRunnerConfig {
        keep_message_log: true,
        ..Default::default()
    });
    let output = runner.run("sample", &config, 17).unwrap();

    let stats = output.report.stats;
    assert_eq!(stats.owned, 5);
    assert_eq!(stats.placed, 5);
    assert_eq!(output.teacher_states.len(), 2);
    assert!(output.message_log.iter().any(|l| l.ends_with(": FixMeeting")));

    let cs101 = output
        .timetables
        .iter()
        .find(|t| t.group_name == "CS-101")
        .unwrap();
    assert_eq!(cs101.weeks.keys().collect::<Vec<_>>(), ["odd", "even"]);
    assert_eq!(
        cs101.weeks["even"].keys().collect::<Vec<_>>(),
        ["Monday", "Tuesday"]
    );
    // Slots above the floor are padded away, so only the first slot is decoded.
    assert!(cs101.weeks.values().flat_map(|w| w.values()).all(|d| d.len() == 1));

    let mut meetings: Vec<_> = cs101.meetings().cloned().collect();
    meetings.sort();
    assert_eq!(
        meetings,
        vec![
            ["Algebra, lecture".to_string(), "Ivanova".to_string(), "Hall A".to_string()],
            ["Algebra, lecture".to_string(), "Ivanova".to_string(), "Hall A".to_string()],
            ["Algebra, practice".to_string(), "Petrov".to_string(), "Lab 3".to_string()],
        ]
    );

    let cs102 = output
        .timetables
        .iter()
        .find(|t| t.group_name == "CS-102")
        .unwrap();
    assert!(cs102.meetings().all(|m| m[2] == "Lab 3"));
}

#[test]
fn test_timetable_json_uses_free_marker() {
    let config = ScheduleConfig::from_json(CONFIG).unwrap();
    let output = ExperimentRunner::new(ExperimentRunnerConfig::default())
        .run("sample", &config, 1)
        .unwrap();
    let json = serde_json::to_string(&output.timetables).unwrap();
    let free = output
        .timetables
        .iter()
        .flat_map(|t| t.weeks.values())
        .flat_map(|w| w.values())
        .flat_map(|d| d.values())
        .filter(|e| **e == TimetableEntry::free())
        .count();
    assert_eq!(json.matches(&format!("\"{FREE_MARKER}\"")).count(), free);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let cs102 = &value[1];
    assert_eq!(cs102["group_name"], "CS-102");
    assert!(cs102["even"]["Monday"]["08:00"].is_array());
    assert!(cs102["odd"]["Monday"]["09:45"].is_null());
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = ScheduleConfig::from_json(CONFIG).unwrap();
    config.teachers.push("Sidorov".to_string());
    let err = ExperimentRunner::new(ExperimentRunnerConfig::default())
        .run("broken", &config, 1)
        .unwrap_err();
    assert!(format!("{err:#}").contains("Sidorov"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_generated_configs_negotiate(seed in any::<u64>()) {
        let generated = ScheduleGenerator::new(ScheduleGeneratorConfig::easy(), seed).generate();
        let config = ScheduleConfig::from_json(&generated.to_json().unwrap()).unwrap();
        prop_assert_eq!(&config, &generated);

        let output = ExperimentRunner::new(ExperimentRunnerConfig::default())
            .run("easy", &config, seed)
            .unwrap();
        let stats = output.report.stats;
        prop_assert_eq!(stats.placed + stats.not_placed, stats.owned);

        let decoded: usize = output.timetables.iter().map(|t| t.meetings().count()).sum();
        prop_assert_eq!(decoded, stats.placed);
    }
}
