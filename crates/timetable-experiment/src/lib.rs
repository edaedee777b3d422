//! Timetable Experiment - recurring class scheduling on top of the negotiation kernel.
//!
//! ## Domain: University Timetables
//!
//! - Groups declare classes with a type, a teacher, required tools, and a
//!   meeting count per week parity
//! - Rooms support a set of class types and carry tools
//! - Goal: place every class occurrence in a cell where the group, the teacher
//!   and a suitable room are all free
//!
//! This crate supplies the parts around the kernel: synthetic configuration
//! generation, timed runs with JSON reports, seed sweeps, and decoding final
//! grids back into named timetables.

pub mod decoder;
pub mod experiment;
pub mod generator;
pub mod results;

pub use decoder::{GroupTimetable, TimetableDecoder, TimetableEntry};
pub use experiment::{ExperimentRunner, ExperimentRunnerConfig, RunOutput};
pub use generator::{ScheduleGenerator, ScheduleGeneratorConfig};
pub use results::{RunReport, SweepResults};
