//! Queue timing for the coordination board: break calendar, projected start
//! times per queued team, the global finish estimate and display slots.
//!
//! Everything here is pure and recomputed from a table snapshot on every
//! refresh; nothing is cached between calls.

pub mod calendar;
pub mod estimator;
pub mod history;
pub mod slots;

pub use calendar::{BreakCalendar, BreakInterval};
pub use estimator::{
    effective_now, Estimator, EstimatorConfig, ProjectedStart, Schedule, TableSchedule,
};
pub use history::expected_duration;
pub use slots::{TimeSlot, TimeSlots};
