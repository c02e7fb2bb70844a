use shared::domain::{Table, TableName, TableStatus, TeamId};

use crate::{calendar::BreakCalendar, slots::TimeSlots};

pub const DEFAULT_GRACE_SECS: i64 = 5 * 60;
pub const DEFAULT_TAIL_BUFFER_SECS: i64 = 20 * 60;
pub const DEFAULT_SLOT_INTERVAL_SECS: i64 = 20 * 60;
pub const DEFAULT_SLOT_LEAD_SECS: i64 = 2 * 60;
pub const DEFAULT_MIN_SLOTS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimatorConfig {
    /// Delay between a team being called and actually sitting down.
    pub grace: i64,
    /// Wrap-up time added after the last projected correction.
    pub tail_buffer: i64,
    /// Width of a display slot.
    pub slot_interval: i64,
    /// The first slot starts at least this far after `now`.
    pub slot_lead: i64,
    /// Slots always cover at least `min_slots * slot_interval` past `now`.
    pub min_slots: i64,
    /// Offset applied to slot labels, strictly within one day.
    pub utc_offset_secs: i32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            grace: DEFAULT_GRACE_SECS,
            tail_buffer: DEFAULT_TAIL_BUFFER_SECS,
            slot_interval: DEFAULT_SLOT_INTERVAL_SECS,
            slot_lead: DEFAULT_SLOT_LEAD_SECS,
            min_slots: DEFAULT_MIN_SLOTS,
            utc_offset_secs: 0,
        }
    }
}

/// The board clock never runs before the competition starts.
pub fn effective_now(wall_clock: i64, start_time: Option<i64>) -> i64 {
    start_time.map_or(wall_clock, |start| wall_clock.max(start))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedStart {
    pub team: TeamId,
    pub position: usize,
    pub start: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchedule {
    pub table: TableName,
    /// When the table can take its next team, before break adjustment.
    pub available_at: i64,
    pub starts: Vec<ProjectedStart>,
}

impl TableSchedule {
    pub fn start_of(&self, team: &TeamId) -> Option<i64> {
        self.starts
            .iter()
            .find(|projected| projected.team == *team)
            .map(|projected| projected.start)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub now: i64,
    pub tables: Vec<TableSchedule>,
    pub estimated_finish: i64,
}

impl Schedule {
    pub fn table(&self, name: &TableName) -> Option<&TableSchedule> {
        self.tables.iter().find(|schedule| schedule.table == *name)
    }

    pub fn start_of(&self, table: &TableName, team: &TeamId) -> Option<i64> {
        self.table(table)?.start_of(team)
    }
}

/// Stateless projection of queue timings over a break calendar.
#[derive(Debug, Clone, Copy)]
pub struct Estimator<'a> {
    calendar: &'a BreakCalendar,
    config: &'a EstimatorConfig,
}

impl<'a> Estimator<'a> {
    pub fn new(calendar: &'a BreakCalendar, config: &'a EstimatorConfig) -> Self {
        Self { calendar, config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        self.config
    }

    /// Instant at which `table` can start its next correction.
    pub fn next_available(&self, table: &Table, now: i64) -> i64 {
        match table.status {
            TableStatus::Calling => now,
            TableStatus::Busy => now + self.config.grace,
            TableStatus::Correcting => {
                let started = table.current_coordination_start_time.unwrap_or(now);
                (now + self.config.grace).max(started + table.expected_duration)
            }
        }
    }

    pub fn projected_starts(&self, table: &Table, now: i64) -> TableSchedule {
        let available_at = self.next_available(table, now);
        let mut curr = available_at;
        let starts = table
            .queue
            .iter()
            .enumerate()
            .map(|(position, team)| {
                curr = self.calendar.push_past(curr, self.config.grace);
                let start = curr;
                curr += table.expected_duration;
                ProjectedStart {
                    team: team.clone(),
                    position,
                    start,
                }
            })
            .collect();

        TableSchedule {
            table: table.name.clone(),
            available_at,
            starts,
        }
    }

    /// Coarse upper bound: the busiest table alone sets the horizon.
    pub fn estimated_finish(&self, tables: &[Table], now: i64) -> i64 {
        let busiest = tables
            .iter()
            .map(|table| table.queue.len() as i64 * table.expected_duration)
            .max()
            .unwrap_or(0);
        now + busiest + self.calendar.remaining_overlap(now) + self.config.tail_buffer
    }

    pub fn schedule(&self, tables: &[Table], now: i64) -> Schedule {
        Schedule {
            now,
            tables: tables
                .iter()
                .map(|table| self.projected_starts(table, now))
                .collect(),
            estimated_finish: self.estimated_finish(tables, now),
        }
    }

    /// Display slots from just after `now` through the estimated finish.
    /// Empty while the clock is still unset.
    pub fn time_slots(&self, tables: &[Table], now: i64) -> TimeSlots {
        if now <= 0 {
            return TimeSlots::empty(self.config);
        }
        TimeSlots::new(now, self.estimated_finish(tables, now), self.config)
    }
}

#[cfg(test)]
#[path = "tests/estimator_tests.rs"]
mod tests;
