use serde::{Deserialize, Serialize};

/// A scheduled pause, `[start, end]` in epoch seconds. Encoded as a
/// two-element array, the way break times are listed in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i64, i64)", into = "(i64, i64)")]
pub struct BreakInterval {
    pub start: i64,
    pub end: i64,
}

impl BreakInterval {
    pub fn new(start: i64, end: i64) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Whether a team starting at `instant` would run into this break, given
    /// that a team needs `grace` seconds of lead before it.
    pub fn blocks(&self, instant: i64, grace: i64) -> bool {
        self.start - grace <= instant && instant <= self.end
    }

    /// Part of the break still ahead of `now`.
    pub fn remaining_after(&self, now: i64) -> i64 {
        self.end.max(now) - self.start.max(now)
    }
}

impl From<(i64, i64)> for BreakInterval {
    fn from((start, end): (i64, i64)) -> Self {
        Self::new(start, end)
    }
}

impl From<BreakInterval> for (i64, i64) {
    fn from(value: BreakInterval) -> Self {
        (value.start, value.end)
    }
}

/// Fixed, start-ordered set of breaks. Never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakCalendar {
    intervals: Vec<BreakInterval>,
}

impl BreakCalendar {
    pub fn new(intervals: impl IntoIterator<Item = BreakInterval>) -> Self {
        let mut intervals: Vec<_> = intervals.into_iter().collect();
        intervals.sort_by_key(|interval| (interval.start, interval.end));
        Self { intervals }
    }

    pub fn intervals(&self) -> &[BreakInterval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Moves `instant` to the end of every break it would collide with.
    /// Breaks are visited once in start order, so back-to-back breaks chain.
    pub fn push_past(&self, instant: i64, grace: i64) -> i64 {
        self.intervals.iter().fold(instant, |curr, interval| {
            if interval.blocks(curr, grace) {
                interval.end
            } else {
                curr
            }
        })
    }

    /// Total break time that has not elapsed yet at `now`.
    pub fn remaining_overlap(&self, now: i64) -> i64 {
        self.intervals
            .iter()
            .map(|interval| interval.remaining_after(now))
            .sum()
    }
}
