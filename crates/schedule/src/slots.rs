use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::estimator::EstimatorConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub timestamp: i64,
    pub seconds_from_now: i64,
    pub label: String,
}

/// Finite sequence of fixed-width display slots. Cloning restarts it.
#[derive(Debug, Clone)]
pub struct TimeSlots {
    now: i64,
    next: i64,
    finish: i64,
    floor: i64,
    interval: i64,
    offset: FixedOffset,
}

impl TimeSlots {
    /// A sequence with no slots that still labels instants at `config`'s
    /// offset.
    pub fn empty(config: &EstimatorConfig) -> Self {
        Self {
            now: 0,
            next: 0,
            finish: 0,
            floor: 0,
            interval: 0,
            offset: label_offset(config),
        }
    }

    pub(crate) fn new(now: i64, finish: i64, config: &EstimatorConfig) -> Self {
        let interval = config.slot_interval;
        if interval <= 0 {
            return Self::empty(config);
        }
        let lead = now + config.slot_lead;
        let first = (lead + interval - 1).div_euclid(interval) * interval;
        Self {
            now,
            next: first,
            finish,
            floor: now + config.min_slots * interval,
            interval,
            offset: label_offset(config),
        }
    }

    pub fn label(&self, timestamp: i64) -> String {
        DateTime::<Utc>::from_timestamp(timestamp, 0)
            .map(|instant| {
                instant
                    .with_timezone(&self.offset)
                    .format("%-H:%M")
                    .to_string()
            })
            .unwrap_or_default()
    }
}

/// Offsets of a day or more have no clock reading; those label in UTC.
fn label_offset(config: &EstimatorConfig) -> FixedOffset {
    FixedOffset::east_opt(config.utc_offset_secs).unwrap_or_else(|| Utc.fix())
}

impl Iterator for TimeSlots {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<Self::Item> {
        if self.interval <= 0 || (self.next >= self.finish && self.next > self.floor) {
            return None;
        }
        let timestamp = self.next;
        self.next += self.interval;
        Some(TimeSlot {
            timestamp,
            seconds_from_now: timestamp - self.now,
            label: self.label(timestamp),
        })
    }
}
