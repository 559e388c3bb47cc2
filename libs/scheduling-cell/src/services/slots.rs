use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use tracing::{debug, warn};

use crate::models::{Slot, WorkingInterval, SLOT_MINUTES};

/// Expand working intervals into the ordered slot grid for `date`.
///
/// Slots run from each interval's start in 15-minute steps, strictly before its end.
/// Overlapping intervals are merged. When `date` is today (per `now`), only slots
/// strictly after the current time are kept.
pub fn generate_slots(intervals: &[WorkingInterval], date: NaiveDate, now: NaiveDateTime) -> Vec<Slot> {
    let mut unique = BTreeSet::new();
    for interval in intervals {
        unique.extend(slots_in_interval(interval));
    }

    let is_today = date == now.date();
    let cutoff = now.time();
    let slots: Vec<Slot> = unique
        .into_iter()
        .filter(|slot| !is_today || slot.time() > cutoff)
        .collect();

    debug!("Generated {} slots for {} (today: {})", slots.len(), date, is_today);
    slots
}

fn slots_in_interval(interval: &WorkingInterval) -> Vec<Slot> {
    if !interval.is_valid() {
        warn!(
            "Ignoring working interval {}-{}: end is not after start",
            interval.start_time, interval.end_time
        );
        return Vec::new();
    }

    let start = interval.start_time.hour() * 60 + interval.start_time.minute();
    let end = interval.end_time.hour() * 60 + interval.end_time.minute();

    (start..end)
        .step_by(SLOT_MINUTES as usize)
        .filter_map(Slot::from_minutes)
        .collect()
}
