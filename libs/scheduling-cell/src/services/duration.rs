use tracing::debug;

use crate::models::{DayAvailability, DurationFit, Slot, SLOT_MINUTES};

pub fn slots_needed(duration_minutes: u32) -> u32 {
    duration_minutes.div_ceil(SLOT_MINUTES)
}

/// Check that `duration_minutes` starting at `start` fits in consecutive free slots.
///
/// Every 15-minute step must be a generated slot (inside the shift, not past) and free.
/// On the first failing step the fit reports the free minutes before it.
pub fn check_duration_fit(day: &DayAvailability, start: Slot, duration_minutes: u32) -> DurationFit {
    for step in 0..slots_needed(duration_minutes) {
        let offset = step * SLOT_MINUTES;
        let free = start
            .offset(offset)
            .map(|slot| day.is_available(&slot))
            .unwrap_or(false);

        if !free {
            debug!(
                "{} minutes from {} on {} does not fit: blocked after {} minutes",
                duration_minutes, start, day.date, offset
            );
            return DurationFit::short(start, duration_minutes, offset);
        }
    }

    DurationFit::fits(start, duration_minutes)
}
