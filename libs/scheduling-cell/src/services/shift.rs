use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{CustomShift, DefaultShift, ShiftSource, WorkingInterval};

/// Resolve a provider's working hours for `date`.
///
/// A custom shift on that exact day takes priority. Otherwise the provider's default
/// shift applies when the weekday is one of its working days. An empty result means the
/// provider does not work that day and is not an error.
pub fn resolve_shift(
    provider_id: Uuid,
    date: NaiveDate,
    custom_shifts: &[CustomShift],
    default_shifts: &[DefaultShift],
) -> Vec<WorkingInterval> {
    let mut same_day = custom_shifts
        .iter()
        .filter(|shift| shift.provider_id == provider_id && shift.date == date);

    if let Some(custom) = same_day.next() {
        let extra = same_day.count();
        if extra > 0 {
            warn!(
                "Provider {} has {} extra custom shifts on {}, using the first",
                provider_id, extra, date
            );
        }
        debug!(
            "Custom shift {}-{} for provider {} on {}",
            custom.start_time, custom.end_time, provider_id, date
        );
        return vec![WorkingInterval::new(custom.start_time, custom.end_time, ShiftSource::Custom)];
    }

    match default_shifts.iter().find(|shift| shift.provider_id == provider_id) {
        Some(default) if default.works_on(date.weekday()) => {
            debug!(
                "Default shift {}-{} for provider {} on {} ({})",
                default.start_time, default.end_time, provider_id, date, date.weekday()
            );
            vec![WorkingInterval::new(default.start_time, default.end_time, ShiftSource::Default)]
        }
        Some(_) => {
            debug!("{} is not a working day for provider {}", date.weekday(), provider_id);
            Vec::new()
        }
        None => {
            debug!("Provider {} has no shift data for {}", provider_id, date);
            Vec::new()
        }
    }
}
