use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    Appointment, AvailabilityMap, CustomShift, DayAvailability, DefaultShift, Slot,
};
use crate::services::shift::resolve_shift;
use crate::services::slots::generate_slots;

/// Whether `slot` on `date` lies inside a non-cancelled appointment of `provider_id`.
///
/// Only the slot's own start is tested against `[start, start + duration)`, so a
/// 60-minute booking at 1:00 PM occupies 1:00 through 1:45 but not 12:45.
pub fn is_slot_booked(provider_id: Uuid, date: NaiveDate, slot: Slot, appointments: &[Appointment]) -> bool {
    let at = slot.on(date);
    appointments.iter().any(|appointment| appointment.occupies(provider_id, at))
}

pub fn evaluate_availability(
    provider_id: Uuid,
    date: NaiveDate,
    slots: &[Slot],
    appointments: &[Appointment],
) -> AvailabilityMap {
    let map: AvailabilityMap = slots
        .iter()
        .map(|slot| (*slot, !is_slot_booked(provider_id, date, *slot, appointments)))
        .collect();

    debug!(
        "Provider {} on {}: {} of {} slots free",
        provider_id,
        date,
        map.iter().filter(|(_, free)| **free).count(),
        map.len()
    );
    map
}

/// Run shift resolution, slot generation and occupancy for one provider and day.
pub fn day_availability(
    provider_id: Uuid,
    date: NaiveDate,
    now: NaiveDateTime,
    custom_shifts: &[CustomShift],
    default_shifts: &[DefaultShift],
    appointments: &[Appointment],
) -> DayAvailability {
    let intervals = resolve_shift(provider_id, date, custom_shifts, default_shifts);
    let slots = generate_slots(&intervals, date, now);
    let availability = evaluate_availability(provider_id, date, &slots, appointments);

    DayAvailability {
        provider_id,
        date,
        intervals,
        slots,
        availability,
    }
}
