use tracing::{debug, warn};

use crate::error::SchedulingError;
use crate::models::{Appointment, BookingRequest};

/// Pre-submission guard against double booking, run over the caller's snapshot.
///
/// Blocks when the patient already has a non-cancelled appointment with the same
/// provider on the same date, or (for patient and doctor bookings) any appointment at
/// the exact same start time. Advisory only: a concurrent booking elsewhere is not seen.
pub fn detect_conflicts(request: &BookingRequest, appointments: &[Appointment]) -> Result<(), SchedulingError> {
    if let Some(existing) = find_same_day_duplicate(request, appointments) {
        warn!(
            "Patient {} already booked with provider {} on {} (appointment {})",
            request.patient_id, request.provider_id, request.date, existing.id
        );
        return Err(SchedulingError::DuplicateAppointment {
            patient: request
                .patient_name
                .clone()
                .unwrap_or_else(|| existing.patient_label()),
            date: request.date,
            existing_appointment_id: existing.id,
        });
    }

    if request.initiated_by.checks_time_collisions() {
        if let Some(existing) = find_time_slot_collision(request, appointments) {
            warn!(
                "Patient {} already booked at {} {} with provider {} (appointment {})",
                request.patient_id, request.date, request.start_slot, existing.provider_id, existing.id
            );
            return Err(SchedulingError::TimeSlotConflict {
                provider: existing.provider_label(),
                date: existing.date(),
                time: existing.start_slot(),
                duration_minutes: existing.duration_minutes(),
                existing_appointment_id: existing.id,
            });
        }
    }

    debug!(
        "No conflicts for patient {} with provider {} at {} {}",
        request.patient_id, request.provider_id, request.date, request.start_slot
    );
    Ok(())
}

pub fn find_same_day_duplicate<'a>(
    request: &BookingRequest,
    appointments: &'a [Appointment],
) -> Option<&'a Appointment> {
    patient_bookings(request, appointments)
        .find(|existing| existing.provider_id == request.provider_id && existing.date() == request.date)
}

pub fn find_time_slot_collision<'a>(
    request: &BookingRequest,
    appointments: &'a [Appointment],
) -> Option<&'a Appointment> {
    let start = request.start();
    patient_bookings(request, appointments).find(|existing| existing.start() == start)
}

fn patient_bookings<'a>(
    request: &BookingRequest,
    appointments: &'a [Appointment],
) -> impl Iterator<Item = &'a Appointment> + 'a {
    let patient_id = request.patient_id;
    let excluded = request.exclude_appointment_id;
    appointments.iter().filter(move |existing| {
        existing.patient_id == patient_id
            && !existing.is_cancelled()
            && Some(existing.id) != excluded
    })
}
