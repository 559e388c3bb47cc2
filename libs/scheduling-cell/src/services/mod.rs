pub mod shift;
pub mod slots;
pub mod availability;
pub mod duration;
pub mod conflict;
pub mod source;
pub mod scheduling;

pub use shift::resolve_shift;
pub use slots::generate_slots;
pub use availability::{day_availability, evaluate_availability, is_slot_booked};
pub use duration::{check_duration_fit, slots_needed};
pub use conflict::{detect_conflicts, find_same_day_duplicate, find_time_slot_collision};
pub use source::{AppointmentFilter, ScheduleSource, SupabaseScheduleSource};
pub use scheduling::SchedulingService;
