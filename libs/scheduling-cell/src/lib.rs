// =====================================================================================
// SCHEDULING CELL - SLOT AVAILABILITY & BOOKING CONFLICT ENGINE
// =====================================================================================
//
// Shift resolution, 15-minute slot generation, occupancy, duration fit and
// pre-submission conflict checks for the booking calendar. The engine functions in
// `services` are pure; `SchedulingService` feeds them from Supabase.
//
// =====================================================================================

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::{SchedulingApiError, SchedulingError, SourceError};
pub use models::*;
pub use services::*;
pub use router::scheduling_routes;
