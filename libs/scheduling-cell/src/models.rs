// libs/scheduling-cell/src/models.rs
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::SchedulingError;

/// Granularity of the booking grid.
pub const SLOT_MINUTES: u32 = 15;

/// Duration assumed for appointments stored without one.
pub const DEFAULT_APPOINTMENT_MINUTES: u32 = 30;

const MINUTES_PER_DAY: u32 = 24 * 60;

// ==============================================================================
// SLOTS
// ==============================================================================

/// A wall-clock start time on the booking grid, labelled in 12-hour form ("9:00 AM").
///
/// Ordering is numeric on the 24-hour time, so `9:00 AM < 10:00 AM < 1:00 PM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(NaiveTime);

impl Slot {
    pub fn from_time(time: NaiveTime) -> Self {
        Self(time.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(time))
    }

    pub fn from_minutes(minutes_since_midnight: u32) -> Option<Self> {
        if minutes_since_midnight >= MINUTES_PER_DAY {
            return None;
        }
        NaiveTime::from_hms_opt(minutes_since_midnight / 60, minutes_since_midnight % 60, 0)
            .map(Self)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    /// The slot `minutes` later on the same day, or `None` past midnight.
    pub fn offset(&self, minutes: u32) -> Option<Self> {
        Self::from_minutes(self.minutes_since_midnight() + minutes)
    }

    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%-I:%M %p"))
    }
}

impl FromStr for Slot {
    type Err = SchedulingError;

    /// Accepts the 12-hour label ("1:15 PM") and, for API callers, 24-hour "13:15".
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let invalid = || SchedulingError::InvalidSlot(raw.to_string());

        if let Some((clock, meridiem)) = trimmed.split_once(' ') {
            let (hour, minute) = clock.split_once(':').ok_or_else(invalid)?;
            let hour: u32 = hour.parse().map_err(|_| invalid())?;
            let minute: u32 = minute.parse().map_err(|_| invalid())?;
            if !(1..=12).contains(&hour) || minute > 59 {
                return Err(invalid());
            }
            let hour = match meridiem.trim() {
                m if m.eq_ignore_ascii_case("AM") => hour % 12,
                m if m.eq_ignore_ascii_case("PM") => hour % 12 + 12,
                _ => return Err(invalid()),
            };
            return Slot::from_minutes(hour * 60 + minute).ok_or_else(invalid);
        }

        wall_clock::parse_time(trimmed)
            .map(Slot::from_time)
            .ok_or_else(invalid)
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// SHIFTS
// ==============================================================================

/// Recurring weekly working hours for a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefaultShift {
    #[serde(rename = "userId", alias = "user_id", alias = "providerId", alias = "provider_id")]
    pub provider_id: Uuid,
    #[serde(rename = "startTime", alias = "start_time", with = "wall_clock::time")]
    pub start_time: NaiveTime,
    #[serde(rename = "endTime", alias = "end_time", with = "wall_clock::time")]
    pub end_time: NaiveTime,
    #[serde(rename = "workingDays", alias = "working_days", default)]
    pub working_days: Vec<String>,
}

impl DefaultShift {
    /// Weekday names match case-insensitively, full ("Monday") or short ("Mon").
    pub fn works_on(&self, weekday: Weekday) -> bool {
        self.working_days
            .iter()
            .any(|day| day.trim().parse::<Weekday>().map(|d| d == weekday).unwrap_or(false))
    }
}

/// An explicit working-hours override for one provider on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomShift {
    #[serde(rename = "staffId", alias = "staff_id", alias = "providerId", alias = "provider_id")]
    pub provider_id: Uuid,
    #[serde(with = "wall_clock::date")]
    pub date: NaiveDate,
    #[serde(rename = "startTime", alias = "start_time", with = "wall_clock::time")]
    pub start_time: NaiveTime,
    #[serde(rename = "endTime", alias = "end_time", with = "wall_clock::time")]
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShiftSource {
    Custom,
    Default,
}

/// Effective working hours for a provider on a given day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkingInterval {
    #[serde(with = "wall_clock::time")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock::time")]
    pub end_time: NaiveTime,
    pub source: ShiftSource,
}

impl WorkingInterval {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime, source: ShiftSource) -> Self {
        Self { start_time, end_time, source }
    }

    pub fn is_valid(&self) -> bool {
        self.start_time < self.end_time
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

/// Any status other than cancelled holds its time, including ones this engine does not know.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Pending,
    Confirmed,
    #[serde(alias = "in-progress")]
    InProgress,
    Completed,
    #[serde(alias = "canceled")]
    Cancelled,
    #[serde(alias = "no-show", alias = "noshow")]
    NoShow,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
            AppointmentStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// An existing booking as delivered by the data layer. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    #[serde(alias = "patient_id")]
    pub patient_id: Uuid,
    #[serde(alias = "provider_id", alias = "doctorId", alias = "doctor_id")]
    pub provider_id: Uuid,
    /// Wall-clock literal; any zone suffix in the source text is ignored.
    #[serde(alias = "scheduled_at", with = "wall_clock::date_time")]
    pub scheduled_at: NaiveDateTime,
    #[serde(default, alias = "duration_minutes")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default, alias = "patient_name", skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, alias = "provider_name", skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
}

impl Appointment {
    pub fn duration_minutes(&self) -> u32 {
        match self.duration {
            Some(minutes) if minutes > 0 => minutes,
            _ => DEFAULT_APPOINTMENT_MINUTES,
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.scheduled_at
    }

    pub fn end(&self) -> NaiveDateTime {
        self.scheduled_at + Duration::minutes(self.duration_minutes() as i64)
    }

    pub fn date(&self) -> NaiveDate {
        self.scheduled_at.date()
    }

    pub fn start_slot(&self) -> Slot {
        Slot::from_time(self.scheduled_at.time())
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == AppointmentStatus::Cancelled
    }

    /// True when this appointment holds `provider_id`'s time at `at`.
    pub fn occupies(&self, provider_id: Uuid, at: NaiveDateTime) -> bool {
        !self.is_cancelled()
            && self.provider_id == provider_id
            && self.start() <= at
            && at < self.end()
    }

    pub fn provider_label(&self) -> String {
        self.provider_name.clone().unwrap_or_else(|| self.provider_id.to_string())
    }

    pub fn patient_label(&self) -> String {
        self.patient_name.clone().unwrap_or_else(|| self.patient_id.to_string())
    }
}

// ==============================================================================
// BOOKING REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    #[default]
    #[serde(alias = "general", alias = "general_consultation")]
    Consultation,
    #[serde(alias = "followup", alias = "follow-up")]
    FollowUp,
    #[serde(alias = "check_up", alias = "checkup")]
    Checkup,
    Procedure,
    #[serde(alias = "virtual", alias = "telemedicine")]
    Telehealth,
    #[serde(alias = "urgent")]
    Emergency,
    #[serde(other)]
    Other,
}

/// Who is creating the booking. Exact-time collision checks apply to patients and doctors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingInitiator {
    #[default]
    Patient,
    Doctor,
    #[serde(alias = "admin", alias = "receptionist")]
    Staff,
}

impl BookingInitiator {
    pub fn checks_time_collisions(&self) -> bool {
        matches!(self, BookingInitiator::Patient | BookingInitiator::Doctor)
    }
}

fn default_duration() -> u32 {
    DEFAULT_APPOINTMENT_MINUTES
}

/// A pending booking built from the user's slot selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(alias = "patient_id")]
    pub patient_id: Uuid,
    #[serde(alias = "provider_id", alias = "doctorId", alias = "doctor_id")]
    pub provider_id: Uuid,
    #[serde(with = "wall_clock::date")]
    pub date: NaiveDate,
    #[serde(alias = "start_slot", alias = "time")]
    pub start_slot: Slot,
    #[serde(default = "default_duration", alias = "duration_minutes")]
    pub duration: u32,
    #[serde(default, alias = "appointment_type")]
    pub appointment_type: AppointmentType,
    #[serde(default, alias = "initiated_by")]
    pub initiated_by: BookingInitiator,
    #[serde(default, alias = "patient_name", skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, alias = "provider_name", skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    /// Set when editing an existing appointment so it does not conflict with itself.
    #[serde(default, alias = "exclude_appointment_id", skip_serializing_if = "Option::is_none")]
    pub exclude_appointment_id: Option<Uuid>,
}

impl BookingRequest {
    pub fn start(&self) -> NaiveDateTime {
        self.start_slot.on(self.date)
    }

    pub fn patient_label(&self) -> String {
        self.patient_name.clone().unwrap_or_else(|| self.patient_id.to_string())
    }
}

// ==============================================================================
// DERIVED AVAILABILITY
// ==============================================================================

/// Free/occupied state per generated slot; `true` means bookable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AvailabilityMap(BTreeMap<Slot, bool>);

impl AvailabilityMap {
    pub fn insert(&mut self, slot: Slot, available: bool) {
        self.0.insert(slot, available);
    }

    /// `None` for slots that were never generated.
    pub fn get(&self, slot: &Slot) -> Option<bool> {
        self.0.get(slot).copied()
    }

    pub fn is_available(&self, slot: &Slot) -> bool {
        self.get(slot).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Slot, &bool)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Slot, bool)> for AvailabilityMap {
    fn from_iter<I: IntoIterator<Item = (Slot, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub const NO_SLOTS_MESSAGE: &str = "No available time slots for this date";

/// Everything the calendar needs to render one provider's day.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub intervals: Vec<WorkingInterval>,
    pub slots: Vec<Slot>,
    pub availability: AvailabilityMap,
}

impl DayAvailability {
    pub fn is_available(&self, slot: &Slot) -> bool {
        self.availability.is_available(slot)
    }

    pub fn free_slots(&self) -> Vec<Slot> {
        self.slots.iter().copied().filter(|slot| self.is_available(slot)).collect()
    }

    pub fn has_no_slots(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn message(&self) -> Option<&'static str> {
        self.has_no_slots().then_some(NO_SLOTS_MESSAGE)
    }
}

/// Outcome of checking a requested duration against a start slot.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DurationFit {
    pub start_slot: Slot,
    pub available: bool,
    pub requested_minutes: u32,
    pub available_minutes: u32,
}

impl DurationFit {
    pub fn fits(start_slot: Slot, requested_minutes: u32) -> Self {
        Self { start_slot, available: true, requested_minutes, available_minutes: requested_minutes }
    }

    pub fn short(start_slot: Slot, requested_minutes: u32, available_minutes: u32) -> Self {
        Self { start_slot, available: false, requested_minutes, available_minutes }
    }

    pub fn into_result(self) -> Result<Self, SchedulingError> {
        if self.available {
            Ok(self)
        } else {
            Err(SchedulingError::InsufficientTime {
                requested_minutes: self.requested_minutes,
                available_minutes: self.available_minutes,
            })
        }
    }
}

// ==============================================================================
// WALL-CLOCK (DE)SERIALIZATION
// ==============================================================================

/// Dates and times are read as literal wall-clock text. `scheduledAt` is sliced into
/// `YYYY-MM-DD` and `HH:MM`; trailing seconds or zone offsets are discarded unconverted.
pub mod wall_clock {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    pub fn parse_date(raw: &str) -> Option<NaiveDate> {
        let day = raw.trim().get(..10)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    pub fn parse_time(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
            .or_else(|| raw.get(..5).and_then(|hm| NaiveTime::parse_from_str(hm, "%H:%M").ok()))
    }

    pub fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        let date = parse_date(raw)?;
        match raw.as_bytes().get(10) {
            Some(b'T') | Some(b' ') => {}
            _ => return None,
        }
        let time = NaiveTime::parse_from_str(raw.get(11..16)?, "%H:%M").ok()?;
        Some(date.and_time(time))
    }

    pub mod date {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(&date.format("%Y-%m-%d"))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
            let raw = String::deserialize(deserializer)?;
            super::parse_date(&raw)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
        }
    }

    pub mod time {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(&time.format("%H:%M"))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
            let raw = String::deserialize(deserializer)?;
            super::parse_time(&raw)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid time: {}", raw)))
        }
    }

    pub mod date_time {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(at: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(&at.format("%Y-%m-%dT%H:%M:%S"))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
            let raw = String::deserialize(deserializer)?;
            super::parse_date_time(&raw)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
        }
    }
}
