// libs/scheduling-cell/tests/service_test.rs
// SchedulingService over Supabase (wiremock) and over an in-memory source

use std::sync::Mutex;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, header, query_param};

use scheduling_cell::*;
use shared_config::AppConfig;

const TOKEN: &str = "test-user-token";

fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        port: 3000,
        clinic_utc_offset_minutes: None,
    }
}

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
}

fn long_ago() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn slot(label: &str) -> Slot {
    label.parse().unwrap()
}

async fn mount_schedule(server: &MockServer, provider_id: Uuid, appointments: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/custom_shifts"))
        .and(query_param("staff_id", format!("eq.{}", provider_id)))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/default_shifts"))
        .and(query_param("user_id", format!("eq.{}", provider_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "user_id": provider_id,
            "start_time": "09:00:00",
            "end_time": "17:00:00",
            "working_days": ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
        }])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(appointments))
        .mount(server)
        .await;
}

// ==============================================================================
// SUPABASE-BACKED SERVICE
// ==============================================================================

#[tokio::test]
async fn test_day_availability_from_supabase_rows() {
    let mock_server = MockServer::start().await;
    let provider_id = Uuid::new_v4();

    mount_schedule(&mock_server, provider_id, json!([{
        "id": Uuid::new_v4(),
        "patient_id": Uuid::new_v4(),
        "provider_id": provider_id,
        "scheduled_at": "2025-06-10T13:00:00+00:00",
        "duration": 60,
        "status": "scheduled"
    }])).await;

    let service = SchedulingService::new(&test_config(&mock_server));
    let day = service.day_availability(provider_id, tuesday(), long_ago(), None, TOKEN).await;

    assert_eq!(day.slots.len(), 32);
    assert_eq!(day.intervals[0].source, ShiftSource::Default);
    assert!(!day.is_available(&slot("1:00 PM")));
    assert!(!day.is_available(&slot("1:45 PM")));
    assert!(day.is_available(&slot("12:45 PM")));
}

#[tokio::test]
async fn test_confirmed_and_unrecognized_statuses_occupy_slots() {
    let mock_server = MockServer::start().await;
    let provider_id = Uuid::new_v4();

    mount_schedule(&mock_server, provider_id, json!([
        {
            "id": Uuid::new_v4(),
            "patient_id": Uuid::new_v4(),
            "provider_id": provider_id,
            "scheduled_at": "2025-06-10T13:00:00",
            "duration": 60,
            "status": "confirmed"
        },
        {
            "id": Uuid::new_v4(),
            "patient_id": Uuid::new_v4(),
            "provider_id": provider_id,
            "scheduled_at": "2025-06-10T15:00:00",
            "duration": 30,
            "status": "awaiting_payment"
        }
    ])).await;

    let service = SchedulingService::new(&test_config(&mock_server));
    let day = service.day_availability(provider_id, tuesday(), long_ago(), None, TOKEN).await;

    assert!(!day.is_available(&slot("1:00 PM")));
    assert!(!day.is_available(&slot("1:45 PM")));
    assert!(day.is_available(&slot("2:00 PM")));
    assert!(!day.is_available(&slot("3:00 PM")));
    assert!(!day.is_available(&slot("3:15 PM")));
}

#[tokio::test]
async fn test_malformed_rows_are_skipped() {
    let mock_server = MockServer::start().await;
    let provider_id = Uuid::new_v4();

    mount_schedule(&mock_server, provider_id, json!([
        { "id": "not-a-uuid", "scheduled_at": "yesterday" },
        {
            "id": Uuid::new_v4(),
            "patientId": Uuid::new_v4(),
            "providerId": provider_id,
            "scheduledAt": "2025-06-10T09:00:00",
            "duration": 30,
            "status": "scheduled"
        }
    ])).await;

    let service = SchedulingService::new(&test_config(&mock_server));
    let day = service.day_availability(provider_id, tuesday(), long_ago(), None, TOKEN).await;

    assert!(!day.is_available(&slot("9:00 AM")));
    assert!(!day.is_available(&slot("9:15 AM")));
    assert!(day.is_available(&slot("9:30 AM")));
}

#[tokio::test]
async fn test_failed_fetch_degrades_to_no_availability() {
    let mock_server = MockServer::start().await;
    let provider_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&mock_server)
        .await;

    let service = SchedulingService::new(&test_config(&mock_server));
    let day = service.day_availability(provider_id, tuesday(), long_ago(), None, TOKEN).await;

    assert!(day.has_no_slots());
    assert_eq!(day.message(), Some(NO_SLOTS_MESSAGE));
}

#[tokio::test]
async fn test_excluded_appointment_frees_its_own_time() {
    let mock_server = MockServer::start().await;
    let provider_id = Uuid::new_v4();
    let editing = Uuid::new_v4();

    mount_schedule(&mock_server, provider_id, json!([{
        "id": editing,
        "patient_id": Uuid::new_v4(),
        "provider_id": provider_id,
        "scheduled_at": "2025-06-10T10:00:00",
        "duration": 30,
        "status": "scheduled"
    }])).await;

    let service = SchedulingService::new(&test_config(&mock_server));

    let fit = service
        .check_duration_fit(provider_id, tuesday(), slot("10:00 AM"), 30, long_ago(), None, TOKEN)
        .await
        .unwrap();
    assert!(!fit.available);

    let fit = service
        .check_duration_fit(provider_id, tuesday(), slot("10:00 AM"), 30, long_ago(), Some(editing), TOKEN)
        .await
        .unwrap();
    assert!(fit.available);
}

#[test]
fn test_appointment_filter_query() {
    let provider_id = Uuid::new_v4();
    let query = AppointmentFilter::for_provider(provider_id).on(tuesday()).to_query();

    assert_eq!(
        query,
        format!(
            "provider_id=eq.{}&scheduled_at=gte.2025-06-09T00:00:00&scheduled_at=lt.2025-06-11T00:00:00&order=scheduled_at.asc",
            provider_id
        )
    );
}

#[tokio::test]
async fn test_previous_evening_booking_is_fetched_and_occupies_early_slots() {
    let mock_server = MockServer::start().await;
    let provider_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/custom_shifts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "staff_id": provider_id,
            "date": "2025-06-10",
            "start_time": "00:00",
            "end_time": "02:00"
        }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/default_shifts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    // Only answers when the window reaches back to the previous day
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("provider_id", format!("eq.{}", provider_id)))
        .and(query_param("scheduled_at", "gte.2025-06-09T00:00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "patient_id": Uuid::new_v4(),
            "provider_id": provider_id,
            "scheduled_at": "2025-06-09T23:30:00",
            "duration": 60,
            "status": "scheduled"
        }])))
        .mount(&mock_server)
        .await;

    let service = SchedulingService::new(&test_config(&mock_server));
    let day = service.day_availability(provider_id, tuesday(), long_ago(), None, TOKEN).await;

    assert_eq!(day.slots.len(), 8);
    assert!(!day.is_available(&slot("12:00 AM")));
    assert!(!day.is_available(&slot("12:15 AM")));
    assert!(day.is_available(&slot("12:30 AM")));
}

// ==============================================================================
// IN-MEMORY SOURCE
// ==============================================================================

#[derive(Default)]
struct InMemorySource {
    custom_shifts: Vec<CustomShift>,
    default_shifts: Vec<DefaultShift>,
    appointments: Vec<Appointment>,
    fail_appointments: bool,
    filters_seen: Mutex<Vec<AppointmentFilter>>,
}

#[async_trait]
impl ScheduleSource for InMemorySource {
    async fn custom_shifts(&self, provider_id: Uuid, _auth_token: &str) -> Result<Vec<CustomShift>, SourceError> {
        Ok(self.custom_shifts.iter().filter(|s| s.provider_id == provider_id).cloned().collect())
    }

    async fn default_shifts(&self, provider_id: Uuid, _auth_token: &str) -> Result<Vec<DefaultShift>, SourceError> {
        Ok(self.default_shifts.iter().filter(|s| s.provider_id == provider_id).cloned().collect())
    }

    async fn appointments(&self, filter: AppointmentFilter, _auth_token: &str) -> Result<Vec<Appointment>, SourceError> {
        self.filters_seen.lock().unwrap().push(filter);
        if self.fail_appointments {
            return Err(SourceError::fetch("appointments", "connection reset"));
        }
        Ok(self
            .appointments
            .iter()
            .filter(|a| filter.provider_id.map_or(true, |id| a.provider_id == id))
            .filter(|a| filter.patient_id.map_or(true, |id| a.patient_id == id))
            .cloned()
            .collect())
    }
}

fn clinic(provider_id: Uuid) -> InMemorySource {
    InMemorySource {
        default_shifts: vec![DefaultShift {
            provider_id,
            start_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: chrono::NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            working_days: vec!["Tue".to_string()],
        }],
        ..InMemorySource::default()
    }
}

fn existing(patient_id: Uuid, provider_id: Uuid, at: &str, duration: u32) -> Appointment {
    serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "patientId": patient_id,
        "providerId": provider_id,
        "scheduledAt": at,
        "duration": duration,
        "status": "scheduled",
        "providerName": "Dr. Lee"
    }))
    .unwrap()
}

fn request(patient_id: Uuid, provider_id: Uuid, start: &str, duration: u32) -> BookingRequest {
    serde_json::from_value(json!({
        "patientId": patient_id,
        "providerId": provider_id,
        "date": "2025-06-10",
        "startSlot": start,
        "duration": duration,
        "appointmentType": "consultation",
        "initiatedBy": "patient"
    }))
    .unwrap()
}

#[tokio::test]
async fn test_validate_booking_passes_on_free_slot() {
    let provider_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let service = SchedulingService::with_source(clinic(provider_id));

    let fit = service
        .validate_booking(&request(patient_id, provider_id, "10:00 AM", 45), long_ago(), TOKEN)
        .await
        .unwrap();

    assert!(fit.available);
    assert_eq!(fit.available_minutes, 45);

    let filters = service.source().filters_seen.lock().unwrap().clone();
    assert!(filters.contains(&AppointmentFilter::for_provider(provider_id).on(tuesday())));
    assert!(filters.contains(&AppointmentFilter::for_patient(patient_id)));
}

#[tokio::test]
async fn test_validate_booking_checks_duration_before_conflicts() {
    let provider_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let mut source = clinic(provider_id);
    source.appointments = vec![
        existing(patient_id, provider_id, "2025-06-10T11:00:00", 30),
    ];
    let service = SchedulingService::with_source(source);

    let result = service
        .validate_booking(&request(patient_id, provider_id, "10:30 AM", 60), long_ago(), TOKEN)
        .await;

    assert_matches!(
        result,
        Err(SchedulingError::InsufficientTime { requested_minutes: 60, available_minutes: 30 })
    );
}

#[tokio::test]
async fn test_validate_booking_reports_cross_provider_collision() {
    let provider_id = Uuid::new_v4();
    let other_provider = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let mut source = clinic(provider_id);
    source.appointments = vec![existing(patient_id, other_provider, "2025-06-10T14:00:00", 30)];
    let service = SchedulingService::with_source(source);

    let result = service
        .validate_booking(&request(patient_id, provider_id, "2:00 PM", 30), long_ago(), TOKEN)
        .await;

    assert_matches!(
        result,
        Err(SchedulingError::TimeSlotConflict { ref provider, duration_minutes: 30, .. }) if provider == "Dr. Lee"
    );
}

#[tokio::test]
async fn test_validate_booking_rejects_zero_duration() {
    let provider_id = Uuid::new_v4();
    let service = SchedulingService::with_source(clinic(provider_id));

    let result = service
        .validate_booking(&request(Uuid::new_v4(), provider_id, "10:00 AM", 0), long_ago(), TOKEN)
        .await;

    assert_matches!(result, Err(SchedulingError::InvalidDuration(0)));
}

#[tokio::test]
async fn test_unavailable_patient_history_does_not_block_booking() {
    let provider_id = Uuid::new_v4();
    let mut source = clinic(provider_id);
    source.fail_appointments = true;
    let service = SchedulingService::with_source(source);

    let result = service
        .validate_booking(&request(Uuid::new_v4(), provider_id, "9:00 AM", 30), long_ago(), TOKEN)
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_resolve_shift_through_service() {
    let provider_id = Uuid::new_v4();
    let service = SchedulingService::with_source(clinic(provider_id));

    let working = service.resolve_shift(provider_id, tuesday(), TOKEN).await;
    let wednesday = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
    let off = service.resolve_shift(provider_id, wednesday, TOKEN).await;

    assert_eq!(working.len(), 1);
    assert!(off.is_empty());
}
