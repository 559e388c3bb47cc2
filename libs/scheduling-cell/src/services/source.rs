use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::SourceError;
use crate::models::{Appointment, CustomShift, DefaultShift};

/// Which appointments to load. Unset fields are not filtered on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub provider_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

impl AppointmentFilter {
    pub fn for_provider(provider_id: Uuid) -> Self {
        Self { provider_id: Some(provider_id), ..Self::default() }
    }

    pub fn for_patient(patient_id: Uuid) -> Self {
        Self { patient_id: Some(patient_id), ..Self::default() }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// PostgREST query string. A date window starts on the previous day so appointments
    /// running past midnight still reach the early slots.
    pub fn to_query(&self) -> String {
        let mut parts = Vec::new();
        if let Some(provider_id) = self.provider_id {
            parts.push(format!("provider_id=eq.{}", provider_id));
        }
        if let Some(patient_id) = self.patient_id {
            parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(date) = self.date {
            let from = date - Duration::days(1);
            let until = date + Duration::days(1);
            parts.push(format!("scheduled_at=gte.{}T00:00:00", from));
            parts.push(format!("scheduled_at=lt.{}T00:00:00", until));
        }
        parts.push("order=scheduled_at.asc".to_string());
        parts.join("&")
    }
}

/// Read-only access to shift and appointment data.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn custom_shifts(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<CustomShift>, SourceError>;

    async fn default_shifts(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<DefaultShift>, SourceError>;

    async fn appointments(&self, filter: AppointmentFilter, auth_token: &str) -> Result<Vec<Appointment>, SourceError>;
}

pub struct SupabaseScheduleSource {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseScheduleSource {
    pub const CUSTOM_SHIFTS_TABLE: &'static str = "custom_shifts";
    pub const DEFAULT_SHIFTS_TABLE: &'static str = "default_shifts";
    pub const APPOINTMENTS_TABLE: &'static str = "appointments";

    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn load<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        query: &str,
        auth_token: &str,
    ) -> Result<Vec<T>, SourceError> {
        let rows = self
            .supabase
            .select_rows(resource, query, Some(auth_token))
            .await
            .map_err(|e| SourceError::fetch(resource, e))?;

        debug!("Loaded {} {} rows", rows.len(), resource);
        Ok(parse_rows(resource, rows))
    }
}

#[async_trait]
impl ScheduleSource for SupabaseScheduleSource {
    async fn custom_shifts(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<CustomShift>, SourceError> {
        let query = format!("staff_id=eq.{}&order=date.asc", provider_id);
        self.load(Self::CUSTOM_SHIFTS_TABLE, &query, auth_token).await
    }

    async fn default_shifts(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<DefaultShift>, SourceError> {
        let query = format!("user_id=eq.{}", provider_id);
        self.load(Self::DEFAULT_SHIFTS_TABLE, &query, auth_token).await
    }

    async fn appointments(&self, filter: AppointmentFilter, auth_token: &str) -> Result<Vec<Appointment>, SourceError> {
        self.load(Self::APPOINTMENTS_TABLE, &filter.to_query(), auth_token).await
    }
}

/// Malformed rows are skipped so one bad record does not hide a whole day.
fn parse_rows<T: DeserializeOwned>(resource: &str, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping malformed {} row: {}", resource, e);
                None
            }
        })
        .collect()
}
