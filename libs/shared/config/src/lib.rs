use std::env;

use chrono::{Duration, Local, NaiveDateTime, Utc};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub port: u16,
    /// Offset of the clinic's wall clock from UTC. `None` means the server's local time.
    pub clinic_utc_offset_minutes: Option<i32>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            port: match env::var("PORT") {
                Ok(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!("PORT is not a valid port number ({}), using 3000", raw);
                    3000
                }),
                Err(_) => 3000,
            },
            clinic_utc_offset_minutes: match env::var("CLINIC_UTC_OFFSET_MINUTES") {
                Ok(raw) => match raw.trim().parse() {
                    Ok(minutes) => Some(minutes),
                    Err(_) => {
                        warn!("CLINIC_UTC_OFFSET_MINUTES is not an integer ({}), using server local time", raw);
                        None
                    }
                },
                Err(_) => None,
            },
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    /// Current wall-clock time at the clinic, without any zone attached.
    pub fn clinic_now(&self) -> NaiveDateTime {
        match self.clinic_utc_offset_minutes {
            Some(offset) => Utc::now().naive_utc() + Duration::minutes(offset as i64),
            None => Local::now().naive_local(),
        }
    }
}
