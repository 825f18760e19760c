use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_database::DocumentStore;

use crate::clock::FixedClock;
use crate::state::AppState;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            server_port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    pub fn with_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    /// Router state over the given store with a clock frozen at `now`.
    pub fn to_state(&self, store: Arc<dyn DocumentStore>, now: DateTime<Utc>) -> (AppState, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(now));
        let state = AppState::new(self.to_app_config(), store, clock.clone());
        (state, clock)
    }
}

/// Midday UTC on the given date; keeps tests away from day boundaries.
pub fn test_instant(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn appointment_response(id: &str, patient_id: &str, date: &str, time: &str, status: &str) -> Value {
        json!({
            "id": id,
            "patientId": patient_id,
            "patientName": "Sarah Johnson",
            "patientEmail": "sarah.johnson@email.com",
            "patientPhone": "(555) 123-4567",
            "appointmentDate": date,
            "appointmentTime": time,
            "duration": 30,
            "status": status,
            "notes": "",
            "reasonForVisit": "Annual eye exam",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    pub fn patient_response(id: &str, first_name: &str, last_name: &str) -> Value {
        json!({
            "id": id,
            "firstName": first_name,
            "lastName": last_name,
            "email": format!("{}@example.com", first_name.to_lowercase()),
            "phone": "(555) 000-0000",
            "sex": "female",
            "age": "34",
            "createdAt": "2024-01-15T09:30:00Z",
            "lensType": "Single Vision",
            "frameType": "Full Rim"
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
