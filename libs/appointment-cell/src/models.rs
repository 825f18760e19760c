// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use patient_cell::models::Patient;
use shared_models::null_as_default;

pub const APPOINTMENTS_COLLECTION: &str = "appointments";

pub const MIN_DURATION_MINUTES: u32 = 15;
pub const MAX_DURATION_MINUTES: u32 = 240;
pub const DURATION_STEP_MINUTES: u32 = 15;
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Days after today still counted as "upcoming" (inclusive).
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// One scheduled patient visit, as stored in the `appointments` collection.
///
/// Patient name, email and phone are copied from the patient record at
/// booking time and are not kept in sync afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patient_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patient_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patient_email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patient_phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub appointment_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub appointment_time: String,
    #[serde(default = "default_duration", deserialize_with = "duration_or_default")]
    pub duration: u32,
    pub status: AppointmentStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason_for_visit: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

fn duration_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(DEFAULT_DURATION_MINUTES))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
        }
    }

    /// Human-readable label for list views.
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::NoShow => "No show",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| AppointmentError::ValidationError(format!("Unknown appointment status: {}", raw)))
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking request. Patient, date and time are required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub patient_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patient_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patient_email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patient_phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub appointment_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub appointment_time: String,
    #[serde(default = "default_duration", deserialize_with = "duration_or_default")]
    pub duration: u32,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason_for_visit: String,
}

impl NewAppointment {
    /// Booking for an existing patient, snapshotting their contact details.
    pub fn for_patient(patient: &Patient, appointment_date: &str, appointment_time: &str) -> Self {
        Self {
            patient_id: patient.id.clone().unwrap_or_default(),
            patient_name: patient.full_name(),
            patient_email: patient.email.clone(),
            patient_phone: patient.phone.clone(),
            appointment_date: appointment_date.to_string(),
            appointment_time: appointment_time.to_string(),
            duration: DEFAULT_DURATION_MINUTES,
            status: AppointmentStatus::Scheduled,
            notes: String::new(),
            reason_for_visit: String::new(),
        }
    }

    pub fn validate(&self) -> Result<(), AppointmentError> {
        require("Patient", &self.patient_id)?;
        require("Appointment date", &self.appointment_date)?;
        require("Appointment time", &self.appointment_time)?;
        validate_date(&self.appointment_date)?;
        validate_time(&self.appointment_time)?;
        validate_duration(self.duration)
    }

    pub fn into_appointment(self, now: DateTime<Utc>) -> Appointment {
        Appointment {
            id: None,
            patient_id: self.patient_id,
            patient_name: self.patient_name,
            patient_email: self.patient_email,
            patient_phone: self.patient_phone,
            appointment_date: self.appointment_date,
            appointment_time: self.appointment_time,
            duration: self.duration,
            status: self.status,
            notes: self.notes,
            reason_for_visit: self.reason_for_visit,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Partial update: only the fields that are `Some` are written.
///
/// There is no field for the identifier or `createdAt`; neither can be
/// changed by an update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_for_visit: Option<String>,
}

impl AppointmentPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Required fields may be left out of a patch but never blanked by one.
    pub fn validate(&self) -> Result<(), AppointmentError> {
        if let Some(patient_id) = &self.patient_id {
            require("Patient", patient_id)?;
        }
        if let Some(date) = &self.appointment_date {
            require("Appointment date", date)?;
            validate_date(date)?;
        }
        if let Some(time) = &self.appointment_time {
            require("Appointment time", time)?;
            validate_time(time)?;
        }
        if let Some(duration) = self.duration {
            validate_duration(duration)?;
        }
        Ok(())
    }

    /// Document fields to merge, always including a fresh `updatedAt`.
    pub fn into_fields(self, now: DateTime<Utc>) -> Result<Map<String, Value>, AppointmentError> {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Map::new(),
            Err(e) => return Err(AppointmentError::ValidationError(e.to_string())),
        };

        let updated_at = serde_json::to_value(now)
            .map_err(|e| AppointmentError::ValidationError(e.to_string()))?;
        fields.insert("updatedAt".to_string(), updated_at);
        Ok(fields)
    }
}

fn require(label: &str, value: &str) -> Result<(), AppointmentError> {
    if value.trim().is_empty() {
        return Err(AppointmentError::ValidationError(format!("{} is required", label)));
    }
    Ok(())
}

// Stored dates and times are compared as strings, so the width must be fixed.
fn validate_date(date: &str) -> Result<(), AppointmentError> {
    if date.len() != 10 || NaiveDate::parse_from_str(date, DATE_FORMAT).is_err() {
        return Err(AppointmentError::ValidationError(format!(
            "Appointment date must be YYYY-MM-DD, got '{}'", date
        )));
    }
    Ok(())
}

fn validate_time(time: &str) -> Result<(), AppointmentError> {
    if time.len() != 5 || NaiveTime::parse_from_str(time, TIME_FORMAT).is_err() {
        return Err(AppointmentError::ValidationError(format!(
            "Appointment time must be HH:MM, got '{}'", time
        )));
    }
    Ok(())
}

fn validate_duration(duration: u32) -> Result<(), AppointmentError> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration)
        || duration % DURATION_STEP_MINUTES != 0
    {
        return Err(AppointmentError::ValidationError(format!(
            "Duration must be between {} and {} minutes in steps of {}, got {}",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES, DURATION_STEP_MINUTES, duration
        )));
    }
    Ok(())
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error, PartialEq)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn booking() -> NewAppointment {
        NewAppointment {
            patient_id: "p1".to_string(),
            patient_name: "Sarah Johnson".to_string(),
            patient_email: String::new(),
            patient_phone: String::new(),
            appointment_date: "2024-02-01".to_string(),
            appointment_time: "09:00".to_string(),
            duration: 30,
            status: AppointmentStatus::Scheduled,
            notes: String::new(),
            reason_for_visit: "Annual eye exam".to_string(),
        }
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(AppointmentStatus::NoShow).unwrap(), json!("no-show"));
        assert_eq!("no-show".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::NoShow);
        assert!("no_show".parse::<AppointmentStatus>().is_err());
        assert_eq!(AppointmentStatus::NoShow.label(), "No show");
    }

    #[test]
    fn test_booking_requires_patient_date_and_time() {
        assert!(booking().validate().is_ok());

        for blank in [
            NewAppointment { patient_id: String::new(), ..booking() },
            NewAppointment { appointment_date: " ".to_string(), ..booking() },
            NewAppointment { appointment_time: String::new(), ..booking() },
        ] {
            assert!(matches!(blank.validate(), Err(AppointmentError::ValidationError(_))));
        }
    }

    #[test]
    fn test_booking_rejects_unsortable_dates_and_times() {
        assert!(NewAppointment { appointment_date: "2024-2-1".to_string(), ..booking() }.validate().is_err());
        assert!(NewAppointment { appointment_date: "01/02/2024".to_string(), ..booking() }.validate().is_err());
        assert!(NewAppointment { appointment_time: "9:00".to_string(), ..booking() }.validate().is_err());
        assert!(NewAppointment { appointment_time: "25:00".to_string(), ..booking() }.validate().is_err());
    }

    #[test]
    fn test_duration_bounds_and_step() {
        for ok in [15, 30, 240] {
            assert!(NewAppointment { duration: ok, ..booking() }.validate().is_ok());
        }
        for bad in [0, 10, 20, 255] {
            assert!(NewAppointment { duration: bad, ..booking() }.validate().is_err());
        }
    }

    #[test]
    fn test_booking_defaults_from_json() {
        let parsed: NewAppointment = serde_json::from_value(json!({
            "patientId": "p1",
            "appointmentDate": "2024-02-01",
            "appointmentTime": "09:00"
        }))
        .unwrap();

        assert_eq!(parsed.duration, DEFAULT_DURATION_MINUTES);
        assert_eq!(parsed.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_for_patient_snapshots_contact_details() {
        let patient = Patient {
            id: Some("p9".to_string()),
            first_name: "Emily".to_string(),
            last_name: "Rodriguez".to_string(),
            email: "emily.r@email.com".to_string(),
            phone: "(555) 345-6789".to_string(),
            ..Patient::default()
        };

        let booking = NewAppointment::for_patient(&patient, "2024-02-15", "14:30");

        assert_eq!(booking.patient_id, "p9");
        assert_eq!(booking.patient_name, "Emily Rodriguez");
        assert_eq!(booking.patient_phone, "(555) 345-6789");
        assert!(booking.validate().is_ok());
    }

    #[test]
    fn test_patch_cannot_blank_required_fields() {
        let blank_date = AppointmentPatch {
            appointment_date: Some(String::new()),
            ..AppointmentPatch::default()
        };
        assert!(blank_date.validate().is_err());

        let notes_only = AppointmentPatch {
            notes: Some(String::new()),
            ..AppointmentPatch::default()
        };
        assert!(notes_only.validate().is_ok());
    }

    #[test]
    fn test_patch_fields_only_include_set_values() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        let fields = AppointmentPatch::status(AppointmentStatus::Completed)
            .into_fields(now)
            .unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields["status"], json!("completed"));
        assert_eq!(fields["updatedAt"], serde_json::to_value(now).unwrap());
    }

    #[test]
    fn test_appointment_round_trips_document_shape() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        let document = serde_json::to_value(booking().into_appointment(now)).unwrap();

        assert!(document.get("id").is_none());
        assert_eq!(document["patientId"], json!("p1"));
        assert_eq!(document["reasonForVisit"], json!("Annual eye exam"));
        assert_eq!(document["createdAt"], document["updatedAt"]);
    }

    #[test]
    fn test_null_columns_read_as_defaults() {
        let appointment: Appointment = serde_json::from_value(json!({
            "id": "a1",
            "patientId": "p1",
            "patientName": "Sarah Johnson",
            "patientEmail": null,
            "patientPhone": null,
            "appointmentDate": "2024-02-01",
            "appointmentTime": "09:00",
            "duration": null,
            "status": "scheduled",
            "notes": null,
            "reasonForVisit": null,
            "createdAt": null,
            "updatedAt": null
        }))
        .unwrap();

        assert_eq!(appointment.notes, "");
        assert_eq!(appointment.patient_email, "");
        assert_eq!(appointment.reason_for_visit, "");
        assert_eq!(appointment.duration, DEFAULT_DURATION_MINUTES);
        assert!(appointment.created_at.is_none());
    }
}
