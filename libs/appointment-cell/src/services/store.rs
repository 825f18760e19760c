// libs/appointment-cell/src/services/store.rs
use std::sync::Arc;

use chrono::Duration;
use serde_json::Value;
use tracing::{debug, error, info};

use shared_database::{DocumentQuery, DocumentStore, SortDirection};
use shared_utils::Clock;

use crate::models::{
    Appointment, AppointmentError, AppointmentPatch, AppointmentStatus, NewAppointment,
    APPOINTMENTS_COLLECTION, DATE_FORMAT, UPCOMING_WINDOW_DAYS,
};

/// CRUD and query access to the `appointments` collection.
///
/// Nothing is cached: every call goes to the document store.
pub struct AppointmentStore {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl AppointmentStore {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Book a new appointment and return the identifier the store assigned.
    pub async fn create(&self, request: NewAppointment) -> Result<String, AppointmentError> {
        request.validate()?;
        debug!("Booking appointment for patient {} on {} at {}",
               request.patient_id, request.appointment_date, request.appointment_time);

        let appointment = request.into_appointment(self.clock.now());
        let document = serde_json::to_value(&appointment)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to encode appointment: {}", e)))?;

        let id = self.store
            .insert(APPOINTMENTS_COLLECTION, document)
            .await
            .map_err(|e| store_error("booking appointment", e))?;

        info!("Appointment {} booked", id);
        Ok(id)
    }

    /// All appointments, optionally for one patient, newest date first.
    pub async fn list(&self, patient_id: Option<&str>) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching appointments (patient filter: {:?})", patient_id);

        let query = match patient_id {
            Some(patient_id) => DocumentQuery::new().where_eq("patientId", patient_id),
            None => DocumentQuery::new(),
        };

        let mut appointments = self.fetch(&query, "getting appointments").await?;
        // plain string comparison; dates share the YYYY-MM-DD format
        appointments.sort_by(|a, b| b.appointment_date.cmp(&a.appointment_date));
        Ok(appointments)
    }

    /// Appointments on one exact date, earliest time first.
    pub async fn list_by_date(&self, date: &str) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching appointments on {}", date);

        let query = DocumentQuery::new().where_eq("appointmentDate", date);
        let mut appointments = self.fetch(&query, "getting appointments by date").await?;
        appointments.sort_by(|a, b| a.appointment_time.cmp(&b.appointment_time));
        Ok(appointments)
    }

    /// Scheduled appointments from today through the next seven days.
    ///
    /// Ordering is left to the store (date then time, both ascending), which
    /// on an indexed backend needs a composite index on those two fields.
    pub async fn list_upcoming(&self) -> Result<Vec<Appointment>, AppointmentError> {
        let today = self.clock.today();
        let window_end = today + Duration::days(UPCOMING_WINDOW_DAYS);
        let from = today.format(DATE_FORMAT).to_string();
        let to = window_end.format(DATE_FORMAT).to_string();
        debug!("Fetching upcoming appointments between {} and {}", from, to);

        let query = DocumentQuery::new()
            .where_gte("appointmentDate", from)
            .where_lte("appointmentDate", to)
            .where_eq("status", AppointmentStatus::Scheduled.as_str())
            .order_by("appointmentDate", SortDirection::Asc)
            .order_by("appointmentTime", SortDirection::Asc);

        self.fetch(&query, "getting upcoming appointments").await
    }

    /// `Ok(None)` when no appointment has this identifier.
    pub async fn get(&self, appointment_id: &str) -> Result<Option<Appointment>, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let document = self.store
            .get(APPOINTMENTS_COLLECTION, appointment_id)
            .await
            .map_err(|e| store_error("getting appointment", e))?;

        document.map(parse_appointment).transpose()
    }

    /// Merge the patch into the stored appointment and refresh `updatedAt`.
    pub async fn update(&self, appointment_id: &str, patch: AppointmentPatch) -> Result<(), AppointmentError> {
        patch.validate()?;
        debug!("Updating appointment: {}", appointment_id);

        let fields = patch.into_fields(self.clock.now())?;
        self.store
            .update(APPOINTMENTS_COLLECTION, appointment_id, fields)
            .await
            .map_err(|e| store_error("updating appointment", e))?;

        info!("Appointment {} updated", appointment_id);
        Ok(())
    }

    /// Mark as cancelled whatever the current status is.
    pub async fn cancel(&self, appointment_id: &str) -> Result<(), AppointmentError> {
        debug!("Cancelling appointment: {}", appointment_id);
        self.update(appointment_id, AppointmentPatch::status(AppointmentStatus::Cancelled)).await
    }

    /// Hard delete. Removing an identifier that does not exist is not an error.
    pub async fn delete(&self, appointment_id: &str) -> Result<(), AppointmentError> {
        self.store
            .delete(APPOINTMENTS_COLLECTION, appointment_id)
            .await
            .map_err(|e| store_error("deleting appointment", e))?;

        info!("Appointment {} deleted", appointment_id);
        Ok(())
    }

    async fn fetch(&self, query: &DocumentQuery, action: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let documents = self.store
            .query(APPOINTMENTS_COLLECTION, query)
            .await
            .map_err(|e| store_error(action, e))?;

        documents.into_iter().map(parse_appointment).collect()
    }
}

fn parse_appointment(document: Value) -> Result<Appointment, AppointmentError> {
    serde_json::from_value(document)
        .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
}

fn store_error(action: &str, error: anyhow::Error) -> AppointmentError {
    error!("Error {}: {}", action, error);
    AppointmentError::DatabaseError(error.to_string())
}
