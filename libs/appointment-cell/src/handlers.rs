// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{AppointmentError, AppointmentPatch, NewAppointment};
use crate::services::{AppointmentListFilter, AppointmentStore};

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub patient_id: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

fn appointment_store(state: &AppState) -> AppointmentStore {
    AppointmentStore::new(state.store.clone(), state.clock.clone())
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Json(request): Json<NewAppointment>,
) -> Result<Json<Value>, AppError> {
    let id = appointment_store(&state).create(request).await?;

    Ok(Json(json!({
        "success": true,
        "id": id,
        "message": "Appointment booked successfully!"
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<Json<Value>, AppError> {
    let filter = AppointmentListFilter::new(params.search.as_deref(), params.status.as_deref())?;

    let appointments = appointment_store(&state)
        .list(params.patient_id.as_deref())
        .await?;
    let appointments = filter.apply(appointments);

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_upcoming_appointments(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let appointments = appointment_store(&state).list_upcoming().await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointments_by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointments = appointment_store(&state).list_by_date(&date).await?;

    Ok(Json(json!({
        "date": date,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = appointment_store(&state)
        .get(&appointment_id)
        .await?
        .ok_or(AppointmentError::NotFound)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
    Json(patch): Json<AppointmentPatch>,
) -> Result<Json<Value>, AppError> {
    appointment_store(&state).update(&appointment_id, patch).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment updated successfully!"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    appointment_store(&state).cancel(&appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled successfully!"
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    appointment_store(&state).delete(&appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted successfully!"
    })))
}
