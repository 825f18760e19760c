use axum::{
    extract::{Path, State},
    Json,
};

use appointment_cell::services::AppointmentStore;
use patient_cell::services::PatientService;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{ExportFormat, ReportError, ReportSnapshot};
use crate::services::{export_report as export, load_report};

impl From<ReportError> for AppError {
    fn from(error: ReportError) -> Self {
        match error {
            ReportError::ExportNotImplemented(_) => AppError::NotImplemented(error.to_string()),
            ReportError::UnsupportedFormat(_) => AppError::BadRequest(error.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn get_report(
    State(state): State<AppState>,
) -> Result<Json<ReportSnapshot>, AppError> {
    let patients = PatientService::new(state.store.clone());
    let appointments = AppointmentStore::new(state.store.clone(), state.clock.clone());

    let snapshot = load_report(&patients, &appointments, state.clock.as_ref()).await;

    Ok(Json(snapshot))
}

#[axum::debug_handler]
pub async fn export_report(
    Path(format): Path<String>,
) -> AppError {
    match format.parse::<ExportFormat>() {
        Ok(format) => export(format).into(),
        Err(error) => error.into(),
    }
}
