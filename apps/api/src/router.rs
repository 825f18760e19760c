use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use patient_cell::router::create_patient_router;
use reporting_cell::router::report_routes;
use shared_utils::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/patients", create_patient_router(state.clone()))
        .nest("/reports", report_routes(state))
}
