use axum::{routing::get, Router};

use shared_utils::AppState;

use crate::handlers::*;

pub fn create_patient_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_patients))
        .route("/{id}", get(get_patient))
        .with_state(state)
}
