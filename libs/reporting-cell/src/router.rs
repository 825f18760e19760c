use axum::{routing::get, Router};

use shared_utils::AppState;

use crate::handlers::*;

pub fn report_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_report))
        .route("/export/{format}", get(export_report))
        .with_state(state)
}
