use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Service;
use crate::state::AppState;

pub async fn health() -> &'static str {
    "ok"
}

// GET /api/services
pub async fn list_services(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Service>>, AppError> {
    let db = state.conn();
    Ok(Json(queries::list_services(&db)?))
}

// GET /api/blocked-dates
pub async fn list_blocked_dates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    let db = state.conn();
    let dates = queries::blocked_date_set(&db)?
        .into_iter()
        .map(|d| d.format(queries::DATE_FORMAT).to_string())
        .collect();
    Ok(Json(dates))
}
