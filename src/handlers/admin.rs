use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BlockedDate, BookingRequest, BookingStatus, Service, ServiceFields, SiteSettings};
use crate::state::AppState;

const DEFAULT_BOOKING_LIMIT: i64 = 50;
const RECENT_BOOKINGS: i64 = 10;

// GET /api/admin/dashboard
#[derive(Serialize)]
pub struct DashboardResponse {
    booking_count: i64,
    pending_count: i64,
    service_count: i64,
    blocked_date_count: i64,
    recent_bookings: Vec<BookingRequest>,
}

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<DashboardResponse>, AppError> {
    let db = state.conn();

    Ok(Json(DashboardResponse {
        booking_count: queries::count_bookings(&db, None)?,
        pending_count: queries::count_bookings(&db, Some(BookingStatus::Pending))?,
        service_count: queries::count_services(&db)?,
        blocked_date_count: queries::count_blocked_dates(&db)?,
        recent_bookings: queries::list_bookings(&db, None, RECENT_BOOKINGS)?,
    }))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingRequest>>, AppError> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(
            s.parse::<BookingStatus>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
        ),
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_BOOKING_LIMIT).max(1);

    let db = state.conn();
    Ok(Json(queries::list_bookings(&db, status, limit)?))
}

// POST /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<BookingRequest>, AppError> {
    let status = body
        .status
        .parse::<BookingStatus>()
        .map_err(|e| AppError::Validation(format!("{e}")))?;

    let db = state.conn();
    if !queries::update_booking_status(&db, &id, status)? {
        return Err(AppError::NotFound(format!("booking {id}")));
    }
    tracing::info!(booking_id = %id, status = %status, "booking status updated");

    let booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    Ok(Json(booking))
}

// GET /api/admin/blocked-dates
pub async fn get_blocked_dates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BlockedDate>>, AppError> {
    let db = state.conn();
    Ok(Json(queries::list_blocked_dates(&db)?))
}

// POST /api/admin/blocked-dates
#[derive(Deserialize)]
pub struct BlockDateRequest {
    pub date: String,
    pub reason: Option<String>,
}

pub async fn add_blocked_date(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BlockDateRequest>,
) -> Result<(StatusCode, Json<BlockedDate>), AppError> {
    let date = NaiveDate::parse_from_str(body.date.trim(), queries::DATE_FORMAT)
        .map_err(|_| AppError::Validation("invalid date format, expected YYYY-MM-DD".to_string()))?;
    let reason = body.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());

    let db = state.conn();
    match queries::add_blocked_date(&db, date, reason)? {
        Some(blocked) => {
            tracing::info!(date = %date, "date blocked");
            Ok((StatusCode::CREATED, Json(blocked)))
        }
        None => Err(AppError::Conflict(format!("{date} is already blocked"))),
    }
}

// DELETE /api/admin/blocked-dates/:id
pub async fn remove_blocked_date(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.conn();
    if !queries::remove_blocked_date(&db, id)? {
        return Err(AppError::NotFound(format!("blocked date {id}")));
    }
    tracing::info!(blocked_date_id = id, "date unblocked");
    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/admin/services
pub async fn get_services(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Service>>, AppError> {
    let db = state.conn();
    Ok(Json(queries::list_services(&db)?))
}

fn clean_service_fields(mut fields: ServiceFields) -> Result<ServiceFields, AppError> {
    fields.title = fields.title.trim().to_string();
    if fields.title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    fields.features = fields
        .features
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    Ok(fields)
}

// POST /api/admin/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ServiceFields>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    let fields = clean_service_fields(body)?;
    let db = state.conn();
    let service = queries::create_service(&db, &fields)?;
    tracing::info!(service_id = service.id, title = %service.title, "service created");
    Ok((StatusCode::CREATED, Json(service)))
}

// PUT /api/admin/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ServiceFields>,
) -> Result<Json<Service>, AppError> {
    let fields = clean_service_fields(body)?;
    let db = state.conn();
    queries::update_service(&db, id, &fields)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("service {id}")))
}

// DELETE /api/admin/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.conn();
    if !queries::delete_service(&db, id)? {
        return Err(AppError::NotFound(format!("service {id}")));
    }
    tracing::info!(service_id = id, "service deleted");
    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/admin/settings
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<SiteSettings>, AppError> {
    let db = state.conn();
    Ok(Json(queries::load_settings(&db)?))
}

// POST /api/admin/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BTreeMap<String, String>>,
) -> Result<Json<SiteSettings>, AppError> {
    if body.keys().any(|k| k.trim().is_empty()) {
        return Err(AppError::Validation("setting keys must not be empty".to_string()));
    }

    let db = state.conn();
    queries::save_settings(&db, &body)?;
    tracing::info!(keys = body.len(), "settings updated");
    Ok(Json(queries::load_settings(&db)?))
}
