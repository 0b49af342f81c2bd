use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Service, SiteSettings};
use crate::services::booking::{self, BookingForm, SubmitError, ValidationErrors};
use crate::services::notifier;
use crate::state::AppState;
use crate::views::{self, BookingPage, Flash};

const SENT_MESSAGE: &str = "Your booking request has been sent!";

struct PageData {
    settings: SiteSettings,
    services: Vec<Service>,
    blocked_dates: Vec<chrono::NaiveDate>,
}

fn load_page_data(state: &AppState) -> anyhow::Result<PageData> {
    let db = state.conn();
    Ok(PageData {
        settings: queries::load_settings(&db)?,
        services: queries::list_services(&db)?,
        blocked_dates: queries::blocked_date_set(&db)?.into_iter().collect(),
    })
}

fn render(
    data: &PageData,
    form: &BookingForm,
    errors: Option<&ValidationErrors>,
    flash: Option<&Flash>,
) -> String {
    let page = BookingPage {
        settings: &data.settings,
        services: &data.services,
        blocked_dates: &data.blocked_dates,
    };
    views::render_booking_page(&page, form, errors, flash)
}

// GET /booking
#[derive(Deserialize)]
pub struct BookingPageQuery {
    pub status: Option<String>,
}

pub async fn booking_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingPageQuery>,
) -> Result<Html<String>, AppError> {
    let data = load_page_data(&state)?;
    let flash = match query.status.as_deref() {
        Some("sent") => Some(Flash::success(SENT_MESSAGE)),
        _ => None,
    };
    Ok(Html(render(&data, &BookingForm::default(), None, flash.as_ref())))
}

// POST /booking
//
// Every storage failure on this path ends in the HTML error page, never the
// JSON error body used by the API routes.
pub async fn submit_booking(
    State(state): State<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = BookingForm::from_pairs(pairs);

    let (settings, outcome) = {
        let db = state.conn();
        match queries::load_settings(&db) {
            Ok(settings) => {
                let outcome = booking::submit(&db, &form);
                (settings, outcome)
            }
            Err(e) => (SiteSettings::default(), Err(SubmitError::Persistence(e))),
        }
    };

    match outcome {
        Ok(booking) => {
            let outcomes = notifier::notify_booking(
                state.mailer.as_ref(),
                state.config.admin_email.as_deref(),
                &settings,
                &booking,
            )
            .await;

            for outcome in outcomes {
                match outcome.result {
                    Ok(()) => tracing::info!(
                        booking_id = %booking.id,
                        kind = %outcome.kind,
                        to = outcome.recipient.as_deref().unwrap_or(""),
                        "notification sent"
                    ),
                    Err(e) => tracing::warn!(
                        booking_id = %booking.id,
                        kind = %outcome.kind,
                        error = %e,
                        "notification failed, booking kept"
                    ),
                }
            }

            Redirect::to("/booking?status=sent").into_response()
        }
        Err(SubmitError::Validation(errors)) => {
            tracing::debug!(errors = %errors, "booking form rejected");
            match load_page_data(&state) {
                Ok(data) => {
                    let html = render(&data, &form, Some(&errors), None);
                    (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response()
                }
                Err(e) => storage_failure(&settings, e),
            }
        }
        Err(SubmitError::Unavailable(date)) => {
            tracing::info!(event_date = %date, "booking rejected for blocked date");
            match load_page_data(&state) {
                Ok(data) => {
                    let flash = Flash::danger(SubmitError::Unavailable(date).to_string());
                    let html = render(&data, &form, None, Some(&flash));
                    (StatusCode::CONFLICT, Html(html)).into_response()
                }
                Err(e) => storage_failure(&settings, e),
            }
        }
        Err(SubmitError::Persistence(e)) => storage_failure(&settings, e),
    }
}

fn storage_failure(settings: &SiteSettings, e: anyhow::Error) -> Response {
    let detail = format!("{e:#}");
    tracing::error!(error = %detail, "booking request failed on storage");
    let html = views::render_error_page(settings);
    (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response()
}
