use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::AdminIdentity;
use crate::services::auth;
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Guard for admin-only routes. Resolves the caller before the handler runs
/// and makes the resulting [`AdminIdentity`] available as an extension.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = bearer_token(request.headers());
    let identity = {
        let db = state.conn();
        auth::authorize(&db, &state.config.admin_token, bearer.as_deref())?
    };

    let Some(identity) = identity else {
        tracing::debug!(path = %request.uri().path(), "admin request rejected");
        return Err(AppError::Unauthorized);
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// POST /api/setup-admin
pub async fn setup_admin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Credentials>,
) -> Result<Json<serde_json::Value>, AppError> {
    let username = body.username.trim();
    if username.len() < 3 || body.password.is_empty() {
        return Err(AppError::Validation(
            "username (at least 3 characters) and password are required".to_string(),
        ));
    }

    let created = {
        let db = state.conn();
        auth::bootstrap_admin(&db, username, &body.password)?
    };
    if !created {
        return Err(AppError::Forbidden("admin already exists".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

// POST /api/admin/login
#[derive(Serialize)]
pub struct LoginResponse {
    token: String,
    expires_at: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Credentials>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = {
        let db = state.conn();
        auth::login(&db, body.username.trim(), &body.password)?
    };

    match session {
        Some(s) => Ok(Json(LoginResponse {
            token: s.token,
            expires_at: s.expires_at.format(queries::TIMESTAMP_FORMAT).to_string(),
        })),
        None => {
            tracing::warn!(username = %body.username, "failed admin login");
            Err(AppError::Unauthorized)
        }
    }
}

// POST /api/admin/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AdminIdentity>,
) -> Result<Json<serde_json::Value>, AppError> {
    if let AdminIdentity::Session { token, .. } = &identity {
        let db = state.conn();
        queries::delete_session(&db, token)?;
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/admin/me
pub async fn whoami(Extension(identity): Extension<AdminIdentity>) -> Json<AdminIdentity> {
    Json(identity)
}
