use anyhow::Context;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, NaiveDateTime, SubsecRound, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::models::AdminIdentity;

pub const SESSION_TTL_HOURS: i64 = 12;

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
        .to_string();
    Ok(hash)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            false
        }
    }
}

/// Creates the first admin account. Returns `false` if any admin already
/// exists; later accounts are never created through this path.
pub fn bootstrap_admin(conn: &Connection, username: &str, password: &str) -> anyhow::Result<bool> {
    if queries::count_admins(conn)? > 0 {
        return Ok(false);
    }
    let hash = hash_password(password)?;
    let id = queries::create_admin(conn, username, &hash).context("failed to create admin")?;
    tracing::info!(admin_id = id, username, "created initial admin account");
    Ok(true)
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: NaiveDateTime,
}

/// Checks credentials and opens a session. `None` on unknown user or wrong
/// password.
pub fn login(conn: &Connection, username: &str, password: &str) -> anyhow::Result<Option<IssuedSession>> {
    let Some(admin) = queries::get_admin_by_username(conn, username)? else {
        return Ok(None);
    };
    if !verify_password(password, &admin.password_hash) {
        return Ok(None);
    }

    queries::purge_expired_sessions(conn)?;

    let session = IssuedSession {
        token: Uuid::new_v4().to_string(),
        expires_at: (Utc::now().naive_utc() + Duration::hours(SESSION_TTL_HOURS)).trunc_subsecs(0),
    };
    queries::create_session(conn, &session.token, admin.id, &session.expires_at)?;
    tracing::info!(admin_id = admin.id, username = %admin.username, "admin logged in");
    Ok(Some(session))
}

/// Resolves a bearer token to an admin identity. The static token is
/// accepted only when it is non-empty.
pub fn authorize(
    conn: &Connection,
    static_token: &str,
    bearer: Option<&str>,
) -> anyhow::Result<Option<AdminIdentity>> {
    let Some(token) = bearer.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if !static_token.is_empty() && token == static_token {
        return Ok(Some(AdminIdentity::Token));
    }

    Ok(queries::find_session(conn, token)?.map(|(admin_id, username)| {
        AdminIdentity::Session {
            admin_id,
            username,
            token: token.to_string(),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret", "not-a-hash"));
    }

    #[test]
    fn test_bootstrap_only_once() {
        let conn = db::init_db(":memory:").unwrap();
        assert!(bootstrap_admin(&conn, "owner", "pw").unwrap());
        assert!(!bootstrap_admin(&conn, "other", "pw").unwrap());
        assert_eq!(queries::count_admins(&conn).unwrap(), 1);
    }

    #[test]
    fn test_login_and_authorize() {
        let conn = db::init_db(":memory:").unwrap();
        bootstrap_admin(&conn, "owner", "pw").unwrap();

        assert!(login(&conn, "owner", "nope").unwrap().is_none());
        assert!(login(&conn, "ghost", "pw").unwrap().is_none());

        let session = login(&conn, "owner", "pw").unwrap().unwrap();
        let identity = authorize(&conn, "", Some(&session.token)).unwrap().unwrap();
        assert!(matches!(identity, AdminIdentity::Session { ref username, .. } if username == "owner"));

        assert!(queries::delete_session(&conn, &session.token).unwrap());
        assert!(authorize(&conn, "", Some(&session.token)).unwrap().is_none());
    }

    #[test]
    fn test_static_token() {
        let conn = db::init_db(":memory:").unwrap();
        assert_eq!(
            authorize(&conn, "tok", Some("tok")).unwrap(),
            Some(AdminIdentity::Token)
        );
        assert!(authorize(&conn, "tok", Some("other")).unwrap().is_none());
        assert!(authorize(&conn, "", Some("")).unwrap().is_none());
        assert!(authorize(&conn, "tok", None).unwrap().is_none());
    }
}
