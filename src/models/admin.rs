use chrono::NaiveDateTime;
use serde::Serialize;

/// Every admin has the same rights; there is no role split.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

/// Who passed the admin guard. Inserted into request extensions.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdminIdentity {
    /// Authenticated with the static `ADMIN_TOKEN`.
    Token,
    Session {
        admin_id: i64,
        username: String,
        #[serde(skip_serializing)]
        token: String,
    },
}
