use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedDate {
    pub id: i64,
    pub date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}
