use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BOX_COLOR: &str = "#2E8B57";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub features: Vec<String>,
    pub box_color: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Editable columns of a catalog entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceFields {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub box_color: Option<String>,
}
