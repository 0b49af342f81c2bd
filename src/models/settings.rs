use std::collections::BTreeMap;

use serde::Serialize;

const DEFAULT_COMPANY_NAME: &str = "Ezana Services";

/// Point-in-time copy of the `settings` table, loaded once per request.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct SiteSettings {
    values: BTreeMap<String, String>,
}

impl SiteSettings {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn company_name(&self) -> &str {
        self.get("company_name").unwrap_or(DEFAULT_COMPANY_NAME)
    }

    pub fn contact_email(&self) -> Option<&str> {
        self.get("email")
    }
}
