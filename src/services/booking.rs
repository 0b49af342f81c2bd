use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, SubsecRound, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::models::{BookingRequest, BookingStatus};
use crate::services::availability::check_availability;

const MAX_NAME_LEN: usize = 255;
const MAX_PHONE_LEN: usize = 50;

/// Raw booking form as submitted. Every field is kept verbatim so the form
/// can be re-rendered with the submitter's input after a rejection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub services: Vec<String>,
    pub event_date: String,
    pub guest_count: String,
    pub message: String,
}

impl BookingForm {
    /// Builds the form from urlencoded pairs. `services` may repeat.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut form = BookingForm::default();
        for (key, value) in pairs {
            match key.as_str() {
                "full_name" => form.full_name = value,
                "email" => form.email = value,
                "phone" => form.phone = value,
                "services" | "services[]" => form.services.push(value),
                "event_date" => form.event_date = value,
                "guest_count" => form.guest_count = value,
                "message" => form.message = value,
                _ => {}
            }
        }
        form
    }

    pub fn validate(&self) -> Result<ValidBooking, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            errors.add("full_name", "Full name is required.");
        } else if full_name.chars().count() > MAX_NAME_LEN {
            errors.add("full_name", "Full name must be at most 255 characters.");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", "Email is required.");
        } else if email.parse::<lettre::Address>().is_err() {
            errors.add("email", "Enter a valid email address.");
        }

        let phone = self.phone.trim();
        if phone.is_empty() {
            errors.add("phone", "Phone is required.");
        } else if phone.chars().count() > MAX_PHONE_LEN {
            errors.add("phone", "Phone must be at most 50 characters.");
        }

        let services: Vec<String> = self
            .services
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if services.is_empty() {
            errors.add("services", "Select at least one service.");
        }

        let event_date = match self.event_date.trim() {
            "" => None,
            raw => match NaiveDate::parse_from_str(raw, queries::DATE_FORMAT) {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.add("event_date", "Event date must be in YYYY-MM-DD format.");
                    None
                }
            },
        };

        let guest_count = match self.guest_count.trim() {
            "" => None,
            raw => match raw.parse::<i64>() {
                Ok(n) if n >= 1 => Some(n),
                Ok(_) => {
                    errors.add("guest_count", "Number of guests must be at least 1.");
                    None
                }
                Err(_) => {
                    errors.add("guest_count", "Number of guests must be a whole number.");
                    None
                }
            },
        };

        let message = Some(self.message.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidBooking {
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            services,
            event_date,
            guest_count,
            message,
        })
    }
}

/// A form that passed validation; values are trimmed and typed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub services: Vec<String>,
    pub event_date: Option<NaiveDate>,
    pub guest_count: Option<i64>,
    pub message: Option<String>,
}

/// Field name → message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join("; "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("invalid booking: {0}")]
    Validation(ValidationErrors),

    #[error("Sorry, {0} is not available. Please choose another date.")]
    Unavailable(NaiveDate),

    #[error("failed to store booking: {0:#}")]
    Persistence(anyhow::Error),
}

/// Validates the form, checks the event date against the current blocked
/// dates and inserts a new `pending` booking. Nothing is written on error.
///
/// Duplicate submissions are not detected; each call creates a new row.
pub fn submit(conn: &Connection, form: &BookingForm) -> Result<BookingRequest, SubmitError> {
    let valid = form.validate().map_err(SubmitError::Validation)?;

    let blocked = queries::blocked_date_set(conn).map_err(SubmitError::Persistence)?;
    check_availability(valid.event_date, &blocked).map_err(SubmitError::Unavailable)?;

    let booking = BookingRequest {
        id: Uuid::new_v4().to_string(),
        full_name: valid.full_name,
        email: valid.email,
        phone: valid.phone,
        services: valid.services,
        event_date: valid.event_date,
        guest_count: valid.guest_count,
        message: valid.message,
        status: BookingStatus::Pending,
        created_at: Utc::now().naive_utc().trunc_subsecs(0),
    };
    queries::insert_booking(conn, &booking).map_err(SubmitError::Persistence)?;

    tracing::info!(
        booking_id = %booking.id,
        event_date = ?booking.event_date,
        services = booking.services.len(),
        "booking request stored"
    );

    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn valid_form() -> BookingForm {
        BookingForm {
            full_name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            phone: "555-1234".to_string(),
            services: vec!["Event Planning".to_string()],
            event_date: "2025-12-25".to_string(),
            guest_count: "50".to_string(),
            message: "Outdoor venue".to_string(),
        }
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_pairs_collects_repeated_services() {
        let form = BookingForm::from_pairs(pairs(&[
            ("full_name", "Jane"),
            ("services", "Event Planning"),
            ("services", "Language Services"),
            ("csrf_token", "ignored"),
        ]));
        assert_eq!(form.full_name, "Jane");
        assert_eq!(form.services, vec!["Event Planning", "Language Services"]);
    }

    #[test]
    fn test_valid_form_is_typed() {
        let valid = valid_form().validate().unwrap();
        assert_eq!(valid.event_date, NaiveDate::from_ymd_opt(2025, 12, 25));
        assert_eq!(valid.guest_count, Some(50));
        assert_eq!(valid.message.as_deref(), Some("Outdoor venue"));
    }

    #[test]
    fn test_optional_fields_may_be_blank() {
        let form = BookingForm {
            event_date: String::new(),
            guest_count: "  ".to_string(),
            message: String::new(),
            ..valid_form()
        };
        let valid = form.validate().unwrap();
        assert_eq!(valid.event_date, None);
        assert_eq!(valid.guest_count, None);
        assert_eq!(valid.message, None);
    }

    #[test]
    fn test_required_fields() {
        let errors = BookingForm::default().validate().unwrap_err();
        assert!(errors.get("full_name").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("phone").is_some());
        assert!(errors.get("services").is_some());
        assert!(errors.get("event_date").is_none());
        assert!(errors.get("guest_count").is_none());
    }

    #[test]
    fn test_blank_services_do_not_count() {
        let form = BookingForm {
            services: vec!["".to_string(), "   ".to_string()],
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("services"), Some("Select at least one service."));
    }

    #[test]
    fn test_non_positive_guest_count_rejected() {
        for raw in ["0", "-3"] {
            let form = BookingForm {
                guest_count: raw.to_string(),
                ..valid_form()
            };
            let errors = form.validate().unwrap_err();
            assert_eq!(
                errors.get("guest_count"),
                Some("Number of guests must be at least 1."),
                "guest count {raw}"
            );
        }

        let form = BookingForm {
            guest_count: "many".to_string(),
            ..valid_form()
        };
        assert!(form.validate().unwrap_err().get("guest_count").is_some());
    }

    #[test]
    fn test_malformed_email_and_date_rejected() {
        let form = BookingForm {
            email: "not-an-email".to_string(),
            event_date: "25/12/2025".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("email").is_some());
        assert!(errors.get("event_date").is_some());
    }

    #[test]
    fn test_over_long_fields_rejected() {
        let form = BookingForm {
            full_name: "x".repeat(256),
            phone: "1".repeat(51),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("full_name").is_some());
        assert!(errors.get("phone").is_some());
    }

    #[test]
    fn test_submit_stores_pending_booking() {
        let conn = db::init_db(":memory:").unwrap();
        let booking = submit(&conn, &valid_form()).unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        let stored = queries::get_booking_by_id(&conn, &booking.id).unwrap().unwrap();
        assert_eq!(stored, booking);
    }

    #[test]
    fn test_submit_rejects_blocked_date_without_writing() {
        let conn = db::init_db(":memory:").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        queries::add_blocked_date(&conn, date, Some("Closed")).unwrap();

        match submit(&conn, &valid_form()) {
            Err(SubmitError::Unavailable(d)) => assert_eq!(d, date),
            other => panic!("expected Unavailable, got {other:?}"),
        }
        assert_eq!(queries::count_bookings(&conn, None).unwrap(), 0);
    }

    #[test]
    fn test_submit_without_date_ignores_blocked_dates() {
        let conn = db::init_db(":memory:").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        queries::add_blocked_date(&conn, date, None).unwrap();

        let form = BookingForm {
            event_date: String::new(),
            ..valid_form()
        };
        assert!(submit(&conn, &form).is_ok());
    }

    #[test]
    fn test_identical_submissions_create_distinct_rows() {
        let conn = db::init_db(":memory:").unwrap();
        let first = submit(&conn, &valid_form()).unwrap();
        let second = submit(&conn, &valid_form()).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(queries::count_bookings(&conn, None).unwrap(), 2);
    }

    #[test]
    fn test_unavailable_message_names_date() {
        let err = SubmitError::Unavailable(NaiveDate::from_ymd_opt(2025, 12, 25).unwrap());
        assert_eq!(
            err.to_string(),
            "Sorry, 2025-12-25 is not available. Please choose another date."
        );
    }
}
