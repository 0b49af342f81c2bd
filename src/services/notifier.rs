use std::fmt;

use crate::models::{BookingRequest, SiteSettings};
use crate::services::mail::Mailer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    OperatorAlert,
    CustomerConfirmation,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::OperatorAlert => f.write_str("operator_alert"),
            NotificationKind::CustomerConfirmation => f.write_str("customer_confirmation"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("no recipient configured for {0}")]
    MissingRecipient(NotificationKind),

    #[error("mail transport error: {0:#}")]
    Transport(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

#[derive(Debug)]
pub struct NotificationOutcome {
    pub kind: NotificationKind,
    pub recipient: Option<String>,
    pub result: Result<(), NotifyError>,
}

fn services_line(booking: &BookingRequest) -> String {
    if booking.services.is_empty() {
        "N/A".to_string()
    } else {
        booking.services.join(", ")
    }
}

fn event_date_line(booking: &BookingRequest) -> String {
    booking
        .event_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "Not specified".to_string())
}

fn guests_line(booking: &BookingRequest) -> String {
    booking
        .guest_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "Not specified".to_string())
}

pub fn operator_alert(booking: &BookingRequest) -> EmailContent {
    let body = format!(
        "New booking received:\n\
         Name: {}\n\
         Email: {}\n\
         Phone: {}\n\
         Services: {}\n\
         Event Date: {}\n\
         Guests: {}\n\
         Message: {}\n\
         Reference: {}\n",
        booking.full_name,
        booking.email,
        booking.phone,
        services_line(booking),
        event_date_line(booking),
        guests_line(booking),
        booking.message.as_deref().unwrap_or(""),
        booking.id,
    );

    EmailContent {
        subject: format!("New Booking from {}", booking.full_name),
        body,
    }
}

pub fn customer_confirmation(
    booking: &BookingRequest,
    settings: &SiteSettings,
    fallback_contact: Option<&str>,
) -> EmailContent {
    let company = settings.company_name();
    let contact = settings
        .contact_email()
        .or(fallback_contact)
        .map(|email| format!("\nIf you have any questions, please contact us at {email}.\n"))
        .unwrap_or_default();

    let body = format!(
        "Dear {name},\n\n\
         Thank you for booking with {company}. We have received your booking request and will contact you shortly.\n\n\
         Booking details:\n\
         - Services: {services}\n\
         - Event Date: {date}\n\
         - Number of Guests: {guests}\n\
         - Your message: {message}\n\
         {contact}\n\
         Best regards,\n\
         {company} Team\n",
        name = booking.full_name,
        services = services_line(booking),
        date = event_date_line(booking),
        guests = guests_line(booking),
        message = booking.message.as_deref().unwrap_or(""),
    );

    EmailContent {
        subject: format!("Booking Confirmation - {company}"),
        body,
    }
}

pub async fn send_operator_alert(
    mailer: &dyn Mailer,
    admin_email: Option<&str>,
    booking: &BookingRequest,
) -> Result<(), NotifyError> {
    let to = admin_email
        .filter(|e| !e.trim().is_empty())
        .ok_or(NotifyError::MissingRecipient(NotificationKind::OperatorAlert))?;
    let content = operator_alert(booking);
    mailer
        .send(to, &content.subject, &content.body)
        .await
        .map_err(NotifyError::Transport)
}

pub async fn send_customer_confirmation(
    mailer: &dyn Mailer,
    settings: &SiteSettings,
    admin_email: Option<&str>,
    booking: &BookingRequest,
) -> Result<(), NotifyError> {
    let content = customer_confirmation(booking, settings, admin_email);
    mailer
        .send(&booking.email, &content.subject, &content.body)
        .await
        .map_err(NotifyError::Transport)
}

/// Sends the operator alert, then the customer confirmation. The second send
/// is attempted whatever the first one's outcome; neither is retried.
pub async fn notify_booking(
    mailer: &dyn Mailer,
    admin_email: Option<&str>,
    settings: &SiteSettings,
    booking: &BookingRequest,
) -> Vec<NotificationOutcome> {
    let operator = send_operator_alert(mailer, admin_email, booking).await;
    let customer = send_customer_confirmation(mailer, settings, admin_email, booking).await;

    vec![
        NotificationOutcome {
            kind: NotificationKind::OperatorAlert,
            recipient: admin_email.map(str::to_string),
            result: operator,
        },
        NotificationOutcome {
            kind: NotificationKind::CustomerConfirmation,
            recipient: Some(booking.email.clone()),
            result: customer,
        },
    ]
}
