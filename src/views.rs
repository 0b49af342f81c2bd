//! Server-rendered HTML for the public booking page.

use chrono::NaiveDate;

use crate::models::{Service, SiteSettings};
use crate::services::booking::{BookingForm, ValidationErrors};

static BOOKING_HTML: &str = include_str!("web/booking.html");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Danger,
}

#[derive(Debug, Clone)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Danger,
            message: message.into(),
        }
    }
}

/// Everything the booking page needs besides the form itself.
pub struct BookingPage<'a> {
    pub settings: &'a SiteSettings,
    pub services: &'a [Service],
    pub blocked_dates: &'a [NaiveDate],
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn field_error(errors: Option<&ValidationErrors>, field: &str) -> String {
    errors
        .and_then(|e| e.get(field))
        .map(|msg| format!(r#"<div class="field-error">{}</div>"#, escape(msg)))
        .unwrap_or_default()
}

fn text_input(
    kind: &str,
    name: &str,
    label: &str,
    value: &str,
    errors: Option<&ValidationErrors>,
) -> String {
    format!(
        r#"<label for="{name}">{label}</label>
<input type="{kind}" id="{name}" name="{name}" value="{value}">
{error}"#,
        value = escape(value),
        error = field_error(errors, name),
    )
}

fn render_flash(flash: Option<&Flash>) -> String {
    match flash {
        Some(f) => {
            let class = match f.level {
                FlashLevel::Success => "flash-success",
                FlashLevel::Danger => "flash-danger",
            };
            format!(r#"<div class="flash {class}">{}</div>"#, escape(&f.message))
        }
        None => String::new(),
    }
}

fn render_form(page: &BookingPage<'_>, form: &BookingForm, errors: Option<&ValidationErrors>) -> String {
    let mut html = String::from(r#"<form method="post" action="/booking">"#);

    html.push_str(&text_input("text", "full_name", "Full Name", &form.full_name, errors));
    html.push_str(&text_input("email", "email", "Email", &form.email, errors));
    html.push_str(&text_input("tel", "phone", "Phone", &form.phone, errors));

    html.push_str("<label>Services</label>");
    for service in page.services {
        let checked = if form.services.iter().any(|s| s == &service.title) {
            " checked"
        } else {
            ""
        };
        html.push_str(&format!(
            r#"<label class="service"><input type="checkbox" name="services" value="{title}"{checked}> {title}</label>"#,
            title = escape(&service.title),
        ));
    }
    html.push_str(&field_error(errors, "services"));

    html.push_str(&text_input("date", "event_date", "Event Date", &form.event_date, errors));
    if !page.blocked_dates.is_empty() {
        let dates: Vec<String> = page.blocked_dates.iter().map(|d| d.to_string()).collect();
        html.push_str(&format!(
            r#"<div class="blocked">Unavailable dates: {}</div>"#,
            dates.join(", ")
        ));
    }

    html.push_str(&text_input(
        "number",
        "guest_count",
        "Number of Guests",
        &form.guest_count,
        errors,
    ));

    html.push_str(&format!(
        r#"<label for="message">Additional Information</label>
<textarea id="message" name="message" rows="4">{}</textarea>"#,
        escape(&form.message)
    ));

    html.push_str(r#"<button type="submit">Send Booking Request</button></form>"#);
    html
}

pub fn render_booking_page(
    page: &BookingPage<'_>,
    form: &BookingForm,
    errors: Option<&ValidationErrors>,
    flash: Option<&Flash>,
) -> String {
    let contact = [page.settings.get("phone"), page.settings.contact_email()]
        .into_iter()
        .flatten()
        .map(escape)
        .collect::<Vec<_>>()
        .join(" · ");

    fill(
        BOOKING_HTML,
        &[
            ("company_name", escape(page.settings.company_name()).as_str()),
            ("contact", contact.as_str()),
            ("flash", render_flash(flash).as_str()),
            ("form", render_form(page, form, errors).as_str()),
        ],
    )
}

pub fn render_error_page(settings: &SiteSettings) -> String {
    let flash = render_flash(Some(&Flash::danger(
        "Something went wrong while saving your booking. Please try again later.",
    )));
    fill(
        BOOKING_HTML,
        &[
            ("company_name", escape(settings.company_name()).as_str()),
            ("contact", ""),
            ("flash", flash.as_str()),
            ("form", r#"<p><a href="/booking">Back to the booking form</a></p>"#),
        ],
    )
}

/// Replaces `{{name}}` slots in one pass. Inserted values are never rescanned,
/// so a setting containing `{{form}}` stays literal text.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let slot = after.find("}}").and_then(|end| {
            let name = &after[..end];
            values
                .iter()
                .find(|(slot, _)| *slot == name)
                .map(|(_, value)| (end, *value))
        });
        match slot {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_submitted_values_are_echoed_and_escaped() {
        let settings = SiteSettings::default();
        let page = BookingPage {
            settings: &settings,
            services: &[],
            blocked_dates: &[],
        };
        let form = BookingForm {
            full_name: "<script>".to_string(),
            ..BookingForm::default()
        };
        let mut errors = ValidationErrors::default();
        errors.add("email", "Email is required.");

        let html = render_booking_page(&page, &form, Some(&errors), None);
        assert!(html.contains(r#"value="&lt;script&gt;""#));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Email is required."));
    }

    #[test]
    fn test_fill_leaves_unknown_slots() {
        let out = fill("<p>{{a}} {{b}} {{</p>", &[("a", "1")]);
        assert_eq!(out, "<p>1 {{b}} {{</p>");
    }

    #[test]
    fn test_settings_values_are_not_expanded_as_slots() {
        let mut values = BTreeMap::new();
        values.insert("company_name".to_string(), "{{form}}".to_string());
        values.insert("phone".to_string(), "{{flash}}".to_string());
        let settings = SiteSettings::new(values);
        let page = BookingPage {
            settings: &settings,
            services: &[],
            blocked_dates: &[],
        };

        let html = render_booking_page(&page, &BookingForm::default(), None, None);
        assert_eq!(html.matches("<form").count(), 1);
        assert!(html.contains("<h1>{{form}}</h1>"));
        assert!(html.contains("{{flash}}"));
    }
}
