use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// Static bearer token for the admin API. Empty disables it.
    pub admin_token: String,
    /// Recipient of new-booking alerts.
    pub admin_email: Option<String>,
    pub smtp: Option<SmtpConfig>,
    /// Seeds the first admin account at startup when both are set.
    pub initial_admin: Option<(String, String)>,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let smtp = non_empty("SMTP_HOST").map(|host| {
            let username = env::var("SMTP_USERNAME").unwrap_or_default();
            SmtpConfig {
                host,
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(587),
                from: non_empty("MAIL_FROM").unwrap_or_else(|| username.clone()),
                username,
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            }
        });

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "storefront.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_default(),
            admin_email: non_empty("ADMIN_EMAIL"),
            smtp,
            initial_admin: non_empty("ADMIN_USERNAME").zip(non_empty("ADMIN_PASSWORD")),
        }
    }
}
