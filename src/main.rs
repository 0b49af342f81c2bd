use std::sync::{Arc, Mutex};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use storefront::config::AppConfig;
use storefront::db;
use storefront::handlers;
use storefront::services::auth;
use storefront::services::mail::smtp::SmtpMailer;
use storefront::services::mail::{LogMailer, Mailer};
use storefront::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if let Some((username, password)) = &config.initial_admin {
        auth::bootstrap_admin(&conn, username, password).context("failed to seed admin account")?;
    }

    let mailer: Box<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "using SMTP mailer");
            Box::new(SmtpMailer::new(
                &smtp.host,
                smtp.port,
                smtp.username.clone(),
                smtp.password.clone(),
                &smtp.from,
            )?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, booking emails will only be logged");
            Box::new(LogMailer)
        }
    };

    if config.admin_email.is_none() {
        tracing::warn!("ADMIN_EMAIL not set, operator booking alerts will fail");
    }
    if config.admin_token.is_empty() {
        tracing::info!("ADMIN_TOKEN not set, admin API requires a login session");
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        mailer,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
