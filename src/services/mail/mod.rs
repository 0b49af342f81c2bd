pub mod smtp;

use async_trait::async_trait;

/// Outbound plain-text email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Used when no SMTP host is configured: messages are logged, not delivered.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!(to, subject, body_len = body.len(), "SMTP not configured, email logged only");
        Ok(())
    }
}
