//! Outgoing SMTP email: password-reset links and contact-form replies.

use anyhow::Result;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;

#[derive(Clone)]
pub struct Mailer {
    config: EmailConfig,
}

impl Mailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Whether SMTP is configured. When it isn't, sends become logged no-ops
    /// so development setups work without a mail server.
    pub fn is_enabled(&self) -> bool {
        self.config.is_configured()
    }

    /// Send the password-reset link for a time-boxed reset token.
    pub async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> Result<()> {
        let body = format!(
            "Hello,\n\n\
             A password reset was requested for your SwiftShop account.\n\
             Open the link below to choose a new password:\n\n\
             {reset_url}\n\n\
             The link expires in 15 minutes. If you didn't request this,\n\
             you can safely ignore this email.\n"
        );
        self.send(to_email, "Reset your SwiftShop password", &body)
            .await
    }

    /// Send a support reply to a contact-form message.
    pub async fn send_contact_reply(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        self.send(to_email, subject, body).await
    }

    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        if !self.is_enabled() {
            tracing::warn!("Email not configured, skipping send to {}", to_email);
            return Ok(());
        }

        let smtp_host = self
            .config
            .smtp_host
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SMTP host not configured"))?;
        let from_address = self
            .config
            .from_address
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("From address not configured"))?;

        let from: Mailbox = format!("{} <{}>", self.config.from_name, from_address).parse()?;
        let to: Mailbox = to_email.parse()?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        let mailer = if self.config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer
        };

        mailer.build().send(email).await?;

        tracing::info!(to = %to_email, subject = %subject, "Email sent");
        Ok(())
    }
}
