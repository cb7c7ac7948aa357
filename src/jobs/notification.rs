//! Notification background job.
//!
//! One job type covers the three account emails. The producer side
//! (registrar / credential flows) builds payloads through the constructors
//! below; the worker started by `jobs work` consumes them. In development
//! mode, emails are logged. In production, configure SMTP settings via
//! environment variables.

use serde::{Deserialize, Serialize};
use std::env;

use crate::domain::User;
use crate::errors::AppError;

/// Job names as they travel over the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    SendVerificationEmail,
    SendWelcomeEmail,
    SendForgotPasswordEmail,
}

/// Contact fields carried with every notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for Recipient {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Notification job payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationJob {
    /// Job name (routes the email template in the worker)
    pub name: NotificationKind,
    /// Email subject line
    pub subject: String,
    /// One-time code, present for verification and password-reset emails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Recipient contact fields
    pub user: Recipient,
}

impl NotificationJob {
    /// Email-verification job carrying a fresh OTP code.
    pub fn verification(user: &User, code: String) -> Self {
        Self {
            name: NotificationKind::SendVerificationEmail,
            subject: "Verify your email".to_string(),
            code: Some(code),
            user: Recipient::from(user),
        }
    }

    /// Welcome email sent once the address is verified.
    pub fn welcome(user: &User) -> Self {
        Self {
            name: NotificationKind::SendWelcomeEmail,
            subject: "Welcome to ReadStack".to_string(),
            code: None,
            user: Recipient::from(user),
        }
    }

    /// Password-reset email carrying a fresh OTP code.
    pub fn password_reset(user: &User, code: String) -> Self {
        Self {
            name: NotificationKind::SendForgotPasswordEmail,
            subject: "Reset your ReadStack account password".to_string(),
            code: Some(code),
            user: Recipient::from(user),
        }
    }
}

/// Email configuration from environment.
/// Note: Some fields are currently unused pending lettre integration.
#[allow(dead_code)]
struct EmailConfig {
    smtp_host: Option<String>,
    smtp_port: u16,
    smtp_user: Option<String>,
    smtp_pass: Option<String>,
    smtp_from: String,
}

impl EmailConfig {
    fn from_env() -> Self {
        Self {
            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            smtp_user: env::var("SMTP_USER").ok(),
            smtp_pass: env::var("SMTP_PASS").ok(),
            smtp_from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@readstack.app".to_string()),
        }
    }

    fn is_configured(&self) -> bool {
        self.smtp_host.is_some()
    }
}

/// Render the plain-text body for a notification.
fn render_body(job: &NotificationJob) -> String {
    let code = job.code.as_deref().unwrap_or_default();
    match job.name {
        NotificationKind::SendVerificationEmail => format!(
            "Hi {},\n\nYour email verification code is {}. It expires in 10 minutes.",
            job.user.first_name, code
        ),
        NotificationKind::SendWelcomeEmail => format!(
            "Hi {},\n\nYour email is verified. Welcome to ReadStack!",
            job.user.first_name
        ),
        NotificationKind::SendForgotPasswordEmail => format!(
            "Hi {},\n\nUse code {} to reset your password. It expires in 10 minutes.",
            job.user.first_name, code
        ),
    }
}

/// Notification job handler - processes queued account emails.
pub async fn notification_job_handler(job: NotificationJob) -> Result<(), AppError> {
    let config = EmailConfig::from_env();

    tracing::info!(
        to = %job.user.email,
        name = ?job.name,
        subject = %job.subject,
        "Processing notification job"
    );

    let body = render_body(&job);

    if !config.is_configured() {
        // Development mode: log the email instead of sending
        tracing::warn!("SMTP not configured - logging email instead of sending");
        tracing::info!(
            "=== EMAIL (not sent) ===\n\
             From: {}\n\
             To: {}\n\
             Subject: {}\n\
             Body:\n{}\n\
             ========================",
            config.smtp_from,
            job.user.email,
            job.subject,
            body
        );
        return Ok(());
    }

    // Production mode would send via SMTP (lettre); not wired up yet.
    tracing::warn!(
        "SMTP is configured but no mail transport is installed; \
         add lettre to enable real email sending."
    );

    tracing::info!(to = %job.user.email, "Notification processed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_user() -> User {
        User::new(
            Uuid::new_v4(),
            "reader@example.com".to_string(),
            "hashed".to_string(),
            "Ada".to_string(),
            "Lovelace".to_string(),
        )
    }

    #[test]
    fn test_verification_job_wire_shape() {
        let job = NotificationJob::verification(&sample_user(), "123456".to_string());
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["name"], "SEND_VERIFICATION_EMAIL");
        assert_eq!(value["subject"], "Verify your email");
        assert_eq!(value["code"], "123456");
        assert_eq!(value["user"]["email"], "reader@example.com");
        assert_eq!(value["user"]["firstName"], "Ada");
        assert_eq!(value["user"]["lastName"], "Lovelace");
    }

    #[test]
    fn test_welcome_job_omits_code() {
        let job = NotificationJob::welcome(&sample_user());
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["name"], "SEND_WELCOME_EMAIL");
        assert!(value.get("code").is_none());
    }

    #[test]
    fn test_forgot_password_job_round_trip() {
        let job = NotificationJob::password_reset(&sample_user(), "654321".to_string());
        let json = serde_json::to_string(&job).unwrap();
        let parsed: NotificationJob = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, job);
        assert_eq!(parsed.name, NotificationKind::SendForgotPasswordEmail);
    }
}
