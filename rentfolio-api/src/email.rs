/// Email dispatch collaborator
///
/// The identity core only ever needs three notifications sent, all
/// fire-and-forget: delivery failure is logged and never surfaced to the
/// caller of the triggering operation, because the HTTP response must not
/// depend on the mail system (and in the forgot-password case must not
/// depend on whether the email exists at all).
///
/// The shipped implementation writes structured log events instead of
/// talking to a real provider; wire an SMTP/SES implementation behind the
/// same trait in deployment.

use async_trait::async_trait;
use std::sync::Arc;

/// Outbound email capability
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the email-verification link after registration
    async fn send_verification_email(&self, to: &str, token: &str);

    /// Sends the password-reset link
    async fn send_password_reset_email(&self, to: &str, token: &str);

    /// Sends an invitation code to a prospective user
    async fn send_invitation_email(&self, to: &str, code: &str);
}

/// Shared handle to the configured mailer
pub type DynMailer = Arc<dyn Mailer>;

/// Mailer that logs instead of sending
///
/// Tokens are secrets; they are logged at debug level only, so production
/// filters (`info` and above) never record them.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_email(&self, to: &str, token: &str) {
        tracing::info!(recipient = %to, "dispatching verification email");
        tracing::debug!(recipient = %to, %token, "verification token issued");
    }

    async fn send_password_reset_email(&self, to: &str, token: &str) {
        tracing::info!(recipient = %to, "dispatching password-reset email");
        tracing::debug!(recipient = %to, %token, "password-reset token issued");
    }

    async fn send_invitation_email(&self, to: &str, code: &str) {
        tracing::info!(recipient = %to, "dispatching invitation email");
        tracing::debug!(recipient = %to, %code, "invitation code issued");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records calls for assertions in handler tests
    #[derive(Debug, Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_verification_email(&self, to: &str, token: &str) {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), token.to_string()));
        }

        async fn send_password_reset_email(&self, to: &str, token: &str) {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), token.to_string()));
        }

        async fn send_invitation_email(&self, to: &str, code: &str) {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), code.to_string()));
        }
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        let mailer = LogMailer;
        mailer.send_verification_email("a@example.com", "tok").await;
        mailer.send_password_reset_email("a@example.com", "tok").await;
        mailer.send_invitation_email("a@example.com", "code").await;
    }

    #[tokio::test]
    async fn test_recording_mailer_captures_calls() {
        let mailer = RecordingMailer::default();
        mailer.send_invitation_email("b@example.com", "raw-code").await;

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "b@example.com");
    }
}
