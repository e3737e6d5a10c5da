use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Outbound user notifications. All methods are fire-and-forget from the
/// caller's perspective; a failed send is logged, never surfaced to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn password_reset_requested(&self, email: &str, name: &str, reset_token: &str);
    async fn password_changed(&self, email: &str, name: &str);
    async fn account_locked(&self, email: &str, name: &str, minutes: i64);
    async fn login_alert(&self, email: &str, name: &str, ip: &str);
    async fn two_factor_enabled(&self, email: &str, name: &str);
    async fn welcome(&self, email: &str, name: &str);
}

/// SMTP-backed notifier.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    from_name: String,
}

impl SmtpNotifier {
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        username: String,
        password: String,
        from_address: String,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)?
            .port(smtp_port)
            .credentials(Credentials::new(username, password))
            .build();
        Ok(Self {
            transport,
            from_address,
            from_name: "MiloApps".to_string(),
        })
    }

    /// Build from SMTP_* environment variables; None when SMTP_HOST is unset.
    pub fn from_env() -> Option<Result<Self, lettre::transport::smtp::Error>> {
        let host = std::env::var("SMTP_HOST").ok()?;
        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);
        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password = std::env::var("SMTP_PASSWORD").unwrap_or_default();
        let from = std::env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@miloapps.com".to_string());
        Some(Self::new(&host, port, username, password, from))
    }

    async fn send(&self, to: &str, subject: &str, body: String) {
        let to_mailbox = match to.parse() {
            Ok(mbox) => mbox,
            Err(e) => {
                tracing::warn!(to, error = %e, "invalid recipient address, dropping email");
                return;
            }
        };
        let from = format!("{} <{}>", self.from_name, self.from_address);
        let from_mailbox = match from.parse() {
            Ok(mbox) => mbox,
            Err(e) => {
                tracing::error!(error = %e, "invalid sender address, dropping email");
                return;
            }
        };
        let email = match Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
        {
            Ok(email) => email,
            Err(e) => {
                tracing::error!(error = %e, "failed to build email");
                return;
            }
        };
        if let Err(e) = self.transport.send(email).await {
            tracing::error!(to, subject, error = %e, "failed to send email");
        }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn password_reset_requested(&self, email: &str, name: &str, reset_token: &str) {
        let body = format!(
            "Hello {},\n\nA password reset was requested for your MiloApps account.\n\
             Use this token to choose a new password:\n\n{}\n\n\
             The token expires in one hour. If you did not request this, you can ignore this email.",
            name, reset_token
        );
        self.send(email, "MiloApps password reset", body).await;
    }

    async fn password_changed(&self, email: &str, name: &str) {
        let body = format!(
            "Hello {},\n\nYour MiloApps password was just changed. If this was not you, \
             contact your administrator immediately.",
            name
        );
        self.send(email, "Your MiloApps password was changed", body)
            .await;
    }

    async fn account_locked(&self, email: &str, name: &str, minutes: i64) {
        let body = format!(
            "Hello {},\n\nYour MiloApps account was locked for {} minutes after repeated \
             failed login attempts.",
            name, minutes
        );
        self.send(email, "MiloApps account locked", body).await;
    }

    async fn login_alert(&self, email: &str, name: &str, ip: &str) {
        let body = format!(
            "Hello {},\n\nA new login to your MiloApps account was detected from {}.\n\
             If this was you, no action is needed.",
            name, ip
        );
        self.send(email, "New login to your MiloApps account", body)
            .await;
    }

    async fn two_factor_enabled(&self, email: &str, name: &str) {
        let body = format!(
            "Hello {},\n\nTwo-factor authentication was enabled on your MiloApps account.",
            name
        );
        self.send(email, "Two-factor authentication enabled", body)
            .await;
    }

    async fn welcome(&self, email: &str, name: &str) {
        let body = format!(
            "Hello {},\n\nWelcome to MiloApps. Your account has been created.",
            name
        );
        self.send(email, "Welcome to MiloApps", body).await;
    }
}

/// No-op notifier used when SMTP is not configured and in tests.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn password_reset_requested(&self, email: &str, _name: &str, _reset_token: &str) {
        tracing::debug!(email, "notifier disabled, skipping password reset email");
    }
    async fn password_changed(&self, _email: &str, _name: &str) {}
    async fn account_locked(&self, _email: &str, _name: &str, _minutes: i64) {}
    async fn login_alert(&self, _email: &str, _name: &str, _ip: &str) {}
    async fn two_factor_enabled(&self, _email: &str, _name: &str) {}
    async fn welcome(&self, _email: &str, _name: &str) {}
}
