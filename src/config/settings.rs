use std::env;

/// Security tunables for the authentication core.
///
/// The lockout contract is 3 attempts / 30 minutes. A legacy flow in the
/// original portal used 5 attempts; 3 is the canonical value here.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub lockout_threshold: i32,
    pub lockout_duration_minutes: i64,
    pub reset_token_lifetime_hours: i64,
    pub pending_two_factor_ttl_secs: i64,
    pub suspicious_login_days: i64,
    pub totp_issuer: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            lockout_threshold: 3,
            lockout_duration_minutes: 30,
            reset_token_lifetime_hours: 1,
            pending_two_factor_ttl_secs: 300,
            suspicious_login_days: 30,
            totp_issuer: "MiloApps".to_string(),
        }
    }
}

impl AuthSettings {
    /// Load settings from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lockout_threshold: env_parse("LOCKOUT_THRESHOLD", defaults.lockout_threshold),
            lockout_duration_minutes: env_parse(
                "LOCKOUT_DURATION_MINUTES",
                defaults.lockout_duration_minutes,
            ),
            reset_token_lifetime_hours: env_parse(
                "RESET_TOKEN_LIFETIME_HOURS",
                defaults.reset_token_lifetime_hours,
            ),
            pending_two_factor_ttl_secs: env_parse(
                "PENDING_2FA_TTL_SECS",
                defaults.pending_two_factor_ttl_secs,
            ),
            suspicious_login_days: env_parse(
                "SUSPICIOUS_LOGIN_DAYS",
                defaults.suspicious_login_days,
            ),
            totp_issuer: env::var("TOTP_ISSUER").unwrap_or(defaults.totp_issuer),
        }
    }

    pub fn lockout_duration_secs(&self) -> i64 {
        self.lockout_duration_minutes * 60
    }

    pub fn reset_token_lifetime_secs(&self) -> i64 {
        self.reset_token_lifetime_hours * 3600
    }
}

/// Server-level configuration loaded once at startup
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub listen_addr: String,
    pub database_url: String,
    pub audit_database_url: String,
    pub password_pepper: String,
}

impl ServerSettings {
    pub fn from_env() -> Self {
        Self {
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://miloapps_auth.db?mode=rwc".to_string()),
            audit_database_url: env::var("AUDIT_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://miloapps_audit.db?mode=rwc".to_string()),
            password_pepper: env::var("PASSWORD_PEPPER")
                .unwrap_or_else(|_| "change-me-in-production".to_string()),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
