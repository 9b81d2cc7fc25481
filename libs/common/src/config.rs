//! Service settings
//!
//! Loaded with the `config` crate from `BOOKING_*` environment variables on
//! top of built-in defaults, e.g. `BOOKING_SESSION_LIFETIME_HOURS=12`.

use chrono::Duration;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Settings shared by the auth and API services
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Address the HTTP listener binds to
    pub bind_address: String,
    /// How long a session stays valid after creation or renewal
    pub session_lifetime_hours: i64,
    /// Renew once less than this fraction of the lifetime remains
    pub session_renewal_threshold: f64,
    /// Upper bound for handling one request
    pub request_timeout_secs: u64,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    /// Failed sign-ins tolerated per email inside the window
    pub signin_max_attempts: u32,
    pub signin_window_secs: u64,
    pub signin_ban_secs: u64,
}

impl Settings {
    /// Load settings, falling back to `default_bind` for the listener address
    ///
    /// # Environment Variables
    /// - `BOOKING_BIND_ADDRESS` (default: `default_bind`)
    /// - `BOOKING_SESSION_LIFETIME_HOURS` (default: 24)
    /// - `BOOKING_SESSION_RENEWAL_THRESHOLD` (default: 0.25)
    /// - `BOOKING_REQUEST_TIMEOUT_SECS` (default: 10)
    /// - `BOOKING_SECURE_COOKIES` (default: false)
    /// - `BOOKING_SIGNIN_MAX_ATTEMPTS` (default: 5)
    /// - `BOOKING_SIGNIN_WINDOW_SECS` (default: 300)
    /// - `BOOKING_SIGNIN_BAN_SECS` (default: 3600)
    pub fn load(default_bind: &str) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("bind_address", default_bind)?
            .set_default("session_lifetime_hours", 24)?
            .set_default("session_renewal_threshold", 0.25)?
            .set_default("request_timeout_secs", 10)?
            .set_default("secure_cookies", false)?
            .set_default("signin_max_attempts", 5)?
            .set_default("signin_window_secs", 300)?
            .set_default("signin_ban_secs", 3600)?
            .add_source(Environment::with_prefix("BOOKING").try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session_lifetime_hours <= 0 {
            return Err(ConfigError::Message(
                "session_lifetime_hours must be positive".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.session_renewal_threshold) {
            return Err(ConfigError::Message(
                "session_renewal_threshold must be between 0 and 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn session_lifetime(&self) -> Duration {
        Duration::hours(self.session_lifetime_hours)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}
