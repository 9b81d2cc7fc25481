//! Sign-in throttling for preventing brute force attacks
//!
//! Failed attempts are counted per normalized email. Reaching the limit inside
//! the window bans the email for a while; a successful sign-in clears it.
//! Entries whose window and ban have both run out are pruned on every failure.

use booking_common::{config::Settings, validation::normalize_email};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Throttle configuration
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Failed attempts allowed inside the window
    pub max_attempts: u32,
    pub window: Duration,
    pub ban: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(300),
            ban: Duration::from_secs(3600),
        }
    }
}

impl ThrottleConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_attempts: settings.signin_max_attempts,
            window: Duration::from_secs(settings.signin_window_secs),
            ban: Duration::from_secs(settings.signin_ban_secs),
        }
    }
}

#[derive(Debug)]
struct AttemptEntry {
    failures: u32,
    window_start: Instant,
    banned_until: Option<Instant>,
}

impl AttemptEntry {
    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        match self.banned_until {
            Some(until) => now >= until,
            None => now.duration_since(self.window_start) >= window,
        }
    }
}

/// Per-email failed sign-in tracker
#[derive(Debug, Clone)]
pub struct SignInThrottle {
    config: ThrottleConfig,
    entries: Arc<Mutex<HashMap<String, AttemptEntry>>>,
}

impl SignInThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether sign-ins for this email are currently refused
    pub async fn is_banned(&self, email: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let key = normalize_email(email);

        let banned_until = entries.get(&key).and_then(|entry| entry.banned_until);

        match banned_until {
            Some(until) if Instant::now() < until => true,
            Some(_) => {
                // Ban served
                entries.remove(&key);
                false
            }
            None => false,
        }
    }

    pub async fn record_failure(&self, email: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let key = normalize_email(email);

        let window = self.config.window;
        entries.retain(|_, entry| !entry.is_stale(now, window));

        let entry = entries.entry(key).or_insert(AttemptEntry {
            failures: 0,
            window_start: now,
            banned_until: None,
        });

        if now.duration_since(entry.window_start) >= self.config.window {
            entry.failures = 0;
            entry.window_start = now;
        }

        entry.failures += 1;
        warn!("Failed sign-in attempt {} for {}", entry.failures, email);

        if entry.failures >= self.config.max_attempts {
            entry.banned_until = Some(now + self.config.ban);
            info!("Banned sign-ins for {} for {:?}", email, self.config.ban);
        }
    }

    pub async fn reset(&self, email: &str) {
        self.entries.lock().await.remove(&normalize_email(email));
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle(max_attempts: u32, ban: Duration) -> SignInThrottle {
        SignInThrottle::new(ThrottleConfig {
            max_attempts,
            window: Duration::from_secs(300),
            ban,
        })
    }

    #[tokio::test]
    async fn bans_after_max_failures() {
        let throttle = throttle(3, Duration::from_secs(60));

        for _ in 0..2 {
            throttle.record_failure("user@user.com").await;
            assert!(!throttle.is_banned("user@user.com").await);
        }
        throttle.record_failure("USER@user.com ").await;

        assert!(throttle.is_banned("user@user.com").await);
        assert!(!throttle.is_banned("admin@admin.com").await);
    }

    #[tokio::test]
    async fn success_clears_the_count() {
        let throttle = throttle(2, Duration::from_secs(60));

        throttle.record_failure("user@user.com").await;
        throttle.reset("user@user.com").await;
        throttle.record_failure("user@user.com").await;

        assert!(!throttle.is_banned("user@user.com").await);
    }

    #[tokio::test]
    async fn expired_entries_are_dropped() {
        let throttle = SignInThrottle::new(ThrottleConfig {
            max_attempts: 5,
            window: Duration::from_millis(10),
            ban: Duration::from_secs(60),
        });

        for i in 0..1000 {
            throttle.record_failure(&format!("user{i}@user.com")).await;
        }
        assert_eq!(throttle.tracked().await, 1000);

        tokio::time::sleep(Duration::from_millis(30)).await;
        throttle.record_failure("fresh@user.com").await;
        assert_eq!(throttle.tracked().await, 1);
    }

    #[tokio::test]
    async fn active_bans_survive_pruning() {
        let throttle = SignInThrottle::new(ThrottleConfig {
            max_attempts: 1,
            window: Duration::from_millis(10),
            ban: Duration::from_secs(60),
        });

        throttle.record_failure("user@user.com").await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        throttle.record_failure("other@user.com").await;

        assert!(throttle.is_banned("user@user.com").await);
    }

    #[tokio::test]
    async fn bans_expire() {
        let throttle = throttle(1, Duration::from_millis(20));

        throttle.record_failure("user@user.com").await;
        assert!(throttle.is_banned("user@user.com").await);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!throttle.is_banned("user@user.com").await);
    }
}
