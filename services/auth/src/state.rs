//! Application state shared across handlers

use booking_common::{
    config::Settings,
    repositories::{SessionStore, UserStore},
    session::{SessionMediator, SessionPolicy},
};
use std::sync::Arc;

use crate::rate_limiter::{SignInThrottle, ThrottleConfig};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionMediator,
    pub throttle: SignInThrottle,
    pub settings: Settings,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        session_store: Arc<dyn SessionStore>,
        settings: Settings,
    ) -> Self {
        Self {
            users,
            sessions: SessionMediator::new(session_store, SessionPolicy::from_settings(&settings)),
            throttle: SignInThrottle::new(ThrottleConfig::from_settings(&settings)),
            settings,
        }
    }
}
