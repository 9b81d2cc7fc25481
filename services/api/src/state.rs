//! Application state shared across handlers

use booking_common::{
    booking::BookingService,
    config::Settings,
    repositories::{
        BookingRepository, BookingStore, FacilityRepository, FacilityStore, MemoryStore,
        PaymentRepository, PaymentStore, SessionRepository, SessionStore, UserRepository,
        UserStore,
    },
    session::{SessionMediator, SessionPolicy},
};
use sqlx::PgPool;
use std::sync::Arc;

/// Store handles the handlers work against
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub facilities: Arc<dyn FacilityStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub payments: Arc<dyn PaymentStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            sessions: Arc::new(SessionRepository::new(pool.clone())),
            facilities: Arc::new(FacilityRepository::new(pool.clone())),
            bookings: Arc::new(BookingRepository::new(pool.clone())),
            payments: Arc::new(PaymentRepository::new(pool)),
        }
    }

    /// Every store backed by one in-process store
    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            sessions: store.clone(),
            facilities: store.clone(),
            bookings: store.clone(),
            payments: store,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub facilities: Arc<dyn FacilityStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub booking_service: BookingService,
    pub sessions: SessionMediator,
    pub settings: Settings,
}

impl AppState {
    pub fn new(stores: Stores, settings: Settings) -> Self {
        Self {
            booking_service: BookingService::new(stores.bookings.clone(), stores.facilities.clone()),
            sessions: SessionMediator::new(stores.sessions, SessionPolicy::from_settings(&settings)),
            users: stores.users,
            facilities: stores.facilities,
            bookings: stores.bookings,
            payments: stores.payments,
            settings,
        }
    }
}
