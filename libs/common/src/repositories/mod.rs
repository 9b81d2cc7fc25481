//! Store seams for the relational data
//!
//! Every table family sits behind an `async_trait` so the services can hold
//! `Arc<dyn …>` handles. The PostgreSQL repositories are the production
//! implementation; [`memory::MemoryStore`] backs tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DatabaseResult;
use crate::models::{
    Booking, BookingDetails, BookingStatus, Facility, FacilityInput, NewBooking, NewUser,
    Payment, PaymentDetails, Profile, Role, Session, SessionProfile, UpdateProfile, User,
};

pub mod bookings;
pub mod facilities;
pub mod memory;
pub mod payments;
pub mod sessions;
pub mod users;

pub use bookings::BookingRepository;
pub use facilities::FacilityRepository;
pub use memory::MemoryStore;
pub use payments::PaymentRepository;
pub use sessions::SessionRepository;
pub use users::UserRepository;

/// Name of the unique constraint guarding `(facility_id, date)`
pub const BOOKING_SLOT_CONSTRAINT: &str = "bookings_facility_slot_key";

/// Name of the unique constraint on user emails
pub const USER_EMAIL_CONSTRAINT: &str = "users_email_key";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user holding the default role
    async fn create_user(&self, new_user: NewUser) -> DatabaseResult<Profile>;

    async fn list_users(&self) -> DatabaseResult<Vec<Profile>>;

    /// Includes the password hash; never hand the result to a client
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn find_profile(&self, id: Uuid) -> DatabaseResult<Option<Profile>>;

    async fn update_profile(
        &self,
        id: Uuid,
        changes: UpdateProfile,
    ) -> DatabaseResult<Option<Profile>>;

    /// Link a role by name. `Ok(None)` when either the user or the role is
    /// missing; linking an already held role leaves the profile unchanged.
    async fn assign_role(&self, user_id: Uuid, role_name: &str) -> DatabaseResult<Option<Profile>>;

    /// Delete sessions, bookings and role links, then the user
    async fn delete_user(&self, id: Uuid) -> DatabaseResult<bool>;

    async fn list_roles(&self) -> DatabaseResult<Vec<Role>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> DatabaseResult<()>;

    /// Look up a session whose `active_until` is strictly after `now`
    async fn find_active(&self, id: &str, now: DateTime<Utc>)
    -> DatabaseResult<Option<SessionProfile>>;

    async fn extend_session(&self, id: &str, active_until: DateTime<Utc>) -> DatabaseResult<()>;

    /// Returns whether a row was removed
    async fn delete_session(&self, id: &str) -> DatabaseResult<bool>;
}

#[async_trait]
pub trait FacilityStore: Send + Sync {
    async fn create_facility(&self, input: FacilityInput) -> DatabaseResult<Facility>;

    async fn list_facilities(&self) -> DatabaseResult<Vec<Facility>>;

    async fn find_facility(&self, id: Uuid) -> DatabaseResult<Option<Facility>>;

    async fn update_facility(
        &self,
        id: Uuid,
        input: FacilityInput,
    ) -> DatabaseResult<Option<Facility>>;

    /// Deletes the facility and its bookings
    async fn delete_facility(&self, id: Uuid) -> DatabaseResult<bool>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Atomic insert-or-reject. A slot already held by a non-cancelled
    /// booking yields `DatabaseError::UniqueViolation(BOOKING_SLOT_CONSTRAINT)`.
    async fn insert_booking(&self, booking: NewBooking) -> DatabaseResult<BookingDetails>;

    /// Bookings of a facility with `from <= date < until`
    async fn bookings_for_facility(
        &self,
        facility_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Booking>>;

    async fn bookings_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<BookingDetails>>;

    async fn find_booking(&self, id: Uuid) -> DatabaseResult<Option<Booking>>;

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> DatabaseResult<Option<Booking>>;

    async fn delete_booking(&self, id: Uuid) -> DatabaseResult<bool>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert_payment(&self, payment: &Payment) -> DatabaseResult<()>;

    async fn list_payments(&self) -> DatabaseResult<Vec<PaymentDetails>>;

    async fn update_payment_status(&self, id: Uuid, status: &str)
    -> DatabaseResult<Option<Payment>>;
}
