//! In-process store implementing every repository trait
//!
//! All tables live behind one lock, so check-and-insert sequences are atomic
//! the same way the database's unique constraints make them atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    BOOKING_SLOT_CONSTRAINT, BookingStore, FacilityStore, PaymentStore, SessionStore,
    USER_EMAIL_CONSTRAINT, UserStore,
};
use crate::error::{DatabaseError, DatabaseResult};
use crate::models::{
    ADMIN_ROLE, Booking, BookingDetails, BookingFacility, BookingStatus, BookingUser,
    DEFAULT_ROLE, Facility, FacilityInput, NewBooking, NewUser, Payment, PaymentBooking,
    PaymentDetails, PaymentUser, Profile, Role, Session, SessionProfile, UpdateProfile, User,
};

/// Mirrors the `lower(email)` unique index
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[derive(Debug, Clone)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    role_ids: Vec<Uuid>,
}

#[derive(Debug, Default)]
struct Tables {
    roles: Vec<Role>,
    users: Vec<UserRow>,
    sessions: HashMap<String, Session>,
    facilities: Vec<Facility>,
    bookings: Vec<Booking>,
    payments: Vec<Payment>,
}

impl Tables {
    fn roles_of(&self, user: &UserRow) -> Vec<Role> {
        let mut roles: Vec<Role> = self
            .roles
            .iter()
            .filter(|role| user.role_ids.contains(&role.id))
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    fn profile(&self, user: &UserRow) -> Profile {
        Profile {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            roles: self.roles_of(user),
        }
    }

    fn user(&self, id: Uuid) -> Option<&UserRow> {
        self.users.iter().find(|user| user.id == id)
    }

    fn details(&self, booking: &Booking) -> Option<BookingDetails> {
        let facility = self.facilities.iter().find(|f| f.id == booking.facility_id)?;
        let user = self.user(booking.user_id)?;
        Some(BookingDetails {
            id: booking.id,
            date: booking.date,
            status: booking.status,
            facility: BookingFacility {
                id: facility.id,
                name: facility.name.clone(),
            },
            user: BookingUser {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
            },
        })
    }

    fn drop_bookings_where(&mut self, keep: impl Fn(&Booking) -> bool) {
        let removed: Vec<Uuid> = self
            .bookings
            .iter()
            .filter(|b| !keep(b))
            .map(|b| b.id)
            .collect();
        self.bookings.retain(|b| keep(b));
        self.payments.retain(|p| !removed.contains(&p.booking_id));
    }
}

/// Store keeping every table in memory
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with the `Admin` and `User` roles seeded
    pub fn new() -> Self {
        let tables = Tables {
            roles: [ADMIN_ROLE, DEFAULT_ROLE]
                .into_iter()
                .map(|name| Role {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                })
                .collect(),
            ..Default::default()
        };

        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> DatabaseResult<Profile> {
        let mut tables = self.tables.lock().await;

        if tables.users.iter().any(|u| same_email(&u.email, &new_user.email)) {
            return Err(DatabaseError::UniqueViolation(USER_EMAIL_CONSTRAINT.to_string()));
        }

        let role_ids = tables
            .roles
            .iter()
            .filter(|role| role.name == DEFAULT_ROLE)
            .map(|role| role.id)
            .collect();

        let row = UserRow {
            id: Uuid::new_v4(),
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            role_ids,
        };
        let profile = tables.profile(&row);
        tables.users.push(row);

        Ok(profile)
    }

    async fn list_users(&self) -> DatabaseResult<Vec<Profile>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().map(|u| tables.profile(u)).collect())
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| same_email(&u.email, email))
            .map(|u| User {
                id: u.id,
                email: u.email.clone(),
                name: u.name.clone(),
                password_hash: u.password_hash.clone(),
                roles: tables.roles_of(u),
            }))
    }

    async fn find_profile(&self, id: Uuid) -> DatabaseResult<Option<Profile>> {
        let tables = self.tables.lock().await;
        Ok(tables.user(id).map(|u| tables.profile(u)))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: UpdateProfile,
    ) -> DatabaseResult<Option<Profile>> {
        let mut tables = self.tables.lock().await;

        if let Some(email) = &changes.email {
            if tables.users.iter().any(|u| u.id != id && same_email(&u.email, email)) {
                return Err(DatabaseError::UniqueViolation(USER_EMAIL_CONSTRAINT.to_string()));
            }
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }

        let user = user.clone();
        Ok(Some(tables.profile(&user)))
    }

    async fn assign_role(&self, user_id: Uuid, role_name: &str) -> DatabaseResult<Option<Profile>> {
        let mut tables = self.tables.lock().await;

        let Some(role_id) = tables
            .roles
            .iter()
            .find(|role| role.name == role_name)
            .map(|role| role.id)
        else {
            return Ok(None);
        };

        let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) else {
            return Ok(None);
        };
        if !user.role_ids.contains(&role_id) {
            user.role_ids.push(role_id);
        }

        let user = user.clone();
        Ok(Some(tables.profile(&user)))
    }

    async fn delete_user(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().await;

        tables.sessions.retain(|_, session| session.user_id != id);
        tables.drop_bookings_where(|b| b.user_id != id);
        tables.payments.retain(|p| p.user_id != id);

        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        Ok(tables.users.len() < before)
    }

    async fn list_roles(&self) -> DatabaseResult<Vec<Role>> {
        let mut roles = self.tables.lock().await.roles.clone();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: &Session) -> DatabaseResult<()> {
        let mut tables = self.tables.lock().await;

        if tables.sessions.contains_key(&session.id) {
            return Err(DatabaseError::UniqueViolation("sessions_pkey".to_string()));
        }
        tables.sessions.insert(session.id.clone(), session.clone());

        Ok(())
    }

    async fn find_active(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<SessionProfile>> {
        let tables = self.tables.lock().await;

        let Some(session) = tables.sessions.get(id).filter(|s| s.is_active(now)) else {
            return Ok(None);
        };

        Ok(tables.user(session.user_id).map(|user| SessionProfile {
            id: session.id.clone(),
            active_until: session.active_until,
            user: tables.profile(user),
        }))
    }

    async fn extend_session(&self, id: &str, active_until: DateTime<Utc>) -> DatabaseResult<()> {
        if let Some(session) = self.tables.lock().await.sessions.get_mut(id) {
            session.active_until = active_until;
        }
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> DatabaseResult<bool> {
        Ok(self.tables.lock().await.sessions.remove(id).is_some())
    }
}

#[async_trait]
impl FacilityStore for MemoryStore {
    async fn create_facility(&self, input: FacilityInput) -> DatabaseResult<Facility> {
        let facility = Facility {
            id: Uuid::new_v4(),
            name: input.name,
            kind: input.kind,
            location: input.location,
        };
        self.tables.lock().await.facilities.push(facility.clone());
        Ok(facility)
    }

    async fn list_facilities(&self) -> DatabaseResult<Vec<Facility>> {
        let mut facilities = self.tables.lock().await.facilities.clone();
        facilities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(facilities)
    }

    async fn find_facility(&self, id: Uuid) -> DatabaseResult<Option<Facility>> {
        let tables = self.tables.lock().await;
        Ok(tables.facilities.iter().find(|f| f.id == id).cloned())
    }

    async fn update_facility(
        &self,
        id: Uuid,
        input: FacilityInput,
    ) -> DatabaseResult<Option<Facility>> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .facilities
            .iter_mut()
            .find(|f| f.id == id)
            .map(|facility| {
                facility.name = input.name;
                facility.kind = input.kind;
                facility.location = input.location;
                facility.clone()
            }))
    }

    async fn delete_facility(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.facilities.len();
        tables.facilities.retain(|f| f.id != id);
        tables.drop_bookings_where(|b| b.facility_id != id);
        Ok(tables.facilities.len() < before)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, booking: NewBooking) -> DatabaseResult<BookingDetails> {
        let mut tables = self.tables.lock().await;

        let taken = tables.bookings.iter().any(|b| {
            b.facility_id == booking.facility_id && b.date == booking.date && b.status.holds_slot()
        });
        if taken {
            return Err(DatabaseError::UniqueViolation(BOOKING_SLOT_CONSTRAINT.to_string()));
        }

        let row = Booking {
            id: Uuid::new_v4(),
            user_id: booking.user_id,
            facility_id: booking.facility_id,
            date: booking.date,
            status: BookingStatus::Pending,
        };

        // Mirrors the foreign keys: both parents must exist
        let details = tables.details(&row).ok_or_else(|| {
            DatabaseError::Query(sqlx::Error::Protocol(
                "booking references a missing facility or user".to_string(),
            ))
        })?;
        tables.bookings.push(row);

        Ok(details)
    }

    async fn bookings_for_facility(
        &self,
        facility_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Booking>> {
        let tables = self.tables.lock().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|b| b.facility_id == facility_id && b.date >= from && b.date < until)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.date);
        Ok(bookings)
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<BookingDetails>> {
        let tables = self.tables.lock().await;
        let mut bookings: Vec<BookingDetails> = tables
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .filter_map(|b| tables.details(b))
            .collect();
        bookings.sort_by_key(|b| b.date);
        Ok(bookings)
    }

    async fn find_booking(&self, id: Uuid) -> DatabaseResult<Option<Booking>> {
        let tables = self.tables.lock().await;
        Ok(tables.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> DatabaseResult<Option<Booking>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.bookings.iter_mut().find(|b| b.id == id).map(|booking| {
            booking.status = status;
            booking.clone()
        }))
    }

    async fn delete_booking(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.bookings.len();
        tables.drop_bookings_where(|b| b.id != id);
        Ok(tables.bookings.len() < before)
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn insert_payment(&self, payment: &Payment) -> DatabaseResult<()> {
        self.tables.lock().await.payments.push(payment.clone());
        Ok(())
    }

    async fn list_payments(&self) -> DatabaseResult<Vec<PaymentDetails>> {
        let tables = self.tables.lock().await;
        let mut payments: Vec<PaymentDetails> = tables
            .payments
            .iter()
            .filter_map(|p| {
                let user = tables.user(p.user_id)?;
                let booking = tables.bookings.iter().find(|b| b.id == p.booking_id)?;
                let facility = tables.facilities.iter().find(|f| f.id == booking.facility_id)?;
                Some(PaymentDetails {
                    id: p.id,
                    amount: p.amount,
                    status: p.status.clone(),
                    created_at: p.created_at,
                    user: PaymentUser {
                        id: user.id,
                        email: user.email.clone(),
                    },
                    booking: PaymentBooking {
                        id: booking.id,
                        date: booking.date,
                        facility_name: facility.name.clone(),
                    },
                })
            })
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        status: &str,
    ) -> DatabaseResult<Option<Payment>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.payments.iter_mut().find(|p| p.id == id).map(|payment| {
            payment.status = status.to_string();
            payment.clone()
        }))
    }
}
