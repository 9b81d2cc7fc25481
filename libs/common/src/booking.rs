//! Booking creation and lifecycle

use chrono::{DateTime, Offset, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DatabaseError, DomainError, DomainResult};
use crate::models::{Booking, BookingDetails, BookingStatus, NewBooking, Profile};
use crate::policy::{Capability, authorize};
use crate::repositories::{BOOKING_SLOT_CONSTRAINT, BookingStore, FacilityStore};
use crate::slots::{day_window, ensure_hour_aligned, is_slot_booked, slot_has_ended};

const SLOT_TAKEN: &str = "This slot is already booked";

/// Booking operations on top of the booking and facility stores
#[derive(Clone)]
pub struct BookingService {
    bookings: Arc<dyn BookingStore>,
    facilities: Arc<dyn FacilityStore>,
}

impl BookingService {
    pub fn new(bookings: Arc<dyn BookingStore>, facilities: Arc<dyn FacilityStore>) -> Self {
        Self {
            bookings,
            facilities,
        }
    }

    /// Book the slot starting at `slot_start` for `user_id`
    ///
    /// The pre-check only produces the friendly error early; the store's
    /// uniqueness guarantee decides races between concurrent requests.
    pub async fn create_booking(
        &self,
        facility_id: Uuid,
        user_id: Uuid,
        slot_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<BookingDetails> {
        ensure_hour_aligned(slot_start)?;
        if slot_has_ended(slot_start, now) {
            return Err(DomainError::invalid("date", "This slot is in the past"));
        }

        if self.facilities.find_facility(facility_id).await?.is_none() {
            return Err(DomainError::not_found("Facility"));
        }

        let (from, until) = day_window(slot_start.date_naive(), Utc.fix());
        let existing = self
            .bookings
            .bookings_for_facility(facility_id, from, until)
            .await?;
        if is_slot_booked(&existing, facility_id, slot_start) {
            return Err(DomainError::Conflict(SLOT_TAKEN.to_string()));
        }

        let booking = self
            .bookings
            .insert_booking(NewBooking {
                user_id,
                facility_id,
                date: slot_start,
            })
            .await
            .map_err(|err| match err {
                DatabaseError::UniqueViolation(constraint)
                    if constraint == BOOKING_SLOT_CONSTRAINT =>
                {
                    warn!("Lost the race for facility {} at {}", facility_id, slot_start);
                    DomainError::Conflict(SLOT_TAKEN.to_string())
                }
                other => DomainError::Database(other),
            })?;

        info!(
            "Booking {} created for facility {} at {}",
            booking.id, facility_id, slot_start
        );
        Ok(booking)
    }

    /// Move a booking along its lifecycle
    pub async fn update_booking_status(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
    ) -> DomainResult<Booking> {
        let booking = self
            .bookings
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking"))?;

        if !booking.status.can_transition_to(new_status) {
            return Err(DomainError::Conflict(format!(
                "A {} booking cannot become {}",
                booking.status, new_status
            )));
        }

        let updated = self
            .bookings
            .update_booking_status(booking_id, new_status)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking"))?;

        info!("Booking {} is now {}", booking_id, new_status);
        Ok(updated)
    }

    pub async fn bookings_for_user(&self, user_id: Uuid) -> DomainResult<Vec<BookingDetails>> {
        Ok(self.bookings.bookings_for_user(user_id).await?)
    }

    /// Owners may delete their own bookings, anyone else needs `ManageBookings`
    pub async fn delete_booking(&self, caller: &Profile, booking_id: Uuid) -> DomainResult<()> {
        let booking = self
            .bookings
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking"))?;

        if booking.user_id != caller.id {
            authorize(caller, Capability::ManageBookings)?;
        }

        if !self.bookings.delete_booking(booking_id).await? {
            return Err(DomainError::not_found("Booking"));
        }

        info!("Booking {} deleted by {}", booking_id, caller.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ADMIN_ROLE, FacilityInput, NewUser};
    use crate::repositories::{MemoryStore, UserStore};
    use chrono::{Duration, TimeZone};

    struct Fixture {
        store: MemoryStore,
        service: BookingService,
        facility_id: Uuid,
        owner: Profile,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let service = BookingService::new(Arc::new(store.clone()), Arc::new(store.clone()));
        let facility = store
            .create_facility(FacilityInput {
                name: "Gym".to_string(),
                kind: "Gym".to_string(),
                location: "Building A".to_string(),
            })
            .await
            .unwrap();
        let owner = user(&store, "owner@example.com").await;

        Fixture {
            store,
            service,
            facility_id: facility.id,
            owner,
        }
    }

    async fn user(store: &MemoryStore, email: &str) -> Profile {
        store
            .create_user(NewUser {
                email: email.to_string(),
                name: "Someone".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    fn ten_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
    }

    fn early_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn second_booking_of_a_slot_conflicts() {
        let f = fixture().await;

        let first = f
            .service
            .create_booking(f.facility_id, f.owner.id, ten_am(), early_morning())
            .await
            .unwrap();
        assert_eq!(first.status, BookingStatus::Pending);
        assert_eq!(first.date, ten_am());
        assert_eq!(first.facility.id, f.facility_id);

        let other = user(&f.store, "other@example.com").await;
        let err = f
            .service
            .create_booking(f.facility_id, other.id, ten_am(), early_morning())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // Neighbouring hour is still free
        f.service
            .create_booking(f.facility_id, other.id, ten_am() + Duration::hours(1), early_morning())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn concurrent_requests_book_the_slot_once() {
        let f = fixture().await;
        let other = user(&f.store, "other@example.com").await;

        let (facility_id, owner_id) = (f.facility_id, f.owner.id);
        let a = f.service.clone();
        let b = f.service.clone();
        let (first, second) = tokio::join!(
            tokio::spawn(async move {
                a.create_booking(facility_id, owner_id, ten_am(), early_morning()).await
            }),
            tokio::spawn(async move {
                b.create_booking(facility_id, other.id, ten_am(), early_morning()).await
            }),
        );
        let results = [first.unwrap(), second.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(DomainError::Conflict(_))))
        );
    }

    #[tokio::test]
    async fn rejects_misaligned_ended_or_unknown() {
        let f = fixture().await;

        let half_past = ten_am() + Duration::minutes(30);
        let err = f
            .service
            .create_booking(f.facility_id, f.owner.id, half_past, early_morning())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let after_slot = ten_am() + Duration::hours(1);
        let err = f
            .service
            .create_booking(f.facility_id, f.owner.id, ten_am(), after_slot)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = f
            .service
            .create_booking(Uuid::new_v4(), f.owner.id, ten_am(), early_morning())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn status_follows_the_lifecycle() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.facility_id, f.owner.id, ten_am(), early_morning())
            .await
            .unwrap();

        let err = f
            .service
            .update_booking_status(booking.id, BookingStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let confirmed = f
            .service
            .update_booking_status(booking.id, BookingStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        let paid = f
            .service
            .update_booking_status(booking.id, BookingStatus::Paid)
            .await
            .unwrap();
        assert_eq!(paid.status, BookingStatus::Paid);

        let err = f
            .service
            .update_booking_status(booking.id, BookingStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let err = f
            .service
            .update_booking_status(Uuid::new_v4(), BookingStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn cancelling_frees_the_slot() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.facility_id, f.owner.id, ten_am(), early_morning())
            .await
            .unwrap();
        f.service
            .update_booking_status(booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        f.service
            .create_booking(f.facility_id, f.owner.id, ten_am(), early_morning())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn only_owners_and_admins_delete_bookings() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.facility_id, f.owner.id, ten_am(), early_morning())
            .await
            .unwrap();

        let stranger = user(&f.store, "stranger@example.com").await;
        let err = f.service.delete_booking(&stranger, booking.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(Capability::ManageBookings)));

        let admin = user(&f.store, "admin@example.com").await;
        let admin = f.store.assign_role(admin.id, ADMIN_ROLE).await.unwrap().unwrap();
        f.service.delete_booking(&admin, booking.id).await.unwrap();
        assert!(f.service.bookings_for_user(f.owner.id).await.unwrap().is_empty());

        let own = f
            .service
            .create_booking(f.facility_id, f.owner.id, ten_am(), early_morning())
            .await
            .unwrap();
        f.service.delete_booking(&f.owner, own.id).await.unwrap();

        let err = f.service.delete_booking(&f.owner, own.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
