//! One-hour slot arithmetic
//!
//! Bookings are stored as the UTC start of their slot. Local time only shows
//! up when a viewer asks for the availability of a calendar day.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::Serialize;
use std::ops::RangeInclusive;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::Booking;

/// Local start hours offered each day, 07:00 through 21:00
pub const SLOT_HOURS: RangeInclusive<u32> = 7..=21;

pub fn slot_length() -> Duration {
    Duration::hours(1)
}

/// One slot of a viewer's day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    /// Local start hour
    pub hour: u32,
    /// UTC start instant
    pub start: DateTime<Utc>,
    pub booked: bool,
    pub available: bool,
}

/// True iff a booking holding the slot exists for the facility at the same
/// UTC hour of the same UTC day as `candidate`
pub fn is_slot_booked(existing: &[Booking], facility_id: Uuid, candidate: DateTime<Utc>) -> bool {
    existing.iter().any(|booking| {
        booking.facility_id == facility_id
            && booking.status.holds_slot()
            && booking.date.date_naive() == candidate.date_naive()
            && booking.date.hour() == candidate.hour()
    })
}

/// Viewer offset from a minute count; must be a whole number of hours
pub fn offset_from_minutes(minutes: i32) -> DomainResult<FixedOffset> {
    if minutes % 60 != 0 {
        return Err(DomainError::invalid(
            "utcOffsetMinutes",
            "The UTC offset must be a whole number of hours",
        ));
    }

    FixedOffset::east_opt(minutes * 60)
        .ok_or_else(|| DomainError::invalid("utcOffsetMinutes", "The UTC offset is out of range"))
}

/// UTC bounds `[from, until)` of a local calendar day
pub fn day_window(day: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = local_instant(day, NaiveTime::MIN, offset);
    (from, from + Duration::days(1))
}

pub fn ensure_hour_aligned(slot_start: DateTime<Utc>) -> DomainResult<()> {
    if slot_start.minute() != 0 || slot_start.second() != 0 || slot_start.nanosecond() != 0 {
        return Err(DomainError::invalid(
            "date",
            "Bookings must start on the hour",
        ));
    }
    Ok(())
}

pub fn slot_has_ended(slot_start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    slot_start + slot_length() <= now
}

/// Availability of every slot of `day` as seen from `offset`
///
/// Days before the viewer's current day are rejected.
pub fn day_slots(
    day: NaiveDate,
    offset: FixedOffset,
    existing: &[Booking],
    facility_id: Uuid,
    now: DateTime<Utc>,
) -> DomainResult<Vec<SlotAvailability>> {
    let today = now.with_timezone(&offset).date_naive();
    if day < today {
        return Err(DomainError::invalid("date", "Cannot show slots for a past day"));
    }

    let slots = SLOT_HOURS
        .map(|hour| {
            let start = local_instant(day, NaiveTime::MIN + Duration::hours(hour.into()), offset);
            let booked = is_slot_booked(existing, facility_id, start);
            SlotAvailability {
                hour,
                start,
                booked,
                available: !booked && !slot_has_ended(start, now),
            }
        })
        .collect();

    Ok(slots)
}

fn local_instant(day: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(day.and_time(time) - offset))
}
