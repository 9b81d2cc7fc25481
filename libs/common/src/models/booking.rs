//! Booking model and its status lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Booking status.
///
/// `Pending -> Confirmed | Cancelled`, `Confirmed -> Paid | Cancelled`;
/// `Paid` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Paid,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Paid => "Paid",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Paid)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Paid | BookingStatus::Cancelled)
    }

    /// Cancelled bookings release their slot
    pub fn holds_slot(self) -> bool {
        self != BookingStatus::Cancelled
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "Paid" => Ok(BookingStatus::Paid),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// Booking row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub facility_id: Uuid,
    /// UTC start of the one-hour slot
    pub date: DateTime<Utc>,
    pub status: BookingStatus,
}

/// Insert payload; the store assigns id and `Pending` status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub facility_id: Uuid,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFacility {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Booking with the facility and user it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub status: BookingStatus,
    pub facility: BookingFacility,
    pub user: BookingUser,
}

impl BookingDetails {
    pub fn booking(&self) -> Booking {
        Booking {
            id: self.id,
            user_id: self.user.id,
            facility_id: self.facility.id,
            date: self.date,
            status: self.status,
        }
    }
}
