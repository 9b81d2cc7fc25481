//! Payment ledger model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PAYMENT_PAID: &str = "Paid";

/// Payment row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub booking_id: Uuid,
    pub amount: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBooking {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub facility_name: String,
}

/// Payment with payer and booked slot, as listed for administrators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub id: Uuid,
    pub amount: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub user: PaymentUser,
    pub booking: PaymentBooking,
}
