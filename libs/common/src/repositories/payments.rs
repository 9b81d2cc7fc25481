//! Payment repository for database operations

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::PaymentStore;
use crate::error::DatabaseResult;
use crate::models::{Payment, PaymentBooking, PaymentDetails, PaymentUser};

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn payment_from_row(row: &PgRow) -> Payment {
    Payment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        booking_id: row.get("booking_id"),
        amount: row.get("amount"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl PaymentStore for PaymentRepository {
    async fn insert_payment(&self, payment: &Payment) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, user_id, booking_id, amount, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(payment.id)
        .bind(payment.user_id)
        .bind(payment.booking_id)
        .bind(payment.amount)
        .bind(&payment.status)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_payments(&self) -> DatabaseResult<Vec<PaymentDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.amount, p.status, p.created_at,
                   u.id AS user_id, u.email AS user_email,
                   b.id AS booking_id, b.date AS booking_date,
                   f.name AS facility_name
            FROM payments p
            JOIN users u ON u.id = p.user_id
            JOIN bookings b ON b.id = p.booking_id
            JOIN facilities f ON f.id = b.facility_id
            ORDER BY p.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let payments = rows
            .into_iter()
            .map(|row| PaymentDetails {
                id: row.get("id"),
                amount: row.get("amount"),
                status: row.get("status"),
                created_at: row.get("created_at"),
                user: PaymentUser {
                    id: row.get("user_id"),
                    email: row.get("user_email"),
                },
                booking: PaymentBooking {
                    id: row.get("booking_id"),
                    date: row.get("booking_date"),
                    facility_name: row.get("facility_name"),
                },
            })
            .collect();

        Ok(payments)
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        status: &str,
    ) -> DatabaseResult<Option<Payment>> {
        let row = sqlx::query(
            r#"
            UPDATE payments
            SET status = $2
            WHERE id = $1
            RETURNING id, user_id, booking_id, amount, status, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(payment_from_row))
    }
}
