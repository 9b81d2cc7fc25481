//! Payment ledger administration

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use booking_common::{
    error::DomainError,
    models::{PAYMENT_PAID, Payment, PaymentDetails, SessionProfile},
    policy::{Capability, authorize},
};
use tracing::info;
use uuid::Uuid;

use crate::{error::ApiResult, state::AppState};

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
) -> ApiResult<Json<Vec<PaymentDetails>>> {
    authorize(&session.user, Capability::ManagePayments)?;
    Ok(Json(state.payments.list_payments().await?))
}

/// Overwrite the payment status with `Paid`
pub async fn mark_paid(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Payment>> {
    authorize(&session.user, Capability::ManagePayments)?;

    let payment = state
        .payments
        .update_payment_status(id, PAYMENT_PAID)
        .await?
        .ok_or_else(|| DomainError::not_found("Payment"))?;

    info!("Payment {} marked paid by {}", id, session.user.id);
    Ok(Json(payment))
}
