use chrono::Utc;
use log::{debug, warn};
use sqlx::SqliteConnection;

use crate::db_types::{Cents, NewPaymentRecord, PaymentRecord, PaymentStatus};

/// Stores the payment record for an order. The amount is taken from the caller (the stored order total), never from
/// the payment request.
pub async fn insert_payment(
    order_id: i64,
    amount: Cents,
    payment: NewPaymentRecord,
    conn: &mut SqliteConnection,
) -> Result<PaymentRecord, sqlx::Error> {
    let now = Utc::now();
    let record: PaymentRecord = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, amount, method, transaction_ref, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(amount)
    .bind(payment.method)
    .bind(payment.transaction_ref)
    .bind(payment.status)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Payment record {} ({}, {}) saved for order {order_id}", record.id, record.method, record.amount);
    Ok(record)
}

pub async fn fetch_payment_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, sqlx::Error> {
    let record = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

/// Updates the payment status for the order. Refunded records are never touched.
pub async fn update_payment_status_for_order(
    order_id: i64,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, sqlx::Error> {
    let record: Option<PaymentRecord> = sqlx::query_as(
        r#"
            UPDATE payments SET status = $1, updated_at = $2
            WHERE order_id = $3 AND status != 'refunded'
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(Utc::now())
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    match &record {
        Some(r) => debug!("🗃️ Payment record {} for order {order_id} is now {status}", r.id),
        None => warn!("🗃️ No updatable payment record for order {order_id}. Status {status} was not applied."),
    }
    Ok(record)
}
