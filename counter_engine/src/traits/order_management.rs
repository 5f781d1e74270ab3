use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{NewOrder, NewPaymentRecord, Order, OrderStats, OrderStatusType, PaymentRecord, PaymentStatus},
    order_objects::OrderQueryFilter,
};

/// The durable order store.
///
/// Orders are never deleted. Their line items are immutable once written, and the only mutations after creation are
/// status changes and payment status changes.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a new order and its payment and, in a single atomic transaction,
    /// * reserves the next order number,
    /// * stores the order with status `pending` and its total derived from the line items,
    /// * stores every line item, in the given order,
    /// * stores the payment record, with its amount copied from the order total.
    ///
    /// Either everything is committed, or nothing is. A failed creation does not consume an order number.
    async fn insert_order_with_payment(
        &self,
        order: NewOrder,
        payment: NewPaymentRecord,
    ) -> Result<Order, OrderStoreError>;

    /// Reserves and returns the next order number. Concurrent callers always receive distinct, strictly increasing
    /// numbers. Numbers reserved through this call and never used leave a gap in the sequence.
    async fn next_order_number(&self) -> Result<i64, OrderStoreError>;

    /// Fetches the order, including its line items.
    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, OrderStoreError>;

    async fn fetch_order_by_number(&self, order_number: i64) -> Result<Option<Order>, OrderStoreError>;

    /// Fetches the orders matching `query`, including their line items, oldest first. Orders created at the same
    /// instant are ordered by order number.
    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;

    /// Changes the status of the order to `new_status`, but only if it still has status `expected`.
    ///
    /// * Moving to `served` records the time of service.
    /// * Moving to `cancelled` records the cancellation reason, if one is given.
    ///
    /// Returns the updated order, or `None` if the order does not exist or its status is no longer `expected`. No
    /// rules about which transitions are legal are applied here.
    async fn update_order_status(
        &self,
        id: i64,
        expected: OrderStatusType,
        new_status: OrderStatusType,
        reason: Option<String>,
    ) -> Result<Option<Order>, OrderStoreError>;

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<PaymentRecord>, OrderStoreError>;

    /// Sets the status of the payment record for the order. Refunded payment records are final and are never changed;
    /// in that case (or if there is no payment record) `None` is returned.
    async fn update_payment_status_for_order(
        &self,
        order_id: i64,
        status: PaymentStatus,
    ) -> Result<Option<PaymentRecord>, OrderStoreError>;

    /// Aggregates the orders created in the half-open interval `[since, until)`.
    async fn fetch_order_stats(&self, since: DateTime<Utc>, until: DateTime<Utc>)
        -> Result<OrderStats, OrderStoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cannot store an invalid order: {0}")]
    InvalidOrder(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}
