use chrono::{DateTime, Duration, Utc};
use counter_common::Cents;
use serde::{Deserialize, Serialize, Serializer};

use crate::db_types::{Order, OrderStatusType, PaymentMethod};

//--------------------------------------   OrderQueryFilter    ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub customer_id: Option<String>,
    pub order_number: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub statuses: Vec<OrderStatusType>,
    pub limit: Option<i64>,
}

impl OrderQueryFilter {
    pub fn with_customer_id<S: Into<String>>(mut self, customer_id: S) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_order_number(mut self, order_number: i64) -> Self {
        self.order_number = Some(order_number);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.statuses.push(status);
        self
    }

    /// Only orders that currently hold a place in the queue.
    pub fn active() -> Self {
        let statuses = OrderStatusType::ALL.into_iter().filter(OrderStatusType::is_active).collect();
        Self { statuses, ..Default::default() }
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() &&
            self.order_number.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.statuses.is_empty()
    }
}

//--------------------------------------   NewOrderRequest     ---------------------------------------------------------
/// A single requested line. Either name a catalog item by id, or give the name, quantity and unit price in full.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub menu_item_id: Option<i64>,
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<Cents>,
}

impl OrderItemRequest {
    /// One of the catalog item with the given id. Use [`Self::with_quantity`] to order more.
    pub fn catalog(menu_item_id: i64) -> Self {
        Self { menu_item_id: Some(menu_item_id), ..Default::default() }
    }

    pub fn manual<S: Into<String>>(name: S, quantity: i64, unit_price: Cents) -> Self {
        Self { menu_item_id: None, name: Some(name.into()), quantity: Some(quantity), unit_price: Some(unit_price) }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    /// Anonymous orders are allowed. Only orders with a customer receive notifications.
    pub customer_id: Option<String>,
    pub items: Vec<OrderItemRequest>,
    /// The payment provider's reference for the customer's payment. Required unless payment verification is skipped.
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl NewOrderRequest {
    pub fn new(items: Vec<OrderItemRequest>) -> Self {
        Self { items, ..Default::default() }
    }

    pub fn for_customer<S: Into<String>>(mut self, customer_id: S) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_payment_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.payment_reference = Some(reference.into());
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }
}

//--------------------------------------    Queue positions    ---------------------------------------------------------
pub fn serialize_minutes<S: Serializer>(wait: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(wait.num_minutes())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePosition {
    /// 1-based place in the queue
    pub position: usize,
    #[serde(serialize_with = "serialize_minutes")]
    pub estimated_wait: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub order: Order,
    pub position: usize,
    #[serde(serialize_with = "serialize_minutes")]
    pub estimated_wait: Duration,
}

impl QueueEntry {
    pub fn queue_position(&self) -> QueuePosition {
        QueuePosition { position: self.position, estimated_wait: self.estimated_wait }
    }
}

/// An order, together with its live place in the queue. The position is `None` for orders that are not queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedOrder {
    pub order: Order,
    pub queue_position: Option<QueuePosition>,
}

//--------------------------------------    Status changes     ---------------------------------------------------------
/// What happened to the customer's money as a consequence of a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Compensation {
    /// The status change has no financial consequence.
    None,
    /// The payment record was marked as valid on service.
    PaymentValidated,
    /// There was no provider payment to refund (a cash payment, or a test placeholder reference).
    RefundSkipped,
    /// The provider accepted the refund.
    Refunded { status: String },
    /// The provider refund failed. The local payment record is still marked as refunded, and the failure needs
    /// operator attention.
    RefundFailed { reference: String, reason: String },
}

impl Compensation {
    pub fn is_refund_failure(&self) -> bool {
        matches!(self, Compensation::RefundFailed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub order: Order,
    pub previous_status: OrderStatusType,
    pub compensation: Compensation,
}

//--------------------------------------       Payments        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub status: String,
    pub is_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub status: String,
}
