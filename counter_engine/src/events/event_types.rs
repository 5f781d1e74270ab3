use serde::Serialize;
use serde_json::Value;

use crate::{
    db_types::{Order, OrderStatusType},
    order_objects::QueueEntry,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderUpdatedEvent {
    pub order: Order,
    #[serde(skip)]
    pub previous_status: OrderStatusType,
}

impl OrderUpdatedEvent {
    pub fn new(order: Order, previous_status: OrderStatusType) -> Self {
        Self { order, previous_status }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueUpdatedEvent {
    pub queue: Vec<QueueEntry>,
}

impl QueueUpdatedEvent {
    pub fn new(queue: Vec<QueueEntry>) -> Self {
        Self { queue }
    }
}

/// Raised when a cancelled order's payment could not be refunded at the payment provider. The local payment record
/// has been marked as refunded regardless, so someone needs to issue the refund by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundFailedEvent {
    pub order_id: i64,
    pub order_number: i64,
    pub reference: String,
    pub reason: String,
}

/// The events published on the live-update channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    OrderUpdated(OrderUpdatedEvent),
    QueueUpdated(QueueUpdatedEvent),
}

impl EventType {
    /// The stable channel name of the event
    pub fn name(&self) -> &'static str {
        match self {
            EventType::OrderCreated(_) => "order:created",
            EventType::OrderUpdated(_) => "order:updated",
            EventType::QueueUpdated(_) => "queue:updated",
        }
    }

    /// The JSON body sent to viewers: `{"order": ...}` for order events, `{"queue": [...]}` for the queue.
    pub fn payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            EventType::OrderCreated(ev) => serde_json::to_value(ev),
            EventType::OrderUpdated(ev) => serde_json::to_value(ev),
            EventType::QueueUpdated(ev) => serde_json::to_value(ev),
        }
    }
}

impl From<OrderCreatedEvent> for EventType {
    fn from(ev: OrderCreatedEvent) -> Self {
        EventType::OrderCreated(ev)
    }
}

impl From<OrderUpdatedEvent> for EventType {
    fn from(ev: OrderUpdatedEvent) -> Self {
        EventType::OrderUpdated(ev)
    }
}

impl From<QueueUpdatedEvent> for EventType {
    fn from(ev: QueueUpdatedEvent) -> Self {
        EventType::QueueUpdated(ev)
    }
}
