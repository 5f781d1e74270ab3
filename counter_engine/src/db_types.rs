//! Data types that are persisted by the order store, along with the derived types used to enrich them.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use counter_common::Cents;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed and paid for, and is waiting for the kitchen.
    Pending,
    /// The kitchen is working on the order.
    Preparing,
    /// The order is at the pass, waiting for the customer to collect it.
    Ready,
    /// The order is ready, but the customer has not shown up yet.
    CustomerLate,
    /// The customer collected the order.
    Served,
    /// The order was cancelled by staff. The payment is refunded.
    Cancelled,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 6] = [
        OrderStatusType::Pending,
        OrderStatusType::Preparing,
        OrderStatusType::Ready,
        OrderStatusType::CustomerLate,
        OrderStatusType::Served,
        OrderStatusType::Cancelled,
    ];

    /// The statuses that an order in this status may move to. Terminal statuses return an empty slice.
    pub fn allowed_transitions(&self) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match self {
            Pending => &[Preparing, Cancelled],
            Preparing => &[Ready, Cancelled],
            Ready => &[Served, CustomerLate, Cancelled],
            CustomerLate => &[Served, Cancelled],
            Served | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatusType) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Active orders occupy a place in the queue.
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatusType::Pending | OrderStatusType::Preparing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Preparing => "preparing",
            OrderStatusType::Ready => "ready",
            OrderStatusType::CustomerLate => "customer_late",
            OrderStatusType::Served => "served",
            OrderStatusType::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| ConversionError(format!("Invalid order status: {s}")))
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------      OrderItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// The catalog entry this line was resolved from. Manual lines have none.
    pub menu_item_id: Option<i64>,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Cents,
}

impl OrderItem {
    pub fn line_total(&self) -> Cents {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub menu_item_id: Option<i64>,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Cents,
}

impl NewOrderItem {
    pub fn new<S: Into<String>>(name: S, quantity: i64, unit_price: Cents) -> Self {
        Self { menu_item_id: None, name: name.into(), quantity, unit_price }
    }

    pub fn from_menu_item(item: &MenuItem, quantity: i64) -> Self {
        Self { menu_item_id: Some(item.id), name: item.name.clone(), quantity, unit_price: item.price }
    }

    pub fn line_total(&self) -> Cents {
        self.unit_price * self.quantity
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// The number called out at the counter. Unique and strictly increasing.
    pub order_number: i64,
    pub customer_id: Option<String>,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
    pub total_price: Cents,
    pub status: OrderStatusType,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub served_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn with_items(mut self, items: Vec<OrderItem>) -> Self {
        self.items = items;
        self
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: Option<String>,
    pub items: Vec<NewOrderItem>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(customer_id: Option<String>, items: Vec<NewOrderItem>) -> Self {
        Self { customer_id, items, created_at: Utc::now() }
    }

    /// The order total is always derived from the line items, so it can never disagree with them.
    pub fn total_price(&self) -> Cents {
        self.items.iter().map(NewOrderItem::line_total).sum()
    }
}

//--------------------------------------    PaymentMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    Cash,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Cash => write!(f, "cash"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "cash" => Ok(Self::Cash),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Valid,
    Failed,
    /// Final. A refunded payment never changes status again.
    Refunded,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Refunded)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Valid => write!(f, "valid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

//--------------------------------------    PaymentRecord      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    pub order_id: i64,
    pub amount: Cents,
    pub method: PaymentMethod,
    pub transaction_ref: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The payment half of an order creation. There is deliberately no amount field: the store copies the order total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentRecord {
    pub method: PaymentMethod,
    pub transaction_ref: Option<String>,
    pub status: PaymentStatus,
}

impl NewPaymentRecord {
    pub fn new(method: PaymentMethod, transaction_ref: Option<String>) -> Self {
        Self { method, transaction_ref, status: PaymentStatus::Valid }
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }
}

//--------------------------------------   NotificationType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    OrderCreated,
    OrderPreparing,
    OrderReady,
    OrderServed,
    OrderCustomerLate,
    OrderCancelled,
}

impl NotificationType {
    /// The notification sent to the customer when their order moves into `status`. Orders only enter `Pending` on
    /// creation, which has its own notification, [`NotificationType::OrderCreated`].
    pub fn for_status(status: OrderStatusType) -> Option<Self> {
        match status {
            OrderStatusType::Pending => None,
            OrderStatusType::Preparing => Some(Self::OrderPreparing),
            OrderStatusType::Ready => Some(Self::OrderReady),
            OrderStatusType::Served => Some(Self::OrderServed),
            OrderStatusType::CustomerLate => Some(Self::OrderCustomerLate),
            OrderStatusType::Cancelled => Some(Self::OrderCancelled),
        }
    }

    /// Renders the customer-facing text. Only cancellations make use of `reason`.
    pub fn message(&self, order_number: i64, reason: Option<&str>) -> String {
        match self {
            Self::OrderCreated => format!("Your order #{order_number} has been placed"),
            Self::OrderPreparing => format!("Your order #{order_number} is being prepared"),
            Self::OrderReady => format!("Your order #{order_number} is ready! Please collect it at the counter"),
            Self::OrderServed => format!("Your order #{order_number} has been served. Enjoy your meal!"),
            Self::OrderCustomerLate => format!("We have noted that you are running late for order #{order_number}"),
            Self::OrderCancelled => match reason {
                Some(reason) if !reason.trim().is_empty() => {
                    format!("Your order #{order_number} has been cancelled: {}", reason.trim())
                },
                _ => format!("Your order #{order_number} has been cancelled"),
            },
        }
    }
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OrderCreated => "order_created",
            Self::OrderPreparing => "order_preparing",
            Self::OrderReady => "order_ready",
            Self::OrderServed => "order_served",
            Self::OrderCustomerLate => "order_customer_late",
            Self::OrderCancelled => "order_cancelled",
        };
        f.write_str(s)
    }
}

//--------------------------------------     Notification      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub order_id: i64,
    pub customer_id: String,
    pub notification_type: NotificationType,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub order_id: i64,
    pub customer_id: String,
    pub notification_type: NotificationType,
    pub message: String,
}

impl NewNotification {
    /// Builds the notification for `order` using the message template for `notification_type`. Returns `None` for
    /// anonymous orders, since there is nobody to notify.
    pub fn for_order(order: &Order, notification_type: NotificationType) -> Option<Self> {
        let customer_id = order.customer_id.clone()?;
        let message = notification_type.message(order.order_number, order.cancellation_reason.as_deref());
        Some(Self { order_id: order.id, customer_id, notification_type, message })
    }
}

//--------------------------------------     MenuCategory      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MenuCategory {
    Starter,
    #[default]
    Main,
    Dessert,
    Drink,
    SetMenu,
}

impl Display for MenuCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuCategory::Starter => write!(f, "starter"),
            MenuCategory::Main => write!(f, "main"),
            MenuCategory::Dessert => write!(f, "dessert"),
            MenuCategory::Drink => write!(f, "drink"),
            MenuCategory::SetMenu => write!(f, "set_menu"),
        }
    }
}

impl FromStr for MenuCategory {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(Self::Starter),
            "main" => Ok(Self::Main),
            "dessert" => Ok(Self::Dessert),
            "drink" => Ok(Self::Drink),
            "set_menu" => Ok(Self::SetMenu),
            s => Err(ConversionError(format!("Invalid menu category: {s}"))),
        }
    }
}

//--------------------------------------       MenuItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: MenuCategory,
    pub price: Cents,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenuItem {
    pub name: String,
    pub description: Option<String>,
    pub category: MenuCategory,
    pub price: Cents,
    pub available: bool,
}

impl NewMenuItem {
    pub fn new<S: Into<String>>(name: S, category: MenuCategory, price: Cents) -> Self {
        Self { name: name.into(), description: None, category, price, available: true }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

//--------------------------------------      OrderStats       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderStats {
    pub total_orders: i64,
    pub cancelled: i64,
    pub customer_late: i64,
    /// Orders waiting at the pass
    pub ready: i64,
    pub served: i64,
    /// The value of cancelled orders, i.e. lost revenue
    pub cancelled_value: Cents,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::OrderStatusType::*;

    #[test]
    fn transition_table() {
        assert_eq!(Pending.allowed_transitions(), &[Preparing, Cancelled]);
        assert_eq!(Preparing.allowed_transitions(), &[Ready, Cancelled]);
        assert_eq!(Ready.allowed_transitions(), &[Served, CustomerLate, Cancelled]);
        assert_eq!(CustomerLate.allowed_transitions(), &[Served, Cancelled]);
        assert!(Served.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Pending.can_transition_to(Ready));
        assert!(!Ready.can_transition_to(Pending));
        assert!(CustomerLate.can_transition_to(Served));
        for status in OrderStatusType::ALL {
            assert!(!status.can_transition_to(status), "{status} must not transition to itself");
        }
    }

    #[test]
    fn active_statuses() {
        let active = OrderStatusType::ALL.iter().filter(|s| s.is_active()).copied().collect::<Vec<_>>();
        assert_eq!(active, vec![Pending, Preparing]);
    }

    #[test]
    fn status_names() {
        for status in OrderStatusType::ALL {
            assert_eq!(status.to_string().parse::<OrderStatusType>().unwrap(), status);
        }
        assert_eq!("customer_late".parse::<OrderStatusType>().unwrap(), CustomerLate);
        assert!("Ready".parse::<OrderStatusType>().is_err());
        assert!("delivered".parse::<OrderStatusType>().is_err());
        assert_eq!(serde_json::to_string(&CustomerLate).unwrap(), "\"customer_late\"");
    }

    #[test]
    fn notification_templates() {
        assert_eq!(NotificationType::for_status(Pending), None);
        assert_eq!(NotificationType::for_status(Preparing), Some(NotificationType::OrderPreparing));
        assert_eq!(NotificationType::for_status(CustomerLate), Some(NotificationType::OrderCustomerLate));
        assert_eq!(NotificationType::for_status(Cancelled), Some(NotificationType::OrderCancelled));
        assert_eq!(NotificationType::OrderReady.message(1042, None), "Your order #1042 is ready! Please collect it at the counter");
        assert_eq!(
            NotificationType::OrderCancelled.message(1001, Some("out of stock")),
            "Your order #1001 has been cancelled: out of stock"
        );
        assert_eq!(NotificationType::OrderCancelled.message(1001, Some("  ")), "Your order #1001 has been cancelled");
        assert_eq!(NotificationType::OrderCustomerLate.to_string(), "order_customer_late");
    }

    #[test]
    fn new_order_total() {
        let order = NewOrder::new(None, vec![
            NewOrderItem::new("Burger", 2, Cents::from(1250)),
            NewOrderItem::new("Fries", 1, Cents::from(800)),
        ]);
        assert_eq!(order.total_price(), Cents::from(3300));
        assert_eq!(NewOrder::new(None, vec![]).total_price(), Cents::from(0));
    }

    #[test]
    fn anonymous_orders_get_no_notifications() {
        let now = Utc::now();
        let mut order = Order {
            id: 1,
            order_number: 1001,
            customer_id: None,
            items: vec![],
            total_price: Cents::from(500),
            status: Cancelled,
            cancellation_reason: Some("kitchen closed".into()),
            created_at: now,
            updated_at: now,
            served_at: None,
        };
        assert!(NewNotification::for_order(&order, NotificationType::OrderCancelled).is_none());
        order.customer_id = Some("alice".into());
        let note = NewNotification::for_order(&order, NotificationType::OrderCancelled).unwrap();
        assert_eq!(note.customer_id, "alice");
        assert_eq!(note.message, "Your order #1001 has been cancelled: kitchen closed");
    }
}
