//! # Backend contracts
//!
//! This module defines the interface contracts that the counter engine needs from its collaborators.
//!
//! * [`OrderManagement`] is the durable order store. It creates orders atomically together with their line items and
//!   payment record, hands out order numbers and performs compare-and-set status updates.
//! * [`CatalogLookup`] is the read-only view of the menu that the order flow resolves line items against.
//!   [`CatalogManagement`] extends it with the write operations used by operators.
//! * [`NotificationManagement`] stores the messages sent to customers as their orders progress.
//! * [`PaymentGateway`] verifies and refunds payments with an external payment provider.
//!
//! [`crate::SqliteDatabase`] implements all the storage traits.
mod catalog;
mod notification_management;
mod order_management;
mod payment_gateway;

mod data_objects;

pub use catalog::{CatalogError, CatalogLookup, CatalogManagement};
pub use data_objects::{GatewayPaymentStatus, GatewayRefund};
pub use notification_management::{NotificationApiError, NotificationManagement};
pub use order_management::{OrderManagement, OrderStoreError};
pub use payment_gateway::{GatewayError, PaymentGateway};
