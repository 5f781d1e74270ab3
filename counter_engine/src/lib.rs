//! Counter Engine
//!
//! The counter engine runs the order lifecycle of a walk-up food counter. Customers pay up front and present a payment
//! reference with their order; the engine verifies it with the payment provider, hands out a sequential order number,
//! and tracks the order through the kitchen until it is served or cancelled.
//!
//! The library is divided into these sections:
//! 1. The storage contracts ([`mod@traits`]) and the SQLite backend that implements them ([`SqliteDatabase`]). You
//!    should not need to access the database directly. Instead, use the public APIs. The exception is the data types
//!    used in the database, which are defined in [`mod@db_types`] and are public.
//! 2. The public API. [`OrderFlowApi`] places orders and moves them through their lifecycle, refunding cancelled
//!    orders and notifying customers as it goes. [`QueueApi`], [`NotificationApi`] and [`CatalogApi`] cover the
//!    queue, the customers' inboxes and the menu.
//!
//! The engine also publishes events when orders are created or change status, and whenever the queue changes. Use
//! [`events::EventHooks`] to hook into them, e.g. to push live updates to the screens in the dining room.
mod config;
mod counter_api;
#[cfg(feature = "sqlite")]
mod sqlite;
mod stripe_gateway;

pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use config::{EngineConfig, FlowOptions};
pub use counter_api::{
    catalog_api::CatalogApi,
    errors::{OrderFlowError, PaymentApiError},
    notification_api::NotificationApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_api::{is_placeholder_reference, placeholder_reference, PaymentApi, PLACEHOLDER_REFERENCE_PREFIX},
    queue_api::{sequence_orders, QueueApi},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CatalogError,
    CatalogLookup,
    CatalogManagement,
    GatewayError,
    NotificationApiError,
    NotificationManagement,
    OrderManagement,
    OrderStoreError,
    PaymentGateway,
};
