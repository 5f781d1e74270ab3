//! # Counter API
//!
//! The public face of the engine. Each API wraps a backend (and, for orders, a payment gateway) and is generic over
//! them, so that the same code runs against SQLite in production and against mocks in tests.
//!
//! * [`order_flow_api::OrderFlowApi`] places orders and moves them through their lifecycle.
//! * [`queue_api::QueueApi`] computes the live queue of orders waiting to be served.
//! * [`notification_api::NotificationApi`] is the customer's inbox.
//! * [`catalog_api::CatalogApi`] maintains the menu.
//! * [`payment_api::PaymentApi`] talks to the payment provider on behalf of the order flow.
pub mod catalog_api;
pub mod errors;
pub mod notification_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_api;
pub mod queue_api;
