//! A small client for the parts of the Stripe REST API that the counter needs: looking up payment intents and
//! refunding them.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{PaymentIntent, Refund, StripeErrorBody, PAYMENT_INTENT_SUCCEEDED};
pub use error::StripeApiError;
