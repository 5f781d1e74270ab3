mod cents;

pub mod helpers;
pub mod op;
mod secret;

pub use cents::{Cents, CentsConversionError, COUNTER_CURRENCY_CODE};
pub use secret::Secret;
