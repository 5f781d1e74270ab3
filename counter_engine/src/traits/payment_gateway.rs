use thiserror::Error;

use crate::traits::data_objects::{GatewayPaymentStatus, GatewayRefund};

/// The payment provider contract. The counter never creates payments itself; customers pay up front and hand over a
/// reference, which the engine verifies, and refunds when an order is cancelled.
///
/// Implementations are expected to carry their own request timeout. The engine does not retry.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Looks up the payment identified by `reference`.
    async fn verify_payment(&self, reference: &str) -> Result<GatewayPaymentStatus, GatewayError>;

    /// Refunds the full amount of the payment identified by `reference`.
    async fn refund_payment(&self, reference: &str) -> Result<GatewayRefund, GatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment provider could not be reached: {0}")]
    Unavailable(String),
    #[error("The payment provider rejected the request: {0}")]
    Rejected(String),
    #[error("Invalid payment reference: {0}")]
    InvalidReference(String),
}
