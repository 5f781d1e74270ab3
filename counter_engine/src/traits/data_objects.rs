use serde::{Deserialize, Serialize};

/// The state of a payment as reported by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPaymentStatus {
    /// The provider's own status string, e.g. `succeeded` or `requires_payment_method`
    pub status: String,
    /// True only when the provider reports that the funds were captured.
    pub succeeded: bool,
}

impl GatewayPaymentStatus {
    pub fn new<S: Into<String>>(status: S, succeeded: bool) -> Self {
        Self { status: status.into(), succeeded }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRefund {
    pub status: String,
}

impl GatewayRefund {
    pub fn new<S: Into<String>>(status: S) -> Self {
        Self { status: status.into() }
    }
}
