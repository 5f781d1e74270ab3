use counter_engine::{
    traits::{GatewayPaymentStatus, GatewayRefund},
    GatewayError,
    PaymentGateway,
};
use mockall::mock;

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn verify_payment(&self, reference: &str) -> Result<GatewayPaymentStatus, GatewayError>;
        async fn refund_payment(&self, reference: &str) -> Result<GatewayRefund, GatewayError>;
    }
}

/// References starting with `pi_paid` have succeeded; anything else is still waiting for the customer.
pub fn verify_by_prefix(reference: &str) -> Result<GatewayPaymentStatus, GatewayError> {
    if reference.starts_with("pi_paid") {
        Ok(GatewayPaymentStatus::new("succeeded", true))
    } else {
        Ok(GatewayPaymentStatus::new("requires_payment_method", false))
    }
}

/// A gateway that accepts every `pi_paid*` payment and is never asked for a refund.
pub fn paying_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_verify_payment().returning(verify_by_prefix);
    gateway.expect_refund_payment().never();
    gateway
}

/// A gateway that must not be contacted at all.
pub fn silent_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_verify_payment().never();
    gateway.expect_refund_payment().never();
    gateway
}
