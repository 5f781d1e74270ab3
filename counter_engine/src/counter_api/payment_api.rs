use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    counter_api::errors::PaymentApiError,
    order_objects::{PaymentVerification, RefundReceipt},
    traits::PaymentGateway,
};

/// Payment references recorded for orders accepted without payment verification start with this prefix.
pub const PLACEHOLDER_REFERENCE_PREFIX: &str = "TEST_";

/// Synthesizes a unique, recognisable reference for an order that was accepted without payment verification.
pub fn placeholder_reference() -> String {
    format!("{PLACEHOLDER_REFERENCE_PREFIX}{}_{:08x}", Utc::now().timestamp_millis(), rand::random::<u32>())
}

pub fn is_placeholder_reference(reference: &str) -> bool {
    reference.starts_with(PLACEHOLDER_REFERENCE_PREFIX)
}

/// `PaymentApi` wraps the payment provider. It verifies the payment reference customers present with their order, and
/// refunds payments when orders are cancelled.
pub struct PaymentApi<G> {
    gateway: G,
}

impl<G> Debug for PaymentApi<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

impl<G> PaymentApi<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<G> PaymentApi<G>
where G: PaymentGateway
{
    /// Asks the provider about the payment. The payment is valid exactly when the provider reports that it succeeded.
    pub async fn verify(&self, reference: &str) -> Result<PaymentVerification, PaymentApiError> {
        trace!("💳️ Verifying payment {reference}");
        let result = self.gateway.verify_payment(reference).await.map_err(|e| {
            warn!("💳️ Could not verify payment {reference}. {e}");
            PaymentApiError::PaymentVerificationFailed(e.to_string())
        })?;
        debug!("💳️ Payment {reference} has status {}. Succeeded: {}", result.status, result.succeeded);
        Ok(PaymentVerification { status: result.status, is_valid: result.succeeded })
    }

    /// Refunds the full payment. No retries are attempted.
    pub async fn refund(&self, reference: &str) -> Result<RefundReceipt, PaymentApiError> {
        trace!("💳️ Refunding payment {reference}");
        let result = self.gateway.refund_payment(reference).await.map_err(|e| {
            warn!("💳️ Could not refund payment {reference}. {e}");
            PaymentApiError::RefundFailed(e.to_string())
        })?;
        info!("💳️ Payment {reference} refunded. Refund status: {}", result.status);
        Ok(RefundReceipt { status: result.status })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traits::{GatewayError, GatewayPaymentStatus, GatewayRefund};

    struct FixedGateway;

    impl PaymentGateway for FixedGateway {
        async fn verify_payment(&self, reference: &str) -> Result<GatewayPaymentStatus, GatewayError> {
            match reference {
                "pi_paid" => Ok(GatewayPaymentStatus::new("succeeded", true)),
                "pi_unpaid" => Ok(GatewayPaymentStatus::new("requires_payment_method", false)),
                _ => Err(GatewayError::Unavailable("connection timed out".into())),
            }
        }

        async fn refund_payment(&self, reference: &str) -> Result<GatewayRefund, GatewayError> {
            match reference {
                "pi_paid" => Ok(GatewayRefund::new("succeeded")),
                _ => Err(GatewayError::Rejected("charge already refunded".into())),
            }
        }
    }

    #[test]
    fn placeholder_references() {
        let a = placeholder_reference();
        let b = placeholder_reference();
        assert!(is_placeholder_reference(&a));
        assert!(a.starts_with("TEST_"));
        assert_ne!(a, b);
        assert!(!is_placeholder_reference("pi_3MtwBwLkdIwHu7ix28a3tqPa"));
    }

    #[tokio::test]
    async fn verification() {
        let api = PaymentApi::new(FixedGateway);
        let v = api.verify("pi_paid").await.unwrap();
        assert!(v.is_valid);
        assert_eq!(v.status, "succeeded");
        let v = api.verify("pi_unpaid").await.unwrap();
        assert!(!v.is_valid);
        assert_eq!(v.status, "requires_payment_method");
        let err = api.verify("pi_offline").await.unwrap_err();
        assert!(matches!(err, PaymentApiError::PaymentVerificationFailed(_)));
    }

    #[tokio::test]
    async fn refunds() {
        let api = PaymentApi::new(FixedGateway);
        assert_eq!(api.refund("pi_paid").await.unwrap().status, "succeeded");
        let err = api.refund("pi_other").await.unwrap_err();
        assert!(matches!(err, PaymentApiError::RefundFailed(ref s) if s.contains("already refunded")));
    }
}
