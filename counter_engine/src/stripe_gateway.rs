//! [`PaymentGateway`] backed by the Stripe payment intents API.
use stripe_tools::{StripeApi, StripeApiError};

use crate::traits::{GatewayError, GatewayPaymentStatus, GatewayRefund, PaymentGateway};

impl PaymentGateway for StripeApi {
    async fn verify_payment(&self, reference: &str) -> Result<GatewayPaymentStatus, GatewayError> {
        let intent = self.fetch_payment_intent(reference).await.map_err(gateway_error)?;
        let succeeded = intent.is_succeeded();
        Ok(GatewayPaymentStatus::new(intent.status, succeeded))
    }

    async fn refund_payment(&self, reference: &str) -> Result<GatewayRefund, GatewayError> {
        let refund = self.refund_payment_intent(reference).await.map_err(gateway_error)?;
        Ok(GatewayRefund::new(refund.status))
    }
}

/// Client errors (4xx) mean Stripe understood and refused the request. Anything else means we could not get an answer.
fn gateway_error(e: StripeApiError) -> GatewayError {
    match e {
        StripeApiError::InvalidIdentifier(id) => GatewayError::InvalidReference(id),
        StripeApiError::QueryError { status, message } if (400..500).contains(&status) => {
            GatewayError::Rejected(format!("{status}. {message}"))
        },
        e => GatewayError::Unavailable(e.to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_mapping() {
        let e = gateway_error(StripeApiError::QueryError { status: 404, message: "No such payment_intent".into() });
        assert!(matches!(e, GatewayError::Rejected(ref s) if s.contains("No such payment_intent")));
        let e = gateway_error(StripeApiError::QueryError { status: 503, message: "Service unavailable".into() });
        assert!(matches!(e, GatewayError::Unavailable(_)));
        let e = gateway_error(StripeApiError::RestResponseError("timed out".into()));
        assert!(matches!(e, GatewayError::Unavailable(_)));
        let e = gateway_error(StripeApiError::InvalidIdentifier("pi 1".into()));
        assert!(matches!(e, GatewayError::InvalidReference(_)));
    }
}
