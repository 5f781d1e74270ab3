use counter_common::Cents;
use serde::{Deserialize, Serialize};

/// The payment intent status Stripe reports once the customer's money has been captured.
pub const PAYMENT_INTENT_SUCCEEDED: &str = "succeeded";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub amount_received: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub livemode: bool,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == PAYMENT_INTENT_SUCCEEDED
    }

    pub fn amount(&self) -> Cents {
        Cents::from(self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

impl Refund {
    pub fn amount(&self) -> Cents {
        Cents::from(self.amount)
    }
}

/// The envelope Stripe wraps around every non-2xx response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StripeErrorBody {
    pub fn summary(&self) -> String {
        let detail = &self.error;
        match (&detail.code, &detail.message) {
            (Some(code), Some(msg)) => format!("{} ({code}): {msg}", detail.error_type),
            (None, Some(msg)) => format!("{}: {msg}", detail.error_type),
            (Some(code), None) => format!("{} ({code})", detail.error_type),
            (None, None) => detail.error_type.clone(),
        }
    }
}
