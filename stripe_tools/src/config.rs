use std::time::Duration;

use counter_common::Secret;
use log::*;

const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com/v1";
const DEFAULT_STRIPE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Base url of the REST API, without a trailing slash
    pub api_url: String,
    pub secret_key: Secret<String>,
    /// Every request to Stripe is abandoned after this long
    pub timeout: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            secret_key: Secret::default(),
            timeout: DEFAULT_STRIPE_TIMEOUT,
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("COUNTER_STRIPE_API_URL").unwrap_or_else(|_| {
            debug!("COUNTER_STRIPE_API_URL not set, using {DEFAULT_STRIPE_API_URL}");
            DEFAULT_STRIPE_API_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("COUNTER_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("COUNTER_STRIPE_SECRET_KEY not set, using (probably useless) default");
            "sk_test_00000000000000".to_string()
        }));
        let timeout = std::env::var("COUNTER_STRIPE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid value for COUNTER_STRIPE_TIMEOUT_SECS. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_STRIPE_TIMEOUT);
        Self { api_url: api_url.trim_end_matches('/').to_string(), secret_key, timeout }
    }
}
