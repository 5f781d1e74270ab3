use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::StripeConfig,
    data_objects::{PaymentIntent, Refund, StripeErrorBody},
    StripeApiError,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Sends a request to the Stripe API. Stripe takes request bodies as form-encoded key/value pairs, so `form` is
    /// sent as `application/x-www-form-urlencoded`.
    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        form: Option<&[(&str, &str)]>,
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(form) = form {
            req = req.form(form);
        }
        let response = req.send().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
            let message = serde_json::from_str::<StripeErrorBody>(&text).map(|b| b.summary()).unwrap_or(text);
            Err(StripeApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    pub async fn fetch_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, StripeApiError> {
        let intent_id = check_identifier(intent_id)?;
        let path = format!("/payment_intents/{intent_id}");
        debug!("Fetching payment intent {intent_id}");
        let intent = self.rest_query::<PaymentIntent>(Method::GET, &path, &[], None).await?;
        info!("Fetched payment intent {intent_id}. Status: {}", intent.status);
        Ok(intent)
    }

    /// Refunds the full captured amount of the given payment intent.
    pub async fn refund_payment_intent(&self, intent_id: &str) -> Result<Refund, StripeApiError> {
        let intent_id = check_identifier(intent_id)?;
        debug!("Refunding payment intent {intent_id}");
        let form = [("payment_intent", intent_id)];
        let refund = self.rest_query::<Refund>(Method::POST, "/refunds", &[], Some(&form)).await?;
        info!("Refund {} issued for payment intent {intent_id}. Status: {}", refund.id, refund.status);
        Ok(refund)
    }
}

fn check_identifier(id: &str) -> Result<&str, StripeApiError> {
    let id = id.trim();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StripeApiError::InvalidIdentifier(id.to_string()));
    }
    Ok(id)
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use counter_common::Secret;

    use super::*;

    fn config() -> StripeConfig {
        StripeConfig {
            api_url: "http://localhost:12111/v1".to_string(),
            secret_key: Secret::new("sk_test_abc".to_string()),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn urls() {
        let api = StripeApi::new(config()).unwrap();
        assert_eq!(api.url("/refunds"), "http://localhost:12111/v1/refunds");
    }

    #[test]
    fn identifiers() {
        assert_eq!(check_identifier(" pi_123abc ").unwrap(), "pi_123abc");
        assert!(matches!(check_identifier(""), Err(StripeApiError::InvalidIdentifier(_))));
        assert!(matches!(check_identifier("pi_1/../../charges"), Err(StripeApiError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn invalid_identifier_never_reaches_the_network() {
        let api = StripeApi::new(config()).unwrap();
        let err = api.fetch_payment_intent("not valid").await.unwrap_err();
        assert!(matches!(err, StripeApiError::InvalidIdentifier(_)));
    }
}
