use base64::Engine;
use failsafe::futures::CircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RazorpayError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("order rejected by gateway (status {status}): {details}")]
    OrderRejected { status: u16, details: String },
    #[error("circuit breaker open - Razorpay API unavailable")]
    CircuitBreakerOpen,
}

/// Order-creation payload. `amount` is in minor currency units.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// HTTP client for the Razorpay Orders API. The order object it returns is
/// opaque to this service and passed through verbatim.
pub struct RazorpayClient {
    client: Client,
    base_url: String,
    auth_header: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>,
}

impl RazorpayClient {
    pub fn new(base_url: String, key_id: &str, key_secret: &str) -> Self {
        Self::with_circuit_breaker_config(base_url, key_id, key_secret, 5, Duration::from_secs(60))
    }

    pub fn with_circuit_breaker_config(
        base_url: String,
        key_id: &str,
        key_secret: &str,
        failure_threshold: u32,
        reset_timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let credentials =
            base64::engine::general_purpose::STANDARD.encode(format!("{key_id}:{key_secret}"));

        let backoff = backoff::exponential(Duration::from_secs(10), reset_timeout);
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        RazorpayClient {
            client,
            base_url,
            auth_header: format!("Basic {credentials}"),
            circuit_breaker,
        }
    }

    /// Creates an order at the gateway. Non-success responses surface the
    /// gateway's details payload.
    pub async fn create_order(&self, order: &OrderRequest) -> Result<Value, RazorpayError> {
        let url = format!("{}/v1/orders", self.base_url.trim_end_matches('/'));
        let client = self.client.clone();
        let auth = self.auth_header.clone();
        let payload = order.clone();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .header(
                        AUTHORIZATION,
                        HeaderValue::from_str(&auth)
                            .unwrap_or_else(|_| HeaderValue::from_static("Basic")),
                    )
                    .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                    .json(&payload)
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let details = response.text().await.unwrap_or_default();
                    return Err(RazorpayError::OrderRejected {
                        status: status.as_u16(),
                        details,
                    });
                }

                let order = response.json::<Value>().await?;
                Ok(order)
            })
            .await;

        match result {
            Ok(order) => Ok(order),
            Err(FailsafeError::Rejected) => Err(RazorpayError::CircuitBreakerOpen),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

impl Clone for RazorpayClient {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            auth_header: self.auth_header.clone(),
            circuit_breaker: self.circuit_breaker.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: String) -> RazorpayClient {
        RazorpayClient::new(base_url, "rzp_test_key", "secret")
    }

    #[test]
    fn auth_header_is_basic_with_encoded_credentials() {
        let client = client("https://api.razorpay.com".to_string());
        assert!(client.auth_header.starts_with("Basic "));
        let encoded = client.auth_header.trim_start_matches("Basic ");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, b"rzp_test_key:secret");
    }

    #[tokio::test]
    async fn create_order_returns_the_gateway_object() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/orders")
            .match_header("authorization", mockito::Matcher::Regex("^Basic ".into()))
            .with_status(200)
            .with_body(r#"{"id":"order_1","amount":50000,"currency":"INR"}"#)
            .create_async()
            .await;

        let client = client(server.url());
        let order = client
            .create_order(&OrderRequest {
                amount: 50000,
                currency: "INR".to_string(),
                receipt: "acme-c1".to_string(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(order["id"], "order_1");
        assert_eq!(order["amount"], 50000);
    }

    #[tokio::test]
    async fn gateway_rejection_carries_status_and_details() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/orders")
            .with_status(401)
            .with_body(r#"{"error":{"description":"bad key"}}"#)
            .create_async()
            .await;

        let client = client(server.url());
        let err = client
            .create_order(&OrderRequest {
                amount: 50000,
                currency: "INR".to_string(),
                receipt: "acme-c1".to_string(),
            })
            .await
            .unwrap_err();

        match err {
            RazorpayError::OrderRejected { status, details } => {
                assert_eq!(status, 401);
                assert!(details.contains("bad key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
