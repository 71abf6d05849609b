//! Create-order use case: look the course up, convert its price to minor
//! currency units, and ask the gateway for an order.

use std::sync::Arc;

use bigdecimal::ToPrimitive;
use serde_json::Value;

use crate::error::AppError;
use crate::razorpay::{OrderRequest, RazorpayClient};
use crate::store::{AttrValue, KeyValueStore};
use crate::utils::non_empty_field;

pub struct OrderService {
    courses: Arc<dyn KeyValueStore>,
    gateway: Option<RazorpayClient>,
}

impl OrderService {
    pub fn new(courses: Arc<dyn KeyValueStore>, gateway: Option<RazorpayClient>) -> Self {
        Self { courses, gateway }
    }

    /// `tenant_id` and `course_id` come from the request body. Returns the
    /// gateway's opaque order object on success.
    pub async fn create(&self, body: &Value) -> Result<Value, AppError> {
        let tenant_id = non_empty_field(body, "tenant_id");
        let course_id = non_empty_field(body, "course_id");
        let (tenant_id, course_id) = match (tenant_id, course_id) {
            (Some(t), Some(c)) => (t, c),
            _ => {
                return Err(AppError::BadRequest(
                    "tenant_id and course_id are required".to_string(),
                ))
            }
        };

        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| AppError::Internal("payment gateway is not configured".to_string()))?;

        let course = self
            .courses
            .get_item(&tenant_id, Some(&course_id))
            .await?
            .ok_or(AppError::CourseNotFound)?;

        let price = course
            .get("price")
            .and_then(AttrValue::as_n)
            .ok_or_else(|| AppError::Internal("course record has no numeric price".to_string()))?;
        // Major units, truncated to a whole number, then ×100 to minor units.
        let amount = price
            .to_i64()
            .map(|major| major * 100)
            .ok_or_else(|| AppError::Internal("course price out of range".to_string()))?;

        let currency = course
            .get("currency")
            .and_then(AttrValue::as_s)
            .unwrap_or("INR")
            .to_string();

        let order = OrderRequest {
            amount,
            currency,
            receipt: format!("{tenant_id}-{course_id}"),
        };

        tracing::info!(
            tenant_id = %tenant_id,
            course_id = %course_id,
            amount = order.amount,
            "creating payment order"
        );

        gateway
            .create_order(&order)
            .await
            .map_err(|err| AppError::OrderCreationFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::{Item, KeySchema};
    use bigdecimal::BigDecimal;
    use serde_json::json;
    use std::str::FromStr;

    async fn course_store(price: &str) -> Arc<dyn KeyValueStore> {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new(KeySchema::with_sort(
            "tenant_id",
            "course_id",
        )));
        let mut item = Item::new();
        item.insert("tenant_id".to_string(), AttrValue::S("acme".into()));
        item.insert("course_id".to_string(), AttrValue::S("c1".into()));
        item.insert(
            "price".to_string(),
            AttrValue::N(BigDecimal::from_str(price).unwrap()),
        );
        store.put_item(item).await.unwrap();
        store
    }

    fn gateway(url: String) -> Option<RazorpayClient> {
        Some(RazorpayClient::new(url, "key", "secret"))
    }

    #[tokio::test]
    async fn missing_identifiers_are_a_bad_request() {
        let service = OrderService::new(course_store("500").await, None);
        let err = service.create(&json!({"tenant_id": "acme"})).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let service = OrderService::new(course_store("500").await, gateway(server.url()));
        let err = service
            .create(&json!({"tenant_id": "acme", "course_id": "missing"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CourseNotFound));
        drop(server);
    }

    #[tokio::test]
    async fn price_converts_to_minor_units() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/orders")
            .match_body(mockito::Matcher::PartialJson(json!({
                "amount": 50000,
                "currency": "INR",
                "receipt": "acme-c1",
            })))
            .with_status(200)
            .with_body(r#"{"id":"order_1","amount":50000}"#)
            .create_async()
            .await;

        let service = OrderService::new(course_store("500").await, gateway(server.url()));
        let order = service
            .create(&json!({"tenant_id": "acme", "course_id": "c1"}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(order["id"], "order_1");
    }

    #[tokio::test]
    async fn gateway_rejection_surfaces_as_order_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/orders")
            .with_status(502)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let service = OrderService::new(course_store("500").await, gateway(server.url()));
        let err = service
            .create(&json!({"tenant_id": "acme", "course_id": "c1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OrderCreationFailed(_)));
    }
}
