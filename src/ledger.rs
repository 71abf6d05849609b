//! Transaction ledger: records payment-gateway notifications with
//! at-most-once semantics per payment identifier.
//!
//! Gateways routinely redeliver notifications, so a duplicate is a normal
//! input, not a fault. The write protocol is conditional-create-then-update:
//! an atomic create guarded on key absence, with a recovery path that
//! refreshes the existing record while keeping its `created_at`.

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde_json::Value;

use crate::error::AppError;
use crate::store::{AttrValue, Item, KeyValueStore, StoreError};
use crate::utils::{non_empty_field, utc_now_iso};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// A validated gateway notification. `razorpay_payment_id` doubles as the
/// ledger key.
#[derive(Debug, Clone)]
pub struct TransactionNotice {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub status: PaymentStatus,
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub user_id: Option<String>,
    pub course_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub razorpay_signature: Option<String>,
}

impl TransactionNotice {
    /// Validates a request body. All missing required fields are reported
    /// together; validation failures never reach the store.
    pub fn from_body(body: &Value) -> Result<Self, AppError> {
        let razorpay_payment_id = non_empty_field(body, "razorpay_payment_id");
        let razorpay_order_id = non_empty_field(body, "razorpay_order_id");
        let status_raw = non_empty_field(body, "status");

        let mut missing = Vec::new();
        if razorpay_payment_id.is_none() {
            missing.push("razorpay_payment_id".to_string());
        }
        if razorpay_order_id.is_none() {
            missing.push("razorpay_order_id".to_string());
        }
        if status_raw.is_none() {
            missing.push("status".to_string());
        }
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }

        let status_raw = status_raw.unwrap_or_default();
        let status = PaymentStatus::parse(&status_raw)
            .ok_or_else(|| AppError::InvalidStatus(status_raw.clone()))?;

        Ok(Self {
            razorpay_payment_id: razorpay_payment_id.unwrap_or_default(),
            razorpay_order_id: razorpay_order_id.unwrap_or_default(),
            status,
            amount: parse_amount(body)?,
            currency: non_empty_field(body, "currency"),
            user_id: non_empty_field(body, "user_id"),
            course_id: non_empty_field(body, "course_id"),
            email: non_empty_field(body, "email"),
            phone: non_empty_field(body, "phone"),
            razorpay_signature: non_empty_field(body, "razorpay_signature"),
        })
    }

    fn to_item(&self, tenant_id: Option<&str>, timestamp: &str) -> Item {
        let mut item = Item::new();
        let mut put = |name: &str, value: &str| {
            item.insert(name.to_string(), AttrValue::S(value.to_string()));
        };
        put("transaction_id", &self.razorpay_payment_id);
        put("razorpay_payment_id", &self.razorpay_payment_id);
        put("razorpay_order_id", &self.razorpay_order_id);
        put("status", self.status.as_str());
        put("created_at", timestamp);
        put("updated_at", timestamp);
        put("currency", self.currency.as_deref().unwrap_or("INR"));

        let optional = [
            ("user_id", &self.user_id),
            ("course_id", &self.course_id),
            ("email", &self.email),
            ("phone", &self.phone),
            ("razorpay_signature", &self.razorpay_signature),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                item.insert(name.to_string(), AttrValue::S(value.clone()));
            }
        }
        if let Some(amount) = &self.amount {
            item.insert("amount".to_string(), AttrValue::N(amount.clone()));
        }
        if let Some(tenant_id) = tenant_id.filter(|t| !t.trim().is_empty()) {
            item.insert("tenant_id".to_string(), AttrValue::S(tenant_id.to_string()));
        }
        item
    }
}

/// Amounts are exact decimals. JSON numbers arrive at full precision and
/// parse through their decimal text; strings parse directly.
fn parse_amount(body: &Value) -> Result<Option<BigDecimal>, AppError> {
    match body.get("amount") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => BigDecimal::from_str(&n.to_string())
            .map(Some)
            .map_err(|_| AppError::InvalidAmount),
        Some(Value::String(s)) => BigDecimal::from_str(s)
            .map(Some)
            .map_err(|_| AppError::InvalidAmount),
        Some(_) => Err(AppError::InvalidAmount),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone)]
pub struct LedgerReceipt {
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub timestamp: String,
    pub outcome: WriteOutcome,
}

pub struct LedgerWriter {
    store: Arc<dyn KeyValueStore>,
}

impl LedgerWriter {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Records one notification. At most one ledger entry ever exists per
    /// payment identifier: the first delivery creates it, every later
    /// delivery refreshes it. `created_at` never moves once written.
    pub async fn record(
        &self,
        notice: &TransactionNotice,
        tenant_id: Option<&str>,
    ) -> Result<LedgerReceipt, AppError> {
        let timestamp = utc_now_iso();
        let item = notice.to_item(tenant_id, &timestamp);

        match self.store.put_item_if_absent(item.clone()).await {
            Ok(()) => {
                tracing::info!(
                    transaction_id = %notice.razorpay_payment_id,
                    status = notice.status.as_str(),
                    "transaction recorded"
                );
                Ok(LedgerReceipt {
                    transaction_id: notice.razorpay_payment_id.clone(),
                    status: notice.status,
                    timestamp,
                    outcome: WriteOutcome::Created,
                })
            }
            Err(StoreError::PreconditionFailed) => {
                tracing::warn!(
                    transaction_id = %notice.razorpay_payment_id,
                    "duplicate delivery, refreshing existing record"
                );
                self.refresh(item, notice).await
            }
            Err(err) => Err(AppError::TransactionStoreFailed(err.to_string())),
        }
    }

    /// Duplicate-delivery path: overwrite with the latest fields, keep the
    /// original `created_at`, stamp a fresh `updated_at`.
    async fn refresh(
        &self,
        mut item: Item,
        notice: &TransactionNotice,
    ) -> Result<LedgerReceipt, AppError> {
        let existing = self
            .store
            .get_item(&notice.razorpay_payment_id, None)
            .await
            .map_err(|err| AppError::TransactionStoreFailed(err.to_string()))?;

        if let Some(created_at) = existing
            .as_ref()
            .and_then(|it| it.get("created_at"))
            .and_then(AttrValue::as_s)
        {
            item.insert(
                "created_at".to_string(),
                AttrValue::S(created_at.to_string()),
            );
        }

        let timestamp = utc_now_iso();
        item.insert("updated_at".to_string(), AttrValue::S(timestamp.clone()));

        self.store
            .put_item(item)
            .await
            .map_err(|err| AppError::TransactionStoreFailed(err.to_string()))?;

        Ok(LedgerReceipt {
            transaction_id: notice.razorpay_payment_id.clone(),
            status: notice.status,
            timestamp,
            outcome: WriteOutcome::Updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::KeySchema;
    use serde_json::json;

    fn writer() -> (LedgerWriter, Arc<dyn KeyValueStore>) {
        let store: Arc<dyn KeyValueStore> =
            Arc::new(MemoryStore::new(KeySchema::new("transaction_id")));
        (LedgerWriter::new(store.clone()), store)
    }

    fn notice(body: Value) -> TransactionNotice {
        TransactionNotice::from_body(&body).unwrap()
    }

    fn payment(status: &str) -> Value {
        json!({
            "razorpay_payment_id": "pay_1",
            "razorpay_order_id": "order_1",
            "status": status,
        })
    }

    #[test]
    fn all_missing_fields_are_reported_together() {
        let err = TransactionNotice::from_body(&json!({})).unwrap_err();
        match err {
            AppError::MissingFields(fields) => assert_eq!(
                fields,
                vec!["razorpay_payment_id", "razorpay_order_id", "status"]
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let err = TransactionNotice::from_body(&json!({
            "razorpay_payment_id": "",
            "razorpay_order_id": "order_1",
            "status": "success",
        }))
        .unwrap_err();
        match err {
            AppError::MissingFields(fields) => {
                assert_eq!(fields, vec!["razorpay_payment_id"])
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn status_outside_the_enum_is_rejected() {
        let err = TransactionNotice::from_body(&payment("pending")).unwrap_err();
        assert!(matches!(err, AppError::InvalidStatus(_)));
    }

    #[test]
    fn amount_keeps_exact_decimal_text() {
        let mut body = payment("success");
        body["amount"] = json!(199.99);
        let notice = TransactionNotice::from_body(&body).unwrap();
        assert_eq!(notice.amount.unwrap().to_string(), "199.99");
    }

    #[test]
    fn unparseable_amount_is_rejected() {
        let mut body = payment("success");
        body["amount"] = json!("not-a-number");
        assert!(matches!(
            TransactionNotice::from_body(&body).unwrap_err(),
            AppError::InvalidAmount
        ));

        body["amount"] = json!([1]);
        assert!(matches!(
            TransactionNotice::from_body(&body).unwrap_err(),
            AppError::InvalidAmount
        ));
    }

    #[test]
    fn currency_defaults_to_inr() {
        let item = notice(payment("success")).to_item(None, "t0");
        assert_eq!(item.get("currency").unwrap().as_s(), Some("INR"));
    }

    #[test]
    fn tenant_id_is_stored_as_attribute_when_present() {
        let n = notice(payment("success"));
        let with_tenant = n.to_item(Some("acme"), "t0");
        assert_eq!(with_tenant.get("tenant_id").unwrap().as_s(), Some("acme"));
        let without = n.to_item(None, "t0");
        assert!(!without.contains_key("tenant_id"));
    }

    #[tokio::test]
    async fn first_delivery_creates_the_record() {
        let (writer, store) = writer();
        let receipt = writer.record(&notice(payment("success")), None).await.unwrap();
        assert_eq!(receipt.outcome, WriteOutcome::Created);

        let stored = store.get_item("pay_1", None).await.unwrap().unwrap();
        assert_eq!(
            stored.get("created_at").unwrap(),
            stored.get("updated_at").unwrap()
        );
    }

    #[tokio::test]
    async fn duplicate_delivery_updates_without_moving_created_at() {
        let (writer, store) = writer();
        writer.record(&notice(payment("success")), None).await.unwrap();
        let first = store.get_item("pay_1", None).await.unwrap().unwrap();
        let first_created = first.get("created_at").unwrap().clone();

        let receipt = writer.record(&notice(payment("success")), None).await.unwrap();
        assert_eq!(receipt.outcome, WriteOutcome::Updated);

        let second = store.get_item("pay_1", None).await.unwrap().unwrap();
        assert_eq!(second.get("created_at").unwrap(), &first_created);
        let updated = second.get("updated_at").unwrap().as_s().unwrap();
        let created = first_created.as_s().unwrap();
        assert!(updated >= created);
    }

    #[tokio::test]
    async fn second_delivery_status_wins() {
        let (writer, store) = writer();
        writer.record(&notice(payment("success")), None).await.unwrap();
        writer.record(&notice(payment("failed")), None).await.unwrap();

        let stored = store.get_item("pay_1", None).await.unwrap().unwrap();
        assert_eq!(stored.get("status").unwrap().as_s(), Some("failed"));
    }

    #[tokio::test]
    async fn exactly_one_record_per_payment_id() {
        let (writer, store) = writer();
        for _ in 0..3 {
            writer.record(&notice(payment("success")), None).await.unwrap();
        }
        let all = store.query_partition("pay_1").await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
