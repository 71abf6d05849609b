//! Key-value store capability.
//!
//! Items are flat maps of field name to typed scalar, addressed by a
//! partition key and an optional sort key. The trait is the seam for real
//! backends; [`memory::MemoryStore`] is the bundled one.

pub mod memory;

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde_json::Value;

/// A typed scalar stored in an item field. Numbers are exact decimals.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    S(String),
    N(BigDecimal),
    Bool(bool),
}

impl AttrValue {
    /// Lossless conversion from a JSON scalar. Numbers are parsed from their
    /// decimal text, never through an intermediate binary float.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::S(s.clone())),
            Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok().map(Self::N),
            Value::Bool(b) => Some(Self::Bool(*b)),
            _ => None,
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&BigDecimal> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }
}

/// A stored record: field name → scalar. Key attributes live in the item
/// itself, as in the backing stores this capability models.
pub type Item = BTreeMap<String, AttrValue>;

/// Names of the attributes that form an item's key.
#[derive(Debug, Clone)]
pub struct KeySchema {
    pub partition: &'static str,
    pub sort: Option<&'static str>,
}

impl KeySchema {
    pub fn new(partition: &'static str) -> Self {
        Self {
            partition,
            sort: None,
        }
    }

    pub fn with_sort(partition: &'static str, sort: &'static str) -> Self {
        Self {
            partition,
            sort: Some(sort),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The guard of a conditional write did not hold. Distinct from other
    /// failures so callers can branch into a recovery path.
    #[error("conditional write failed: item already exists")]
    PreconditionFailed,
    #[error("item is missing key attribute {0}")]
    MissingKeyAttribute(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The store capability. Conditional writes are atomic at the store: the
/// existence check and the insert are one operation, never a read followed
/// by a write.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Point lookup on the full key.
    async fn get_item(
        &self,
        partition: &str,
        sort: Option<&str>,
    ) -> Result<Option<Item>, StoreError>;

    /// Unconditional write; replaces any existing item with the same key.
    async fn put_item(&self, item: Item) -> Result<(), StoreError>;

    /// Atomic create. Fails with [`StoreError::PreconditionFailed`] when an
    /// item with the same key already exists.
    async fn put_item_if_absent(&self, item: Item) -> Result<(), StoreError>;

    /// All items sharing the given partition key value.
    async fn query_partition(&self, partition: &str) -> Result<Vec<Item>, StoreError>;
}

/// Store handles injected into the router. Created once by the hosting
/// process and shared by reference across request handler invocations.
#[derive(Clone)]
pub struct Stores {
    pub courses: Arc<dyn KeyValueStore>,
    pub transactions: Arc<dyn KeyValueStore>,
    pub videos: Arc<dyn KeyValueStore>,
    pub users: Arc<dyn KeyValueStore>,
    pub user_tenants: Arc<dyn KeyValueStore>,
}

impl Stores {
    /// Memory-backed stores with the service's key layout. Used by local
    /// deployments and tests.
    pub fn in_memory() -> Self {
        Self {
            courses: Arc::new(memory::MemoryStore::new(KeySchema::with_sort(
                "tenant_id",
                "course_id",
            ))),
            transactions: Arc::new(memory::MemoryStore::new(KeySchema::new("transaction_id"))),
            videos: Arc::new(memory::MemoryStore::new(KeySchema::with_sort(
                "course_id",
                "video_id",
            ))),
            users: Arc::new(memory::MemoryStore::new(KeySchema::new("user_id"))),
            user_tenants: Arc::new(memory::MemoryStore::new(KeySchema::new("user_id"))),
        }
    }
}
