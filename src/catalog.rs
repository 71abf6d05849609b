//! Read-only catalog queries. Every course read is scoped to exactly one
//! tenant; the tenant id is the partition key.

use std::sync::Arc;

use crate::error::AppError;
use crate::store::{AttrValue, Item, KeyValueStore};

pub struct CatalogReader {
    store: Arc<dyn KeyValueStore>,
}

impl CatalogReader {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Every course for one tenant. An empty catalog is a valid result,
    /// not an error.
    pub async fn list(&self, tenant_id: &str) -> Result<Vec<Item>, AppError> {
        if tenant_id.trim().is_empty() {
            return Err(AppError::MissingTenantHeader);
        }
        Ok(self.store.query_partition(tenant_id).await?)
    }

    /// Point lookup on (tenant_id, course_id).
    pub async fn get(&self, tenant_id: &str, course_id: &str) -> Result<Item, AppError> {
        if tenant_id.trim().is_empty() {
            return Err(AppError::MissingTenantHeader);
        }
        self.store
            .get_item(tenant_id, Some(course_id))
            .await?
            .ok_or(AppError::CourseNotFound)
    }
}

/// Per-course video listings. Keyed by course alone; not tenant-scoped.
pub struct VideoLibrary {
    store: Arc<dyn KeyValueStore>,
}

impl VideoLibrary {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn list_for_course(&self, course_id: &str) -> Result<Vec<Item>, AppError> {
        let mut videos = self.store.query_partition(course_id).await?;
        videos.sort_by(|a, b| video_id(a).cmp(video_id(b)));
        Ok(videos)
    }
}

fn video_id(item: &Item) -> &str {
    item.get("video_id").and_then(AttrValue::as_s).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::KeySchema;
    use bigdecimal::BigDecimal;

    fn course_store() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new(KeySchema::with_sort(
            "tenant_id",
            "course_id",
        )))
    }

    fn course(tenant: &str, id: &str, price: u32) -> Item {
        let mut item = Item::new();
        item.insert("tenant_id".to_string(), AttrValue::S(tenant.to_string()));
        item.insert("course_id".to_string(), AttrValue::S(id.to_string()));
        item.insert("price".to_string(), AttrValue::N(BigDecimal::from(price)));
        item
    }

    #[tokio::test]
    async fn list_returns_only_the_requested_tenant() {
        let store = course_store();
        store.put_item(course("acme", "c1", 500)).await.unwrap();
        store.put_item(course("globex", "c9", 900)).await.unwrap();

        let reader = CatalogReader::new(store);
        let items = reader.list("acme").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].get("course_id").unwrap().as_s(), Some("c1"));
    }

    #[tokio::test]
    async fn list_with_no_courses_is_empty_success() {
        let reader = CatalogReader::new(course_store());
        assert!(reader.list("acme").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_tenant_is_rejected_before_the_query() {
        let reader = CatalogReader::new(course_store());
        assert!(matches!(
            reader.list("").await.unwrap_err(),
            AppError::MissingTenantHeader
        ));
        assert!(matches!(
            reader.get("  ", "c1").await.unwrap_err(),
            AppError::MissingTenantHeader
        ));
    }

    #[tokio::test]
    async fn get_distinguishes_present_from_absent() {
        let store = course_store();
        store.put_item(course("acme", "c1", 500)).await.unwrap();

        let reader = CatalogReader::new(store);
        let item = reader.get("acme", "c1").await.unwrap();
        assert_eq!(item.get("tenant_id").unwrap().as_s(), Some("acme"));

        assert!(matches!(
            reader.get("acme", "c2").await.unwrap_err(),
            AppError::CourseNotFound
        ));
        // Same course id under a different tenant stays invisible.
        assert!(matches!(
            reader.get("globex", "c1").await.unwrap_err(),
            AppError::CourseNotFound
        ));
    }

    #[tokio::test]
    async fn videos_come_back_sorted_by_video_id() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new(KeySchema::with_sort(
            "course_id",
            "video_id",
        )));
        for vid in ["v3", "v1", "v2"] {
            let mut item = Item::new();
            item.insert("course_id".to_string(), AttrValue::S("c1".into()));
            item.insert("video_id".to_string(), AttrValue::S(vid.to_string()));
            store.put_item(item).await.unwrap();
        }

        let library = VideoLibrary::new(store);
        let videos = library.list_for_course("c1").await.unwrap();
        let ids: Vec<&str> = videos.iter().map(|v| video_id(v)).collect();
        assert_eq!(ids, vec!["v1", "v2", "v3"]);
    }
}
