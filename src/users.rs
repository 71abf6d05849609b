//! User-tenant directory reads and post-signup provisioning.

use std::sync::Arc;

use serde_json::Value;

use crate::error::AppError;
use crate::store::{AttrValue, Item, KeyValueStore};
use crate::utils::{non_empty_field, utc_now_iso};

/// Lookup of the tenant mapping provisioned for a confirmed user.
pub struct UserDirectory {
    mappings: Arc<dyn KeyValueStore>,
}

impl UserDirectory {
    pub fn new(mappings: Arc<dyn KeyValueStore>) -> Self {
        Self { mappings }
    }

    pub async fn tenant_for(&self, user_id: &str) -> Result<Item, AppError> {
        self.mappings
            .get_item(user_id, None)
            .await?
            .ok_or_else(|| AppError::UserMappingNotFound(user_id.to_string()))
    }
}

/// A confirmed signup delivered by the identity provider.
#[derive(Debug, Clone)]
pub struct ConfirmedSignup {
    pub user_id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
}

impl ConfirmedSignup {
    pub fn from_body(body: &Value) -> Result<Self, AppError> {
        let user_id =
            non_empty_field(body, "user_id").ok_or(AppError::MissingParameter("user_id"))?;
        Ok(Self {
            user_id,
            email: non_empty_field(body, "email"),
            username: non_empty_field(body, "username"),
            full_name: non_empty_field(body, "full_name"),
        })
    }
}

/// Post-signup provisioning: one user record, one user-tenant mapping.
///
/// The two writes are independent at-most-once side effects with no
/// atomicity between them. Each failure is caught and logged and aborts
/// neither the other write nor the caller's response.
pub struct ProvisioningService {
    users: Arc<dyn KeyValueStore>,
    mappings: Arc<dyn KeyValueStore>,
    default_tenant: String,
}

impl ProvisioningService {
    pub fn new(
        users: Arc<dyn KeyValueStore>,
        mappings: Arc<dyn KeyValueStore>,
        default_tenant: String,
    ) -> Self {
        Self {
            users,
            mappings,
            default_tenant,
        }
    }

    pub async fn provision(&self, signup: &ConfirmedSignup) {
        let created_at = utc_now_iso();
        let email = signup.email.clone().unwrap_or_default();
        let username = signup.username.clone().unwrap_or_else(|| email.clone());

        let mut user = Item::new();
        user.insert("user_id".to_string(), AttrValue::S(signup.user_id.clone()));
        user.insert("email".to_string(), AttrValue::S(email.clone()));
        user.insert("username".to_string(), AttrValue::S(username));
        user.insert(
            "full_name".to_string(),
            AttrValue::S(signup.full_name.clone().unwrap_or_default()),
        );
        user.insert("created_at".to_string(), AttrValue::S(created_at.clone()));
        user.insert("status".to_string(), AttrValue::S("active".to_string()));

        match self.users.put_item(user).await {
            Ok(()) => tracing::info!(user_id = %signup.user_id, "user record created"),
            Err(err) => tracing::error!(
                user_id = %signup.user_id,
                error = %err,
                "failed to create user record"
            ),
        }

        let mut mapping = Item::new();
        mapping.insert("user_id".to_string(), AttrValue::S(signup.user_id.clone()));
        mapping.insert(
            "tenant_id".to_string(),
            AttrValue::S(self.default_tenant.clone()),
        );
        mapping.insert("role".to_string(), AttrValue::S("student".to_string()));
        mapping.insert("email".to_string(), AttrValue::S(email));
        mapping.insert("created_at".to_string(), AttrValue::S(created_at));

        match self.mappings.put_item(mapping).await {
            Ok(()) => tracing::info!(user_id = %signup.user_id, "tenant mapping created"),
            Err(err) => tracing::error!(
                user_id = %signup.user_id,
                error = %err,
                "failed to create tenant mapping"
            ),
        }
    }
}
