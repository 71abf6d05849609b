//! Tenant-scoped request gateway: normalization, routing, dispatch and
//! response formatting.

pub mod event;
pub mod response;
pub mod router;

use serde_json::json;

use crate::catalog::{CatalogReader, VideoLibrary};
use crate::error::AppError;
use crate::ledger::{LedgerWriter, TransactionNotice};
use crate::orders::OrderService;
use crate::razorpay::RazorpayClient;
use crate::store::Stores;
use crate::users::{ConfirmedSignup, ProvisioningService, UserDirectory};

pub use event::{GatewayEvent, NormalizedRequest};
pub use response::ApiResponse;
pub use router::Route;

/// Routes normalized requests to the operations behind them. Holds the
/// injected store capabilities; constructed once by the hosting process and
/// shared across request handler invocations.
pub struct Dispatcher {
    catalog: CatalogReader,
    videos: VideoLibrary,
    ledger: LedgerWriter,
    users: UserDirectory,
    provisioning: ProvisioningService,
    orders: OrderService,
}

impl Dispatcher {
    pub fn new(stores: Stores, gateway: Option<RazorpayClient>, default_tenant: String) -> Self {
        Self {
            catalog: CatalogReader::new(stores.courses.clone()),
            videos: VideoLibrary::new(stores.videos),
            ledger: LedgerWriter::new(stores.transactions),
            users: UserDirectory::new(stores.user_tenants.clone()),
            provisioning: ProvisioningService::new(
                stores.users,
                stores.user_tenants,
                default_tenant,
            ),
            orders: OrderService::new(stores.courses, gateway),
        }
    }

    /// Full request lifecycle: normalize, route, execute, format. Never
    /// panics; every failure becomes an error envelope.
    pub async fn dispatch(&self, raw: GatewayEvent) -> ApiResponse {
        let request = match event::normalize(raw) {
            Ok(request) => request,
            Err(err) => return ApiResponse::from_error(&err),
        };

        let route = match router::resolve(&request) {
            Some(route) => route,
            None => return ApiResponse::from_error(&AppError::UnknownRoute),
        };

        // Tenant-scoped routes stop here; the store is never queried
        // without a tenant.
        if route.requires_tenant() && request.tenant_id.is_none() {
            return ApiResponse::from_error(&AppError::MissingTenantHeader);
        }

        match self.execute(route, request).await {
            Ok(response) => response,
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    async fn execute(
        &self,
        route: Route,
        request: NormalizedRequest,
    ) -> Result<ApiResponse, AppError> {
        match route {
            Route::Preflight => Ok(ApiResponse::ok(json!({
                "message": "CORS preflight success"
            }))),

            Route::ListCourses => {
                let tenant_id = request.tenant_id.as_deref().unwrap_or_default();
                let items = self.catalog.list(tenant_id).await?;
                Ok(ApiResponse::ok(json!({
                    "items": response::items_to_json(&items)
                })))
            }

            Route::GetCourse { course_id } => {
                let course_id = extract_id(&request, "course_id", course_id)?;
                let tenant_id = request.tenant_id.as_deref().unwrap_or_default();
                let item = self.catalog.get(tenant_id, &course_id).await?;
                Ok(ApiResponse::ok(response::item_to_json(&item)))
            }

            Route::ListCourseVideos { course_id } => {
                let course_id = extract_id(&request, "course_id", course_id)?;
                let videos = self.videos.list_for_course(&course_id).await?;
                Ok(ApiResponse::ok(json!({
                    "course_id": course_id,
                    "count": videos.len(),
                    "videos": response::items_to_json(&videos),
                })))
            }

            Route::GetUserTenant { user_id } => {
                let user_id = extract_id(&request, "user_id", user_id)
                    .or_else(|_| {
                        request
                            .query_params
                            .get("user_id")
                            .filter(|v| !v.is_empty())
                            .cloned()
                            .ok_or(AppError::MissingParameter("user_id"))
                    })?;
                let mapping = self.users.tenant_for(&user_id).await?;
                Ok(ApiResponse::ok(response::item_to_json(&mapping)))
            }

            Route::RecordTransaction => {
                let notice = TransactionNotice::from_body(&request.body)?;
                let receipt = self
                    .ledger
                    .record(&notice, request.tenant_id.as_deref())
                    .await?;
                Ok(ApiResponse::ok(json!({
                    "message": "Transaction updated successfully",
                    "transaction_id": receipt.transaction_id,
                    "status": receipt.status.as_str(),
                    "timestamp": receipt.timestamp,
                })))
            }

            Route::CreateOrder => {
                let order = self.orders.create(&request.body).await?;
                Ok(ApiResponse::ok(order))
            }

            Route::ConfirmSignup => {
                let signup = ConfirmedSignup::from_body(&request.body)?;
                self.provisioning.provision(&signup).await;
                Ok(ApiResponse::ok(json!({
                    "message": "Signup confirmation processed",
                    "user_id": signup.user_id,
                })))
            }
        }
    }
}

/// Structured path-parameter field first, raw path segment second. Values
/// are percent-decoded before use as lookup keys.
fn extract_id(
    request: &NormalizedRequest,
    name: &'static str,
    from_path: Option<String>,
) -> Result<String, AppError> {
    request
        .path_params
        .get(name)
        .filter(|v| !v.is_empty())
        .cloned()
        .or(from_path)
        .map(|raw| router::decode_segment(&raw))
        .ok_or(AppError::MissingParameter(name))
}
