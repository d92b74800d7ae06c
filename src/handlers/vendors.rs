use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{caller, created_response, no_content_response},
    services::{
        accounts::{CreateVendorInput, UpdateVendorInput, VendorView},
        catalog::{ProductInput, ProductSummary},
        interactions::VendorStatistics,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/vendors",
    summary = "List vendors",
    responses((status = 200, description = "All vendors", body = [VendorView])),
    tag = "vendors"
)]
pub async fn list_vendors(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.accounts.list_vendors().await?))
}

#[utoipa::path(
    post,
    path = "/vendors",
    summary = "Create a vendor (staff)",
    request_body = CreateVendorInput,
    responses(
        (status = 201, description = "Vendor created", body = VendorView),
        (status = 400, description = "Invalid input or username taken", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not staff", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateVendorInput>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    let vendor = state.services.accounts.create_vendor(&caller, payload).await?;
    Ok(created_response(vendor))
}

#[utoipa::path(
    get,
    path = "/vendor/{id}",
    summary = "Get a vendor",
    params(("id" = Uuid, Path, description = "Vendor id")),
    responses(
        (status = 200, description = "Vendor", body = VendorView),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn get_vendor(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.accounts.get_vendor(id).await?))
}

#[utoipa::path(
    put,
    path = "/vendor/{id}",
    summary = "Update a vendor",
    params(("id" = Uuid, Path, description = "Vendor id")),
    request_body = UpdateVendorInput,
    responses(
        (status = 200, description = "Updated vendor", body = VendorView),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn update_vendor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVendorInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(
        state
            .services
            .accounts
            .update_vendor(&caller, id, payload)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/vendor/{id}",
    summary = "Delete a vendor",
    params(("id" = Uuid, Path, description = "Vendor id")),
    responses(
        (status = 204, description = "Vendor deleted"),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn delete_vendor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    state.services.accounts.delete_vendor(&caller, id).await?;
    Ok(no_content_response())
}

#[utoipa::path(
    get,
    path = "/vendor/products",
    summary = "The caller's own products",
    responses(
        (status = 200, description = "Products", body = [ProductSummary]),
        (status = 403, description = "Caller is not a vendor", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn own_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    let vendor_id = caller.require_vendor()?;
    Ok(Json(state.services.catalog.vendor_products(vendor_id).await?))
}

#[utoipa::path(
    post,
    path = "/vendor/products",
    summary = "Create a product for the caller",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = ProductSummary),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a vendor", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn create_own_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut payload): Json<ProductInput>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    payload.vendor_id = Some(caller.require_vendor()?);
    let product = state.services.catalog.create_product(&caller, payload).await?;
    Ok(created_response(product))
}

#[utoipa::path(
    get,
    path = "/vendor/statistics",
    summary = "Counters for each of the caller's products",
    responses(
        (status = 200, description = "Statistics", body = VendorStatistics),
        (status = 403, description = "Caller is not a vendor", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn own_statistics(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    let vendor_id = caller.require_vendor()?;
    Ok(Json(
        state
            .services
            .interactions
            .vendor_statistics(vendor_id)
            .await?,
    ))
}
