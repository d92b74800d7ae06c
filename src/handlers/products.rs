use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{caller, created_response, no_content_response, LimitQuery, ProductFilter},
    services::catalog::{
        ProductDetail, ProductImageInput, ProductImageView, ProductInput, ProductQuery,
        ProductSummary, UpdateProductInput,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/products",
    summary = "List products",
    description = "Filter by category id or title fragment; `featured=true` returns the newest products",
    params(ProductQuery),
    responses((status = 200, description = "Products", body = [ProductSummary])),
    tag = "catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.catalog.list_products(query).await?))
}

#[utoipa::path(
    get,
    path = "/products/vendor/{vendor_id}",
    summary = "Products sold by a vendor",
    params(("vendor_id" = Uuid, Path, description = "Vendor id")),
    responses((status = 200, description = "Products", body = [ProductSummary])),
    tag = "catalog"
)]
pub async fn vendor_products(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.catalog.vendor_products(vendor_id).await?))
}

#[utoipa::path(
    get,
    path = "/product/{id}",
    summary = "Product detail",
    description = "Includes images, ratings and related products",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductDetail),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let limit = state.config.related_products_limit;
    Ok(Json(state.services.catalog.product_detail(id, limit).await?))
}

#[utoipa::path(
    get,
    path = "/product/{id}/related",
    summary = "Related products",
    description = "Explicit relationships first, then products from the same category",
    params(("id" = Uuid, Path, description = "Product id"), LimitQuery),
    responses(
        (status = 200, description = "Related products", body = [ProductSummary]),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn related(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let limit = query.limit.unwrap_or(state.config.related_products_limit);
    Ok(Json(state.services.relationships.get_related(id, limit).await?))
}

#[utoipa::path(
    post,
    path = "/product",
    summary = "Create a product",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = ProductSummary),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a vendor", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category or vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProductInput>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    let product = state.services.catalog.create_product(&caller, payload).await?;
    Ok(created_response(product))
}

#[utoipa::path(
    put,
    path = "/product/{id}",
    summary = "Update a product",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Updated product", body = ProductSummary),
        (status = 403, description = "Not the owning vendor", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(
        state
            .services
            .catalog
            .update_product(&caller, id, payload)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/product/{id}",
    summary = "Delete a product",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, description = "Not the owning vendor", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    state.services.catalog.delete_product(&caller, id).await?;
    Ok(no_content_response())
}

// Images

#[utoipa::path(
    get,
    path = "/productimg",
    summary = "List product images",
    params(ProductFilter),
    responses((status = 200, description = "Images", body = [ProductImageView])),
    tag = "catalog"
)]
pub async fn list_images(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.catalog.list_images(filter.product_id).await?))
}

#[utoipa::path(
    post,
    path = "/productimg",
    summary = "Attach an image to a product",
    request_body = ProductImageInput,
    responses(
        (status = 201, description = "Image added", body = ProductImageView),
        (status = 403, description = "Not the owning vendor", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn add_image(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProductImageInput>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    let image = state.services.catalog.add_image(&caller, payload).await?;
    Ok(created_response(image))
}

#[utoipa::path(
    get,
    path = "/productimg/{id}",
    summary = "Get a product image",
    params(("id" = Uuid, Path, description = "Image id")),
    responses(
        (status = 200, description = "Image", body = ProductImageView),
        (status = 404, description = "Image not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.catalog.get_image(id).await?))
}

#[utoipa::path(
    delete,
    path = "/productimg/{id}",
    summary = "Remove a product image",
    params(("id" = Uuid, Path, description = "Image id")),
    responses(
        (status = 204, description = "Image removed"),
        (status = 403, description = "Not the owning vendor", body = crate::errors::ErrorResponse),
        (status = 404, description = "Image not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn delete_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    state.services.catalog.delete_image(&caller, id).await?;
    Ok(no_content_response())
}
