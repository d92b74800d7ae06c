use crate::{
    auth::AuthUser,
    entities::product_category,
    errors::ServiceError,
    handlers::common::{caller, created_response, no_content_response},
    services::catalog::{CategoryInput, CategoryWithStats},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryView {
    pub id: Uuid,
    pub title: String,
    pub detail: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<product_category::Model> for CategoryView {
    fn from(model: product_category::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            detail: model.detail,
            image: model.image,
            created_at: model.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/categories",
    summary = "List categories",
    responses((status = 200, description = "All categories", body = [CategoryView])),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories: Vec<CategoryView> = state
        .services
        .catalog
        .list_categories()
        .await?
        .into_iter()
        .map(CategoryView::from)
        .collect();
    Ok(Json(categories))
}

#[utoipa::path(
    get,
    path = "/categories-with-stats",
    summary = "Categories with their product counts",
    responses((status = 200, description = "Categories", body = [CategoryWithStats])),
    tag = "catalog"
)]
pub async fn categories_with_stats(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.catalog.categories_with_stats().await?))
}

#[utoipa::path(
    post,
    path = "/categories",
    summary = "Create a category",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = CategoryView),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is neither vendor nor staff", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CategoryInput>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    let category = state
        .services
        .catalog
        .create_category(&caller, payload)
        .await?;
    Ok(created_response(CategoryView::from(category)))
}

#[utoipa::path(
    get,
    path = "/category/{id}",
    summary = "Get a category",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = CategoryView),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.catalog.get_category(id).await?;
    Ok(Json(CategoryView::from(category)))
}

#[utoipa::path(
    put,
    path = "/category/{id}",
    summary = "Update a category",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Updated category", body = CategoryView),
        (status = 403, description = "Caller is neither vendor nor staff", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    let category = state
        .services
        .catalog
        .update_category(&caller, id, payload)
        .await?;
    Ok(Json(CategoryView::from(category)))
}

#[utoipa::path(
    delete,
    path = "/category/{id}",
    summary = "Delete a category",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    state.services.catalog.delete_category(&caller, id).await?;
    Ok(no_content_response())
}
