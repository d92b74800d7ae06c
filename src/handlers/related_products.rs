use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{caller, created_response, no_content_response, ProductFilter},
    services::relationships::{RelatedProductInput, RelatedProductView, UpdateRelatedProductInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/related-products",
    summary = "List product relationships",
    params(ProductFilter),
    responses((status = 200, description = "Relationships, most relevant first", body = [RelatedProductView])),
    tag = "relationships"
)]
pub async fn list_edges(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        state
            .services
            .relationships
            .list_edges(filter.product_id)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/related-products",
    summary = "Relate two products",
    request_body = RelatedProductInput,
    responses(
        (status = 201, description = "Relationship created", body = RelatedProductView),
        (status = 400, description = "Self relationship or duplicate pair", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not the owner of the source product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "relationships"
)]
pub async fn create_edge(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RelatedProductInput>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    let edge = state
        .services
        .relationships
        .create_edge(&caller, payload)
        .await?;
    Ok(created_response(edge))
}

#[utoipa::path(
    get,
    path = "/related-products/{id}",
    summary = "Get a product relationship",
    params(("id" = Uuid, Path, description = "Relationship id")),
    responses(
        (status = 200, description = "Relationship", body = RelatedProductView),
        (status = 404, description = "Relationship not found", body = crate::errors::ErrorResponse),
    ),
    tag = "relationships"
)]
pub async fn get_edge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.relationships.get_edge(id).await?))
}

#[utoipa::path(
    put,
    path = "/related-products/{id}",
    summary = "Update a product relationship",
    params(("id" = Uuid, Path, description = "Relationship id")),
    request_body = UpdateRelatedProductInput,
    responses(
        (status = 200, description = "Updated relationship", body = RelatedProductView),
        (status = 403, description = "Not the owner of the source product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Relationship not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "relationships"
)]
pub async fn update_edge(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRelatedProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(
        state
            .services
            .relationships
            .update_edge(&caller, id, payload)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/related-products/{id}",
    summary = "Delete a product relationship",
    params(("id" = Uuid, Path, description = "Relationship id")),
    responses(
        (status = 204, description = "Relationship deleted"),
        (status = 403, description = "Not the owner of the source product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Relationship not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "relationships"
)]
pub async fn delete_edge(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    state.services.relationships.delete_edge(&caller, id).await?;
    Ok(no_content_response())
}
