use crate::{
    auth::AuthUser,
    entities::product_statistics,
    errors::ServiceError,
    handlers::common::{caller, created_response, no_content_response, LimitQuery},
    services::{
        catalog::ProductSummary,
        interactions::{InteractionInput, InteractionView},
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/customer-interactions",
    summary = "Record an interaction",
    description = "Updates the caller's interaction row and the product counters together",
    request_body = InteractionInput,
    responses(
        (status = 201, description = "Interaction recorded", body = InteractionView),
        (status = 403, description = "Caller is not a customer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "interactions"
)]
pub async fn record_interaction(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<InteractionInput>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    let customer_id = match payload.customer_id {
        Some(id) if caller.is_staff => id,
        _ => caller.require_customer()?,
    };
    let row = state
        .services
        .interactions
        .record_interaction(customer_id, payload.product_id, payload.kind)
        .await?;
    Ok(created_response(InteractionView::from(row)))
}

/// Anonymous and non-customer callers get an empty list.
#[utoipa::path(
    get,
    path = "/customer-interactions",
    summary = "The caller's interactions",
    responses((status = 200, description = "Interactions", body = [InteractionView])),
    tag = "interactions"
)]
pub async fn list_interactions(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = state
        .services
        .accounts
        .optional_caller(user.as_ref())
        .await?;
    let rows = match caller.and_then(|c| c.customer_id) {
        Some(customer_id) => state
            .services
            .interactions
            .list_for_customer(customer_id)
            .await?
            .into_iter()
            .map(InteractionView::from)
            .collect(),
        None => Vec::new(),
    };
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/customer-interactions/{id}",
    summary = "Get an interaction",
    params(("id" = Uuid, Path, description = "Interaction id")),
    responses(
        (status = 200, description = "Interaction", body = InteractionView),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Interaction not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "interactions"
)]
pub async fn get_interaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    let row = state.services.interactions.get(&caller, id).await?;
    Ok(Json(InteractionView::from(row)))
}

#[utoipa::path(
    delete,
    path = "/customer-interactions/{id}",
    summary = "Delete an interaction",
    params(("id" = Uuid, Path, description = "Interaction id")),
    responses(
        (status = 204, description = "Interaction deleted"),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Interaction not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "interactions"
)]
pub async fn delete_interaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    state.services.interactions.delete(&caller, id).await?;
    Ok(no_content_response())
}

#[utoipa::path(
    get,
    path = "/product-statistics/{product_id}",
    summary = "Counters for a product",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Statistics", body = product_statistics::Model),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "interactions"
)]
pub async fn product_statistics(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        state
            .services
            .interactions
            .product_statistics(product_id)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/recommendations",
    summary = "Product recommendations",
    description = "Unseen products from categories the caller has interacted with, else a random sample",
    params(LimitQuery),
    responses((status = 200, description = "Recommended products", body = [ProductSummary])),
    tag = "interactions"
)]
pub async fn recommendations(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let limit = query
        .limit
        .unwrap_or(state.config.recommendations_default_limit);
    let customer_id = state
        .services
        .accounts
        .optional_caller(user.as_ref())
        .await?
        .and_then(|c| c.customer_id);
    Ok(Json(
        state
            .services
            .relationships
            .get_recommendations(customer_id, limit)
            .await?,
    ))
}
