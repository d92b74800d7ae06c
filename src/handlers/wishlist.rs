use crate::{
    auth::AuthUser,
    entities::wishlist_item,
    errors::ServiceError,
    handlers::common::{caller, created_response, no_content_response, success_response},
    services::wishlist::{WishlistEntry, WishlistInput},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/wishlistitem",
    summary = "List wishlist rows",
    description = "The caller's rows; staff see every row",
    responses((status = 200, description = "Wishlist rows", body = [wishlist_item::Model])),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn list_items(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(state.services.wishlist.list(&caller).await?))
}

/// 201 when the row is new, 200 with the stored row when it already existed.
#[utoipa::path(
    post,
    path = "/wishlistitem",
    summary = "Add a product to a wishlist",
    request_body = WishlistInput,
    responses(
        (status = 201, description = "Added", body = wishlist_item::Model),
        (status = 200, description = "Already present", body = wishlist_item::Model),
        (status = 403, description = "Caller is not a customer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<WishlistInput>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    let customer_id = match payload.customer_id {
        Some(id) if caller.is_staff => id,
        _ => caller.require_customer()?,
    };
    let (row, created) = state
        .services
        .wishlist
        .add(customer_id, payload.product_id)
        .await?;
    Ok(if created {
        created_response(row)
    } else {
        success_response(row)
    })
}

#[utoipa::path(
    get,
    path = "/wishlistitem/{id}",
    summary = "Get a wishlist row",
    params(("id" = Uuid, Path, description = "Wishlist row id")),
    responses(
        (status = 200, description = "Wishlist row", body = wishlist_item::Model),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Wishlist row not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn get_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(state.services.wishlist.get(&caller, id).await?))
}

#[utoipa::path(
    delete,
    path = "/wishlistitem/{id}",
    summary = "Remove a wishlist row",
    params(("id" = Uuid, Path, description = "Wishlist row id")),
    responses(
        (status = 204, description = "Removed"),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Wishlist row not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    state.services.wishlist.remove(&caller, id).await?;
    Ok(no_content_response())
}

#[utoipa::path(
    get,
    path = "/wishlist/{customer_id}",
    summary = "A customer's wishlist with product details",
    params(("customer_id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Wishlist, newest first", body = [WishlistEntry]),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn user_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    caller.ensure_customer(customer_id)?;
    Ok(Json(
        state
            .services
            .wishlist
            .user_wishlist(customer_id, None)
            .await?,
    ))
}
