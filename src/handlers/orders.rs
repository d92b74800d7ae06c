use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{caller, created_response, no_content_response},
    services::orders::{CreateOrderInput, ItemStatusInput, OrderDetail, OrderLine},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/orders",
    summary = "List orders",
    description = "The caller's orders; staff see every order",
    responses(
        (status = 200, description = "Orders, newest first", body = [OrderDetail]),
        (status = 403, description = "Caller is not a customer", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(state.services.orders.list_orders(&caller).await?))
}

#[utoipa::path(
    post,
    path = "/orders",
    summary = "Create an order",
    request_body = CreateOrderInput,
    responses(
        (status = 201, description = "Order created", body = OrderDetail),
        (status = 400, description = "No items or a quantity below one", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a customer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderInput>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    let customer_id = match payload.customer_id {
        Some(id) if caller.is_staff => id,
        _ => caller.require_customer()?,
    };
    let order = state
        .services
        .orders
        .create_order(customer_id, payload.items)
        .await?;
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/order/{id}",
    summary = "Get an order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with its items", body = OrderDetail),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(state.services.orders.get_order(&caller, id).await?))
}

#[utoipa::path(
    delete,
    path = "/order/{id}",
    summary = "Delete an order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    state.services.orders.delete_order(&caller, id).await?;
    Ok(no_content_response())
}

#[utoipa::path(
    put,
    path = "/order-item/{id}/status",
    summary = "Set an order line's fulfillment status",
    params(("id" = Uuid, Path, description = "Order item id")),
    request_body = ItemStatusInput,
    responses(
        (status = 200, description = "Updated line", body = OrderLine),
        (status = 403, description = "Not the vendor of the product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn update_item_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ItemStatusInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(
        state
            .services
            .orders
            .update_item_status(&caller, id, payload.status)
            .await?,
    ))
}
