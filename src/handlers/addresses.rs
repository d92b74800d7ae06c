use crate::{
    auth::AuthUser,
    entities::customer_address,
    errors::ServiceError,
    handlers::common::{caller, created_response, no_content_response},
    services::addresses::{AddressInput, UpdateAddressInput},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/address",
    summary = "List addresses",
    description = "The caller's addresses; staff see every address",
    responses((status = 200, description = "Addresses", body = [customer_address::Model])),
    security(("Bearer" = [])),
    tag = "addresses"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(state.services.addresses.list(&caller).await?))
}

#[utoipa::path(
    get,
    path = "/addresses/{customer_id}",
    summary = "Addresses of one customer",
    params(("customer_id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Addresses", body = [customer_address::Model]),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "addresses"
)]
pub async fn customer_addresses(
    State(state): State<AppState>,
    user: AuthUser,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(
        state
            .services
            .addresses
            .for_customer(&caller, customer_id)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/address",
    summary = "Add an address",
    request_body = AddressInput,
    responses(
        (status = 201, description = "Address created", body = customer_address::Model),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "addresses"
)]
pub async fn create_address(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddressInput>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    let address = state.services.addresses.create(&caller, payload).await?;
    Ok(created_response(address))
}

#[utoipa::path(
    get,
    path = "/address/{id}",
    summary = "Get an address",
    params(("id" = Uuid, Path, description = "Address id")),
    responses(
        (status = 200, description = "Address", body = customer_address::Model),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Address not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "addresses"
)]
pub async fn get_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(state.services.addresses.get(&caller, id).await?))
}

#[utoipa::path(
    put,
    path = "/address/{id}",
    summary = "Update an address",
    params(("id" = Uuid, Path, description = "Address id")),
    request_body = UpdateAddressInput,
    responses(
        (status = 200, description = "Updated address", body = customer_address::Model),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Address not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "addresses"
)]
pub async fn update_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAddressInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(
        state
            .services
            .addresses
            .update(&caller, id, payload)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/address/{id}",
    summary = "Delete an address",
    params(("id" = Uuid, Path, description = "Address id")),
    responses(
        (status = 204, description = "Address deleted"),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Address not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "addresses"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    state.services.addresses.delete(&caller, id).await?;
    Ok(no_content_response())
}
