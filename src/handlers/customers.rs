use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{caller, no_content_response},
    services::accounts::{CustomerView, UpdateCustomerInput},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/customers",
    summary = "List customers",
    responses((status = 200, description = "All customers", body = [CustomerView])),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.accounts.list_customers().await?))
}

#[utoipa::path(
    get,
    path = "/customer/{id}",
    summary = "Get a customer",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer", body = CustomerView),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.accounts.get_customer(id).await?))
}

#[utoipa::path(
    put,
    path = "/customer/{id}",
    summary = "Update a customer",
    params(("id" = Uuid, Path, description = "Customer id")),
    request_body = UpdateCustomerInput,
    responses(
        (status = 200, description = "Updated customer", body = CustomerView),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(
        state
            .services
            .accounts
            .update_customer(&caller, id, payload)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/customer/{id}",
    summary = "Delete a customer",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    state.services.accounts.delete_customer(&caller, id).await?;
    Ok(no_content_response())
}
