use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::caller,
    services::dashboard::{CustomerDashboard, VendorDashboard},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/customer/dashboard/{id}",
    summary = "Customer dashboard",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Summary", body = CustomerDashboard),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Neither the owner nor staff", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "dashboard"
)]
pub async fn customer_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(
        state
            .services
            .dashboard
            .customer_dashboard(&caller, id)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/vendor/dashboard/{id}",
    summary = "Vendor dashboard",
    params(("id" = Uuid, Path, description = "Vendor id")),
    responses(
        (status = 200, description = "Summary", body = VendorDashboard),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Neither the owner nor staff", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "dashboard"
)]
pub async fn vendor_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(
        state
            .services
            .dashboard
            .vendor_dashboard(&caller, id)
            .await?,
    ))
}
