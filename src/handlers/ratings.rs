use crate::{
    auth::AuthUser,
    entities::product_rating,
    errors::ServiceError,
    handlers::common::{caller, created_response, no_content_response},
    services::ratings::{RatingFilter, RatingInput, UpdateRatingInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/productrating",
    summary = "List ratings",
    params(RatingFilter),
    responses((status = 200, description = "Ratings, newest first", body = [product_rating::Model])),
    tag = "ratings"
)]
pub async fn list_ratings(
    State(state): State<AppState>,
    Query(filter): Query<RatingFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.ratings.list(filter).await?))
}

#[utoipa::path(
    post,
    path = "/productrating",
    summary = "Rate a product",
    request_body = RatingInput,
    responses(
        (status = 201, description = "Rating stored", body = product_rating::Model),
        (status = 400, description = "Rating outside 1..=5", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a customer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "ratings"
)]
pub async fn create_rating(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RatingInput>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    let rating = state.services.ratings.create(&caller, payload).await?;
    Ok(created_response(rating))
}

#[utoipa::path(
    get,
    path = "/productrating/{id}",
    summary = "Get a rating",
    params(("id" = Uuid, Path, description = "Rating id")),
    responses(
        (status = 200, description = "Rating", body = product_rating::Model),
        (status = 404, description = "Rating not found", body = crate::errors::ErrorResponse),
    ),
    tag = "ratings"
)]
pub async fn get_rating(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.ratings.get(id).await?))
}

#[utoipa::path(
    put,
    path = "/productrating/{id}",
    summary = "Update a rating",
    params(("id" = Uuid, Path, description = "Rating id")),
    request_body = UpdateRatingInput,
    responses(
        (status = 200, description = "Updated rating", body = product_rating::Model),
        (status = 403, description = "Not the author", body = crate::errors::ErrorResponse),
        (status = 404, description = "Rating not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "ratings"
)]
pub async fn update_rating(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRatingInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller(&state, &user).await?;
    Ok(Json(
        state
            .services
            .ratings
            .update(&caller, id, payload)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/productrating/{id}",
    summary = "Delete a rating",
    params(("id" = Uuid, Path, description = "Rating id")),
    responses(
        (status = 204, description = "Rating deleted"),
        (status = 403, description = "Not the author", body = crate::errors::ErrorResponse),
        (status = 404, description = "Rating not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "ratings"
)]
pub async fn delete_rating(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let caller = caller(&state, &user).await?;
    state.services.ratings.delete(&caller, id).await?;
    Ok(no_content_response())
}
