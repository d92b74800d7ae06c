use crate::{
    auth::TokenPair,
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    services::accounts::{AccountRole, LoginInput, RegisterInput, RegisteredAccount},
    AppState,
};
use axum::{
    extract::{Form, FromRequest, Json, Request, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

/// Body returned by `/login`, whatever the outcome
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum LoginResponse {
    Success(LoginSuccessBody),
    Failure(LoginFailureBody),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginSuccessBody {
    pub bool: bool,
    pub user: String,
    pub uid: Uuid,
    pub access: String,
    pub refresh: String,
    pub user_type: AccountRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginFailureBody {
    pub bool: bool,
    pub msg: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[utoipa::path(
    post,
    path = "/register",
    summary = "Register an account",
    description = "Creates an identity with a customer or vendor record",
    request_body = RegisterInput,
    responses(
        (status = 201, description = "Account created", body = RegisteredAccount),
        (status = 400, description = "Missing fields or username taken", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterInput>,
) -> Result<Response, ServiceError> {
    let account = state.services.accounts.register(payload).await?;
    Ok(created_response(account))
}

/// Always answers 200; failures are reported in the body. Accepts JSON or
/// form-encoded credentials.
#[utoipa::path(
    post,
    path = "/login",
    summary = "Log in",
    request_body(
        content(
            (LoginInput = "application/json"),
            (LoginInput = "application/x-www-form-urlencoded")
        )
    ),
    responses(
        (status = 200, description = "Outcome of the login attempt", body = LoginResponse),
    ),
    tag = "auth"
)]
pub async fn login(State(state): State<AppState>, request: Request) -> Response {
    let payload = match read_credentials(&state, request).await {
        Ok(payload) => payload,
        Err(msg) => return login_failure(msg),
    };

    match state.services.accounts.login(payload).await {
        Ok(success) => {
            info!(user_id = %success.user.id, "user logged in");
            success_response(LoginResponse::Success(LoginSuccessBody {
                bool: true,
                user: success.user.username,
                uid: success.user.id,
                access: success.tokens.access_token,
                refresh: success.tokens.refresh_token,
                user_type: success.user_type,
                customer_id: success.customer_id,
                vendor_id: success.vendor_id,
            }))
        }
        Err(ServiceError::AuthError(msg)) | Err(ServiceError::ValidationError(msg)) => {
            login_failure(msg)
        }
        Err(other) => {
            error!(error = %other, "login failed");
            login_failure(LOGIN_UNAVAILABLE.to_string())
        }
    }
}

const LOGIN_UNAVAILABLE: &str = "Login is temporarily unavailable.";

async fn read_credentials(state: &AppState, request: Request) -> Result<LoginInput, String> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        Form::<LoginInput>::from_request(request, state)
            .await
            .map(|Form(input)| input)
            .map_err(|rejection| rejection.body_text())
    } else {
        Json::<LoginInput>::from_request(request, state)
            .await
            .map(|Json(input)| input)
            .map_err(|rejection| rejection.body_text())
    }
}

fn login_failure(msg: String) -> Response {
    success_response(LoginResponse::Failure(LoginFailureBody { bool: false, msg }))
}

#[utoipa::path(
    post,
    path = "/token/refresh",
    summary = "Refresh tokens",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Invalid or expired refresh token", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let pair = state.services.accounts.refresh(&payload.refresh).await?;
    Ok(Json(pair))
}
