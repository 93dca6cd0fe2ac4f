use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::{AuthUser, SignInInput, SignUpInput, UserProfile},
    errors::ServiceError,
    ApiResponse, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Register a new account. Vendor sign-up also creates the stall the
/// account will operate.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    summary = "Sign up",
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(input): Json<SignUpInput>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), ServiceError> {
    let session = state.services.auth.sign_up(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SessionResponse {
            token: session.token,
            user: session.user,
        })),
    ))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signin",
    summary = "Sign in",
    responses(
        (status = 200, description = "Signed in"),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(input): Json<SignInInput>,
) -> Result<Json<ApiResponse<SessionResponse>>, ServiceError> {
    let session = state.services.auth.sign_in(input).await?;
    Ok(Json(ApiResponse::success(SessionResponse {
        token: session.token,
        user: session.user,
    })))
}

/// Current session profile.
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    summary = "Get session",
    responses(
        (status = 200, description = "Session profile", body = ApiResponse<UserProfile>),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn session(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<UserProfile>>, ServiceError> {
    let profile = state.services.auth.profile(auth_user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// Sign out. Tokens are stateless, so this is an acknowledgement; clients
/// discard the token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signout",
    summary = "Sign out",
    responses((status = 200, description = "Signed out")),
    security(("Bearer" = []))
)]
pub async fn sign_out(
    _auth_user: AuthUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "signed_out": true }),
    )))
}
