use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    entities::review,
    errors::ServiceError,
    services::reviews::SubmitReviewInput,
    ApiResponse, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub stall_id: Uuid,
    pub food_rating: i32,
    pub service_rating: i32,
    pub food_comment: Option<String>,
    pub service_comment: Option<String>,
    pub anonymous: bool,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<review::Model> for ReviewResponse {
    fn from(model: review::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            stall_id: model.stall_id,
            food_rating: model.food_rating,
            service_rating: model.service_rating,
            food_comment: model.food_comment,
            service_comment: model.service_comment,
            anonymous: model.anonymous,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewListQuery {
    pub stall_id: Uuid,
}

/// Rate a completed order. One review per order; the stall's aggregate
/// rating updates in the same transaction.
#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    summary = "Submit review",
    request_body = SubmitReviewInput,
    responses(
        (status = 201, description = "Review recorded", body = ApiResponse<ReviewResponse>),
        (status = 400, description = "Order not completed or rating out of range", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already rated", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn submit_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<SubmitReviewInput>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewResponse>>), ServiceError> {
    let review = state.services.reviews.submit(auth_user.id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(review.into())),
    ))
}

/// A stall's reviews, newest first. Anonymous reviews stay anonymous - the
/// customer id never leaves the service.
#[utoipa::path(
    get,
    path = "/api/v1/reviews",
    summary = "List stall reviews",
    params(("stall_id" = Uuid, Query, description = "Stall id")),
    responses((status = 200, description = "Reviews", body = ApiResponse<Vec<ReviewResponse>>))
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<ApiResponse<Vec<ReviewResponse>>>, ServiceError> {
    let reviews = state.services.reviews.list_for_stall(query.stall_id).await?;
    Ok(Json(ApiResponse::success(
        reviews.into_iter().map(Into::into).collect(),
    )))
}
