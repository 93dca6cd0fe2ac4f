use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    entities::stall,
    errors::ServiceError,
    services::queue::{QueueInfo, NO_ORDERS},
    ApiResponse, AppState,
};

/// Stall listing entry, decorated with the live queue snapshot.
#[derive(Debug, Serialize, ToSchema)]
pub struct StallResponse {
    pub id: Uuid,
    pub name: String,
    pub stall_number: i32,
    pub is_open: bool,
    pub rating: f64,
    pub total_ratings: i32,
    pub queue_size: u64,
    pub next_pickup: String,
}

impl StallResponse {
    fn from_model(model: stall::Model, queue: Option<&QueueInfo>) -> Self {
        Self {
            id: model.id,
            name: model.name,
            stall_number: model.stall_number,
            is_open: model.is_open,
            rating: model.rating,
            total_ratings: model.total_ratings,
            queue_size: queue.map(|q| q.queue_size).unwrap_or(0),
            next_pickup: queue
                .map(|q| q.next_pickup.clone())
                .unwrap_or_else(|| NO_ORDERS.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetOpenRequest {
    pub is_open: bool,
}

/// List stalls, sorted by stall number.
#[utoipa::path(
    get,
    path = "/api/v1/stalls",
    summary = "List stalls",
    responses((status = 200, description = "Stalls with live queue info", body = ApiResponse<Vec<StallResponse>>))
)]
pub async fn list_stalls(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<StallResponse>>>, ServiceError> {
    let stalls = state.services.catalog.list_stalls().await?;
    let queues = state.services.queue.stall_queues().await?;

    let items = stalls
        .into_iter()
        .map(|s| {
            let queue = queues.get(&s.id);
            StallResponse::from_model(s, queue)
        })
        .collect();

    Ok(Json(ApiResponse::success(items)))
}

/// Search stalls by name, case-insensitive.
#[utoipa::path(
    get,
    path = "/api/v1/stalls/search",
    summary = "Search stalls",
    params(("q" = String, Query, description = "Name fragment to match")),
    responses((status = 200, description = "Matching stalls", body = ApiResponse<Vec<StallResponse>>))
)]
pub async fn search_stalls(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<StallResponse>>>, ServiceError> {
    let stalls = state.services.catalog.search_stalls(&query.q).await?;
    let queues = state.services.queue.stall_queues().await?;

    let items = stalls
        .into_iter()
        .map(|s| {
            let queue = queues.get(&s.id);
            StallResponse::from_model(s, queue)
        })
        .collect();

    Ok(Json(ApiResponse::success(items)))
}

/// Fetch one stall.
#[utoipa::path(
    get,
    path = "/api/v1/stalls/{id}",
    summary = "Get stall",
    params(("id" = Uuid, Path, description = "Stall id")),
    responses(
        (status = 200, description = "Stall detail", body = ApiResponse<StallResponse>),
        (status = 404, description = "Stall not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_stall(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<StallResponse>>, ServiceError> {
    let stall = state.services.catalog.get_stall(id).await?;
    let queues = state.services.queue.stall_queues().await?;

    Ok(Json(ApiResponse::success(StallResponse::from_model(
        stall,
        queues.get(&id),
    ))))
}

/// Vendor open/close toggle for their own stall.
#[utoipa::path(
    patch,
    path = "/api/v1/stalls/{id}/open",
    summary = "Open or close stall",
    params(("id" = Uuid, Path, description = "Stall id")),
    request_body = SetOpenRequest,
    responses(
        (status = 200, description = "Stall updated", body = ApiResponse<StallResponse>),
        (status = 403, description = "Not the stall's vendor", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn set_open(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<SetOpenRequest>,
) -> Result<Json<ApiResponse<StallResponse>>, ServiceError> {
    let own_stall = auth_user.require_vendor_stall()?;
    if own_stall != id {
        return Err(ServiceError::Forbidden(
            "You can only manage your own stall".to_string(),
        ));
    }

    let stall = state.services.catalog.set_open(id, request.is_open).await?;
    let queues = state.services.queue.stall_queues().await?;

    Ok(Json(ApiResponse::success(StallResponse::from_model(
        stall,
        queues.get(&id),
    ))))
}
