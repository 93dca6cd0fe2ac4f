use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::pickup_slot,
    errors::ServiceError,
    services::slots::MealPeriod,
    ApiResponse, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotResponse {
    pub id: Uuid,
    pub time: String,
    pub capacity: i32,
    pub booked: i32,
    pub remaining: i32,
    pub available: bool,
}

impl From<pickup_slot::Model> for SlotResponse {
    fn from(model: pickup_slot::Model) -> Self {
        let available = model.is_available();
        let remaining = model.remaining();
        Self {
            id: model.id,
            time: model.time,
            capacity: model.capacity,
            booked: model.booked,
            remaining,
            available,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    /// Defaults to today
    pub date: Option<NaiveDate>,
    pub period: Option<MealPeriod>,
}

/// Pickup slots for a date, optionally one meal period. Full buckets are
/// included with `available: false` so clients can grey them out; they are
/// never bookable.
#[utoipa::path(
    get,
    path = "/api/v1/slots",
    summary = "List pickup slots",
    params(
        ("date" = Option<String>, Query, description = "ISO date, defaults to today"),
        ("period" = Option<String>, Query, description = "breakfast, lunch, or dinner"),
    ),
    responses((status = 200, description = "Pickup slots", body = ApiResponse<Vec<SlotResponse>>))
)]
pub async fn list_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<ApiResponse<Vec<SlotResponse>>>, ServiceError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let slots = state.services.slots.list_slots(date, query.period).await?;
    Ok(Json(ApiResponse::success(
        slots.into_iter().map(Into::into).collect(),
    )))
}
