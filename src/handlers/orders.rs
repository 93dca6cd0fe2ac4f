use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    entities::order::{self, OrderStatus, PaymentMethod},
    entities::order_item,
    errors::ServiceError,
    services::orders::{OrderDetails, OrderLine, OrderViewer, PlaceOrderInput, SalesSummary},
    services::queue::queue_position_in,
    ApiResponse, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub line_total: i64,
}

impl From<&order_item::Model> for OrderItemResponse {
    fn from(model: &order_item::Model) -> Self {
        Self {
            id: model.id,
            menu_item_id: model.menu_item_id,
            name: model.name.clone(),
            unit_price: model.unit_price,
            quantity: model.quantity,
            line_total: model.line_total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: i32,
    pub customer_name: String,
    pub stall_id: Uuid,
    pub stall_name: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub pickup_date: NaiveDate,
    pub pickup_time: String,
    pub notes: Option<String>,
    pub total_amount: i64,
    pub items: Vec<OrderItemResponse>,
    /// FIFO rank among the stall's unresolved orders; absent once the
    /// order is ready or beyond
    pub queue_position: Option<u64>,
    pub created_at: chrono::DateTime<Utc>,
}

fn map_order(details: &OrderDetails, unresolved: &[order::Model]) -> OrderResponse {
    let order = &details.order;
    let queue_position = order
        .status
        .is_unresolved()
        .then(|| queue_position_in(unresolved, order) as u64);

    OrderResponse {
        id: order.id,
        order_number: order.order_number,
        customer_name: order.customer_name.clone(),
        stall_id: order.stall_id,
        stall_name: order.stall_name.clone(),
        status: order.status,
        payment_method: order.payment_method,
        pickup_date: order.pickup_date,
        pickup_time: order.pickup_time.clone(),
        notes: order.notes.clone(),
        total_amount: order.total_amount,
        items: details.items.iter().map(Into::into).collect(),
        queue_position,
        created_at: order.created_at,
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    /// Defaults to today
    pub pickup_date: Option<NaiveDate>,
    pub pickup_time: String,
    /// Overrides the cart's notes when present
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    /// Restrict to orders created today
    #[serde(default)]
    pub today: bool,
}

/// Checkout: turns the caller's cart into an order.
///
/// Stock re-validation, the stock decrement, the slot reservation, and the
/// order insert happen in one transaction; the cart is cleared only after
/// it commits.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Place order",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Empty cart or invalid pickup time", body = crate::errors::ErrorResponse),
        (status = 422, description = "Out of stock or slot full", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn place_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    let cart = state.services.cart.get(auth_user.id);
    let stall_id = cart.stall_id.ok_or_else(|| {
        ServiceError::ValidationError("Cannot place an order with an empty cart".to_string())
    })?;

    let lines: Vec<OrderLine> = cart
        .lines
        .iter()
        .map(|line| OrderLine {
            menu_item_id: line.item.id,
            quantity: line.quantity,
        })
        .collect();

    let notes = request
        .notes
        .or_else(|| (!cart.notes.is_empty()).then(|| cart.notes.clone()));

    let profile = state.services.auth.profile(auth_user.id).await?;

    let details = state
        .services
        .orders
        .place_order(
            auth_user.id,
            &profile.display_name,
            stall_id,
            &lines,
            PlaceOrderInput {
                payment_method: request.payment_method,
                pickup_date: request.pickup_date.unwrap_or_else(|| Utc::now().date_naive()),
                pickup_time: request.pickup_time,
                notes,
            },
        )
        .await?;

    // Durable state exists now; the ephemeral cart can go.
    state.services.cart.clear(auth_user.id);

    let unresolved = state
        .services
        .queue
        .unresolved_for_stalls(&[stall_id])
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(map_order(&details, &unresolved))),
    ))
}

/// List orders. Customers get their own history; vendors get their stall's
/// orders, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    params(("status" = Option<String>, Query, description = "Vendor-side status filter")),
    responses((status = 200, description = "Orders", body = ApiResponse<Vec<OrderResponse>>)),
    security(("Bearer" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let details = if auth_user.is_vendor() {
        let stall_id = auth_user.require_vendor_stall()?;
        state
            .services
            .orders
            .list_for_stall(stall_id, query.status)
            .await?
    } else {
        state.services.orders.list_for_customer(auth_user.id).await?
    };

    let mut stall_ids: Vec<Uuid> = details.iter().map(|d| d.order.stall_id).collect();
    stall_ids.sort_unstable();
    stall_ids.dedup();
    let unresolved = state
        .services
        .queue
        .unresolved_for_stalls(&stall_ids)
        .await?;

    Ok(Json(ApiResponse::success(
        details.iter().map(|d| map_order(d, &unresolved)).collect(),
    )))
}

/// Fetch one order the caller is allowed to see.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order detail", body = ApiResponse<OrderResponse>),
        (status = 403, description = "Someone else's order", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let viewer = if auth_user.is_vendor() {
        OrderViewer::Vendor(auth_user.require_vendor_stall()?)
    } else {
        OrderViewer::Customer(auth_user.id)
    };

    let details = state.services.orders.get_order(id, viewer).await?;
    let unresolved = state
        .services
        .queue
        .unresolved_for_stalls(&[details.order.stall_id])
        .await?;

    Ok(Json(ApiResponse::success(map_order(&details, &unresolved))))
}

/// Vendor: advance an order's status. Transitions are forward-only and
/// idempotent.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/status",
    summary = "Update order status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let stall_id = auth_user.require_vendor_stall()?;
    state
        .services
        .orders
        .update_status(id, stall_id, request.status)
        .await?;

    let details = state
        .services
        .orders
        .get_order(id, OrderViewer::Vendor(stall_id))
        .await?;
    let unresolved = state
        .services
        .queue
        .unresolved_for_stalls(&[stall_id])
        .await?;

    Ok(Json(ApiResponse::success(map_order(&details, &unresolved))))
}

/// Customer: mark a ready order as received.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/received",
    summary = "Mark order received",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order completed", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Order is not ready yet", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn mark_received(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    state
        .services
        .orders
        .mark_received(id, auth_user.id)
        .await?;

    let details = state
        .services
        .orders
        .get_order(id, OrderViewer::Customer(auth_user.id))
        .await?;

    Ok(Json(ApiResponse::success(map_order(&details, &[]))))
}

/// Vendor: move every preparing order to ready in one action.
#[utoipa::path(
    post,
    path = "/api/v1/orders/mark-all-ready",
    summary = "Mark all preparing orders ready",
    responses((status = 200, description = "Count of updated orders")),
    security(("Bearer" = []))
)]
pub async fn mark_all_ready(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let stall_id = auth_user.require_vendor_stall()?;
    let updated = state.services.orders.mark_all_ready(stall_id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "updated": updated }),
    )))
}

/// Vendor: revenue over ready and completed orders.
#[utoipa::path(
    get,
    path = "/api/v1/orders/sales-summary",
    summary = "Sales summary",
    params(("today" = Option<bool>, Query, description = "Restrict to today's orders")),
    responses((status = 200, description = "Revenue roll-up", body = ApiResponse<SalesSummary>)),
    security(("Bearer" = []))
)]
pub async fn sales_summary(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<SalesQuery>,
) -> Result<Json<ApiResponse<SalesSummary>>, ServiceError> {
    let stall_id = auth_user.require_vendor_stall()?;
    let since = query
        .today
        .then(|| Utc::now().date_naive().and_time(chrono::NaiveTime::MIN).and_utc());

    let summary = state.services.orders.sales_summary(stall_id, since).await?;
    Ok(Json(ApiResponse::success(summary)))
}
