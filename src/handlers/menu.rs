use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser, entities::menu_item, errors::ServiceError,
    services::catalog::MenuItemInput, ApiResponse, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItemResponse {
    pub id: Uuid,
    pub stall_id: Uuid,
    pub stall_name: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub category: String,
    pub is_popular: bool,
}

impl From<menu_item::Model> for MenuItemResponse {
    fn from(model: menu_item::Model) -> Self {
        let is_popular = model.is_popular();
        Self {
            id: model.id,
            stall_id: model.stall_id,
            stall_name: model.stall_name,
            name: model.name,
            description: model.description,
            price: model.price,
            stock: model.stock,
            category: model.category,
            is_popular,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    pub stall_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStockRequest {
    pub stock: i32,
}

/// List menu items, optionally for one stall.
#[utoipa::path(
    get,
    path = "/api/v1/menu-items",
    summary = "List menu items",
    params(("stall_id" = Option<Uuid>, Query, description = "Restrict to one stall")),
    responses((status = 200, description = "Menu items", body = ApiResponse<Vec<MenuItemResponse>>))
)]
pub async fn list_menu_items(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<ApiResponse<Vec<MenuItemResponse>>>, ServiceError> {
    let items = state
        .services
        .catalog
        .list_menu_items(query.stall_id)
        .await?;
    Ok(Json(ApiResponse::success(
        items.into_iter().map(Into::into).collect(),
    )))
}

/// Recently added items that are in stock.
#[utoipa::path(
    get,
    path = "/api/v1/menu-items/recommended",
    summary = "Recommended items",
    responses((status = 200, description = "Recommended items", body = ApiResponse<Vec<MenuItemResponse>>))
)]
pub async fn recommended_items(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<MenuItemResponse>>>, ServiceError> {
    let items = state.services.catalog.recommended_items(6).await?;
    Ok(Json(ApiResponse::success(
        items.into_iter().map(Into::into).collect(),
    )))
}

/// Vendor: add a menu item to their stall.
#[utoipa::path(
    post,
    path = "/api/v1/menu-items",
    summary = "Create menu item",
    request_body = MenuItemInput,
    responses(
        (status = 201, description = "Menu item created", body = ApiResponse<MenuItemResponse>),
        (status = 403, description = "Vendor only", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<MenuItemInput>,
) -> Result<(StatusCode, Json<ApiResponse<MenuItemResponse>>), ServiceError> {
    let stall_id = auth_user.require_vendor_stall()?;
    let item = state
        .services
        .catalog
        .create_menu_item(stall_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item.into()))))
}

/// Vendor: replace a menu item's details.
#[utoipa::path(
    put,
    path = "/api/v1/menu-items/{id}",
    summary = "Update menu item",
    params(("id" = Uuid, Path, description = "Menu item id")),
    request_body = MenuItemInput,
    responses(
        (status = 200, description = "Menu item updated", body = ApiResponse<MenuItemResponse>),
        (status = 404, description = "Menu item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(input): Json<MenuItemInput>,
) -> Result<Json<ApiResponse<MenuItemResponse>>, ServiceError> {
    let stall_id = auth_user.require_vendor_stall()?;
    let item = state
        .services
        .catalog
        .update_menu_item(stall_id, id, input)
        .await?;
    Ok(Json(ApiResponse::success(item.into())))
}

/// Vendor: delete a menu item.
#[utoipa::path(
    delete,
    path = "/api/v1/menu-items/{id}",
    summary = "Delete menu item",
    params(("id" = Uuid, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item deleted"),
        (status = 404, description = "Menu item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let stall_id = auth_user.require_vendor_stall()?;
    state.services.catalog.delete_menu_item(stall_id, id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": true }),
    )))
}

/// Vendor: set remaining stock for an item.
#[utoipa::path(
    patch,
    path = "/api/v1/menu-items/{id}/stock",
    summary = "Set stock",
    params(("id" = Uuid, Path, description = "Menu item id")),
    request_body = SetStockRequest,
    responses(
        (status = 200, description = "Stock updated", body = ApiResponse<MenuItemResponse>),
        (status = 400, description = "Negative stock", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn set_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<SetStockRequest>,
) -> Result<Json<ApiResponse<MenuItemResponse>>, ServiceError> {
    let stall_id = auth_user.require_vendor_stall()?;
    let item = state
        .services
        .catalog
        .set_stock(stall_id, id, request.stock)
        .await?;
    Ok(Json(ApiResponse::success(item.into())))
}
