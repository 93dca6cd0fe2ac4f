use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::cart::CartView,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub menu_item_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetNotesRequest {
    pub notes: String,
}

/// The caller's cart, with derived totals.
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    summary = "Get cart",
    responses((status = 200, description = "Cart contents", body = ApiResponse<CartView>)),
    security(("Bearer" = []))
)]
pub async fn get_cart(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<CartView>>, ServiceError> {
    Ok(Json(ApiResponse::success(
        state.services.cart.get(auth_user.id),
    )))
}

/// Add one unit of a menu item. Adding from a different stall replaces the
/// cart with that single item.
#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    summary = "Add item to cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Updated cart", body = ApiResponse<CartView>),
        (status = 422, description = "Item out of stock", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn add_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<ApiResponse<CartView>>, ServiceError> {
    let item = state
        .services
        .catalog
        .get_menu_item(request.menu_item_id)
        .await?;
    let view = state.services.cart.add_item(auth_user.id, &item)?;
    Ok(Json(ApiResponse::success(view)))
}

/// Set a line's quantity; zero removes the line.
#[utoipa::path(
    patch,
    path = "/api/v1/cart/items/{id}",
    summary = "Update cart line quantity",
    params(("id" = Uuid, Path, description = "Menu item id")),
    request_body = UpdateQuantityRequest,
    responses((status = 200, description = "Updated cart", body = ApiResponse<CartView>)),
    security(("Bearer" = []))
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<ApiResponse<CartView>>, ServiceError> {
    Ok(Json(ApiResponse::success(
        state
            .services
            .cart
            .update_quantity(auth_user.id, id, request.quantity),
    )))
}

/// Remove a line entirely.
#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{id}",
    summary = "Remove cart line",
    params(("id" = Uuid, Path, description = "Menu item id")),
    responses((status = 200, description = "Updated cart", body = ApiResponse<CartView>)),
    security(("Bearer" = []))
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<CartView>>, ServiceError> {
    Ok(Json(ApiResponse::success(
        state.services.cart.remove_item(auth_user.id, id),
    )))
}

/// Attach free-text notes for the vendor.
#[utoipa::path(
    put,
    path = "/api/v1/cart/notes",
    summary = "Set cart notes",
    request_body = SetNotesRequest,
    responses((status = 200, description = "Updated cart", body = ApiResponse<CartView>)),
    security(("Bearer" = []))
)]
pub async fn set_notes(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<SetNotesRequest>,
) -> Result<Json<ApiResponse<CartView>>, ServiceError> {
    Ok(Json(ApiResponse::success(
        state.services.cart.set_notes(auth_user.id, request.notes),
    )))
}

/// Clear the cart: lines, stall binding, and notes together.
#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    summary = "Clear cart",
    responses((status = 200, description = "Emptied cart", body = ApiResponse<CartView>)),
    security(("Bearer" = []))
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<CartView>>, ServiceError> {
    Ok(Json(ApiResponse::success(
        state.services.cart.clear(auth_user.id),
    )))
}
