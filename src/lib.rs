//! QuickBite API Library
//!
//! Backend for campus cafeteria ordering: stall and menu catalog, carts,
//! pickup-slot allocation, the order ledger, queue estimation, reviews,
//! and role-scoped auth.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Shared application state, composed once at startup and handed to the
/// router. The "mock vs. live" distinction lives entirely in which database
/// `db` points at.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub change_feed: events::ChangeFeed,
    pub services: handlers::AppServices,
}

/// Common response envelope.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// All `/api/v1` routes.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/auth/signup", post(handlers::auth::sign_up))
        .route("/auth/signin", post(handlers::auth::sign_in))
        .route("/auth/session", get(handlers::auth::session))
        .route("/auth/signout", post(handlers::auth::sign_out))
        // Stalls
        .route("/stalls", get(handlers::stalls::list_stalls))
        .route("/stalls/search", get(handlers::stalls::search_stalls))
        .route("/stalls/:id", get(handlers::stalls::get_stall))
        .route("/stalls/:id/open", patch(handlers::stalls::set_open))
        // Menu
        .route(
            "/menu-items",
            get(handlers::menu::list_menu_items).post(handlers::menu::create_menu_item),
        )
        .route(
            "/menu-items/recommended",
            get(handlers::menu::recommended_items),
        )
        .route(
            "/menu-items/:id",
            put(handlers::menu::update_menu_item).delete(handlers::menu::delete_menu_item),
        )
        .route("/menu-items/:id/stock", patch(handlers::menu::set_stock))
        // Cart
        .route(
            "/cart",
            get(handlers::cart::get_cart).delete(handlers::cart::clear_cart),
        )
        .route("/cart/items", post(handlers::cart::add_item))
        .route(
            "/cart/items/:id",
            patch(handlers::cart::update_quantity).delete(handlers::cart::remove_item),
        )
        .route("/cart/notes", put(handlers::cart::set_notes))
        // Pickup slots
        .route("/slots", get(handlers::slots::list_slots))
        // Orders
        .route(
            "/orders",
            post(handlers::orders::place_order).get(handlers::orders::list_orders),
        )
        .route(
            "/orders/mark-all-ready",
            post(handlers::orders::mark_all_ready),
        )
        .route(
            "/orders/sales-summary",
            get(handlers::orders::sales_summary),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route("/orders/:id/status", post(handlers::orders::update_status))
        .route(
            "/orders/:id/received",
            post(handlers::orders::mark_received),
        )
        // Reviews
        .route(
            "/reviews",
            post(handlers::reviews::submit_review).get(handlers::reviews::list_reviews),
        )
        // Health
        .route("/health", get(handlers::health::health))
}
