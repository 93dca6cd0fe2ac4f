use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI document for the QuickBite API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "QuickBite API",
        version = "0.1.0",
        description = r#"
Campus cafeteria ordering backend.

Customers browse stalls and menus, build a single-stall cart, check out
with a pickup slot, and track their place in the queue. Vendors manage
their menu and stock, advance order statuses, and read sales roll-ups.

All endpoints except the catalog reads and health check require a JWT
bearer token from `/api/v1/auth/signin`.
"#
    ),
    paths(
        crate::handlers::auth::sign_up,
        crate::handlers::auth::sign_in,
        crate::handlers::auth::session,
        crate::handlers::auth::sign_out,
        crate::handlers::stalls::list_stalls,
        crate::handlers::stalls::search_stalls,
        crate::handlers::stalls::get_stall,
        crate::handlers::stalls::set_open,
        crate::handlers::menu::list_menu_items,
        crate::handlers::menu::recommended_items,
        crate::handlers::menu::create_menu_item,
        crate::handlers::menu::update_menu_item,
        crate::handlers::menu::delete_menu_item,
        crate::handlers::menu::set_stock,
        crate::handlers::cart::get_cart,
        crate::handlers::cart::add_item,
        crate::handlers::cart::update_quantity,
        crate::handlers::cart::remove_item,
        crate::handlers::cart::set_notes,
        crate::handlers::cart::clear_cart,
        crate::handlers::slots::list_slots,
        crate::handlers::orders::place_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_status,
        crate::handlers::orders::mark_received,
        crate::handlers::orders::mark_all_ready,
        crate::handlers::orders::sales_summary,
        crate::handlers::reviews::submit_review,
        crate::handlers::reviews::list_reviews,
        crate::handlers::health::health,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::auth::SignUpInput,
        crate::auth::SignInInput,
        crate::auth::UserProfile,
        crate::entities::user::Role,
        crate::entities::order::OrderStatus,
        crate::entities::order::PaymentMethod,
        crate::handlers::auth::SessionResponse,
        crate::handlers::stalls::StallResponse,
        crate::handlers::stalls::SetOpenRequest,
        crate::handlers::menu::MenuItemResponse,
        crate::handlers::menu::SetStockRequest,
        crate::handlers::cart::AddToCartRequest,
        crate::handlers::cart::UpdateQuantityRequest,
        crate::handlers::cart::SetNotesRequest,
        crate::handlers::slots::SlotResponse,
        crate::handlers::orders::OrderResponse,
        crate::handlers::orders::OrderItemResponse,
        crate::handlers::orders::CheckoutRequest,
        crate::handlers::orders::UpdateStatusRequest,
        crate::handlers::reviews::ReviewResponse,
        crate::services::catalog::MenuItemInput,
        crate::services::cart::CartView,
        crate::services::cart::CartLine,
        crate::services::cart::CartItemSnapshot,
        crate::services::slots::MealPeriod,
        crate::services::queue::QueueInfo,
        crate::services::orders::SalesSummary,
        crate::services::reviews::SubmitReviewInput,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI mounted at `/docs`, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
