pub mod auth;
pub mod cart;
pub mod health;
pub mod menu;
pub mod orders;
pub mod reviews;
pub mod slots;
pub mod stalls;

use std::sync::Arc;

use crate::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        CartService, CatalogService, OrderService, QueueService, ReviewService, SlotService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
/// Built once at startup; no global singletons.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub slots: Arc<SlotService>,
    pub orders: Arc<OrderService>,
    pub queue: Arc<QueueService>,
    pub reviews: Arc<ReviewService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, config: &AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(
            db.clone(),
            AuthConfig::new(config.jwt_secret.clone(), config.jwt_expiration),
        ));
        let catalog = Arc::new(CatalogService::new(db.clone(), event_sender.clone()));
        let cart = Arc::new(CartService::new());
        let slots = SlotService::new(db.clone(), config.slot_capacity);
        let orders = Arc::new(OrderService::new(
            db.clone(),
            event_sender.clone(),
            slots.clone(),
        ));
        let queue = Arc::new(QueueService::new(db.clone()));
        let reviews = Arc::new(ReviewService::new(db, event_sender));

        Self {
            auth,
            catalog,
            cart,
            slots: Arc::new(slots),
            orders,
            queue,
            reviews,
        }
    }
}
