use std::sync::Arc;

use axum::Router;
use quickbite_api::{
    api_v1_routes,
    auth::{SignUpInput, UserProfile},
    config::AppConfig,
    db,
    entities::user::Role,
    events::{self, ChangeFeed, EventSender},
    handlers::AppServices,
    services::catalog::MenuItemInput,
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Test harness: a full application state backed by a throwaway SQLite
/// database, the same composition the real binary uses.
pub struct TestApp {
    pub state: AppState,
    #[allow(dead_code)]
    pub router: Router,
    _tmp: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = tmp.path().join("quickbite_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only".to_string(),
            3600,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let change_feed = ChangeFeed::default();
        let event_task = tokio::spawn(events::process_events(event_rx, change_feed.clone()));

        let services = AppServices::new(db.clone(), event_sender.clone(), &cfg);
        let state = AppState {
            db,
            config: cfg,
            event_sender,
            change_feed,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", api_v1_routes())
            .with_state(state.clone());

        Self {
            state,
            router,
            _tmp: tmp,
            _event_task: event_task,
        }
    }

    /// Registers a vendor account; sign-up creates the stall too.
    pub async fn seed_vendor(&self, email: &str, stall_name: &str) -> UserProfile {
        self.state
            .services
            .auth
            .sign_up(SignUpInput {
                email: email.to_string(),
                password: "password-123".to_string(),
                display_name: format!("{} Owner", stall_name),
                role: Role::Vendor,
                stall_name: Some(stall_name.to_string()),
            })
            .await
            .expect("vendor sign-up should succeed")
            .user
    }

    #[allow(dead_code)]
    pub async fn seed_customer(&self, email: &str, name: &str) -> UserProfile {
        self.state
            .services
            .auth
            .sign_up(SignUpInput {
                email: email.to_string(),
                password: "password-123".to_string(),
                display_name: name.to_string(),
                role: Role::Customer,
                stall_name: None,
            })
            .await
            .expect("customer sign-up should succeed")
            .user
    }

    pub async fn seed_menu_item(
        &self,
        stall_id: Uuid,
        name: &str,
        price: i64,
        stock: i32,
    ) -> quickbite_api::entities::menu_item::Model {
        self.state
            .services
            .catalog
            .create_menu_item(
                stall_id,
                MenuItemInput {
                    name: name.to_string(),
                    description: String::new(),
                    price,
                    stock,
                    category: "rice-meals".to_string(),
                },
            )
            .await
            .expect("menu item creation should succeed")
    }
}
