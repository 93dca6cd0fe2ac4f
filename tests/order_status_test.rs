mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::TestApp;
use quickbite_api::{
    auth::UserProfile,
    entities::order::{OrderStatus, PaymentMethod},
    errors::ServiceError,
    services::orders::{OrderDetails, OrderLine, PlaceOrderInput},
};
use uuid::Uuid;

async fn place(
    app: &TestApp,
    customer: &UserProfile,
    stall_id: Uuid,
    item_id: Uuid,
    time: &str,
) -> OrderDetails {
    app.state
        .services
        .orders
        .place_order(
            customer.id,
            &customer.display_name,
            stall_id,
            &[OrderLine {
                menu_item_id: item_id,
                quantity: 1,
            }],
            PlaceOrderInput {
                payment_method: PaymentMethod::Cash,
                pickup_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                pickup_time: time.to_string(),
                notes: None,
            },
        )
        .await
        .expect("checkout should succeed")
}

#[tokio::test]
async fn test_vendor_advances_order_forward() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let item = app.seed_menu_item(stall_id, "Sisig Rice", 70, 10).await;

    let order = place(&app, &customer, stall_id, item.id, "12:00").await.order;

    let svc = &app.state.services.orders;
    let after = svc
        .update_status(order.id, stall_id, OrderStatus::Preparing)
        .await
        .unwrap();
    assert_eq!(after.status, OrderStatus::Preparing);

    let after = svc
        .update_status(order.id, stall_id, OrderStatus::Ready)
        .await
        .unwrap();
    assert_eq!(after.status, OrderStatus::Ready);

    let after = svc
        .update_status(order.id, stall_id, OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(after.status, OrderStatus::Completed);
}

#[tokio::test]
async fn test_reapplying_status_is_a_no_op() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let item = app.seed_menu_item(stall_id, "Palabok", 55, 12).await;

    let order = place(&app, &customer, stall_id, item.id, "12:00").await.order;

    let svc = &app.state.services.orders;
    svc.update_status(order.id, stall_id, OrderStatus::Preparing)
        .await
        .unwrap();
    svc.update_status(order.id, stall_id, OrderStatus::Ready)
        .await
        .unwrap();

    // Applying ready -> ready twice leaves status ready
    let again = svc
        .update_status(order.id, stall_id, OrderStatus::Ready)
        .await
        .unwrap();
    assert_eq!(again.status, OrderStatus::Ready);
}

#[tokio::test]
async fn test_backward_transition_rejected() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let item = app.seed_menu_item(stall_id, "Longsilog", 65, 18).await;

    let order = place(&app, &customer, stall_id, item.id, "12:00").await.order;

    let svc = &app.state.services.orders;
    for status in [
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
    ] {
        svc.update_status(order.id, stall_id, status).await.unwrap();
    }

    let err = svc
        .update_status(order.id, stall_id, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));
}

#[tokio::test]
async fn test_mark_all_ready_moves_only_preparing_orders() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let item = app.seed_menu_item(stall_id, "Shawarma Rice", 65, 25).await;

    let svc = &app.state.services.orders;
    let mut ids = Vec::new();
    for time in ["12:00", "12:05", "12:10", "12:15"] {
        ids.push(place(&app, &customer, stall_id, item.id, time).await.order.id);
    }

    // Three orders move to preparing; the fourth stays pending
    for id in &ids[..3] {
        svc.update_status(*id, stall_id, OrderStatus::Preparing)
            .await
            .unwrap();
    }

    let updated = svc.mark_all_ready(stall_id).await.unwrap();
    assert_eq!(updated, 3);

    let all = svc.list_for_stall(stall_id, None).await.unwrap();
    let ready = all
        .iter()
        .filter(|d| d.order.status == OrderStatus::Ready)
        .count();
    let pending = all
        .iter()
        .filter(|d| d.order.status == OrderStatus::Pending)
        .count();
    assert_eq!(ready, 3);
    assert_eq!(pending, 1);

    // Re-running finds nothing left to move
    assert_eq!(svc.mark_all_ready(stall_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_customer_marks_ready_order_received() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let item = app.seed_menu_item(stall_id, "Banana Cue", 15, 30).await;

    let order = place(&app, &customer, stall_id, item.id, "12:00").await.order;

    let svc = &app.state.services.orders;
    svc.update_status(order.id, stall_id, OrderStatus::Preparing)
        .await
        .unwrap();
    svc.update_status(order.id, stall_id, OrderStatus::Ready)
        .await
        .unwrap();

    let after = svc.mark_received(order.id, customer.id).await.unwrap();
    assert_eq!(after.status, OrderStatus::Completed);

    // A pending order cannot be marked received
    let second = place(&app, &customer, stall_id, item.id, "12:05").await.order;
    let err = svc.mark_received(second.id, customer.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));
}

#[tokio::test]
async fn test_visibility_is_role_scoped() {
    let app = TestApp::new().await;
    let lagoon = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let snack = app.seed_vendor("snack@campus.edu", "Mcjollibee").await;
    let lagoon_id = lagoon.stall_id.unwrap();
    let snack_id = snack.stall_id.unwrap();
    let maria = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let juan = app.seed_customer("juan@campus.edu", "Juan Dela Cruz").await;
    let item = app.seed_menu_item(lagoon_id, "Kwek-Kwek", 25, 40).await;

    let order = place(&app, &maria, lagoon_id, item.id, "12:00").await.order;

    let svc = &app.state.services.orders;
    use quickbite_api::services::orders::OrderViewer;

    // The owner and the stall's vendor can see it
    assert!(svc
        .get_order(order.id, OrderViewer::Customer(maria.id))
        .await
        .is_ok());
    assert!(svc
        .get_order(order.id, OrderViewer::Vendor(lagoon_id))
        .await
        .is_ok());

    // Another customer and another stall's vendor cannot
    assert_matches!(
        svc.get_order(order.id, OrderViewer::Customer(juan.id))
            .await
            .unwrap_err(),
        ServiceError::Forbidden(_)
    );
    assert_matches!(
        svc.get_order(order.id, OrderViewer::Vendor(snack_id))
            .await
            .unwrap_err(),
        ServiceError::Forbidden(_)
    );

    // Another vendor cannot advance it either
    assert_matches!(
        svc.update_status(order.id, snack_id, OrderStatus::Preparing)
            .await
            .unwrap_err(),
        ServiceError::Forbidden(_)
    );
}

#[tokio::test]
async fn test_sales_summary_counts_ready_and_completed() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let item = app.seed_menu_item(stall_id, "Burger Meal", 85, 15).await;

    let svc = &app.state.services.orders;
    let first = place(&app, &customer, stall_id, item.id, "12:00").await.order;
    let second = place(&app, &customer, stall_id, item.id, "12:05").await.order;
    let _still_pending = place(&app, &customer, stall_id, item.id, "12:10").await;

    for id in [first.id, second.id] {
        svc.update_status(id, stall_id, OrderStatus::Preparing)
            .await
            .unwrap();
        svc.update_status(id, stall_id, OrderStatus::Ready)
            .await
            .unwrap();
    }
    svc.update_status(first.id, stall_id, OrderStatus::Completed)
        .await
        .unwrap();

    let summary = svc.sales_summary(stall_id, None).await.unwrap();
    assert_eq!(summary.order_count, 2);
    assert_eq!(summary.total_revenue, 170);
}
