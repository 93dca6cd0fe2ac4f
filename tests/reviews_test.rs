mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::TestApp;
use quickbite_api::{
    auth::UserProfile,
    entities::order::{OrderStatus, PaymentMethod},
    errors::ServiceError,
    services::orders::{OrderLine, PlaceOrderInput},
    services::reviews::SubmitReviewInput,
};
use uuid::Uuid;

async fn completed_order(
    app: &TestApp,
    customer: &UserProfile,
    stall_id: Uuid,
    item_id: Uuid,
    time: &str,
) -> Uuid {
    let order = app
        .state
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
        .unwrap()
        .order;

    let svc = &app.state.services.orders;
    for status in [
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
    ] {
        svc.update_status(order.id, stall_id, status).await.unwrap();
    }
    order.id
}

fn review(order_id: Uuid, food: i32, service: i32) -> SubmitReviewInput {
    SubmitReviewInput {
        order_id,
        food_rating: food,
        service_rating: service,
        food_comment: None,
        service_comment: None,
        anonymous: false,
    }
}

#[tokio::test]
async fn test_review_updates_stall_aggregate() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let item = app.seed_menu_item(stall_id, "Shawarma Rice", 65, 25).await;

    let order_id = completed_order(&app, &customer, stall_id, item.id, "12:00").await;

    app.state
        .services
        .reviews
        .submit(customer.id, review(order_id, 5, 4))
        .await
        .unwrap();

    let stall = app.state.services.catalog.get_stall(stall_id).await.unwrap();
    assert_eq!(stall.total_ratings, 1);
    // (5 + 4) / 2
    assert!((stall.rating - 4.5).abs() < f64::EPSILON);

    // A second order's review folds into the running average
    let second = completed_order(&app, &customer, stall_id, item.id, "12:05").await;
    app.state
        .services
        .reviews
        .submit(customer.id, review(second, 3, 3))
        .await
        .unwrap();

    let stall = app.state.services.catalog.get_stall(stall_id).await.unwrap();
    assert_eq!(stall.total_ratings, 2);
    assert!((stall.rating - 3.75).abs() < 1e-9);
}

#[tokio::test]
async fn test_only_completed_orders_can_be_rated() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let item = app.seed_menu_item(stall_id, "Fries", 35, 10).await;

    let pending = app
        .state
        .services
        .orders
        .place_order(
            customer.id,
            &customer.display_name,
            stall_id,
            &[OrderLine {
                menu_item_id: item.id,
                quantity: 1,
            }],
            PlaceOrderInput {
                payment_method: PaymentMethod::Cash,
                pickup_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                pickup_time: "12:00".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap()
        .order;

    let err = app
        .state
        .services
        .reviews
        .submit(customer.id, review(pending.id, 4, 4))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn test_one_review_per_order() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let item = app.seed_menu_item(stall_id, "Iced Tea", 20, 50).await;

    let order_id = completed_order(&app, &customer, stall_id, item.id, "12:00").await;

    let reviews = &app.state.services.reviews;
    reviews.submit(customer.id, review(order_id, 5, 5)).await.unwrap();

    let err = reviews
        .submit(customer.id, review(order_id, 1, 1))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // The aggregate only counted the first submission
    let stall = app.state.services.catalog.get_stall(stall_id).await.unwrap();
    assert_eq!(stall.total_ratings, 1);
}

#[tokio::test]
async fn test_zero_star_rating_rejected() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let item = app.seed_menu_item(stall_id, "Halo-Halo", 45, 25).await;

    let order_id = completed_order(&app, &customer, stall_id, item.id, "12:00").await;

    let err = app
        .state
        .services
        .reviews
        .submit(customer.id, review(order_id, 0, 4))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .state
        .services
        .reviews
        .submit(customer.id, review(order_id, 4, 6))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn test_only_the_ordering_customer_can_rate() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let maria = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let juan = app.seed_customer("juan@campus.edu", "Juan Dela Cruz").await;
    let item = app.seed_menu_item(stall_id, "Coke Float", 35, 20).await;

    let order_id = completed_order(&app, &maria, stall_id, item.id, "12:00").await;

    let err = app
        .state
        .services
        .reviews
        .submit(juan.id, review(order_id, 5, 5))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
}
