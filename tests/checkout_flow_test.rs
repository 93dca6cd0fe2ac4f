mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::TestApp;
use quickbite_api::{
    entities::order::{OrderStatus, PaymentMethod},
    errors::ServiceError,
    services::orders::{OrderLine, PlaceOrderInput},
};

fn pickup(date: (i32, u32, u32), time: &str) -> (NaiveDate, String) {
    (
        NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        time.to_string(),
    )
}

fn order_input(method: PaymentMethod, time: &str) -> PlaceOrderInput {
    let (date, time) = pickup((2026, 3, 2), time);
    PlaceOrderInput {
        payment_method: method,
        pickup_date: date,
        pickup_time: time,
        notes: None,
    }
}

#[tokio::test]
async fn test_cash_checkout_creates_pending_order_with_snapshot() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;

    let shawarma = app.seed_menu_item(stall_id, "Shawarma Rice", 65, 25).await;
    let fries = app.seed_menu_item(stall_id, "Fries", 35, 3).await;

    let details = app
        .state
        .services
        .orders
        .place_order(
            customer.id,
            &customer.display_name,
            stall_id,
            &[
                OrderLine {
                    menu_item_id: shawarma.id,
                    quantity: 2,
                },
                OrderLine {
                    menu_item_id: fries.id,
                    quantity: 1,
                },
            ],
            order_input(PaymentMethod::Cash, "12:00"),
        )
        .await
        .expect("checkout should succeed");

    assert_eq!(details.order.status, OrderStatus::Pending);
    assert_eq!(details.order.order_number, 1);
    assert_eq!(details.order.total_amount, 165);
    assert_eq!(details.order.stall_name, "Lagoon Cafeteria");
    assert_eq!(details.items.len(), 2);

    // Stock was decremented by the ordered quantities
    let shawarma_now = app
        .state
        .services
        .catalog
        .get_menu_item(shawarma.id)
        .await
        .unwrap();
    assert_eq!(shawarma_now.stock, 23);
    let fries_now = app.state.services.catalog.get_menu_item(fries.id).await.unwrap();
    assert_eq!(fries_now.stock, 2);
}

#[tokio::test]
async fn test_online_checkout_starts_confirmed() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("east@campus.edu", "East Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("juan@campus.edu", "Juan Dela Cruz").await;
    let tapsilog = app.seed_menu_item(stall_id, "Tapsilog", 75, 20).await;

    let details = app
        .state
        .services
        .orders
        .place_order(
            customer.id,
            &customer.display_name,
            stall_id,
            &[OrderLine {
                menu_item_id: tapsilog.id,
                quantity: 1,
            }],
            order_input(PaymentMethod::Online, "12:05"),
        )
        .await
        .unwrap();

    assert_eq!(details.order.status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn test_oversell_rolls_back_whole_order() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("anna@campus.edu", "Anna Reyes").await;

    let adobo = app.seed_menu_item(stall_id, "Adobo Rice", 55, 3).await;
    let tea = app.seed_menu_item(stall_id, "Iced Tea", 20, 50).await;

    let err = app
        .state
        .services
        .orders
        .place_order(
            customer.id,
            &customer.display_name,
            stall_id,
            &[
                OrderLine {
                    menu_item_id: tea.id,
                    quantity: 2,
                },
                OrderLine {
                    menu_item_id: adobo.id,
                    quantity: 4,
                },
            ],
            order_input(PaymentMethod::Cash, "12:10"),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::OutOfStock(_));

    // Nothing moved: the tea decrement rolled back with the failed order,
    // and no order rows exist.
    let tea_now = app.state.services.catalog.get_menu_item(tea.id).await.unwrap();
    assert_eq!(tea_now.stock, 50);
    let adobo_now = app.state.services.catalog.get_menu_item(adobo.id).await.unwrap();
    assert_eq!(adobo_now.stock, 3);

    let orders = app
        .state
        .services
        .orders
        .list_for_customer(customer.id)
        .await
        .unwrap();
    assert!(orders.is_empty());

    // The slot reservation rolled back too
    let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let slots = app.state.services.slots.list_slots(date, None).await.unwrap();
    let slot = slots.iter().find(|s| s.time == "12:10").unwrap();
    assert_eq!(slot.booked, 0);
}

#[tokio::test]
async fn test_order_numbers_are_sequential_per_stall() {
    let app = TestApp::new().await;
    let lagoon = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let snack = app.seed_vendor("snack@campus.edu", "Mcjollibee").await;
    let lagoon_id = lagoon.stall_id.unwrap();
    let snack_id = snack.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;

    let siomai = app.seed_menu_item(lagoon_id, "Siomai Rice", 50, 20).await;
    let fishball = app.seed_menu_item(snack_id, "Fish Ball", 20, 50).await;

    let mut lagoon_numbers = Vec::new();
    for time in ["12:00", "12:05", "12:10"] {
        let details = app
            .state
            .services
            .orders
            .place_order(
                customer.id,
                &customer.display_name,
                lagoon_id,
                &[OrderLine {
                    menu_item_id: siomai.id,
                    quantity: 1,
                }],
                order_input(PaymentMethod::Cash, time),
            )
            .await
            .unwrap();
        lagoon_numbers.push(details.order.order_number);
    }
    assert_eq!(lagoon_numbers, vec![1, 2, 3]);

    // A different stall starts its own sequence
    let snack_order = app
        .state
        .services
        .orders
        .place_order(
            customer.id,
            &customer.display_name,
            snack_id,
            &[OrderLine {
                menu_item_id: fishball.id,
                quantity: 1,
            }],
            order_input(PaymentMethod::Cash, "12:15"),
        )
        .await
        .unwrap();
    assert_eq!(snack_order.order.order_number, 1);
}

#[tokio::test]
async fn test_order_snapshot_survives_menu_edits() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let burger = app.seed_menu_item(stall_id, "Burger", 45, 18).await;

    let details = app
        .state
        .services
        .orders
        .place_order(
            customer.id,
            &customer.display_name,
            stall_id,
            &[OrderLine {
                menu_item_id: burger.id,
                quantity: 1,
            }],
            order_input(PaymentMethod::Cash, "12:00"),
        )
        .await
        .unwrap();

    // Vendor raises the price afterwards; history must not move.
    app.state
        .services
        .catalog
        .update_menu_item(
            stall_id,
            burger.id,
            quickbite_api::services::catalog::MenuItemInput {
                name: "Burger Deluxe".to_string(),
                description: String::new(),
                price: 90,
                stock: 18,
                category: "snacks".to_string(),
            },
        )
        .await
        .unwrap();

    let reloaded = app
        .state
        .services
        .orders
        .get_order(
            details.order.id,
            quickbite_api::services::orders::OrderViewer::Customer(customer.id),
        )
        .await
        .unwrap();
    assert_eq!(reloaded.items[0].name, "Burger");
    assert_eq!(reloaded.items[0].unit_price, 45);
    assert_eq!(reloaded.order.total_amount, 45);
}

#[tokio::test]
async fn test_invalid_pickup_label_rejected() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;
    let item = app.seed_menu_item(stall_id, "Gulaman", 25, 30).await;

    let err = app
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
            order_input(PaymentMethod::Cash, "21:00"),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn test_empty_cart_rejected() {
    let app = TestApp::new().await;
    let vendor = app.seed_vendor("lagoon@campus.edu", "Lagoon Cafeteria").await;
    let stall_id = vendor.stall_id.unwrap();
    let customer = app.seed_customer("maria@campus.edu", "Maria Santos").await;

    let err = app
        .state
        .services
        .orders
        .place_order(
            customer.id,
            &customer.display_name,
            stall_id,
            &[],
            order_input(PaymentMethod::Cash, "12:00"),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ValidationError(_));
}
