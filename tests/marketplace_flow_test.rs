//! End-to-end flows: catalog, wishlist, interactions, orders and dashboards.

mod common;

use std::str::FromStr;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use pcx_api::entities::{order, order_item};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};
use uuid::Uuid;

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        other => Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}

#[tokio::test]
async fn order_flow_feeds_both_dashboards() {
    let app = TestApp::new().await;
    let alice = app.sign_up("alice", "customer").await;
    let bob = app.sign_up("bob", "vendor").await;

    let widget = app.create_product(&bob, "Widget", "9.99").await;
    let widget_id = widget["id"].as_str().unwrap().to_string();
    app.create_product(&bob, "Gizmo", "4.00").await;

    let response = app
        .request(
            Method::POST,
            "/orders",
            Some(json!({ "items": [{ "product_id": widget_id, "quantity": 2 }] })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = response_json(response).await;
    assert_eq!(decimal(&order["total_amount"]), dec!(19.98));
    assert_eq!(order["total_items"], 2);

    let customer_id = alice.customer_id.unwrap();
    let response = app
        .request(
            Method::GET,
            &format!("/customer/dashboard/{customer_id}"),
            None,
            Some(&alice.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = response_json(response).await;
    assert_eq!(dashboard["total_orders"], 1);
    assert_eq!(dashboard["total_wishlist_items"], 0);
    assert_eq!(dashboard["recent_orders"][0]["total_items"], 1);
    assert_eq!(
        decimal(&dashboard["recent_orders"][0]["total_amount"]),
        dec!(19.98)
    );

    let vendor_id = bob.vendor_id.unwrap();
    let response = app
        .request(
            Method::GET,
            &format!("/vendor/dashboard/{vendor_id}"),
            None,
            Some(&bob.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = response_json(response).await;
    assert_eq!(dashboard["total_products"], 2);
    assert_eq!(dashboard["total_orders"], 1);
    assert_eq!(decimal(&dashboard["total_revenue"]), dec!(19.98));
    assert_eq!(dashboard["top_products"][0]["title"], "Widget");
    assert_eq!(dashboard["top_products"][0]["quantity_sold"], 2);
    assert_eq!(dashboard["top_products"][1]["title"], "Gizmo");
    assert_eq!(dashboard["top_products"][1]["orders"], 0);
    assert_eq!(dashboard["top_products"][1]["quantity_sold"], 0);
}

#[tokio::test]
async fn dashboards_for_unknown_owners_are_not_found() {
    let app = TestApp::new().await;
    let staff = app.staff("root").await;
    let alice = app.sign_up("alice", "customer").await;

    for path in ["customer", "vendor"] {
        let response = app
            .request(
                Method::GET,
                &format!("/{path}/dashboard/{}", Uuid::new_v4()),
                None,
                Some(&staff.token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");

        let response = app
            .request(
                Method::GET,
                &format!("/{path}/dashboard/{}", Uuid::new_v4()),
                None,
                Some(&alice.token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn order_with_unknown_product_stores_nothing() {
    let app = TestApp::new().await;
    let alice = app.sign_up("alice", "customer").await;
    let bob = app.sign_up("bob", "vendor").await;
    let widget = app.create_product(&bob, "Widget", "9.99").await;

    let response = app
        .request(
            Method::POST,
            "/orders",
            Some(json!({ "items": [
                { "product_id": widget["id"], "quantity": 1 },
                { "product_id": Uuid::new_v4(), "quantity": 1 },
            ] })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let db = &*app.state.db;
    assert_eq!(order::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(order_item::Entity::find().count(db).await.unwrap(), 0);
}

#[tokio::test]
async fn dashboards_are_private_to_owner() {
    let app = TestApp::new().await;
    let alice = app.sign_up("alice", "customer").await;
    let mallory = app.sign_up("mallory", "customer").await;
    let bob = app.sign_up("bob", "vendor").await;

    let alice_id = alice.customer_id.unwrap();
    let response = app
        .request(
            Method::GET,
            &format!("/customer/dashboard/{alice_id}"),
            None,
            Some(&mallory.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let vendor_id = bob.vendor_id.unwrap();
    let response = app
        .request(
            Method::GET,
            &format!("/vendor/dashboard/{vendor_id}"),
            None,
            Some(&alice.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let staff = app.staff("root").await;
    let response = app
        .request(
            Method::GET,
            &format!("/customer/dashboard/{alice_id}"),
            None,
            Some(&staff.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn repeated_views_accumulate_on_one_row() {
    let app = TestApp::new().await;
    let alice = app.sign_up("alice", "customer").await;
    let bob = app.sign_up("bob", "vendor").await;
    let product = app.create_product(&bob, "Lamp", "25.00").await;
    let product_id = product["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let response = app
            .request(
                Method::POST,
                "/customer-interactions",
                Some(json!({ "product_id": product_id, "kind": "viewed" })),
                Some(&alice.token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request(Method::GET, "/customer-interactions", None, Some(&alice.token))
        .await;
    let rows = response_json(response).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["viewed"], true);
    assert_eq!(rows[0]["view_count"], 2);

    let response = app
        .request(
            Method::GET,
            &format!("/product-statistics/{product_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = response_json(response).await;
    assert_eq!(stats["view_count"], 2);
    assert_eq!(stats["purchase_count"], 0);
}

#[tokio::test]
async fn wishlist_add_is_idempotent() {
    let app = TestApp::new().await;
    let alice = app.sign_up("alice", "customer").await;
    let bob = app.sign_up("bob", "vendor").await;
    let product = app.create_product(&bob, "Mug", "7.50").await;
    let body = json!({ "product_id": product["id"] });

    let first = app
        .request(
            Method::POST,
            "/wishlistitem",
            Some(body.clone()),
            Some(&alice.token),
        )
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = response_json(first).await;

    let second = app
        .request(Method::POST, "/wishlistitem", Some(body), Some(&alice.token))
        .await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = response_json(second).await;
    assert_eq!(first["id"], second["id"]);

    let customer_id = alice.customer_id.unwrap();
    let response = app
        .request(
            Method::GET,
            &format!("/wishlist/{customer_id}"),
            None,
            Some(&alice.token),
        )
        .await;
    let wishlist = response_json(response).await;
    assert_eq!(wishlist.as_array().unwrap().len(), 1);
    assert_eq!(wishlist[0]["product_title"], "Mug");
}

#[tokio::test]
async fn product_detail_embeds_same_category_products() {
    let app = TestApp::new().await;
    let bob = app.sign_up("bob", "vendor").await;

    let response = app
        .request(
            Method::POST,
            "/categories",
            Some(json!({ "title": "Kitchen" })),
            Some(&bob.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let category = response_json(response).await;

    let mut ids = Vec::new();
    for title in ["Pan", "Pot", "Kettle"] {
        let response = app
            .request(
                Method::POST,
                "/product",
                Some(json!({
                    "category_id": category["id"],
                    "title": title,
                    "price": "12.00",
                    "thumbnail": "https://cdn.example.com/p.png",
                    "images": ["https://cdn.example.com/p-1.png"],
                })),
                Some(&bob.token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        ids.push(response_json(response).await["id"].clone());
    }

    let response = app
        .request(
            Method::GET,
            &format!("/product/{}", ids[0].as_str().unwrap()),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail = response_json(response).await;
    assert_eq!(detail["title"], "Pan");
    assert_eq!(detail["images"].as_array().unwrap().len(), 1);
    let mut related: Vec<String> = detail["related_products"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["title"].as_str().map(str::to_string))
        .collect();
    related.sort();
    assert_eq!(related, vec!["Kettle".to_string(), "Pot".to_string()]);

    let response = app
        .request(Method::GET, "/products?category=kitch", None, None)
        .await;
    let listed = response_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn rating_outside_range_is_rejected() {
    let app = TestApp::new().await;
    let alice = app.sign_up("alice", "customer").await;
    let bob = app.sign_up("bob", "vendor").await;
    let product = app.create_product(&bob, "Chair", "40.00").await;

    let response = app
        .request(
            Method::POST,
            "/productrating",
            Some(json!({ "product_id": product["id"], "rating": 6, "reviews": "great" })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::POST,
            "/productrating",
            Some(json!({ "product_id": product["id"], "rating": 5, "reviews": "great" })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}
