//! PCX marketplace API
//!
//! Accounts, catalog, wishlists, orders, ratings, product relationships,
//! recommendations and dashboards over HTTP.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::{FromRef, State},
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::{AuthConfig, AuthService};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: Arc<AuthService>,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires the auth service and every business service to one pool.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config), db.clone()));
        let services = handlers::AppServices::new(db.clone(), auth.clone(), &config);
        Self {
            db,
            config,
            auth,
            services,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Every marketplace route, without transport layers
pub fn api_routes() -> Router<AppState> {
    use handlers::{
        addresses, auth, categories, customers, dashboard, interactions, orders, products,
        ratings, related_products, vendors, wishlist,
    };

    let accounts = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/token/refresh", post(auth::refresh_token))
        .route(
            "/vendors",
            get(vendors::list_vendors).post(vendors::create_vendor),
        )
        .route(
            "/vendor/products",
            get(vendors::own_products).post(vendors::create_own_product),
        )
        .route("/vendor/statistics", get(vendors::own_statistics))
        .route(
            "/vendor/:id",
            get(vendors::get_vendor)
                .put(vendors::update_vendor)
                .delete(vendors::delete_vendor),
        )
        .route("/customers", get(customers::list_customers))
        .route(
            "/customer/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        );

    let catalog = Router::new()
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories-with-stats",
            get(categories::categories_with_stats),
        )
        .route(
            "/category/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route("/products", get(products::list_products))
        .route(
            "/products/vendor/:vendor_id",
            get(products::vendor_products),
        )
        .route("/product", post(products::create_product))
        .route(
            "/product/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/product/:id/related", get(products::related))
        .route(
            "/productimg",
            get(products::list_images).post(products::add_image),
        )
        .route(
            "/productimg/:id",
            get(products::get_image).delete(products::delete_image),
        )
        .route(
            "/related-products",
            get(related_products::list_edges).post(related_products::create_edge),
        )
        .route(
            "/related-products/:id",
            get(related_products::get_edge)
                .put(related_products::update_edge)
                .delete(related_products::delete_edge),
        );

    let engagement = Router::new()
        .route(
            "/customer-interactions",
            get(interactions::list_interactions).post(interactions::record_interaction),
        )
        .route(
            "/customer-interactions/:id",
            get(interactions::get_interaction).delete(interactions::delete_interaction),
        )
        .route(
            "/product-statistics/:product_id",
            get(interactions::product_statistics),
        )
        .route("/recommendations", get(interactions::recommendations));

    let customer_data = Router::new()
        .route(
            "/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route(
            "/order/:id",
            get(orders::get_order).delete(orders::delete_order),
        )
        .route("/order-item/:id/status", put(orders::update_item_status))
        .route(
            "/address",
            get(addresses::list_addresses).post(addresses::create_address),
        )
        .route(
            "/address/:id",
            get(addresses::get_address)
                .put(addresses::update_address)
                .delete(addresses::delete_address),
        )
        .route("/addresses/:customer_id", get(addresses::customer_addresses))
        .route(
            "/wishlistitem",
            get(wishlist::list_items).post(wishlist::add_item),
        )
        .route(
            "/wishlistitem/:id",
            get(wishlist::get_item).delete(wishlist::remove_item),
        )
        .route("/wishlist/:customer_id", get(wishlist::user_wishlist))
        .route(
            "/productrating",
            get(ratings::list_ratings).post(ratings::create_rating),
        )
        .route(
            "/productrating/:id",
            get(ratings::get_rating)
                .put(ratings::update_rating)
                .delete(ratings::delete_rating),
        )
        .route(
            "/customer/dashboard/:id",
            get(dashboard::customer_dashboard),
        )
        .route("/vendor/dashboard/:id", get(dashboard::vendor_dashboard));

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(accounts)
        .merge(catalog)
        .merge(engagement)
        .merge(customer_data)
}

/// The routes plus request ids, tracing and API docs. CORS and compression
/// are added by the server binary.
pub fn app(state: AppState) -> Router {
    api_routes()
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}

async fn api_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "pcx-api",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<Value>, errors::ServiceError> {
    db::check_connection(&state.db).await?;
    Ok(Json(json!({
        "status": "healthy",
        "checks": { "database": "healthy" },
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
