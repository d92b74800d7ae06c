pub mod addresses;
pub mod auth;
pub mod categories;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod interactions;
pub mod orders;
pub mod products;
pub mod ratings;
pub mod related_products;
pub mod vendors;
pub mod wishlist;

use crate::{
    auth::AuthService,
    config::AppConfig,
    db::DbPool,
    services::{
        accounts::AccountService, addresses::AddressService, catalog::CatalogService,
        dashboard::DashboardService, interactions::InteractionService, orders::OrderService,
        ratings::RatingService, relationships::RelationshipService, wishlist::WishlistService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub relationships: Arc<RelationshipService>,
    pub interactions: Arc<InteractionService>,
    pub orders: Arc<OrderService>,
    pub addresses: Arc<AddressService>,
    pub wishlist: Arc<WishlistService>,
    pub ratings: Arc<RatingService>,
    pub dashboard: Arc<DashboardService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, auth_service: Arc<AuthService>, config: &AppConfig) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(db_pool.clone(), auth_service)),
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            relationships: Arc::new(RelationshipService::new(db_pool.clone())),
            interactions: Arc::new(InteractionService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(db_pool.clone())),
            addresses: Arc::new(AddressService::new(db_pool.clone())),
            wishlist: Arc::new(WishlistService::new(db_pool.clone())),
            ratings: Arc::new(RatingService::new(db_pool.clone())),
            dashboard: Arc::new(DashboardService::new(
                db_pool,
                config.dashboard_recent_limit,
            )),
        }
    }
}
