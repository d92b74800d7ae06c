use crate::{
    entities::{customer, customer_product_interaction as interaction, product, product_statistics},
    errors::ServiceError,
    services::accounts::Caller,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// The four events tracked per customer and product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Viewed,
    AddedToCart,
    AddedToWishlist,
    Purchased,
}

impl InteractionKind {
    fn flag_column(self) -> interaction::Column {
        match self {
            Self::Viewed => interaction::Column::Viewed,
            Self::AddedToCart => interaction::Column::AddedToCart,
            Self::AddedToWishlist => interaction::Column::AddedToWishlist,
            Self::Purchased => interaction::Column::Purchased,
        }
    }

    fn counter_column(self) -> product_statistics::Column {
        match self {
            Self::Viewed => product_statistics::Column::ViewCount,
            Self::AddedToCart => product_statistics::Column::CartAddCount,
            Self::AddedToWishlist => product_statistics::Column::WishlistAddCount,
            Self::Purchased => product_statistics::Column::PurchaseCount,
        }
    }
}

/// Weighted engagement score: one point per view, 3 for a cart add,
/// 2 for a wishlist add and 5 for a purchase.
pub fn interaction_score(row: &interaction::Model) -> f64 {
    let mut score = row.view_count as f64;
    if row.added_to_cart {
        score += 3.0;
    }
    if row.added_to_wishlist {
        score += 2.0;
    }
    if row.purchased {
        score += 5.0;
    }
    score
}

#[derive(Clone)]
pub struct InteractionService {
    db: Arc<DatabaseConnection>,
}

impl InteractionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Records one event. The per-customer row and the product counters are
    /// written in the same transaction.
    #[instrument(skip(self))]
    pub async fn record_interaction(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        kind: InteractionKind,
    ) -> Result<interaction::Model, ServiceError> {
        let txn = self.db.begin().await?;

        if customer::Entity::find_by_id(customer_id).one(&txn).await?.is_none() {
            return Err(ServiceError::not_found("Customer", customer_id));
        }
        if product::Entity::find_by_id(product_id).one(&txn).await?.is_none() {
            return Err(ServiceError::not_found("Product", product_id));
        }

        let now = Utc::now();
        interaction::Entity::insert(interaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            product_id: Set(product_id),
            viewed: Set(false),
            added_to_cart: Set(false),
            added_to_wishlist: Set(false),
            purchased: Set(false),
            view_count: Set(0),
            interaction_score: Set(0.0),
            last_interaction: Set(now),
        })
        .on_conflict(
            OnConflict::columns([interaction::Column::CustomerId, interaction::Column::ProductId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let mut update = interaction::Entity::update_many()
            .col_expr(kind.flag_column(), Expr::value(true))
            .col_expr(interaction::Column::LastInteraction, Expr::value(now));
        if kind == InteractionKind::Viewed {
            update = update.col_expr(
                interaction::Column::ViewCount,
                Expr::col(interaction::Column::ViewCount).add(1),
            );
        }
        update
            .filter(interaction::Column::CustomerId.eq(customer_id))
            .filter(interaction::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;

        ensure_statistics_row(&txn, product_id).await?;
        let counter = kind.counter_column();
        product_statistics::Entity::update_many()
            .col_expr(counter, Expr::col(counter).add(1))
            .col_expr(product_statistics::Column::LastUpdated, Expr::value(now))
            .filter(product_statistics::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;

        let row = interaction::Entity::find()
            .filter(interaction::Column::CustomerId.eq(customer_id))
            .filter(interaction::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::InternalError("interaction row vanished".to_string()))?;

        let score = interaction_score(&row);
        let mut active: interaction::ActiveModel = row.into();
        active.interaction_score = Set(score);
        let row = active.update(&txn).await?;

        txn.commit().await?;
        debug!(score, "interaction recorded");
        Ok(row)
    }

    /// Rows for one customer, most recent first
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<interaction::Model>, ServiceError> {
        Ok(interaction::Entity::find()
            .filter(interaction::Column::CustomerId.eq(customer_id))
            .order_by_desc(interaction::Column::LastInteraction)
            .all(&*self.db)
            .await?)
    }

    pub async fn get(
        &self,
        caller: &Caller,
        interaction_id: Uuid,
    ) -> Result<interaction::Model, ServiceError> {
        let row = interaction::Entity::find_by_id(interaction_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Interaction", interaction_id))?;
        caller.ensure_customer(row.customer_id)?;
        Ok(row)
    }

    pub async fn delete(&self, caller: &Caller, interaction_id: Uuid) -> Result<(), ServiceError> {
        let row = self.get(caller, interaction_id).await?;
        interaction::Entity::delete_by_id(row.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    /// Counters for a product, creating the zeroed row on first access.
    #[instrument(skip(self))]
    pub async fn product_statistics(
        &self,
        product_id: Uuid,
    ) -> Result<product_statistics::Model, ServiceError> {
        if product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Product", product_id));
        }
        ensure_statistics_row(&*self.db, product_id).await
    }

    /// Counters for every product a vendor owns
    #[instrument(skip(self))]
    pub async fn vendor_statistics(&self, vendor_id: Uuid) -> Result<VendorStatistics, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::VendorId.eq(vendor_id))
            .order_by_asc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut product_stats = Vec::with_capacity(products.len());
        for product in &products {
            let stats = ensure_statistics_row(&*self.db, product.id).await?;
            product_stats.push(ProductCounters {
                id: product.id,
                title: product.title.clone(),
                views: stats.view_count,
                purchases: stats.purchase_count,
                cart_adds: stats.cart_add_count,
                wishlist_adds: stats.wishlist_add_count,
            });
        }

        Ok(VendorStatistics {
            total_products: products.len() as u64,
            product_stats,
        })
    }
}

/// Find-or-insert for a product's statistics row. Concurrent callers race on
/// the unique product id; the loser's insert is a no-op.
async fn ensure_statistics_row<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<product_statistics::Model, ServiceError> {
    product_statistics::Entity::insert(product_statistics::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        view_count: Set(0),
        purchase_count: Set(0),
        cart_add_count: Set(0),
        wishlist_add_count: Set(0),
        last_updated: Set(Utc::now()),
    })
    .on_conflict(
        OnConflict::column(product_statistics::Column::ProductId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    product_statistics::Entity::find()
        .filter(product_statistics::Column::ProductId.eq(product_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::InternalError("statistics row missing".to_string()))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InteractionInput {
    pub product_id: Uuid,
    pub kind: InteractionKind,
    /// Staff only; customers always record for themselves
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductCounters {
    pub id: Uuid,
    pub title: String,
    pub views: i64,
    pub purchases: i64,
    pub cart_adds: i64,
    pub wishlist_adds: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VendorStatistics {
    pub total_products: u64,
    pub product_stats: Vec<ProductCounters>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InteractionView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub viewed: bool,
    pub added_to_cart: bool,
    pub added_to_wishlist: bool,
    pub purchased: bool,
    pub view_count: i64,
    pub interaction_score: f64,
    pub last_interaction: DateTime<Utc>,
}

impl From<interaction::Model> for InteractionView {
    fn from(row: interaction::Model) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            product_id: row.product_id,
            viewed: row.viewed,
            added_to_cart: row.added_to_cart,
            added_to_wishlist: row.added_to_wishlist,
            purchased: row.purchased,
            view_count: row.view_count,
            interaction_score: row.interaction_score,
            last_interaction: row.last_interaction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(view_count: i64, cart: bool, wishlist: bool, purchased: bool) -> interaction::Model {
        interaction::Model {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            viewed: view_count > 0,
            added_to_cart: cart,
            added_to_wishlist: wishlist,
            purchased,
            view_count,
            interaction_score: 0.0,
            last_interaction: Utc::now(),
        }
    }

    #[test]
    fn score_weights() {
        assert_eq!(interaction_score(&row(0, false, false, false)), 0.0);
        assert_eq!(interaction_score(&row(2, false, false, false)), 2.0);
        assert_eq!(interaction_score(&row(1, true, true, true)), 11.0);
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&InteractionKind::AddedToCart).unwrap(),
            "\"added_to_cart\""
        );
        let kind: InteractionKind = serde_json::from_str("\"added_to_wishlist\"").unwrap();
        assert_eq!(kind, InteractionKind::AddedToWishlist);
    }

    proptest! {
        #[test]
        fn score_is_views_plus_flag_weights(
            views in 0i64..10_000,
            cart: bool,
            wishlist: bool,
            purchased: bool,
        ) {
            let score = interaction_score(&row(views, cart, wishlist, purchased));
            let flags = [(cart, 3.0), (wishlist, 2.0), (purchased, 5.0)]
                .iter()
                .filter(|(set, _)| *set)
                .map(|(_, w)| w)
                .sum::<f64>();
            prop_assert_eq!(score, views as f64 + flags);
            prop_assert!(score >= views as f64);
        }
    }
}
