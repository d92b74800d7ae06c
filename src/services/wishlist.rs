use crate::{
    entities::{customer, product, wishlist_item},
    errors::ServiceError,
    services::accounts::Caller,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone)]
pub struct WishlistService {
    db: Arc<DatabaseConnection>,
}

impl WishlistService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Adds a product to a wishlist. Adding a pair that is already present
    /// returns the stored row; the flag reports whether a row was created.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
    ) -> Result<(wishlist_item::Model, bool), ServiceError> {
        let txn = self.db.begin().await?;
        if customer::Entity::find_by_id(customer_id).one(&txn).await?.is_none() {
            return Err(ServiceError::not_found("Customer", customer_id));
        }
        if product::Entity::find_by_id(product_id).one(&txn).await?.is_none() {
            return Err(ServiceError::not_found("Product", product_id));
        }

        let inserted = wishlist_item::Entity::insert(wishlist_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            product_id: Set(product_id),
            added_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([
                wishlist_item::Column::CustomerId,
                wishlist_item::Column::ProductId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let row = wishlist_item::Entity::find()
            .filter(wishlist_item::Column::CustomerId.eq(customer_id))
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::InternalError("wishlist row missing".to_string()))?;
        txn.commit().await?;

        debug!(created = inserted > 0, "wishlist add");
        Ok((row, inserted > 0))
    }

    /// All rows for staff, the caller's own otherwise
    pub async fn list(&self, caller: &Caller) -> Result<Vec<wishlist_item::Model>, ServiceError> {
        let mut select = wishlist_item::Entity::find();
        if !caller.is_staff {
            select = select.filter(wishlist_item::Column::CustomerId.eq(caller.require_customer()?));
        }
        Ok(select
            .order_by_desc(wishlist_item::Column::AddedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn get(
        &self,
        caller: &Caller,
        item_id: Uuid,
    ) -> Result<wishlist_item::Model, ServiceError> {
        let row = wishlist_item::Entity::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Wishlist item", item_id))?;
        caller.ensure_customer(row.customer_id)?;
        Ok(row)
    }

    pub async fn remove(&self, caller: &Caller, item_id: Uuid) -> Result<(), ServiceError> {
        let row = self.get(caller, item_id).await?;
        wishlist_item::Entity::delete_by_id(row.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    /// The wishlist with product details, newest first
    #[instrument(skip(self))]
    pub async fn user_wishlist(
        &self,
        customer_id: Uuid,
        limit: Option<u64>,
    ) -> Result<Vec<WishlistEntry>, ServiceError> {
        let mut select = wishlist_item::Entity::find()
            .filter(wishlist_item::Column::CustomerId.eq(customer_id))
            .find_also_related(product::Entity)
            .order_by_desc(wishlist_item::Column::AddedAt);
        if let Some(limit) = limit {
            select = select.limit(limit);
        }

        Ok(select
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|(item, product)| product.map(|p| WishlistEntry::new(item, p)))
            .collect())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WishlistInput {
    pub product_id: Uuid,
    /// Staff only; customers always add to their own list
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WishlistEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_title: String,
    #[schema(value_type = String)]
    pub product_price: Decimal,
    pub product_thumbnail: String,
    pub added_at: DateTime<Utc>,
}

impl WishlistEntry {
    fn new(item: wishlist_item::Model, product: product::Model) -> Self {
        Self {
            id: item.id,
            product_id: product.id,
            product_title: product.title,
            product_price: product.price,
            product_thumbnail: product.thumbnail,
            added_at: item.added_at,
        }
    }
}
