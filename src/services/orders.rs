use crate::{
    entities::{customer, order, order_item, product},
    errors::ServiceError,
    services::accounts::Caller,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Sum of quantity × price, rounded to cents.
pub fn order_total<'a, I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (i32, &'a Decimal)>,
{
    lines
        .into_iter()
        .map(|(quantity, price)| Decimal::from(quantity) * *price)
        .sum::<Decimal>()
        .round_dp(2)
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates an order and its lines atomically. Prices are not captured;
    /// totals always read the current product price.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn create_order(
        &self,
        customer_id: Uuid,
        items: Vec<OrderLineInput>,
    ) -> Result<OrderDetail, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::ValidationError(
                "An order needs at least one item".to_string(),
            ));
        }
        if let Some(line) = items.iter().find(|line| line.quantity < 1) {
            return Err(ServiceError::ValidationError(format!(
                "Quantity for product {} must be at least 1",
                line.product_id
            )));
        }

        let txn = self.db.begin().await?;
        if customer::Entity::find_by_id(customer_id).one(&txn).await?.is_none() {
            return Err(ServiceError::not_found("Customer", customer_id));
        }
        for line in &items {
            if product::Entity::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .is_none()
            {
                return Err(ServiceError::not_found("Product", line.product_id));
            }
        }

        let now = Utc::now();
        let order = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            order_time: Set(now),
        }
        .insert(&txn)
        .await?;

        for line in items {
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                status: Set(false),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        let detail = load_detail(&txn, order).await?;
        txn.commit().await?;

        info!(order_id = %detail.id, total = %detail.total_amount, "order created");
        Ok(detail)
    }

    /// Everything for staff, otherwise the caller's own orders
    #[instrument(skip(self, caller))]
    pub async fn list_orders(&self, caller: &Caller) -> Result<Vec<OrderDetail>, ServiceError> {
        let mut select = order::Entity::find();
        if !caller.is_staff {
            select = select.filter(order::Column::CustomerId.eq(caller.require_customer()?));
        }
        let orders = select
            .order_by_desc(order::Column::OrderTime)
            .all(&*self.db)
            .await?;

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            details.push(load_detail(&*self.db, order).await?);
        }
        Ok(details)
    }

    pub async fn get_order(&self, caller: &Caller, order_id: Uuid) -> Result<OrderDetail, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
        caller.ensure_customer(order.customer_id)?;
        load_detail(&*self.db, order).await
    }

    #[instrument(skip(self, caller))]
    pub async fn delete_order(&self, caller: &Caller, order_id: Uuid) -> Result<(), ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
        caller.ensure_customer(order.customer_id)?;
        order::Entity::delete_by_id(order.id).exec(&*self.db).await?;
        Ok(())
    }

    /// Marks a line fulfilled or not. Only the vendor selling the product
    /// (or staff) may change it.
    #[instrument(skip(self, caller))]
    pub async fn update_item_status(
        &self,
        caller: &Caller,
        item_id: Uuid,
        status: bool,
    ) -> Result<OrderLine, ServiceError> {
        let (item, product) = order_item::Entity::find_by_id(item_id)
            .find_also_related(product::Entity)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order item", item_id))?;
        let product =
            product.ok_or_else(|| ServiceError::not_found("Product", item.product_id))?;
        caller.ensure_product_owner(product.vendor_id)?;

        let mut active: order_item::ActiveModel = item.into();
        active.status = Set(status);
        let item = active.update(&*self.db).await?;
        Ok(OrderLine::new(item, &product))
    }
}

async fn load_detail<C: ConnectionTrait>(
    conn: &C,
    order: order::Model,
) -> Result<OrderDetail, ServiceError> {
    let rows = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .find_also_related(product::Entity)
        .order_by_asc(order_item::Column::CreatedAt)
        .all(conn)
        .await?;

    let products: HashMap<Uuid, product::Model> = rows
        .iter()
        .filter_map(|(_, p)| p.clone().map(|p| (p.id, p)))
        .collect();

    let items: Vec<OrderLine> = rows
        .into_iter()
        .filter_map(|(item, _)| {
            products
                .get(&item.product_id)
                .map(|product| OrderLine::new(item, product))
        })
        .collect();

    Ok(OrderDetail {
        id: order.id,
        customer_id: order.customer_id,
        order_time: order.order_time,
        total_items: items.iter().map(|i| i64::from(i.quantity)).sum(),
        total_amount: order_total(items.iter().map(|i| (i.quantity, &i.price))),
        items,
    })
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderInput {
    /// Staff only; customers always order for themselves
    pub customer_id: Option<Uuid>,
    pub items: Vec<OrderLineInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ItemStatusInput {
    pub status: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_title: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub quantity: i32,
    pub status: bool,
    #[schema(value_type = String)]
    pub line_total: Decimal,
}

impl OrderLine {
    fn new(item: order_item::Model, product: &product::Model) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_title: product.title.clone(),
            price: product.price,
            quantity: item.quantity,
            status: item.status,
            line_total: order_total([(item.quantity, &product.price)]),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub order_time: DateTime<Utc>,
    pub items: Vec<OrderLine>,
    pub total_items: i64,
    #[schema(value_type = String, example = "19.98")]
    pub total_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn totals_round_to_cents() {
        let price = dec!(9.99);
        assert_eq!(order_total([(2, &price)]), dec!(19.98));
        assert_eq!(order_total(std::iter::empty::<(i32, &Decimal)>()), dec!(0));

        let third = dec!(0.333);
        assert_eq!(order_total([(3, &third)]), dec!(1.00));
    }

    proptest! {
        #[test]
        fn total_is_sum_of_lines(
            lines in prop::collection::vec((1i32..50, 0u32..100_000), 0..10)
        ) {
            let priced: Vec<(i32, Decimal)> = lines
                .iter()
                .map(|(q, cents)| (*q, Decimal::new(i64::from(*cents), 2)))
                .collect();
            let expected: Decimal = priced
                .iter()
                .map(|(q, p)| Decimal::from(*q) * p)
                .sum();
            let total = order_total(priced.iter().map(|(q, p)| (*q, p)));
            prop_assert_eq!(total, expected);
            prop_assert!(total >= Decimal::ZERO);
        }
    }
}
