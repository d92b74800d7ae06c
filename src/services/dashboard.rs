use crate::{
    entities::{customer, customer_address, order, order_item, product, vendor, wishlist_item},
    errors::ServiceError,
    services::{accounts::Caller, orders::order_total},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

const TOP_PRODUCTS: usize = 5;

/// Read-only summaries computed on demand
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DatabaseConnection>,
    recent_limit: u64,
}

impl DashboardService {
    pub fn new(db: Arc<DatabaseConnection>, recent_limit: u64) -> Self {
        Self { db, recent_limit }
    }

    #[instrument(skip(self, caller))]
    pub async fn customer_dashboard(
        &self,
        caller: &Caller,
        customer_id: Uuid,
    ) -> Result<CustomerDashboard, ServiceError> {
        customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))?;
        caller.ensure_customer(customer_id)?;

        let total_orders = order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .count(&*self.db)
            .await?;
        let total_wishlist_items = wishlist_item::Entity::find()
            .filter(wishlist_item::Column::CustomerId.eq(customer_id))
            .count(&*self.db)
            .await?;
        let total_addresses = customer_address::Entity::find()
            .filter(customer_address::Column::CustomerId.eq(customer_id))
            .count(&*self.db)
            .await?;

        let orders = order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::OrderTime)
            .limit(self.recent_limit)
            .all(&*self.db)
            .await?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut lines: HashMap<Uuid, Vec<(i32, Decimal)>> = HashMap::new();
        for (item, product) in order_item::Entity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .find_also_related(product::Entity)
            .all(&*self.db)
            .await?
        {
            let price = product.map(|p| p.price).unwrap_or_default();
            lines
                .entry(item.order_id)
                .or_default()
                .push((item.quantity, price));
        }

        let recent_orders = orders
            .into_iter()
            .map(|o| {
                let lines = lines.remove(&o.id).unwrap_or_default();
                RecentOrder {
                    id: o.id,
                    date: o.order_time,
                    total_items: lines.len() as i64,
                    total_amount: order_total(lines.iter().map(|(q, p)| (*q, p))),
                }
            })
            .collect();

        let recent_wishlist = wishlist_item::Entity::find()
            .filter(wishlist_item::Column::CustomerId.eq(customer_id))
            .find_also_related(product::Entity)
            .order_by_desc(wishlist_item::Column::AddedAt)
            .limit(self.recent_limit)
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|(item, product)| {
                product.map(|p| RecentWishlistItem {
                    id: item.id,
                    product_id: p.id,
                    product_title: p.title,
                    product_price: p.price,
                    added_at: item.added_at,
                })
            })
            .collect();

        Ok(CustomerDashboard {
            total_orders,
            total_wishlist_items,
            total_addresses,
            recent_orders,
            recent_wishlist,
        })
    }

    #[instrument(skip(self, caller))]
    pub async fn vendor_dashboard(
        &self,
        caller: &Caller,
        vendor_id: Uuid,
    ) -> Result<VendorDashboard, ServiceError> {
        vendor::Entity::find_by_id(vendor_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vendor", vendor_id))?;
        caller.ensure_vendor(vendor_id)?;

        let products = product::Entity::find()
            .filter(product::Column::VendorId.eq(vendor_id))
            .order_by_asc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();

        let mut sales: Vec<(order_item::Model, order::Model)> = order_item::Entity::find()
            .filter(order_item::Column::ProductId.is_in(product_ids))
            .find_also_related(order::Entity)
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|(item, order)| order.map(|o| (item, o)))
            .collect();
        sales.sort_by(|a, b| b.1.order_time.cmp(&a.1.order_time));

        Ok(summarize_vendor(
            &products,
            &sales,
            self.recent_limit as usize,
        ))
    }
}

/// Pure aggregation over a vendor's products and the order lines that
/// reference them. `sales` must already be sorted newest first.
fn summarize_vendor(
    products: &[product::Model],
    sales: &[(order_item::Model, order::Model)],
    recent_limit: usize,
) -> VendorDashboard {
    let by_id: HashMap<Uuid, &product::Model> = products.iter().map(|p| (p.id, p)).collect();

    let distinct_orders: HashSet<Uuid> = sales.iter().map(|(item, _)| item.order_id).collect();
    let total_revenue = order_total(
        sales
            .iter()
            .filter_map(|(item, _)| by_id.get(&item.product_id).map(|p| (item.quantity, &p.price))),
    );

    let recent_orders = sales
        .iter()
        .take(recent_limit)
        .filter_map(|(item, order)| {
            by_id.get(&item.product_id).map(|p| VendorRecentOrder {
                order_id: order.id,
                date: order.order_time,
                product: p.title.clone(),
                quantity: item.quantity,
                amount: order_total([(item.quantity, &p.price)]),
            })
        })
        .collect();

    let mut per_product: HashMap<Uuid, (u64, i64)> = HashMap::new();
    for (item, _) in sales {
        let entry = per_product.entry(item.product_id).or_default();
        entry.0 += 1;
        entry.1 += i64::from(item.quantity);
    }

    // Unsold products rank with zero lines. Stable sort keeps creation order
    // among equal line counts.
    let mut top_products: Vec<TopProduct> = products
        .iter()
        .map(|p| {
            let (orders, quantity) = per_product.get(&p.id).copied().unwrap_or_default();
            TopProduct {
                id: p.id,
                title: p.title.clone(),
                price: p.price,
                orders,
                quantity_sold: quantity,
            }
        })
        .collect();
    top_products.sort_by(|a, b| b.orders.cmp(&a.orders));
    top_products.truncate(TOP_PRODUCTS);

    VendorDashboard {
        total_products: products.len() as u64,
        total_orders: distinct_orders.len() as u64,
        total_revenue,
        recent_orders,
        top_products,
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentOrder {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    /// Number of order lines
    pub total_items: i64,
    #[schema(value_type = String, example = "19.98")]
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentWishlistItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_title: String,
    #[schema(value_type = String)]
    pub product_price: Decimal,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerDashboard {
    pub total_orders: u64,
    pub total_wishlist_items: u64,
    pub total_addresses: u64,
    pub recent_orders: Vec<RecentOrder>,
    pub recent_wishlist: Vec<RecentWishlistItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VendorRecentOrder {
    pub order_id: Uuid,
    pub date: DateTime<Utc>,
    pub product: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TopProduct {
    pub id: Uuid,
    pub title: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    /// Number of order lines referencing the product
    pub orders: u64,
    pub quantity_sold: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VendorDashboard {
    pub total_products: u64,
    pub total_orders: u64,
    #[schema(value_type = String, example = "19.98")]
    pub total_revenue: Decimal,
    pub recent_orders: Vec<VendorRecentOrder>,
    pub top_products: Vec<TopProduct>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn product(title: &str, price: Decimal, offset: i64) -> product::Model {
        let at = Utc::now() + Duration::seconds(offset);
        product::Model {
            id: Uuid::new_v4(),
            category_id: None,
            vendor_id: None,
            title: title.to_string(),
            detail: None,
            price,
            thumbnail: "t.png".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    fn sale(product_id: Uuid, order_id: Uuid, quantity: i32) -> (order_item::Model, order::Model) {
        let now = Utc::now();
        (
            order_item::Model {
                id: Uuid::new_v4(),
                order_id,
                product_id,
                quantity,
                status: false,
                created_at: now,
            },
            order::Model {
                id: order_id,
                customer_id: Uuid::new_v4(),
                order_time: now,
            },
        )
    }

    #[test]
    fn vendor_summary_counts_distinct_orders_and_revenue() {
        let widget = product("Widget", dec!(9.99), 0);
        let gadget = product("Gadget", dec!(5.00), 1);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let sales = vec![
            sale(widget.id, first, 2),
            sale(gadget.id, first, 1),
            sale(gadget.id, second, 3),
        ];

        let summary = summarize_vendor(&[widget.clone(), gadget.clone()], &sales, 5);
        assert_eq!(summary.total_products, 2);
        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.total_revenue, dec!(39.98));
        assert_eq!(summary.recent_orders.len(), 3);
        assert_eq!(summary.top_products[0].title, "Gadget");
        assert_eq!(summary.top_products[0].quantity_sold, 4);
        assert_eq!(summary.top_products[1].title, "Widget");
    }

    #[test]
    fn ties_keep_creation_order_and_cap_at_five() {
        let products: Vec<product::Model> = (0..7)
            .map(|i| product(&format!("P{i}"), dec!(1.00), i))
            .collect();
        let sales: Vec<_> = products
            .iter()
            .map(|p| sale(p.id, Uuid::new_v4(), 1))
            .collect();

        let summary = summarize_vendor(&products, &sales, 2);
        let titles: Vec<&str> = summary.top_products.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["P0", "P1", "P2", "P3", "P4"]);
        assert_eq!(summary.recent_orders.len(), 2);
    }

    #[test]
    fn vendor_without_sales_is_zeroed() {
        let summary = summarize_vendor(&[product("Widget", dec!(9.99), 0)], &[], 5);
        assert_eq!(summary.total_products, 1);
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.total_revenue, Decimal::ZERO);
        assert_eq!(summary.top_products.len(), 1);
        assert_eq!(summary.top_products[0].orders, 0);
        assert_eq!(summary.top_products[0].quantity_sold, 0);
    }

    #[test]
    fn unsold_products_follow_sold_ones() {
        let widget = product("Widget", dec!(9.99), 0);
        let gadget = product("Gadget", dec!(5.00), 1);
        let sales = vec![sale(gadget.id, Uuid::new_v4(), 2)];

        let summary = summarize_vendor(&[widget, gadget], &sales, 5);
        let ranked: Vec<(&str, u64, i64)> = summary
            .top_products
            .iter()
            .map(|t| (t.title.as_str(), t.orders, t.quantity_sold))
            .collect();
        assert_eq!(ranked, vec![("Gadget", 1, 2), ("Widget", 0, 0)]);
    }
}
