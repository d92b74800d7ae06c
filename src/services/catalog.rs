use crate::{
    entities::{product, product_category, product_image, product_rating, vendor},
    errors::ServiceError,
    services::{
        accounts::Caller, non_negative, not_blank, page_window, relationships::related_products,
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const FEATURED_COUNT: u64 = 5;

/// Categories, products and product images
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // Categories

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<product_category::Model>, ServiceError> {
        Ok(product_category::Entity::find()
            .order_by_asc(product_category::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Every category with the number of products filed under it
    #[instrument(skip(self))]
    pub async fn categories_with_stats(&self) -> Result<Vec<CategoryWithStats>, ServiceError> {
        let counts: HashMap<Uuid, i64> = product::Entity::find()
            .select_only()
            .column(product::Column::CategoryId)
            .column_as(Expr::col(product::Column::Id).count(), "product_count")
            .filter(product::Column::CategoryId.is_not_null())
            .group_by(product::Column::CategoryId)
            .into_tuple::<(Option<Uuid>, i64)>()
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|(category_id, count)| category_id.map(|id| (id, count)))
            .collect();

        Ok(self
            .list_categories()
            .await?
            .into_iter()
            .map(|category| CategoryWithStats {
                product_count: counts.get(&category.id).copied().unwrap_or(0),
                id: category.id,
                title: category.title,
                detail: category.detail,
                image: category.image,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_category(
        &self,
        category_id: Uuid,
    ) -> Result<product_category::Model, ServiceError> {
        product_category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id))
    }

    #[instrument(skip(self, caller, input))]
    pub async fn create_category(
        &self,
        caller: &Caller,
        input: CategoryInput,
    ) -> Result<product_category::Model, ServiceError> {
        ensure_catalog_editor(caller)?;
        input.validate()?;

        let category = product_category::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title.trim().to_string()),
            detail: Set(input.detail),
            image: Set(input.image),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        info!(category_id = %category.id, "category created");
        Ok(category)
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update_category(
        &self,
        caller: &Caller,
        category_id: Uuid,
        input: CategoryInput,
    ) -> Result<product_category::Model, ServiceError> {
        ensure_catalog_editor(caller)?;
        input.validate()?;
        let existing = self.get_category(category_id).await?;

        let mut active: product_category::ActiveModel = existing.into();
        active.title = Set(input.title.trim().to_string());
        active.detail = Set(input.detail);
        active.image = Set(input.image);
        Ok(active.update(&*self.db).await?)
    }

    /// Products in the category keep existing with no category.
    #[instrument(skip(self, caller))]
    pub async fn delete_category(
        &self,
        caller: &Caller,
        category_id: Uuid,
    ) -> Result<(), ServiceError> {
        ensure_catalog_editor(caller)?;
        let result = product_category::Entity::delete_by_id(category_id)
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Category", category_id));
        }
        Ok(())
    }

    // Products

    /// Catalog listing. `category` is either a category id or a fragment of
    /// its title; `featured` returns the newest products only.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: ProductQuery,
    ) -> Result<Vec<ProductSummary>, ServiceError> {
        let mut select = product::Entity::find();

        if let Some(raw) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            let category_id = match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => self.category_by_title(raw).await?.map(|c| c.id),
            };
            match category_id {
                Some(id) => select = select.filter(product::Column::CategoryId.eq(id)),
                None => return Ok(Vec::new()),
            }
        }

        let rows = if query.featured.unwrap_or(false) {
            select
                .order_by_desc(product::Column::CreatedAt)
                .limit(FEATURED_COUNT)
                .all(&*self.db)
                .await?
        } else {
            let (offset, limit) = page_window(query.page, query.limit);
            select
                .order_by_asc(product::Column::CreatedAt)
                .offset(offset)
                .limit(limit)
                .all(&*self.db)
                .await?
        };

        Ok(rows.into_iter().map(ProductSummary::from).collect())
    }

    /// First category, in creation order, whose title contains `needle`
    /// ignoring case.
    async fn category_by_title(
        &self,
        needle: &str,
    ) -> Result<Option<product_category::Model>, ServiceError> {
        let pattern = LikeExpr::new(contains_pattern(needle)).escape('\\');
        Ok(product_category::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(product_category::Column::Title))).like(pattern))
            .order_by_asc(product_category::Column::CreatedAt)
            .one(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn vendor_products(&self, vendor_id: Uuid) -> Result<Vec<ProductSummary>, ServiceError> {
        Ok(product::Entity::find()
            .filter(product::Column::VendorId.eq(vendor_id))
            .order_by_asc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(ProductSummary::from)
            .collect())
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))
    }

    /// Product with its images, ratings and up to `related_limit` related products
    #[instrument(skip(self))]
    pub async fn product_detail(
        &self,
        product_id: Uuid,
        related_limit: u64,
    ) -> Result<ProductDetail, ServiceError> {
        let product = self.get_product(product_id).await?;

        let images = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product.id))
            .order_by_asc(product_image::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        let ratings = product_rating::Entity::find()
            .filter(product_rating::Column::ProductId.eq(product.id))
            .order_by_desc(product_rating::Column::AddTime)
            .all(&*self.db)
            .await?;
        let related = related_products(&*self.db, &product, related_limit).await?;

        Ok(ProductDetail {
            product: product.into(),
            images: images.into_iter().map(ProductImageView::from).collect(),
            ratings: ratings
                .into_iter()
                .map(|r| RatingLine {
                    id: r.id,
                    customer_id: r.customer_id,
                    rating: r.rating,
                    reviews: r.reviews,
                    add_time: r.add_time,
                })
                .collect(),
            related_products: related.into_iter().map(ProductSummary::from).collect(),
        })
    }

    /// Creates a product and any extra images in one transaction. Vendors
    /// always create for themselves; staff may name a vendor.
    #[instrument(skip(self, caller, input))]
    pub async fn create_product(
        &self,
        caller: &Caller,
        input: ProductInput,
    ) -> Result<ProductSummary, ServiceError> {
        input.validate()?;
        let vendor_id = if caller.is_staff {
            input.vendor_id.or(caller.vendor_id)
        } else {
            Some(caller.require_vendor()?)
        };

        let txn = self.db.begin().await?;
        if let Some(vendor_id) = vendor_id {
            if vendor::Entity::find_by_id(vendor_id).one(&txn).await?.is_none() {
                return Err(ServiceError::not_found("Vendor", vendor_id));
            }
        }
        ensure_category_exists(&txn, input.category_id).await?;

        let now = Utc::now();
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            category_id: Set(input.category_id),
            vendor_id: Set(vendor_id),
            title: Set(input.title.trim().to_string()),
            detail: Set(input.detail),
            price: Set(input.price),
            thumbnail: Set(input.thumbnail),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for image in input.images.into_iter().filter(|i| !i.trim().is_empty()) {
            product_image::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                image: Set(image),
                created_at: Set(Utc::now()),
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        info!(product_id = %product.id, vendor_id = ?product.vendor_id, "product created");
        Ok(product.into())
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update_product(
        &self,
        caller: &Caller,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductSummary, ServiceError> {
        input.validate()?;
        let existing = self.get_product(product_id).await?;
        caller.ensure_product_owner(existing.vendor_id)?;
        ensure_category_exists(&*self.db, input.category_id).await?;

        let mut active: product::ActiveModel = existing.into();
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(title) = input.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(detail) = input.detail {
            active.detail = Set(Some(detail));
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(thumbnail) = input.thumbnail {
            active.thumbnail = Set(thumbnail);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?.into())
    }

    #[instrument(skip(self, caller))]
    pub async fn delete_product(&self, caller: &Caller, product_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_product(product_id).await?;
        caller.ensure_product_owner(existing.vendor_id)?;
        product::Entity::delete_by_id(product_id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    // Images

    pub async fn list_images(
        &self,
        product_id: Option<Uuid>,
    ) -> Result<Vec<ProductImageView>, ServiceError> {
        let mut select = product_image::Entity::find();
        if let Some(product_id) = product_id {
            select = select.filter(product_image::Column::ProductId.eq(product_id));
        }
        Ok(select
            .order_by_asc(product_image::Column::CreatedAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(ProductImageView::from)
            .collect())
    }

    pub async fn get_image(&self, image_id: Uuid) -> Result<ProductImageView, ServiceError> {
        product_image::Entity::find_by_id(image_id)
            .one(&*self.db)
            .await?
            .map(ProductImageView::from)
            .ok_or_else(|| ServiceError::not_found("Product image", image_id))
    }

    #[instrument(skip(self, caller, input))]
    pub async fn add_image(
        &self,
        caller: &Caller,
        input: ProductImageInput,
    ) -> Result<ProductImageView, ServiceError> {
        input.validate()?;
        let product = self.get_product(input.product_id).await?;
        caller.ensure_product_owner(product.vendor_id)?;

        Ok(product_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            image: Set(input.image),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?
        .into())
    }

    #[instrument(skip(self, caller))]
    pub async fn delete_image(&self, caller: &Caller, image_id: Uuid) -> Result<(), ServiceError> {
        let image = self.get_image(image_id).await?;
        let product = self.get_product(image.product_id).await?;
        caller.ensure_product_owner(product.vendor_id)?;
        product_image::Entity::delete_by_id(image_id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }
}

fn ensure_catalog_editor(caller: &Caller) -> Result<(), ServiceError> {
    if caller.is_staff || caller.vendor_id.is_some() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Only vendors and staff can manage categories".to_string(),
        ))
    }
}

async fn ensure_category_exists<C: ConnectionTrait>(
    conn: &C,
    category_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    if let Some(category_id) = category_id {
        if product_category::Entity::find_by_id(category_id)
            .one(conn)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Category", category_id));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 250), custom = "not_blank")]
    pub title: String,
    pub detail: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryWithStats {
    pub id: Uuid,
    pub title: String,
    pub detail: Option<String>,
    pub image: Option<String>,
    pub product_count: i64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Category id, or part of a category title
    pub category: Option<String>,
    /// Only the newest products
    pub featured: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProductInput {
    pub category_id: Option<Uuid>,
    /// Honoured for staff callers only
    pub vendor_id: Option<Uuid>,
    #[validate(length(min = 1, max = 250), custom = "not_blank")]
    pub title: String,
    pub detail: Option<String>,
    #[validate(custom = "non_negative")]
    #[schema(value_type = String, example = "9.99")]
    pub price: Decimal,
    #[validate(custom = "not_blank")]
    pub thumbnail: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 250), custom = "not_blank")]
    pub title: Option<String>,
    pub detail: Option<String>,
    #[validate(custom = "non_negative")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(custom = "not_blank")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProductImageInput {
    pub product_id: Uuid,
    #[validate(custom = "not_blank")]
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub title: String,
    pub detail: Option<String>,
    #[schema(value_type = String, example = "9.99")]
    pub price: Decimal,
    pub thumbnail: String,
    pub created_at: DateTime<Utc>,
}

impl From<product::Model> for ProductSummary {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            vendor_id: model.vendor_id,
            title: model.title,
            detail: model.detail,
            price: model.price,
            thumbnail: model.thumbnail,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductImageView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image: String,
}

impl From<product_image::Model> for ProductImageView {
    fn from(model: product_image::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            image: model.image,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RatingLine {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub rating: i32,
    pub reviews: String,
    pub add_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductSummary,
    pub images: Vec<ProductImageView>,
    pub ratings: Vec<RatingLine>,
    pub related_products: Vec<ProductSummary>,
}

/// `LIKE` pattern matching `needle` anywhere, lowercased, with the wildcard
/// characters escaped by `\`.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_fragment_wildcards_are_literal() {
        assert_eq!(contains_pattern("Kitch"), "%kitch%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
