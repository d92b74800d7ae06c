use crate::{
    entities::{customer_product_interaction, product, related_product, RelationKind},
    errors::ServiceError,
    services::{accounts::Caller, catalog::ProductSummary},
};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const DUPLICATE_EDGE: &str = "This product relationship already exists";

/// Products related to `product`, best first.
///
/// Explicit edges win when any exist, ordered by relevance. Otherwise other
/// products from the same category are returned. A product with neither
/// yields nothing.
pub async fn related_products<C: ConnectionTrait>(
    conn: &C,
    product: &product::Model,
    limit: u64,
) -> Result<Vec<product::Model>, ServiceError> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let edges = related_product::Entity::find()
        .filter(related_product::Column::SourceProductId.eq(product.id))
        .order_by_desc(related_product::Column::RelevanceScore)
        .order_by_asc(related_product::Column::CreatedAt)
        .limit(limit)
        .all(conn)
        .await?;

    if !edges.is_empty() {
        let ids: Vec<Uuid> = edges.iter().map(|e| e.target_product_id).collect();
        let mut targets: HashMap<Uuid, product::Model> = product::Entity::find()
            .filter(product::Column::Id.is_in(ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        return Ok(edges
            .iter()
            .filter_map(|e| targets.remove(&e.target_product_id))
            .collect());
    }

    let Some(category_id) = product.category_id else {
        return Ok(Vec::new());
    };

    Ok(product::Entity::find()
        .filter(product::Column::CategoryId.eq(category_id))
        .filter(product::Column::Id.ne(product.id))
        .order_by_asc(product::Column::CreatedAt)
        .limit(limit)
        .all(conn)
        .await?)
}

/// Related-product lookups, recommendations and edge management
#[derive(Clone)]
pub struct RelationshipService {
    db: Arc<DatabaseConnection>,
}

impl RelationshipService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_related(
        &self,
        product_id: Uuid,
        limit: u64,
    ) -> Result<Vec<ProductSummary>, ServiceError> {
        let product = product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        Ok(related_products(&*self.db, &product, limit)
            .await?
            .into_iter()
            .map(ProductSummary::from)
            .collect())
    }

    /// Unseen products from the categories a customer has interacted with,
    /// falling back to a random sample of the catalog.
    #[instrument(skip(self))]
    pub async fn get_recommendations(
        &self,
        customer_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<ProductSummary>, ServiceError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        if let Some(customer_id) = customer_id {
            let personal = self.category_recommendations(customer_id, limit).await?;
            if !personal.is_empty() {
                debug!(count = personal.len(), "category based recommendations");
                return Ok(personal);
            }
        }

        self.random_products(limit).await
    }

    async fn category_recommendations(
        &self,
        customer_id: Uuid,
        limit: u64,
    ) -> Result<Vec<ProductSummary>, ServiceError> {
        let seen: Vec<Uuid> = customer_product_interaction::Entity::find()
            .select_only()
            .column(customer_product_interaction::Column::ProductId)
            .filter(customer_product_interaction::Column::CustomerId.eq(customer_id))
            .into_tuple()
            .all(&*self.db)
            .await?;
        if seen.is_empty() {
            return Ok(Vec::new());
        }

        let categories: Vec<Uuid> = product::Entity::find()
            .select_only()
            .column(product::Column::CategoryId)
            .filter(product::Column::Id.is_in(seen.clone()))
            .filter(product::Column::CategoryId.is_not_null())
            .distinct()
            .into_tuple::<Option<Uuid>>()
            .all(&*self.db)
            .await?
            .into_iter()
            .flatten()
            .collect();
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates = product::Entity::find()
            .filter(product::Column::CategoryId.is_in(categories))
            .filter(product::Column::Id.is_not_in(seen))
            .all(&*self.db)
            .await?;

        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(limit as usize);
        Ok(candidates.into_iter().map(ProductSummary::from).collect())
    }

    async fn random_products(&self, limit: u64) -> Result<Vec<ProductSummary>, ServiceError> {
        let ids: Vec<Uuid> = product::Entity::find()
            .select_only()
            .column(product::Column::Id)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let picked: Vec<Uuid> = ids
            .choose_multiple(&mut rand::thread_rng(), limit as usize)
            .copied()
            .collect();
        if picked.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows = product::Entity::find()
            .filter(product::Column::Id.is_in(picked))
            .all(&*self.db)
            .await?;
        rows.shuffle(&mut rand::thread_rng());
        Ok(rows.into_iter().map(ProductSummary::from).collect())
    }

    // Edges

    #[instrument(skip(self))]
    pub async fn list_edges(
        &self,
        source_product_id: Option<Uuid>,
    ) -> Result<Vec<RelatedProductView>, ServiceError> {
        let mut select = related_product::Entity::find().find_also_related(product::Entity);
        if let Some(source) = source_product_id {
            select = select.filter(related_product::Column::SourceProductId.eq(source));
        }
        Ok(select
            .order_by_desc(related_product::Column::RelevanceScore)
            .order_by_asc(related_product::Column::CreatedAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|(edge, target)| RelatedProductView::new(edge, target))
            .collect())
    }

    pub async fn get_edge(&self, edge_id: Uuid) -> Result<RelatedProductView, ServiceError> {
        let (edge, target) = related_product::Entity::find_by_id(edge_id)
            .find_also_related(product::Entity)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product relationship", edge_id))?;
        Ok(RelatedProductView::new(edge, target))
    }

    #[instrument(skip(self, caller, input))]
    pub async fn create_edge(
        &self,
        caller: &Caller,
        input: RelatedProductInput,
    ) -> Result<RelatedProductView, ServiceError> {
        input.validate()?;
        if input.source_product_id == input.target_product_id {
            return Err(ServiceError::ValidationError(
                "A product cannot be related to itself".to_string(),
            ));
        }

        let source = self.product(input.source_product_id).await?;
        caller.ensure_product_owner(source.vendor_id)?;
        let target = self.product(input.target_product_id).await?;

        let exists = related_product::Entity::find()
            .filter(related_product::Column::SourceProductId.eq(source.id))
            .filter(related_product::Column::TargetProductId.eq(target.id))
            .one(&*self.db)
            .await?
            .is_some();
        if exists {
            return Err(ServiceError::Conflict(DUPLICATE_EDGE.to_string()));
        }

        let edge = related_product::ActiveModel {
            id: Set(Uuid::new_v4()),
            source_product_id: Set(source.id),
            target_product_id: Set(target.id),
            relation_type: Set(input.relation_type.unwrap_or_default()),
            relevance_score: Set(input.relevance_score.unwrap_or(1.0)),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .map_err(ServiceError::conflict_on_unique(DUPLICATE_EDGE))?;

        info!(edge_id = %edge.id, source = %source.id, target = %target.id, "product relationship created");
        Ok(RelatedProductView::new(edge, Some(target)))
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update_edge(
        &self,
        caller: &Caller,
        edge_id: Uuid,
        input: UpdateRelatedProductInput,
    ) -> Result<RelatedProductView, ServiceError> {
        input.validate()?;
        let edge = related_product::Entity::find_by_id(edge_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product relationship", edge_id))?;
        let source = self.product(edge.source_product_id).await?;
        caller.ensure_product_owner(source.vendor_id)?;

        let mut active: related_product::ActiveModel = edge.into();
        if let Some(kind) = input.relation_type {
            active.relation_type = Set(kind);
        }
        if let Some(score) = input.relevance_score {
            active.relevance_score = Set(score);
        }
        active.update(&*self.db).await?;
        self.get_edge(edge_id).await
    }

    #[instrument(skip(self, caller))]
    pub async fn delete_edge(&self, caller: &Caller, edge_id: Uuid) -> Result<(), ServiceError> {
        let edge = related_product::Entity::find_by_id(edge_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product relationship", edge_id))?;
        let source = self.product(edge.source_product_id).await?;
        caller.ensure_product_owner(source.vendor_id)?;

        related_product::Entity::delete_by_id(edge_id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RelatedProductInput {
    pub source_product_id: Uuid,
    pub target_product_id: Uuid,
    pub relation_type: Option<RelationKind>,
    #[validate(range(min = 0.0))]
    pub relevance_score: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateRelatedProductInput {
    pub relation_type: Option<RelationKind>,
    #[validate(range(min = 0.0))]
    pub relevance_score: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RelatedProductView {
    pub id: Uuid,
    pub source_product_id: Uuid,
    pub target_product_id: Uuid,
    pub relation_type: RelationKind,
    pub relevance_score: f64,
    pub created_at: DateTime<Utc>,
    pub target_product: Option<ProductSummary>,
}

impl RelatedProductView {
    fn new(edge: related_product::Model, target: Option<product::Model>) -> Self {
        Self {
            id: edge.id,
            source_product_id: edge.source_product_id,
            target_product_id: edge.target_product_id,
            relation_type: edge.relation_type,
            relevance_score: edge.relevance_score,
            created_at: edge.created_at,
            target_product: target.map(ProductSummary::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::connect_in_memory,
        entities::{customer, product_category, user},
        services::interactions::{InteractionKind, InteractionService},
    };
    use rust_decimal_macros::dec;

    async fn category(db: &DatabaseConnection, title: &str) -> Uuid {
        product_category::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            detail: Set(None),
            image: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    async fn product(db: &DatabaseConnection, title: &str, category_id: Option<Uuid>) -> product::Model {
        let now = Utc::now();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            category_id: Set(category_id),
            vendor_id: Set(None),
            title: Set(title.to_string()),
            detail: Set(None),
            price: Set(dec!(1.00)),
            thumbnail: Set("thumb.png".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn edge(db: &DatabaseConnection, source: Uuid, target: Uuid, score: f64) {
        related_product::ActiveModel {
            id: Set(Uuid::new_v4()),
            source_product_id: Set(source),
            target_product_id: Set(target),
            relation_type: Set(RelationKind::Manual),
            relevance_score: Set(score),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .unwrap();
    }

    async fn shopper(db: &DatabaseConnection, username: &str) -> Uuid {
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(None),
            password_hash: Set("x".to_string()),
            is_customer: Set(true),
            is_vendor: Set(false),
            is_staff: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .unwrap();
        customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            mobile: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    fn titles(rows: &[product::Model]) -> Vec<&str> {
        rows.iter().map(|p| p.title.as_str()).collect()
    }

    #[tokio::test]
    async fn explicit_edges_take_precedence_in_relevance_order() {
        let db = connect_in_memory().await.unwrap();
        let tools = category(&db, "Tools").await;
        let widget = product(&db, "Widget", Some(tools)).await;
        let hammer = product(&db, "Hammer", Some(tools)).await;
        let glue = product(&db, "Glue", None).await;
        let tape = product(&db, "Tape", None).await;

        edge(&db, widget.id, glue.id, 0.5).await;
        edge(&db, widget.id, tape.id, 2.0).await;

        let related = related_products(&db, &widget, 5).await.unwrap();
        assert_eq!(titles(&related), vec!["Tape", "Glue"]);
        assert!(!related.iter().any(|p| p.id == hammer.id));

        let related = related_products(&db, &widget, 1).await.unwrap();
        assert_eq!(titles(&related), vec!["Tape"]);
    }

    #[tokio::test]
    async fn category_fallback_excludes_the_product_itself() {
        let db = connect_in_memory().await.unwrap();
        let tools = category(&db, "Tools").await;
        let widget = product(&db, "Widget", Some(tools)).await;
        product(&db, "Hammer", Some(tools)).await;
        product(&db, "Saw", Some(tools)).await;
        product(&db, "Apple", None).await;

        let related = related_products(&db, &widget, 5).await.unwrap();
        assert_eq!(related.len(), 2);
        assert!(related.iter().all(|p| p.category_id == Some(tools) && p.id != widget.id));

        let related = related_products(&db, &widget, 1).await.unwrap();
        assert_eq!(related.len(), 1);
    }

    #[tokio::test]
    async fn no_edges_and_no_category_is_empty() {
        let db = connect_in_memory().await.unwrap();
        let lonely = product(&db, "Lonely", None).await;
        product(&db, "Other", None).await;

        assert!(related_products(&db, &lonely, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_product_in_catalog_is_empty() {
        let db = connect_in_memory().await.unwrap();
        let tools = category(&db, "Tools").await;
        let widget = product(&db, "Widget", Some(tools)).await;

        assert!(related_products(&db, &widget, 5).await.unwrap().is_empty());
        assert!(related_products(&db, &widget, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn anonymous_recommendations_sample_the_catalog() {
        let db = Arc::new(connect_in_memory().await.unwrap());
        for title in ["A", "B", "C", "D"] {
            product(&db, title, None).await;
        }
        let service = RelationshipService::new(db);

        let picks = service.get_recommendations(None, 3).await.unwrap();
        assert_eq!(picks.len(), 3);
        let mut ids: Vec<Uuid> = picks.iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);

        assert_eq!(service.get_recommendations(None, 10).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn viewed_categories_drive_recommendations() {
        let db = Arc::new(connect_in_memory().await.unwrap());
        let tools = category(&db, "Tools").await;
        let widget = product(&db, "Widget", Some(tools)).await;
        product(&db, "Hammer", Some(tools)).await;
        for title in ["A", "B", "C"] {
            product(&db, title, None).await;
        }
        let alice = shopper(&db, "alice").await;
        InteractionService::new(db.clone())
            .record_interaction(alice, widget.id, InteractionKind::Viewed)
            .await
            .unwrap();

        let picks = RelationshipService::new(db)
            .get_recommendations(Some(alice), 5)
            .await
            .unwrap();
        let picked: Vec<&str> = picks.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(picked, vec!["Hammer"]);
    }

    #[tokio::test]
    async fn exhausted_categories_fall_back_to_the_catalog() {
        let db = Arc::new(connect_in_memory().await.unwrap());
        let tools = category(&db, "Tools").await;
        let widget = product(&db, "Widget", Some(tools)).await;
        for title in ["A", "B", "C"] {
            product(&db, title, None).await;
        }
        let alice = shopper(&db, "alice").await;
        InteractionService::new(db.clone())
            .record_interaction(alice, widget.id, InteractionKind::Viewed)
            .await
            .unwrap();
        let service = RelationshipService::new(db);

        assert_eq!(service.get_recommendations(Some(alice), 2).await.unwrap().len(), 2);
        assert_eq!(service.get_recommendations(Some(alice), 10).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn customer_without_history_gets_a_catalog_sample() {
        let db = Arc::new(connect_in_memory().await.unwrap());
        let tools = category(&db, "Tools").await;
        product(&db, "Widget", Some(tools)).await;
        for title in ["A", "B"] {
            product(&db, title, None).await;
        }
        let alice = shopper(&db, "alice").await;
        let service = RelationshipService::new(db);

        assert_eq!(service.get_recommendations(Some(alice), 2).await.unwrap().len(), 2);
        assert!(service.get_recommendations(Some(alice), 0).await.unwrap().is_empty());
    }
}
