use crate::{
    entities::{product, product_rating},
    errors::ServiceError,
    services::accounts::Caller,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Product ratings. A customer may rate the same product more than once.
#[derive(Clone)]
pub struct RatingService {
    db: Arc<DatabaseConnection>,
}

impl RatingService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        filter: RatingFilter,
    ) -> Result<Vec<product_rating::Model>, ServiceError> {
        let mut select = product_rating::Entity::find();
        if let Some(product_id) = filter.product_id {
            select = select.filter(product_rating::Column::ProductId.eq(product_id));
        }
        if let Some(customer_id) = filter.customer_id {
            select = select.filter(product_rating::Column::CustomerId.eq(customer_id));
        }
        Ok(select
            .order_by_desc(product_rating::Column::AddTime)
            .all(&*self.db)
            .await?)
    }

    pub async fn get(&self, rating_id: Uuid) -> Result<product_rating::Model, ServiceError> {
        product_rating::Entity::find_by_id(rating_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Rating", rating_id))
    }

    #[instrument(skip(self, caller, input))]
    pub async fn create(
        &self,
        caller: &Caller,
        input: RatingInput,
    ) -> Result<product_rating::Model, ServiceError> {
        input.validate()?;
        let customer_id = caller.require_customer()?;
        if product::Entity::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Product", input.product_id));
        }

        Ok(product_rating::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            product_id: Set(input.product_id),
            rating: Set(input.rating),
            reviews: Set(input.reviews.unwrap_or_default()),
            add_time: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?)
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &Caller,
        rating_id: Uuid,
        input: UpdateRatingInput,
    ) -> Result<product_rating::Model, ServiceError> {
        input.validate()?;
        let row = self.get(rating_id).await?;
        caller.ensure_customer(row.customer_id)?;

        let mut active: product_rating::ActiveModel = row.into();
        if let Some(rating) = input.rating {
            active.rating = Set(rating);
        }
        if let Some(reviews) = input.reviews {
            active.reviews = Set(reviews);
        }
        Ok(active.update(&*self.db).await?)
    }

    pub async fn delete(&self, caller: &Caller, rating_id: Uuid) -> Result<(), ServiceError> {
        let row = self.get(rating_id).await?;
        caller.ensure_customer(row.customer_id)?;
        product_rating::Entity::delete_by_id(row.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RatingFilter {
    pub product_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RatingInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    pub reviews: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateRatingInput {
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,
    pub reviews: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn rating_must_be_one_to_five() {
        let input = |rating| RatingInput {
            product_id: Uuid::new_v4(),
            rating,
            reviews: None,
        };
        assert!(input(1).validate().is_ok());
        assert!(input(5).validate().is_ok());
        assert!(input(0).validate().is_err());
        assert!(input(6).validate().is_err());

        let update = UpdateRatingInput {
            rating: Some(9),
            reviews: None,
        };
        assert_matches!(
            update.validate().map_err(ServiceError::from),
            Err(ServiceError::ValidationError(_))
        );
    }
}
