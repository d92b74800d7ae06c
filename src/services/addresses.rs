use crate::{
    entities::{customer, customer_address},
    errors::ServiceError,
    services::{accounts::Caller, not_blank},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Customer postal addresses. Several may be flagged as default; nothing
/// reconciles the flag across a customer's rows.
#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All addresses for staff, the caller's own otherwise
    pub async fn list(&self, caller: &Caller) -> Result<Vec<customer_address::Model>, ServiceError> {
        let mut select = customer_address::Entity::find();
        if !caller.is_staff {
            select =
                select.filter(customer_address::Column::CustomerId.eq(caller.require_customer()?));
        }
        Ok(select
            .order_by_asc(customer_address::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn for_customer(
        &self,
        caller: &Caller,
        customer_id: Uuid,
    ) -> Result<Vec<customer_address::Model>, ServiceError> {
        caller.ensure_customer(customer_id)?;
        Ok(customer_address::Entity::find()
            .filter(customer_address::Column::CustomerId.eq(customer_id))
            .order_by_asc(customer_address::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn get(
        &self,
        caller: &Caller,
        address_id: Uuid,
    ) -> Result<customer_address::Model, ServiceError> {
        let row = customer_address::Entity::find_by_id(address_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Address", address_id))?;
        caller.ensure_customer(row.customer_id)?;
        Ok(row)
    }

    #[instrument(skip(self, caller, input))]
    pub async fn create(
        &self,
        caller: &Caller,
        input: AddressInput,
    ) -> Result<customer_address::Model, ServiceError> {
        input.validate()?;
        let customer_id = match input.customer_id {
            Some(id) => {
                caller.ensure_customer(id)?;
                id
            }
            None => caller.require_customer()?,
        };
        if customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Customer", customer_id));
        }

        Ok(customer_address::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            address: Set(input.address.trim().to_string()),
            default_address: Set(input.default_address),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?)
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &Caller,
        address_id: Uuid,
        input: UpdateAddressInput,
    ) -> Result<customer_address::Model, ServiceError> {
        input.validate()?;
        let row = self.get(caller, address_id).await?;

        let mut active: customer_address::ActiveModel = row.into();
        if let Some(address) = input.address {
            active.address = Set(address.trim().to_string());
        }
        if let Some(default_address) = input.default_address {
            active.default_address = Set(default_address);
        }
        Ok(active.update(&*self.db).await?)
    }

    pub async fn delete(&self, caller: &Caller, address_id: Uuid) -> Result<(), ServiceError> {
        let row = self.get(caller, address_id).await?;
        customer_address::Entity::delete_by_id(row.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddressInput {
    /// Defaults to the caller's customer record
    pub customer_id: Option<Uuid>,
    #[validate(custom = "not_blank")]
    pub address: String,
    #[serde(default)]
    pub default_address: bool,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAddressInput {
    #[validate(custom = "not_blank")]
    pub address: Option<String>,
    pub default_address: Option<bool>,
}
