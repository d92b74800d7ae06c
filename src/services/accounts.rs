use crate::{
    auth::{hash_password, verify_password, AuthService, AuthUser, TokenPair},
    entities::{customer, user, vendor},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const BAD_CREDENTIALS: &str = "Invalid Username/Password!!";
const USERNAME_TAKEN: &str = "Username is already taken.";

/// Registration and identity management
#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
}

impl AccountService {
    pub fn new(db: Arc<DatabaseConnection>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    /// Creates the identity and its role record in one transaction.
    #[instrument(skip(self, input), fields(username = ?input.username))]
    pub async fn register(&self, input: RegisterInput) -> Result<RegisteredAccount, ServiceError> {
        let (username, password) = match (non_blank(&input.username), non_blank(&input.password))
        {
            (Some(u), Some(p)) => (u, p),
            _ => {
                return Err(ServiceError::ValidationError(
                    "Username and password are required.".to_string(),
                ))
            }
        };
        let kind = RegistrationType::parse(input.registration_type.as_deref())?;
        let password_hash = hash_password(password)?;

        let txn = self.db.begin().await?;
        let user = insert_identity(
            &txn,
            username,
            input.email.clone(),
            password_hash,
            kind == RegistrationType::Customer,
            kind == RegistrationType::Vendor,
            false,
        )
        .await?;

        let (customer_id, vendor_id) = match kind {
            RegistrationType::Customer => {
                let row = insert_customer(&txn, user.id, input.mobile.clone()).await?;
                (Some(row.id), None)
            }
            RegistrationType::Vendor => {
                let row = insert_vendor(&txn, user.id, input.address.clone()).await?;
                (None, Some(row.id))
            }
        };
        txn.commit().await?;

        info!(user_id = %user.id, ?kind, "account registered");
        Ok(RegisteredAccount {
            message: "Registration successful.".to_string(),
            user_id: user.id,
            customer_id,
            vendor_id,
        })
    }

    /// Verifies credentials and issues a token pair. Unknown usernames and
    /// wrong passwords fail identically.
    #[instrument(skip(self, input))]
    pub async fn login(&self, input: LoginInput) -> Result<LoginSuccess, ServiceError> {
        let (username, password) = match (non_blank(&input.username), non_blank(&input.password))
        {
            (Some(u), Some(p)) => (u, p),
            _ => {
                return Err(ServiceError::ValidationError(
                    "Missing username or password".to_string(),
                ))
            }
        };

        let user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await?;

        let user = match user {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => {
                warn!("login rejected");
                return Err(ServiceError::AuthError(BAD_CREDENTIALS.to_string()));
            }
        };

        let customer_id = customer::Entity::find()
            .filter(customer::Column::UserId.eq(user.id))
            .one(&*self.db)
            .await?
            .map(|c| c.id);
        let vendor_id = vendor::Entity::find()
            .filter(vendor::Column::UserId.eq(user.id))
            .one(&*self.db)
            .await?
            .map(|v| v.id);

        let tokens = self
            .auth
            .generate_token(&user)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        Ok(LoginSuccess {
            user_type: AccountRole::from_flags(&user),
            user,
            tokens,
            customer_id,
            vendor_id,
        })
    }

    /// Exchanges a refresh token for a new pair
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        self.auth
            .refresh_token(refresh_token)
            .await
            .map_err(|e| ServiceError::Unauthorized(e.to_string()))
    }

    /// Resolves the caller's current role records from the store.
    pub async fn caller(&self, auth: &AuthUser) -> Result<Caller, ServiceError> {
        let user = user::Entity::find_by_id(auth.user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("User no longer exists".to_string()))?;

        let customer_id = customer::Entity::find()
            .filter(customer::Column::UserId.eq(user.id))
            .one(&*self.db)
            .await?
            .map(|c| c.id);
        let vendor_id = vendor::Entity::find()
            .filter(vendor::Column::UserId.eq(user.id))
            .one(&*self.db)
            .await?
            .map(|v| v.id);

        Ok(Caller {
            user_id: user.id,
            username: user.username,
            customer_id,
            vendor_id,
            is_staff: user.is_staff,
        })
    }

    /// Like [`Self::caller`] but tolerates anonymous requests.
    pub async fn optional_caller(
        &self,
        auth: Option<&AuthUser>,
    ) -> Result<Option<Caller>, ServiceError> {
        match auth {
            Some(auth) => self.caller(auth).await.map(Some),
            None => Ok(None),
        }
    }

    /// Creates a staff identity with no customer or vendor record
    #[instrument(skip(self, password))]
    pub async fn create_staff(
        &self,
        username: &str,
        password: &str,
    ) -> Result<user::Model, ServiceError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::ValidationError(
                "Username and password are required.".to_string(),
            ));
        }
        let password_hash = hash_password(password)?;
        let user = insert_identity(
            &*self.db,
            username.trim(),
            None,
            password_hash,
            false,
            false,
            true,
        )
        .await?;
        info!(user_id = %user.id, "staff account created");
        Ok(user)
    }

    /// Grants staff rights to an existing identity
    #[instrument(skip(self))]
    pub async fn promote_staff(&self, username: &str) -> Result<user::Model, ServiceError> {
        let user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", username))?;

        let mut active: user::ActiveModel = user.into();
        active.is_staff = Set(true);
        Ok(active.update(&*self.db).await?)
    }

    // Vendors

    #[instrument(skip(self))]
    pub async fn list_vendors(&self) -> Result<Vec<VendorView>, ServiceError> {
        let rows = vendor::Entity::find()
            .find_also_related(user::Entity)
            .order_by_asc(vendor::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(v, u)| VendorView::new(v, u.as_ref()))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_vendor(&self, vendor_id: Uuid) -> Result<VendorView, ServiceError> {
        let (v, u) = vendor::Entity::find_by_id(vendor_id)
            .find_also_related(user::Entity)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vendor", vendor_id))?;
        Ok(VendorView::new(v, u.as_ref()))
    }

    /// Staff-only: creates a vendor identity and its vendor record
    #[instrument(skip(self, caller, input))]
    pub async fn create_vendor(
        &self,
        caller: &Caller,
        input: CreateVendorInput,
    ) -> Result<VendorView, ServiceError> {
        if !caller.is_staff {
            return Err(ServiceError::Forbidden(
                "Only staff can create vendors directly".to_string(),
            ));
        }
        input.validate()?;
        let password_hash = hash_password(&input.password)?;

        let txn = self.db.begin().await?;
        let user = insert_identity(
            &txn,
            input.username.trim(),
            input.email.clone(),
            password_hash,
            false,
            true,
            false,
        )
        .await?;
        let row = insert_vendor(&txn, user.id, input.address.clone()).await?;
        txn.commit().await?;

        Ok(VendorView::new(row, Some(&user)))
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update_vendor(
        &self,
        caller: &Caller,
        vendor_id: Uuid,
        input: UpdateVendorInput,
    ) -> Result<VendorView, ServiceError> {
        caller.ensure_vendor(vendor_id)?;
        let row = vendor::Entity::find_by_id(vendor_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vendor", vendor_id))?;

        let mut active: vendor::ActiveModel = row.into();
        active.address = Set(input.address);
        active.update(&*self.db).await?;
        self.get_vendor(vendor_id).await
    }

    /// Deletes the vendor's identity; the vendor row goes with it and its
    /// products are orphaned.
    #[instrument(skip(self, caller))]
    pub async fn delete_vendor(&self, caller: &Caller, vendor_id: Uuid) -> Result<(), ServiceError> {
        caller.ensure_vendor(vendor_id)?;
        let row = vendor::Entity::find_by_id(vendor_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vendor", vendor_id))?;

        let txn = self.db.begin().await?;
        vendor::Entity::delete_by_id(row.id).exec(&txn).await?;
        delete_identity_if_roleless(&txn, row.user_id).await?;
        txn.commit().await?;
        Ok(())
    }

    // Customers

    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<CustomerView>, ServiceError> {
        let rows = customer::Entity::find()
            .find_also_related(user::Entity)
            .order_by_asc(customer::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(c, u)| CustomerView::new(c, u.as_ref()))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<CustomerView, ServiceError> {
        let (c, u) = customer::Entity::find_by_id(customer_id)
            .find_also_related(user::Entity)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))?;
        Ok(CustomerView::new(c, u.as_ref()))
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update_customer(
        &self,
        caller: &Caller,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<CustomerView, ServiceError> {
        caller.ensure_customer(customer_id)?;
        input.validate()?;
        let row = customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))?;

        let mut active: customer::ActiveModel = row.into();
        active.mobile = Set(input.mobile);
        active.update(&*self.db).await?;
        self.get_customer(customer_id).await
    }

    #[instrument(skip(self, caller))]
    pub async fn delete_customer(
        &self,
        caller: &Caller,
        customer_id: Uuid,
    ) -> Result<(), ServiceError> {
        caller.ensure_customer(customer_id)?;
        let row = customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))?;

        let txn = self.db.begin().await?;
        customer::Entity::delete_by_id(row.id).exec(&txn).await?;
        delete_identity_if_roleless(&txn, row.user_id).await?;
        txn.commit().await?;
        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

async fn insert_identity<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    email: Option<String>,
    password_hash: String,
    is_customer: bool,
    is_vendor: bool,
    is_staff: bool,
) -> Result<user::Model, ServiceError> {
    let taken = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(conn)
        .await?
        .is_some();
    if taken {
        return Err(ServiceError::Conflict(USERNAME_TAKEN.to_string()));
    }

    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        is_customer: Set(is_customer),
        is_vendor: Set(is_vendor),
        is_staff: Set(is_staff),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .map_err(ServiceError::conflict_on_unique(USERNAME_TAKEN))
}

async fn insert_customer<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    mobile: Option<String>,
) -> Result<customer::Model, ServiceError> {
    Ok(customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        mobile: Set(mobile),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?)
}

async fn insert_vendor<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    address: Option<String>,
) -> Result<vendor::Model, ServiceError> {
    Ok(vendor::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        address: Set(address),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?)
}

/// Drops the identity once neither role record remains, unless it is staff.
async fn delete_identity_if_roleless<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<(), ServiceError> {
    let Some(user) = user::Entity::find_by_id(user_id).one(conn).await? else {
        return Ok(());
    };
    let has_customer = customer::Entity::find()
        .filter(customer::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .is_some();
    let has_vendor = vendor::Entity::find()
        .filter(vendor::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .is_some();

    if !has_customer && !has_vendor && !user.is_staff {
        user::Entity::delete_by_id(user_id).exec(conn).await?;
    } else {
        let mut active: user::ActiveModel = user.into();
        active.is_customer = Set(has_customer);
        active.is_vendor = Set(has_vendor);
        active.update(conn).await?;
    }
    Ok(())
}

/// The authenticated caller with its role records resolved
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: Uuid,
    pub username: String,
    pub customer_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub is_staff: bool,
}

impl Caller {
    pub fn require_customer(&self) -> Result<Uuid, ServiceError> {
        self.customer_id
            .ok_or_else(|| ServiceError::Forbidden("Caller is not a customer".to_string()))
    }

    pub fn require_vendor(&self) -> Result<Uuid, ServiceError> {
        self.vendor_id
            .ok_or_else(|| ServiceError::Forbidden("Caller is not a vendor".to_string()))
    }

    pub fn owns_customer(&self, customer_id: Uuid) -> bool {
        self.is_staff || self.customer_id == Some(customer_id)
    }

    pub fn owns_vendor(&self, vendor_id: Uuid) -> bool {
        self.is_staff || self.vendor_id == Some(vendor_id)
    }

    pub fn ensure_customer(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        if self.owns_customer(customer_id) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "You do not have permission to access this customer's data".to_string(),
            ))
        }
    }

    pub fn ensure_vendor(&self, vendor_id: Uuid) -> Result<(), ServiceError> {
        if self.owns_vendor(vendor_id) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "You do not have permission to access this vendor's data".to_string(),
            ))
        }
    }

    /// Products without a vendor can only be managed by staff.
    pub fn ensure_product_owner(&self, vendor_id: Option<Uuid>) -> Result<(), ServiceError> {
        match vendor_id {
            Some(id) if self.owns_vendor(id) => Ok(()),
            _ if self.is_staff => Ok(()),
            _ => Err(ServiceError::Forbidden(
                "Only the owning vendor can modify this product".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegistrationType {
    Customer,
    Vendor,
}

impl RegistrationType {
    fn parse(raw: Option<&str>) -> Result<Self, ServiceError> {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("customer") => Ok(Self::Customer),
            Some("vendor") => Ok(Self::Vendor),
            _ => Err(ServiceError::ValidationError(
                "registration_type must be 'customer' or 'vendor'".to_string(),
            )),
        }
    }
}

/// Which role records an identity carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Customer,
    Vendor,
    Both,
    Staff,
}

impl AccountRole {
    pub fn from_flags(user: &user::Model) -> Self {
        match (user.is_customer, user.is_vendor) {
            (true, true) => Self::Both,
            (false, true) => Self::Vendor,
            (true, false) => Self::Customer,
            (false, false) => Self::Staff,
        }
    }
}

/// Fields are optional so missing values surface as validation errors.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RegisterInput {
    pub username: Option<String>,
    pub password: Option<String>,
    /// "customer" or "vendor"
    pub registration_type: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisteredAccount {
    pub message: String,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginInput {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct LoginSuccess {
    pub user: user::Model,
    pub tokens: TokenPair,
    pub user_type: AccountRole,
    pub customer_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVendorInput {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVendorInput {
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerInput {
    #[validate(length(max = 32))]
    pub mobile: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VendorView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VendorView {
    fn new(row: vendor::Model, user: Option<&user::Model>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            username: user.map(|u| u.username.clone()),
            address: row.address,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub mobile: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CustomerView {
    fn new(row: customer::Model, user: Option<&user::Model>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            username: user.map(|u| u.username.clone()),
            mobile: row.mobile,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn registration_type_parsing() {
        assert_eq!(
            RegistrationType::parse(Some("Customer")).unwrap(),
            RegistrationType::Customer
        );
        assert_eq!(
            RegistrationType::parse(Some("vendor")).unwrap(),
            RegistrationType::Vendor
        );
        assert_matches!(
            RegistrationType::parse(Some("admin")),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            RegistrationType::parse(None),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn caller_ownership_rules() {
        let customer_id = Uuid::new_v4();
        let caller = Caller {
            user_id: Uuid::new_v4(),
            username: "alice".into(),
            customer_id: Some(customer_id),
            vendor_id: None,
            is_staff: false,
        };
        assert!(caller.ensure_customer(customer_id).is_ok());
        assert_matches!(
            caller.ensure_customer(Uuid::new_v4()),
            Err(ServiceError::Forbidden(_))
        );
        assert_matches!(caller.require_vendor(), Err(ServiceError::Forbidden(_)));
        assert_matches!(
            caller.ensure_product_owner(None),
            Err(ServiceError::Forbidden(_))
        );

        let staff = Caller {
            is_staff: true,
            customer_id: None,
            ..caller
        };
        assert!(staff.ensure_customer(customer_id).is_ok());
        assert!(staff.ensure_product_owner(None).is_ok());
    }
}
