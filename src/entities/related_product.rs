use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Why two products are linked.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "category")]
    Category,
    #[sea_orm(string_value = "purchased_together")]
    PurchasedTogether,
    #[sea_orm(string_value = "viewed_together")]
    ViewedTogether,
    #[sea_orm(string_value = "recommended")]
    Recommended,
}

impl Default for RelationKind {
    fn default() -> Self {
        Self::Manual
    }
}

/// Directed edge from `source_product_id` to `target_product_id`. At most one
/// edge exists per ordered pair.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "related_products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub source_product_id: Uuid,
    pub target_product_id: Uuid,
    pub relation_type: RelationKind,
    #[sea_orm(column_type = "Double")]
    pub relevance_score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::SourceProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Source,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::TargetProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Target,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Target.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
