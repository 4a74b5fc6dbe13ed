//! Category order entity - Custom display rank for material categories.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_order")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Category label being ranked
    #[sea_orm(unique)]
    pub category_name: String,
    /// Position, lowest first
    pub sort_order: i32,
}

/// `CategoryOrder` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
