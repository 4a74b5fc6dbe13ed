//! Class order entity - Custom display rank for class names.
//!
//! The set of classes comes from `students.class_name`; rows here only carry
//! a rank and may outlive the class they name.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Class order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class_order")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Class label being ranked
    #[sea_orm(unique)]
    pub class_name: String,
    /// Position, lowest first
    pub sort_order: i32,
}

/// `ClassOrder` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
