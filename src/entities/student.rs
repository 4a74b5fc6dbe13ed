//! Student entity - A learner attending classes, or a sales outlet posing as one.
//!
//! Students are grouped by a free-text `class_name`. Rows flagged with
//! `is_sales_channel` stand in for a retail outlet so that shop takings can be
//! reported separately from class fees.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Unique identifier for the student
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (required)
    pub name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Class grouping label (e.g. "Tuesday Evening"), None when unassigned
    pub class_name: Option<String>,
    /// Whether this row represents a sales outlet rather than a person
    pub is_sales_channel: bool,
    /// When the student was added
    pub created_at: DateTime,
}

/// Defines relationships between Student and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One student has many purchases
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
    /// One student has many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
