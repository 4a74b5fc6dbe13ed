//! Purchase entity - Material bought by a student, priced at write time.
//!
//! `unit_price` and `total_cost` are a snapshot of the material's pricing when
//! the row was written. Reads never recompute them.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    /// Unique identifier for the purchase
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student charged for the purchase
    pub student_id: i64,
    /// Project the material was used for, if any
    pub project_id: Option<i64>,
    /// Material bought
    pub material_id: i64,
    /// Quantity in the material's unit
    pub quantity: f64,
    /// Price per unit including markup, frozen at write time
    pub unit_price: f64,
    /// `quantity * unit_price`
    pub total_cost: f64,
    /// When the purchase happened (may be backdated)
    pub purchase_date: DateTime,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Defines relationships between Purchase and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each purchase belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    /// Each purchase references one material
    #[sea_orm(
        belongs_to = "super::material::Entity",
        from = "Column::MaterialId",
        to = "super::material::Column::Id"
    )]
    Material,
    /// A purchase may belong to a project
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "SetNull"
    )]
    Project,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Material.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
