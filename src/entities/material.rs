//! Material entity - Stock items with supplier pricing.
//!
//! `base_price` is interpreted according to [`PricingType`]: a pack price for
//! `fixed`, a price per gram for `per_kg` and `per_kg_item`. Inactive
//! materials stay queryable so historical purchases keep a valid reference.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How a material's `base_price` converts into a per-item price.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    /// `base_price` is the price of a pack of `pack_quantity` items
    #[default]
    #[sea_orm(string_value = "fixed")]
    Fixed,
    /// `base_price` is a price per gram for stock sold by weight (sheet, wire)
    #[sea_orm(string_value = "per_kg")]
    PerKg,
    /// `base_price` is a price per gram and each item weighs `weight_per_unit` grams
    #[sea_orm(string_value = "per_kg_item")]
    PerKgItem,
}

/// Material database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "materials")]
pub struct Model {
    /// Unique identifier for the material
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Material name (e.g., "Sterling Silver Jump Rings 5mm")
    pub name: String,
    /// Display category (e.g., "Findings", "Sheet")
    pub category: Option<String>,
    /// Unit the quantity is counted in: gram, item, cm, mm, sheet, piece
    pub unit_type: String,
    /// Supplier price, meaning depends on `pricing_type`
    pub base_price: f64,
    /// Items per pack for `fixed` pricing
    pub pack_quantity: f64,
    /// Percentage added on top of the per-item cost
    pub markup_percentage: f64,
    /// Which formula prices a single item
    pub pricing_type: PricingType,
    /// Grams per single item, used by `per_kg_item`
    pub weight_per_unit: Option<f64>,
    /// Supplier name
    pub supplier: Option<String>,
    /// Product page used when refreshing the price
    pub supplier_url: Option<String>,
    /// Inactive materials are hidden from new purchases
    pub is_active: bool,
    /// When pricing or details last changed
    pub last_updated: DateTime,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Defines relationships between Material and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One material appears in many purchases
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
