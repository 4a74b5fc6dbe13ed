//! Material business logic - Handles all material-related operations.
//!
//! Materials carry the supplier pricing that purchases are priced from. Retiring a
//! material is done by deactivating it: inactive materials drop out of the list offered
//! for new purchases but remain valid for the purchases already recorded against them.

use crate::{
    core::{
        pricing::{self, PricingInputs},
        validation::{optional_text, require_markup, require_price, require_quantity, require_text},
    },
    entities::{Material, PricingType, Purchase, material, purchase},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use tracing::{info, instrument};

/// Fields supplied when adding or updating a material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInput {
    /// Material name (required)
    pub name: String,
    /// Display category
    pub category: Option<String>,
    /// Unit the quantity is counted in (required)
    pub unit_type: String,
    /// Which formula prices a single item
    pub pricing_type: PricingType,
    /// Pack price or price per gram
    pub base_price: f64,
    /// Items per pack, must be positive
    pub pack_quantity: f64,
    /// Percentage markup, zero or more
    pub markup_percentage: f64,
    /// Grams per item for `per_kg_item`
    pub weight_per_unit: Option<f64>,
    /// Supplier name
    pub supplier: Option<String>,
    /// Supplier product page
    pub supplier_url: Option<String>,
    /// Offered for new purchases
    pub is_active: bool,
    /// Free-form notes
    pub notes: Option<String>,
}

impl MaterialInput {
    /// An active, fixed-price material sold in packs of one with no markup.
    #[must_use]
    pub fn new(name: impl Into<String>, unit_type: impl Into<String>, base_price: f64) -> Self {
        Self {
            name: name.into(),
            category: None,
            unit_type: unit_type.into(),
            pricing_type: PricingType::Fixed,
            base_price,
            pack_quantity: 1.0,
            markup_percentage: 0.0,
            weight_per_unit: None,
            supplier: None,
            supplier_url: None,
            is_active: true,
            notes: None,
        }
    }
}

struct CheckedMaterial {
    name: String,
    unit_type: String,
    base_price: f64,
    pack_quantity: f64,
    markup_percentage: f64,
    weight_per_unit: Option<f64>,
}

fn check_input(input: &MaterialInput) -> Result<CheckedMaterial> {
    let name = require_text("Material name", &input.name)?;
    let unit_type = require_text("Unit type", &input.unit_type)?;
    let base_price = require_price(input.base_price)?;
    let pack_quantity = require_quantity(input.pack_quantity)?;
    let markup_percentage = require_markup(input.markup_percentage)?;
    let weight_per_unit = match input.weight_per_unit {
        Some(weight) if !weight.is_finite() || weight < 0.0 => {
            return Err(Error::Validation {
                message: format!("Weight per unit must be zero or more, got {weight}"),
            });
        }
        other => other,
    };
    Ok(CheckedMaterial {
        name,
        unit_type,
        base_price,
        pack_quantity,
        markup_percentage,
        weight_per_unit,
    })
}

/// Retrieves materials for the material list.
///
/// With `include_inactive` the active ones come first, then each group is sorted by
/// category and name. Without it only active materials are returned, by category and name.
pub async fn get_all_materials(
    db: &DatabaseConnection,
    include_inactive: bool,
) -> Result<Vec<material::Model>> {
    let query = if include_inactive {
        Material::find().order_by_desc(material::Column::IsActive)
    } else {
        Material::find().filter(material::Column::IsActive.eq(true))
    };
    query
        .order_by_asc(material::Column::Category)
        .order_by_asc(material::Column::Name)
        .order_by_asc(material::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Materials that can be chosen for a new purchase.
pub async fn get_active_materials(db: &DatabaseConnection) -> Result<Vec<material::Model>> {
    get_all_materials(db, false).await
}

/// Retrieves a specific material by ID, None if it does not exist.
pub async fn get_material_by_id<C>(db: &C, material_id: i64) -> Result<Option<material::Model>>
where
    C: ConnectionTrait,
{
    Material::find_by_id(material_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_material_by_id`] but a missing material is an error.
pub async fn get_material<C>(db: &C, material_id: i64) -> Result<material::Model>
where
    C: ConnectionTrait,
{
    get_material_by_id(db, material_id)
        .await?
        .ok_or(Error::MaterialNotFound { id: material_id })
}

/// Distinct non-empty categories, alphabetically.
pub async fn get_material_categories(db: &DatabaseConnection) -> Result<Vec<String>> {
    let categories: Vec<Option<String>> = Material::find()
        .select_only()
        .column(material::Column::Category)
        .distinct()
        .filter(material::Column::Category.is_not_null())
        .filter(material::Column::Category.ne(""))
        .order_by_asc(material::Column::Category)
        .into_tuple()
        .all(db)
        .await?;
    Ok(categories.into_iter().flatten().collect())
}

/// Creates a new material.
///
/// # Errors
/// Returns an error if:
/// - The name or unit type is empty
/// - The base price is negative or not finite
/// - The pack quantity is not positive
/// - The markup or weight per unit is negative or not finite
/// - The database insert operation fails
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn add_material(db: &DatabaseConnection, input: MaterialInput) -> Result<material::Model> {
    let checked = check_input(&input)?;

    let material = material::ActiveModel {
        name: Set(checked.name),
        category: Set(optional_text(input.category)),
        unit_type: Set(checked.unit_type),
        base_price: Set(checked.base_price),
        pack_quantity: Set(checked.pack_quantity),
        markup_percentage: Set(checked.markup_percentage),
        pricing_type: Set(input.pricing_type),
        weight_per_unit: Set(checked.weight_per_unit),
        supplier: Set(optional_text(input.supplier)),
        supplier_url: Set(optional_text(input.supplier_url)),
        is_active: Set(input.is_active),
        last_updated: Set(chrono::Local::now().naive_local()),
        notes: Set(optional_text(input.notes)),
        ..Default::default()
    };
    let material = material.insert(db).await?;
    info!(material_id = material.id, "Added material");
    Ok(material)
}

/// Replaces a material's details and refreshes `last_updated`.
///
/// Purchases already recorded keep the price they were written with.
#[instrument(skip(db, input))]
pub async fn update_material(
    db: &DatabaseConnection,
    material_id: i64,
    input: MaterialInput,
) -> Result<material::Model> {
    let checked = check_input(&input)?;

    let mut material: material::ActiveModel = get_material(db, material_id).await?.into();
    material.name = Set(checked.name);
    material.category = Set(optional_text(input.category));
    material.unit_type = Set(checked.unit_type);
    material.base_price = Set(checked.base_price);
    material.pack_quantity = Set(checked.pack_quantity);
    material.markup_percentage = Set(checked.markup_percentage);
    material.pricing_type = Set(input.pricing_type);
    material.weight_per_unit = Set(checked.weight_per_unit);
    material.supplier = Set(optional_text(input.supplier));
    material.supplier_url = Set(optional_text(input.supplier_url));
    material.is_active = Set(input.is_active);
    material.notes = Set(optional_text(input.notes));
    material.last_updated = Set(chrono::Local::now().naive_local());

    material.update(db).await.map_err(Into::into)
}

/// Sets a new base price, and the markup when one is given.
#[instrument(skip(db))]
pub async fn update_material_price(
    db: &DatabaseConnection,
    material_id: i64,
    new_base_price: f64,
    new_markup: Option<f64>,
) -> Result<material::Model> {
    let base_price = require_price(new_base_price)?;
    let markup = new_markup.map(require_markup).transpose()?;

    let mut material: material::ActiveModel = get_material(db, material_id).await?.into();
    material.base_price = Set(base_price);
    if let Some(markup) = markup {
        material.markup_percentage = Set(markup);
    }
    material.last_updated = Set(chrono::Local::now().naive_local());

    let material = material.update(db).await?;
    info!(material_id, base_price, "Updated material price");
    Ok(material)
}

/// Flips a material between active and inactive.
#[instrument(skip(db))]
pub async fn toggle_material_active(
    db: &DatabaseConnection,
    material_id: i64,
) -> Result<material::Model> {
    let current = get_material(db, material_id).await?;
    let is_active = !current.is_active;

    let mut material: material::ActiveModel = current.into();
    material.is_active = Set(is_active);
    material.last_updated = Set(chrono::Local::now().naive_local());

    let material = material.update(db).await?;
    info!(material_id, is_active, "Toggled material");
    Ok(material)
}

/// Price currently charged for one unit of the material, markup included.
pub async fn get_material_final_price(db: &DatabaseConnection, material_id: i64) -> Result<f64> {
    let material = get_material(db, material_id).await?;
    Ok(pricing::unit_price(&PricingInputs::from(&material)))
}

/// Deletes a material that no purchase refers to.
///
/// # Errors
/// Returns [`Error::MaterialInUse`] while purchases still reference it; deactivate it instead.
#[instrument(skip(db))]
pub async fn delete_material(db: &DatabaseConnection, material_id: i64) -> Result<()> {
    get_material(db, material_id).await?;

    let purchases = Purchase::find()
        .filter(purchase::Column::MaterialId.eq(material_id))
        .count(db)
        .await?;
    if purchases > 0 {
        return Err(Error::MaterialInUse {
            id: material_id,
            purchases,
        });
    }

    Material::delete_by_id(material_id).exec(db).await?;
    info!(material_id, "Deleted material");
    Ok(())
}
