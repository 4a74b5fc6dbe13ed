//! Application settings loading from config.toml
//!
//! Settings cover the database location, defaults applied to new materials and an
//! optional catalogue of materials used to seed an empty store. Every section is
//! optional; a missing file means "use the defaults".

use crate::core::material::{self, MaterialInput};
use crate::entities::PricingType;
use crate::errors::{Error, Result};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

fn default_supplier() -> String {
    "Cooksongold".to_string()
}

const fn default_pack_quantity() -> f64 {
    1.0
}

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the store lives
    pub database: DatabaseSettings,
    /// Defaults for new materials
    pub materials: MaterialDefaults,
    /// Materials inserted when the store has none
    pub catalogue: Vec<CatalogueEntry>,
}

/// `[database]` section
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection URL; `DATABASE_URL` takes precedence
    pub url: Option<String>,
}

/// `[materials]` section
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MaterialDefaults {
    /// Supplier recorded when a catalogue entry names none
    pub default_supplier: String,
    /// Markup applied when a catalogue entry names none
    pub default_markup_percentage: f64,
}

impl Default for MaterialDefaults {
    fn default() -> Self {
        Self {
            default_supplier: default_supplier(),
            default_markup_percentage: 0.0,
        }
    }
}

/// A `[[catalogue]]` entry
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogueEntry {
    /// Material name
    pub name: String,
    /// Display category
    #[serde(default)]
    pub category: Option<String>,
    /// Unit the quantity is counted in
    pub unit_type: String,
    /// Supplier price
    pub base_price: f64,
    /// Items per pack
    #[serde(default = "default_pack_quantity")]
    pub pack_quantity: f64,
    /// Markup; falls back to `[materials] default_markup_percentage`
    #[serde(default)]
    pub markup_percentage: Option<f64>,
    /// Pricing formula
    #[serde(default)]
    pub pricing_type: PricingType,
    /// Grams per item for `per_kg_item`
    #[serde(default)]
    pub weight_per_unit: Option<f64>,
    /// Supplier; falls back to `[materials] default_supplier`
    #[serde(default)]
    pub supplier: Option<String>,
    /// Supplier product page
    #[serde(default)]
    pub supplier_url: Option<String>,
}

impl CatalogueEntry {
    /// Builds the material input, filling gaps from `defaults`.
    #[must_use]
    pub fn to_input(&self, defaults: &MaterialDefaults) -> MaterialInput {
        MaterialInput {
            name: self.name.clone(),
            category: self.category.clone(),
            unit_type: self.unit_type.clone(),
            pricing_type: self.pricing_type,
            base_price: self.base_price,
            pack_quantity: self.pack_quantity,
            markup_percentage: self
                .markup_percentage
                .unwrap_or(defaults.default_markup_percentage),
            weight_per_unit: self.weight_per_unit,
            supplier: Some(
                self.supplier
                    .clone()
                    .unwrap_or_else(|| defaults.default_supplier.clone()),
            ),
            supplier_url: self.supplier_url.clone(),
            is_active: true,
            notes: None,
        }
    }
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A catalogue entry is missing a required field
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Attempting to load settings from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `path`, or the defaults when the file does not exist.
pub fn load_settings_or_default<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    if path_ref.exists() {
        load_settings(path_ref)
    } else {
        info!("No settings file at {}, using defaults", path_ref.display());
        Ok(Settings::default())
    }
}

/// Inserts the catalogue when the store has no materials yet. Returns how many were added.
pub async fn seed_catalogue(db: &DatabaseConnection, settings: &Settings) -> Result<usize> {
    if settings.catalogue.is_empty() {
        return Ok(0);
    }
    if !material::get_all_materials(db, true).await?.is_empty() {
        debug!("Materials already present, skipping catalogue seed");
        return Ok(0);
    }
    for entry in &settings.catalogue {
        material::add_material(db, entry.to_input(&settings.materials)).await?;
    }
    info!(count = settings.catalogue.len(), "Seeded material catalogue");
    Ok(settings.catalogue.len())
}
