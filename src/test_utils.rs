//! Shared test utilities for the workshop ledger.
//!
//! This module provides helpers for setting up migrated in-memory databases and
//! creating test entities with sensible defaults.

use crate::{
    core::{
        material::{self, MaterialInput},
        payment::{self, PaymentInput},
        purchase::{self, PurchaseInput},
        student::{self, StudentInput},
    },
    entities,
    errors::Result,
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with every migration applied.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::migrate(&db).await?;
    Ok(db)
}

/// Midnight on the given day.
///
/// # Panics
/// Panics on an invalid date.
#[allow(clippy::unwrap_used)]
#[must_use]
pub fn test_date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// Creates a student with only a name.
pub async fn create_test_student(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::student::Model> {
    student::add_student(db, StudentInput::new(name)).await
}

/// Creates a test material with sensible defaults.
///
/// # Defaults
/// * `unit_type`: "item"
/// * `category`: "Findings"
/// * `base_price`: 5.0 for a pack of 10, no markup (0.50 per item)
pub async fn create_test_material(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::material::Model> {
    create_custom_material(db, name, Some("Findings"), 5.0, 10.0, 0.0).await
}

/// Creates a fixed-price material with custom pricing.
pub async fn create_custom_material(
    db: &DatabaseConnection,
    name: &str,
    category: Option<&str>,
    base_price: f64,
    pack_quantity: f64,
    markup_percentage: f64,
) -> Result<entities::material::Model> {
    material::add_material(
        db,
        MaterialInput {
            category: category.map(ToString::to_string),
            pack_quantity,
            markup_percentage,
            ..MaterialInput::new(name, "item", base_price)
        },
    )
    .await
}

/// Creates a database holding one student ("Test Student") and one material
/// from [`create_test_material`].
pub async fn setup_with_student_and_material() -> Result<(
    DatabaseConnection,
    entities::student::Model,
    entities::material::Model,
)> {
    let db = setup_test_db().await?;
    let student = create_test_student(&db, "Test Student").await?;
    let material = create_test_material(&db, "Silver Ear Hooks").await?;
    Ok((db, student, material))
}

/// Records a purchase with no project, dated now.
pub async fn create_test_purchase(
    db: &DatabaseConnection,
    student_id: i64,
    material_id: i64,
    quantity: f64,
) -> Result<entities::purchase::Model> {
    purchase::add_purchase(db, PurchaseInput::new(student_id, material_id, quantity)).await
}

/// Records a cash payment dated now.
pub async fn create_test_payment(
    db: &DatabaseConnection,
    student_id: i64,
    amount: f64,
) -> Result<entities::payment::Model> {
    payment::add_payment(db, PaymentInput::new(student_id, amount).by("Cash")).await
}
