//! Purchase business logic.
//!
//! A purchase freezes the unit price computed at the time it is recorded.
//! Later changes to the material's price never touch existing purchases
//! unless the purchase itself is edited, which reprices it.

use crate::{
    core::{
        material::get_material,
        pricing::{PricingInputs, quote},
        project::require_project,
        student::get_student,
        validation::{optional_text, require_quantity},
    },
    entities::{Purchase, material, project, purchase, student},
    errors::{Error, Result},
};
use chrono::NaiveDateTime;
use sea_orm::{FromQueryResult, JoinType, QueryOrder, QuerySelect, Select, Set, prelude::*};
use tracing::{info, instrument};

/// Fields for recording or editing a purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseInput {
    /// Student charged for the purchase
    pub student_id: i64,
    /// Material bought
    pub material_id: i64,
    /// Project the material was bought for, if any
    pub project_id: Option<i64>,
    /// Units bought, must be positive
    pub quantity: f64,
    /// Defaults to now when adding, and to the existing date when editing
    pub purchase_date: Option<NaiveDateTime>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl PurchaseInput {
    /// A purchase with no project, dated when recorded.
    #[must_use]
    pub const fn new(student_id: i64, material_id: i64, quantity: f64) -> Self {
        Self {
            student_id,
            material_id,
            project_id: None,
            quantity,
            purchase_date: None,
            notes: None,
        }
    }
}

/// A purchase joined with the names it refers to, for display.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct PurchaseDetail {
    /// Purchase id
    pub id: i64,
    /// Student charged
    pub student_id: i64,
    /// Student name
    pub student_name: String,
    /// Material bought
    pub material_id: i64,
    /// Material name
    pub material_name: String,
    /// Unit the quantity is counted in
    pub unit_type: String,
    /// Material category
    pub category: Option<String>,
    /// Project, if any
    pub project_id: Option<i64>,
    /// Project name, if any
    pub project_name: Option<String>,
    /// Units bought
    pub quantity: f64,
    /// Price per unit frozen when recorded
    pub unit_price: f64,
    /// `quantity * unit_price`
    pub total_cost: f64,
    /// When the purchase was made
    pub purchase_date: NaiveDateTime,
    /// Free-form notes
    pub notes: Option<String>,
}

fn detail_query() -> Select<Purchase> {
    Purchase::find()
        .select_only()
        .column(purchase::Column::Id)
        .column(purchase::Column::StudentId)
        .column_as(student::Column::Name, "student_name")
        .column(purchase::Column::MaterialId)
        .column_as(material::Column::Name, "material_name")
        .column(material::Column::UnitType)
        .column(material::Column::Category)
        .column(purchase::Column::ProjectId)
        .column_as(project::Column::Name, "project_name")
        .column(purchase::Column::Quantity)
        .column(purchase::Column::UnitPrice)
        .column(purchase::Column::TotalCost)
        .column(purchase::Column::PurchaseDate)
        .column(purchase::Column::Notes)
        .join(JoinType::InnerJoin, purchase::Relation::Student.def())
        .join(JoinType::InnerJoin, purchase::Relation::Material.def())
        .join(JoinType::LeftJoin, purchase::Relation::Project.def())
        .order_by_desc(purchase::Column::PurchaseDate)
        .order_by_desc(purchase::Column::Id)
}

/// Checks the references of a purchase and prices it from the material as it is now.
async fn price_input<C>(db: &C, input: &PurchaseInput) -> Result<(f64, f64)>
where
    C: ConnectionTrait,
{
    let quantity = require_quantity(input.quantity)?;
    get_student(db, input.student_id).await?;
    let material = get_material(db, input.material_id).await?;
    if let Some(project_id) = input.project_id {
        require_project(db, project_id).await?;
    }

    let priced = quote(&PricingInputs::from(&material), quantity);
    Ok((priced.unit_price, priced.total_cost))
}

/// Records a purchase at the material's current price.
#[instrument(skip(db, input), fields(student_id = input.student_id, material_id = input.material_id))]
pub async fn add_purchase(db: &DatabaseConnection, input: PurchaseInput) -> Result<purchase::Model> {
    let (unit_price, total_cost) = price_input(db, &input).await?;

    let purchase = purchase::ActiveModel {
        student_id: Set(input.student_id),
        project_id: Set(input.project_id),
        material_id: Set(input.material_id),
        quantity: Set(input.quantity),
        unit_price: Set(unit_price),
        total_cost: Set(total_cost),
        purchase_date: Set(input
            .purchase_date
            .unwrap_or_else(|| chrono::Local::now().naive_local())),
        notes: Set(optional_text(input.notes)),
        ..Default::default()
    };
    let purchase = purchase.insert(db).await?;
    info!(purchase_id = purchase.id, total_cost, "Recorded purchase");
    Ok(purchase)
}

/// Retrieves a purchase by ID.
pub async fn get_purchase_by_id(
    db: &DatabaseConnection,
    purchase_id: i64,
) -> Result<Option<purchase::Model>> {
    Purchase::find_by_id(purchase_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// A student's purchases with display names, newest first.
pub async fn get_student_purchases(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<PurchaseDetail>> {
    detail_query()
        .filter(purchase::Column::StudentId.eq(student_id))
        .into_model::<PurchaseDetail>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every purchase with display names, newest first.
pub async fn get_all_purchases(db: &DatabaseConnection) -> Result<Vec<PurchaseDetail>> {
    detail_query()
        .into_model::<PurchaseDetail>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// The most recent purchases across all students.
pub async fn get_recent_purchases(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<PurchaseDetail>> {
    detail_query()
        .limit(limit)
        .into_model::<PurchaseDetail>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Replaces a purchase's fields and reprices it from the material's current price.
#[instrument(skip(db, input))]
pub async fn update_purchase(
    db: &DatabaseConnection,
    purchase_id: i64,
    input: PurchaseInput,
) -> Result<purchase::Model> {
    let existing = Purchase::find_by_id(purchase_id)
        .one(db)
        .await?
        .ok_or(Error::PurchaseNotFound { id: purchase_id })?;
    let (unit_price, total_cost) = price_input(db, &input).await?;
    let purchase_date = input.purchase_date.unwrap_or(existing.purchase_date);

    let mut purchase: purchase::ActiveModel = existing.into();
    purchase.student_id = Set(input.student_id);
    purchase.project_id = Set(input.project_id);
    purchase.material_id = Set(input.material_id);
    purchase.quantity = Set(input.quantity);
    purchase.unit_price = Set(unit_price);
    purchase.total_cost = Set(total_cost);
    purchase.purchase_date = Set(purchase_date);
    purchase.notes = Set(optional_text(input.notes));

    let purchase = purchase.update(db).await?;
    info!(purchase_id, total_cost, "Updated purchase");
    Ok(purchase)
}

/// Deletes a purchase.
#[instrument(skip(db))]
pub async fn delete_purchase(db: &DatabaseConnection, purchase_id: i64) -> Result<()> {
    let result = Purchase::delete_by_id(purchase_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::PurchaseNotFound { id: purchase_id });
    }
    info!(purchase_id, "Deleted purchase");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::material::update_material_price;
    use crate::core::project::add_project;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_add_purchase_prices_from_material() -> Result<()> {
        let (db, student, _) = setup_with_student_and_material().await?;
        // 25.00 for a pack of 50 with 10% markup
        let hooks = create_custom_material(&db, "Ear Hooks", None, 25.0, 50.0, 10.0).await?;

        let purchase = add_purchase(&db, PurchaseInput::new(student.id, hooks.id, 6.0)).await?;

        assert!((purchase.unit_price - 0.55).abs() < 1e-9);
        assert!((purchase.total_cost - 3.3).abs() < 1e-9);
        assert_eq!(purchase.quantity, 6.0);
        assert_eq!(purchase.project_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_price_frozen_after_material_change() -> Result<()> {
        let (db, student, _) = setup_with_student_and_material().await?;
        let wire = create_custom_material(&db, "Wire", None, 2.0, 1.0, 0.0).await?;
        let purchase = add_purchase(&db, PurchaseInput::new(student.id, wire.id, 3.0)).await?;

        update_material_price(&db, wire.id, 4.0, None).await?;

        let stored = get_purchase_by_id(&db, purchase.id).await?.unwrap();
        assert_eq!(stored.unit_price, 2.0);
        assert_eq!(stored.total_cost, 6.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_purchase_reprices() -> Result<()> {
        let (db, student, _) = setup_with_student_and_material().await?;
        let wire = create_custom_material(&db, "Wire", None, 2.0, 1.0, 0.0).await?;
        let purchase = add_purchase(&db, PurchaseInput::new(student.id, wire.id, 3.0)).await?;

        update_material_price(&db, wire.id, 4.0, None).await?;
        let updated =
            update_purchase(&db, purchase.id, PurchaseInput::new(student.id, wire.id, 2.0)).await?;

        assert_eq!(updated.unit_price, 4.0);
        assert_eq!(updated.total_cost, 8.0);
        assert_eq!(updated.purchase_date, purchase.purchase_date);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_purchase_missing_references() -> Result<()> {
        let (db, student, material) = setup_with_student_and_material().await?;

        let result = add_purchase(&db, PurchaseInput::new(999, material.id, 1.0)).await;
        assert!(matches!(result.unwrap_err(), Error::StudentNotFound { id: 999 }));

        let result = add_purchase(&db, PurchaseInput::new(student.id, 999, 1.0)).await;
        assert!(matches!(result.unwrap_err(), Error::MaterialNotFound { id: 999 }));

        let mut input = PurchaseInput::new(student.id, material.id, 1.0);
        input.project_id = Some(999);
        let result = add_purchase(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::ProjectNotFound { id: 999 }));

        let result = add_purchase(&db, PurchaseInput::new(student.id, material.id, 0.0)).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidQuantity { quantity: _ }));

        assert!(get_student_purchases(&db, student.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_details_join_names() -> Result<()> {
        let (db, student, material) = setup_with_student_and_material().await?;
        let project = add_project(&db, "Bangle", None).await?;

        let mut input = PurchaseInput::new(student.id, material.id, 1.0);
        input.purchase_date = Some(test_date(2024, 3, 1));
        add_purchase(&db, input).await?;

        let mut input = PurchaseInput::new(student.id, material.id, 2.0);
        input.project_id = Some(project.id);
        input.purchase_date = Some(test_date(2024, 3, 5));
        input.notes = Some("  for the clasp ".to_string());
        add_purchase(&db, input).await?;

        let details = get_student_purchases(&db, student.id).await?;
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].quantity, 2.0);
        assert_eq!(details[0].project_name.as_deref(), Some("Bangle"));
        assert_eq!(details[0].notes.as_deref(), Some("for the clasp"));
        assert_eq!(details[0].student_name, student.name);
        assert_eq!(details[0].material_name, material.name);
        assert_eq!(details[1].project_name, None);

        let recent = get_recent_purchases(&db, 1).await?;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, details[0].id);
        assert_eq!(get_all_purchases(&db).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_purchase() -> Result<()> {
        let (db, student, material) = setup_with_student_and_material().await?;
        let purchase = create_test_purchase(&db, student.id, material.id, 1.0).await?;

        delete_purchase(&db, purchase.id).await?;
        assert!(get_purchase_by_id(&db, purchase.id).await?.is_none());

        let result = delete_purchase(&db, purchase.id).await;
        assert!(matches!(result.unwrap_err(), Error::PurchaseNotFound { id: _ }));

        let result =
            update_purchase(&db, purchase.id, PurchaseInput::new(student.id, material.id, 1.0)).await;
        assert!(matches!(result.unwrap_err(), Error::PurchaseNotFound { id: _ }));
        Ok(())
    }
}
