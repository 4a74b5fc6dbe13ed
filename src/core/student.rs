//! Student business logic - Handles all student-related operations.
//!
//! Students are the accounts purchases are charged to and payments are credited to.
//! Deleting a student removes their purchases and payments in the same transaction.

use crate::{
    core::validation::{optional_text, require_text},
    entities::{Payment, Purchase, Student, payment, purchase, student},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Fields supplied when adding or updating a student.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentInput {
    /// Display name (required)
    pub name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Class grouping label
    pub class_name: Option<String>,
    /// Marks a sales outlet rather than a person
    pub is_sales_channel: bool,
}

impl StudentInput {
    /// A student with just a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the class label.
    #[must_use]
    pub fn in_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }
}

/// Retrieves all students ordered alphabetically by name.
pub async fn get_all_students(db: &DatabaseConnection) -> Result<Vec<student::Model>> {
    Student::find()
        .order_by_asc(student::Column::Name)
        .order_by_asc(student::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific student by ID, None if it does not exist.
pub async fn get_student_by_id<C>(db: &C, student_id: i64) -> Result<Option<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find_by_id(student_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_student_by_id`] but a missing student is an error.
pub async fn get_student<C>(db: &C, student_id: i64) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    get_student_by_id(db, student_id)
        .await?
        .ok_or(Error::StudentNotFound { id: student_id })
}

/// Creates a new student.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The database insert operation fails
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn add_student(db: &DatabaseConnection, input: StudentInput) -> Result<student::Model> {
    let name = require_text("Student name", &input.name)?;

    let student = student::ActiveModel {
        name: Set(name),
        email: Set(optional_text(input.email)),
        phone: Set(optional_text(input.phone)),
        notes: Set(optional_text(input.notes)),
        class_name: Set(optional_text(input.class_name)),
        is_sales_channel: Set(input.is_sales_channel),
        created_at: Set(chrono::Local::now().naive_local()),
        ..Default::default()
    };
    let student = student.insert(db).await?;
    info!(student_id = student.id, "Added student");
    Ok(student)
}

/// Replaces a student's details.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The student does not exist
/// - The database update operation fails
#[instrument(skip(db, input))]
pub async fn update_student(
    db: &DatabaseConnection,
    student_id: i64,
    input: StudentInput,
) -> Result<student::Model> {
    let name = require_text("Student name", &input.name)?;

    let mut student: student::ActiveModel = get_student(db, student_id).await?.into();
    student.name = Set(name);
    student.email = Set(optional_text(input.email));
    student.phone = Set(optional_text(input.phone));
    student.notes = Set(optional_text(input.notes));
    student.class_name = Set(optional_text(input.class_name));
    student.is_sales_channel = Set(input.is_sales_channel);

    student.update(db).await.map_err(Into::into)
}

/// Deletes a student together with all of their purchases and payments.
///
/// The three deletes share one transaction: either all of them happen or none do.
///
/// # Errors
/// Returns an error if the student does not exist or any delete fails.
#[instrument(skip(db))]
pub async fn delete_student(db: &DatabaseConnection, student_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    get_student(&txn, student_id).await?;

    let purchases = Purchase::delete_many()
        .filter(purchase::Column::StudentId.eq(student_id))
        .exec(&txn)
        .await?;
    let payments = Payment::delete_many()
        .filter(payment::Column::StudentId.eq(student_id))
        .exec(&txn)
        .await?;
    Student::delete_by_id(student_id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        student_id,
        purchases = purchases.rows_affected,
        payments = payments.rows_affected,
        "Deleted student"
    );
    Ok(())
}
