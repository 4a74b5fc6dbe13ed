//! Payment business logic.

use crate::{
    core::{
        student::get_student,
        validation::{optional_text, require_positive_amount},
    },
    entities::{Payment, payment, student},
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{FromQueryResult, JoinType, QueryOrder, QuerySelect, Set, prelude::*};
use tracing::{debug, info, instrument};

/// Fields for recording or editing a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInput {
    /// Student credited with the payment
    pub student_id: i64,
    /// Amount paid, must be positive
    pub amount: f64,
    /// Defaults to now when adding, and to the existing date when editing
    pub payment_date: Option<NaiveDateTime>,
    /// Free text, usually Cash, Card, Bank Transfer or Other
    pub payment_method: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl PaymentInput {
    /// A payment with no method, dated when recorded.
    #[must_use]
    pub const fn new(student_id: i64, amount: f64) -> Self {
        Self {
            student_id,
            amount,
            payment_date: None,
            payment_method: None,
            notes: None,
        }
    }

    /// Sets the payment method.
    #[must_use]
    pub fn by(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }
}

/// Narrows [`get_all_payments`]. Date bounds are inclusive local calendar days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    /// First day included
    pub start_date: Option<NaiveDate>,
    /// Last day included
    pub end_date: Option<NaiveDate>,
    /// Only this student's payments
    pub student_id: Option<i64>,
}

/// A payment joined with the paying student's name and class.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct PaymentDetail {
    /// Payment id
    pub id: i64,
    /// Paying student
    pub student_id: i64,
    /// Student name
    pub student_name: String,
    /// Class the student attends, if any
    pub class_name: Option<String>,
    /// Whether the payer is a sales channel
    pub is_sales_channel: bool,
    /// Amount paid
    pub amount: f64,
    /// When the payment was made
    pub payment_date: NaiveDateTime,
    /// How it was paid
    pub payment_method: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Totals over a list of payments.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PaymentSummary {
    /// Number of payments
    pub count: usize,
    /// Sum of all payments
    pub total: f64,
    /// Sum paid in cash
    pub cash: f64,
    /// Sum paid by card
    pub card: f64,
    /// Paid by real students
    pub classes: f64,
    /// Paid through sales channels
    pub sales_channels: f64,
}

/// Records a payment.
#[instrument(skip(db, input), fields(student_id = input.student_id))]
pub async fn add_payment(db: &DatabaseConnection, input: PaymentInput) -> Result<payment::Model> {
    let amount = require_positive_amount(input.amount)?;
    get_student(db, input.student_id).await?;

    let payment = payment::ActiveModel {
        student_id: Set(input.student_id),
        amount: Set(amount),
        payment_date: Set(input
            .payment_date
            .unwrap_or_else(|| chrono::Local::now().naive_local())),
        payment_method: Set(optional_text(input.payment_method)),
        notes: Set(optional_text(input.notes)),
        ..Default::default()
    };
    let payment = payment.insert(db).await?;
    info!(payment_id = payment.id, amount, "Recorded payment");
    Ok(payment)
}

/// Retrieves a payment by ID.
pub async fn get_payment_by_id(
    db: &DatabaseConnection,
    payment_id: i64,
) -> Result<Option<payment::Model>> {
    Payment::find_by_id(payment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// A student's payments, newest first.
pub async fn get_student_payments(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<payment::Model>> {
    Payment::find()
        .filter(payment::Column::StudentId.eq(student_id))
        .order_by_desc(payment::Column::PaymentDate)
        .order_by_desc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Payments with student names, newest first, narrowed by `filter`.
pub async fn get_all_payments(
    db: &DatabaseConnection,
    filter: &PaymentFilter,
) -> Result<Vec<PaymentDetail>> {
    let mut query = Payment::find()
        .select_only()
        .column(payment::Column::Id)
        .column(payment::Column::StudentId)
        .column_as(student::Column::Name, "student_name")
        .column(student::Column::ClassName)
        .column(student::Column::IsSalesChannel)
        .column(payment::Column::Amount)
        .column(payment::Column::PaymentDate)
        .column(payment::Column::PaymentMethod)
        .column(payment::Column::Notes)
        .join(JoinType::InnerJoin, payment::Relation::Student.def());

    if let Some(start) = filter.start_date {
        query = query.filter(payment::Column::PaymentDate.gte(start.and_time(chrono::NaiveTime::MIN)));
    }
    if let Some(end) = filter.end_date.and_then(|end| end.succ_opt()) {
        query = query.filter(payment::Column::PaymentDate.lt(end.and_time(chrono::NaiveTime::MIN)));
    }
    if let Some(student_id) = filter.student_id {
        query = query.filter(payment::Column::StudentId.eq(student_id));
    }

    let payments = query
        .order_by_desc(payment::Column::PaymentDate)
        .order_by_desc(payment::Column::Id)
        .into_model::<PaymentDetail>()
        .all(db)
        .await?;
    debug!(count = payments.len(), ?filter, "Loaded payments");
    Ok(payments)
}

/// Replaces a payment's fields.
#[instrument(skip(db, input))]
pub async fn update_payment(
    db: &DatabaseConnection,
    payment_id: i64,
    input: PaymentInput,
) -> Result<payment::Model> {
    let amount = require_positive_amount(input.amount)?;
    let existing = get_payment_by_id(db, payment_id)
        .await?
        .ok_or(Error::PaymentNotFound { id: payment_id })?;
    get_student(db, input.student_id).await?;
    let payment_date = input.payment_date.unwrap_or(existing.payment_date);

    let mut payment: payment::ActiveModel = existing.into();
    payment.student_id = Set(input.student_id);
    payment.amount = Set(amount);
    payment.payment_date = Set(payment_date);
    payment.payment_method = Set(optional_text(input.payment_method));
    payment.notes = Set(optional_text(input.notes));
    payment.update(db).await.map_err(Into::into)
}

/// Deletes a payment.
#[instrument(skip(db))]
pub async fn delete_payment(db: &DatabaseConnection, payment_id: i64) -> Result<()> {
    let result = Payment::delete_by_id(payment_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::PaymentNotFound { id: payment_id });
    }
    info!(payment_id, "Deleted payment");
    Ok(())
}

fn method_is(payment: &PaymentDetail, method: &str) -> bool {
    payment
        .payment_method
        .as_deref()
        .is_some_and(|m| m.trim().eq_ignore_ascii_case(method))
}

/// Totals payments overall, by cash and card, and by class or sales channel.
#[must_use]
pub fn summarize_payments(payments: &[PaymentDetail]) -> PaymentSummary {
    payments
        .iter()
        .fold(PaymentSummary::default(), |mut summary, payment| {
            summary.count += 1;
            summary.total += payment.amount;
            if method_is(payment, "cash") {
                summary.cash += payment.amount;
            } else if method_is(payment, "card") {
                summary.card += payment.amount;
            }
            if payment.is_sales_channel {
                summary.sales_channels += payment.amount;
            } else {
                summary.classes += payment.amount;
            }
            summary
        })
}
