//! Student balances derived from purchases and payments.
//!
//! Nothing is cached: every call sums the current rows.

use crate::{
    core::student::get_student,
    entities::{Payment, Purchase, Student, payment, purchase, student},
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, prelude::*, sea_query::Expr};
use std::collections::HashMap;
use std::fmt;

/// Sign of a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceStatus {
    /// Paid more than purchased
    Credit,
    /// Purchased more than paid
    Debt,
    /// Paid exactly what was purchased
    Settled,
}

impl BalanceStatus {
    /// Status for a payments-minus-purchases balance.
    #[must_use]
    pub fn from_balance(balance: f64) -> Self {
        if balance > 0.0 {
            Self::Credit
        } else if balance < 0.0 {
            Self::Debt
        } else {
            Self::Settled
        }
    }
}

impl fmt::Display for BalanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Credit => "credit",
            Self::Debt => "debt",
            Self::Settled => "settled",
        })
    }
}

/// A student's financial position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentBalance {
    /// Sum of purchase costs
    pub total_purchases: f64,
    /// Sum of payments
    pub total_payments: f64,
    /// Payments minus purchases; negative is owed to the workshop
    pub balance: f64,
    /// Sign of `balance`
    pub status: BalanceStatus,
}

impl StudentBalance {
    /// Derives the balance and status from the two totals.
    #[must_use]
    pub fn new(total_purchases: f64, total_payments: f64) -> Self {
        let balance = total_payments - total_purchases;
        Self {
            total_purchases,
            total_payments,
            balance,
            status: BalanceStatus::from_balance(balance),
        }
    }
}

/// One student's balance with the fields the balance list displays.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentBalanceRow {
    /// Student id
    pub student_id: i64,
    /// Student name
    pub student_name: String,
    /// Class the student attends, if any
    pub class_name: Option<String>,
    /// Whether the account is a sales channel rather than a person
    pub is_sales_channel: bool,
    /// Purchase and payment totals
    pub totals: StudentBalance,
}

/// Outstanding money across all students.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BalanceOverview {
    /// Sum owed by students in debt, as a positive number
    pub total_debt: f64,
    /// Sum held for students in credit
    pub total_credit: f64,
}

/// Computes one student's balance. A student with no rows is settled.
pub async fn get_student_balance(db: &DatabaseConnection, student_id: i64) -> Result<StudentBalance> {
    get_student(db, student_id).await?;

    let total_purchases: Option<f64> = Purchase::find()
        .select_only()
        .column_as(Expr::col(purchase::Column::TotalCost).sum(), "total")
        .filter(purchase::Column::StudentId.eq(student_id))
        .into_tuple::<Option<f64>>()
        .one(db)
        .await?
        .flatten();
    let total_payments: Option<f64> = Payment::find()
        .select_only()
        .column_as(Expr::col(payment::Column::Amount).sum(), "total")
        .filter(payment::Column::StudentId.eq(student_id))
        .into_tuple::<Option<f64>>()
        .one(db)
        .await?
        .flatten();

    Ok(StudentBalance::new(
        total_purchases.unwrap_or(0.0),
        total_payments.unwrap_or(0.0),
    ))
}

/// Sums `value_col` per student over the rows of `E`.
async fn totals_by_student<E, C>(
    db: &DatabaseConnection,
    student_col: C,
    value_col: C,
) -> Result<HashMap<i64, f64>>
where
    E: EntityTrait<Column = C>,
    C: ColumnTrait + Copy,
{
    let rows: Vec<(i64, Option<f64>)> = E::find()
        .select_only()
        .column(student_col)
        .column_as(Expr::col(value_col).sum(), "total")
        .group_by(student_col)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(id, total)| (id, total.unwrap_or(0.0)))
        .collect())
}

/// Balances for every student, ordered by name.
pub async fn get_all_student_balances(db: &DatabaseConnection) -> Result<Vec<StudentBalanceRow>> {
    let students = Student::find()
        .order_by_asc(student::Column::Name)
        .order_by_asc(student::Column::Id)
        .all(db)
        .await?;
    let purchases = totals_by_student::<Purchase, _>(
        db,
        purchase::Column::StudentId,
        purchase::Column::TotalCost,
    )
    .await?;
    let payments =
        totals_by_student::<Payment, _>(db, payment::Column::StudentId, payment::Column::Amount)
            .await?;

    Ok(students
        .into_iter()
        .map(|student| {
            let totals = StudentBalance::new(
                purchases.get(&student.id).copied().unwrap_or(0.0),
                payments.get(&student.id).copied().unwrap_or(0.0),
            );
            StudentBalanceRow {
                student_id: student.id,
                student_name: student.name,
                class_name: student.class_name,
                is_sales_channel: student.is_sales_channel,
                totals,
            }
        })
        .collect())
}

/// Splits balances into total debt and total credit.
#[must_use]
pub fn summarize_balances(rows: &[StudentBalanceRow]) -> BalanceOverview {
    rows.iter()
        .fold(BalanceOverview::default(), |mut overview, row| {
            match row.totals.status {
                BalanceStatus::Debt => overview.total_debt -= row.totals.balance,
                BalanceStatus::Credit => overview.total_credit += row.totals.balance,
                BalanceStatus::Settled => {}
            }
            overview
        })
}
