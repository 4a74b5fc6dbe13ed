//! Report generation business logic.
//!
//! This module builds the dashboard summary and formats money and balances for
//! display. Functions return structured data and leave layout to the caller.

use crate::{
    core::{
        balance::{BalanceStatus, StudentBalance, get_all_student_balances, summarize_balances},
        purchase::{PurchaseDetail, get_recent_purchases},
    },
    entities::{Material, Student, material},
    errors::Result,
};
use sea_orm::prelude::*;

/// Headline figures for the workshop dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    /// Number of students, sales channels included
    pub student_count: u64,
    /// Number of active materials
    pub material_count: u64,
    /// Total owed to the workshop
    pub total_debt: f64,
    /// Total held on account for students
    pub total_credit: f64,
    /// Students currently in debt
    pub students_in_debt: usize,
    /// Most recent purchases, newest first
    pub recent_purchases: Vec<PurchaseDetail>,
}

/// Generates the dashboard summary.
///
/// # Arguments
/// * `db` - Database connection
/// * `recent_limit` - Maximum number of recent purchases to include
pub async fn generate_dashboard(
    db: &DatabaseConnection,
    recent_limit: u64,
) -> Result<DashboardSummary> {
    let student_count = Student::find().count(db).await?;
    let material_count = Material::find()
        .filter(material::Column::IsActive.eq(true))
        .count(db)
        .await?;

    let balances = get_all_student_balances(db).await?;
    let overview = summarize_balances(&balances);
    let students_in_debt = balances
        .iter()
        .filter(|row| row.totals.status == BalanceStatus::Debt)
        .count();

    let recent_purchases = get_recent_purchases(db, recent_limit).await?;

    Ok(DashboardSummary {
        student_count,
        material_count,
        total_debt: overview.total_debt,
        total_credit: overview.total_credit,
        students_in_debt,
        recent_purchases,
    })
}

/// Formats an amount in pounds.
///
/// Amounts between zero and one penny, such as per-gram prices, get four
/// decimal places; everything else gets two.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    if amount > 0.0 && amount < 0.01 {
        format!("£{amount:.4}")
    } else {
        format!("£{amount:.2}")
    }
}

/// Describes a balance the way the student list shows it, e.g. "Owes £5.00".
#[must_use]
pub fn format_balance(balance: &StudentBalance) -> String {
    match balance.status {
        BalanceStatus::Debt => format!("Owes {}", format_currency(-balance.balance)),
        BalanceStatus::Credit => format!("In credit {}", format_currency(balance.balance)),
        BalanceStatus::Settled => "Settled".to_string(),
    }
}

/// One-line summary of a purchase.
#[must_use]
pub fn format_purchase_summary(purchase: &PurchaseDetail) -> String {
    format!(
        "{} | {} {} {} | {}",
        purchase.student_name,
        purchase.quantity,
        purchase.unit_type,
        purchase.material_name,
        format_currency(purchase.total_cost)
    )
}
