//! Core business logic - framework-agnostic operations on the workshop ledger.
//!
//! Every operation takes the database connection explicitly; there is no global store.

/// Student balances derived from purchases and payments
pub mod balance;
/// Material catalogue with supplier pricing
pub mod material;
/// Custom display order for class names and material categories
pub mod ordering;
/// Payments received from students
pub mod payment;
/// Unit-price calculation from a material's pricing attributes
pub mod pricing;
/// External supplier and spot price collaborators
pub mod price_source;
/// Projects and their derived participants and material usage
pub mod project;
/// Material purchases charged to students
pub mod purchase;
/// Dashboard summaries and currency formatting
pub mod report;
/// Student records
pub mod student;
/// Shared input checks
pub mod validation;
