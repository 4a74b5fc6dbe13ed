//! Unified error types for the workshop ledger.
//!
//! Errors fall into four families (see [`ErrorKind`]) so callers can tell a
//! missing record apart from bad input or a storage failure.

use thiserror::Error;

/// Broad classification of an [`Error`], for callers that only need to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced record does not exist
    NotFound,
    /// Input was rejected before anything was written
    Validation,
    /// The underlying storage operation failed
    Persistence,
    /// Settings could not be loaded
    Config,
}

/// Every failure the ledger can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A required field was missing or malformed
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// A price or payment amount was negative, zero where not allowed, or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A purchase or pack quantity was not strictly positive
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: f64,
    },

    /// No student with this id
    #[error("Student not found: {id}")]
    StudentNotFound {
        /// Requested student id
        id: i64,
    },

    /// No material with this id
    #[error("Material not found: {id}")]
    MaterialNotFound {
        /// Requested material id
        id: i64,
    },

    /// No project with this id
    #[error("Project not found: {id}")]
    ProjectNotFound {
        /// Requested project id
        id: i64,
    },

    /// No purchase with this id
    #[error("Purchase not found: {id}")]
    PurchaseNotFound {
        /// Requested purchase id
        id: i64,
    },

    /// No payment with this id
    #[error("Payment not found: {id}")]
    PaymentNotFound {
        /// Requested payment id
        id: i64,
    },

    /// The material still backs purchase history and cannot be deleted
    #[error("Material {id} is used by {purchases} purchase(s); deactivate it instead")]
    MaterialInUse {
        /// Material id
        id: i64,
        /// Number of purchases referencing it
        purchases: u64,
    },

    /// Storage failure; any open transaction has been rolled back
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::StudentNotFound { .. }
            | Self::MaterialNotFound { .. }
            | Self::ProjectNotFound { .. }
            | Self::PurchaseNotFound { .. }
            | Self::PaymentNotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. }
            | Self::InvalidAmount { .. }
            | Self::InvalidQuantity { .. }
            | Self::MaterialInUse { .. } => ErrorKind::Validation,
            Self::Database(_) | Self::Io(_) => ErrorKind::Persistence,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// True for the not-found family.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound)
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::StudentNotFound { id: 1 }.kind(), ErrorKind::NotFound);
        assert_eq!(Error::InvalidAmount { amount: -1.0 }.kind(), ErrorKind::Validation);
        assert_eq!(
            Error::MaterialInUse { id: 1, purchases: 2 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::Database(sea_orm::DbErr::Custom("boom".to_string())).kind(),
            ErrorKind::Persistence
        );
        assert!(Error::PaymentNotFound { id: 9 }.is_not_found());
        assert!(!Error::Config { message: String::new() }.is_not_found());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::MaterialNotFound { id: 7 }.to_string(),
            "Material not found: 7"
        );
        assert_eq!(
            Error::MaterialInUse { id: 3, purchases: 4 }.to_string(),
            "Material 3 is used by 4 purchase(s); deactivate it instead"
        );
    }
}
