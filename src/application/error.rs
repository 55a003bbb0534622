use thiserror::Error;

use crate::domain::{Cents, DependentCounts, ValidationErrors};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Customer already exists: {0}")]
    CustomerAlreadyExists(String),

    #[error("Vendor not found: {0}")]
    VendorNotFound(String),

    #[error("Vendor already exists: {0}")]
    VendorAlreadyExists(String),

    #[error("Invoice not found: #{0}")]
    InvoiceNotFound(i64),

    #[error("{kind} not found: {id}")]
    RecordNotFound { kind: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Cannot delete {kind} '{name}': {counts} still reference it")]
    HasDependents {
        kind: &'static str,
        name: String,
        counts: DependentCounts,
    },

    #[error("Invoice #{invoice_number} belongs to a different customer than {customer}")]
    InvoiceCustomerMismatch {
        invoice_number: i64,
        customer: String,
    },

    #[error("Payment of {offered} exceeds the balance due on invoice #{invoice_number} ({due})")]
    PaymentExceedsBalance {
        invoice_number: i64,
        due: Cents,
        offered: Cents,
    },

    #[error("Session for tenant '{0}' has been signed out")]
    SessionClosed(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
