use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, CustomerId, SaleId, ValidationErrors, VendorId};

pub type PaymentId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Upi,
    BankTransfer,
    Cheque,
    Card,
    Other,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
            PaymentMode::BankTransfer => "bank_transfer",
            PaymentMode::Cheque => "cheque",
            PaymentMode::Card => "card",
            PaymentMode::Other => "other",
        }
    }

    /// Lenient parse; unknown modes fall back to `Other` rather than failing,
    /// since older rows carry free-text modes.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "cash" => PaymentMode::Cash,
            "upi" => PaymentMode::Upi,
            "bank_transfer" | "bank" | "neft" | "rtgs" | "imps" => PaymentMode::BankTransfer,
            "cheque" | "check" => PaymentMode::Cheque,
            "card" => PaymentMode::Card,
            _ => PaymentMode::Other,
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Money received from a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub customer_id: CustomerId,
    /// Invoice this payment settles, if any
    pub sale_id: Option<SaleId>,
    pub amount_paid: Cents,
    pub mode: PaymentMode,
    pub payment_date: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn new(customer_id: CustomerId, amount_paid: Cents, mode: PaymentMode, payment_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            sale_id: None,
            amount_paid,
            mode,
            payment_date: Some(payment_date),
        }
    }

    pub fn with_sale(mut self, sale_id: SaleId) -> Self {
        self.sale_id = Some(sale_id);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate_amount(self.amount_paid)
    }
}

/// Money paid out to a vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMade {
    pub id: PaymentId,
    pub vendor_id: VendorId,
    pub amount: Cents,
    pub mode: PaymentMode,
    pub date: Option<DateTime<Utc>>,
}

impl PaymentMade {
    pub fn new(vendor_id: VendorId, amount: Cents, mode: PaymentMode, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vendor_id,
            amount,
            mode,
            date: Some(date),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate_amount(self.amount)
    }
}

fn validate_amount(amount: Cents) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if amount <= 0 {
        errors.push("amount", "amount must be positive");
    }
    errors.into_result()
}
