use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{line_amount, Cents, ValidationErrors, VendorId};

pub type PurchaseId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseStatus {
    Paid,
    Unpaid,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Paid => "Paid",
            PurchaseStatus::Unpaid => "Unpaid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "paid" => Some(PurchaseStatus::Paid),
            "unpaid" => Some(PurchaseStatus::Unpaid),
            _ => None,
        }
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Goods bought from a vendor. `total_amount` is always quantity x rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub vendor_id: VendorId,
    pub item: String,
    pub quantity: f64,
    pub rate: Cents,
    pub total_amount: Cents,
    pub status: PurchaseStatus,
    /// `None` when the stored date could not be read
    pub date: Option<DateTime<Utc>>,
}

impl Purchase {
    pub fn new(
        vendor_id: VendorId,
        item: impl Into<String>,
        quantity: f64,
        rate: Cents,
        status: PurchaseStatus,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vendor_id,
            item: item.into(),
            quantity,
            rate,
            total_amount: line_amount(quantity, rate),
            status,
            date: Some(date),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.item.trim().is_empty() {
            errors.push("item", "item name is required");
        }
        if !(self.quantity > 0.0) {
            errors.push("quantity", "quantity must be positive");
        }
        if self.rate < 0 {
            errors.push("rate", "rate cannot be negative");
        }
        errors.into_result()
    }
}
