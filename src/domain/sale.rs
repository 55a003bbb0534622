use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApportionedLine, Cents, CustomerId, InvoiceDraft, InvoiceTotals, LineItem};

pub type SaleId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Paid,
    Unpaid,
    Partial,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Paid => "paid",
            SaleStatus::Unpaid => "unpaid",
            SaleStatus::Partial => "partial",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "paid" => Some(SaleStatus::Paid),
            "unpaid" => Some(SaleStatus::Unpaid),
            "partial" => Some(SaleStatus::Partial),
            _ => None,
        }
    }

    /// Status implied by how much of the total has been collected.
    pub fn for_amounts(total: Cents, paid: Cents) -> Self {
        if paid <= 0 && total > 0 {
            SaleStatus::Unpaid
        } else if paid >= total {
            SaleStatus::Paid
        } else {
            SaleStatus::Partial
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted invoice line: the editable line plus its share of tax and transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    #[serde(flatten)]
    pub line: LineItem,
    pub tax_share: Cents,
    pub transport_share: Cents,
    pub total: Cents,
}

/// A sales invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    /// Human-facing number, assigned per tenant by the repository
    pub invoice_number: i64,
    pub customer_id: CustomerId,
    pub items: Vec<SaleItem>,
    pub subtotal: Cents,
    pub tax_rate_percent: f64,
    pub tax_amount: Cents,
    pub transport_charges: Cents,
    pub total_amount: Cents,
    pub status: SaleStatus,
    pub paid_amount: Cents,
    /// `None` when the stored timestamp could not be read
    pub created_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Build a sale from a validated draft. The invoice number is assigned on save.
    pub fn from_draft(customer_id: CustomerId, draft: &InvoiceDraft, created_at: DateTime<Utc>) -> Self {
        let totals = draft.totals();
        let items = draft
            .items
            .iter()
            .zip(draft.apportion())
            .map(|(line, ApportionedLine { tax_share, transport_share, total, .. })| SaleItem {
                line: line.clone(),
                tax_share,
                transport_share,
                total,
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            invoice_number: 0,
            customer_id,
            items,
            subtotal: totals.subtotal,
            tax_rate_percent: draft.tax_rate_percent,
            tax_amount: totals.tax_amount,
            transport_charges: totals.transport_charges,
            total_amount: totals.grand_total,
            status: SaleStatus::for_amounts(totals.grand_total, draft.paid_amount),
            paid_amount: draft.paid_amount,
            created_at: Some(created_at),
        }
    }

    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals {
            subtotal: self.subtotal,
            tax_amount: self.tax_amount,
            transport_charges: self.transport_charges,
            grand_total: self.total_amount,
        }
    }

    /// What is still owed on this invoice.
    pub fn balance_due(&self) -> Cents {
        (self.total_amount - self.paid_amount).max(0)
    }

    /// Record a payment against this invoice, moving its status along.
    /// Returns the portion that was applied; anything beyond the balance due
    /// is not applied to the invoice.
    pub fn apply_payment(&mut self, amount: Cents) -> Cents {
        let applied = amount.clamp(0, self.balance_due());
        self.paid_amount += applied;
        self.status = SaleStatus::for_amounts(self.total_amount, self.paid_amount);
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sale(paid: Cents) -> Sale {
        let customer = Uuid::new_v4();
        let draft = InvoiceDraft::new(Some(customer))
            .with_item(LineItem::new("Cement", 3.0, None, 10000))
            .with_item(LineItem::new("Sand", 1.0, None, 5000))
            .with_tax_rate(18.0)
            .with_transport(2000)
            .with_paid_amount(paid);
        Sale::from_draft(customer, &draft, Utc::now())
    }

    #[test]
    fn test_sale_from_draft() {
        let sale = sample_sale(0);
        assert_eq!(sale.total_amount, 43300);
        assert_eq!(sale.status, SaleStatus::Unpaid);
        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.items.iter().map(|i| i.total).sum::<Cents>(), sale.total_amount);
    }

    #[test]
    fn test_initial_payment_sets_status() {
        assert_eq!(sample_sale(10000).status, SaleStatus::Partial);
        assert_eq!(sample_sale(43300).status, SaleStatus::Paid);
    }

    #[test]
    fn test_apply_payment_progression() {
        let mut sale = sample_sale(0);

        assert_eq!(sale.apply_payment(20000), 20000);
        assert_eq!(sale.status, SaleStatus::Partial);
        assert_eq!(sale.balance_due(), 23300);

        // Overpayment is capped at the balance due
        assert_eq!(sale.apply_payment(30000), 23300);
        assert_eq!(sale.status, SaleStatus::Paid);
        assert_eq!(sale.paid_amount, sale.total_amount);
        assert_eq!(sale.balance_due(), 0);
    }

    #[test]
    fn test_status_for_amounts() {
        assert_eq!(SaleStatus::for_amounts(1000, 0), SaleStatus::Unpaid);
        assert_eq!(SaleStatus::for_amounts(1000, 1), SaleStatus::Partial);
        assert_eq!(SaleStatus::for_amounts(1000, 1000), SaleStatus::Paid);
        // A zero-value invoice has nothing to collect
        assert_eq!(SaleStatus::for_amounts(0, 0), SaleStatus::Paid);
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [SaleStatus::Paid, SaleStatus::Unpaid, SaleStatus::Partial] {
            assert_eq!(SaleStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(SaleStatus::from_str("Paid"), Some(SaleStatus::Paid));
    }
}
