use serde::{Deserialize, Serialize};

use super::{Cents, CustomerId};

/// One invoice row. The amount is derived from quantity and rate and is
/// recomputed on every edit; it has no setter of its own. Deserializing
/// goes through `LineItem::new`, so a stored amount is never trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LineItemFields")]
pub struct LineItem {
    pub name: String,
    quantity: f64,
    pub unit: Option<String>,
    rate: Cents,
    amount: Cents,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: f64, unit: Option<String>, rate: Cents) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit,
            rate,
            amount: line_amount(quantity, rate),
        }
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn rate(&self) -> Cents {
        self.rate
    }

    pub fn amount(&self) -> Cents {
        self.amount
    }

    pub fn set_quantity(&mut self, quantity: f64) {
        self.quantity = quantity;
        self.amount = line_amount(self.quantity, self.rate);
    }

    pub fn set_rate(&mut self, rate: Cents) {
        self.rate = rate;
        self.amount = line_amount(self.quantity, self.rate);
    }
}

#[derive(Deserialize)]
struct LineItemFields {
    name: String,
    quantity: f64,
    #[serde(default)]
    unit: Option<String>,
    rate: Cents,
}

impl From<LineItemFields> for LineItem {
    fn from(fields: LineItemFields) -> Self {
        LineItem::new(fields.name, fields.quantity, fields.unit, fields.rate)
    }
}

/// quantity x rate, rounded to the nearest paisa.
pub fn line_amount(quantity: f64, rate: Cents) -> Cents {
    let amount = quantity * rate as f64;
    if amount.is_finite() {
        amount.round() as Cents
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: Cents,
    pub tax_amount: Cents,
    pub transport_charges: Cents,
    pub grand_total: Cents,
}

/// subtotal = sum of line amounts, tax = subtotal x rate / 100 (rounded),
/// grand total = subtotal + tax + transport.
pub fn compute_totals(items: &[LineItem], tax_rate_percent: f64, transport_charges: Cents) -> InvoiceTotals {
    let subtotal: Cents = items.iter().map(LineItem::amount).sum();
    let tax_amount = tax_on(subtotal, tax_rate_percent);
    InvoiceTotals {
        subtotal,
        tax_amount,
        transport_charges,
        grand_total: subtotal + tax_amount + transport_charges,
    }
}

fn tax_on(subtotal: Cents, tax_rate_percent: f64) -> Cents {
    let tax = subtotal as f64 * tax_rate_percent / 100.0;
    if tax.is_finite() { tax.round() as Cents } else { 0 }
}

/// Per-line share of tax and transport when an invoice is stored line by line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApportionedLine {
    pub amount: Cents,
    pub tax_share: Cents,
    pub transport_share: Cents,
    pub total: Cents,
}

/// An invoice being composed, before it is persisted as a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub customer_id: Option<CustomerId>,
    pub items: Vec<LineItem>,
    pub tax_rate_percent: f64,
    pub transport_charges: Cents,
    /// Amount collected at the time of sale
    pub paid_amount: Cents,
}

impl InvoiceDraft {
    pub fn new(customer_id: Option<CustomerId>) -> Self {
        Self {
            customer_id,
            items: Vec::new(),
            tax_rate_percent: 0.0,
            transport_charges: 0,
            paid_amount: 0,
        }
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_tax_rate(mut self, percent: f64) -> Self {
        self.tax_rate_percent = percent;
        self
    }

    pub fn with_transport(mut self, charges: Cents) -> Self {
        self.transport_charges = charges;
        self
    }

    pub fn with_paid_amount(mut self, paid: Cents) -> Self {
        self.paid_amount = paid;
        self
    }

    pub fn totals(&self) -> InvoiceTotals {
        compute_totals(&self.items, self.tax_rate_percent, self.transport_charges)
    }

    /// Split tax and transport across lines in proportion to line amount.
    /// The last line absorbs the rounding remainder, so line totals always
    /// add up to the grand total.
    pub fn apportion(&self) -> Vec<ApportionedLine> {
        let totals = self.totals();
        let count = self.items.len();
        let mut tax_left = totals.tax_amount;
        let mut transport_left = totals.transport_charges;

        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let (tax_share, transport_share) = if idx + 1 == count {
                    (tax_left, transport_left)
                } else {
                    (
                        share(item.amount(), totals.subtotal, totals.tax_amount),
                        share(item.amount(), totals.subtotal, totals.transport_charges),
                    )
                };
                tax_left -= tax_share;
                transport_left -= transport_share;
                ApportionedLine {
                    amount: item.amount(),
                    tax_share,
                    transport_share,
                    total: item.amount() + tax_share + transport_share,
                }
            })
            .collect()
    }

    /// Check every field and report all problems at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.customer_id.is_none() {
            errors.push("customer", "select a customer");
        }
        if self.items.is_empty() {
            errors.push("items", "add at least one line item");
        }
        for (idx, item) in self.items.iter().enumerate() {
            if item.name.trim().is_empty() {
                errors.push(format!("items[{}].name", idx), "item name is required");
            }
            // NaN fails this comparison too
            if !(item.quantity() > 0.0) {
                errors.push(format!("items[{}].quantity", idx), "quantity must be positive");
            }
            if item.rate() < 0 {
                errors.push(format!("items[{}].rate", idx), "rate cannot be negative");
            }
        }
        if !(self.tax_rate_percent >= 0.0) {
            errors.push("tax_rate", "tax rate cannot be negative");
        }
        if self.transport_charges < 0 {
            errors.push("transport_charges", "transport charges cannot be negative");
        }
        if self.paid_amount < 0 {
            errors.push("paid_amount", "paid amount cannot be negative");
        } else if errors.is_empty() && self.paid_amount > self.totals().grand_total {
            errors.push("paid_amount", "paid amount exceeds the invoice total");
        }

        errors.into_result()
    }
}

fn share(part: Cents, whole: Cents, pool: Cents) -> Cents {
    if whole == 0 {
        return 0;
    }
    ((part as i128 * pool as i128) / whole as i128) as Cents
}

/// A single field-level problem, keyed by the form field it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn two_line_draft() -> InvoiceDraft {
        InvoiceDraft::new(Some(Uuid::new_v4()))
            .with_item(LineItem::new("Cement", 3.0, Some("bag".into()), 10000))
            .with_item(LineItem::new("Sand", 1.0, Some("ton".into()), 5000))
            .with_tax_rate(18.0)
            .with_transport(2000)
    }

    #[test]
    fn test_two_line_invoice_totals() {
        let totals = two_line_draft().totals();
        assert_eq!(totals.subtotal, 35000);
        assert_eq!(totals.tax_amount, 6300);
        assert_eq!(totals.transport_charges, 2000);
        assert_eq!(totals.grand_total, 43300);
    }

    #[test]
    fn test_line_amount_follows_edits() {
        let mut item = LineItem::new("Bricks", 2.0, None, 1250);
        assert_eq!(item.amount(), 2500);

        let edits: [(f64, Cents); 4] = [(5.0, 1250), (5.0, 999), (0.5, 999), (12.25, 400)];
        for (quantity, rate) in edits {
            item.set_quantity(quantity);
            assert_eq!(item.amount(), line_amount(quantity, item.rate()));
            item.set_rate(rate);
            assert_eq!(item.amount(), line_amount(quantity, rate));
        }
        assert_eq!(item.amount(), 4900);
    }

    #[test]
    fn test_deserialized_line_recomputes_amount() {
        let json = r#"{"name":"Tiles","quantity":4.0,"unit":"box","rate":1500,"amount":999999}"#;
        let item: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.amount(), 6000);
        assert_eq!(item.unit.as_deref(), Some("box"));

        let round_trip: LineItem = serde_json::from_str(&serde_json::to_string(&item).unwrap()).unwrap();
        assert_eq!(round_trip, item);
    }

    #[test]
    fn test_tax_is_rounded_to_paise() {
        let draft = InvoiceDraft::new(Some(Uuid::new_v4()))
            .with_item(LineItem::new("Widget", 1.0, None, 333))
            .with_tax_rate(5.0);
        let totals = draft.totals();
        // 333 * 5% = 16.65 paise
        assert_eq!(totals.tax_amount, 17);
        assert_eq!(
            totals.grand_total,
            totals.subtotal + totals.tax_amount + totals.transport_charges
        );
    }

    #[test]
    fn test_apportioned_lines_sum_to_grand_total() {
        let draft = InvoiceDraft::new(Some(Uuid::new_v4()))
            .with_item(LineItem::new("A", 1.0, None, 3333))
            .with_item(LineItem::new("B", 1.0, None, 3333))
            .with_item(LineItem::new("C", 1.0, None, 3334))
            .with_tax_rate(12.0)
            .with_transport(1001);
        let lines = draft.apportion();
        let totals = draft.totals();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().map(|l| l.total).sum::<Cents>(), totals.grand_total);
        assert_eq!(lines.iter().map(|l| l.tax_share).sum::<Cents>(), totals.tax_amount);
        assert_eq!(
            lines.iter().map(|l| l.transport_share).sum::<Cents>(),
            totals.transport_charges
        );
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(two_line_draft().validate().is_ok());
    }

    #[test]
    fn test_validation_collects_every_error() {
        let draft = InvoiceDraft::new(None)
            .with_item(LineItem::new("  ", 0.0, None, -5))
            .with_tax_rate(-1.0)
            .with_transport(-10);
        let errors = draft.validate().unwrap_err();

        assert!(errors.has_field("customer"));
        assert!(errors.has_field("items[0].name"));
        assert!(errors.has_field("items[0].quantity"));
        assert!(errors.has_field("items[0].rate"));
        assert!(errors.has_field("tax_rate"));
        assert!(errors.has_field("transport_charges"));
    }

    #[test]
    fn test_validation_requires_items() {
        let errors = InvoiceDraft::new(Some(Uuid::new_v4())).validate().unwrap_err();
        assert!(errors.has_field("items"));
    }

    #[test]
    fn test_overpayment_rejected() {
        let draft = two_line_draft().with_paid_amount(50000);
        let errors = draft.validate().unwrap_err();
        assert!(errors.has_field("paid_amount"));
    }
}
