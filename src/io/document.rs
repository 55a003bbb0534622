use std::fmt::Write as _;

use serde::Serialize;

use crate::domain::{amount_in_words, format_inr, Cents, ContactInfo, Customer, Sale};

/// Printable view of one invoice line
#[derive(Debug, Clone, Serialize)]
pub struct DocumentLine {
    pub name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub rate: Cents,
    pub amount: Cents,
    pub rate_display: String,
    pub amount_display: String,
}

/// A monetary figure alongside its formatted form
#[derive(Debug, Clone, Serialize)]
pub struct DocumentAmount {
    pub value: Cents,
    pub display: String,
}

impl From<Cents> for DocumentAmount {
    fn from(value: Cents) -> Self {
        Self {
            value,
            display: format_inr(value),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentParty {
    pub name: String,
    #[serde(flatten)]
    pub info: ContactInfo,
}

/// Self-contained invoice document: everything needed to print or
/// hand off an invoice, with amounts pre-formatted in rupees.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDocument {
    pub invoice_number: i64,
    pub date: Option<String>,
    pub customer: DocumentParty,
    pub items: Vec<DocumentLine>,
    pub subtotal: DocumentAmount,
    pub tax_rate_percent: f64,
    pub tax_amount: DocumentAmount,
    pub transport_charges: DocumentAmount,
    pub grand_total: DocumentAmount,
    pub paid_amount: DocumentAmount,
    pub balance_due: DocumentAmount,
    pub status: String,
    pub amount_in_words: String,
}

impl InvoiceDocument {
    pub fn new(sale: &Sale, customer: &Customer) -> Self {
        let items = sale
            .items
            .iter()
            .map(|item| DocumentLine {
                name: item.line.name.clone(),
                quantity: item.line.quantity(),
                unit: item.line.unit.clone(),
                rate: item.line.rate(),
                amount: item.line.amount(),
                rate_display: format_inr(item.line.rate()),
                amount_display: format_inr(item.line.amount()),
            })
            .collect();

        Self {
            invoice_number: sale.invoice_number,
            date: sale.created_at.map(|dt| dt.format("%d %b %Y").to_string()),
            customer: DocumentParty {
                name: customer.name.clone(),
                info: customer.info.clone(),
            },
            items,
            subtotal: sale.subtotal.into(),
            tax_rate_percent: sale.tax_rate_percent,
            tax_amount: sale.tax_amount.into(),
            transport_charges: sale.transport_charges.into(),
            grand_total: sale.total_amount.into(),
            paid_amount: sale.paid_amount.into(),
            balance_due: sale.balance_due().into(),
            status: sale.status.to_string(),
            amount_in_words: amount_in_words(sale.total_amount),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering for terminals and text files.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "-".repeat(72);

        let _ = writeln!(out, "INVOICE #{}", self.invoice_number);
        let _ = writeln!(out, "Date: {}", self.date.as_deref().unwrap_or("-"));
        let _ = writeln!(out);
        let _ = writeln!(out, "Bill to: {}", self.customer.name);
        for line in [
            self.customer.info.address.as_deref(),
            self.customer.info.contact.as_deref(),
            self.customer.info.email.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            let _ = writeln!(out, "         {}", line);
        }
        if let Some(tax_id) = &self.customer.info.tax_id {
            let _ = writeln!(out, "GSTIN:   {}", tax_id);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "{:<4} {:<26} {:>10} {:>12} {:>15}", "#", "Item", "Qty", "Rate", "Amount");
        let _ = writeln!(out, "{}", rule);
        for (i, item) in self.items.iter().enumerate() {
            let quantity = match &item.unit {
                Some(unit) => format!("{} {}", item.quantity, unit),
                None => item.quantity.to_string(),
            };
            let _ = writeln!(
                out,
                "{:<4} {:<26} {:>10} {:>12} {:>15}",
                i + 1,
                truncate(&item.name, 26),
                quantity,
                item.rate_display,
                item.amount_display
            );
        }
        let _ = writeln!(out, "{}", rule);

        let tax_label = format!("Tax ({}%)", self.tax_rate_percent);
        let rows = [
            ("Subtotal", &self.subtotal),
            (tax_label.as_str(), &self.tax_amount),
            ("Transport", &self.transport_charges),
            ("Grand total", &self.grand_total),
            ("Paid", &self.paid_amount),
            ("Balance due", &self.balance_due),
        ];
        for (label, amount) in rows {
            let _ = writeln!(out, "{:>54} {:>17}", label, amount.display);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Amount in words: {}", self.amount_in_words);
        let _ = writeln!(out, "Status: {}", self.status);
        out
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 3).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::{InvoiceDraft, LineItem};

    fn sample() -> (Sale, Customer) {
        let customer = Customer::new("Sharma Traders").with_info(ContactInfo {
            address: Some("12 MG Road, Pune".to_string()),
            tax_id: Some("27ABCDE1234F1Z5".to_string()),
            ..Default::default()
        });
        let draft = InvoiceDraft::new(Some(customer.id))
            .with_item(LineItem::new("Cement", 10.0, Some("bag".to_string()), 2_500))
            .with_item(LineItem::new("Sand", 1.0, None, 10_000))
            .with_tax_rate(18.0)
            .with_transport(2_000);
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        let mut sale = Sale::from_draft(customer.id, &draft, at);
        sale.invoice_number = 7;
        (sale, customer)
    }

    #[test]
    fn test_document_carries_formatted_totals() {
        let (sale, customer) = sample();
        let doc = InvoiceDocument::new(&sale, &customer);

        assert_eq!(doc.grand_total.value, 43_300);
        assert_eq!(doc.grand_total.display, "₹433.00");
        assert_eq!(doc.tax_amount.display, "₹63.00");
        assert_eq!(doc.amount_in_words, "Four Hundred Thirty Three Rupees Only");
        assert_eq!(doc.date.as_deref(), Some("05 Mar 2024"));
        assert_eq!(doc.items.len(), 2);
    }

    #[test]
    fn test_render_text_lists_items_and_words() {
        let (sale, customer) = sample();
        let text = InvoiceDocument::new(&sale, &customer).render_text();

        assert!(text.starts_with("INVOICE #7"));
        assert!(text.contains("Sharma Traders"));
        assert!(text.contains("GSTIN:   27ABCDE1234F1Z5"));
        assert!(text.contains("10 bag"));
        assert!(text.contains("Tax (18%)"));
        assert!(text.contains("Amount in words: Four Hundred Thirty Three Rupees Only"));
    }

    #[test]
    fn test_json_is_flat_for_contact_info() {
        let (sale, customer) = sample();
        let json = InvoiceDocument::new(&sale, &customer).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["customer"]["address"], "12 MG Road, Pune");
        assert_eq!(value["grand_total"]["value"], 43_300);
        assert_eq!(value["status"], sale.status.to_string());
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long item name", 10), "a very ...");
    }
}
