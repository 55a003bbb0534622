use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::io::Read;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::{BooksSnapshot, LedgerService, Session};
use crate::domain::{
    coerce_cents_str, parse_timestamp, Cents, ContactInfo, Customer, LineItem, Payment, PaymentMade,
    PaymentMode, Purchase, PurchaseStatus, Sale, SaleItem, SaleStatus, Vendor,
};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Parse and count only; nothing is written
    pub dry_run: bool,
}

/// Importer for loading a JSON snapshot into the books
pub struct Importer<'a> {
    service: &'a LedgerService,
    session: &'a Session,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a LedgerService, session: &'a Session) -> Self {
        Self { service, session }
    }

    /// Import a snapshot produced by `export --format json`, or any JSON
    /// of the same shape. Amounts and dates are read leniently.
    pub async fn import_full_json<R: Read>(&self, reader: R, options: ImportOptions) -> Result<ImportResult> {
        let books = parse_books(reader)?;

        if options.dry_run {
            let total = books.customers.len()
                + books.vendors.len()
                + books.sales.len()
                + books.purchases.len()
                + books.payments.len()
                + books.payments_made.len();
            debug!(records = total, "dry run, nothing written");
            return Ok(ImportResult {
                imported: total,
                ..Default::default()
            });
        }

        let summary = self.service.restore_books(self.session, books).await?;
        Ok(ImportResult {
            imported: summary.imported,
            skipped: summary.skipped,
            errors: summary.errors,
        })
    }
}

/// Read a snapshot into domain records. Amount fields may be integers
/// (paise), decimal strings in rupees ("1,200.50", "₹99"), or missing;
/// anything unreadable counts as zero. Unreadable dates become unknown.
pub fn parse_books<R: Read>(reader: R) -> Result<BooksSnapshot> {
    let raw: RawBooks = serde_json::from_reader(reader).context("Failed to parse snapshot JSON")?;

    Ok(BooksSnapshot {
        customers: raw.customers.into_iter().map(RawCounterparty::into_customer).collect(),
        vendors: raw.vendors.into_iter().map(RawCounterparty::into_vendor).collect(),
        sales: raw.sales.into_iter().map(RawSale::into_sale).collect(),
        purchases: raw.purchases.into_iter().map(RawPurchase::into_purchase).collect(),
        payments: raw.payments.into_iter().map(RawPayment::into_payment).collect(),
        payments_made: raw.payments_made.into_iter().map(RawPaymentMade::into_payment_made).collect(),
    })
}

#[derive(Deserialize)]
struct RawBooks {
    #[serde(default)]
    customers: Vec<RawCounterparty>,
    #[serde(default)]
    vendors: Vec<RawCounterparty>,
    #[serde(default)]
    sales: Vec<RawSale>,
    #[serde(default)]
    purchases: Vec<RawPurchase>,
    #[serde(default)]
    payments: Vec<RawPayment>,
    #[serde(default)]
    payments_made: Vec<RawPaymentMade>,
}

#[derive(Deserialize)]
struct RawCounterparty {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    name: String,
    #[serde(flatten)]
    info: ContactInfo,
    #[serde(default)]
    preferred_unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    created_at: Option<DateTime<Utc>>,
}

impl RawCounterparty {
    fn into_customer(self) -> Customer {
        Customer {
            id: self.id,
            name: self.name,
            info: self.info,
            preferred_unit: self.preferred_unit,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }

    fn into_vendor(self) -> Vendor {
        Vendor {
            id: self.id,
            name: self.name,
            info: self.info,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Deserialize)]
struct RawSaleItem {
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "lenient_quantity")]
    quantity: f64,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_paise")]
    rate: Cents,
    #[serde(default, deserialize_with = "lenient_paise")]
    tax_share: Cents,
    #[serde(default, deserialize_with = "lenient_paise")]
    transport_share: Cents,
    #[serde(default, deserialize_with = "lenient_paise")]
    total: Cents,
}

#[derive(Deserialize)]
struct RawSale {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    customer_id: Uuid,
    #[serde(default)]
    items: Vec<RawSaleItem>,
    #[serde(default, deserialize_with = "lenient_paise")]
    subtotal: Cents,
    #[serde(default, deserialize_with = "lenient_quantity")]
    tax_rate_percent: f64,
    #[serde(default, deserialize_with = "lenient_paise")]
    tax_amount: Cents,
    #[serde(default, deserialize_with = "lenient_paise")]
    transport_charges: Cents,
    #[serde(default, deserialize_with = "lenient_paise")]
    total_amount: Cents,
    #[serde(default, deserialize_with = "lenient_paise")]
    paid_amount: Cents,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    created_at: Option<DateTime<Utc>>,
}

impl RawSale {
    /// Stored figures are kept as issued; only the status is re-derived.
    fn into_sale(self) -> Sale {
        let items = self
            .items
            .into_iter()
            .map(|item| SaleItem {
                line: LineItem::new(item.name, item.quantity, item.unit, item.rate),
                tax_share: item.tax_share,
                transport_share: item.transport_share,
                total: item.total,
            })
            .collect();

        Sale {
            id: self.id,
            invoice_number: 0,
            customer_id: self.customer_id,
            items,
            subtotal: self.subtotal,
            tax_rate_percent: self.tax_rate_percent,
            tax_amount: self.tax_amount,
            transport_charges: self.transport_charges,
            total_amount: self.total_amount,
            status: SaleStatus::for_amounts(self.total_amount, self.paid_amount),
            paid_amount: self.paid_amount,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
struct RawPurchase {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    vendor_id: Uuid,
    #[serde(default)]
    item: String,
    #[serde(default, deserialize_with = "lenient_quantity")]
    quantity: f64,
    #[serde(default, deserialize_with = "lenient_paise")]
    rate: Cents,
    #[serde(default, deserialize_with = "lenient_paise")]
    total_amount: Cents,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    date: Option<DateTime<Utc>>,
}

impl RawPurchase {
    fn into_purchase(self) -> Purchase {
        Purchase {
            id: self.id,
            vendor_id: self.vendor_id,
            item: self.item,
            quantity: self.quantity,
            rate: self.rate,
            total_amount: self.total_amount,
            status: self
                .status
                .as_deref()
                .and_then(PurchaseStatus::from_str)
                .unwrap_or(PurchaseStatus::Unpaid),
            date: self.date,
        }
    }
}

#[derive(Deserialize)]
struct RawPayment {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    customer_id: Uuid,
    #[serde(default)]
    sale_id: Option<Uuid>,
    #[serde(default, deserialize_with = "lenient_paise")]
    amount_paid: Cents,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    payment_date: Option<DateTime<Utc>>,
}

impl RawPayment {
    fn into_payment(self) -> Payment {
        Payment {
            id: self.id,
            customer_id: self.customer_id,
            sale_id: self.sale_id,
            amount_paid: self.amount_paid,
            mode: lenient_mode(self.mode.as_deref()),
            payment_date: self.payment_date,
        }
    }
}

#[derive(Deserialize)]
struct RawPaymentMade {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    vendor_id: Uuid,
    #[serde(default, deserialize_with = "lenient_paise")]
    amount: Cents,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    date: Option<DateTime<Utc>>,
}

impl RawPaymentMade {
    fn into_payment_made(self) -> PaymentMade {
        PaymentMade {
            id: self.id,
            vendor_id: self.vendor_id,
            amount: self.amount,
            mode: lenient_mode(self.mode.as_deref()),
            date: self.date,
        }
    }
}

fn lenient_mode(raw: Option<&str>) -> PaymentMode {
    raw.map(PaymentMode::parse_lenient).unwrap_or(PaymentMode::Other)
}

/// Integers are paise; strings are rupee amounts; everything else is zero.
fn paise_from_value(value: &Value) -> Cents {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as Cents))
            .unwrap_or(0),
        Value::String(s) => coerce_cents_str(s),
        Value::Null => 0,
        other => {
            warn!(value = %other, "non-numeric amount read as zero");
            0
        }
    }
}

fn lenient_paise<'de, D>(deserializer: D) -> Result<Cents, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(paise_from_value(&value))
}

fn lenient_quantity<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|q| q.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::String(s) => {
            let parsed = parse_timestamp(s);
            if parsed.is_none() {
                warn!(value = %s, "unreadable date imported as unknown");
            }
            parsed
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOMER: &str = "6f1c0a5e-8a52-4c1e-9d0b-3f4f0b7f2a11";

    #[test]
    fn test_lenient_amounts_and_dates() {
        let json = format!(
            r#"{{
                "customers": [{{ "id": "{c}", "name": "Ravi", "contact": "98450 12345" }}],
                "payments": [
                    {{ "customer_id": "{c}", "amount_paid": 150050, "mode": "UPI", "payment_date": "2024-03-01" }},
                    {{ "customer_id": "{c}", "amount_paid": "1,200.50", "mode": "neft", "payment_date": "2024-03-02 10:30:00" }},
                    {{ "customer_id": "{c}", "amount_paid": "abc", "payment_date": "yesterday" }},
                    {{ "customer_id": "{c}", "amount_paid": null }}
                ]
            }}"#,
            c = CUSTOMER
        );

        let books = parse_books(json.as_bytes()).unwrap();
        assert_eq!(books.customers.len(), 1);
        assert_eq!(books.customers[0].info.contact.as_deref(), Some("98450 12345"));

        let amounts: Vec<Cents> = books.payments.iter().map(|p| p.amount_paid).collect();
        assert_eq!(amounts, vec![150_050, 120_050, 0, 0]);
        assert_eq!(books.payments[0].mode, PaymentMode::Upi);
        assert_eq!(books.payments[1].mode, PaymentMode::BankTransfer);
        assert_eq!(books.payments[2].mode, PaymentMode::Other);
        assert!(books.payments[0].payment_date.is_some());
        assert!(books.payments[1].payment_date.is_some());
        assert!(books.payments[2].payment_date.is_none());
    }

    #[test]
    fn test_sale_status_is_rederived() {
        let json = format!(
            r#"{{
                "sales": [{{
                    "customer_id": "{c}",
                    "items": [{{ "name": "Rice", "quantity": "2.5", "unit": "kg", "rate": 6000 }}],
                    "subtotal": 15000,
                    "total_amount": 15000,
                    "paid_amount": "50",
                    "status": "paid"
                }}]
            }}"#,
            c = CUSTOMER
        );

        let books = parse_books(json.as_bytes()).unwrap();
        let sale = &books.sales[0];
        assert_eq!(sale.paid_amount, 5_000);
        assert_eq!(sale.status, SaleStatus::Partial);
        assert_eq!(sale.items[0].line.amount(), 15_000);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(parse_books("{ not json".as_bytes()).is_err());
    }
}
