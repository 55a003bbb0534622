use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;

use crate::application::{BooksSnapshot, CounterpartyBalance, LedgerService, Session};
use crate::domain::format_cents;

/// Every record of one tenant, as written by `export --format json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BooksExport {
    pub version: String,
    pub tenant: String,
    pub exported_at: DateTime<Utc>,
    #[serde(flatten)]
    pub books: BooksSnapshot,
}

/// Exporter for converting the books to various formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
    session: &'a Session,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService, session: &'a Session) -> Self {
        Self { service, session }
    }

    /// Export customer balances to CSV format
    pub async fn export_customer_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let balances = self.service.customer_balances(self.session).await?;
        write_balances_csv(writer, &balances)
    }

    /// Export vendor balances to CSV format
    pub async fn export_vendor_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let balances = self.service.vendor_balances(self.session).await?;
        write_balances_csv(writer, &balances)
    }

    /// Export invoices to CSV format, one row per invoice
    pub async fn export_sales_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let customers = self.service.list_customers(self.session).await?;
        let names: HashMap<_, _> = customers.iter().map(|c| (c.id, c.name.as_str())).collect();
        let sales = self.service.list_sales(self.session, None).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "invoice_number",
            "date",
            "customer",
            "items",
            "subtotal",
            "tax_rate_percent",
            "tax_amount",
            "transport_charges",
            "total_amount",
            "paid_amount",
            "status",
        ])?;

        for sale in &sales {
            csv_writer.write_record([
                sale.invoice_number.to_string(),
                sale.created_at.map(|dt| dt.to_rfc3339()).unwrap_or_default(),
                names.get(&sale.customer_id).copied().unwrap_or("").to_string(),
                sale.items.len().to_string(),
                format_cents(sale.subtotal),
                sale.tax_rate_percent.to_string(),
                format_cents(sale.tax_amount),
                format_cents(sale.transport_charges),
                format_cents(sale.total_amount),
                format_cents(sale.paid_amount),
                sale.status.as_str().to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(sales.len())
    }

    /// Export every record of the tenant as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<BooksExport> {
        let books = self.service.snapshot(self.session).await?;
        let export = BooksExport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            tenant: self.session.tenant()?.to_string(),
            exported_at: Utc::now(),
            books,
        };

        let json = serde_json::to_string_pretty(&export)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(export)
    }
}

/// Balance lines as CSV; amounts in rupees with two decimals.
pub fn write_balances_csv<W: Write>(writer: W, balances: &[CounterpartyBalance]) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["name", "kind", "total_billed", "total_paid", "pending"])?;

    for balance in balances {
        csv_writer.write_record([
            balance.name.as_str(),
            balance.kind.as_str(),
            &format_cents(balance.summary.total_billed),
            &format_cents(balance.summary.total_paid),
            &format_cents(balance.summary.pending),
        ])?;
    }

    csv_writer.flush()?;
    Ok(balances.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BalanceSummary, CounterpartyKind};
    use uuid::Uuid;

    #[test]
    fn test_balances_csv_keeps_negative_payables() {
        let balances = vec![CounterpartyBalance {
            id: Uuid::new_v4(),
            name: "Acme Supplies".to_string(),
            kind: CounterpartyKind::Vendor,
            summary: BalanceSummary {
                total_billed: 50_000,
                total_paid: 80_000,
                pending: -30_000,
            },
        }];

        let mut out = Vec::new();
        let count = write_balances_csv(&mut out, &balances).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(count, 1);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("name,kind,total_billed,total_paid,pending"));
        assert_eq!(lines.next(), Some("Acme Supplies,vendor,500.00,800.00,-300.00"));
    }
}
