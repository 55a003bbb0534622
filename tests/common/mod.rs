// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use khata::application::{LedgerService, Session};
use khata::domain::{ContactInfo, Customer, InvoiceDraft, LineItem, Sale, Vendor};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Path of the database file inside a test directory, as a sqlx URL
pub fn database_url(temp_dir: &TempDir) -> String {
    format!("sqlite:{}", temp_dir.path().join("test.db").display())
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

pub fn session() -> Session {
    Session::start("test-shop")
}

/// Test fixture: a couple of customers and vendors
pub struct StandardBooks;

impl StandardBooks {
    /// Customers "Ravi Kumar" and "Meena Stores", vendors "Acme Supplies" and "Globex"
    pub async fn create_counterparties(
        service: &LedgerService,
        session: &Session,
    ) -> Result<(Customer, Customer, Vendor, Vendor)> {
        let ravi = service
            .create_customer(session, "Ravi Kumar".into(), ContactInfo::default(), None)
            .await?;
        let meena = service
            .create_customer(
                session,
                "Meena Stores".into(),
                ContactInfo {
                    contact: Some("98450 12345".into()),
                    ..Default::default()
                },
                Some("kg".into()),
            )
            .await?;
        let acme = service
            .create_vendor(session, "Acme Supplies".into(), ContactInfo::default())
            .await?;
        let globex = service
            .create_vendor(session, "Globex".into(), ContactInfo::default())
            .await?;
        Ok((ravi, meena, acme, globex))
    }

    /// A single-line invoice for `amount` paise
    pub async fn invoice(
        service: &LedgerService,
        session: &Session,
        customer: &Customer,
        amount: i64,
        date: DateTime<Utc>,
    ) -> Result<Sale> {
        let draft = InvoiceDraft::new(Some(customer.id)).with_item(LineItem::new("Goods", 1.0, None, amount));
        Ok(service.create_invoice(session, &draft, date).await?)
    }
}
