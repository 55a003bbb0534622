use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
    parse_timestamp, Cents, ContactInfo, Customer, CustomerId, DependentCounts, LineItem, Payment,
    PaymentId, PaymentMade, PaymentMode, Purchase, PurchaseId, PurchaseStatus, Sale, SaleId,
    SaleItem, SaleStatus, Vendor, VendorId,
};

use super::MIGRATION_001_INITIAL;

const SALE_COLUMNS: &str = "id, invoice_number, customer_id, subtotal, tax_rate_percent, tax_amount, transport_charges, total_amount, status, paid_amount, created_at";
const PURCHASE_COLUMNS: &str = "id, vendor_id, item, quantity, rate, total_amount, status, date";
const PAYMENT_COLUMNS: &str = "id, customer_id, sale_id, amount_paid, mode, payment_date";
const PAYMENT_MADE_COLUMNS: &str = "id, vendor_id, amount, mode, date";

/// Tables whose rows carry their own id. Ids are unique across tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTable {
    Customers,
    Vendors,
    Sales,
    Purchases,
    Payments,
    PaymentsMade,
}

impl RecordTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordTable::Customers => "customers",
            RecordTable::Vendors => "vendors",
            RecordTable::Sales => "sales",
            RecordTable::Purchases => "purchases",
            RecordTable::Payments => "payments",
            RecordTable::PaymentsMade => "payments_made",
        }
    }
}

/// Repository for persisting and querying counterparties and their transactions.
/// Every query is scoped to a tenant.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run more than once.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// The tenant owning `id` in `table`, whichever tenant that is.
    /// Only used to keep restored ids from colliding across tenants.
    pub async fn record_tenant(&self, table: RecordTable, id: Uuid) -> Result<Option<String>> {
        let sql = format!("SELECT tenant_id FROM {} WHERE id = ?", table.as_str());
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to look up {} id", table.as_str()))?;
        Ok(row.map(|r| r.get("tenant_id")))
    }

    // ========================
    // Customer operations
    // ========================

    pub async fn save_customer(&self, tenant: &str, customer: &Customer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, tenant_id, name, contact, email, address, tax_id, preferred_unit, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(customer.id.to_string())
        .bind(tenant)
        .bind(&customer.name)
        .bind(&customer.info.contact)
        .bind(&customer.info.email)
        .bind(&customer.info.address)
        .bind(&customer.info.tax_id)
        .bind(&customer.preferred_unit)
        .bind(customer.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save customer")?;
        Ok(())
    }

    pub async fn get_customer(&self, tenant: &str, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM customers WHERE tenant_id = ? AND id = ?")
            .bind(tenant)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch customer")?;
        row.as_ref().map(Self::row_to_customer).transpose()
    }

    pub async fn get_customer_by_name(&self, tenant: &str, name: &str) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM customers WHERE tenant_id = ? AND name = ?")
            .bind(tenant)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch customer by name")?;
        row.as_ref().map(Self::row_to_customer).transpose()
    }

    pub async fn list_customers(&self, tenant: &str) -> Result<Vec<Customer>> {
        let rows = sqlx::query("SELECT * FROM customers WHERE tenant_id = ? ORDER BY name")
            .bind(tenant)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list customers")?;
        rows.iter().map(Self::row_to_customer).collect()
    }

    pub async fn delete_customer(&self, tenant: &str, id: CustomerId) -> Result<()> {
        sqlx::query("DELETE FROM customers WHERE tenant_id = ? AND id = ?")
            .bind(tenant)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete customer")?;
        Ok(())
    }

    /// Sales and payments that still reference a customer.
    pub async fn count_customer_dependents(&self, tenant: &str, id: CustomerId) -> Result<DependentCounts> {
        let id_str = id.to_string();
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM sales WHERE tenant_id = ? AND customer_id = ?) as sales,
                (SELECT COUNT(*) FROM payments WHERE tenant_id = ? AND customer_id = ?) as payments
            "#,
        )
        .bind(tenant)
        .bind(&id_str)
        .bind(tenant)
        .bind(&id_str)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count customer dependents")?;

        Ok(DependentCounts {
            sales: row.get("sales"),
            purchases: 0,
            payments: row.get("payments"),
        })
    }

    fn row_to_customer(row: &SqliteRow) -> Result<Customer> {
        let id_str: String = row.get("id");
        Ok(Customer {
            id: Uuid::parse_str(&id_str).context("Invalid customer ID")?,
            name: row.get("name"),
            info: Self::row_to_contact(row),
            preferred_unit: row.get("preferred_unit"),
            created_at: Self::read_timestamp(row, "created_at").unwrap_or_default(),
        })
    }

    // ========================
    // Vendor operations
    // ========================

    pub async fn save_vendor(&self, tenant: &str, vendor: &Vendor) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO vendors (id, tenant_id, name, contact, email, address, tax_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(vendor.id.to_string())
        .bind(tenant)
        .bind(&vendor.name)
        .bind(&vendor.info.contact)
        .bind(&vendor.info.email)
        .bind(&vendor.info.address)
        .bind(&vendor.info.tax_id)
        .bind(vendor.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save vendor")?;
        Ok(())
    }

    pub async fn get_vendor(&self, tenant: &str, id: VendorId) -> Result<Option<Vendor>> {
        let row = sqlx::query("SELECT * FROM vendors WHERE tenant_id = ? AND id = ?")
            .bind(tenant)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch vendor")?;
        row.as_ref().map(Self::row_to_vendor).transpose()
    }

    pub async fn get_vendor_by_name(&self, tenant: &str, name: &str) -> Result<Option<Vendor>> {
        let row = sqlx::query("SELECT * FROM vendors WHERE tenant_id = ? AND name = ?")
            .bind(tenant)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch vendor by name")?;
        row.as_ref().map(Self::row_to_vendor).transpose()
    }

    pub async fn list_vendors(&self, tenant: &str) -> Result<Vec<Vendor>> {
        let rows = sqlx::query("SELECT * FROM vendors WHERE tenant_id = ? ORDER BY name")
            .bind(tenant)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list vendors")?;
        rows.iter().map(Self::row_to_vendor).collect()
    }

    pub async fn delete_vendor(&self, tenant: &str, id: VendorId) -> Result<()> {
        sqlx::query("DELETE FROM vendors WHERE tenant_id = ? AND id = ?")
            .bind(tenant)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete vendor")?;
        Ok(())
    }

    /// Purchases and payments made that still reference a vendor.
    pub async fn count_vendor_dependents(&self, tenant: &str, id: VendorId) -> Result<DependentCounts> {
        let id_str = id.to_string();
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM purchases WHERE tenant_id = ? AND vendor_id = ?) as purchases,
                (SELECT COUNT(*) FROM payments_made WHERE tenant_id = ? AND vendor_id = ?) as payments
            "#,
        )
        .bind(tenant)
        .bind(&id_str)
        .bind(tenant)
        .bind(&id_str)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count vendor dependents")?;

        Ok(DependentCounts {
            sales: 0,
            purchases: row.get("purchases"),
            payments: row.get("payments"),
        })
    }

    fn row_to_vendor(row: &SqliteRow) -> Result<Vendor> {
        let id_str: String = row.get("id");
        Ok(Vendor {
            id: Uuid::parse_str(&id_str).context("Invalid vendor ID")?,
            name: row.get("name"),
            info: Self::row_to_contact(row),
            created_at: Self::read_timestamp(row, "created_at").unwrap_or_default(),
        })
    }

    fn row_to_contact(row: &SqliteRow) -> ContactInfo {
        ContactInfo {
            contact: row.get("contact"),
            email: row.get("email"),
            address: row.get("address"),
            tax_id: row.get("tax_id"),
        }
    }

    // ========================
    // Sale operations
    // ========================

    /// Save a new sale with its line items.
    /// Assigns the next invoice number for the tenant.
    pub async fn save_sale(&self, tenant: &str, sale: &mut Sale) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let next: i64 = sqlx::query(
            "SELECT COALESCE(MAX(invoice_number), 0) + 1 as next FROM sales WHERE tenant_id = ?",
        )
        .bind(tenant)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to get next invoice number")?
        .get("next");
        sale.invoice_number = next;

        sqlx::query(
            r#"
            INSERT INTO sales (id, tenant_id, invoice_number, customer_id, subtotal, tax_rate_percent, tax_amount, transport_charges, total_amount, status, paid_amount, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sale.id.to_string())
        .bind(tenant)
        .bind(sale.invoice_number)
        .bind(sale.customer_id.to_string())
        .bind(sale.subtotal)
        .bind(sale.tax_rate_percent)
        .bind(sale.tax_amount)
        .bind(sale.transport_charges)
        .bind(sale.total_amount)
        .bind(sale.status.as_str())
        .bind(sale.paid_amount)
        .bind(sale.created_at.map(|dt| dt.to_rfc3339()))
        .execute(&mut *tx)
        .await
        .context("Failed to save sale")?;

        for (position, item) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (sale_id, position, name, quantity, unit, rate, tax_share, transport_share, total)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(sale.id.to_string())
            .bind(position as i64)
            .bind(&item.line.name)
            .bind(item.line.quantity())
            .bind(&item.line.unit)
            .bind(item.line.rate())
            .bind(item.tax_share)
            .bind(item.transport_share)
            .bind(item.total)
            .execute(&mut *tx)
            .await
            .context("Failed to save sale item")?;
        }

        tx.commit().await.context("Failed to commit sale")?;
        debug!(invoice_number = sale.invoice_number, items = sale.items.len(), "sale saved");
        Ok(())
    }

    pub async fn get_sale(&self, tenant: &str, id: SaleId) -> Result<Option<Sale>> {
        let query = format!("SELECT {} FROM sales WHERE tenant_id = ? AND id = ?", SALE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(tenant)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch sale")?;
        self.hydrate_sale(row).await
    }

    pub async fn get_sale_by_number(&self, tenant: &str, invoice_number: i64) -> Result<Option<Sale>> {
        let query = format!(
            "SELECT {} FROM sales WHERE tenant_id = ? AND invoice_number = ?",
            SALE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(tenant)
            .bind(invoice_number)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch sale by number")?;
        self.hydrate_sale(row).await
    }

    async fn hydrate_sale(&self, row: Option<SqliteRow>) -> Result<Option<Sale>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut sale = Self::row_to_sale(&row)?;
        let item_rows = sqlx::query("SELECT * FROM sale_items WHERE sale_id = ? ORDER BY position")
            .bind(sale.id.to_string())
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch sale items")?;
        sale.items = item_rows.iter().map(Self::row_to_sale_item).collect();
        Ok(Some(sale))
    }

    /// List sales, optionally for a single customer, oldest invoice first.
    pub async fn list_sales(&self, tenant: &str, customer: Option<CustomerId>) -> Result<Vec<Sale>> {
        let customer_str = customer.map(|id| id.to_string());
        let filter = if customer.is_some() { " AND customer_id = ?" } else { "" };

        let query = format!(
            "SELECT {} FROM sales WHERE tenant_id = ?{} ORDER BY invoice_number",
            SALE_COLUMNS, filter
        );
        let mut sale_query = sqlx::query(&query).bind(tenant);
        if let Some(ref id) = customer_str {
            sale_query = sale_query.bind(id);
        }
        let rows = sale_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list sales")?;

        // Load all items for the selected sales in one query
        let items_query = format!(
            "SELECT i.* FROM sale_items i JOIN sales s ON s.id = i.sale_id WHERE s.tenant_id = ?{} ORDER BY i.sale_id, i.position",
            if customer.is_some() { " AND s.customer_id = ?" } else { "" }
        );
        let mut item_query = sqlx::query(&items_query).bind(tenant);
        if let Some(ref id) = customer_str {
            item_query = item_query.bind(id);
        }
        let item_rows = item_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list sale items")?;

        let mut items_by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for row in &item_rows {
            let sale_id: String = row.get("sale_id");
            items_by_sale
                .entry(sale_id)
                .or_default()
                .push(Self::row_to_sale_item(row));
        }

        rows.iter()
            .map(|row| {
                let mut sale = Self::row_to_sale(row)?;
                sale.items = items_by_sale.remove(&sale.id.to_string()).unwrap_or_default();
                Ok(sale)
            })
            .collect()
    }

    /// Persist the payment progress of an invoice.
    /// This is the only update ever applied to a sale.
    pub async fn update_sale_payment(
        &self,
        tenant: &str,
        id: SaleId,
        paid_amount: Cents,
        status: SaleStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE sales SET paid_amount = ?, status = ? WHERE tenant_id = ? AND id = ?")
            .bind(paid_amount)
            .bind(status.as_str())
            .bind(tenant)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update sale payment")?;
        Ok(())
    }

    pub async fn delete_sale(&self, tenant: &str, id: SaleId) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        sqlx::query("DELETE FROM sale_items WHERE sale_id IN (SELECT id FROM sales WHERE tenant_id = ? AND id = ?)")
            .bind(tenant)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete sale items")?;
        sqlx::query("DELETE FROM sales WHERE tenant_id = ? AND id = ?")
            .bind(tenant)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete sale")?;
        tx.commit().await.context("Failed to commit sale deletion")?;
        Ok(())
    }

    /// Payments that were recorded against a specific invoice.
    pub async fn count_payments_for_sale(&self, tenant: &str, id: SaleId) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM payments WHERE tenant_id = ? AND sale_id = ?")
            .bind(tenant)
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count invoice payments")?;
        Ok(row.get("count"))
    }

    fn row_to_sale(row: &SqliteRow) -> Result<Sale> {
        let id_str: String = row.get("id");
        let customer_str: String = row.get("customer_id");
        let status_str: String = row.get("status");
        let total_amount = Self::read_cents(row, "total_amount");
        let paid_amount = Self::read_cents(row, "paid_amount");

        Ok(Sale {
            id: Uuid::parse_str(&id_str).context("Invalid sale ID")?,
            invoice_number: row.get("invoice_number"),
            customer_id: Uuid::parse_str(&customer_str).context("Invalid customer ID on sale")?,
            items: Vec::new(),
            subtotal: Self::read_cents(row, "subtotal"),
            tax_rate_percent: row.try_get("tax_rate_percent").unwrap_or(0.0),
            tax_amount: Self::read_cents(row, "tax_amount"),
            transport_charges: Self::read_cents(row, "transport_charges"),
            total_amount,
            status: SaleStatus::from_str(&status_str)
                .unwrap_or_else(|| SaleStatus::for_amounts(total_amount, paid_amount)),
            paid_amount,
            created_at: Self::read_timestamp(row, "created_at"),
        })
    }

    fn row_to_sale_item(row: &SqliteRow) -> SaleItem {
        let quantity: f64 = row.try_get("quantity").unwrap_or(0.0);
        SaleItem {
            line: LineItem::new(
                row.get::<String, _>("name"),
                quantity,
                row.get("unit"),
                Self::read_cents(row, "rate"),
            ),
            tax_share: Self::read_cents(row, "tax_share"),
            transport_share: Self::read_cents(row, "transport_share"),
            total: Self::read_cents(row, "total"),
        }
    }

    // ========================
    // Purchase operations
    // ========================

    pub async fn save_purchase(&self, tenant: &str, purchase: &Purchase) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO purchases (id, tenant_id, vendor_id, item, quantity, rate, total_amount, status, date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(purchase.id.to_string())
        .bind(tenant)
        .bind(purchase.vendor_id.to_string())
        .bind(&purchase.item)
        .bind(purchase.quantity)
        .bind(purchase.rate)
        .bind(purchase.total_amount)
        .bind(purchase.status.as_str())
        .bind(purchase.date.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save purchase")?;
        Ok(())
    }

    pub async fn list_purchases(&self, tenant: &str, vendor: Option<VendorId>) -> Result<Vec<Purchase>> {
        let rows = self
            .fetch_scoped_for(tenant, "purchases", PURCHASE_COLUMNS, "vendor_id", vendor, "date")
            .await
            .context("Failed to list purchases")?;
        rows.iter().map(Self::row_to_purchase).collect()
    }

    pub async fn delete_purchase(&self, tenant: &str, id: PurchaseId) -> Result<bool> {
        self.delete_scoped("purchases", tenant, id)
            .await
            .context("Failed to delete purchase")
    }

    fn row_to_purchase(row: &SqliteRow) -> Result<Purchase> {
        let id_str: String = row.get("id");
        let vendor_str: String = row.get("vendor_id");
        let status_str: String = row.get("status");
        Ok(Purchase {
            id: Uuid::parse_str(&id_str).context("Invalid purchase ID")?,
            vendor_id: Uuid::parse_str(&vendor_str).context("Invalid vendor ID on purchase")?,
            item: row.get("item"),
            quantity: row.try_get("quantity").unwrap_or(0.0),
            rate: Self::read_cents(row, "rate"),
            total_amount: Self::read_cents(row, "total_amount"),
            status: PurchaseStatus::from_str(&status_str).unwrap_or(PurchaseStatus::Unpaid),
            date: Self::read_timestamp(row, "date"),
        })
    }

    // ========================
    // Payment operations
    // ========================

    pub async fn save_payment(&self, tenant: &str, payment: &Payment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, tenant_id, customer_id, sale_id, amount_paid, mode, payment_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.id.to_string())
        .bind(tenant)
        .bind(payment.customer_id.to_string())
        .bind(payment.sale_id.map(|id| id.to_string()))
        .bind(payment.amount_paid)
        .bind(payment.mode.as_str())
        .bind(payment.payment_date.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save payment")?;
        Ok(())
    }

    pub async fn list_payments(&self, tenant: &str, customer: Option<CustomerId>) -> Result<Vec<Payment>> {
        let rows = self
            .fetch_scoped_for(tenant, "payments", PAYMENT_COLUMNS, "customer_id", customer, "payment_date")
            .await
            .context("Failed to list payments")?;
        rows.iter().map(Self::row_to_payment).collect()
    }

    pub async fn delete_payment(&self, tenant: &str, id: PaymentId) -> Result<bool> {
        self.delete_scoped("payments", tenant, id)
            .await
            .context("Failed to delete payment")
    }

    fn row_to_payment(row: &SqliteRow) -> Result<Payment> {
        let id_str: String = row.get("id");
        let customer_str: String = row.get("customer_id");
        let sale_str: Option<String> = row.get("sale_id");
        let mode_str: String = row.get("mode");
        Ok(Payment {
            id: Uuid::parse_str(&id_str).context("Invalid payment ID")?,
            customer_id: Uuid::parse_str(&customer_str).context("Invalid customer ID on payment")?,
            sale_id: sale_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid sale ID on payment")?,
            amount_paid: Self::read_cents(row, "amount_paid"),
            mode: PaymentMode::parse_lenient(&mode_str),
            payment_date: Self::read_timestamp(row, "payment_date"),
        })
    }

    pub async fn save_payment_made(&self, tenant: &str, payment: &PaymentMade) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments_made (id, tenant_id, vendor_id, amount, mode, date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.id.to_string())
        .bind(tenant)
        .bind(payment.vendor_id.to_string())
        .bind(payment.amount)
        .bind(payment.mode.as_str())
        .bind(payment.date.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save payment made")?;
        Ok(())
    }

    pub async fn list_payments_made(&self, tenant: &str, vendor: Option<VendorId>) -> Result<Vec<PaymentMade>> {
        let rows = self
            .fetch_scoped_for(tenant, "payments_made", PAYMENT_MADE_COLUMNS, "vendor_id", vendor, "date")
            .await
            .context("Failed to list payments made")?;
        rows.iter().map(Self::row_to_payment_made).collect()
    }

    pub async fn delete_payment_made(&self, tenant: &str, id: PaymentId) -> Result<bool> {
        self.delete_scoped("payments_made", tenant, id)
            .await
            .context("Failed to delete payment made")
    }

    fn row_to_payment_made(row: &SqliteRow) -> Result<PaymentMade> {
        let id_str: String = row.get("id");
        let vendor_str: String = row.get("vendor_id");
        let mode_str: String = row.get("mode");
        Ok(PaymentMade {
            id: Uuid::parse_str(&id_str).context("Invalid payment ID")?,
            vendor_id: Uuid::parse_str(&vendor_str).context("Invalid vendor ID on payment")?,
            amount: Self::read_cents(row, "amount"),
            mode: PaymentMode::parse_lenient(&mode_str),
            date: Self::read_timestamp(row, "date"),
        })
    }

    // ========================
    // Shared helpers
    // ========================

    /// Select rows of a tenant-scoped table, optionally filtered to one counterparty.
    async fn fetch_scoped_for(
        &self,
        tenant: &str,
        table: &str,
        columns: &str,
        counterparty_column: &str,
        counterparty: Option<Uuid>,
        order_column: &str,
    ) -> Result<Vec<SqliteRow>> {
        let mut query = format!("SELECT {} FROM {} WHERE tenant_id = ?", columns, table);
        if counterparty.is_some() {
            query.push_str(&format!(" AND {} = ?", counterparty_column));
        }
        query.push_str(&format!(" ORDER BY {}, id", order_column));

        let counterparty_str = counterparty.map(|id| id.to_string());
        let mut sql_query = sqlx::query(&query).bind(tenant);
        if let Some(ref id) = counterparty_str {
            sql_query = sql_query.bind(id);
        }

        debug!(table, counterparty = ?counterparty, "fetching rows");
        Ok(sql_query.fetch_all(&self.pool).await?)
    }

    async fn delete_scoped(&self, table: &str, tenant: &str, id: Uuid) -> Result<bool> {
        let query = format!("DELETE FROM {} WHERE tenant_id = ? AND id = ?", table);
        let result = sqlx::query(&query)
            .bind(tenant)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Read a money column, coercing whatever is stored there.
    /// Integers are taken as-is, reals are rounded, numeric text is parsed;
    /// NULL or anything else contributes zero.
    fn read_cents(row: &SqliteRow, column: &str) -> Cents {
        if let Ok(value) = row.try_get::<i64, _>(column) {
            return value;
        }
        if let Ok(value) = row.try_get::<f64, _>(column) {
            return if value.is_finite() { value.round() as Cents } else { 0 };
        }
        match row.try_get::<String, _>(column) {
            Ok(raw) => match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => value.round() as Cents,
                _ => {
                    warn!(column, raw = %raw, "non-numeric amount treated as zero");
                    0
                }
            },
            Err(_) => 0,
        }
    }

    /// Read a timestamp column; unparseable values become `None`.
    fn read_timestamp(row: &SqliteRow, column: &str) -> Option<DateTime<Utc>> {
        let raw: Option<String> = row.try_get(column).ok().flatten();
        let raw = raw?;
        let parsed = parse_timestamp(&raw);
        if parsed.is_none() {
            warn!(column, raw = %raw, "unparseable timestamp");
        }
        parsed
    }
}
