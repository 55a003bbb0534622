use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    build_series, summarize_balance, BalanceSide, Cents, ContactInfo, CounterpartyKind, Customer, DependentCounts,
    InvoiceDraft, Payment, PaymentId, PaymentMade, PaymentMode, Purchase, PurchaseId,
    PurchaseStatus, Sale, SaleStatus, SeriesBucket, SeriesWindow, Timestamped, ValidationErrors, Vendor,
};
use crate::storage::{RecordTable, Repository};

use super::{AppError, BooksSnapshot, CounterpartyAccount, CounterpartyBalance, Dashboard, Session};

/// Application service providing the high-level operations of the books.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
/// Every call takes the caller's [`Session`]; nothing is cached between calls.
pub struct LedgerService {
    repo: Repository,
}

/// Result of recording a customer payment
pub struct PaymentResult {
    pub payment: Payment,
    pub customer_name: String,
    /// The invoice the payment was applied to, after the update
    pub invoice: Option<Sale>,
}

/// Which stream to chart against sales
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendAgainst {
    Payments,
    Purchases,
}

/// Input for a new purchase
pub struct PurchaseInput {
    pub vendor_name: String,
    pub item: String,
    pub quantity: f64,
    pub rate: Cents,
    pub status: PurchaseStatus,
    pub date: DateTime<Utc>,
}

impl LedgerService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Customer operations
    // ========================

    #[instrument(skip(self, session, info))]
    pub async fn create_customer(
        &self,
        session: &Session,
        name: String,
        info: ContactInfo,
        preferred_unit: Option<String>,
    ) -> Result<Customer, AppError> {
        let tenant = session.tenant()?;
        let name = require_name(name)?;
        if self.repo.get_customer_by_name(tenant, &name).await?.is_some() {
            return Err(AppError::CustomerAlreadyExists(name));
        }

        let mut customer = Customer::new(name).with_info(info);
        if let Some(unit) = preferred_unit {
            customer = customer.with_preferred_unit(unit);
        }
        self.repo.save_customer(tenant, &customer).await?;
        info!(customer = %customer.name, "customer created");
        Ok(customer)
    }

    pub async fn get_customer(&self, session: &Session, name: &str) -> Result<Customer, AppError> {
        self.repo
            .get_customer_by_name(session.tenant()?, name)
            .await?
            .ok_or_else(|| AppError::CustomerNotFound(name.to_string()))
    }

    pub async fn list_customers(&self, session: &Session) -> Result<Vec<Customer>, AppError> {
        Ok(self.repo.list_customers(session.tenant()?).await?)
    }

    /// Balance, dependents and last activity for one customer.
    pub async fn customer_account(&self, session: &Session, name: &str) -> Result<CounterpartyAccount, AppError> {
        let tenant = session.tenant()?;
        let customer = self.get_customer(session, name).await?;
        let sales = self.repo.list_sales(tenant, Some(customer.id)).await?;
        let payments = self.repo.list_payments(tenant, Some(customer.id)).await?;
        let dependents = self.repo.count_customer_dependents(tenant, customer.id).await?;

        let last_activity = latest(&sales).max(latest(&payments));
        Ok(CounterpartyAccount {
            balance: CounterpartyBalance {
                id: customer.id,
                name: customer.name,
                kind: CounterpartyKind::Customer,
                summary: summarize_balance(BalanceSide::Receivable, &sales, &payments),
            },
            dependents,
            last_activity,
        })
    }

    /// Delete a customer. Refused while any sale or payment references it.
    pub async fn delete_customer(&self, session: &Session, name: &str) -> Result<Customer, AppError> {
        let tenant = session.tenant()?;
        let customer = self.get_customer(session, name).await?;
        let counts = self.repo.count_customer_dependents(tenant, customer.id).await?;
        if !counts.is_empty() {
            return Err(AppError::HasDependents {
                kind: "customer",
                name: customer.name,
                counts,
            });
        }
        self.repo.delete_customer(tenant, customer.id).await?;
        info!(customer = %customer.name, "customer deleted");
        Ok(customer)
    }

    // ========================
    // Vendor operations
    // ========================

    #[instrument(skip(self, session, info))]
    pub async fn create_vendor(&self, session: &Session, name: String, info: ContactInfo) -> Result<Vendor, AppError> {
        let tenant = session.tenant()?;
        let name = require_name(name)?;
        if self.repo.get_vendor_by_name(tenant, &name).await?.is_some() {
            return Err(AppError::VendorAlreadyExists(name));
        }

        let vendor = Vendor::new(name).with_info(info);
        self.repo.save_vendor(tenant, &vendor).await?;
        info!(vendor = %vendor.name, "vendor created");
        Ok(vendor)
    }

    pub async fn get_vendor(&self, session: &Session, name: &str) -> Result<Vendor, AppError> {
        self.repo
            .get_vendor_by_name(session.tenant()?, name)
            .await?
            .ok_or_else(|| AppError::VendorNotFound(name.to_string()))
    }

    pub async fn list_vendors(&self, session: &Session) -> Result<Vec<Vendor>, AppError> {
        Ok(self.repo.list_vendors(session.tenant()?).await?)
    }

    /// Balance, dependents and last activity for one vendor.
    pub async fn vendor_account(&self, session: &Session, name: &str) -> Result<CounterpartyAccount, AppError> {
        let tenant = session.tenant()?;
        let vendor = self.get_vendor(session, name).await?;
        let purchases = self.repo.list_purchases(tenant, Some(vendor.id)).await?;
        let payments = self.repo.list_payments_made(tenant, Some(vendor.id)).await?;
        let dependents = self.repo.count_vendor_dependents(tenant, vendor.id).await?;

        let last_activity = latest(&purchases).max(latest(&payments));
        Ok(CounterpartyAccount {
            balance: CounterpartyBalance {
                id: vendor.id,
                name: vendor.name,
                kind: CounterpartyKind::Vendor,
                summary: summarize_balance(BalanceSide::Payable, &purchases, &payments),
            },
            dependents,
            last_activity,
        })
    }

    /// Delete a vendor. Refused while any purchase or payment references it.
    pub async fn delete_vendor(&self, session: &Session, name: &str) -> Result<Vendor, AppError> {
        let tenant = session.tenant()?;
        let vendor = self.get_vendor(session, name).await?;
        let counts = self.repo.count_vendor_dependents(tenant, vendor.id).await?;
        if !counts.is_empty() {
            return Err(AppError::HasDependents {
                kind: "vendor",
                name: vendor.name,
                counts,
            });
        }
        self.repo.delete_vendor(tenant, vendor.id).await?;
        info!(vendor = %vendor.name, "vendor deleted");
        Ok(vendor)
    }

    // ========================
    // Invoice operations
    // ========================

    /// Validate and persist an invoice. The draft must name an existing customer.
    pub async fn create_invoice(
        &self,
        session: &Session,
        draft: &InvoiceDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Sale, AppError> {
        let tenant = session.tenant()?;
        draft.validate()?;

        let customer_id = draft
            .customer_id
            .ok_or_else(|| AppError::CustomerNotFound("(none selected)".to_string()))?;
        let customer = self
            .repo
            .get_customer(tenant, customer_id)
            .await?
            .ok_or_else(|| AppError::CustomerNotFound(customer_id.to_string()))?;

        let mut sale = Sale::from_draft(customer.id, draft, created_at);
        self.repo.save_sale(tenant, &mut sale).await?;
        info!(
            invoice_number = sale.invoice_number,
            customer = %customer.name,
            total = sale.total_amount,
            "invoice created"
        );
        Ok(sale)
    }

    pub async fn get_invoice(&self, session: &Session, invoice_number: i64) -> Result<Sale, AppError> {
        self.repo
            .get_sale_by_number(session.tenant()?, invoice_number)
            .await?
            .ok_or(AppError::InvoiceNotFound(invoice_number))
    }

    /// An invoice together with the customer it was issued to.
    pub async fn get_invoice_with_customer(
        &self,
        session: &Session,
        invoice_number: i64,
    ) -> Result<(Sale, Customer), AppError> {
        let sale = self.get_invoice(session, invoice_number).await?;
        let customer = self
            .repo
            .get_customer(session.tenant()?, sale.customer_id)
            .await?
            .ok_or_else(|| AppError::CustomerNotFound(sale.customer_id.to_string()))?;
        Ok((sale, customer))
    }

    pub async fn list_sales(&self, session: &Session, customer_name: Option<&str>) -> Result<Vec<Sale>, AppError> {
        let tenant = session.tenant()?;
        let customer_id = match customer_name {
            Some(name) => Some(self.get_customer(session, name).await?.id),
            None => None,
        };
        Ok(self.repo.list_sales(tenant, customer_id).await?)
    }

    /// Delete an invoice. Refused while payments are recorded against it.
    pub async fn delete_invoice(&self, session: &Session, invoice_number: i64) -> Result<Sale, AppError> {
        let tenant = session.tenant()?;
        let sale = self.get_invoice(session, invoice_number).await?;
        let payments = self.repo.count_payments_for_sale(tenant, sale.id).await?;
        if payments > 0 {
            return Err(AppError::HasDependents {
                kind: "invoice",
                name: format!("#{}", invoice_number),
                counts: DependentCounts {
                    payments,
                    ..Default::default()
                },
            });
        }
        self.repo.delete_sale(tenant, sale.id).await?;
        info!(invoice_number, "invoice deleted");
        Ok(sale)
    }

    // ========================
    // Purchase operations
    // ========================

    pub async fn record_purchase(&self, session: &Session, input: PurchaseInput) -> Result<Purchase, AppError> {
        let tenant = session.tenant()?;
        let vendor = self.get_vendor(session, &input.vendor_name).await?;

        let purchase = Purchase::new(vendor.id, input.item, input.quantity, input.rate, input.status, input.date);
        purchase.validate()?;
        self.repo.save_purchase(tenant, &purchase).await?;
        info!(vendor = %vendor.name, total = purchase.total_amount, "purchase recorded");
        Ok(purchase)
    }

    pub async fn list_purchases(&self, session: &Session, vendor_name: Option<&str>) -> Result<Vec<Purchase>, AppError> {
        let tenant = session.tenant()?;
        let vendor_id = match vendor_name {
            Some(name) => Some(self.get_vendor(session, name).await?.id),
            None => None,
        };
        Ok(self.repo.list_purchases(tenant, vendor_id).await?)
    }

    pub async fn delete_purchase(&self, session: &Session, id: PurchaseId) -> Result<(), AppError> {
        if !self.repo.delete_purchase(session.tenant()?, id).await? {
            return Err(AppError::RecordNotFound {
                kind: "Purchase",
                id: id.to_string(),
            });
        }
        info!(%id, "purchase deleted");
        Ok(())
    }

    // ========================
    // Payment operations
    // ========================

    /// Record money received from a customer, optionally settling a specific invoice.
    pub async fn receive_payment(
        &self,
        session: &Session,
        customer_name: &str,
        amount: Cents,
        mode: PaymentMode,
        date: DateTime<Utc>,
        invoice_number: Option<i64>,
    ) -> Result<PaymentResult, AppError> {
        let tenant = session.tenant()?;
        let customer = self.get_customer(session, customer_name).await?;
        let mut payment = Payment::new(customer.id, amount, mode, date);
        payment.validate()?;

        let invoice = match invoice_number {
            Some(number) => {
                let mut sale = self.get_invoice(session, number).await?;
                if sale.customer_id != customer.id {
                    return Err(AppError::InvoiceCustomerMismatch {
                        invoice_number: number,
                        customer: customer.name,
                    });
                }
                if amount > sale.balance_due() {
                    return Err(AppError::PaymentExceedsBalance {
                        invoice_number: number,
                        due: sale.balance_due(),
                        offered: amount,
                    });
                }
                sale.apply_payment(amount);
                payment = payment.with_sale(sale.id);
                Some(sale)
            }
            None => None,
        };

        self.repo.save_payment(tenant, &payment).await?;
        if let Some(sale) = &invoice {
            self.repo
                .update_sale_payment(tenant, sale.id, sale.paid_amount, sale.status)
                .await?;
            debug!(invoice_number = sale.invoice_number, status = %sale.status, "invoice payment applied");
        }
        info!(customer = %customer.name, amount, "payment received");

        Ok(PaymentResult {
            payment,
            customer_name: customer.name,
            invoice,
        })
    }

    pub async fn list_payments(&self, session: &Session, customer_name: Option<&str>) -> Result<Vec<Payment>, AppError> {
        let tenant = session.tenant()?;
        let customer_id = match customer_name {
            Some(name) => Some(self.get_customer(session, name).await?.id),
            None => None,
        };
        Ok(self.repo.list_payments(tenant, customer_id).await?)
    }

    /// Delete a received payment. If it settled an invoice, the invoice's
    /// paid amount and status are rolled back.
    pub async fn delete_payment(&self, session: &Session, id: PaymentId) -> Result<Payment, AppError> {
        let tenant = session.tenant()?;
        let payment = self
            .repo
            .list_payments(tenant, None)
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::RecordNotFound {
                kind: "Payment",
                id: id.to_string(),
            })?;

        self.repo.delete_payment(tenant, id).await?;
        if let Some(sale_id) = payment.sale_id {
            if let Some(mut sale) = self.repo.get_sale(tenant, sale_id).await? {
                sale.paid_amount = (sale.paid_amount - payment.amount_paid).max(0);
                sale.status = SaleStatus::for_amounts(sale.total_amount, sale.paid_amount);
                self.repo
                    .update_sale_payment(tenant, sale.id, sale.paid_amount, sale.status)
                    .await?;
            }
        }
        info!(%id, "payment deleted");
        Ok(payment)
    }

    /// Record money paid out to a vendor.
    pub async fn pay_vendor(
        &self,
        session: &Session,
        vendor_name: &str,
        amount: Cents,
        mode: PaymentMode,
        date: DateTime<Utc>,
    ) -> Result<PaymentMade, AppError> {
        let tenant = session.tenant()?;
        let vendor = self.get_vendor(session, vendor_name).await?;
        let payment = PaymentMade::new(vendor.id, amount, mode, date);
        payment.validate()?;
        self.repo.save_payment_made(tenant, &payment).await?;
        info!(vendor = %vendor.name, amount, "payment made");
        Ok(payment)
    }

    pub async fn list_payments_made(&self, session: &Session, vendor_name: Option<&str>) -> Result<Vec<PaymentMade>, AppError> {
        let tenant = session.tenant()?;
        let vendor_id = match vendor_name {
            Some(name) => Some(self.get_vendor(session, name).await?.id),
            None => None,
        };
        Ok(self.repo.list_payments_made(tenant, vendor_id).await?)
    }

    pub async fn delete_payment_made(&self, session: &Session, id: PaymentId) -> Result<(), AppError> {
        if !self.repo.delete_payment_made(session.tenant()?, id).await? {
            return Err(AppError::RecordNotFound {
                kind: "Payment",
                id: id.to_string(),
            });
        }
        info!(%id, "vendor payment deleted");
        Ok(())
    }

    // ========================
    // Reports
    // ========================

    /// Read every record of the tenant. Aggregates are always recomputed from this.
    pub async fn snapshot(&self, session: &Session) -> Result<BooksSnapshot, AppError> {
        let tenant = session.tenant()?;
        let snapshot = BooksSnapshot {
            customers: self.repo.list_customers(tenant).await?,
            vendors: self.repo.list_vendors(tenant).await?,
            sales: self.repo.list_sales(tenant, None).await?,
            purchases: self.repo.list_purchases(tenant, None).await?,
            payments: self.repo.list_payments(tenant, None).await?,
            payments_made: self.repo.list_payments_made(tenant, None).await?,
        };
        debug!(
            sales = snapshot.sales.len(),
            purchases = snapshot.purchases.len(),
            payments = snapshot.payments.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    pub async fn customer_balances(&self, session: &Session) -> Result<Vec<CounterpartyBalance>, AppError> {
        Ok(self.snapshot(session).await?.customer_balances())
    }

    pub async fn vendor_balances(&self, session: &Session) -> Result<Vec<CounterpartyBalance>, AppError> {
        Ok(self.snapshot(session).await?.vendor_balances())
    }

    pub async fn dashboard(
        &self,
        session: &Session,
        window: SeriesWindow,
        now: DateTime<Utc>,
        activity_limit: usize,
    ) -> Result<Dashboard, AppError> {
        Ok(self.snapshot(session).await?.dashboard(window, now, activity_limit))
    }

    /// Sales against payments received or purchases, bucketed by `window`.
    pub async fn trend(
        &self,
        session: &Session,
        window: SeriesWindow,
        now: DateTime<Utc>,
        against: TrendAgainst,
    ) -> Result<Vec<SeriesBucket>, AppError> {
        let tenant = session.tenant()?;
        let sales = self.repo.list_sales(tenant, None).await?;
        Ok(match against {
            TrendAgainst::Payments => {
                let payments = self.repo.list_payments(tenant, None).await?;
                build_series(window, now, &sales, &payments)
            }
            TrendAgainst::Purchases => {
                let purchases = self.repo.list_purchases(tenant, None).await?;
                build_series(window, now, &sales, &purchases)
            }
        })
    }
}

/// Outcome of loading a snapshot into the books
#[derive(Debug, Clone, Default)]
pub struct RestoreSummary {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl LedgerService {
    /// Load records from a snapshot. Counterparties are matched by name, so
    /// records pointing at a counterparty that already exists attach to it.
    /// Records already present in this tenant are skipped, which makes a
    /// repeated restore of the same snapshot a no-op. An id owned by another
    /// tenant is replaced by one derived from this tenant and the source id.
    pub async fn restore_books(&self, session: &Session, books: BooksSnapshot) -> Result<RestoreSummary, AppError> {
        let tenant = session.tenant()?;
        let mut summary = RestoreSummary::default();
        let mut customer_ids: HashMap<Uuid, Uuid> = HashMap::new();
        let mut vendor_ids: HashMap<Uuid, Uuid> = HashMap::new();
        let mut sale_ids: HashMap<Uuid, Uuid> = HashMap::new();

        for mut customer in books.customers {
            if let Some(existing) = self.repo.get_customer_by_name(tenant, &customer.name).await? {
                customer_ids.insert(customer.id, existing.id);
                summary.skipped += 1;
                continue;
            }
            match self.place(tenant, RecordTable::Customers, customer.id).await? {
                Placement::Present(id) => {
                    customer_ids.insert(customer.id, id);
                    summary.skipped += 1;
                }
                Placement::New(id) => {
                    customer_ids.insert(customer.id, id);
                    customer.id = id;
                    self.repo.save_customer(tenant, &customer).await?;
                    summary.imported += 1;
                }
            }
        }
        for mut vendor in books.vendors {
            if let Some(existing) = self.repo.get_vendor_by_name(tenant, &vendor.name).await? {
                vendor_ids.insert(vendor.id, existing.id);
                summary.skipped += 1;
                continue;
            }
            match self.place(tenant, RecordTable::Vendors, vendor.id).await? {
                Placement::Present(id) => {
                    vendor_ids.insert(vendor.id, id);
                    summary.skipped += 1;
                }
                Placement::New(id) => {
                    vendor_ids.insert(vendor.id, id);
                    vendor.id = id;
                    self.repo.save_vendor(tenant, &vendor).await?;
                    summary.imported += 1;
                }
            }
        }

        for mut sale in books.sales {
            let Some(&customer_id) = customer_ids.get(&sale.customer_id) else {
                summary.errors.push(format!("sale {}: unknown customer {}", sale.id, sale.customer_id));
                continue;
            };
            match self.place(tenant, RecordTable::Sales, sale.id).await? {
                Placement::Present(id) => {
                    sale_ids.insert(sale.id, id);
                    summary.skipped += 1;
                }
                Placement::New(id) => {
                    sale_ids.insert(sale.id, id);
                    sale.id = id;
                    sale.customer_id = customer_id;
                    self.repo.save_sale(tenant, &mut sale).await?;
                    summary.imported += 1;
                }
            }
        }

        for mut purchase in books.purchases {
            let Some(&vendor_id) = vendor_ids.get(&purchase.vendor_id) else {
                summary.errors.push(format!("purchase {}: unknown vendor {}", purchase.id, purchase.vendor_id));
                continue;
            };
            match self.place(tenant, RecordTable::Purchases, purchase.id).await? {
                Placement::Present(_) => summary.skipped += 1,
                Placement::New(id) => {
                    purchase.id = id;
                    purchase.vendor_id = vendor_id;
                    self.repo.save_purchase(tenant, &purchase).await?;
                    summary.imported += 1;
                }
            }
        }

        for mut payment in books.payments {
            let Some(&customer_id) = customer_ids.get(&payment.customer_id) else {
                summary.errors.push(format!("payment {}: unknown customer {}", payment.id, payment.customer_id));
                continue;
            };
            match self.place(tenant, RecordTable::Payments, payment.id).await? {
                Placement::Present(_) => summary.skipped += 1,
                Placement::New(id) => {
                    payment.id = id;
                    payment.customer_id = customer_id;
                    if let Some(source) = payment.sale_id {
                        payment.sale_id = match sale_ids.get(&source) {
                            Some(&target) => Some(target),
                            None => self.existing_sale(tenant, id, source).await?,
                        };
                    }
                    self.repo.save_payment(tenant, &payment).await?;
                    summary.imported += 1;
                }
            }
        }

        for mut payment in books.payments_made {
            let Some(&vendor_id) = vendor_ids.get(&payment.vendor_id) else {
                summary.errors.push(format!("vendor payment {}: unknown vendor {}", payment.id, payment.vendor_id));
                continue;
            };
            match self.place(tenant, RecordTable::PaymentsMade, payment.id).await? {
                Placement::Present(_) => summary.skipped += 1,
                Placement::New(id) => {
                    payment.id = id;
                    payment.vendor_id = vendor_id;
                    self.repo.save_payment_made(tenant, &payment).await?;
                    summary.imported += 1;
                }
            }
        }

        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "snapshot restored"
        );
        Ok(summary)
    }

    /// Keep a payment's link to an invoice outside the snapshot only when
    /// that invoice is already in this tenant's books.
    async fn existing_sale(&self, tenant: &str, payment: Uuid, sale: Uuid) -> Result<Option<Uuid>, AppError> {
        if self.repo.record_tenant(RecordTable::Sales, sale).await?.as_deref() == Some(tenant) {
            return Ok(Some(sale));
        }
        warn!(%payment, %sale, "payment refers to an unknown invoice; unlinked");
        Ok(None)
    }

    /// Decide the id a restored record gets in `tenant`.
    async fn place(&self, tenant: &str, table: RecordTable, id: Uuid) -> Result<Placement, AppError> {
        let id = match self.repo.record_tenant(table, id).await? {
            None => return Ok(Placement::New(id)),
            Some(owner) if owner == tenant => return Ok(Placement::Present(id)),
            Some(_) => Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{}/{}", tenant, id).as_bytes()),
        };
        debug!(table = table.as_str(), %id, "source id belongs to another tenant; remapped");
        Ok(match self.repo.record_tenant(table, id).await? {
            Some(_) => Placement::Present(id),
            None => Placement::New(id),
        })
    }
}

enum Placement {
    /// Already in this tenant's books under this id
    Present(Uuid),
    /// Free to insert under this id
    New(Uuid),
}

fn require_name(name: String) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut errors = ValidationErrors::default();
        errors.push("name", "name is required");
        return Err(errors.into());
    }
    Ok(trimmed.to_string())
}

fn latest<T: Timestamped>(records: &[T]) -> Option<DateTime<Utc>> {
    records.iter().filter_map(Timestamped::timestamp).max()
}
