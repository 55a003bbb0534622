use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::time::Duration;
use uuid::Uuid;

use crate::application::{
    ConsoleNotifier, CounterpartyAccount, CounterpartyBalance, Dashboard, DashboardWatch, LedgerService, Notifier,
    PurchaseInput, Session, TrendAgainst,
};
use crate::domain::{
    amount_in_words, format_cents, format_inr, parse_cents, parse_timestamp, ContactInfo,
    InvoiceDraft, LineItem, PaymentMode, PurchaseStatus, SeriesBucket, SeriesWindow,
};

/// Khata - small-business books
#[derive(Parser)]
#[command(name = "khata")]
#[command(about = "Customers, vendors, invoices and payments, with balances and a sales dashboard")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "KHATA_DB", default_value = "khata.db", global = true)]
    pub database: String,

    /// Business (tenant) whose books to operate on
    #[arg(long, env = "KHATA_TENANT", default_value = "default", global = true)]
    pub tenant: String,

    /// Default log level; RUST_LOG takes precedence when set
    #[arg(long, env = "KHATA_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BalanceSideArg {
    Customers,
    Vendors,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Customer management commands
    #[command(subcommand)]
    Customer(CustomerCommands),

    /// Vendor management commands
    #[command(subcommand)]
    Vendor(VendorCommands),

    /// Sales invoices
    #[command(subcommand)]
    Invoice(InvoiceCommands),

    /// Purchases from vendors
    #[command(subcommand)]
    Purchase(PurchaseCommands),

    /// Payments received and made
    #[command(subcommand)]
    Payment(PaymentCommands),

    /// Billed, paid and pending per customer or vendor
    Balances {
        /// Which side of the books
        #[arg(value_enum, default_value = "customers")]
        side: BalanceSideArg,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// KPIs, sales trend and recent activity
    Dashboard {
        /// Window: 7d, 30d, 12m
        #[arg(short, long, default_value = "30d")]
        window: String,

        /// Number of recent transactions to show
        #[arg(long, default_value = "10")]
        activity: usize,

        /// Keep refreshing every N seconds until Ctrl-C
        #[arg(long, num_args = 0..=1, default_missing_value = "30")]
        watch: Option<u64>,

        /// Output format: table, json
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Sales trend against payments received or purchases
    Trend {
        /// Window: 7d, 30d, 12m
        #[arg(short, long, default_value = "30d")]
        window: String,

        /// Compare sales against purchases instead of payments received
        #[arg(long)]
        purchases: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: customers, vendors, sales, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import a JSON snapshot
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,
    },

    /// Print an amount with Indian grouping and in words
    Words {
        /// Amount in rupees (e.g., "1,50,000.50" or "150.5")
        amount: String,
    },
}

#[derive(clap::Args)]
pub struct ContactArgs {
    /// Phone or contact person
    #[arg(long)]
    contact: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    address: Option<String>,

    /// GSTIN or other tax registration number
    #[arg(long = "gstin")]
    tax_id: Option<String>,
}

impl From<ContactArgs> for ContactInfo {
    fn from(args: ContactArgs) -> Self {
        ContactInfo {
            contact: args.contact,
            email: args.email,
            address: args.address,
            tax_id: args.tax_id,
        }
    }
}

#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Add a customer
    Create {
        /// Customer name (must be unique)
        name: String,

        #[command(flatten)]
        contact: ContactArgs,

        /// Unit pre-filled on this customer's invoice lines (e.g., kg, pcs)
        #[arg(long)]
        unit: Option<String>,
    },

    /// List customers with their balances
    List,

    /// Show customer details and balance
    Show {
        name: String,
    },

    /// Delete a customer with no sales or payments
    Delete {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum VendorCommands {
    /// Add a vendor
    Create {
        /// Vendor name (must be unique)
        name: String,

        #[command(flatten)]
        contact: ContactArgs,
    },

    /// List vendors with their balances
    List,

    /// Show vendor details and balance
    Show {
        name: String,
    },

    /// Delete a vendor with no purchases or payments
    Delete {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum InvoiceCommands {
    /// Create an invoice
    Create {
        /// Customer name
        customer: String,

        /// Line item as name:qty:rate or name:qty:unit:rate (repeatable)
        #[arg(short, long = "item", required = true)]
        items: Vec<String>,

        /// Tax rate in percent (e.g., 18)
        #[arg(long, default_value = "0")]
        tax: f64,

        /// Transport charges (e.g., "20.00")
        #[arg(long)]
        transport: Option<String>,

        /// Amount already paid on this invoice
        #[arg(long)]
        paid: Option<String>,

        /// Invoice date (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List invoices
    List {
        /// Only this customer's invoices
        #[arg(long)]
        customer: Option<String>,
    },

    /// Print an invoice
    Show {
        number: i64,

        /// Output format: table (plain text), json
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Delete an invoice with no recorded payments
    Delete {
        number: i64,
    },
}

#[derive(Subcommand)]
pub enum PurchaseCommands {
    /// Record a purchase
    Record {
        /// Vendor name
        vendor: String,

        /// Item bought
        item: String,

        #[arg(short, long)]
        quantity: f64,

        /// Rate per unit (e.g., "125.50")
        #[arg(short, long)]
        rate: String,

        /// Mark as already paid
        #[arg(long)]
        paid: bool,

        /// Purchase date (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List purchases
    List {
        /// Only this vendor's purchases
        #[arg(long)]
        vendor: Option<String>,
    },

    /// Delete a purchase
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PaymentCommands {
    /// Record money received from a customer
    Receive {
        customer: String,

        /// Amount (e.g., "4000" or "4,000.00")
        amount: String,

        /// Mode: cash, upi, bank_transfer, cheque, card, other
        #[arg(short, long, default_value = "cash")]
        mode: String,

        /// Settle this invoice number
        #[arg(long)]
        invoice: Option<i64>,

        /// Payment date (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record money paid to a vendor
    Make {
        vendor: String,

        amount: String,

        #[arg(short, long, default_value = "cash")]
        mode: String,

        #[arg(long)]
        date: Option<String>,
    },

    /// List payments
    List {
        /// Only this customer's payments
        #[arg(long)]
        customer: Option<String>,

        /// List payments made to vendors instead
        #[arg(long)]
        made: bool,

        /// Only this vendor's payments (implies --made)
        #[arg(long)]
        vendor: Option<String>,
    },

    /// Delete a payment
    Delete {
        id: String,

        /// The id refers to a payment made to a vendor
        #[arg(long)]
        made: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let notifier = ConsoleNotifier;
        let session = Session::start(self.tenant.clone());

        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                notifier.success(&format!("Database initialized: {}", self.database));
            }

            Commands::Customer(cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_customer_command(&service, &session, &notifier, cmd).await?;
            }

            Commands::Vendor(cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_vendor_command(&service, &session, &notifier, cmd).await?;
            }

            Commands::Invoice(cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_invoice_command(&service, &session, &notifier, cmd).await?;
            }

            Commands::Purchase(cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_purchase_command(&service, &session, &notifier, cmd).await?;
            }

            Commands::Payment(cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_payment_command(&service, &session, &notifier, cmd).await?;
            }

            Commands::Balances { side, format } => {
                let service = LedgerService::connect(&self.database).await?;
                let balances = match side {
                    BalanceSideArg::Customers => service.customer_balances(&session).await?,
                    BalanceSideArg::Vendors => service.vendor_balances(&session).await?,
                };
                print_balances(&balances, format)?;
            }

            Commands::Dashboard {
                window,
                activity,
                watch,
                format,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let window = parse_window(&window)?;
                match watch {
                    Some(secs) => {
                        run_dashboard_watch(&service, &session, &notifier, window, activity, secs).await?
                    }
                    None => {
                        let dashboard = service.dashboard(&session, window, Utc::now(), activity).await?;
                        match format {
                            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dashboard)?),
                            _ => print_dashboard(&dashboard),
                        }
                    }
                }
            }

            Commands::Trend {
                window,
                purchases,
                format,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let window = parse_window(&window)?;
                let against = if purchases {
                    TrendAgainst::Purchases
                } else {
                    TrendAgainst::Payments
                };
                let series = service.trend(&session, window, Utc::now(), against).await?;
                print_series(&series, against, format)?;
            }

            Commands::Export { export_type, output } => {
                let service = LedgerService::connect(&self.database).await?;
                run_export_command(&service, &session, &export_type, output.as_deref()).await?;
            }

            Commands::Import { input, dry_run } => {
                let service = LedgerService::connect(&self.database).await?;
                run_import_command(&service, &session, input.as_deref(), dry_run).await?;
            }

            Commands::Words { amount } => {
                let cents = parse_cents(&amount).context("Invalid amount format. Use '150.50' or '1,50,000'")?;
                println!("{}", format_inr(cents));
                println!("{}", amount_in_words(cents));
            }
        }

        Ok(())
    }
}

async fn run_customer_command(
    service: &LedgerService,
    session: &Session,
    notifier: &dyn Notifier,
    cmd: CustomerCommands,
) -> Result<()> {
    match cmd {
        CustomerCommands::Create { name, contact, unit } => {
            let customer = service.create_customer(session, name, contact.into(), unit).await?;
            notifier.success(&format!("Created customer: {}", customer.name));
        }

        CustomerCommands::List => {
            let balances = service.customer_balances(session).await?;
            if balances.is_empty() {
                println!("No customers found.");
            } else {
                print_balances(&balances, OutputFormat::Table)?;
            }
        }

        CustomerCommands::Show { name } => {
            let customer = service.get_customer(session, &name).await?;
            let account = service.customer_account(session, &name).await?;

            println!("Customer: {}", customer.name);
            println!("  ID:             {}", customer.id);
            print_contact(&customer.info);
            if let Some(unit) = &customer.preferred_unit {
                println!("  Default unit:   {}", unit);
            }
            println!("  Created:        {}", customer.created_at.format("%Y-%m-%d %H:%M:%S"));
            println!();
            print_account(&account, "Billed", "Received");
        }

        CustomerCommands::Delete { name } => {
            let customer = service.delete_customer(session, &name).await?;
            notifier.success(&format!("Deleted customer: {}", customer.name));
        }
    }
    Ok(())
}

async fn run_vendor_command(
    service: &LedgerService,
    session: &Session,
    notifier: &dyn Notifier,
    cmd: VendorCommands,
) -> Result<()> {
    match cmd {
        VendorCommands::Create { name, contact } => {
            let vendor = service.create_vendor(session, name, contact.into()).await?;
            notifier.success(&format!("Created vendor: {}", vendor.name));
        }

        VendorCommands::List => {
            let balances = service.vendor_balances(session).await?;
            if balances.is_empty() {
                println!("No vendors found.");
            } else {
                print_balances(&balances, OutputFormat::Table)?;
            }
        }

        VendorCommands::Show { name } => {
            let vendor = service.get_vendor(session, &name).await?;
            let account = service.vendor_account(session, &name).await?;

            println!("Vendor: {}", vendor.name);
            println!("  ID:             {}", vendor.id);
            print_contact(&vendor.info);
            println!("  Created:        {}", vendor.created_at.format("%Y-%m-%d %H:%M:%S"));
            println!();
            print_account(&account, "Purchased", "Paid out");
        }

        VendorCommands::Delete { name } => {
            let vendor = service.delete_vendor(session, &name).await?;
            notifier.success(&format!("Deleted vendor: {}", vendor.name));
        }
    }
    Ok(())
}

async fn run_invoice_command(
    service: &LedgerService,
    session: &Session,
    notifier: &dyn Notifier,
    cmd: InvoiceCommands,
) -> Result<()> {
    match cmd {
        InvoiceCommands::Create {
            customer,
            items,
            tax,
            transport,
            paid,
            date,
        } => {
            let customer = service.get_customer(session, &customer).await?;
            let mut draft = InvoiceDraft::new(Some(customer.id))
                .with_tax_rate(tax)
                .with_transport(parse_optional_amount(transport.as_deref(), "transport")?)
                .with_paid_amount(parse_optional_amount(paid.as_deref(), "paid")?);
            for spec in &items {
                draft = draft.with_item(parse_item(spec, customer.preferred_unit.as_deref())?);
            }
            let created_at = parse_date_or_now(date.as_deref())?;

            let sale = service.create_invoice(session, &draft, created_at).await?;
            notifier.success(&format!(
                "Created invoice #{} for {}: {} ({})",
                sale.invoice_number,
                customer.name,
                format_inr(sale.total_amount),
                sale.status
            ));
        }

        InvoiceCommands::List { customer } => {
            let sales = service.list_sales(session, customer.as_deref()).await?;
            if sales.is_empty() {
                println!("No invoices found.");
                return Ok(());
            }
            let names = customer_names(service, session).await?;

            println!(
                "{:>6} {:<12} {:<20} {:>15} {:>15} {:<8}",
                "NO", "DATE", "CUSTOMER", "TOTAL", "PAID", "STATUS"
            );
            println!("{}", "-".repeat(81));
            for sale in &sales {
                println!(
                    "{:>6} {:<12} {:<20} {:>15} {:>15} {:<8}",
                    sale.invoice_number,
                    format_date(sale.created_at),
                    truncate(names.get(&sale.customer_id).map(String::as_str).unwrap_or("?"), 20),
                    format_inr(sale.total_amount),
                    format_inr(sale.paid_amount),
                    sale.status
                );
            }
        }

        InvoiceCommands::Show { number, format, output } => {
            use crate::io::InvoiceDocument;

            let (sale, customer) = service.get_invoice_with_customer(session, number).await?;
            let document = InvoiceDocument::new(&sale, &customer);
            let rendered = match format {
                OutputFormat::Json => document.to_json()?,
                _ => document.render_text(),
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write invoice to {}", path))?;
                    notifier.success(&format!("Wrote invoice #{} to {}", number, path));
                }
                None => print!("{}", rendered),
            }
        }

        InvoiceCommands::Delete { number } => {
            service.delete_invoice(session, number).await?;
            notifier.success(&format!("Deleted invoice #{}", number));
        }
    }
    Ok(())
}

async fn run_purchase_command(
    service: &LedgerService,
    session: &Session,
    notifier: &dyn Notifier,
    cmd: PurchaseCommands,
) -> Result<()> {
    match cmd {
        PurchaseCommands::Record {
            vendor,
            item,
            quantity,
            rate,
            paid,
            date,
        } => {
            let rate = parse_cents(&rate).context("Invalid rate format. Use '125.50' or '125'")?;
            let input = PurchaseInput {
                vendor_name: vendor,
                item,
                quantity,
                rate,
                status: if paid {
                    PurchaseStatus::Paid
                } else {
                    PurchaseStatus::Unpaid
                },
                date: parse_date_or_now(date.as_deref())?,
            };
            let purchase = service.record_purchase(session, input).await?;
            notifier.success(&format!(
                "Recorded purchase: {} x {} = {} ({})",
                purchase.quantity,
                purchase.item,
                format_inr(purchase.total_amount),
                purchase.id
            ));
        }

        PurchaseCommands::List { vendor } => {
            let purchases = service.list_purchases(session, vendor.as_deref()).await?;
            if purchases.is_empty() {
                println!("No purchases found.");
                return Ok(());
            }
            let names = vendor_names(service, session).await?;

            println!(
                "{:<12} {:<20} {:<20} {:>10} {:>15} {:<7} {:<36}",
                "DATE", "VENDOR", "ITEM", "QTY", "TOTAL", "STATUS", "ID"
            );
            println!("{}", "-".repeat(126));
            for p in &purchases {
                println!(
                    "{:<12} {:<20} {:<20} {:>10} {:>15} {:<7} {:<36}",
                    format_date(p.date),
                    truncate(names.get(&p.vendor_id).map(String::as_str).unwrap_or("?"), 20),
                    truncate(&p.item, 20),
                    p.quantity,
                    format_inr(p.total_amount),
                    p.status,
                    p.id
                );
            }
        }

        PurchaseCommands::Delete { id } => {
            let id = Uuid::parse_str(&id).context("Invalid purchase ID format (expected UUID)")?;
            service.delete_purchase(session, id).await?;
            notifier.success(&format!("Deleted purchase {}", id));
        }
    }
    Ok(())
}

async fn run_payment_command(
    service: &LedgerService,
    session: &Session,
    notifier: &dyn Notifier,
    cmd: PaymentCommands,
) -> Result<()> {
    match cmd {
        PaymentCommands::Receive {
            customer,
            amount,
            mode,
            invoice,
            date,
        } => {
            let amount = parse_cents(&amount).context("Invalid amount format. Use '4000' or '4,000.00'")?;
            let result = service
                .receive_payment(
                    session,
                    &customer,
                    amount,
                    PaymentMode::parse_lenient(&mode),
                    parse_date_or_now(date.as_deref())?,
                    invoice,
                )
                .await?;

            notifier.success(&format!(
                "Received {} from {} by {} ({})",
                format_inr(result.payment.amount_paid),
                result.customer_name,
                result.payment.mode,
                result.payment.id
            ));
            if let Some(sale) = result.invoice {
                notifier.success(&format!(
                    "Invoice #{} is now {} ({} due)",
                    sale.invoice_number,
                    sale.status,
                    format_inr(sale.balance_due())
                ));
            }
        }

        PaymentCommands::Make {
            vendor,
            amount,
            mode,
            date,
        } => {
            let amount = parse_cents(&amount).context("Invalid amount format. Use '4000' or '4,000.00'")?;
            let payment = service
                .pay_vendor(
                    session,
                    &vendor,
                    amount,
                    PaymentMode::parse_lenient(&mode),
                    parse_date_or_now(date.as_deref())?,
                )
                .await?;
            notifier.success(&format!(
                "Paid {} to {} by {} ({})",
                format_inr(payment.amount),
                vendor,
                payment.mode,
                payment.id
            ));
        }

        PaymentCommands::List { customer, made, vendor } => {
            println!(
                "{:<12} {:<20} {:>15} {:<14} {:<36}",
                "DATE", "PARTY", "AMOUNT", "MODE", "ID"
            );
            println!("{}", "-".repeat(100));

            if made || vendor.is_some() {
                let names = vendor_names(service, session).await?;
                for p in service.list_payments_made(session, vendor.as_deref()).await? {
                    println!(
                        "{:<12} {:<20} {:>15} {:<14} {:<36}",
                        format_date(p.date),
                        truncate(names.get(&p.vendor_id).map(String::as_str).unwrap_or("?"), 20),
                        format_inr(p.amount),
                        p.mode,
                        p.id
                    );
                }
            } else {
                let names = customer_names(service, session).await?;
                for p in service.list_payments(session, customer.as_deref()).await? {
                    println!(
                        "{:<12} {:<20} {:>15} {:<14} {:<36}",
                        format_date(p.payment_date),
                        truncate(names.get(&p.customer_id).map(String::as_str).unwrap_or("?"), 20),
                        format_inr(p.amount_paid),
                        p.mode,
                        p.id
                    );
                }
            }
        }

        PaymentCommands::Delete { id, made } => {
            let id = Uuid::parse_str(&id).context("Invalid payment ID format (expected UUID)")?;
            if made {
                service.delete_payment_made(session, id).await?;
            } else {
                service.delete_payment(session, id).await?;
            }
            notifier.success(&format!("Deleted payment {}", id));
        }
    }
    Ok(())
}

/// Refresh on a fixed interval until Ctrl-C. A failed refresh is reported
/// and the last good dashboard stays on screen.
async fn run_dashboard_watch(
    service: &LedgerService,
    session: &Session,
    notifier: &dyn Notifier,
    window: SeriesWindow,
    activity: usize,
    secs: u64,
) -> Result<()> {
    let secs = secs.max(1);
    let mut watch = DashboardWatch::new(window, activity);
    watch
        .run(service, session, notifier, Duration::from_secs(secs), tokio::signal::ctrl_c(), |dashboard| {
            // Clear the screen and home the cursor
            print!("\x1B[2J\x1B[H");
            print_dashboard(dashboard);
            println!();
            println!("Refreshing every {}s. Press Ctrl-C to stop.", secs);
        })
        .await;
    println!();
    if let Some(last) = watch.last() {
        println!("Last refreshed at {}", last.generated_at.format("%H:%M:%S"));
    }
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    session: &Session,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service, session);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "customers" => {
            let count = exporter.export_customer_balances_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} customer balances", count);
            }
        }
        "vendors" => {
            let count = exporter.export_vendor_balances_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} vendor balances", count);
            }
        }
        "sales" => {
            let count = exporter.export_sales_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} invoices", count);
            }
        }
        "full" => {
            let export = exporter.export_full_json(writer).await?;
            if output.is_some() {
                let books = &export.books;
                eprintln!(
                    "Exported {} customers, {} vendors, {} invoices, {} purchases, {} payments received, {} payments made",
                    books.customers.len(),
                    books.vendors.len(),
                    books.sales.len(),
                    books.purchases.len(),
                    books.payments.len(),
                    books.payments_made.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: customers, vendors, sales, full",
                export_type
            );
        }
    }

    Ok(())
}

async fn run_import_command(
    service: &LedgerService,
    session: &Session,
    input: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{stdin, Read};

    let importer = Importer::new(service, session);

    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let result = importer.import_full_json(reader, ImportOptions { dry_run }).await?;

    if dry_run {
        println!("Dry run: nothing was written");
    } else {
        println!("Import complete");
    }
    println!("  Imported: {}", result.imported);
    println!("  Skipped:  {}", result.skipped);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!("  {}", error);
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

fn print_balances(balances: &[CounterpartyBalance], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(balances)?);
        }
        OutputFormat::Csv => {
            crate::io::write_balances_csv(std::io::stdout(), balances)?;
        }
        OutputFormat::Table => {
            println!("{:<24} {:>16} {:>16} {:>16}", "NAME", "BILLED", "PAID", "PENDING");
            println!("{}", "-".repeat(75));
            let mut pending_total = 0;
            for b in balances {
                println!(
                    "{:<24} {:>16} {:>16} {:>16}",
                    truncate(&b.name, 24),
                    format_inr(b.summary.total_billed),
                    format_inr(b.summary.total_paid),
                    format_inr(b.summary.pending)
                );
                pending_total += b.summary.pending;
            }
            println!("{}", "-".repeat(75));
            println!("{:<24} {:>50}", "TOTAL PENDING", format_inr(pending_total));
        }
    }
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    let k = &dashboard.kpis;

    println!("Dashboard ({}), {}", dashboard.window, dashboard.generated_at.format("%Y-%m-%d %H:%M UTC"));
    println!();
    println!("  Sales:          {:>18}   in window {:>18}", format_inr(k.total_sales), format_inr(k.window_sales));
    println!("  Received:       {:>18}   in window {:>18}", format_inr(k.total_received), format_inr(k.window_received));
    println!("  Receivables:    {:>18}", format_inr(k.receivables));
    println!("  Purchases:      {:>18}", format_inr(k.total_purchases));
    println!("  Paid out:       {:>18}", format_inr(k.total_paid_out));
    println!("  Payables:       {:>18}", format_inr(k.payables));
    println!(
        "  Customers: {}   Vendors: {}   Invoices: {} ({} open)",
        k.customer_count, k.vendor_count, k.invoice_count, k.open_invoice_count
    );
    println!();

    println!("{:<10} {:>16} {:>16}", "PERIOD", "SALES", "RECEIVED");
    println!("{}", "-".repeat(44));
    for bucket in &dashboard.series {
        println!(
            "{:<10} {:>16} {:>16}",
            bucket.label,
            format_inr(bucket.sales_total),
            format_inr(bucket.payments_total)
        );
    }

    if !dashboard.recent_activity.is_empty() {
        println!();
        println!("Recent activity");
        for entry in &dashboard.recent_activity {
            println!(
                "  {:<12} {:<17} {:<20} {:>16}  {}",
                format_date(entry.timestamp),
                entry.kind.as_str(),
                truncate(&entry.counterparty, 20),
                format_inr(entry.amount),
                entry.reference
            );
        }
    }
}

fn print_series(series: &[SeriesBucket], against: TrendAgainst, format: OutputFormat) -> Result<()> {
    let other = match against {
        TrendAgainst::Payments => "received",
        TrendAgainst::Purchases => "purchases",
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(series)?),
        OutputFormat::Csv => {
            println!("period,period_start,sales,{}", other);
            for b in series {
                println!(
                    "{},{},{},{}",
                    b.label,
                    b.period_start.to_rfc3339(),
                    format_cents(b.sales_total),
                    format_cents(b.payments_total)
                );
            }
        }
        OutputFormat::Table => {
            println!("{:<10} {:>16} {:>16}", "PERIOD", "SALES", other.to_uppercase());
            println!("{}", "-".repeat(44));
            for b in series {
                println!(
                    "{:<10} {:>16} {:>16}",
                    b.label,
                    format_inr(b.sales_total),
                    format_inr(b.payments_total)
                );
            }
        }
    }
    Ok(())
}

fn print_contact(info: &ContactInfo) {
    if let Some(contact) = &info.contact {
        println!("  Contact:        {}", contact);
    }
    if let Some(email) = &info.email {
        println!("  Email:          {}", email);
    }
    if let Some(address) = &info.address {
        println!("  Address:        {}", address);
    }
    if let Some(tax_id) = &info.tax_id {
        println!("  GSTIN:          {}", tax_id);
    }
}

fn print_account(account: &CounterpartyAccount, billed_label: &str, paid_label: &str) {
    let summary = &account.balance.summary;
    println!("  {:<16}{}", format!("{}:", billed_label), format_inr(summary.total_billed));
    println!("  {:<16}{}", format!("{}:", paid_label), format_inr(summary.total_paid));
    println!("  {:<16}{}", "Pending:", format_inr(summary.pending));
    println!("  {:<16}{}", "Records:", account.dependents);
    if let Some(last) = account.last_activity {
        println!("  {:<16}{}", "Last activity:", last.format("%Y-%m-%d %H:%M:%S"));
    }
}

async fn customer_names(
    service: &LedgerService,
    session: &Session,
) -> Result<std::collections::HashMap<Uuid, String>> {
    Ok(service
        .list_customers(session)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

async fn vendor_names(
    service: &LedgerService,
    session: &Session,
) -> Result<std::collections::HashMap<Uuid, String>> {
    Ok(service
        .list_vendors(session)
        .await?
        .into_iter()
        .map(|v| (v.id, v.name))
        .collect())
}

/// Parse `name:qty:rate` or `name:qty:unit:rate`. An empty or missing unit
/// falls back to `default_unit`.
fn parse_item(spec: &str, default_unit: Option<&str>) -> Result<LineItem> {
    let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
    let (name, quantity, unit, rate) = match parts.as_slice() {
        [name, quantity, rate] => (*name, *quantity, None, *rate),
        [name, quantity, unit, rate] => (*name, *quantity, Some(*unit).filter(|u| !u.is_empty()), *rate),
        _ => anyhow::bail!("Invalid item '{}'. Use name:qty:rate or name:qty:unit:rate", spec),
    };

    let quantity: f64 = quantity
        .parse()
        .with_context(|| format!("Invalid quantity '{}' in item '{}'", quantity, spec))?;
    let rate = parse_cents(rate).with_context(|| format!("Invalid rate '{}' in item '{}'", rate, spec))?;
    let unit = unit.or(default_unit).map(str::to_string);

    Ok(LineItem::new(name, quantity, unit, rate))
}

fn parse_optional_amount(raw: Option<&str>, what: &str) -> Result<i64> {
    match raw {
        Some(raw) => parse_cents(raw).with_context(|| format!("Invalid {} amount '{}'", what, raw)),
        None => Ok(0),
    }
}

fn parse_window(raw: &str) -> Result<SeriesWindow> {
    SeriesWindow::from_str(raw)
        .ok_or_else(|| anyhow::anyhow!("Invalid window '{}'. Valid windows: 7d, 30d, 12m", raw))
}

fn parse_date_or_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(date_str) => parse_timestamp(date_str)
            .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str)),
        None => Ok(Utc::now()),
    }
}

fn format_date(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_with_and_without_unit() {
        let item = parse_item("Cement:10:bag:250", None).unwrap();
        assert_eq!(item.name, "Cement");
        assert_eq!(item.quantity(), 10.0);
        assert_eq!(item.unit.as_deref(), Some("bag"));
        assert_eq!(item.rate(), 25_000);
        assert_eq!(item.amount(), 250_000);

        let item = parse_item("Sand:2.5:40.00", Some("kg")).unwrap();
        assert_eq!(item.unit.as_deref(), Some("kg"));
        assert_eq!(item.amount(), 10_000);

        let item = parse_item("Bricks:100::8", Some("pcs")).unwrap();
        assert_eq!(item.unit.as_deref(), Some("pcs"));
    }

    #[test]
    fn test_parse_item_rejects_malformed() {
        assert!(parse_item("Cement", None).is_err());
        assert!(parse_item("Cement:ten:250", None).is_err());
        assert!(parse_item("Cement:10:bag:abc", None).is_err());
    }

    #[test]
    fn test_parse_window() {
        assert_eq!(parse_window("7d").unwrap(), SeriesWindow::Last7Days);
        assert_eq!(parse_window("12m").unwrap(), SeriesWindow::Last12Months);
        assert!(parse_window("1y").is_err());
    }

    #[test]
    fn test_cli_parses_global_options() {
        let cli = Cli::try_parse_from([
            "khata", "--database", "shop.db", "--tenant", "acme", "balances", "vendors", "--format", "csv",
        ])
        .unwrap();
        assert_eq!(cli.database, "shop.db");
        assert_eq!(cli.tenant, "acme");
        assert!(matches!(
            cli.command,
            Commands::Balances {
                side: BalanceSideArg::Vendors,
                format: OutputFormat::Csv
            }
        ));
    }

    #[test]
    fn test_dashboard_watch_defaults_to_thirty_seconds() {
        let cli = Cli::try_parse_from(["khata", "dashboard", "--watch"]).unwrap();
        match cli.command {
            Commands::Dashboard { watch, .. } => assert_eq!(watch, Some(30)),
            _ => panic!("expected dashboard"),
        }
    }
}
