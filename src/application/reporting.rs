use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    build_series, sum_in_range, summarize_by_counterparty, BalanceSide, BalanceSummary, Cents,
    CounterpartyKind, Customer, DependentCounts, Payment, PaymentMade, Purchase, Sale, SaleStatus,
    SeriesBucket, SeriesWindow, Vendor,
};

/// Balance line for one customer or vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartyBalance {
    pub id: Uuid,
    pub name: String,
    pub kind: CounterpartyKind,
    #[serde(flatten)]
    pub summary: BalanceSummary,
}

/// Detail view of a counterparty: balance, what references it, when it last moved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartyAccount {
    pub balance: CounterpartyBalance,
    pub dependents: DependentCounts,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Headline numbers. Receivables sum each customer's clamped pending;
/// payables sum each vendor's pending as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_sales: Cents,
    pub total_received: Cents,
    pub receivables: Cents,
    pub total_purchases: Cents,
    pub total_paid_out: Cents,
    pub payables: Cents,
    pub window_sales: Cents,
    pub window_received: Cents,
    pub customer_count: usize,
    pub vendor_count: usize,
    pub invoice_count: usize,
    pub open_invoice_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Sale,
    Purchase,
    PaymentReceived,
    PaymentMade,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Sale => "sale",
            ActivityKind::Purchase => "purchase",
            ActivityKind::PaymentReceived => "payment received",
            ActivityKind::PaymentMade => "payment made",
        }
    }
}

/// One row of the recent-activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub kind: ActivityKind,
    pub counterparty: String,
    pub amount: Cents,
    pub timestamp: Option<DateTime<Utc>>,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub window: SeriesWindow,
    pub generated_at: DateTime<Utc>,
    pub kpis: Kpis,
    pub series: Vec<SeriesBucket>,
    pub recent_activity: Vec<ActivityEntry>,
}

/// Everything the dashboard is computed from, read in one pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BooksSnapshot {
    pub customers: Vec<Customer>,
    pub vendors: Vec<Vendor>,
    pub sales: Vec<Sale>,
    pub purchases: Vec<Purchase>,
    pub payments: Vec<Payment>,
    pub payments_made: Vec<PaymentMade>,
}

impl BooksSnapshot {
    /// Balance lines for every customer, zero-filled for customers with no activity.
    pub fn customer_balances(&self) -> Vec<CounterpartyBalance> {
        let summaries = summarize_by_counterparty(BalanceSide::Receivable, &self.sales, &self.payments);
        self.customers
            .iter()
            .map(|c| CounterpartyBalance {
                id: c.id,
                name: c.name.clone(),
                kind: CounterpartyKind::Customer,
                summary: summaries.get(&c.id).copied().unwrap_or_default(),
            })
            .collect()
    }

    /// Balance lines for every vendor, zero-filled for vendors with no activity.
    pub fn vendor_balances(&self) -> Vec<CounterpartyBalance> {
        let summaries = summarize_by_counterparty(BalanceSide::Payable, &self.purchases, &self.payments_made);
        self.vendors
            .iter()
            .map(|v| CounterpartyBalance {
                id: v.id,
                name: v.name.clone(),
                kind: CounterpartyKind::Vendor,
                summary: summaries.get(&v.id).copied().unwrap_or_default(),
            })
            .collect()
    }

    pub fn kpis(&self, window: SeriesWindow, now: DateTime<Utc>) -> Kpis {
        let (start, end) = window.bounds(now);
        Kpis {
            total_sales: self.sales.iter().map(|s| s.total_amount).sum(),
            total_received: self.payments.iter().map(|p| p.amount_paid).sum(),
            receivables: self.customer_balances().iter().map(|b| b.summary.pending).sum(),
            total_purchases: self.purchases.iter().map(|p| p.total_amount).sum(),
            total_paid_out: self.payments_made.iter().map(|p| p.amount).sum(),
            payables: self.vendor_balances().iter().map(|b| b.summary.pending).sum(),
            window_sales: sum_in_range(&self.sales, start, end),
            window_received: sum_in_range(&self.payments, start, end),
            customer_count: self.customers.len(),
            vendor_count: self.vendors.len(),
            invoice_count: self.sales.len(),
            open_invoice_count: self
                .sales
                .iter()
                .filter(|s| s.status != SaleStatus::Paid)
                .count(),
        }
    }

    /// Latest transactions of every kind, newest first. Entries with an
    /// unknown timestamp sort last.
    pub fn recent_activity(&self, limit: usize) -> Vec<ActivityEntry> {
        let customer_names: HashMap<Uuid, &str> =
            self.customers.iter().map(|c| (c.id, c.name.as_str())).collect();
        let vendor_names: HashMap<Uuid, &str> =
            self.vendors.iter().map(|v| (v.id, v.name.as_str())).collect();
        let name_of = |names: &HashMap<Uuid, &str>, id: &Uuid| {
            names.get(id).copied().unwrap_or("?").to_string()
        };

        let mut entries: Vec<ActivityEntry> = Vec::new();
        entries.extend(self.sales.iter().map(|s| ActivityEntry {
            kind: ActivityKind::Sale,
            counterparty: name_of(&customer_names, &s.customer_id),
            amount: s.total_amount,
            timestamp: s.created_at,
            reference: format!("Invoice #{}", s.invoice_number),
        }));
        entries.extend(self.purchases.iter().map(|p| ActivityEntry {
            kind: ActivityKind::Purchase,
            counterparty: name_of(&vendor_names, &p.vendor_id),
            amount: p.total_amount,
            timestamp: p.date,
            reference: p.item.clone(),
        }));
        entries.extend(self.payments.iter().map(|p| ActivityEntry {
            kind: ActivityKind::PaymentReceived,
            counterparty: name_of(&customer_names, &p.customer_id),
            amount: p.amount_paid,
            timestamp: p.payment_date,
            reference: p.mode.to_string(),
        }));
        entries.extend(self.payments_made.iter().map(|p| ActivityEntry {
            kind: ActivityKind::PaymentMade,
            counterparty: name_of(&vendor_names, &p.vendor_id),
            amount: p.amount,
            timestamp: p.date,
            reference: p.mode.to_string(),
        }));

        // Option orders None before Some, so reversing puts newest first and unknown last
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        entries
    }

    pub fn dashboard(&self, window: SeriesWindow, now: DateTime<Utc>, activity_limit: usize) -> Dashboard {
        Dashboard {
            window,
            generated_at: now,
            kpis: self.kpis(window, now),
            series: build_series(window, now, &self.sales, &self.payments),
            recent_activity: self.recent_activity(activity_limit),
        }
    }
}
