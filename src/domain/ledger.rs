use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, Payment, PaymentMade, Purchase, Sale};

/// A record that contributes a monetary amount to a balance.
pub trait Amounted {
    fn amount(&self) -> Cents;
}

/// A record that can be placed on a timeline. `None` means the timestamp is unknown.
pub trait Timestamped {
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

/// A record that belongs to exactly one counterparty.
pub trait Attributed {
    fn counterparty_id(&self) -> Uuid;
}

impl Amounted for Cents {
    fn amount(&self) -> Cents {
        *self
    }
}

impl Amounted for Sale {
    fn amount(&self) -> Cents {
        self.total_amount
    }
}

impl Timestamped for Sale {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl Attributed for Sale {
    fn counterparty_id(&self) -> Uuid {
        self.customer_id
    }
}

impl Amounted for Purchase {
    fn amount(&self) -> Cents {
        self.total_amount
    }
}

impl Timestamped for Purchase {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}

impl Attributed for Purchase {
    fn counterparty_id(&self) -> Uuid {
        self.vendor_id
    }
}

impl Amounted for Payment {
    fn amount(&self) -> Cents {
        self.amount_paid
    }
}

impl Timestamped for Payment {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.payment_date
    }
}

impl Attributed for Payment {
    fn counterparty_id(&self) -> Uuid {
        self.customer_id
    }
}

impl Amounted for PaymentMade {
    fn amount(&self) -> Cents {
        self.amount
    }
}

impl Timestamped for PaymentMade {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}

impl Attributed for PaymentMade {
    fn counterparty_id(&self) -> Uuid {
        self.vendor_id
    }
}

/// Which way money is owed. Receivables (customers owe us) are clamped at
/// zero; payables (we owe vendors) are reported as-is, so an overpaid vendor
/// shows a negative pending amount. The two sides intentionally differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceSide {
    Receivable,
    Payable,
}

impl BalanceSide {
    pub fn pending(&self, billed: Cents, paid: Cents) -> Cents {
        let outstanding = billed - paid;
        match self {
            BalanceSide::Receivable => outstanding.max(0),
            BalanceSide::Payable => outstanding,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub total_billed: Cents,
    pub total_paid: Cents,
    pub pending: Cents,
}

/// Reduce one counterparty's billed records and payments to a summary.
/// Both slices must already be filtered to that counterparty.
pub fn summarize_balance<B, P>(side: BalanceSide, billed: &[B], payments: &[P]) -> BalanceSummary
where
    B: Amounted,
    P: Amounted,
{
    let total_billed: Cents = billed.iter().map(Amounted::amount).sum();
    let total_paid: Cents = payments.iter().map(Amounted::amount).sum();
    BalanceSummary {
        total_billed,
        total_paid,
        pending: side.pending(total_billed, total_paid),
    }
}

/// Summaries for every counterparty that appears in either slice, in one pass.
/// Counterparties with no records at all are absent (their summary is all zero).
pub fn summarize_by_counterparty<B, P>(
    side: BalanceSide,
    billed: &[B],
    payments: &[P],
) -> HashMap<Uuid, BalanceSummary>
where
    B: Amounted + Attributed,
    P: Amounted + Attributed,
{
    let mut summaries: HashMap<Uuid, BalanceSummary> = HashMap::new();

    for record in billed {
        summaries.entry(record.counterparty_id()).or_default().total_billed += record.amount();
    }
    for record in payments {
        summaries.entry(record.counterparty_id()).or_default().total_paid += record.amount();
    }
    for summary in summaries.values_mut() {
        summary.pending = side.pending(summary.total_billed, summary.total_paid);
    }

    summaries
}
