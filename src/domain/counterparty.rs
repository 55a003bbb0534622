use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CustomerId = Uuid;
pub type VendorId = Uuid;

/// Which side of the books a counterparty sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterpartyKind {
    /// Buys from the business; generates receivables
    Customer,
    /// Sells to the business; generates payables
    Vendor,
}

impl CounterpartyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterpartyKind::Customer => "customer",
            CounterpartyKind::Vendor => "vendor",
        }
    }
}

impl std::fmt::Display for CounterpartyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contact details shared by customers and vendors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// GSTIN or other tax registration number
    pub tax_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    #[serde(flatten)]
    pub info: ContactInfo,
    /// Unit pre-filled on new invoice lines for this customer (e.g. "kg", "pcs")
    pub preferred_unit: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            info: ContactInfo::default(),
            preferred_unit: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_info(mut self, info: ContactInfo) -> Self {
        self.info = info;
        self
    }

    pub fn with_preferred_unit(mut self, unit: impl Into<String>) -> Self {
        self.preferred_unit = Some(unit.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    #[serde(flatten)]
    pub info: ContactInfo,
    pub created_at: DateTime<Utc>,
}

impl Vendor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            info: ContactInfo::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_info(mut self, info: ContactInfo) -> Self {
        self.info = info;
        self
    }
}

/// Financial records that still point at a counterparty.
/// A counterparty can only be deleted when all counts are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentCounts {
    pub sales: i64,
    pub purchases: i64,
    pub payments: i64,
}

impl DependentCounts {
    pub fn is_empty(&self) -> bool {
        self.sales == 0 && self.purchases == 0 && self.payments == 0
    }

    pub fn total(&self) -> i64 {
        self.sales + self.purchases + self.payments
    }
}

impl std::fmt::Display for DependentCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.sales > 0 {
            parts.push(format!("{} sale(s)", self.sales));
        }
        if self.purchases > 0 {
            parts.push(format!("{} purchase(s)", self.purchases));
        }
        if self.payments > 0 {
            parts.push(format!("{} payment(s)", self.payments));
        }
        if parts.is_empty() {
            write!(f, "no dependent records")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}
