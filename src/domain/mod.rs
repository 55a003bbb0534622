mod counterparty;
mod invoice;
mod ledger;
mod money;
mod payment;
mod purchase;
mod sale;
mod series;
mod words;

pub use counterparty::*;
pub use invoice::*;
pub use ledger::*;
pub use money::*;
pub use payment::*;
pub use purchase::*;
pub use sale::*;
pub use series::*;
pub use words::*;
