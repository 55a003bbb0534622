// Application layer: session-scoped use cases over the repository,
// plus the reports and notifications the front ends consume.

pub mod error;
pub mod notify;
pub mod reporting;
pub mod service;
pub mod session;
pub mod watch;

pub use error::*;
pub use notify::*;
pub use reporting::*;
pub use service::*;
pub use session::*;
pub use watch::*;
