// Import/export and printable documents.

pub mod document;
pub mod export;
pub mod import;

pub use document::*;
pub use export::*;
pub use import::*;
