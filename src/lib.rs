pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{LedgerError, Result};
