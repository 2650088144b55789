mod client;
mod config;
mod error;

pub use client::HttpLedger;
pub use config::HttpLedgerConfig;
pub use error::{HttpLedgerError, HttpResult};
