#![forbid(unsafe_code)]

//! Core parsing and scheduling logic for medrec.
//!
//! This crate provides:
//! - Domain types (parsed orders, routes, days supply, records)
//! - Rule-table classifiers for route, frequency, dosage and name
//! - The order string parser
//! - Days-supply and refill-date calculation
//! - Record prefill and CSV/JSON export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod cadence;
pub mod route;
pub mod frequency;
pub mod dosage;
pub mod name;
pub mod parser;
pub mod supply;
pub mod record;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, OutputFormat};
pub use route::classify_route;
pub use frequency::classify_frequency;
pub use dosage::extract_dosage;
pub use name::extract_name;
pub use parser::{parse_medication_string, parse_order};
pub use supply::days_supply;
pub use record::refill_date;
