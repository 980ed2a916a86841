//! Prefilled medication records.
//!
//! Ties the parser and the days-supply calculator together: one order
//! string plus a start date becomes a record with a status, a quantity and
//! (when the schedule allows) a refill date.

use crate::parser::parse_order;
use crate::supply::days_supply;
use crate::types::{DaysSupply, MedicationRecord, MedicationStatus, RefillRounding};
use crate::{Error, Result};
use chrono::{Days, NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

impl MedicationStatus {
    /// Status a freshly parsed order starts in
    pub fn for_frequency(frequency: &str) -> Self {
        if frequency.to_uppercase().split_whitespace().any(|w| w == "PRN") {
            MedicationStatus::Prn
        } else {
            MedicationStatus::Active
        }
    }
}

/// Date the supply runs out, or `None` when it cannot be known
///
/// A supply that rounds down to zero whole days has no refill date.
pub fn refill_date(
    start: NaiveDate,
    supply: DaysSupply,
    rounding: RefillRounding,
) -> Option<NaiveDate> {
    let days = supply.whole_days(rounding)?;
    let days = u64::try_from(days).ok().filter(|d| *d > 0)?;
    start.checked_add_days(Days::new(days))
}

impl MedicationRecord {
    /// Build a record from an order string
    ///
    /// `quantity` overrides any `#N` written in the text.
    pub fn from_entry(
        text: &str,
        start_date: NaiveDate,
        quantity: Option<u32>,
        rounding: RefillRounding,
    ) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("medication entry is empty".to_string()));
        }

        let order = parse_order(text);
        let quantity = quantity.filter(|q| *q > 0).or(order.quantity);
        let medication = order.medication;

        let supply = quantity
            .map(|q| days_supply(f64::from(q), &medication.frequency))
            .unwrap_or(DaysSupply::Unknown);
        let refill = refill_date(start_date, supply, rounding);
        debug!(name = %medication.name, %supply, ?refill, "computed refill");

        let record = MedicationRecord {
            id: Uuid::new_v4(),
            status: MedicationStatus::for_frequency(&medication.frequency),
            name: medication.name,
            dosage: medication.dosage,
            frequency: medication.frequency,
            route: medication.route,
            start_date,
            notes: String::new(),
            quantity,
            refill_date: refill,
            created_at: Utc::now(),
        };

        info!(id = %record.id, name = %record.name, "medication record prefilled");
        Ok(record)
    }

    /// Days supply of this record's quantity on its frequency
    pub fn days_supply(&self) -> DaysSupply {
        self.quantity
            .map(|q| days_supply(f64::from(q), &self.frequency))
            .unwrap_or(DaysSupply::Unknown)
    }
}
