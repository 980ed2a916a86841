//! Core domain types for medication-order parsing.
//!
//! This module defines the values passed between the parser, the
//! days-supply calculator and the record layer:
//! - Parsed orders and their route codes
//! - Days-supply results
//! - Prefilled medication records and refill rounding

use crate::Error;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Route
// ============================================================================

/// Standardized route-of-administration code
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Route {
    Iv,
    Im,
    Sc,
    Sl,
    Pr,
    #[default]
    Po,
    Top,
    Inh,
}

impl Route {
    pub const ALL: [Route; 8] = [
        Route::Iv,
        Route::Im,
        Route::Sc,
        Route::Sl,
        Route::Pr,
        Route::Po,
        Route::Top,
        Route::Inh,
    ];

    /// Two/three-letter code as written on an order
    pub fn code(&self) -> &'static str {
        match self {
            Route::Iv => "IV",
            Route::Im => "IM",
            Route::Sc => "SC",
            Route::Sl => "SL",
            Route::Pr => "PR",
            Route::Po => "PO",
            Route::Top => "TOP",
            Route::Inh => "INH",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Route {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::ALL
            .into_iter()
            .find(|route| route.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("unknown route code: {}", s)))
    }
}

// ============================================================================
// Parser output
// ============================================================================

/// Structured fields recovered from a free-text medication order
///
/// Every field is always present. Missing values are empty strings, except
/// `route`, which falls back to `PO`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub route: String,
}

impl Default for ParsedMedication {
    fn default() -> Self {
        Self {
            name: String::new(),
            dosage: String::new(),
            frequency: String::new(),
            route: Route::default().code().to_string(),
        }
    }
}

/// A parsed order plus the dispensed quantity (`#30`) when one was written
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOrder {
    #[serde(flatten)]
    pub medication: ParsedMedication,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

// ============================================================================
// Days supply
// ============================================================================

/// How long a dispensed quantity lasts
///
/// `Unknown` means no steady daily rate could be derived (vaccine series,
/// dialysis sessions, as-needed orders). It is never a stand-in for zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum DaysSupply {
    Days(f64),
    Unknown,
}

impl DaysSupply {
    /// Wrap a computed day count; anything not strictly positive and finite
    /// becomes `Unknown`.
    pub fn from_days(days: f64) -> Self {
        if days.is_finite() && days > 0.0 {
            DaysSupply::Days(days)
        } else {
            DaysSupply::Unknown
        }
    }

    pub fn days(&self) -> Option<f64> {
        match self {
            DaysSupply::Days(days) => Some(*days),
            DaysSupply::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, DaysSupply::Unknown)
    }

    /// Whole calendar days under the given rounding policy
    pub fn whole_days(&self, rounding: RefillRounding) -> Option<i64> {
        self.days().map(|days| rounding.apply(days) as i64)
    }
}

impl fmt::Display for DaysSupply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaysSupply::Days(days) => write!(f, "{}", days),
            DaysSupply::Unknown => f.write_str("unknown"),
        }
    }
}

/// How fractional days supply is turned into whole calendar days
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefillRounding {
    #[default]
    Floor,
    Ceil,
    Round,
}

impl RefillRounding {
    pub fn apply(&self, days: f64) -> f64 {
        match self {
            RefillRounding::Floor => days.floor(),
            RefillRounding::Ceil => days.ceil(),
            RefillRounding::Round => days.round(),
        }
    }
}

impl FromStr for RefillRounding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "floor" => Ok(RefillRounding::Floor),
            "ceil" => Ok(RefillRounding::Ceil),
            "round" => Ok(RefillRounding::Round),
            other => Err(Error::InvalidInput(format!(
                "unknown rounding '{}' (expected floor, ceil or round)",
                other
            ))),
        }
    }
}

// ============================================================================
// Medication records
// ============================================================================

/// Lifecycle status of a medication on a patient's list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicationStatus {
    #[default]
    Active,
    Discontinued,
    Prn,
}

impl fmt::Display for MedicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MedicationStatus::Active => f.write_str("active"),
            MedicationStatus::Discontinued => f.write_str("discontinued"),
            MedicationStatus::Prn => f.write_str("prn"),
        }
    }
}

/// A medication record prefilled from an order string
///
/// This is what the record-keeping layer receives; storing it is its job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRecord {
    pub id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub route: String,
    pub status: MedicationStatus,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refill_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}
