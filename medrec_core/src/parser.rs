//! Order string parser.
//!
//! Composes the route, frequency and dosage classifiers with the name
//! extractor. Parsing is total: every input yields a result, with missing
//! fields left empty and the route defaulting to oral.

use crate::name;
use crate::types::{ParsedMedication, ParsedOrder, Route};
use crate::{dosage, frequency, route};
use once_cell::sync::Lazy;
use regex::Regex;

static DISPENSE_QUANTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\s*(\d+)\b").expect("dispense quantity pattern"));

/// Parse a free-text medication order into its four fields
pub fn parse_medication_string(input: &str) -> ParsedMedication {
    let text = input.trim();

    let route_match = route::find_route(text);
    let frequency_match = frequency::find_frequency(text);
    let dosage_match = dosage::find_dosage(text);

    let cut = [
        dosage_match.as_ref().map(|d| d.start),
        frequency_match.as_ref().map(|f| f.start),
        route_match.map(|r| r.start),
    ]
    .into_iter()
    .flatten()
    .min();

    let parsed = ParsedMedication {
        name: name::name_before_cut(text, cut),
        dosage: dosage_match.map(|d| d.text).unwrap_or_default(),
        frequency: frequency_match.map(|f| f.token).unwrap_or_default(),
        route: route_match
            .map(|r| r.route)
            .unwrap_or_default()
            .code()
            .to_string(),
    };

    tracing::debug!(
        name = %parsed.name,
        dosage = %parsed.dosage,
        frequency = %parsed.frequency,
        route = %parsed.route,
        "parsed medication order"
    );

    parsed
}

/// Dispensed quantity written as `#N`, if any
pub fn dispense_quantity(text: &str) -> Option<u32> {
    DISPENSE_QUANTITY
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|n| *n > 0)
}

/// Parse an order and pick up its dispensed quantity
pub fn parse_order(input: &str) -> ParsedOrder {
    ParsedOrder {
        medication: parse_medication_string(input),
        quantity: dispense_quantity(input),
    }
}

/// Route of a parsed medication as an enum
pub fn parsed_route(parsed: &ParsedMedication) -> Route {
    parsed.route.parse().unwrap_or_default()
}
