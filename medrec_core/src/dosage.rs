//! Dosage extractor.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matched dosage text and where it starts in the source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DosageToken {
    pub text: String,
    pub start: usize,
}

/// Dosage patterns in evaluation order. The first pattern that matches
/// anywhere wins, even if a later pattern matches earlier in the text.
static DOSAGE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        (
            "concentration",
            r"(?i)\b\d+\.?\d*\s*(?:mg|g|mcg|iu|ml|meq)\s*/\s*\d*\.?\d*\s*(?:ml|mg|g)\b",
        ),
        // Second strength may omit its unit ("37.5 mg/325")
        (
            "strength",
            r"(?i)\b\d+\.?\d*\s*(?:mg|g|mcg|iu)\b(?:\s*/\s*\d+(?:\.\d+)?(?:\s*(?:mg|g)\b)?)?",
        ),
        (
            "countable",
            r"(?i)\b\d+(?:\.\d+)?\s*(?:tab(?:let)?s?|cap(?:sule)?s?|sachets?|doses?|units?|ml|cc)\b",
        ),
        ("plain", r"(?i)\b\d+\.?\d*\s*(?:mg|g|mcg|iu|meq)\b"),
    ]
    .into_iter()
    .map(|(label, pattern)| (label, Regex::new(pattern).expect("dosage pattern must compile")))
    .collect()
});

/// Locate the dosage of an order
pub fn find_dosage(text: &str) -> Option<DosageToken> {
    DOSAGE_PATTERNS.iter().find_map(|(label, pattern)| {
        pattern.find(text).map(|m| {
            tracing::debug!(pattern = label, at = m.start(), "dosage matched");
            DosageToken {
                text: m.as_str().trim().to_string(),
                start: m.start(),
            }
        })
    })
}

/// Dosage text, or an empty string when none is written
pub fn extract_dosage(text: &str) -> String {
    find_dosage(text).map(|d| d.text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concentration() {
        assert_eq!(extract_dosage("Salbutamol 20mcg/mL inhaled"), "20mcg/mL");
        assert_eq!(extract_dosage("Amoxicillin 250 mg / 5 mL TID"), "250 mg / 5 mL");
        assert_eq!(extract_dosage("Heparin 1000 IU/mL SC"), "1000 IU/mL");
    }

    #[test]
    fn test_strength_with_optional_second_unit() {
        assert_eq!(extract_dosage("Tramadol/APAP 37.5 mg/325 q6h"), "37.5 mg/325");
        assert_eq!(extract_dosage("Metformin 500mg PO BID"), "500mg");
        assert_eq!(extract_dosage("Ceftriaxone 1g IV OD"), "1g");
        assert_eq!(extract_dosage("Cyanocobalamin 1000mcg IM monthly"), "1000mcg");
        assert_eq!(extract_dosage("Vitamin D 50000 IU monthly"), "50000 IU");
    }

    #[test]
    fn test_strength_per_tablet_stops_at_unit() {
        assert_eq!(extract_dosage("Sevelamer 500mg/tab BID"), "500mg");
    }

    #[test]
    fn test_countable_forms() {
        assert_eq!(extract_dosage("Insulin glargine 10 units SC at bedtime"), "10 units");
        assert_eq!(extract_dosage("Paracetamol 2 tablets QID"), "2 tablets");
        assert_eq!(extract_dosage("Omeprazole 1 cap OD"), "1 cap");
        assert_eq!(extract_dosage("Movicol 1 sachet OD"), "1 sachet");
        assert_eq!(extract_dosage("Lactulose 15 mL BID"), "15 mL");
        assert_eq!(extract_dosage("Hep B vaccine 3 doses"), "3 doses");
    }

    #[test]
    fn test_plain_milliequivalents() {
        assert_eq!(extract_dosage("Potassium chloride 20 mEq OD"), "20 mEq");
    }

    #[test]
    fn test_pattern_order_beats_text_order() {
        // Countable form appears first, strength pattern is evaluated first
        let found = find_dosage("Paracetamol 2 tabs of 500mg").unwrap();
        assert_eq!(found.text, "500mg");
        assert_eq!(found.start, 22);
    }

    #[test]
    fn test_no_dosage() {
        assert_eq!(extract_dosage("Caltrate Plus OD"), "");
        assert_eq!(extract_dosage("Ibuprofen q6h"), "");
        assert!(find_dosage("").is_none());
    }
}
