//! Drug-name extractor.
//!
//! The name is whatever precedes the earliest dosage, frequency or route cue.

use crate::{dosage, frequency, route};

const TRAILING_SEPARATORS: &[char] = &['#', ':', ';', ',', '-'];

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Earliest cue offset among the three classifiers
pub fn cue_offset(text: &str) -> Option<usize> {
    [
        dosage::find_dosage(text).map(|d| d.start),
        frequency::find_frequency(text).map(|f| f.start),
        route::find_route(text).map(|r| r.start),
    ]
    .into_iter()
    .flatten()
    .min()
}

/// Name from the text before `cut`
///
/// Falls back to the whole collapsed input when there is no cut or the
/// prefix is empty once separators are stripped.
pub fn name_before_cut(text: &str, cut: Option<usize>) -> String {
    let prefix = cut
        .and_then(|at| text.get(..at))
        .map(|head| {
            head.trim_end_matches(|c: char| c.is_whitespace() || TRAILING_SEPARATORS.contains(&c))
                .trim()
        })
        .unwrap_or_default();

    if prefix.is_empty() {
        collapse_whitespace(text)
    } else {
        collapse_whitespace(prefix)
    }
}

/// Extract the drug name from a free-text order
pub fn extract_name(text: &str) -> String {
    let text = text.trim();
    name_before_cut(text, cue_offset(text))
}
