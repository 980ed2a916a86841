//! Frequency classifier.
//!
//! Turns dosing-schedule text into a canonical token (`BID`, `Q6H`,
//! `2x/week`, ...). Rules are tried in table order and the first match
//! wins. `PRN` is a modifier rather than a row: it is appended to whatever
//! base frequency the table found. When nothing matches, a dose-series
//! detector handles vaccine-style schedules.

use crate::cadence::{self, Interval, IntervalUnit};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// How a rule turns its match into a canonical token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Normalize {
    /// Always the same token
    Fixed(&'static str),
    /// Capture 1 is the count, the unit is fixed by the row
    Every(IntervalUnit),
    /// Capture 1 is a per-day count (digits or word numeral)
    PerDay,
    /// Capture 1 is a per-week count (digits or word numeral)
    PerWeek,
}

impl Normalize {
    fn apply(&self, caps: &Captures<'_>) -> Option<String> {
        let count = || caps.get(1).and_then(|m| cadence::parse_count(m.as_str()));
        match self {
            Normalize::Fixed(token) => Some((*token).to_string()),
            Normalize::Every(unit) => count().map(|n| Interval::new(n, *unit).token()),
            Normalize::PerDay => count().map(cadence::per_day_token),
            Normalize::PerWeek => count().map(cadence::per_week_token),
        }
    }
}

/// One row of the frequency table
#[derive(Debug)]
pub struct FrequencyRule {
    pub label: &'static str,
    pub pattern: Regex,
    pub normalize: Normalize,
}

impl FrequencyRule {
    fn apply(&self, text: &str) -> Option<FrequencyMatch> {
        let caps = self.pattern.captures(text)?;
        let token = self.normalize.apply(&caps)?;
        Some(FrequencyMatch {
            token,
            start: caps.get(0)?.start(),
        })
    }
}

/// Canonical frequency and the byte offset of its earliest cue
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencyMatch {
    pub token: String,
    pub start: usize,
}

const COMPOUND_SCHEDULE: &str = "OD weekdays; BID weekends";

static FREQUENCY_RULES: Lazy<Vec<FrequencyRule>> = Lazy::new(build_frequency_rules);

static PRN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bPRN\b").expect("PRN pattern"));

static DOSE_SERIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d+\s*doses?)\b.*?\b(?:at\s*)?(0\s*,\s*1\s*,\s*6|\d+[\s,]+\d+(?:[\s,]+\d+)*)\s*months?",
    )
    .expect("dose series pattern")
});

/// The frequency table in evaluation order
pub fn frequency_rules() -> &'static [FrequencyRule] {
    &FREQUENCY_RULES
}

fn build_frequency_rules() -> Vec<FrequencyRule> {
    use Normalize::*;

    let rule = |label, pattern: &str, normalize| FrequencyRule {
        label,
        pattern: Regex::new(pattern).expect("frequency pattern must compile"),
        normalize,
    };

    vec![
        // Must precede the OD row, which would otherwise always shadow it
        rule(
            "weekday/weekend split",
            r"(?i)\bOD\s+weekdays\s*;?\s*BID\s+weekends\b",
            Fixed(COMPOUND_SCHEDULE),
        ),
        // Fixed abbreviations
        rule("OD/QD", r"(?i)\b(?:OD|QD)\b", Fixed("OD")),
        rule("BID", r"(?i)\bBID\b", Fixed("BID")),
        rule("TID", r"(?i)\bTID\b", Fixed("TID")),
        rule("QID", r"(?i)\bQID\b", Fixed("QID")),
        rule("QHS/HS", r"(?i)\b(?:QHS|HS)\b", Fixed("QHS")),
        rule("ODHS", r"(?i)\bODHS\b", Fixed("OD HS")),
        rule("STAT", r"(?i)\bSTAT\b", Fixed("STAT")),
        // Intervals: every 4 hours, q12h, q3d, q2wk, every 2 months, q1mo
        rule(
            "every N hours",
            r"(?i)\b(?:every|q)\s*(\d{1,2})\s*(?:h|hr|hrs|hour|hours)\b",
            Every(IntervalUnit::Hour),
        ),
        rule(
            "every N days",
            r"(?i)\b(?:every|q)\s*(\d{1,2})\s*(?:d|day|days)\b",
            Every(IntervalUnit::Day),
        ),
        rule(
            "every N weeks",
            r"(?i)\b(?:every|q)\s*(\d{1,2})\s*(?:w|wk|wks|week|weeks)\b",
            Every(IntervalUnit::Week),
        ),
        rule(
            "every N months",
            r"(?i)\b(?:every|q)\s*(\d{1,2})\s*(?:mo|mos|month|months)\b",
            Every(IntervalUnit::Month),
        ),
        rule("qNm", r"(?i)\bq\s*(\d{1,2})\s*m\b", Every(IntervalUnit::Month)),
        // Alternate day/week shorthand
        rule(
            "every other day",
            r"(?i)\b(?:qod|eod|every\s+other\s+day)\b",
            Fixed("QOD"),
        ),
        rule(
            "every other week",
            r"(?i)\b(?:every\s+other\s+(?:week|wk|w)|biweekly)\b",
            Fixed("Q2W"),
        ),
        rule("bimonthly", r"(?i)\bbimonthly\b", Fixed("Q2M")),
        // Times per day: 3x/day, 3x a day, three times a day, twice a day
        rule(
            "Nx/day",
            r"(?i)\b(\d)\s*x\s*(?:/|per|a)?\s*(?:day|d)\b",
            PerDay,
        ),
        rule(
            "N times a day",
            r"(?i)\b(\d|one|two|three|four)\s+times\s+(?:a|per)\s+day\b",
            PerDay,
        ),
        rule(
            "once/twice a day",
            r"(?i)\b(once|twice)\s+(?:a|per)?\s*day\b",
            PerDay,
        ),
        // Times per week: 1x a week, 3x/week, twice a wk
        rule(
            "Nx/week",
            r"(?i)\b(\d)\s*x\s*(?:/|a|per)?\s*(?:week|wk)\b",
            PerWeek,
        ),
        rule(
            "N times a week",
            r"(?i)\b(once|twice|three)\s+(?:times\s+)?(?:a|per)\s*(?:week|wk)\b",
            PerWeek,
        ),
        rule("weekly", r"(?i)\b(?:weekly|every\s*week)\b", Fixed("1x/week")),
        rule(
            "monthly",
            r"(?i)\b(?:monthly|once\s+a\s*month)\b",
            Fixed("1x/month"),
        ),
        rule(
            "bedtime",
            r"(?i)\b(?:at\s+night|at\s+bedtime|before\s+bed(?:time)?)\b",
            Fixed("QHS"),
        ),
    ]
}

/// First matching base rule, ignoring the PRN modifier
fn find_base(text: &str) -> Option<(FrequencyMatch, &'static str)> {
    FREQUENCY_RULES
        .iter()
        .find_map(|rule| rule.apply(text).map(|found| (found, rule.label)))
}

/// Vaccine-style schedules such as "3 doses at 0, 1, 6 months"
fn find_dose_series(text: &str) -> Option<FrequencyMatch> {
    let caps = DOSE_SERIES.captures(text)?;
    let raw = format!("{} at {} months", &caps[1], &caps[2]);
    Some(FrequencyMatch {
        token: raw.split_whitespace().collect::<Vec<_>>().join(" "),
        start: caps.get(0)?.start(),
    })
}

/// Classify the frequency of an order and locate its cue
pub fn find_frequency(text: &str) -> Option<FrequencyMatch> {
    let base = find_base(text);
    let prn = PRN.find(text).map(|m| m.start());

    if let Some((_, label)) = &base {
        tracing::debug!(rule = label, "frequency rule matched");
    }

    match (base, prn) {
        (Some((base, _)), Some(prn_start)) => Some(FrequencyMatch {
            token: format!("{} PRN", base.token),
            start: base.start.min(prn_start),
        }),
        (Some((base, _)), None) => Some(base),
        (None, Some(start)) => Some(FrequencyMatch {
            token: "PRN".to_string(),
            start,
        }),
        (None, None) => find_dose_series(text),
    }
}

/// Canonical frequency token, or an empty string when nothing is recognised
pub fn classify_frequency(text: &str) -> String {
    find_frequency(text).map(|m| m.token).unwrap_or_default()
}
