//! Days-supply calculator.
//!
//! Given a dispensed quantity and a frequency descriptor, estimate how many
//! days the supply lasts. The descriptor is upper-cased and run through an
//! ordered rule table; the first rule that produces an answer wins. Series
//! and session-based schedules resolve to [`DaysSupply::Unknown`] rather than
//! a misleading number.

use crate::cadence::{self, Interval, IntervalUnit, DAYS_PER_MONTH, DAYS_PER_WEEK};
use crate::types::DaysSupply;
use once_cell::sync::Lazy;
use regex::Regex;

/// One row of the days-supply table
///
/// `apply` returns `None` when the rule does not recognise the text, and
/// `Some` (possibly `Unknown`) when it decides the answer.
#[derive(Clone, Copy)]
pub struct SupplyRule {
    pub label: &'static str,
    pub apply: fn(&str, f64) -> Option<DaysSupply>,
}

impl std::fmt::Debug for SupplyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupplyRule").field("label", &self.label).finish()
    }
}

static SUPPLY_RULES: [SupplyRule; 14] = [
    SupplyRule { label: "weekday/weekend split", apply: weekday_weekend_split },
    SupplyRule { label: "four times daily", apply: four_daily },
    SupplyRule { label: "three times daily", apply: three_daily },
    SupplyRule { label: "twice daily", apply: twice_daily },
    SupplyRule { label: "once daily", apply: once_daily },
    SupplyRule { label: "every N hours", apply: every_n_hours },
    SupplyRule { label: "every N days", apply: every_n_days },
    SupplyRule { label: "every N days/weeks/months", apply: every_n_periods },
    SupplyRule { label: "weekly family", apply: weekly_family },
    SupplyRule { label: "monthly family", apply: monthly_family },
    SupplyRule { label: "single dose", apply: single_dose },
    SupplyRule { label: "hemodialysis sessions", apply: dialysis_sessions },
    SupplyRule { label: "vaccine series", apply: vaccine_series },
    SupplyRule { label: "generic per day", apply: generic_per_day },
];

/// The days-supply table in evaluation order
pub fn supply_rules() -> &'static [SupplyRule] {
    &SUPPLY_RULES
}

/// Estimate days supply for `quantity` doses taken on `frequency`
///
/// Never rounds. A quantity that is not a positive finite number, or a
/// frequency no rule recognises, yields `Unknown`.
pub fn days_supply(quantity: f64, frequency: &str) -> DaysSupply {
    if !quantity.is_finite() || quantity <= 0.0 {
        return DaysSupply::Unknown;
    }

    let text = frequency.trim().to_uppercase();
    for rule in SUPPLY_RULES.iter() {
        if let Some(supply) = (rule.apply)(&text, quantity) {
            tracing::debug!(rule = rule.label, %supply, "days supply rule matched");
            return supply;
        }
    }

    tracing::debug!(frequency = %text, "no days supply rule matched");
    DaysSupply::Unknown
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("days supply pattern must compile")
}

fn capture_u32(caps: &regex::Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| cadence::parse_count(m.as_str()))
}

fn per_rate(quantity: f64, doses: f64, period_days: f64) -> Option<DaysSupply> {
    (doses > 0.0).then(|| DaysSupply::from_days(quantity / doses * period_days))
}

// ----------------------------------------------------------------------------
// Rule 0: compound weekday/weekend schedule
// ----------------------------------------------------------------------------

static WEEKDAY_WEEKEND: Lazy<Regex> =
    Lazy::new(|| regex(r"\bOD\s+WEEKDAYS\s*;?\s*BID\s+WEEKENDS\b"));

fn weekday_weekend_split(text: &str, quantity: f64) -> Option<DaysSupply> {
    if !WEEKDAY_WEEKEND.is_match(text) {
        return None;
    }
    let weekday = cadence::doses_per_day("OD")?;
    let weekend = cadence::doses_per_day("BID")?;
    let per_week = f64::from(5 * weekday + 2 * weekend);
    per_rate(quantity, per_week, DAYS_PER_WEEK)
}

// ----------------------------------------------------------------------------
// Rules 1-4: daily rates
// ----------------------------------------------------------------------------

static DAILY_ABBREVIATION: Lazy<Regex> = Lazy::new(|| {
    let tokens: Vec<&str> = cadence::DAILY_TOKENS.iter().map(|(t, _)| *t).collect();
    regex(&format!(r"\b(?:{})\b", tokens.join("|")))
});

static DAILY_MULTIPLIER: Lazy<Regex> = Lazy::new(|| {
    regex(r"\b(?:(\d+)\s*(?:X|TIMES)|(ONE|TWO|THREE|FOUR)\s+TIMES|(ONCE|TWICE|THRICE))\b")
});

// "once a week", "twice per month", and any "every N <unit>" / "every other <unit>"
static PERIOD_QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    regex(r"^(?:(?:A|PER|EVERY)\s+)?(?:WEEK|WK|MONTH|MO\b)|^EVERY\s+(?:\d+|OTHER)\b")
});

static PER_DAY_SLASH: Lazy<Regex> = Lazy::new(|| regex(r"^/\s*(?:DAY|D)\b"));

static PERIOD_ADVERB: Lazy<Regex> = Lazy::new(|| regex(r"\b(?:WEEKLY|MONTHLY)\b"));

/// Whether the text after a multiplier leaves it meaning "per day"
fn multiplier_is_daily(tail: &str) -> bool {
    let tail = tail.trim_start();
    if tail.starts_with('/') {
        return PER_DAY_SLASH.is_match(tail);
    }
    !PERIOD_QUALIFIER.is_match(tail)
}

/// Every doses-per-day count the text states
fn daily_counts(text: &str) -> Vec<u32> {
    let mut counts: Vec<u32> = DAILY_ABBREVIATION
        .find_iter(text)
        .filter_map(|m| cadence::doses_per_day(m.as_str()))
        .collect();

    if PERIOD_ADVERB.is_match(text) {
        return counts;
    }

    for caps in DAILY_MULTIPLIER.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if !multiplier_is_daily(&text[whole.end()..]) {
            continue;
        }
        if let Some(count) = (1..=3).find_map(|i| capture_u32(&caps, i)) {
            counts.push(count);
        }
    }
    counts
}

fn daily_at(text: &str, quantity: f64, count: u32) -> Option<DaysSupply> {
    if daily_counts(text).contains(&count) {
        per_rate(quantity, f64::from(count), 1.0)
    } else {
        None
    }
}

fn four_daily(text: &str, quantity: f64) -> Option<DaysSupply> {
    daily_at(text, quantity, 4)
}

fn three_daily(text: &str, quantity: f64) -> Option<DaysSupply> {
    daily_at(text, quantity, 3)
}

fn twice_daily(text: &str, quantity: f64) -> Option<DaysSupply> {
    daily_at(text, quantity, 2)
}

fn once_daily(text: &str, quantity: f64) -> Option<DaysSupply> {
    daily_at(text, quantity, 1)
}

// ----------------------------------------------------------------------------
// Rules 5-7: intervals
// ----------------------------------------------------------------------------

static EVERY_HOURS: Lazy<Regex> =
    Lazy::new(|| regex(r"\b(?:Q|EVERY)\s*(\d+)\s*(?:H|HR|HRS|HOURS?)\b"));

static EVERY_DAYS: Lazy<Regex> = Lazy::new(|| regex(r"\bQ\s*(\d+)\s*(?:D|DAYS?)\b"));

static ALTERNATE_DAY: Lazy<Regex> = Lazy::new(|| regex(r"\b(?:QOD|EOD)\b"));

static EVERY_PERIOD: Lazy<Regex> =
    Lazy::new(|| regex(r"\bEVERY\s+(\d+)\s*(DAYS?|WEEKS?|MONTHS?)\b"));

static Q_PERIOD: Lazy<Regex> =
    Lazy::new(|| regex(r"\bQ\s*(\d+)\s*(W|WKS?|WEEKS?|MOS?|M|MONTHS?)\b"));

static EVERY_OTHER: Lazy<Regex> = Lazy::new(|| regex(r"\bEVERY\s+OTHER\s+(DAY|WEEK|MONTH)\b"));

static BIWEEKLY: Lazy<Regex> = Lazy::new(|| regex(r"\bBIWEEKLY\b"));

static BIMONTHLY: Lazy<Regex> = Lazy::new(|| regex(r"\bBIMONTHLY\b"));

fn interval_supply(interval: Interval, quantity: f64) -> Option<DaysSupply> {
    interval.days_supply(quantity).map(DaysSupply::from_days)
}

fn captured_interval(pattern: &Regex, text: &str, unit: Option<IntervalUnit>) -> Option<Interval> {
    let caps = pattern.captures(text)?;
    let count = capture_u32(&caps, 1)?;
    let unit = match unit {
        Some(unit) => unit,
        None => IntervalUnit::from_text(caps.get(2)?.as_str())?,
    };
    Some(Interval::new(count, unit))
}

fn every_n_hours(text: &str, quantity: f64) -> Option<DaysSupply> {
    let interval = captured_interval(&EVERY_HOURS, text, Some(IntervalUnit::Hour))?;
    interval_supply(interval, quantity)
}

fn every_n_days(text: &str, quantity: f64) -> Option<DaysSupply> {
    let interval = captured_interval(&EVERY_DAYS, text, Some(IntervalUnit::Day))
        .or_else(|| {
            ALTERNATE_DAY
                .is_match(text)
                .then(|| Interval::new(2, IntervalUnit::Day))
        })?;
    interval_supply(interval, quantity)
}

fn every_n_periods(text: &str, quantity: f64) -> Option<DaysSupply> {
    let interval = captured_interval(&EVERY_PERIOD, text, None)
        .or_else(|| captured_interval(&Q_PERIOD, text, None))
        .or_else(|| {
            let caps = EVERY_OTHER.captures(text)?;
            Some(Interval::new(2, IntervalUnit::from_text(&caps[1])?))
        })
        .or_else(|| {
            BIWEEKLY
                .is_match(text)
                .then(|| Interval::new(2, IntervalUnit::Week))
        })
        .or_else(|| {
            BIMONTHLY
                .is_match(text)
                .then(|| Interval::new(2, IntervalUnit::Month))
        })?;
    interval_supply(interval, quantity)
}

// ----------------------------------------------------------------------------
// Rules 8-9: weekly and monthly families
// ----------------------------------------------------------------------------

static WEEK_WORD: Lazy<Regex> = Lazy::new(|| regex(r"\b(?:WEEK(?:S|LY)?|WKS?)\b"));

static ALTERNATING_WEEKLY: Lazy<Regex> = Lazy::new(|| {
    regex(r"\b(\d+)\s*X?\s*(?:/|-|OR|X)\s*(\d+)\s*X\s*(?:/\s*|A\s+|PER\s+)?(?:WEEK|WK)")
});

static TIMES_PER_WEEK: Lazy<Regex> =
    Lazy::new(|| regex(r"\b(\d+)\s*(?:X|TIMES)\s*(?:/\s*|A\s+|PER\s+)?(?:WEEK|WK)"));

static WORD_TIMES_PER_WEEK: Lazy<Regex> = Lazy::new(|| {
    regex(r"\b(?:(ONCE|TWICE|THRICE)|(ONE|TWO|THREE|FOUR)\s+TIMES)\s*(?:/\s*|A\s+|PER\s+)?(?:WEEK|WK)")
});

static MONTH_WORD: Lazy<Regex> = Lazy::new(|| regex(r"\bMONTH(?:S|LY)?\b"));

static MONTH_LIST: Lazy<Regex> =
    Lazy::new(|| regex(r"\b\d+(?:(?:\s*,\s*|\s+)\d+)+\s*MONTHS?\b"));

static TIMES_PER_MONTH: Lazy<Regex> =
    Lazy::new(|| regex(r"\b(\d+)\s*(?:X|TIMES)\s*(?:/\s*|A\s+|PER\s+)?MONTH"));

fn weekly_family(text: &str, quantity: f64) -> Option<DaysSupply> {
    if !WEEK_WORD.is_match(text) {
        return None;
    }

    if let Some(caps) = ALTERNATING_WEEKLY.captures(text) {
        if let (Some(a), Some(b)) = (capture_u32(&caps, 1), capture_u32(&caps, 2)) {
            let average = (f64::from(a) + f64::from(b)) / 2.0;
            return per_rate(quantity, average, DAYS_PER_WEEK);
        }
    }

    let times = TIMES_PER_WEEK
        .captures(text)
        .and_then(|caps| capture_u32(&caps, 1))
        .or_else(|| {
            let caps = WORD_TIMES_PER_WEEK.captures(text)?;
            capture_u32(&caps, 1).or_else(|| capture_u32(&caps, 2))
        });

    match times {
        Some(n) if n > 0 => per_rate(quantity, f64::from(n), DAYS_PER_WEEK),
        _ => per_rate(quantity, 1.0, DAYS_PER_WEEK),
    }
}

fn monthly_family(text: &str, quantity: f64) -> Option<DaysSupply> {
    if !MONTH_WORD.is_match(text) {
        return None;
    }

    if MONTH_LIST.is_match(text) {
        return Some(DaysSupply::Unknown);
    }

    let times = TIMES_PER_MONTH
        .captures(text)
        .and_then(|caps| capture_u32(&caps, 1))
        .filter(|n| *n > 0)
        .unwrap_or(1);
    per_rate(quantity, f64::from(times), DAYS_PER_MONTH)
}

// ----------------------------------------------------------------------------
// Rules 10-13: one-offs, sessions, series, generic per-day
// ----------------------------------------------------------------------------

static SINGLE_DOSE: Lazy<Regex> = Lazy::new(|| regex(r"\b(?:ONCE|SINGLE|ONE\s+TIME|STAT)\b"));

static DIALYSIS: Lazy<Regex> =
    Lazy::new(|| regex(r"\b(?:EACH|WITH|POST|AFTER|EVERY)\s+HD\b|\bHD\s*X\s*\d+"));

static SERIES_KEYWORD: Lazy<Regex> =
    Lazy::new(|| regex(r"\b(?:VACCINES?|VACCINATION|BOOSTERS?|SERIES)\b"));

static GENERIC_PER_DAY: Lazy<Regex> =
    Lazy::new(|| regex(r"\b(\d+)\s*(?:X|TIMES)\s*(?:/|A|PER)?\s*(?:DAY|DAILY)\b"));

fn single_dose(text: &str, quantity: f64) -> Option<DaysSupply> {
    SINGLE_DOSE
        .is_match(text)
        .then(|| DaysSupply::from_days(quantity))
}

fn dialysis_sessions(text: &str, _quantity: f64) -> Option<DaysSupply> {
    DIALYSIS.is_match(text).then_some(DaysSupply::Unknown)
}

fn vaccine_series(text: &str, _quantity: f64) -> Option<DaysSupply> {
    let counted = text.chars().any(|c| c.is_ascii_digit());
    (counted && SERIES_KEYWORD.is_match(text)).then_some(DaysSupply::Unknown)
}

fn generic_per_day(text: &str, quantity: f64) -> Option<DaysSupply> {
    let caps = GENERIC_PER_DAY.captures(text)?;
    let n = capture_u32(&caps, 1).filter(|n| *n > 0)?;
    per_rate(quantity, f64::from(n), 1.0)
}
