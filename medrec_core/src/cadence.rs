//! Canonical dosing cadences.
//!
//! The frequency classifier and the days-supply calculator both read their
//! daily abbreviations, word numerals and interval arithmetic from here, so
//! a token the parser emits is always one the calculator understands.

use serde::{Deserialize, Serialize};

pub const HOURS_PER_DAY: f64 = 24.0;
pub const DAYS_PER_WEEK: f64 = 7.0;
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Fixed daily abbreviations and their doses per day.
///
/// The first entry for a count is the token the parser emits for it
/// (one dose a day is `OD`, never `QD`).
pub const DAILY_TOKENS: &[(&str, u32)] = &[
    ("OD", 1),
    ("BID", 2),
    ("TID", 3),
    ("QID", 4),
    ("QD", 1),
    ("QHS", 1),
];

/// Canonical token for `count` doses per day, if one exists.
pub fn daily_token(count: u32) -> Option<&'static str> {
    DAILY_TOKENS
        .iter()
        .find(|(_, n)| *n == count)
        .map(|(token, _)| *token)
}

/// Doses per day for a daily abbreviation (case-insensitive).
pub fn doses_per_day(token: &str) -> Option<u32> {
    DAILY_TOKENS
        .iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(token))
        .map(|(_, n)| *n)
}

/// Frequency token for `count` doses a day: the abbreviation when there is
/// one, otherwise the literal `Nx/day` form.
pub fn per_day_token(count: u32) -> String {
    daily_token(count)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}x/day", count))
}

pub fn per_week_token(count: u32) -> String {
    format!("{}x/week", count)
}

/// Word numerals accepted wherever a small count can be spelled out.
pub fn word_numeral(word: &str) -> Option<u32> {
    match word.to_ascii_lowercase().as_str() {
        "one" | "once" => Some(1),
        "two" | "twice" => Some(2),
        "three" | "thrice" => Some(3),
        "four" => Some(4),
        _ => None,
    }
}

/// Parse a count written either as digits or as a word numeral.
pub fn parse_count(text: &str) -> Option<u32> {
    let text = text.trim();
    text.parse().ok().or_else(|| word_numeral(text))
}

/// Unit of a repeating dosing interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Hour,
    Day,
    Week,
    Month,
}

impl IntervalUnit {
    /// Recognise a unit spelling (`h`, `hrs`, `day`, `wk`, `mo`, `months`, ...).
    pub fn from_text(text: &str) -> Option<Self> {
        match text.chars().next()?.to_ascii_lowercase() {
            'h' => Some(Self::Hour),
            'd' => Some(Self::Day),
            'w' => Some(Self::Week),
            'm' => Some(Self::Month),
            _ => None,
        }
    }

    fn suffix(self) -> char {
        match self {
            Self::Hour => 'H',
            Self::Day => 'D',
            Self::Week => 'W',
            Self::Month => 'M',
        }
    }

    /// Length of one unit in days.
    pub fn days(self) -> f64 {
        match self {
            Self::Hour => 1.0 / HOURS_PER_DAY,
            Self::Day => 1.0,
            Self::Week => DAYS_PER_WEEK,
            Self::Month => DAYS_PER_MONTH,
        }
    }
}

/// One dose every `count` units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub count: u32,
    pub unit: IntervalUnit,
}

impl Interval {
    pub fn new(count: u32, unit: IntervalUnit) -> Self {
        Self { count, unit }
    }

    /// Canonical token, e.g. `Q6H`, `Q2D`, `Q2W`, `Q3M`.
    pub fn token(&self) -> String {
        format!("Q{}{}", self.count, self.unit.suffix())
    }

    /// Days covered by `quantity` doses, or `None` for a zero interval.
    pub fn days_supply(&self, quantity: f64) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let count = f64::from(self.count);
        Some(match self.unit {
            // doses per day = 24 / N
            IntervalUnit::Hour => quantity / (HOURS_PER_DAY / count),
            unit => quantity * count * unit.days(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_token_prefers_canonical_spelling() {
        assert_eq!(daily_token(1), Some("OD"));
        assert_eq!(daily_token(2), Some("BID"));
        assert_eq!(daily_token(3), Some("TID"));
        assert_eq!(daily_token(4), Some("QID"));
        assert_eq!(daily_token(5), None);
    }

    #[test]
    fn test_doses_per_day_covers_aliases() {
        assert_eq!(doses_per_day("qd"), Some(1));
        assert_eq!(doses_per_day("QHS"), Some(1));
        assert_eq!(doses_per_day("bid"), Some(2));
        assert_eq!(doses_per_day("Q6H"), None);
    }

    #[test]
    fn test_every_daily_token_round_trips_through_count() {
        for (token, count) in DAILY_TOKENS {
            let canonical = daily_token(*count).unwrap();
            assert_eq!(doses_per_day(canonical), Some(*count), "{}", token);
        }
    }

    #[test]
    fn test_per_day_token_falls_back_to_literal() {
        assert_eq!(per_day_token(2), "BID");
        assert_eq!(per_day_token(6), "6x/day");
        assert_eq!(per_week_token(3), "3x/week");
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count("Twice"), Some(2));
        assert_eq!(parse_count("once"), Some(1));
        assert_eq!(parse_count("several"), None);
    }

    #[test]
    fn test_interval_tokens() {
        assert_eq!(Interval::new(6, IntervalUnit::Hour).token(), "Q6H");
        assert_eq!(Interval::new(2, IntervalUnit::Day).token(), "Q2D");
        assert_eq!(Interval::new(2, IntervalUnit::Week).token(), "Q2W");
        assert_eq!(Interval::new(3, IntervalUnit::Month).token(), "Q3M");
    }

    #[test]
    fn test_interval_unit_spellings() {
        assert_eq!(IntervalUnit::from_text("hrs"), Some(IntervalUnit::Hour));
        assert_eq!(IntervalUnit::from_text("Days"), Some(IntervalUnit::Day));
        assert_eq!(IntervalUnit::from_text("wk"), Some(IntervalUnit::Week));
        assert_eq!(IntervalUnit::from_text("mo"), Some(IntervalUnit::Month));
        assert_eq!(IntervalUnit::from_text(""), None);
    }

    #[test]
    fn test_interval_days_supply() {
        assert_eq!(Interval::new(6, IntervalUnit::Hour).days_supply(30.0), Some(7.5));
        assert_eq!(Interval::new(8, IntervalUnit::Hour).days_supply(30.0), Some(10.0));
        assert_eq!(Interval::new(2, IntervalUnit::Day).days_supply(10.0), Some(20.0));
        assert_eq!(Interval::new(2, IntervalUnit::Week).days_supply(3.0), Some(42.0));
        assert_eq!(Interval::new(1, IntervalUnit::Month).days_supply(2.0), Some(60.0));
        assert_eq!(Interval::new(0, IntervalUnit::Hour).days_supply(30.0), None);
    }
}
