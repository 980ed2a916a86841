//! Route-of-administration classifier.
//!
//! The rule table is scanned top to bottom and the first row whose pattern
//! matches anywhere in the text decides the route, regardless of where in
//! the text a later row would have matched.

use crate::Route;
use once_cell::sync::Lazy;
use regex::Regex;

/// One row of the route table
#[derive(Debug)]
pub struct RouteRule {
    pub route: Route,
    pub pattern: Regex,
}

/// Winning route and the byte offset of the text that triggered it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: Route,
    pub start: usize,
}

static ROUTE_RULES: Lazy<Vec<RouteRule>> = Lazy::new(build_route_rules);

/// The route table in evaluation order
pub fn route_rules() -> &'static [RouteRule] {
    &ROUTE_RULES
}

fn build_route_rules() -> Vec<RouteRule> {
    let rule = |route, pattern: &str| RouteRule {
        route,
        pattern: Regex::new(pattern).expect("route pattern must compile"),
    };

    vec![
        rule(Route::Iv, r"(?i)\b(?:intravenous|iv\b|i\.v\.)"),
        rule(Route::Im, r"(?i)\b(?:intramuscular(?:ly)?|im\b|i\.m\.)"),
        rule(Route::Sc, r"(?i)\b(?:subcutaneous(?:ly)?|sc\b|s\.c\.)"),
        rule(Route::Sl, r"(?i)\b(?:sublingual|sl\b|s\.l\.)"),
        rule(Route::Pr, r"(?i)\b(?:rectal|per rectum|pr\b|p\.r\.)"),
        rule(Route::Po, r"(?i)\b(?:oral(?:ly)?|by mouth|po\b|p\.o\.)"),
        rule(
            Route::Top,
            r"(?i)\b(?:topical(?:ly)?|apply|ointment|lotion|cream|ung\b|top\b)",
        ),
        // "neb(s)" must stand alone so drug names like Nebivolol stay oral
        rule(
            Route::Inh,
            r"(?i)\b(?:inhal(?:ation|ed|e)|nebs?\b|nebuliz(?:ed|er)|inh\b)",
        ),
        rule(Route::Inh, r"(?i)\b(?:nasal\s*cannula|intranasal|nasal)"),
    ]
}

/// Find the first route rule that matches anywhere in `text`
pub fn find_route(text: &str) -> Option<RouteMatch> {
    ROUTE_RULES.iter().find_map(|rule| {
        rule.pattern.find(text).map(|m| RouteMatch {
            route: rule.route,
            start: m.start(),
        })
    })
}

/// Classify the route of an order, defaulting to oral
pub fn classify_route(text: &str) -> Route {
    match find_route(text) {
        Some(found) => {
            tracing::debug!(route = %found.route, at = found.start, "route cue matched");
            found.route
        }
        None => Route::default(),
    }
}
