use tracing::debug;

use crate::model::{MeasureSet, MetricRecord, MetricStatus};

use super::parse::{ParsedValue, ValueKind, parse_value};

const RATING_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    AtLeast(f64),
    AtMost(f64),
    Equals(f64),
    OneOf(&'static [f64]),
    /// Case-insensitive text match.
    TextIs(&'static str),
    TextIsNot(&'static str),
    /// Reported for context only; any parseable value is safe.
    Informational,
}

impl Threshold {
    pub fn kind(self) -> ValueKind {
        match self {
            Self::TextIs(_) | Self::TextIsNot(_) => ValueKind::Text,
            _ => ValueKind::Numeric,
        }
    }

    /// A value that failed to parse is never safe.
    pub fn is_safe(self, value: &ParsedValue) -> bool {
        match (self, value) {
            (_, ParsedValue::Invalid { .. }) => false,
            (Self::Informational, _) => true,
            (Self::AtLeast(min), ParsedValue::Number(actual)) => *actual >= min,
            (Self::AtMost(max), ParsedValue::Number(actual)) => *actual <= max,
            (Self::Equals(expected), ParsedValue::Number(actual)) => {
                (actual - expected).abs() < RATING_TOLERANCE
            }
            (Self::OneOf(allowed), ParsedValue::Number(actual)) => allowed
                .iter()
                .any(|expected| (actual - expected).abs() < RATING_TOLERANCE),
            (Self::TextIs(expected), ParsedValue::Text(actual)) => {
                actual.eq_ignore_ascii_case(expected)
            }
            (Self::TextIsNot(rejected), ParsedValue::Text(actual)) => {
                !actual.eq_ignore_ascii_case(rejected)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRule {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub safe_range: &'static str,
    pub threshold: Threshold,
}

const fn rule(
    key: &'static str,
    name: &'static str,
    description: &'static str,
    safe_range: &'static str,
    threshold: Threshold,
) -> MetricRule {
    MetricRule {
        key,
        name,
        description,
        safe_range,
        threshold,
    }
}

const GOOD_RATINGS: &[f64] = &[1.0, 2.0];

const REMEDIATION_RULES: &[MetricRule] = &[
    rule(
        "coverage",
        "Coverage",
        "Code coverage from tests",
        ">= 80%",
        Threshold::AtLeast(80.0),
    ),
    rule(
        "bugs",
        "Bugs",
        "Code defects affecting reliability",
        "= 0",
        Threshold::AtMost(0.0),
    ),
    rule(
        "vulnerabilities",
        "Vulnerabilities",
        "Security weaknesses in code",
        "= 0",
        Threshold::AtMost(0.0),
    ),
    rule(
        "code_smells",
        "Code Smells",
        "Maintainability issues",
        "= 0",
        Threshold::AtMost(0.0),
    ),
    rule(
        "duplicated_lines_density",
        "Duplicated Lines %",
        "Code duplication",
        "<= 10%",
        Threshold::AtMost(10.0),
    ),
    rule(
        "security_rating",
        "Security Rating",
        "Security score",
        "1.0 or 2.0",
        Threshold::OneOf(GOOD_RATINGS),
    ),
    rule(
        "reliability_rating",
        "Reliability Rating",
        "Reliability score",
        "1.0 or 2.0",
        Threshold::OneOf(GOOD_RATINGS),
    ),
    rule(
        "sqale_rating",
        "Maintainability Rating",
        "Maintainability score",
        "1.0 or 2.0",
        Threshold::OneOf(GOOD_RATINGS),
    ),
    rule(
        "alert_status",
        "Alert Status",
        "Quality Gate result",
        "not ERROR",
        Threshold::TextIsNot("ERROR"),
    ),
];

const SUMMARY_RULES: &[MetricRule] = &[
    rule(
        "bugs",
        "Bugs",
        "Code defects affecting reliability",
        "= 0",
        Threshold::AtMost(0.0),
    ),
    rule(
        "vulnerabilities",
        "Vulnerabilities",
        "Security weaknesses in code",
        "= 0",
        Threshold::AtMost(0.0),
    ),
    rule(
        "code_smells",
        "Code Smells",
        "Maintainability issues",
        "<= 5",
        Threshold::AtMost(5.0),
    ),
    rule(
        "coverage",
        "Coverage",
        "Code coverage from tests",
        ">= 80%",
        Threshold::AtLeast(80.0),
    ),
    rule(
        "duplicated_lines_density",
        "Duplicated Lines %",
        "Code duplication",
        "<= 5%",
        Threshold::AtMost(5.0),
    ),
    rule(
        "reliability_rating",
        "Reliability Rating",
        "Reliability score",
        "= 1.0",
        Threshold::Equals(1.0),
    ),
    rule(
        "security_rating",
        "Security Rating",
        "Security score",
        "= 1.0",
        Threshold::Equals(1.0),
    ),
    rule(
        "sqale_rating",
        "Maintainability Rating",
        "Maintainability score",
        "= 1.0",
        Threshold::Equals(1.0),
    ),
    rule(
        "ncloc",
        "Lines of Code",
        "Non-comment lines",
        "--",
        Threshold::Informational,
    ),
    rule(
        "functions",
        "Functions",
        "Function count",
        "--",
        Threshold::Informational,
    ),
    rule(
        "classes",
        "Classes",
        "Class count",
        "--",
        Threshold::Informational,
    ),
    rule(
        "complexity",
        "Complexity",
        "Code complexity",
        "--",
        Threshold::Informational,
    ),
    rule(
        "alert_status",
        "Alert Status",
        "Quality Gate result",
        "OK",
        Threshold::TextIs("OK"),
    ),
];

/// Fixed rule tables. `Remediation` decides which metrics get AI suggestions,
/// `Summary` drives the email report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleProfile {
    Remediation,
    Summary,
}

impl RuleProfile {
    pub fn rules(self) -> &'static [MetricRule] {
        match self {
            Self::Remediation => REMEDIATION_RULES,
            Self::Summary => SUMMARY_RULES,
        }
    }

    pub fn rule(self, key: &str) -> Option<&'static MetricRule> {
        self.rules().iter().find(|rule| rule.key == key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub rule: &'static MetricRule,
    pub parsed: ParsedValue,
    pub safe: bool,
}

impl Evaluation {
    pub fn status(&self) -> MetricStatus {
        MetricStatus::from_safe(self.safe)
    }

    pub fn safe_range(&self) -> &'static str {
        self.rule.safe_range
    }
}

/// Returns `None` for metrics the profile has no rule for.
pub fn evaluate(profile: RuleProfile, key: &str, raw: &str) -> Option<Evaluation> {
    let rule = profile.rule(key)?;
    let parsed = parse_value(raw, rule.threshold.kind());
    if let ParsedValue::Invalid { raw, reason } = &parsed {
        debug!(metric = key, raw = %raw, reason = %reason, "metric value did not parse");
    }
    let safe = rule.threshold.is_safe(&parsed);

    Some(Evaluation { rule, parsed, safe })
}

pub fn summarize(profile: RuleProfile, measures: &MeasureSet) -> Vec<MetricRecord> {
    measures
        .iter()
        .filter_map(|measure| {
            let evaluation = evaluate(profile, &measure.metric, &measure.value)?;
            Some(MetricRecord {
                name: evaluation.rule.name.to_string(),
                raw_value: measure.value.clone(),
                description: evaluation.rule.description.to_string(),
                safe_range: evaluation.safe_range().to_string(),
                status: evaluation.status(),
                parsed_value: evaluation.parsed,
            })
        })
        .collect()
}
