use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::metrics::ParsedValue;

pub const NO_LINE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Measure {
    pub metric: String,
    pub value: String,
}

/// Measures in the order the analysis reported them. Lookups see the last
/// duplicate of a metric key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasureSet {
    measures: Vec<Measure>,
}

impl MeasureSet {
    pub fn new(measures: Vec<Measure>) -> Self {
        Self { measures }
    }

    #[cfg(test)]
    pub fn get(&self, metric: &str) -> Option<&str> {
        self.measures
            .iter()
            .rev()
            .find(|measure| measure.metric == metric)
            .map(|measure| measure.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Measure> {
        self.measures.iter()
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    /// Keys keep first-seen input order; a repeated key takes the last value.
    pub fn to_map(&self) -> Map<String, Value> {
        self.measures
            .iter()
            .map(|measure| (measure.metric.clone(), Value::String(measure.value.clone())))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricStatus {
    Ok,
    NeedsReview,
}

impl MetricStatus {
    pub fn from_safe(safe: bool) -> Self {
        if safe { Self::Ok } else { Self::NeedsReview }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "✅ Fine",
            Self::NeedsReview => "⚠️ Needs Check",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub name: String,
    pub raw_value: String,
    pub parsed_value: ParsedValue,
    pub description: String,
    pub safe_range: String,
    pub status: MetricStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueCategory {
    #[serde(rename = "Project Metric")]
    ProjectMetric,
    #[serde(rename = "Code Issue")]
    CodeIssue,
}

impl IssueCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProjectMetric => "Project Metric",
            Self::CodeIssue => "Code Issue",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlaggedIssue {
    #[serde(rename = "type")]
    pub category: IssueCategory,
    #[serde(rename = "metric")]
    pub metric_or_type: String,
    pub value: String,
    #[serde(rename = "line")]
    pub line_number: String,
    #[serde(rename = "suggestion")]
    pub suggestion_text: String,
    pub suggestion_source: SuggestionSource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueSearchResponse {
    #[serde(default)]
    pub issues: Vec<SonarIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SonarIssue {
    #[serde(rename = "type", default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub rule: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub line: Option<u64>,
}

impl SonarIssue {
    pub fn line_label(&self) -> String {
        self.line
            .map(|line| line.to_string())
            .unwrap_or_else(|| NO_LINE.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotDocument {
    pub project_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub generated_at: String,
    #[serde(flatten)]
    pub body: SnapshotBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotBody {
    FlaggedIssues(Vec<FlaggedIssue>),
    Analysis(Map<String, Value>),
}
