use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::SuggestArgs;
use crate::config::SuggestConfig;
use crate::issues::{IssueSource, SonarIssueClient, fetch_open_issues};
use crate::metrics::{RuleProfile, evaluate, load_measures};
use crate::model::{
    FlaggedIssue, IssueCategory, MeasureSet, NO_LINE, SnapshotBody, SnapshotDocument, SonarIssue,
    SuggestionSource,
};
use crate::report::write_suggestion_workbook;
use crate::store::{DocumentStore, PersistOutcome, open_store, persist_snapshot};
use crate::suggestion::{
    GeminiClient, SuggestionGenerator, issue_prompt, metric_prompt, suggest_or_fallback,
};
use crate::util::report_timestamp;

/// Individual code smells are covered by the issue pass.
const SKIPPED_METRIC_SUGGESTIONS: &[&str] = &["code_smells"];

pub fn run(args: SuggestArgs) -> Result<()> {
    let config = SuggestConfig::from_args(&args);

    let issues = SonarIssueClient::new(&config.sonar);
    let generator = GeminiClient::new(&config.gemini);
    if !generator.has_api_key() {
        warn!("GEMINI_API_KEY not set, every suggestion will use the fallback text");
    }
    let mut store = open_store(&config.store);

    info!(
        project_key = %config.sonar.project_key,
        input = %config.input.sonar_json.display(),
        "starting suggestion run"
    );

    let outcome = execute(&config, &issues, &generator, store.as_mut())?;

    info!(
        path = %outcome.report_path.display(),
        flagged = outcome.flagged.len(),
        fallbacks = outcome.fallback_count(),
        failed_issue_types = ?outcome.failed_issue_types,
        persisted = outcome.persisted.is_persisted(),
        "excel report saved"
    );

    Ok(())
}

#[derive(Debug)]
pub struct SuggestOutcome {
    pub flagged: Vec<FlaggedIssue>,
    pub failed_issue_types: Vec<&'static str>,
    pub persisted: PersistOutcome,
    pub report_path: PathBuf,
}

impl SuggestOutcome {
    pub fn fallback_count(&self) -> usize {
        self.flagged
            .iter()
            .filter(|issue| issue.suggestion_source == SuggestionSource::Fallback)
            .count()
    }
}

pub fn execute(
    config: &SuggestConfig,
    issues: &dyn IssueSource,
    generator: &dyn SuggestionGenerator,
    store: &mut dyn DocumentStore,
) -> Result<SuggestOutcome> {
    let measures = load_measures(&config.input.sonar_json)
        .context("failed to load analysis results")?;
    if measures.is_empty() {
        warn!(path = %config.input.sonar_json.display(), "analysis reported no measures");
    }
    let generated_at = report_timestamp(config.input.utc_offset);

    let mut flagged = metric_suggestions(&measures, generator);
    info!(flagged_metrics = flagged.len(), "evaluated project metrics");

    let open = fetch_open_issues(issues);
    flagged.extend(issue_suggestions(&open.issues, generator));

    let snapshot = SnapshotDocument {
        project_key: Some(config.sonar.project_key.clone()),
        project_name: None,
        generated_at,
        body: SnapshotBody::FlaggedIssues(flagged.clone()),
    };
    let persisted = persist_snapshot(store, &config.store.collection, &snapshot);

    let report_path = config.spreadsheet_path();
    write_suggestion_workbook(&report_path, &flagged)?;

    Ok(SuggestOutcome {
        flagged,
        failed_issue_types: open.failed_types,
        persisted,
        report_path,
    })
}

fn metric_suggestions(
    measures: &MeasureSet,
    generator: &dyn SuggestionGenerator,
) -> Vec<FlaggedIssue> {
    measures
        .iter()
        .filter(|measure| {
            evaluate(RuleProfile::Remediation, &measure.metric, &measure.value)
                .is_some_and(|evaluation| !evaluation.safe)
        })
        .filter(|measure| !SKIPPED_METRIC_SUGGESTIONS.contains(&measure.metric.as_str()))
        .map(|measure| {
            let suggestion =
                suggest_or_fallback(generator, &metric_prompt(&measure.metric, &measure.value));
            FlaggedIssue {
                category: IssueCategory::ProjectMetric,
                metric_or_type: measure.metric.clone(),
                value: measure.value.clone(),
                line_number: NO_LINE.to_string(),
                suggestion_text: suggestion.text,
                suggestion_source: suggestion.source,
            }
        })
        .collect()
}

fn issue_suggestions(
    issues: &[SonarIssue],
    generator: &dyn SuggestionGenerator,
) -> Vec<FlaggedIssue> {
    issues
        .iter()
        .map(|issue| {
            let suggestion = suggest_or_fallback(generator, &issue_prompt(issue));
            FlaggedIssue {
                category: IssueCategory::CodeIssue,
                metric_or_type: issue.issue_type.clone().unwrap_or_default(),
                value: issue.message.clone().unwrap_or_default(),
                line_number: issue.line_label(),
                suggestion_text: suggestion.text,
                suggestion_source: suggestion.source,
            }
        })
        .collect()
}
