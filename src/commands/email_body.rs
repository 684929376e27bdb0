use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::EmailBodyArgs;
use crate::config::{InputConfig, default_email_body_path};
use crate::metrics::{RuleProfile, load_measures, summarize};
use crate::model::{MetricRecord, MetricStatus};
use crate::report::{render_email_body, write_email_body};
use crate::util::report_timestamp;

pub fn run(args: EmailBodyArgs) -> Result<()> {
    let input = InputConfig::from_args(&args.input);
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_email_body_path(&input.sonar_json));

    let outcome = execute(&input, &output_path)?;

    info!(
        path = %outcome.output_path.display(),
        metrics = outcome.records.len(),
        needs_review = outcome.needs_review(),
        unparsed = outcome.unparsed(),
        "email body generated"
    );

    Ok(())
}

#[derive(Debug)]
pub struct EmailBodyOutcome {
    pub records: Vec<MetricRecord>,
    pub output_path: PathBuf,
}

impl EmailBodyOutcome {
    pub fn needs_review(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.status == MetricStatus::NeedsReview)
            .count()
    }

    pub fn unparsed(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.parsed_value.is_invalid())
            .count()
    }
}

pub fn execute(input: &InputConfig, output_path: &Path) -> Result<EmailBodyOutcome> {
    let measures =
        load_measures(&input.sonar_json).context("failed to load analysis results")?;
    let records = summarize(RuleProfile::Summary, &measures);

    let html = render_email_body(&records, &report_timestamp(input.utc_offset));
    write_email_body(output_path, &html)?;

    Ok(EmailBodyOutcome {
        records,
        output_path: output_path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;

    use super::*;
    use crate::config::offset_from_minutes;
    use crate::error::PipelineError;

    fn input_for(path: PathBuf) -> InputConfig {
        InputConfig {
            sonar_json: path,
            utc_offset: offset_from_minutes(330),
        }
    }

    #[test]
    fn writes_summary_table_for_known_metrics() {
        let dir = tempfile::tempdir().expect("tempdir");
        let json_path = dir.path().join("sonar_results.json");
        fs::write(
            &json_path,
            json!({
                "component": {
                    "measures": [
                        {"metric": "coverage", "value": "79.0"},
                        {"metric": "bugs", "value": "0"},
                        {"metric": "alert_status", "value": "OK"},
                        {"metric": "new_violations", "value": "3"}
                    ]
                }
            })
            .to_string(),
        )
        .expect("write fixture");
        let output_path = default_email_body_path(&json_path);

        let outcome = execute(&input_for(json_path), &output_path).expect("render should succeed");

        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.needs_review(), 1);
        assert_eq!(outcome.unparsed(), 0);
        assert_eq!(outcome.records[0].status, MetricStatus::NeedsReview);

        let html = fs::read_to_string(dir.path().join("email_body.html")).expect("html written");
        assert!(html.contains("<td>Coverage</td>"));
        assert!(html.contains("<td>Alert Status</td>"));
        assert!(!html.contains("new_violations"));
    }

    #[test]
    fn malformed_input_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let json_path = dir.path().join("sonar_results.json");
        fs::write(&json_path, r#"{"errors":[{"msg":"Component not found"}]}"#)
            .expect("write fixture");
        let output_path = dir.path().join("email_body.html");

        let err = execute(&input_for(json_path), &output_path).expect_err("should fail");

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MalformedInput { .. })
        ));
        assert!(!output_path.exists());
    }
}
