use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::PipelineError;
use crate::model::{Measure, MeasureSet};

const MISSING_VALUE: &str = "0";

pub fn load_measures(path: &Path) -> Result<MeasureSet, PipelineError> {
    let raw = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => PipelineError::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => PipelineError::InputUnreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let document: Value = serde_json::from_slice(&raw).map_err(|err| {
        PipelineError::malformed(format!("{} is not valid JSON: {err}", path.display()))
    })?;

    let measures = extract_measures(&document)?;
    debug!(path = %path.display(), measures = measures.len(), "loaded analysis measures");
    Ok(measures)
}

/// Reads `component.measures[*].{metric,value}` out of an analysis document.
pub fn extract_measures(document: &Value) -> Result<MeasureSet, PipelineError> {
    let entries = document
        .get("component")
        .ok_or_else(|| PipelineError::malformed("missing `component` object"))?
        .get("measures")
        .and_then(Value::as_array)
        .ok_or_else(|| PipelineError::malformed("missing `component.measures` array"))?;

    let mut measures = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let metric = entry
            .get("metric")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PipelineError::malformed(format!("measure #{index} has no `metric` name"))
            })?;

        measures.push(Measure {
            metric: metric.to_string(),
            value: scalar_text(entry.get("value")),
        });
    }

    Ok(MeasureSet::new(measures))
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING_VALUE.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
