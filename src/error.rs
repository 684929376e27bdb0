use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("failed to read input file {}", path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    #[error("{service} request failed: {reason}")]
    ExternalApi {
        service: &'static str,
        reason: String,
    },

    #[error("persistence failed: {reason}")]
    Persistence { reason: String },
}

impl PipelineError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn external(service: &'static str, reason: impl ToString) -> Self {
        Self::ExternalApi {
            service,
            reason: reason.to_string(),
        }
    }

    pub fn persistence(reason: impl ToString) -> Self {
        Self::Persistence {
            reason: reason.to_string(),
        }
    }
}
