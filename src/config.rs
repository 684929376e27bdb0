use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

use crate::cli::{InputArgs, StoreArgs, SuggestArgs};
use crate::error::PipelineError;

pub const ISSUE_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const SUGGESTION_TIMEOUT: Duration = Duration::from_secs(30);
pub const SPREADSHEET_FILENAME: &str = "ai_suggestions_report.xlsx";
pub const EMAIL_BODY_FILENAME: &str = "email_body.html";

const IST_OFFSET_MINUTES: i32 = 330;

#[derive(Debug, Clone)]
pub struct InputConfig {
    pub sonar_json: PathBuf,
    pub utc_offset: FixedOffset,
}

impl InputConfig {
    pub fn from_args(args: &InputArgs) -> Self {
        Self {
            sonar_json: args.sonar_json.clone(),
            utc_offset: offset_from_minutes(args.utc_offset_minutes),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SonarConfig {
    pub host_url: String,
    pub auth_token: String,
    pub project_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl StoreConfig {
    pub fn from_args(args: &StoreArgs) -> Self {
        Self {
            uri: args.db_uri.clone(),
            database: args.db_name.clone(),
            collection: args.db_collection.clone(),
        }
    }

    /// Filesystem path of the backing database; a `sqlite://` prefix is accepted.
    pub fn db_path(&self) -> Result<PathBuf, PipelineError> {
        db_path_from_uri(&self.uri)
    }
}

#[derive(Debug, Clone)]
pub struct SuggestConfig {
    pub input: InputConfig,
    pub sonar: SonarConfig,
    pub gemini: GeminiConfig,
    pub store: StoreConfig,
    pub workspace: PathBuf,
}

impl SuggestConfig {
    pub fn from_args(args: &SuggestArgs) -> Self {
        Self {
            input: InputConfig::from_args(&args.input),
            sonar: SonarConfig {
                host_url: args.sonar_host_url.trim_end_matches('/').to_string(),
                auth_token: args.sonar_auth_token.clone(),
                project_key: args.project_key.clone(),
                timeout: ISSUE_SEARCH_TIMEOUT,
            },
            gemini: GeminiConfig {
                api_key: args
                    .gemini_api_key
                    .clone()
                    .filter(|key| !key.trim().is_empty()),
                model: args.gemini_model.clone(),
                endpoint: args.gemini_endpoint.trim_end_matches('/').to_string(),
                timeout: SUGGESTION_TIMEOUT,
            },
            store: StoreConfig::from_args(&args.store),
            workspace: args.workspace.clone(),
        }
    }

    pub fn spreadsheet_path(&self) -> PathBuf {
        self.workspace.join(SPREADSHEET_FILENAME)
    }
}

/// Plain paths and `sqlite://` URIs resolve to a file; any other scheme is rejected.
pub fn db_path_from_uri(uri: &str) -> Result<PathBuf, PipelineError> {
    if let Some(path) = uri.strip_prefix("sqlite://") {
        return Ok(PathBuf::from(path));
    }
    if let Some((scheme, _)) = uri.split_once("://") {
        return Err(PipelineError::persistence(format!(
            "unsupported store scheme `{scheme}://`, expected a file path or sqlite:// URI"
        )));
    }
    Ok(PathBuf::from(uri))
}

pub fn default_email_body_path(sonar_json: &Path) -> PathBuf {
    sonar_json
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
        .join(EMAIL_BODY_FILENAME)
}

/// Out-of-range offsets fall back to IST.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .or_else(|| FixedOffset::east_opt(IST_OFFSET_MINUTES * 60))
        .unwrap_or_else(|| Utc.fix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_accepts_sqlite_scheme() {
        assert_eq!(
            db_path_from_uri("sqlite:///var/lib/sonar.sqlite").expect("sqlite uri"),
            PathBuf::from("/var/lib/sonar.sqlite")
        );
        assert_eq!(
            db_path_from_uri("local.sqlite").expect("plain path"),
            PathBuf::from("local.sqlite")
        );
    }

    #[test]
    fn db_path_rejects_other_schemes() {
        let err = db_path_from_uri("mongodb://localhost:27017").expect_err("should reject");
        assert!(matches!(err, PipelineError::Persistence { .. }));
        assert!(err.to_string().contains("mongodb://"));
    }

    #[test]
    fn email_body_defaults_next_to_input() {
        assert_eq!(
            default_email_body_path(Path::new("/work/out/sonar_results.json")),
            PathBuf::from("/work/out/email_body.html")
        );
        assert_eq!(
            default_email_body_path(Path::new("sonar_results.json")),
            PathBuf::from("email_body.html")
        );
    }

    #[test]
    fn invalid_offset_falls_back_to_ist() {
        assert_eq!(offset_from_minutes(0).local_minus_utc(), 0);
        assert_eq!(offset_from_minutes(-300).local_minus_utc(), -300 * 60);
        assert_eq!(offset_from_minutes(100_000).local_minus_utc(), 330 * 60);
    }
}
