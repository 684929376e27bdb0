use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{info, warn};

use crate::config::SonarConfig;
use crate::error::PipelineError;
use crate::model::{IssueSearchResponse, SonarIssue};

pub const ISSUE_TYPES: [&str; 3] = ["BUG", "VULNERABILITY", "CODE_SMELL"];

const SEARCH_PATH: &str = "/api/issues/search";
const OPEN_STATUSES: &str = "OPEN,REOPENED";
const PAGE_SIZE: &str = "100";
const SERVICE: &str = "issue search";

pub trait IssueSource {
    fn search(&self, issue_type: &str) -> Result<Vec<SonarIssue>, PipelineError>;
}

pub struct SonarIssueClient {
    agent: ureq::Agent,
    search_url: String,
    project_key: String,
    auth_header: String,
}

impl SonarIssueClient {
    pub fn new(config: &SonarConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();

        Self {
            agent,
            search_url: format!("{}{SEARCH_PATH}", config.host_url),
            project_key: config.project_key.clone(),
            auth_header: basic_auth_header(&config.auth_token),
        }
    }
}

impl IssueSource for SonarIssueClient {
    fn search(&self, issue_type: &str) -> Result<Vec<SonarIssue>, PipelineError> {
        let response = self
            .agent
            .get(&self.search_url)
            .set("Authorization", &self.auth_header)
            .query("componentKeys", &self.project_key)
            .query("types", issue_type)
            .query("statuses", OPEN_STATUSES)
            .query("ps", PAGE_SIZE)
            .call()
            .map_err(|err| PipelineError::external(SERVICE, err))?;

        let body: IssueSearchResponse = response
            .into_json()
            .map_err(|err| PipelineError::external(SERVICE, format!("invalid response: {err}")))?;

        Ok(body.issues)
    }
}

/// Token-only basic auth: the token is the user name and the password is empty.
pub fn basic_auth_header(token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{token}:")))
}

#[derive(Debug, Default)]
pub struct OpenIssues {
    pub issues: Vec<SonarIssue>,
    pub failed_types: Vec<&'static str>,
}

/// One request per issue type; a failed type contributes nothing.
pub fn fetch_open_issues(source: &dyn IssueSource) -> OpenIssues {
    let mut open = OpenIssues::default();

    for issue_type in ISSUE_TYPES {
        match source.search(issue_type) {
            Ok(issues) => {
                info!(issue_type, count = issues.len(), "fetched open issues");
                open.issues.extend(issues);
            }
            Err(err) => {
                warn!(issue_type, error = %err, "failed to fetch open issues");
                open.failed_types.push(issue_type);
            }
        }
    }

    open
}
