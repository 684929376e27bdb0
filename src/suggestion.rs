use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::GeminiConfig;
use crate::error::PipelineError;
use crate::model::{SonarIssue, SuggestionSource};

pub const FALLBACK_SUGGESTION: &str = "Manual review required. Suggestion unavailable.";

const SERVICE: &str = "suggestion";

pub trait SuggestionGenerator {
    fn generate(&self, prompt: &str) -> Result<String, PipelineError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub source: SuggestionSource,
}

impl Suggestion {
    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_SUGGESTION.to_string(),
            source: SuggestionSource::Fallback,
        }
    }
}

/// One attempt; any failure yields [`FALLBACK_SUGGESTION`].
pub fn suggest_or_fallback(generator: &dyn SuggestionGenerator, prompt: &str) -> Suggestion {
    match generator.generate(prompt) {
        Ok(text) => Suggestion {
            text,
            source: SuggestionSource::Generated,
        },
        Err(err) => {
            warn!(error = %err, "suggestion unavailable, using fallback");
            Suggestion::fallback()
        }
    }
}

pub fn metric_prompt(metric: &str, value: &str) -> String {
    format!(
        "Metric: {metric}, Value: {value}\n\
         Generate 3-4 clear, short, human-friendly action steps (each on a new line). \
         Skip markdown and no AI roleplay."
    )
}

pub fn issue_prompt(issue: &SonarIssue) -> String {
    format!(
        "Type: {}, Rule: {}, Message: {}\n\
         Give 3-4 short actionable steps to fix this issue. One per line. \
         Avoid markdown and intro text.",
        issue.issue_type.as_deref().unwrap_or("None"),
        issue.rule.as_deref().unwrap_or("None"),
        issue.message.as_deref().unwrap_or("None"),
    )
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// `generateContent` client for the Gemini REST API.
pub struct GeminiClient {
    agent: ureq::Agent,
    url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        let model = config
            .model
            .strip_prefix("models/")
            .unwrap_or(&config.model);

        Self {
            agent: ureq::AgentBuilder::new().timeout(config.timeout).build(),
            url: format!("{}/models/{model}:generateContent", config.endpoint),
            api_key: config.api_key.clone(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl SuggestionGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PipelineError::external(SERVICE, "no API key configured"))?;

        let request = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response: GenerateResponse = self
            .agent
            .post(&self.url)
            .set("x-goog-api-key", api_key)
            .send_json(&request)
            .map_err(|err| PipelineError::external(SERVICE, err))?
            .into_json()
            .map_err(|err| PipelineError::external(SERVICE, format!("invalid response: {err}")))?;

        response
            .text()
            .ok_or_else(|| PipelineError::external(SERVICE, "response contained no text"))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    struct Failing;

    impl SuggestionGenerator for Failing {
        fn generate(&self, _prompt: &str) -> Result<String, PipelineError> {
            Err(PipelineError::external(SERVICE, "quota exceeded"))
        }
    }

    fn client_for(server: &MockServer, api_key: Option<&str>) -> GeminiClient {
        GeminiClient::new(&GeminiConfig {
            api_key: api_key.map(str::to_string),
            model: "models/gemini-2.0-flash-lite".to_string(),
            endpoint: server.base_url(),
            timeout: Duration::from_secs(2),
        })
    }

    #[test]
    fn failure_falls_back_to_fixed_text() {
        let suggestion = suggest_or_fallback(&Failing, "Metric: bugs, Value: 3");
        assert_eq!(suggestion.text, FALLBACK_SUGGESTION);
        assert_eq!(suggestion.source, SuggestionSource::Fallback);
    }

    #[test]
    fn prompts_carry_item_details() {
        let prompt = metric_prompt("coverage", "42.0");
        assert!(prompt.starts_with("Metric: coverage, Value: 42.0\n"));

        let issue = SonarIssue {
            issue_type: Some("BUG".to_string()),
            rule: Some("java:S2259".to_string()),
            message: None,
            line: Some(3),
        };
        assert!(issue_prompt(&issue).starts_with("Type: BUG, Rule: java:S2259, Message: None\n"));
    }

    #[test]
    fn gemini_text_is_trimmed_and_joined() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.0-flash-lite:generateContent")
                .header("x-goog-api-key", "key-123")
                .json_body(json!({"contents": [{"parts": [{"text": "fix it"}]}]}));
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {
                        "parts": [{"text": "  Add a null check\n"}, {"text": "Write a test  "}]
                    }
                }]
            }));
        });

        let text = client_for(&server, Some("key-123"))
            .generate("fix it")
            .expect("generation should succeed");

        mock.assert();
        assert_eq!(text, "Add a null check\nWrite a test");
    }

    #[test]
    fn empty_candidates_are_a_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({"candidates": []}));
        });

        let client = client_for(&server, Some("key-123"));
        assert_eq!(suggest_or_fallback(&client, "x"), Suggestion::fallback());
    }

    #[test]
    fn missing_key_never_calls_out() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST);
            then.status(200);
        });

        let client = client_for(&server, None);
        assert!(!client.has_api_key());
        assert!(client.generate("x").is_err());
        mock.assert_hits(0);
    }
}
