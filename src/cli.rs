use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "sonar-insights",
    version,
    about = "SonarQube result evaluation, remediation suggestions and reporting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Flag unsafe metrics and open issues, attach AI suggestions, write the spreadsheet.
    Suggest(SuggestArgs),
    /// Render the HTML analysis summary used as an email body.
    EmailBody(EmailBodyArgs),
    /// Store the raw measures of one analysis as a snapshot document.
    Sync(SyncArgs),
    /// Show how many snapshots the store holds.
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    #[arg(long, env = "SONAR_JSON", default_value = "sonar_results.json")]
    pub sonar_json: PathBuf,

    #[arg(
        long,
        env = "REPORT_UTC_OFFSET_MINUTES",
        default_value_t = 330,
        allow_negative_numbers = true
    )]
    pub utc_offset_minutes: i32,
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, env = "DB_URI", default_value = "sonar_snapshots.sqlite")]
    pub db_uri: String,

    #[arg(long, env = "DB_NAME", default_value = "sonarqube_db")]
    pub db_name: String,

    #[arg(long, env = "DB_COLLECTION", default_value = "analysis_results")]
    pub db_collection: String,
}

#[derive(Args, Debug, Clone)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, env = "SONAR_HOST_URL")]
    pub sonar_host_url: String,

    #[arg(long, env = "SONAR_AUTH_TOKEN", hide_env_values = true)]
    pub sonar_auth_token: String,

    #[arg(long, env = "SONAR_PROJECT_KEY")]
    pub project_key: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.0-flash-lite")]
    pub gemini_model: String,

    #[arg(
        long,
        env = "GEMINI_ENDPOINT",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    pub gemini_endpoint: String,

    #[arg(long, env = "WORKSPACE", default_value = "/tmp")]
    pub workspace: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct EmailBodyArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long, env = "EMAIL_BODY_PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, env = "PROJECT_KEY")]
    pub project_key: Option<String>,

    #[arg(long, env = "PROJECT_NAME", default_value = "Unnamed Project")]
    pub project_name: String,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, env = "DB_URI", default_value = "sonar_snapshots.sqlite")]
    pub db_uri: String,

    #[arg(long, env = "DB_NAME", default_value = "sonarqube_db")]
    pub db_name: String,
}
