use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::SyncArgs;
use crate::config::{InputConfig, StoreConfig};
use crate::error::PipelineError;
use crate::metrics::load_measures;
use crate::model::{SnapshotBody, SnapshotDocument};
use crate::store::{DocumentStore, PersistOutcome, open_store, persist_snapshot};
use crate::util::report_timestamp;

pub fn run(args: SyncArgs) -> Result<()> {
    let stdout = io::stdout();
    run_with_output(args, &mut stdout.lock())
}

/// `--dry-run` prints the snapshot to `output` and never opens the store.
fn run_with_output(args: SyncArgs, output: &mut dyn Write) -> Result<()> {
    let input = InputConfig::from_args(&args.input);
    let store_config = StoreConfig::from_args(&args.store);
    let project = ProjectIdentity {
        key: args.project_key.clone(),
        name: args.project_name.clone(),
    };

    if args.dry_run {
        if let Some(snapshot) = build_snapshot(&input, &project)? {
            write_snapshot_json(output, &snapshot)?;
            info!(project_key = ?project.key, "sync dry-run complete");
        }
        return Ok(());
    }

    let mut store = open_store(&store_config);
    match execute(&input, &project, store.as_mut(), &store_config.collection)? {
        SyncOutcome::Skipped => {}
        SyncOutcome::Completed(PersistOutcome::Persisted { id }) => {
            info!(project_key = ?project.key, id, "synced analysis results");
        }
        SyncOutcome::Completed(PersistOutcome::Failed { reason }) => {
            warn!(project_key = ?project.key, reason = %reason, "analysis results not synced");
        }
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct ProjectIdentity {
    pub key: Option<String>,
    pub name: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Input lacked `component.measures`; nothing was written.
    Skipped,
    Completed(PersistOutcome),
}

pub fn execute(
    input: &InputConfig,
    project: &ProjectIdentity,
    store: &mut dyn DocumentStore,
    collection: &str,
) -> Result<SyncOutcome> {
    let Some(snapshot) = build_snapshot(input, project)? else {
        return Ok(SyncOutcome::Skipped);
    };

    Ok(SyncOutcome::Completed(persist_snapshot(
        store, collection, &snapshot,
    )))
}

/// A structurally invalid result file is logged and yields `None`.
pub fn build_snapshot(
    input: &InputConfig,
    project: &ProjectIdentity,
) -> Result<Option<SnapshotDocument>> {
    let measures = match load_measures(&input.sonar_json) {
        Ok(measures) => measures,
        Err(err @ PipelineError::MalformedInput { .. }) => {
            warn!(
                path = %input.sonar_json.display(),
                error = %err,
                "invalid SonarQube JSON format, skipping sync"
            );
            return Ok(None);
        }
        Err(err) => return Err(err).context("failed to load analysis results"),
    };

    Ok(Some(SnapshotDocument {
        project_key: project.key.clone(),
        project_name: Some(project.name.clone()),
        generated_at: report_timestamp(input.utc_offset),
        body: SnapshotBody::Analysis(measures.to_map()),
    }))
}

fn write_snapshot_json(output: &mut dyn Write, snapshot: &SnapshotDocument) -> Result<()> {
    let mut output = io::BufWriter::new(output);
    serde_json::to_writer_pretty(&mut output, snapshot)
        .context("failed to serialize snapshot json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use serde_json::json;

    use super::*;
    use crate::cli::{InputArgs, StoreArgs};
    use crate::config::offset_from_minutes;
    use crate::store::{SqliteDocumentStore, UnavailableStore};

    const COLLECTION: &str = "analysis_results";

    fn input_with(dir: &Path, contents: &str) -> InputConfig {
        let path: PathBuf = dir.join("sonar_results.json");
        fs::write(&path, contents).expect("write fixture");
        InputConfig {
            sonar_json: path,
            utc_offset: offset_from_minutes(330),
        }
    }

    fn project() -> ProjectIdentity {
        ProjectIdentity {
            key: Some("demo-project".to_string()),
            name: "Unnamed Project".to_string(),
        }
    }

    fn valid_results() -> String {
        json!({
            "component": {
                "measures": [
                    {"metric": "bugs", "value": "2"},
                    {"metric": "coverage", "value": "88.1"},
                    {"metric": "ncloc"}
                ]
            }
        })
        .to_string()
    }

    #[test]
    fn rerun_adds_one_snapshot_per_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = input_with(dir.path(), &valid_results());
        let db_path = dir.path().join("snapshots.sqlite");

        for expected in 1..=2 {
            let mut store = SqliteDocumentStore::open(&db_path, "sonarqube_db").expect("store");
            let before = store.count(COLLECTION).expect("count");

            let outcome = execute(&input, &project(), &mut store, COLLECTION).expect("sync");

            assert!(matches!(
                outcome,
                SyncOutcome::Completed(PersistOutcome::Persisted { .. })
            ));
            assert_eq!(store.count(COLLECTION).expect("count"), before + 1);
            assert_eq!(before + 1, expected);
        }

        let store = SqliteDocumentStore::open(&db_path, "sonarqube_db").expect("store");
        let documents = store.documents(COLLECTION).expect("documents");
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0]["analysis"], documents[1]["analysis"]);
        assert_eq!(documents[0]["analysis"]["ncloc"], "0");
        assert_eq!(documents[0]["project_name"], "Unnamed Project");
    }

    #[test]
    fn malformed_input_is_skipped_without_writing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = input_with(dir.path(), r#"{"component": {"key": "demo"}}"#);
        let mut store = SqliteDocumentStore::open_in_memory("sonarqube_db").expect("store");

        let outcome = execute(&input, &project(), &mut store, COLLECTION).expect("sync");

        assert_eq!(outcome, SyncOutcome::Skipped);
        assert_eq!(store.count(COLLECTION).expect("count"), 0);
    }

    #[test]
    fn missing_input_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = InputConfig {
            sonar_json: dir.path().join("absent.json"),
            utc_offset: offset_from_minutes(330),
        };
        let mut store = SqliteDocumentStore::open_in_memory("sonarqube_db").expect("store");

        assert!(execute(&input, &project(), &mut store, COLLECTION).is_err());
    }

    #[test]
    fn store_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = input_with(dir.path(), &valid_results());
        let mut store = UnavailableStore::new("auth failed");

        let outcome = execute(&input, &project(), &mut store, COLLECTION).expect("sync");

        assert!(matches!(
            outcome,
            SyncOutcome::Completed(PersistOutcome::Failed { .. })
        ));
    }

    #[test]
    fn dry_run_prints_snapshot_without_touching_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = input_with(dir.path(), &valid_results());
        let db_path = dir.path().join("snapshots.sqlite");
        let args = SyncArgs {
            input: InputArgs {
                sonar_json: input.sonar_json.clone(),
                utc_offset_minutes: 330,
            },
            store: StoreArgs {
                db_uri: db_path.display().to_string(),
                db_name: "sonarqube_db".to_string(),
                db_collection: COLLECTION.to_string(),
            },
            project_key: Some("demo-project".to_string()),
            project_name: "Demo".to_string(),
            dry_run: true,
        };
        let mut output = Vec::new();

        run_with_output(args, &mut output).expect("dry run");

        let printed: serde_json::Value =
            serde_json::from_slice(&output).expect("dry run prints json");
        assert_eq!(printed["project_key"], "demo-project");
        assert_eq!(printed["project_name"], "Demo");
        assert_eq!(printed["analysis"]["bugs"], "2");
        assert_eq!(printed["analysis"]["ncloc"], "0");
        assert!(!db_path.exists());
    }
}
