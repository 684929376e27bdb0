use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::config::db_path_from_uri;
use crate::store::SqliteDocumentStore;

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = db_path_from_uri(&args.db_uri)?;

    info!(path = %db_path.display(), database = %args.db_name, "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "snapshot database missing");
        return Ok(());
    }

    let store = SqliteDocumentStore::open(&db_path, &args.db_name)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    let counts = store.collection_counts()?;

    if counts.is_empty() {
        warn!(database = %args.db_name, "no snapshots stored");
    }

    for (collection, snapshots) in counts {
        info!(collection = %collection, snapshots, "collection status");
    }

    Ok(())
}
