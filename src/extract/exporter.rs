//! Dump the site's tables and clean up the staged user tables.

use std::io::ErrorKind;
use std::path::Path;

use tokio::io::AsyncWriteExt;

use super::stager::drop_staged_sql;
use crate::errors::ExtractError;
use crate::models::{TableSet, UserTablePlan};
use crate::platform::SqlExecutor;
use crate::process::DumpService;

const EXPORT_FAILED: &str = "There was an error exporting the archive.";

/// Dump `tables` into `dest`, returning the dump size in bytes.
///
/// The staged tables are dropped only once the dump is known to be non-empty, so a failed
/// export leaves them behind for inspection.
pub async fn export_database(
    dump: &dyn DumpService,
    sql: &dyn SqlExecutor,
    tables: &TableSet,
    plan: &UserTablePlan,
    dest: &Path,
) -> Result<u64, ExtractError> {
    tracing::info!("Begin exporting tables");
    let listing = serde_json::to_string(tables)?;
    tracing::debug!("Exporting tables {}", listing);

    if let Err(err) = dump.export(&tables.names(), dest).await {
        remove_partial(dest).await;
        return Err(err);
    }

    let size = match tokio::fs::metadata(dest).await {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ExtractError::ExportFailed(EXPORT_FAILED.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    if size == 0 {
        remove_partial(dest).await;
        return Err(ExtractError::ExportFailed(EXPORT_FAILED.to_string()));
    }

    if !plan.renames.is_empty() {
        append_renames(dest, &plan.renames.statements()).await?;
    }
    tracing::info!("Database tables exported");

    sql.execute(&drop_staged_sql(plan)?).await?;

    Ok(size)
}

async fn append_renames(dest: &Path, statements: &[String]) -> Result<(), ExtractError> {
    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(dest)
        .await?;

    let mut tail = String::from("\n");
    for statement in statements {
        tail.push_str(statement);
        tail.push('\n');
    }
    file.write_all(tail.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Delete a partial artifact, tolerating its absence.
pub(crate) async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Removed partial artifact {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
    }
}
