//! External processes that produce the run's artifacts.
//!
//! Both services only have to leave a file at `dest`; the stages decide whether the file is
//! usable by looking at it, not at the exit status.

mod mysqldump;
mod tar;

pub use mysqldump::MysqldumpService;
pub use tar::TarService;

use std::path::Path;

use async_trait::async_trait;

use crate::errors::ExtractError;
use crate::models::ExportManifest;

/// Writes a SQL dump of the given tables to `dest`.
#[async_trait]
pub trait DumpService: Send + Sync {
    async fn export(&self, tables: &[String], dest: &Path) -> Result<(), ExtractError>;
}

/// Writes a compressed archive of the manifest, resolved against `workdir`, to `dest`.
#[async_trait]
pub trait ArchiveService: Send + Sync {
    async fn create(
        &self,
        workdir: &Path,
        manifest: &ExportManifest,
        dest: &Path,
    ) -> Result<(), ExtractError>;
}
