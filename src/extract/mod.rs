//! The extraction pipeline.
//!
//! Four stages run strictly in order, each handing an explicit value to the next:
//! resolve the site, stage its user tables, dump the database, archive the files.
//! The first failure ends the run.

pub mod archiver;
pub mod exporter;
pub mod guidance;
pub mod resolver;
pub mod stager;

use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::ExtractError;
use crate::models::{ArtifactPaths, GlobalTables, PlatformLayout, TableSet};
use crate::platform::{SqlExecutor, TenantRegistry};
use crate::process::{ArchiveService, DumpService};

pub use guidance::{format_size, OperatorGuidance};

/// Install-wide settings the pipeline needs.
#[derive(Debug, Clone)]
pub struct ExtractSettings {
    pub multisite: bool,
    pub global_tables: GlobalTables,
    pub layout: PlatformLayout,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub archive: PathBuf,
    pub archive_size: u64,
    pub no_users_exported: bool,
    pub guidance: OperatorGuidance,
}

impl ExtractionReport {
    /// One-line success message.
    pub fn summary(&self) -> String {
        let name = self
            .archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.archive.display().to_string());
        format!("{} created! ({})", name, format_size(self.archive_size))
    }
}

/// The extraction pipeline and its collaborators.
#[derive(Clone)]
pub struct Extractor {
    pub registry: Arc<dyn TenantRegistry>,
    pub sql: Arc<dyn SqlExecutor>,
    pub dump: Arc<dyn DumpService>,
    pub archive: Arc<dyn ArchiveService>,
    pub settings: Arc<ExtractSettings>,
}

impl Extractor {
    /// Extract one site. `archive_name` overrides the default `archive-<id>.tar.gz`.
    pub async fn run(
        &self,
        blog_id: u64,
        archive_name: Option<&str>,
    ) -> Result<ExtractionReport, ExtractError> {
        let settings = &self.settings;
        let global = &settings.global_tables;
        let layout = &settings.layout;

        let tenant = resolver::resolve(
            self.registry.as_ref(),
            settings.multisite,
            &global.base_prefix,
            blog_id,
        )
        .await?;
        tracing::info!(
            "Extracting site {} ({}{})",
            tenant.id,
            tenant.domain,
            tenant.url_path
        );

        let plan = stager::plan_user_tables(&tenant, global)?;
        let tables = TableSet::for_tenant(&tenant, &plan);

        let users = stager::collect_user_ids(self.registry.as_ref(), &tenant).await?;
        let staging =
            stager::stage_user_tables(self.sql.as_ref(), &tenant, global, &plan, users).await?;

        let paths = ArtifactPaths::for_tenant(&layout.install_root, tenant.id, archive_name);
        exporter::export_database(
            self.dump.as_ref(),
            self.sql.as_ref(),
            &tables,
            &plan,
            &paths.dump,
        )
        .await?;

        let sources = archiver::gather_sources(self.registry.as_ref(), layout, &tenant).await?;
        let manifest = archiver::build_manifest(layout, &paths.dump, &sources, plan.collision);
        let archive_size =
            archiver::create_archive(self.archive.as_ref(), layout, manifest, &paths).await?;

        let uploads_relocation = if plan.collision {
            None
        } else {
            Some(layout.relative(&sources.uploads_dir))
        };

        Ok(ExtractionReport {
            archive: paths.archive,
            archive_size,
            no_users_exported: staging.no_users_exported,
            guidance: OperatorGuidance {
                table_prefix: tenant.table_prefix.clone(),
                old_url: tenant.old_url(),
                uploads_relocation,
            },
        })
    }
}
