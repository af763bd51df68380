//! `tar` backed [`ArchiveService`].

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use super::ArchiveService;
use crate::errors::ExtractError;
use crate::models::ExportManifest;

/// Runs `tar -czf` from the install root.
pub struct TarService {
    bin: String,
}

impl TarService {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    fn command(&self, workdir: &Path, manifest: &ExportManifest, dest: &Path) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.current_dir(workdir).arg("-czf").arg(dest);
        // excludes are positional in GNU tar and must precede the members they filter
        for exclude in &manifest.excludes {
            cmd.arg(format!("--exclude={}", exclude));
        }
        cmd.arg("--").args(&manifest.includes);
        cmd
    }
}

#[async_trait]
impl ArchiveService for TarService {
    async fn create(
        &self,
        workdir: &Path,
        manifest: &ExportManifest,
        dest: &Path,
    ) -> Result<(), ExtractError> {
        let output = self
            .command(workdir, manifest, dest)
            .output()
            .await
            .map_err(|e| {
                ExtractError::ArchiveFailed(format!("Unable to run {}: {}", self.bin, e))
            })?;

        if !output.status.success() {
            tracing::warn!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "{} exited unsuccessfully, the archive may be incomplete",
                self.bin
            );
        }

        Ok(())
    }
}
