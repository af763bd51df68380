//! Archive manifest and artifact naming.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Install-relative paths handed to the archive process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportManifest {
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl ExportManifest {
    /// Add an include, ignoring repeats.
    pub fn include(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.includes.contains(&path) {
            self.includes.push(path);
        }
    }

    pub fn exclude(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.excludes.contains(&path) {
            self.excludes.push(path);
        }
    }

    /// Drop includes that do not exist under `root`, returning the dropped ones.
    pub fn retain_existing(&mut self, root: &Path) -> Vec<String> {
        let (kept, missing): (Vec<String>, Vec<String>) = self
            .includes
            .drain(..)
            .partition(|p| root.join(p).exists());
        self.includes = kept;
        missing
    }
}

/// Files produced by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dump: PathBuf,
    pub archive: PathBuf,
}

impl ArtifactPaths {
    pub fn for_tenant(root: &Path, tenant_id: u64, archive_name: Option<&str>) -> Self {
        let archive = match archive_name {
            Some(name) => root.join(name),
            None => root.join(format!("archive-{}.tar.gz", tenant_id)),
        };

        Self {
            dump: root.join(format!("database-{}.sql", tenant_id)),
            archive,
        }
    }
}
