//! Install layout and network-wide table names.

use std::path::{Path, PathBuf};

use super::TenantContext;

/// Network-wide tables shared by every site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalTables {
    pub base_prefix: String,
    pub users: String,
    pub usermeta: String,
}

/// Where the install keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformLayout {
    pub install_root: PathBuf,
    pub content_dir: PathBuf,
    pub mu_plugin_dir: PathBuf,
}

impl PlatformLayout {
    pub fn plugins_dir(&self) -> PathBuf {
        self.content_dir.join("plugins")
    }

    pub fn themes_dir(&self) -> PathBuf {
        self.content_dir.join("themes")
    }

    /// Upload base directory of a site. Only secondary sites nest under `sites/<id>`.
    pub fn uploads_dir(&self, tenant: &TenantContext) -> PathBuf {
        let uploads = self.content_dir.join("uploads");
        if tenant.primary {
            uploads
        } else {
            uploads.join("sites").join(tenant.id.to_string())
        }
    }

    /// Path relative to the install root, or the path unchanged if it lies outside.
    pub fn relative(&self, path: &Path) -> String {
        match path.strip_prefix(&self.install_root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Whether `name` can be used as a table name or prefix without quoting tricks.
pub fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
