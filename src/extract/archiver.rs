//! Collect the site's files and pack them, together with the dump, into the final archive.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::exporter::remove_partial;
use crate::errors::ExtractError;
use crate::models::{ArtifactPaths, ExportManifest, PlatformLayout, TenantContext, ThemeSlugs};
use crate::platform::TenantRegistry;
use crate::process::ArchiveService;

/// Drop-in files the platform loads from the content directory.
pub const KNOWN_DROPINS: &[&str] = &[
    "advanced-cache.php",
    "db.php",
    "db-error.php",
    "install.php",
    "maintenance.php",
    "object-cache.php",
    "php-error.php",
    "fatal-error-handler.php",
    "sunrise.php",
    "blog-deleted.php",
    "blog-inactive.php",
    "blog-suspended.php",
];

/// Everything on disk that belongs to the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSources {
    pub uploads_dir: PathBuf,
    pub active_plugins: Vec<String>,
    pub network_plugins: Vec<String>,
    pub dropins: Vec<PathBuf>,
    pub themes: ThemeSlugs,
}

pub async fn gather_sources(
    registry: &dyn TenantRegistry,
    layout: &PlatformLayout,
    tenant: &TenantContext,
) -> Result<ArchiveSources, ExtractError> {
    Ok(ArchiveSources {
        uploads_dir: layout.uploads_dir(tenant),
        active_plugins: registry.active_plugins(tenant).await?,
        network_plugins: registry.network_plugins(tenant.network_id).await?,
        dropins: find_dropins(&layout.content_dir).await,
        themes: registry.theme_slugs(tenant).await?,
    })
}

/// Drop-ins present in `content_dir`.
pub async fn find_dropins(content_dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for name in KNOWN_DROPINS {
        let path = content_dir.join(name);
        if let Ok(meta) = tokio::fs::metadata(&path).await {
            if meta.is_file() {
                found.push(path);
            }
        }
    }
    found
}

/// Top-level entry of a plugin under the plugins directory: `akismet/akismet.php` → `akismet`.
fn plugin_root(plugin: &str) -> Option<&str> {
    plugin
        .trim_start_matches('/')
        .split('/')
        .next()
        .filter(|root| !root.is_empty())
}

pub fn build_manifest(
    layout: &PlatformLayout,
    dump: &Path,
    sources: &ArchiveSources,
    collision: bool,
) -> ExportManifest {
    let mut manifest = ExportManifest::default();
    manifest.include(layout.relative(dump));
    manifest.include(layout.relative(&sources.uploads_dir));

    let plugins_dir = layout.plugins_dir();
    for plugin in sources
        .active_plugins
        .iter()
        .chain(&sources.network_plugins)
    {
        if let Some(root) = plugin_root(plugin) {
            manifest.include(layout.relative(&plugins_dir.join(root)));
        }
    }

    manifest.include(layout.relative(&layout.mu_plugin_dir));

    for dropin in &sources.dropins {
        manifest.include(layout.relative(dropin));
    }

    let themes_dir = layout.themes_dir();
    for slug in [&sources.themes.stylesheet, &sources.themes.template] {
        if !slug.is_empty() {
            manifest.include(layout.relative(&themes_dir.join(slug)));
        }
    }

    // Primary site uploads are not nested; `sites/` holds everyone else's files.
    if collision {
        manifest.exclude(format!("{}/sites", layout.relative(&sources.uploads_dir)));
    }

    manifest
}

/// Pack the manifest into the archive and drop the standalone dump. Returns the archive size.
pub async fn create_archive(
    archive: &dyn ArchiveService,
    layout: &PlatformLayout,
    mut manifest: ExportManifest,
    paths: &ArtifactPaths,
) -> Result<u64, ExtractError> {
    for missing in manifest.retain_existing(&layout.install_root) {
        tracing::warn!("Skipping {}, it does not exist", missing);
    }
    let listing = serde_json::to_string(&manifest)?;
    tracing::debug!("Archiving {}", listing);

    tracing::info!("Begin archiving files");
    if let Err(err) = archive
        .create(&layout.install_root, &manifest, &paths.archive)
        .await
    {
        remove_partial(&paths.archive).await;
        return Err(err);
    }

    let size = match tokio::fs::metadata(&paths.archive).await {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ExtractError::ArchiveFailed(
                "Unable to create the archive.".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    if size == 0 {
        remove_partial(&paths.archive).await;
        return Err(ExtractError::ArchiveFailed(
            "There was an error creating the archive.".to_string(),
        ));
    }

    // the dump now lives inside the archive
    tokio::fs::remove_file(&paths.dump).await?;

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlogRecord;

    fn layout() -> PlatformLayout {
        PlatformLayout {
            install_root: PathBuf::from("/srv/www"),
            content_dir: PathBuf::from("/srv/www/wp-content"),
            mu_plugin_dir: PathBuf::from("/srv/www/wp-content/mu-plugins"),
        }
    }

    fn tenant(id: u64) -> TenantContext {
        TenantContext::from_record(
            BlogRecord {
                blog_id: id,
                network_id: 1,
                domain: "example.com".to_string(),
                path: "/".to_string(),
            },
            "wp_",
        )
    }

    fn sources(tenant: &TenantContext) -> ArchiveSources {
        ArchiveSources {
            uploads_dir: layout().uploads_dir(tenant),
            active_plugins: vec![
                "akismet/akismet.php".to_string(),
                "hello.php".to_string(),
                "akismet/other.php".to_string(),
            ],
            network_plugins: vec!["jetpack/jetpack.php".to_string()],
            dropins: vec![PathBuf::from("/srv/www/wp-content/object-cache.php")],
            themes: ThemeSlugs {
                stylesheet: "child".to_string(),
                template: "parent".to_string(),
            },
        }
    }

    #[test]
    fn test_plugin_root() {
        assert_eq!(plugin_root("akismet/akismet.php"), Some("akismet"));
        assert_eq!(plugin_root("hello.php"), Some("hello.php"));
        assert_eq!(plugin_root("/jetpack/jetpack.php"), Some("jetpack"));
        assert_eq!(plugin_root(""), None);
    }

    #[test]
    fn test_manifest_for_secondary_site() {
        let site = tenant(5);
        let manifest = build_manifest(
            &layout(),
            Path::new("/srv/www/database-5.sql"),
            &sources(&site),
            false,
        );

        assert_eq!(
            manifest.includes,
            vec![
                "database-5.sql",
                "wp-content/uploads/sites/5",
                "wp-content/plugins/akismet",
                "wp-content/plugins/hello.php",
                "wp-content/plugins/jetpack",
                "wp-content/mu-plugins",
                "wp-content/object-cache.php",
                "wp-content/themes/child",
                "wp-content/themes/parent",
            ]
        );
        assert!(manifest.excludes.is_empty());
    }

    #[test]
    fn test_manifest_for_primary_site_excludes_other_sites() {
        let site = tenant(1);
        let mut src = sources(&site);
        src.themes.template = src.themes.stylesheet.clone();
        let manifest = build_manifest(&layout(), Path::new("/srv/www/database-1.sql"), &src, true);

        assert!(manifest.includes.contains(&"wp-content/uploads".to_string()));
        assert_eq!(manifest.excludes, vec!["wp-content/uploads/sites"]);
        let theme_entries = manifest
            .includes
            .iter()
            .filter(|p| p.starts_with("wp-content/themes/"))
            .count();
        assert_eq!(theme_entries, 1);
    }

    #[test]
    fn test_manifest_paths_are_install_relative() {
        let site = tenant(9);
        let manifest = build_manifest(
            &layout(),
            Path::new("/srv/www/database-9.sql"),
            &sources(&site),
            false,
        );
        assert!(manifest.includes.iter().all(|p| !p.starts_with("/srv/www")));
    }

    #[tokio::test]
    async fn test_find_dropins_only_reports_files() {
        let dir = tempfile::TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("object-cache.php"), "<?php")
            .await
            .unwrap();
        tokio::fs::create_dir(dir.path().join("db.php")).await.unwrap();
        tokio::fs::write(dir.path().join("unrelated.php"), "<?php")
            .await
            .unwrap();

        let found = find_dropins(dir.path()).await;
        assert_eq!(found, vec![dir.path().join("object-cache.php")]);
    }
}
