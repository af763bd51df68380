//! Seams to the host platform.
//!
//! The extractor never talks to the database directly; it goes through these two traits so the
//! stages can run against in-memory fakes. [`crate::db::Repository`] implements both for MySQL.

use async_trait::async_trait;

use crate::errors::ExtractError;
use crate::models::{BlogRecord, TenantContext, ThemeSlugs};

/// Read-only lookups against the network's site and user registries.
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    /// Registry row for a site, `None` when the id is unknown.
    async fn blog_details(&self, blog_id: u64) -> Result<Option<BlogRecord>, ExtractError>;

    /// Logins of the network's super administrators.
    async fn super_admin_logins(&self, network_id: u64) -> Result<Vec<String>, ExtractError>;

    async fn user_id_by_login(&self, login: &str) -> Result<Option<u64>, ExtractError>;

    /// Ids of users holding a role on the site.
    async fn member_user_ids(&self, tenant: &TenantContext) -> Result<Vec<u64>, ExtractError>;

    /// Plugin files active on the site, relative to the plugins directory.
    async fn active_plugins(&self, tenant: &TenantContext) -> Result<Vec<String>, ExtractError>;

    /// Plugin files active across the network, relative to the plugins directory.
    async fn network_plugins(&self, network_id: u64) -> Result<Vec<String>, ExtractError>;

    async fn theme_slugs(&self, tenant: &TenantContext) -> Result<ThemeSlugs, ExtractError>;
}

/// A row for the user meta table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMetaRow {
    pub user_id: u64,
    pub meta_key: String,
    pub meta_value: String,
}

/// Raw statement execution used while staging user tables.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute a statement, returning the affected row count.
    async fn execute(&self, sql: &str) -> Result<u64, ExtractError>;

    async fn count_rows(&self, table: &str) -> Result<u64, ExtractError>;

    async fn insert_user_meta(&self, table: &str, row: &UserMetaRow) -> Result<(), ExtractError>;
}
