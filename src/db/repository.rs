//! MySQL implementation of the platform seams.
//!
//! Identifiers are interpolated (after validation); values are always bound.

use async_trait::async_trait;
use sqlx::mysql::MySqlPool;
use sqlx::Row;

use super::php;
use crate::errors::ExtractError;
use crate::models::{quote_ident, BlogRecord, GlobalTables, TenantContext, ThemeSlugs};
use crate::platform::{SqlExecutor, TenantRegistry, UserMetaRow};

/// Database repository for all registry lookups and staging statements.
#[derive(Clone)]
pub struct Repository {
    pool: MySqlPool,
    tables: GlobalTables,
}

impl Repository {
    pub fn new(pool: MySqlPool, tables: GlobalTables) -> Self {
        Self { pool, tables }
    }

    fn network_table(&self, name: &str) -> Result<String, ExtractError> {
        quote_ident(&format!("{}{}", self.tables.base_prefix, name))
    }

    /// Raw value of a per-site option.
    async fn site_option(
        &self,
        tenant: &TenantContext,
        name: &str,
    ) -> Result<Option<String>, ExtractError> {
        let table = quote_ident(&format!("{}options", tenant.table_prefix))?;
        let row = sqlx::query(&format!(
            "SELECT option_value FROM {} WHERE option_name = ? LIMIT 1",
            table
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.try_get("option_value")).transpose()?)
    }

    /// Raw value of a network-wide setting.
    async fn network_option(
        &self,
        network_id: u64,
        key: &str,
    ) -> Result<Option<String>, ExtractError> {
        let table = self.network_table("sitemeta")?;
        let row = sqlx::query(&format!(
            "SELECT meta_value FROM {} WHERE site_id = ? AND meta_key = ? LIMIT 1",
            table
        ))
        .bind(network_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|r| r.try_get::<Option<String>, _>("meta_value"))
            .transpose()?
            .flatten())
    }
}

#[async_trait]
impl TenantRegistry for Repository {
    async fn blog_details(&self, blog_id: u64) -> Result<Option<BlogRecord>, ExtractError> {
        let table = self.network_table("blogs")?;
        let row = sqlx::query(&format!(
            "SELECT CAST(blog_id AS UNSIGNED) AS blog_id, CAST(site_id AS UNSIGNED) AS site_id, domain, path FROM {} WHERE blog_id = ?",
            table
        ))
        .bind(blog_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(BlogRecord {
                blog_id: row.try_get("blog_id")?,
                network_id: row.try_get("site_id")?,
                domain: row.try_get("domain")?,
                path: row.try_get("path")?,
            })),
            None => Ok(None),
        }
    }

    async fn super_admin_logins(&self, network_id: u64) -> Result<Vec<String>, ExtractError> {
        match self.network_option(network_id, "site_admins").await? {
            Some(raw) => php::string_values(&raw),
            None => Ok(Vec::new()),
        }
    }

    async fn user_id_by_login(&self, login: &str) -> Result<Option<u64>, ExtractError> {
        let table = quote_ident(&self.tables.users)?;
        let row = sqlx::query(&format!(
            "SELECT CAST(ID AS UNSIGNED) AS id FROM {} WHERE user_login = ? LIMIT 1",
            table
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.try_get("id")).transpose()?)
    }

    async fn member_user_ids(&self, tenant: &TenantContext) -> Result<Vec<u64>, ExtractError> {
        let table = quote_ident(&self.tables.usermeta)?;
        let rows = sqlx::query(&format!(
            "SELECT DISTINCT CAST(user_id AS UNSIGNED) AS user_id FROM {} WHERE meta_key = ? ORDER BY user_id",
            table
        ))
        .bind(tenant.capabilities_key())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| r.try_get("user_id").map_err(ExtractError::from))
            .collect()
    }

    async fn active_plugins(&self, tenant: &TenantContext) -> Result<Vec<String>, ExtractError> {
        match self.site_option(tenant, "active_plugins").await? {
            Some(raw) => php::string_values(&raw),
            None => Ok(Vec::new()),
        }
    }

    async fn network_plugins(&self, network_id: u64) -> Result<Vec<String>, ExtractError> {
        match self
            .network_option(network_id, "active_sitewide_plugins")
            .await?
        {
            Some(raw) => php::string_keys(&raw),
            None => Ok(Vec::new()),
        }
    }

    async fn theme_slugs(&self, tenant: &TenantContext) -> Result<ThemeSlugs, ExtractError> {
        let stylesheet = self
            .site_option(tenant, "stylesheet")
            .await?
            .unwrap_or_default();
        let template = self
            .site_option(tenant, "template")
            .await?
            .unwrap_or_else(|| stylesheet.clone());

        Ok(ThemeSlugs {
            stylesheet,
            template,
        })
    }
}

#[async_trait]
impl SqlExecutor for Repository {
    async fn execute(&self, sql: &str) -> Result<u64, ExtractError> {
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn count_rows(&self, table: &str) -> Result<u64, ExtractError> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {}", quote_ident(table)?))
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("n")?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn insert_user_meta(&self, table: &str, row: &UserMetaRow) -> Result<(), ExtractError> {
        sqlx::query(&format!(
            "INSERT INTO {} (user_id, meta_key, meta_value) VALUES (?, ?, ?)",
            quote_ident(table)?
        ))
        .bind(row.user_id)
        .bind(&row.meta_key)
        .bind(&row.meta_value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
