//! Configuration module for the extractor.
//!
//! All configuration is loaded from environment variables (and an optional `.env` file)
//! with sensible defaults. Nothing here is written back.

use std::env;
use std::path::PathBuf;

use crate::errors::ExtractError;
use crate::models::{is_safe_identifier, GlobalTables, PlatformLayout};

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
    pub name: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection settings
    pub db: DbConfig,
    /// Absolute path of the install root
    pub install_root: PathBuf,
    /// Content directory (plugins, themes, uploads, dropins)
    pub content_dir: PathBuf,
    /// Must-use plugin directory
    pub mu_plugin_dir: PathBuf,
    /// Base table prefix of the network
    pub table_prefix: String,
    /// Whether the install runs in multisite mode
    pub multisite: bool,
    /// Shared user table name, when the install overrides it
    pub custom_user_table: Option<String>,
    /// Shared user meta table name, when the install overrides it
    pub custom_user_meta_table: Option<String>,
    /// Dump binary
    pub mysqldump_bin: String,
    /// Archive binary
    pub tar_bin: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ExtractError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ExtractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| ExtractError::Config(format!("{} must be set", key)))
        };

        let (host, port) = split_host(
            &var("EXTRACT_DB_HOST").unwrap_or_else(|| "localhost".to_string()),
        )?;

        let db = DbConfig {
            host,
            port,
            user: required("EXTRACT_DB_USER")?,
            password: lookup("EXTRACT_DB_PASSWORD").unwrap_or_default(),
            name: required("EXTRACT_DB_NAME")?,
        };

        let install_root = PathBuf::from(required("EXTRACT_INSTALL_ROOT")?);
        if !install_root.is_absolute() {
            return Err(ExtractError::Config(format!(
                "EXTRACT_INSTALL_ROOT must be an absolute path, got {}",
                install_root.display()
            )));
        }

        let content_dir = var("EXTRACT_CONTENT_DIR")
            .map(|dir| install_root.join(dir))
            .unwrap_or_else(|| install_root.join("wp-content"));

        let mu_plugin_dir = var("EXTRACT_MU_PLUGIN_DIR")
            .map(|dir| install_root.join(dir))
            .unwrap_or_else(|| content_dir.join("mu-plugins"));

        let table_prefix = var("EXTRACT_TABLE_PREFIX").unwrap_or_else(|| "wp_".to_string());
        if !is_safe_identifier(&table_prefix) {
            return Err(ExtractError::Config(format!(
                "EXTRACT_TABLE_PREFIX contains unsupported characters: {}",
                table_prefix
            )));
        }

        let multisite = match var("EXTRACT_MULTISITE") {
            Some(raw) => parse_bool("EXTRACT_MULTISITE", &raw)?,
            None => false,
        };

        let log_json = match var("EXTRACT_LOG_FORMAT").as_deref() {
            None | Some("text") => false,
            Some("json") => true,
            Some(other) => {
                return Err(ExtractError::Config(format!(
                    "EXTRACT_LOG_FORMAT must be text or json, got {}",
                    other
                )))
            }
        };

        Ok(Self {
            db,
            install_root,
            content_dir,
            mu_plugin_dir,
            table_prefix,
            multisite,
            custom_user_table: var("EXTRACT_CUSTOM_USER_TABLE"),
            custom_user_meta_table: var("EXTRACT_CUSTOM_USER_META_TABLE"),
            mysqldump_bin: var("EXTRACT_MYSQLDUMP_BIN").unwrap_or_else(|| "mysqldump".to_string()),
            tar_bin: var("EXTRACT_TAR_BIN").unwrap_or_else(|| "tar".to_string()),
            log_level: var("EXTRACT_LOG_LEVEL").unwrap_or_else(|| "warn".to_string()),
            log_json,
        })
    }

    /// Filesystem layout of the install.
    pub fn layout(&self) -> PlatformLayout {
        PlatformLayout {
            install_root: self.install_root.clone(),
            content_dir: self.content_dir.clone(),
            mu_plugin_dir: self.mu_plugin_dir.clone(),
        }
    }

    /// Names of the network-wide user tables.
    pub fn global_tables(&self) -> GlobalTables {
        GlobalTables {
            base_prefix: self.table_prefix.clone(),
            users: self
                .custom_user_table
                .clone()
                .unwrap_or_else(|| format!("{}users", self.table_prefix)),
            usermeta: self
                .custom_user_meta_table
                .clone()
                .unwrap_or_else(|| format!("{}usermeta", self.table_prefix)),
        }
    }
}

fn split_host(raw: &str) -> Result<(String, Option<u16>), ExtractError> {
    match raw.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse().map_err(|_| {
                ExtractError::Config(format!("Invalid EXTRACT_DB_HOST port: {}", raw))
            })?;
            Ok((host.to_string(), Some(port)))
        }
        None => Ok((raw.to_string(), None)),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ExtractError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ExtractError::Config(format!(
            "{} must be a boolean, got {}",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("EXTRACT_DB_USER", "wp"),
        ("EXTRACT_DB_NAME", "network"),
        ("EXTRACT_INSTALL_ROOT", "/var/www/html"),
    ];

    #[test]
    fn test_default_config() {
        let config = Config::from_lookup(lookup(MINIMAL)).unwrap();

        assert_eq!(config.db.host, "localhost");
        assert_eq!(config.db.port, None);
        assert_eq!(config.db.password, "");
        assert_eq!(config.content_dir, PathBuf::from("/var/www/html/wp-content"));
        assert_eq!(
            config.mu_plugin_dir,
            PathBuf::from("/var/www/html/wp-content/mu-plugins")
        );
        assert_eq!(config.table_prefix, "wp_");
        assert!(!config.multisite);
        assert_eq!(config.mysqldump_bin, "mysqldump");
        assert_eq!(config.tar_bin, "tar");
        assert_eq!(config.log_level, "warn");
        assert!(!config.log_json);

        let tables = config.global_tables();
        assert_eq!(tables.users, "wp_users");
        assert_eq!(tables.usermeta, "wp_usermeta");
    }

    #[test]
    fn test_host_with_port_and_overrides() {
        let mut pairs = MINIMAL.to_vec();
        pairs.extend_from_slice(&[
            ("EXTRACT_DB_HOST", "db.internal:3307"),
            ("EXTRACT_MULTISITE", "true"),
            ("EXTRACT_TABLE_PREFIX", "net_"),
            ("EXTRACT_CUSTOM_USER_TABLE", "shared_users"),
            ("EXTRACT_LOG_FORMAT", "json"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.db.host, "db.internal");
        assert_eq!(config.db.port, Some(3307));
        assert!(config.multisite);
        assert!(config.log_json);
        let tables = config.global_tables();
        assert_eq!(tables.users, "shared_users");
        assert_eq!(tables.usermeta, "net_usermeta");
    }

    #[test]
    fn test_missing_required_variable() {
        let err = Config::from_lookup(lookup(&[("EXTRACT_DB_USER", "wp")])).unwrap_err();
        assert_eq!(err, ExtractError::Config("EXTRACT_DB_NAME must be set".to_string()));
    }

    #[test]
    fn test_rejects_malformed_values() {
        let mut bad_bool = MINIMAL.to_vec();
        bad_bool.push(("EXTRACT_MULTISITE", "maybe"));
        assert!(matches!(
            Config::from_lookup(lookup(&bad_bool)),
            Err(ExtractError::Config(_))
        ));

        let mut bad_prefix = MINIMAL.to_vec();
        bad_prefix.push(("EXTRACT_TABLE_PREFIX", "wp`; drop"));
        assert!(matches!(
            Config::from_lookup(lookup(&bad_prefix)),
            Err(ExtractError::Config(_))
        ));

        let relative_root = [
            ("EXTRACT_DB_USER", "wp"),
            ("EXTRACT_DB_NAME", "network"),
            ("EXTRACT_INSTALL_ROOT", "html"),
        ];
        assert!(matches!(
            Config::from_lookup(lookup(&relative_root)),
            Err(ExtractError::Config(_))
        ));
    }
}
