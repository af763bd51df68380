//! `mysqldump` backed [`DumpService`].

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::DumpService;
use crate::config::DbConfig;
use crate::errors::ExtractError;

/// Runs `mysqldump` with stdout redirected into the dump file.
pub struct MysqldumpService {
    bin: String,
    db: DbConfig,
}

impl MysqldumpService {
    pub fn new(bin: impl Into<String>, db: DbConfig) -> Self {
        Self {
            bin: bin.into(),
            db,
        }
    }

    fn command(&self, tables: &[String]) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("-h").arg(&self.db.host);
        if let Some(port) = self.db.port {
            cmd.arg("--port").arg(port.to_string());
        }
        // password goes through the environment so it never shows up in `ps`
        cmd.arg("-u")
            .arg(&self.db.user)
            .env("MYSQL_PWD", &self.db.password)
            .arg(&self.db.name)
            .args(tables);
        cmd
    }
}

#[async_trait]
impl DumpService for MysqldumpService {
    async fn export(&self, tables: &[String], dest: &Path) -> Result<(), ExtractError> {
        let file = tokio::fs::File::create(dest).await?.into_std().await;

        let child = self
            .command(tables)
            .stdout(Stdio::from(file))
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExtractError::ExportFailed(format!("Unable to run {}: {}", self.bin, e)))?;
        let output = child.wait_with_output().await?;

        if !output.status.success() {
            tracing::warn!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "{} exited unsuccessfully, the dump may be incomplete",
                self.bin
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(port: Option<u16>) -> DbConfig {
        DbConfig {
            host: "db.internal".to_string(),
            port,
            user: "wp".to_string(),
            password: "secret".to_string(),
            name: "network".to_string(),
        }
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_command_line_keeps_password_out_of_args() {
        let service = MysqldumpService::new("mysqldump", db(Some(3307)));
        let cmd = service.command(&["wp_5_posts".to_string(), "wp_5_users".to_string()]);

        assert_eq!(
            args(&cmd),
            vec![
                "-h",
                "db.internal",
                "--port",
                "3307",
                "-u",
                "wp",
                "network",
                "wp_5_posts",
                "wp_5_users"
            ]
        );
        assert!(!args(&cmd).iter().any(|a| a.contains("secret")));
        let pwd = cmd
            .as_std()
            .get_envs()
            .find(|(k, _)| k.to_str() == Some("MYSQL_PWD"))
            .and_then(|(_, v)| v);
        assert_eq!(pwd.map(|v| v.to_string_lossy().into_owned()), Some("secret".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_export_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let service = MysqldumpService::new("/nonexistent/mysqldump", db(None));
        let err = service
            .export(&["wp_posts".to_string()], &dir.path().join("database-1.sql"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::ExportFailed(_)));
    }
}
