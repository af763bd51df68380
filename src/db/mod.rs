//! Database module for the network's MySQL store.
//!
//! The extractor only reads the network tables; the sole writes go to the staged user tables.

pub mod php;
mod repository;

pub use repository::*;

use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use crate::config::DbConfig;

/// Open the connection pool.
pub async fn init_database(db: &DbConfig) -> Result<MySqlPool, sqlx::Error> {
    let mut options = MySqlConnectOptions::new()
        .host(&db.host)
        .username(&db.user)
        .password(&db.password)
        .database(&db.name);
    if let Some(port) = db.port {
        options = options.port(port);
    }

    // One connection: stages run strictly one statement at a time.
    MySqlPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
}
