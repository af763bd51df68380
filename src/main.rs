//! Blog Extract
//!
//! Pulls one site out of a multisite network: its tables (with a filtered copy of the shared
//! user tables) and its files, packed into a single archive ready for a standalone install.

mod config;
mod db;
mod errors;
mod extract;
mod models;
mod platform;
mod process;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use errors::ExtractError;
use extract::{ExtractSettings, ExtractionReport, Extractor};
use process::{MysqldumpService, TarService};

/// Extract a single site from a multisite network into a portable archive.
#[derive(Debug, Parser)]
#[command(name = "blog-extract", version, about)]
struct Cli {
    /// ID of the site to extract
    blog_id: u64,

    /// Log progress while extracting
    #[arg(short, long)]
    verbose: bool,

    /// Archive file name, relative to the install root (default: archive-<blog-id>.tar.gz)
    #[arg(long, value_name = "FILE")]
    archive: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e.message());
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config, cli.verbose);

    match run(&cli, config).await {
        Ok(report) => {
            if report.no_users_exported {
                println!("Warning: No users were exported. You'll need to create users manually.");
            }
            println!("Success: {}", report.summary());
            println!("{}", report.guidance);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!("Extraction failed with {}", e.error_code());
            eprintln!("Error: {}", e.message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: Config) -> Result<ExtractionReport, ExtractError> {
    tracing::info!("Install root: {:?}", config.install_root);
    tracing::info!("Database: {}@{}/{}", config.db.user, config.db.host, config.db.name);

    let global_tables = config.global_tables();
    let pool = db::init_database(&config.db).await?;
    let repo = Arc::new(Repository::new(pool, global_tables.clone()));

    let extractor = Extractor {
        registry: repo.clone(),
        sql: repo,
        dump: Arc::new(MysqldumpService::new(
            config.mysqldump_bin.clone(),
            config.db.clone(),
        )),
        archive: Arc::new(TarService::new(config.tar_bin.clone())),
        settings: Arc::new(ExtractSettings {
            multisite: config.multisite,
            global_tables,
            layout: config.layout(),
        }),
    };

    extractor.run(cli.blog_id, cli.archive.as_deref()).await
}

fn init_logging(config: &Config, verbose: bool) {
    let level = effective_level(&config.log_level, verbose);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let text = (!config.log_json)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(text)
        .init();
}

/// `--verbose` raises quieter levels to `info`.
fn effective_level(configured: &str, verbose: bool) -> &str {
    match configured {
        "error" | "warn" if verbose => "info",
        other => other,
    }
}
