//! CLI smoke entry point.
//!
//! Loads configuration from the environment (or from the dotenv file given
//! as the first argument), opens (and migrates) the billing database, and
//! prints a short summary.

use billing_core::db::migrations::current_version;
use billing_core::db::open_db;
use billing_core::{
    init_logging, BillingConfig, PlanRepository, ServiceRepository, SqliteBillingRepository,
    TotalSumCache,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("billing_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args_os().nth(1) {
        Some(env_file) => BillingConfig::from_env_file(env_file)?,
        None => BillingConfig::from_env(),
    };
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }

    println!("billing_core version={}", billing_core::core_version());

    let conn = open_db(&config.db_path)?;
    let repo = SqliteBillingRepository::try_new(&conn)?;
    let cache = TotalSumCache::new();

    println!("db_path={}", config.db_path.display());
    println!("schema_version={}", current_version(&conn)?);
    println!("services={}", repo.list_services()?.len());
    println!("plans={}", repo.list_plans()?.len());
    println!("total_sum={}", cache.total_sum(&repo)?);
    log::info!("event=cli_summary module=cli status=ok");
    Ok(())
}
