//! Database readiness check
//!
//! Same probe as `GET /api/test-db`, for use from scripts and deploy hooks.
//! Exits non-zero unless the database is reachable and fully set up.

use anyhow::{bail, Context, Result};
use clap::Parser;

use storyshare_server::db::diagnostics::test_connectivity;
use storyshare_server::AppConfig;

/// Arguments for the check-db command
#[derive(Parser, Debug)]
pub struct CheckDbArgs {
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_check_db(args: CheckDbArgs) -> Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;
    let connectivity = test_connectivity(&config.database).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&connectivity)?);
    } else {
        println!("{}: {}", connectivity.status, connectivity.message);
    }

    if !connectivity.is_ok() {
        bail!("Database check failed ({})", connectivity.status);
    }
    Ok(())
}
