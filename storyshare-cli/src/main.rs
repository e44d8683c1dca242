//! storyshare CLI - run and administer the story-sharing backend
//!
//! Subcommands:
//! - `serve`: run the HTTP API (optionally serving the front-end pages)
//! - `check-db`: report whether the configured database is ready
//! - `hash-password`: produce the Argon2 value stored for an admin account

use anyhow::Result;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "storyshare",
    author,
    version,
    about = "Backend for a small story-sharing site",
    long_about = "Accept story submissions with optional photos, list them newest first, \
                  and let authenticated admins remove entries."
)]
struct Cli {
    /// Enable debug logging (also enabled by DEBUG=true/1/yes/on)
    #[arg(
        long,
        global = true,
        env = "DEBUG",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    debug: bool,

    /// Export traces over OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Check database connectivity and schema
    CheckDb(commands::check_db::CheckDbArgs),
    /// Hash an admin password for storage in admin_users
    HashPassword(commands::hash_password::HashPasswordArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Settings may come from a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Held until exit so pending spans are flushed
    let _tracing = tracing_setup::init(&tracing_setup::TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::CheckDb(args) => commands::run_check_db(args).await,
        Commands::HashPassword(args) => commands::run_hash_password(args),
    }
}
