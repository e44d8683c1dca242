//! Admin password hashing
//!
//! Prints the Argon2 PHC string to store in `admin_users.password`.

use std::io::{self, IsTerminal, Read};

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use storyshare_server::security::hash_password;

/// Arguments for the hash-password command
#[derive(Parser, Debug)]
pub struct HashPasswordArgs {
    /// Password to hash (read from stdin when omitted)
    pub password: Option<String>,
}

pub fn run_hash_password(args: HashPasswordArgs) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => read_stdin()?,
    };

    if password.is_empty() {
        return Err(anyhow!("Password must not be empty"));
    }

    let hash = hash_password(&password).context("Failed to hash password")?;
    println!("{hash}");
    Ok(())
}

fn read_stdin() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(anyhow!(
            "No password provided. Pass it as an argument or pipe it via stdin"
        ));
    }

    let mut buf = String::new();
    stdin
        .lock()
        .read_to_string(&mut buf)
        .context("Failed to read from stdin")?;

    // Only the line terminator is stripped; other whitespace is part of the password
    Ok(buf.trim_end_matches(['\r', '\n']).to_string())
}
