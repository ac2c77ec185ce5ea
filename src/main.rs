// (C) Coralbits SL 2025
// This file is part of Psqache and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use psqache::{utils::setup_logging, Config, Psqache, DATABASE_URL_ENV};
use tracing::info;

#[derive(Parser)]
#[command(name = "psqache", about = "Maintain and query a psqache cache table")]
struct Cli {
    /// YAML config file
    #[arg(short, long)]
    config: Option<String>,

    /// Database url, overrides the config file
    #[arg(long, env = DATABASE_URL_ENV)]
    url: Option<String>,

    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the cache table
    Init,
    /// Drop the cache table
    Drop,
    /// Print the value stored under KEY
    Get { key: String },
    /// Store a JSON value under KEY
    Set {
        key: String,
        value: String,
        /// Seconds, defaults to the configured TTL
        #[arg(long)]
        ttl: Option<u64>,
    },
    Delete { key: String },
    /// Exit with status 1 when KEY is missing or expired
    Has { key: String },
    /// Remove every entry
    Clear,
    /// Remove expired entries
    Cleanup,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::read(path)?,
        None => Config::empty(),
    };
    if let Some(url) = cli.url {
        config.database.url = url;
    }
    config.debug |= cli.debug;
    setup_logging(config.debug);

    let cache = Psqache::from_config(&config).context("Failed to set up cache")?;

    match cli.command {
        Command::Init => {
            cache.block_on(cache.backend().create_table())??;
            info!("Cache table ready");
        }
        Command::Drop => {
            cache.block_on(cache.backend().drop_table())??;
            info!("Cache table dropped");
        }
        Command::Get { key } => match cache.get(&key)? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => std::process::exit(1),
        },
        Command::Set { key, value, ttl } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).context("Value is not valid JSON")?;
            cache.set(&key, &value, ttl.map(Duration::from_secs))?;
        }
        Command::Delete { key } => cache.delete(&key)?,
        Command::Has { key } => {
            if !cache.has(&key)? {
                std::process::exit(1);
            }
        }
        Command::Clear => cache.clear()?,
        Command::Cleanup => cache.cleanup()?,
    }

    Ok(())
}
