//! CLI administration tool for tinylink.
//!
//! Provides commands for exporting and removing stored links without
//! requiring HTTP API access.
//!
//! # Usage
//!
//! ```bash
//! # Export every stored link as CSV
//! cargo run --bin admin -- dump
//!
//! # Remove a link (with confirmation prompt)
//! cargo run --bin admin -- remove u8ovL4
//!
//! # Remove without the prompt
//! cargo run --bin admin -- remove u8ovL4 -y
//! ```
//!
//! # Environment Variables
//!
//! Uses the same configuration as the server; in particular `DATABASE_URL`
//! and `DATA_DIR` select the store to operate on.

use tinylink::application::services::render_csv;
use tinylink::config;
use tinylink::domain::LinkStore;
use tinylink::domain::entities::ShortKey;
use tinylink::infrastructure::persistence::SqliteLinkStore;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;

/// CLI tool for managing tinylink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Export every stored link as CSV to stdout
    Dump,

    /// Remove a stored link
    Remove {
        /// The short key to remove
        key: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    let store = SqliteLinkStore::open(&config.database_url)
        .await
        .context("Failed to open store")?;

    match cli.command {
        Commands::Dump => handle_dump(&store).await?,
        Commands::Remove { key, yes } => handle_remove(&store, &key, yes).await?,
    }

    store.close().await;
    Ok(())
}

/// Prints the CSV export to stdout.
///
/// The output is the same format the `/dump/{token}` endpoint serves, so it
/// can be piped straight into files or other tools.
async fn handle_dump(store: &SqliteLinkStore) -> Result<()> {
    let records = store.dump().await.context("Failed to read links")?;

    print!("{}", render_csv(&records));

    Ok(())
}

/// Removes a link after showing it and asking for confirmation.
///
/// # Safety
///
/// - Requires confirmation (default: No) unless `-y` was given
/// - Refuses keys that are not even shaped like short keys
async fn handle_remove(store: &SqliteLinkStore, key: &str, skip_confirm: bool) -> Result<()> {
    println!("{}", "🗑  Remove Link".bright_blue().bold());
    println!();

    let key = ShortKey::parse(key)?;

    let record = store
        .get(key.as_str())
        .await
        .context("Failed to look up link")?
        .context("Link not found")?;

    println!("  Key:     {}", record.key.cyan());
    println!("  URL:     {}", record.url.bright_white());
    println!(
        "  Created: {}",
        record
            .created_at
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .bright_black()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Remove this link?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    store
        .remove(key.as_str())
        .await
        .context("Failed to remove link")?;

    println!();
    println!("{}", "✅ Link removed".green().bold());

    Ok(())
}
