//! CLI administration tool for the shortener.
//!
//! Opens the storage backend selected by the usual environment variables and
//! inspects or modifies it without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Create a user and print its cookie token
//! cargo run --bin admin -- user create
//!
//! # Resolve a short id
//! cargo run --bin admin -- url get 42
//!
//! # List a user's URLs
//! cargo run --bin admin -- url list 7
//! ```
//!
//! # Environment Variables
//!
//! Same storage selection as the server: `DATABASE_URL` / `DB_*`, then
//! `FILE_STORAGE_PATH`, otherwise in-memory (useless here, a warning is
//! printed). `USER_SIGNING_SECRET` must match the server's for issued tokens
//! to be accepted.

use shortener::application::services::{TokenSigner, UserService};
use shortener::config::{self, Config, StorageBackend};
use shortener::domain::repositories::{StorageError, UrlStorage};
use shortener::infrastructure::persistence::open_storage;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::sync::Arc;

/// CLI tool for managing the shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Show URL and user counts
    Stats,

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Inspect URLs
    Url {
        #[command(subcommand)]
        action: UrlAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user and print a token for it
    Create,
}

#[derive(Subcommand)]
enum UrlAction {
    /// Show the original URL behind a short id
    Get {
        id: i64,
    },

    /// List every URL owned by a user
    List {
        user_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Failed to load configuration")?;
    if config.storage == StorageBackend::Memory {
        println!(
            "{}",
            "Warning: no persistent storage configured, working on an empty in-memory store"
                .yellow()
        );
        println!();
    }

    let storage = open_storage(&config).await?;

    let result = match cli.command {
        Commands::Stats => handle_stats(storage.as_ref(), &config).await,
        Commands::User { action } => handle_user_action(action, storage.clone(), &config).await,
        Commands::Url { action } => handle_url_action(action, storage.as_ref(), &config).await,
    };

    storage.close().await;
    result
}

async fn handle_stats(storage: &dyn UrlStorage, config: &Config) -> Result<()> {
    let stats = storage
        .stats()
        .await
        .context("Failed to read statistics")?;

    println!("{}", "Statistics".bright_blue().bold());
    println!();
    println!("  Backend: {}", config.storage.name().cyan());
    println!("  URLs:    {}", stats.urls.to_string().bright_white().bold());
    println!("  Users:   {}", stats.users.to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn handle_user_action(
    action: UserAction,
    storage: Arc<dyn UrlStorage>,
    config: &Config,
) -> Result<()> {
    match action {
        UserAction::Create => {
            let Some(secret) = &config.user_signing_secret else {
                anyhow::bail!("USER_SIGNING_SECRET must be set to issue tokens the server accepts");
            };

            let service = UserService::new(storage, TokenSigner::new(secret.as_bytes()));
            let (user_id, token) = service
                .create_user()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create user: {:?}", e))?;

            println!("{}", "User created".green().bold());
            println!();
            println!("  ID:    {}", user_id.to_string().cyan());
            println!("  Token: {}", token.bright_yellow());
            println!();
            println!("{}", "Example:".bright_white());
            println!(
                "  curl -b \"token={}\" {}/api/user/urls",
                token.bright_yellow(),
                config.base_url
            );
            println!();
        }
    }

    Ok(())
}

async fn handle_url_action(action: UrlAction, storage: &dyn UrlStorage, config: &Config) -> Result<()> {
    match action {
        UrlAction::Get { id } => match storage.get_url(id).await {
            Ok(url) => {
                println!("  {}/{} -> {}", config.base_url, id, url.cyan());
            }
            Err(StorageError::Deleted) => {
                println!("  {} {}", id, "DELETED".red());
            }
            Err(StorageError::NotFound) => {
                println!("  {} {}", id, "not found".yellow());
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to read URL")),
        },
        UrlAction::List { user_id } => {
            let urls = storage
                .list_user_urls(user_id)
                .await
                .context("Failed to list URLs")?;

            println!(
                "{}",
                format!("URLs of user {user_id}").bright_blue().bold()
            );
            println!();

            if urls.is_empty() {
                println!("{}", "  No URLs found".yellow());
                return Ok(());
            }

            println!(
                "  {:<8} {:<10} {}",
                "ID".bright_white().bold(),
                "Status".bright_white().bold(),
                "Original URL".bright_white().bold()
            );
            println!("  {}", "-".repeat(60).bright_black());

            for (id, url) in &urls {
                let status = match storage.get_url(*id).await {
                    Err(StorageError::Deleted) => "DELETED".red(),
                    _ => "ACTIVE".green(),
                };
                println!("  {:<8} {:<10} {}", id.to_string().bright_black(), status, url.cyan());
            }

            println!();
            println!("  Total: {}", urls.len().to_string().bright_white().bold());
            println!();
        }
    }

    Ok(())
}
