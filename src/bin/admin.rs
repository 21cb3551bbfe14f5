//! CLI administration tool for shorty.
//!
//! Inspects the click stream and its dead-letter stream, replays dead letters
//! and checks the database, without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Show the oldest dead-lettered click events
//! cargo run --bin admin -- dlq list --count 20
//!
//! # Put a dead-lettered event back on the click stream
//! cargo run --bin admin -- dlq replay 1700000000000-0
//!
//! # Stream length, consumer groups, pending entries and lag
//! cargo run --bin admin -- stream info
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server: `DATABASE_URL`, `REDIS_URL` and the `CLICK_*` stream names.

use shorty::config::{self, Config};
use shorty::domain::click_event::EVENT_FIELD;
use shorty::domain::click_worker::{DELIVERIES_FIELD, REASON_FIELD, SOURCE_ID_FIELD};
use shorty::infrastructure::stream::{EventStream, RedisStream, StreamEntry};
use shorty::server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;

/// CLI tool for managing shorty.
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
    /// Inspect and replay dead-lettered click events
    Dlq {
        #[command(subcommand)]
        action: DlqAction,
    },

    /// Click stream diagnostics
    Stream {
        #[command(subcommand)]
        action: StreamAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum DlqAction {
    /// List dead-lettered events, oldest first
    List {
        /// Maximum number of entries to show
        #[arg(short, long, default_value_t = 20)]
        count: usize,
    },

    /// Re-publish a dead-lettered event to the click stream and remove it
    Replay {
        /// Entry id in the dead-letter stream
        id: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum StreamAction {
    /// Show stream length, groups, pending entries and lag
    Info,
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;

    match cli.command {
        Commands::Dlq { action } => handle_dlq_action(action, &config).await?,
        Commands::Stream { action } => handle_stream_action(action, &config).await?,
        Commands::Db { action } => handle_db_action(action, &config).await?,
    }

    Ok(())
}

async fn connect_stream(config: &Config) -> Result<RedisStream> {
    RedisStream::connect(&config.redis_url)
        .await
        .context("Failed to connect to Redis")
}

async fn handle_dlq_action(action: DlqAction, config: &Config) -> Result<()> {
    let stream = connect_stream(config).await?;

    match action {
        DlqAction::List { count } => list_dead_letters(&stream, config, count).await,
        DlqAction::Replay { id, yes } => replay_dead_letter(&stream, config, &id, yes).await,
    }
}

/// Lists dead letters with the reason they were given up on.
///
/// # Output Format
///
/// ```text
/// ☠️  Dead letters (clicks_dead_letter)
///
///   ID                   Source               Tries  Reason
///   ────────────────────────────────────────────────────────────────
///   1700000000123-0      1699999999000-0      6      max deliveries exceeded
/// ```
async fn list_dead_letters(stream: &RedisStream, config: &Config, count: usize) -> Result<()> {
    println!(
        "{} ({})",
        "☠️  Dead letters".bright_blue().bold(),
        config.dead_letter_stream.cyan()
    );
    println!();

    let entries = stream
        .range(&config.dead_letter_stream, count)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read dead letters: {}", e))?;

    if entries.is_empty() {
        println!("{}", "  No dead letters".green());
        return Ok(());
    }

    println!(
        "  {:<20} {:<20} {:<6} {}",
        "ID".bright_white().bold(),
        "Source".bright_white().bold(),
        "Tries".bright_white().bold(),
        "Reason".bright_white().bold()
    );
    println!("  {}", "─".repeat(64).bright_black());

    for entry in &entries {
        println!(
            "  {:<20} {:<20} {:<6} {}",
            entry.id.cyan(),
            entry.field(SOURCE_ID_FIELD).unwrap_or("-").bright_black(),
            entry.field(DELIVERIES_FIELD).unwrap_or("-"),
            entry.field(REASON_FIELD).unwrap_or("-").yellow()
        );
    }

    let total = stream
        .len(&config.dead_letter_stream)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to count dead letters: {}", e))?;

    println!();
    println!(
        "  Showing {} of {}",
        entries.len().to_string().bright_white().bold(),
        total.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Replays one dead letter.
///
/// # Flow
///
/// 1. Look up the entry in the dead-letter stream
/// 2. Show its payload and reason
/// 3. Confirm (unless `--yes`)
/// 4. Publish the original `event` field to the click stream
/// 5. Delete the dead letter
///
/// The replayed event gets a new id and a fresh delivery count.
async fn replay_dead_letter(
    stream: &RedisStream,
    config: &Config,
    id: &str,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🔁 Replay dead letter".bright_blue().bold());
    println!();

    let entry = stream
        .get(&config.dead_letter_stream, id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read dead letter: {}", e))?
        .with_context(|| format!("No dead letter with id {}", id))?;

    let payload = replay_payload(&entry)
        .context("Dead letter has no event payload; it cannot be replayed")?;

    println!("  ID:      {}", entry.id.cyan());
    println!(
        "  Reason:  {}",
        entry.field(REASON_FIELD).unwrap_or("-").yellow()
    );
    println!("  Payload: {}", payload.bright_white());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt(format!("Publish this event to {}?", config.click_stream))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let new_id = stream
        .publish(&config.click_stream, &[(EVENT_FIELD, payload)])
        .await
        .map_err(|e| anyhow::anyhow!("Failed to publish event: {}", e))?;

    stream
        .delete(&config.dead_letter_stream, &entry.id)
        .await
        .map_err(|e| anyhow::anyhow!("Event replayed as {} but dead letter not removed: {}", new_id, e))?;

    println!(
        "{} {}",
        "✅ Replayed as".green().bold(),
        new_id.bright_white()
    );
    println!();

    Ok(())
}

fn replay_payload(entry: &StreamEntry) -> Option<&str> {
    entry.field(EVENT_FIELD).filter(|p| !p.is_empty())
}

async fn handle_stream_action(action: StreamAction, config: &Config) -> Result<()> {
    match action {
        StreamAction::Info => {
            let stream = connect_stream(config).await?;

            println!("{}", "ℹ️  Click stream".bright_blue().bold());
            println!();

            let length = stream
                .len(&config.click_stream)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read stream length: {}", e))?;
            let dead = stream
                .len(&config.dead_letter_stream)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read dead-letter length: {}", e))?;

            println!("  Stream:       {}", config.click_stream.cyan());
            println!("  Entries:      {}", length.to_string().bright_white().bold());
            println!("  Dead letters: {}", dead.to_string().bright_white().bold());
            println!();

            if length == 0 {
                println!("{}", "  Stream is empty or missing".yellow());
                return Ok(());
            }

            let groups = stream
                .groups(&config.click_stream)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read consumer groups: {}", e))?;

            if groups.is_empty() {
                println!("{}", "  No consumer groups".yellow());
                return Ok(());
            }

            println!(
                "  {:<20} {:<10} {:<10} {:<8} {}",
                "Group".bright_white().bold(),
                "Consumers".bright_white().bold(),
                "Pending".bright_white().bold(),
                "Lag".bright_white().bold(),
                "Last delivered".bright_white().bold()
            );
            println!("  {}", "─".repeat(72).bright_black());

            for group in &groups {
                let pending = if group.pending > 0 {
                    group.pending.to_string().yellow()
                } else {
                    group.pending.to_string().green()
                };
                let lag = group
                    .lag
                    .map_or_else(|| "?".to_string(), |l| l.to_string());

                println!(
                    "  {:<20} {:<10} {:<10} {:<8} {}",
                    group.name.cyan(),
                    group.consumers,
                    pending,
                    lag,
                    group.last_delivered_id.bright_black()
                );
            }
            println!();
        }
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, config: &Config) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let pool = server::connect_pool(config).await?;
            sqlx::query("SELECT 1").fetch_one(&pool).await?;

            let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
                .fetch_one(&pool)
                .await?;
            let clicks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM click_records")
                .fetch_one(&pool)
                .await?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!("  Links:  {}", links.to_string().bright_green().bold());
            println!("  Clicks: {}", clicks.to_string().bright_green().bold());
        }
    }

    Ok(())
}
