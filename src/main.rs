//! Daily Word - CLI and service entry point

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use daily_word::config::{Config, Secrets};
use daily_word::dispatch::Dispatcher;
use daily_word::schedule::{self, SendSchedule};
use daily_word::server;
use daily_word::sms::TwilioClient;
use daily_word::store::NumberStore;
use daily_word::words::WordSelector;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Daily Word - SMS word of the day
#[derive(Parser)]
#[command(name = "daily-word")]
#[command(about = "Send a daily SMS word of the day to subscribed numbers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and the daily scheduler
    Serve,

    /// Send today's message to every number once, now
    Send,

    /// Print today's word
    Word,

    /// Subscribe a phone number
    Add {
        /// Phone number, e.g. +16175551234
        number: String,
    },

    /// Unsubscribe a phone number
    Remove {
        /// Phone number
        number: String,
    },

    /// List subscribed phone numbers
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("loading configuration")?;

    match cli.command {
        Commands::Serve => cmd_serve(&config).await,
        Commands::Send => cmd_send(&config).await,
        Commands::Word => cmd_word(),
        Commands::Add { number } => cmd_add(&config, &number),
        Commands::Remove { number } => cmd_remove(&config, &number),
        Commands::List => cmd_list(&config),
    }
}

// ============================================================================
// CLI Commands
// ============================================================================

fn open_store(config: &Config) -> anyhow::Result<NumberStore> {
    NumberStore::open(&config.db_path)
        .with_context(|| format!("opening number store at {}", config.db_path.display()))
}

/// Wire the store, word list and SMS client together. Secrets are required.
fn build_dispatcher(config: &Config) -> anyhow::Result<Arc<Dispatcher>> {
    let secrets = Secrets::from_env().context("loading SMS provider secrets")?;
    let sender = TwilioClient::new(config, secrets).context("building SMS client")?;
    let store = open_store(config)?;

    Ok(Arc::new(Dispatcher::new(
        store,
        WordSelector::default(),
        Arc::new(sender),
    )))
}

async fn cmd_serve(config: &Config) -> anyhow::Result<()> {
    info!("Daily Word service starting");

    let send_schedule = SendSchedule::parse(&config.schedule)?;
    let dispatcher = build_dispatcher(config)?;

    let scheduler = tokio::spawn(schedule::run(send_schedule, dispatcher.clone()));

    let public = server::serve(
        "public",
        config.public_addr,
        server::public_router(dispatcher.clone()),
    );
    let internal = server::serve(
        "internal",
        config.internal_addr,
        server::internal_router(dispatcher),
    );

    let result = tokio::try_join!(public, internal);
    scheduler.abort();

    if let Err(e) = result {
        error!(error = %e, "HTTP listener failed");
        return Err(e.into());
    }
    Ok(())
}

async fn cmd_send(config: &Config) -> anyhow::Result<()> {
    let dispatcher = build_dispatcher(config)?;
    let report = dispatcher.send_daily(Utc::now()).await?;

    println!("Sent \"{}\" to {} number(s)", report.body, report.sent());
    for outcome in &report.outcomes {
        if let Err(e) = &outcome.result {
            println!("  failed {}: {}", outcome.to, e);
        }
    }
    Ok(())
}

fn cmd_word() -> anyhow::Result<()> {
    let selector = WordSelector::default();
    let word = selector.todays_word(&Utc::now())?;
    println!("{}", word);
    Ok(())
}

fn cmd_add(config: &Config, number: &str) -> anyhow::Result<()> {
    open_store(config)?.add(number)?;
    println!("Added {}", number);
    Ok(())
}

fn cmd_remove(config: &Config, number: &str) -> anyhow::Result<()> {
    open_store(config)?.remove(number)?;
    println!("Removed {}", number);
    Ok(())
}

fn cmd_list(config: &Config) -> anyhow::Result<()> {
    for number in open_store(config)?.list()? {
        println!("{}", number);
    }
    Ok(())
}
