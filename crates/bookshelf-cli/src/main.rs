//! Bookshelf CLI
//!
//! Command-line interface for Bookshelf - a local book catalog.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bookshelf_core::{BookStore, Config, Notifier};

mod commands;
mod cover;
mod editor;
mod output;

use commands::book::{BookArgs, ListArgs};
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Bookshelf - Manage a local book catalog")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a different config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List books, filtered, sorted and paginated
    #[command(alias = "ls")]
    List(ListArgs),
    /// Show book details
    Show {
        /// Book ID (full or prefix)
        id: String,
    },
    /// Add a book
    Add(BookArgs),
    /// Edit a book (prompts for each field when no flags are given)
    Edit {
        /// Book ID (full or prefix)
        id: String,
        #[command(flatten)]
        fields: BookArgs,
        /// Edit the description in $EDITOR
        #[arg(long)]
        edit_description: bool,
    },
    /// Delete a book
    #[command(alias = "rm")]
    Delete {
        /// Book ID (full or prefix)
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Discard local changes and reload the seed records
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// List categories in use
    Categories,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set(SetArgs),
}

#[derive(Args, Clone)]
struct SetArgs {
    /// Configuration key (data_dir, seed_url, seed_file, page_size, log_file)
    key: String,
    /// Configuration value
    value: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let store = BookStore::open(&config);
    store.initialize().await;

    let notifier = Notifier::new();

    let result = match cli.command {
        Commands::List(args) => commands::book::list(&store, args, &config, &output),
        Commands::Show { id } => commands::book::show(&store, &id, &output),
        Commands::Add(fields) => commands::book::add(&store, fields, &notifier, &output),
        Commands::Edit {
            id,
            fields,
            edit_description,
        } => commands::book::edit(&store, &id, fields, edit_description, &notifier, &output),
        Commands::Delete { id, force } => {
            commands::book::delete(&store, &id, force, &notifier, &output)
        }
        Commands::Reset { force } => {
            commands::book::reset(&store, force, &notifier, &output).await
        }
        Commands::Categories => commands::book::categories(&store, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    };

    output.print_notifications(&notifier.snapshot());

    result
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set(SetArgs { key, value })) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging
///
/// Only initializes if SHELF_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/debug.log) so output
/// formats stay clean.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("SHELF_LOG") else {
        return;
    };

    let log_path = config.log_path();

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "bookshelf_core={},bookshelf_cli={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}
