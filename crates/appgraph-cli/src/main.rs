//! Appgraph CLI - Command-line interface for Appgraph
//!
//! Inserts analyzed applications into a property graph store and reports
//! on what the store holds.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "appgraph")]
#[command(author = "Appgraph Contributors")]
#[command(version)]
#[command(about = "Persist analyzed applications as a queryable property graph", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Appgraph in a directory
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Rewrite the config and empty the graph store
        #[arg(long)]
        force: bool,
    },

    /// Insert an analyzed application (JSON model) into the graph
    Insert {
        /// Analyzer output describing one application
        model: PathBuf,

        /// Initialized directory holding the graph (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output the report as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Show node and relationship counts
    Status {
        /// Initialized directory to inspect (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Restrict counts to one application key
        #[arg(long)]
        app: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match cli.command {
        Commands::Init { path, force } => commands::init(&path, force),
        Commands::Insert { model, path, json } => commands::insert(&path, &model, json),
        Commands::Status { path, app } => commands::status(&path, app.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        let mut cause = e.source();
        while let Some(err) = cause {
            eprintln!("  {} {}", "caused by:".dimmed(), err);
            cause = err.source();
        }
        std::process::exit(1);
    }
}
