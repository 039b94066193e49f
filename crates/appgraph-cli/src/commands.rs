//! CLI command implementations.

use crate::config::{Config, CONFIG_DIR};
use appgraph_graph::{GraphInserter, GraphStats, GraphStore, InsertReport};
use appgraph_model::Application;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Initialize Appgraph in a directory.
pub fn init(path: &Path, force: bool) -> Result<()> {
    let config_path = Config::path(path);

    if config_path.exists() && !force {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    let config = if config_path.exists() {
        Config::load(path)?
    } else {
        Config::default()
    };
    config.save(path)?;

    if force {
        let store = GraphStore::open_with(&config.store_config(path))?;
        store.clear()?;
        println!("{} Cleared graph store", "✓".green());
    }

    println!("{} Initialized Appgraph in {}", "✓".green(), path.display());
    println!(
        "  Run {} to insert an analyzed application",
        "appgraph insert <model.json>".cyan()
    );

    Ok(())
}

/// Insert an analyzed application into the graph store under `root`.
pub fn insert(root: &Path, model: &Path, json: bool) -> Result<()> {
    if !Config::path(root).exists() {
        return Err(format!(
            "{} is not initialized, run `appgraph init {}` first",
            root.display(),
            root.display()
        )
        .into());
    }
    let config = Config::load(root)?;
    let app = Application::from_json_file(model)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(format!("Inserting {} ({} entities)...", app.key, app.entity_count()));

    let store = GraphStore::open_with(&config.store_config(root))?;
    let mut inserter = GraphInserter::new(store).with_options(config.insert_options());
    let result = inserter.insert_app(&app);

    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(err) => {
            if err.is_partial() {
                println!(
                    "{} Nodes and ownership edges of '{}' were committed; \
                     inheritance and call edges were not",
                    "⚠".yellow(),
                    err.app_key()
                );
            }
            return Err(err.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &InsertReport) {
    println!(
        "{} Inserted {} ({} nodes, {} edges) at {}",
        "✓".green(),
        report.app_key.cyan(),
        report.nodes_created.to_string().cyan(),
        report.edges_created().to_string().cyan(),
        report.analyzed_at
    );
    println!("  {} {}", "Containment edges:".dimmed(), report.containment_edges);
    println!(
        "  {} {} extends, {} implements, {} calls",
        "Derived edges:".dimmed(),
        report.derived.extends,
        report.derived.implements,
        report.derived.calls
    );
    if report.skipped_references() > 0 {
        println!(
            "  {} {} references outside the application",
            "Skipped:".dimmed(),
            report.skipped_references()
        );
    }
}

/// Show graph statistics.
pub fn status(root: &Path, app_key: Option<&str>) -> Result<()> {
    let config = Config::load(root)?;

    if !root.join(CONFIG_DIR).exists() {
        println!("{} Appgraph not initialized in this directory", "✗".red());
        println!("  Run {} to initialize", "appgraph init".cyan());
        return Ok(());
    }

    let store = GraphStore::open_with(&config.store_config(root))?;
    let stats = store.load_graph(app_key)?.stats();

    println!("{}", "Appgraph Status".cyan().bold());
    if let Some(key) = app_key {
        println!("  {} {}", "Application:".dimmed(), key);
    }
    println!();
    print_stats(&stats);

    Ok(())
}

fn print_stats(stats: &GraphStats) {
    println!("  {} {}", "Nodes:".dimmed(), stats.node_count);
    for (label, count) in &stats.nodes_by_label {
        println!("    {:<10} {}", label.to_string(), count);
    }
    println!("  {} {}", "Edges:".dimmed(), stats.edge_count);
    for (kind, count) in &stats.edges_by_kind {
        println!("    {:<22} {}", kind.to_string(), count);
    }
}
