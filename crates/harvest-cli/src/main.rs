//! harvest - GitHub repository metadata crawler
//!
//! Sweeps files of unconfigured projects, fetches every missing
//! (entity type, project) pair as JSON Lines, and rebuilds a DuckDB
//! database with one table per entity type.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Harvest GitHub repository metadata into DuckDB")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./harvest.toml or ~/.config/harvest/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Sweep, extract and consolidate (default)
    Run,
    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(e) => {
            log::error!("Fatal error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let progress = Arc::new(harvest_core::ProgressContext::new());

    // TTY: warn and above, routed above the fetch spinners
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    harvest_core::init_logging(harvest_core::Verbosity::for_terminal(is_tty, cli.debug), multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd::run::run(&config, &progress),
        Command::Config => {
            print_config(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_config(config: &Config) {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec![
        "Data directory",
        &config.output.data_dir.display().to_string(),
    ]);
    table.add_row(vec![
        "Database",
        &config.output.database.display().to_string(),
    ]);
    table.add_row(vec!["API URL", &config.github.api_url]);
    table.add_row(vec![
        "Token",
        if config.github.token.is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);
    table.add_row(vec![
        "Max attempts",
        &config.http.max_attempts.to_string(),
    ]);
    table.add_row(vec!["Throttle", &format!("{}s", config.http.throttle_secs)]);
    table.add_row(vec!["Cooldown", &format!("{}s", config.http.cooldown_secs)]);
    table.add_row(vec![
        "Page limit",
        &config
            .http
            .page_limit
            .map_or("none".to_string(), |l| l.to_string()),
    ]);
    let projects = config
        .projects
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    table.add_row(vec![
        format!("Projects ({})", config.projects.len()).as_str(),
        &projects,
    ]);

    eprintln!("\n{table}");
}
