//! `harvest run` - sweep → extract → consolidate

use std::process::ExitCode;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use harvest_core::{HttpTransport, Requester, SharedProgress, fmt_num};
use harvest_github::{ExtractConfig, extract, github_headers, sweep_untracked};
use harvest_load::{LoadConfig, LoadSummary, consolidate};

use crate::config::Config;

pub fn run(config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    config.validate()?;
    harvest_core::install_signal_handlers().context("Failed to install signal handlers")?;

    let data_dir = &config.output.data_dir;

    // 1. Drop files of projects no longer configured
    log::info!("Sweeping {}", data_dir.display());
    let removed = sweep_untracked(data_dir, &config.projects)?;
    if !removed.is_empty() {
        progress.println(format!("Removed {} untracked files", removed.len()));
    }

    // 2. Fetch whatever is missing
    let transport =
        HttpTransport::new(config.http.http_config()).context("Failed to build HTTP client")?;
    let token = config.github.token.as_deref().unwrap_or_default();
    let requester = Requester::new(
        transport,
        github_headers(token),
        config.http.retry_policy(),
    );
    let extract_config = ExtractConfig {
        data_dir: data_dir.clone(),
        api_url: config.github.api_url.clone(),
        projects: config.projects.clone(),
        page_limit: config.http.page_limit,
    };
    let summary = extract(&extract_config, &requester, progress)?;
    if progress.is_tty() {
        summary.print();
    } else {
        summary.log();
    }
    if summary.interrupted {
        log::warn!("Shutdown requested, skipping consolidation");
        return Ok(ExitCode::from(130));
    }

    // 3. Rebuild the analytical database
    let load = consolidate(&LoadConfig {
        data_dir: data_dir.clone(),
        database: config.output.database.clone(),
    })?;
    print_load_summary(&load, progress);

    if summary.failed() > 0 {
        log::error!(
            "{} fetches failed; rerun to retry them",
            summary.failed()
        );
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn print_load_summary(load: &LoadSummary, progress: &SharedProgress) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Table").fg(Color::Cyan),
            Cell::new("Rows").fg(Color::Cyan),
        ]);
    for (entity, rows) in &load.tables {
        let rows = if load.empty.contains(entity) {
            Cell::new("(no data)").fg(Color::DarkGrey)
        } else {
            Cell::new(fmt_num(*rows as usize))
        };
        table.add_row(vec![Cell::new(entity.name()), rows]);
    }
    progress.println(format!("\n{table}"));
}
