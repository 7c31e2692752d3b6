//! harvest-load: Consolidate harvested JSON Lines into DuckDB
//!
//! Drops and recreates the database file, then loads one table per entity
//! type from all per-project files of that type. The input files are only read.

mod config;
mod sql;

pub use config::LoadConfig;

use anyhow::{Context, Result};
use duckdb::Connection;
use harvest_github::EntityType;

/// Row counts per loaded table.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub tables: Vec<(EntityType, u64)>,
    /// Types with no non-empty files; their tables hold only provenance columns
    pub empty: Vec<EntityType>,
}

impl LoadSummary {
    pub fn rows(&self, entity: EntityType) -> Option<u64> {
        self.tables
            .iter()
            .find(|(e, _)| *e == entity)
            .map(|(_, n)| *n)
    }
}

/// Remove the database and its write-ahead log, if present.
fn remove_database(path: &std::path::Path) -> Result<()> {
    let mut wal = path.as_os_str().to_owned();
    wal.push(".wal");
    for p in [path.to_path_buf(), std::path::PathBuf::from(wal)] {
        match std::fs::remove_file(&p) {
            Ok(()) => log::debug!("Removed {}", p.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", p.display()));
            }
        }
    }
    Ok(())
}

/// Rebuild the consolidated database from `config.data_dir`.
pub fn consolidate(config: &LoadConfig) -> Result<LoadSummary> {
    log::info!("Consolidating data into {}", config.database.display());

    if let Some(parent) = config.database.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    remove_database(&config.database)?;

    let conn = Connection::open(&config.database)
        .with_context(|| format!("Failed to open DuckDB at {}", config.database.display()))?;

    let mut summary = LoadSummary::default();
    for entity in EntityType::ALL {
        let files = sql::entity_files(&config.data_dir, entity)?;
        let create = if files.is_empty() {
            log::warn!("{entity}: no data files, creating empty table");
            summary.empty.push(entity);
            sql::create_empty_table(entity)
        } else {
            log::info!("{entity}: loading {} files", files.len());
            sql::create_table(entity, &files)
        };
        conn.execute_batch(&create)
            .with_context(|| format!("Failed to load table {entity}"))?;

        let rows = conn
            .query_row(&sql::count_rows(entity), [], |row| row.get::<_, i64>(0))
            .with_context(|| format!("Failed to count rows of {entity}"))?;
        log::info!("{entity}: {rows} rows");
        summary.tables.push((entity, rows as u64));
    }

    log::info!("Data consolidated successfully");
    Ok(summary)
}
