//! SQL generation for the consolidation step.
//!
//! All per-project files of a type are read as one newline-delimited JSON
//! dataset. `base` files hold one object on one line, which is also valid
//! JSON Lines, so every type shares the same reader.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use harvest_github::EntityType;

/// Glob over every per-project file of `entity`; the directory part is matched literally.
pub fn entity_glob(data_dir: &Path, entity: EntityType) -> String {
    format!(
        "{}/*.json",
        glob::Pattern::escape(&entity.dir(data_dir).to_string_lossy())
    )
}

/// Non-empty files of `entity`, sorted.
///
/// Empty files (collections with zero items) carry no rows and would break
/// schema detection when they are the only input.
pub fn entity_files(data_dir: &Path, entity: EntityType) -> Result<Vec<PathBuf>> {
    let pattern = entity_glob(data_dir, entity);
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .context("invalid glob pattern")?
        .filter_map(|e| e.ok())
        .filter(|p| p.metadata().is_ok_and(|m| m.is_file() && m.len() > 0))
        .collect();
    files.sort();
    Ok(files)
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Create one table for `entity` from `files`.
///
/// `union_by_name` lets projects whose payloads carry different optional fields share a table.
pub fn create_table(entity: EntityType, files: &[PathBuf]) -> String {
    let list = files
        .iter()
        .map(|p| quote_literal(&p.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE {} AS \
         SELECT * FROM read_json([{list}], format = 'newline_delimited', union_by_name = true)",
        entity.name(),
    )
}

/// Column-only table for a type with no data, so queries against it still resolve.
pub fn create_empty_table(entity: EntityType) -> String {
    let columns = if entity.is_paginated() {
        "project_id VARCHAR, page BIGINT"
    } else {
        "project_id VARCHAR"
    };
    format!("CREATE TABLE {} ({columns})", entity.name())
}

/// Row count of an entity table.
pub fn count_rows(entity: EntityType) -> String {
    format!("SELECT COUNT(*) FROM {}", entity.name())
}
