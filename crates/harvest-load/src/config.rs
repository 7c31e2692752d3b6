use std::path::PathBuf;

/// Configuration for the consolidation step.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Root of the `{type}/{project_id}.json` tree
    pub data_dir: PathBuf,
    /// DuckDB database file, recreated on every load
    pub database: PathBuf,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database: PathBuf::from("database.duck"),
        }
    }
}
