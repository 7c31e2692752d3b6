//! Extraction run configuration

use std::path::PathBuf;

use crate::fetcher::GITHUB_API_URL;
use crate::state::Project;

/// Runtime configuration for one extraction pass
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Root of the `{type}/{project_id}.json` tree
    pub data_dir: PathBuf,
    /// API root, without trailing `/repos`
    pub api_url: String,
    /// Projects in crawl order
    pub projects: Vec<Project>,
    /// Page counter value at which paginated fetches stop (for bounded test runs)
    pub page_limit: Option<u32>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            api_url: GITHUB_API_URL.to_string(),
            projects: Vec::new(),
            page_limit: None,
        }
    }
}
