//! GitHub repository metadata harvesting
//!
//! Fetches eight entity types per project, persists them as JSON Lines under
//! `{data_dir}/{type}/{owner}-{repo}.json`, and keeps that tree in sync with
//! the configured project list.

pub mod config;
pub mod fetcher;
pub mod output;
pub mod runner;
pub mod state;
pub mod sweep;

pub use config::ExtractConfig;
pub use fetcher::{Endpoint, Fetched, GITHUB_API_URL, fetch_entity, github_headers};
pub use runner::{ExtractSummary, PairOutcome, PairStatus, extract};
pub use state::{EntityType, Project};
pub use sweep::sweep_untracked;
