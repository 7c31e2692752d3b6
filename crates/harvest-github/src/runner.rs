//! Sequential extraction over the project × entity-type matrix.
//!
//! A pair is done iff its file exists. Nothing else is recorded, so an
//! interrupted run resumes by simply running again.

use std::fs;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use harvest_core::{ProgressContext, Requester, Transport, fmt_num, is_shutdown_requested};

use crate::config::ExtractConfig;
use crate::fetcher::fetch_entity;
use crate::output::{cleanup_tmp_files, write_records};
use crate::state::EntityType;

/// Outcome of one (entity type, project) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStatus {
    /// File already present from an earlier run
    Skipped,
    /// Fetched and written in this run
    Fetched,
    /// Fetch failed; no file written, retried on the next run
    Failed,
}

impl std::fmt::Display for PairStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped => write!(f, "SKIPPED"),
            Self::Fetched => write!(f, "FETCHED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PairOutcome {
    pub project_id: String,
    pub entity: EntityType,
    pub status: PairStatus,
    /// Records written; 0 unless fetched
    pub records: usize,
}

/// Summary of one extraction pass
#[derive(Debug, Default)]
pub struct ExtractSummary {
    pub outcomes: Vec<PairOutcome>,
    /// Stopped early on a shutdown request
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl ExtractSummary {
    fn count(&self, status: PairStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn fetched(&self) -> usize {
        self.count(PairStatus::Fetched)
    }

    pub fn skipped(&self) -> usize {
        self.count(PairStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(PairStatus::Failed)
    }

    pub fn total_records(&self) -> usize {
        self.outcomes.iter().map(|o| o.records).sum()
    }

    pub fn log(&self) {
        log::info!("=== Extraction Summary ===");
        log::info!(
            "Pairs: {} fetched, {} skipped, {} failed",
            self.fetched(),
            self.skipped(),
            self.failed()
        );
        log::info!("Records written: {}", fmt_num(self.total_records()));
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
        if self.interrupted {
            log::warn!("Extraction interrupted; rerun to resume");
        }
    }

    /// Format one row per project, one column per outcome.
    pub fn format_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Project")
                    .fg(Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Fetched").fg(Color::Cyan),
                Cell::new("Skipped").fg(Color::Cyan),
                Cell::new("Failed").fg(Color::Cyan),
                Cell::new("Records").fg(Color::Cyan),
            ]);

        let mut projects: Vec<&str> = Vec::new();
        for o in &self.outcomes {
            if !projects.contains(&o.project_id.as_str()) {
                projects.push(&o.project_id);
            }
        }

        for project in projects {
            let rows: Vec<&PairOutcome> = self
                .outcomes
                .iter()
                .filter(|o| o.project_id == project)
                .collect();
            let n = |s: PairStatus| rows.iter().filter(|o| o.status == s).count();
            let failed = n(PairStatus::Failed);
            let failed_cell = if failed > 0 {
                Cell::new(failed).fg(Color::Red)
            } else {
                Cell::new(failed)
            };
            table.add_row(vec![
                Cell::new(project),
                Cell::new(n(PairStatus::Fetched)),
                Cell::new(n(PairStatus::Skipped)),
                failed_cell,
                Cell::new(fmt_num(rows.iter().map(|o| o.records).sum())),
            ]);
        }

        table.to_string()
    }

    pub fn print(&self) {
        eprintln!("\n{}", self.format_table());
        if self.interrupted {
            eprintln!("Interrupted; rerun to resume.");
        }
    }
}

/// Fetch every missing (entity type, project) file under `config.data_dir`.
///
/// Fetch failures are logged and leave the pair pending; local I/O errors abort.
pub fn extract<T: Transport>(
    config: &ExtractConfig,
    requester: &Requester<T>,
    progress: &ProgressContext,
) -> Result<ExtractSummary> {
    let start = Instant::now();
    let base_dir = &config.data_dir;
    fs::create_dir_all(base_dir)
        .with_context(|| format!("failed to create {}", base_dir.display()))?;

    for entity in EntityType::ALL {
        cleanup_tmp_files(&entity.dir(base_dir))
            .with_context(|| format!("failed to clean {}", entity.dir(base_dir).display()))?;
    }

    let mut summary = ExtractSummary::default();

    'projects: for project in &config.projects {
        let project_id = project.id();
        log::info!("Extracting data for {project}...");

        for entity in EntityType::ALL {
            if is_shutdown_requested() {
                summary.interrupted = true;
                break 'projects;
            }

            let dir = entity.dir(base_dir);
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;

            let path = entity.file_path(base_dir, project);
            if path.exists() {
                log::info!("Data for [{entity}] - {project} already exists. Skipping...");
                summary.outcomes.push(PairOutcome {
                    project_id: project_id.clone(),
                    entity,
                    status: PairStatus::Skipped,
                    records: 0,
                });
                continue;
            }

            log::info!("Extracting data for {entity}...");
            let pb = progress.fetch_line(&format!("{entity}/{project_id}"));
            let result = fetch_entity(
                requester,
                &config.api_url,
                entity,
                project,
                config.page_limit,
                &pb,
            );
            pb.finish_and_clear();

            match result {
                Ok(data) => {
                    write_records(&path, &data)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    let records = data.record_count();
                    log::info!("{entity}/{project_id}: {} records", fmt_num(records));
                    summary.outcomes.push(PairOutcome {
                        project_id: project_id.clone(),
                        entity,
                        status: PairStatus::Fetched,
                        records,
                    });
                }
                Err(e) if e.is_interrupted() => {
                    log::warn!("{entity}/{project_id}: {e}");
                    summary.interrupted = true;
                    break 'projects;
                }
                Err(e) => {
                    log::error!("{entity}/{project_id}: {e}");
                    summary.outcomes.push(PairOutcome {
                        project_id: project_id.clone(),
                        entity,
                        status: PairStatus::Failed,
                        records: 0,
                    });
                }
            }
        }
        log::info!("Data for {project} extracted");
    }

    summary.elapsed = start.elapsed();
    Ok(summary)
}
