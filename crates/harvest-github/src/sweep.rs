//! Removal of persisted files that belong to no configured project

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::state::Project;

/// Filename stem of `path`: text after the last `/` or `\`, up to the last `.`.
///
/// Both separators are honored so paths written on either platform agree.
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// Delete every `{base_dir}/*/*.json` whose stem is not a configured project id.
///
/// Only leaf files are removed; type directories stay. Contents are never read.
/// Returns the removed paths.
pub fn sweep_untracked(base_dir: &Path, projects: &[Project]) -> Result<Vec<PathBuf>> {
    let tracked: HashSet<String> = projects.iter().map(Project::id).collect();
    let pattern = format!(
        "{}/*/*.json",
        glob::Pattern::escape(&base_dir.to_string_lossy())
    );

    let mut removed = Vec::new();
    for entry in glob::glob(&pattern).context("invalid glob pattern")? {
        let path = entry.context("failed to read data directory entry")?;
        if !path.is_file() {
            continue;
        }
        if tracked.contains(file_stem(&path.to_string_lossy())) {
            continue;
        }
        log::info!("Removing non-project file: {}", path.display());
        std::fs::remove_file(&path)
            .with_context(|| format!("failed to remove {}", path.display()))?;
        removed.push(path);
    }

    log::info!("Sweep removed {} untracked files", removed.len());
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn stem_unix_and_windows() {
        assert_eq!(file_stem("data/commits/a-b.json"), "a-b");
        assert_eq!(file_stem(r"data\commits\a-b.json"), "a-b");
        assert_eq!(file_stem("a-b.json"), "a-b");
        assert_eq!(file_stem("noext"), "noext");
    }

    #[test]
    fn stem_keeps_dots_in_repo_name() {
        assert_eq!(file_stem("data/base/vercel-next.js.json"), "vercel-next.js");
    }

    fn touch(dir: &Path, entity: &str, stem: &str) -> PathBuf {
        let d = dir.join(entity);
        fs::create_dir_all(&d).unwrap();
        let path = d.join(format!("{stem}.json"));
        fs::write(&path, b"{}\n").unwrap();
        path
    }

    #[test]
    fn removes_only_untracked_stems() {
        let dir = TempDir::new().unwrap();
        let mut kept = Vec::new();
        let mut gone = Vec::new();
        for entity in ["base", "commits"] {
            kept.push(touch(dir.path(), entity, "a-b"));
            kept.push(touch(dir.path(), entity, "c-d"));
            gone.push(touch(dir.path(), entity, "e-f"));
        }

        let projects = vec![Project::new("a", "b"), Project::new("c", "d")];
        let mut removed = sweep_untracked(dir.path(), &projects).unwrap();
        removed.sort();
        gone.sort();

        assert_eq!(removed, gone);
        assert!(kept.iter().all(|p| p.exists()));
        assert!(gone.iter().all(|p| !p.exists()));
        assert!(dir.path().join("commits").is_dir());
    }

    #[test]
    fn ignores_non_json_and_nested_files() {
        let dir = TempDir::new().unwrap();
        let tmp = dir.path().join("commits").join("x-y.json.tmp");
        fs::create_dir_all(tmp.parent().unwrap()).unwrap();
        fs::write(&tmp, b"").unwrap();
        let top = dir.path().join("x-y.json");
        fs::write(&top, b"").unwrap();

        let removed = sweep_untracked(dir.path(), &[]).unwrap();
        assert!(removed.is_empty());
        assert!(tmp.exists());
        assert!(top.exists());
    }

    #[test]
    fn base_dir_with_glob_metacharacters() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("run[1]*?");
        let kept = touch(&base, "commits", "a-b");
        let gone = touch(&base, "commits", "e-f");

        let removed = sweep_untracked(&base, &[Project::new("a", "b")]).unwrap();
        assert_eq!(removed, vec![gone.clone()]);
        assert!(kept.exists());
        assert!(!gone.exists());
    }

    #[test]
    fn missing_base_dir_removes_nothing() {
        let dir = TempDir::new().unwrap();
        let removed = sweep_untracked(&dir.path().join("absent"), &[Project::new("a", "b")]).unwrap();
        assert!(removed.is_empty());
    }
}
