//! Crawl targets and the entity types fetched for each

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// One repository to crawl
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Project {
    pub owner: String,
    pub repo: String,
}

impl Project {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Provenance tag and filename stem: `{owner}-{repo}`
    pub fn id(&self) -> String {
        format!("{}-{}", self.owner, self.repo)
    }
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Category of remote data, one directory and one table each
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityType {
    Base,
    Contributors,
    Commits,
    Branches,
    Releases,
    Issues,
    PullRequests,
    Workflows,
}

impl EntityType {
    /// Every type, in extraction order
    pub const ALL: [EntityType; 8] = [
        Self::Base,
        Self::Contributors,
        Self::Commits,
        Self::Branches,
        Self::Releases,
        Self::Issues,
        Self::PullRequests,
        Self::Workflows,
    ];

    /// Parse config/CLI string into enum
    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == s)
    }

    /// Directory and table name
    pub fn name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Contributors => "contributors",
            Self::Commits => "commits",
            Self::Branches => "branches",
            Self::Releases => "releases",
            Self::Issues => "issues",
            Self::PullRequests => "pull_requests",
            Self::Workflows => "workflows",
        }
    }

    /// Only `base` is a single-object fetch
    pub fn is_paginated(self) -> bool {
        !matches!(self, Self::Base)
    }

    pub fn dir(self, base_dir: &Path) -> PathBuf {
        base_dir.join(self.name())
    }

    /// `{base_dir}/{type}/{project_id}.json`
    pub fn file_path(self, base_dir: &Path, project: &Project) -> PathBuf {
        self.dir(base_dir).join(format!("{}.json", project.id()))
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_joins_with_dash() {
        let p = Project::new("pandas-dev", "pandas");
        assert_eq!(p.id(), "pandas-dev-pandas");
        assert_eq!(p.to_string(), "pandas-dev/pandas");
    }

    #[test]
    fn extraction_order_is_fixed() {
        let names: Vec<&str> = EntityType::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "base",
                "contributors",
                "commits",
                "branches",
                "releases",
                "issues",
                "pull_requests",
                "workflows"
            ]
        );
    }

    #[test]
    fn from_name_roundtrip() {
        for t in EntityType::ALL {
            assert_eq!(EntityType::from_name(t.name()), Some(t));
        }
        assert_eq!(EntityType::from_name("pulls"), None);
        assert_eq!(EntityType::from_name(""), None);
    }

    #[test]
    fn only_base_is_unpaginated() {
        assert!(!EntityType::Base.is_paginated());
        assert!(
            EntityType::ALL
                .iter()
                .filter(|t| **t != EntityType::Base)
                .all(|t| t.is_paginated())
        );
    }

    #[test]
    fn file_path_layout() {
        let p = Project::new("go-chi", "chi");
        assert_eq!(
            EntityType::PullRequests.file_path(Path::new("data"), &p),
            PathBuf::from("data/pull_requests/go-chi-chi.json")
        );
    }

    #[test]
    fn project_deserializes_from_toml_shape() {
        let p: Project = serde_json::from_str(r#"{"owner":"duckdb","repo":"duckdb"}"#).unwrap();
        assert_eq!(p, Project::new("duckdb", "duckdb"));
    }
}
