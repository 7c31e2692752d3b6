//! Per-entity-type fetch policies over the GitHub REST API

use harvest_core::paginate::stamp_project;
use harvest_core::{
    FetchError, PageOptions, PageShape, RequestHeaders, Requester, Transport, fetch_all_pages,
};
use indicatif::ProgressBar;
use serde_json::Value;

use crate::state::{EntityType, Project};

/// Public GitHub API root
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub's JSON media type
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Header set for authenticated GitHub API calls.
pub fn github_headers(token: &str) -> RequestHeaders {
    RequestHeaders::new()
        .with("Accept", GITHUB_ACCEPT)
        .with("Authorization", format!("token {token}"))
}

/// Result of one entity fetch
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// Single project descriptor (`base`)
    Single(Value),
    /// Every item of a paginated collection
    Many(Vec<Value>),
}

impl Fetched {
    pub fn record_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(items) => items.len(),
        }
    }
}

/// Endpoint binding for one entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Path below `/repos/{owner}/{repo}`, empty for the repository itself
    pub path: &'static str,
    /// Fixed query string, without the leading `?`
    pub query: Option<&'static str>,
    pub shape: PageShape,
}

impl Endpoint {
    pub fn for_entity(entity: EntityType) -> Self {
        let (path, query, shape) = match entity {
            EntityType::Base => ("", None, PageShape::Array),
            EntityType::Contributors => ("contributors", None, PageShape::Array),
            EntityType::Commits => ("commits", None, PageShape::Array),
            EntityType::Branches => ("branches", None, PageShape::Array),
            EntityType::Releases => ("releases", None, PageShape::Array),
            EntityType::Issues => ("issues", Some("state=all"), PageShape::Array),
            EntityType::PullRequests => ("pulls", Some("state=all"), PageShape::Array),
            EntityType::Workflows => ("actions/workflows", None, PageShape::Nested("workflows")),
        };
        Self { path, query, shape }
    }

    /// Full URL (without page parameter) for `project` under `api_url`.
    pub fn url(&self, api_url: &str, project: &Project) -> String {
        let mut url = format!(
            "{}/repos/{}/{}",
            api_url.trim_end_matches('/'),
            project.owner,
            project.repo
        );
        if !self.path.is_empty() {
            url.push('/');
            url.push_str(self.path);
        }
        if let Some(query) = self.query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

/// Fetch one entity type for one project.
///
/// `page_limit` bounds paginated fetches; it is ignored for `base`.
pub fn fetch_entity<T: Transport>(
    requester: &Requester<T>,
    api_url: &str,
    entity: EntityType,
    project: &Project,
    page_limit: Option<u32>,
    pb: &ProgressBar,
) -> Result<Fetched, FetchError> {
    let endpoint = Endpoint::for_entity(entity);
    let url = endpoint.url(api_url, project);
    let project_id = project.id();

    if !entity.is_paginated() {
        pb.set_message("fetching");
        return match requester.get_json(&url)? {
            Value::Object(mut record) => {
                stamp_project(&mut record, &project_id);
                Ok(Fetched::Single(Value::Object(record)))
            }
            _ => Err(FetchError::Malformed {
                url,
                message: "expected a repository object".to_string(),
            }),
        };
    }

    let options = PageOptions {
        limit: page_limit,
        shape: endpoint.shape,
    };
    fetch_all_pages(requester, &url, &project_id, &options, pb).map(Fetched::Many)
}
