//! Page-walking accumulator for collection endpoints.
//!
//! Collection endpoints never report a total up front, so the only completion
//! signal is a page with zero items. Every item is stamped with the owning
//! project id and its 1-based source page before it is accumulated.

use indicatif::ProgressBar;
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::http::Transport;
use crate::progress::fmt_num;
use crate::retry::Requester;

/// Provenance field naming the owning project
pub const PROJECT_ID_FIELD: &str = "project_id";

/// Provenance field naming the 1-based source page
pub const PAGE_FIELD: &str = "page";

/// How the item list is laid out in a page body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageShape {
    /// Body is the item array itself
    #[default]
    Array,
    /// Body is an object; items live in the named array field.
    /// Sibling fields (e.g. `total_count`) are discarded.
    Nested(&'static str),
}

impl PageShape {
    /// Extract the items from one page body.
    pub fn items(self, body: Value) -> Result<Vec<Value>, String> {
        match self {
            Self::Array => match body {
                Value::Array(items) => Ok(items),
                other => Err(format!("expected array, got {}", kind(&other))),
            },
            Self::Nested(field) => match body {
                Value::Object(mut map) => match map.remove(field) {
                    Some(Value::Array(items)) => Ok(items),
                    Some(other) => Err(format!("field `{field}` is {}", kind(&other))),
                    None => Err(format!("missing field `{field}`")),
                },
                other => Err(format!("expected object, got {}", kind(&other))),
            },
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PageOptions {
    /// Stop once the page counter reaches this value, before requesting it.
    /// `None` walks until an empty page.
    pub limit: Option<u32>,
    pub shape: PageShape,
}

/// `base` with a `page` query parameter appended.
pub fn page_url(base: &str, page: u32) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}page={page}")
}

/// Insert `project_id` into a record, keeping its other fields untouched.
pub fn stamp_project(record: &mut Map<String, Value>, project_id: &str) {
    record.insert(
        PROJECT_ID_FIELD.to_string(),
        Value::String(project_id.to_string()),
    );
}

/// Insert `project_id` and `page` into a record.
pub fn stamp_page(record: &mut Map<String, Value>, project_id: &str, page: u32) {
    stamp_project(record, project_id);
    record.insert(PAGE_FIELD.to_string(), Value::from(page));
}

/// Fetch every page of `base_url` and return all items in page order.
///
/// Any definitive failure aborts the whole walk; partial data is never returned.
pub fn fetch_all_pages<T: Transport>(
    requester: &Requester<T>,
    base_url: &str,
    project_id: &str,
    options: &PageOptions,
    pb: &ProgressBar,
) -> Result<Vec<Value>, FetchError> {
    let mut page = 1u32;
    let mut accumulated = Vec::new();

    loop {
        if options.limit.is_some_and(|limit| page >= limit) {
            log::debug!("{base_url}: page limit reached at page {page}");
            break;
        }

        let url = page_url(base_url, page);
        pb.set_message(format!(
            "page {page} ({} records)",
            fmt_num(accumulated.len())
        ));
        log::debug!("Paginating over page {page}");

        let body = requester.get_json(&url)?;
        let items = options
            .shape
            .items(body)
            .map_err(|message| FetchError::Malformed {
                url: url.clone(),
                message,
            })?;

        if items.is_empty() {
            break;
        }

        accumulated.reserve(items.len());
        for item in items {
            let mut record = match item {
                Value::Object(record) => record,
                other => {
                    return Err(FetchError::Malformed {
                        url,
                        message: format!("page item is {}", kind(&other)),
                    });
                }
            };
            stamp_page(&mut record, project_id, page);
            accumulated.push(Value::Object(record));
        }
        page += 1;
    }

    Ok(accumulated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestError;
    use crate::http::RequestHeaders;
    use crate::retry::RetryPolicy;
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    const BASE: &str = "https://api.example.com/repos/o/r/commits";

    fn requester(transport: &ScriptedTransport) -> Requester<&ScriptedTransport> {
        Requester::new(transport, RequestHeaders::new(), RetryPolicy::immediate(2))
    }

    fn fetch(transport: &ScriptedTransport, options: &PageOptions) -> Result<Vec<Value>, FetchError> {
        fetch_all_pages(
            &requester(transport),
            BASE,
            "o-r",
            options,
            &ProgressBar::hidden(),
        )
    }

    #[test]
    fn page_url_uses_question_mark_without_query() {
        assert_eq!(page_url("https://x/y", 1), "https://x/y?page=1");
    }

    #[test]
    fn page_url_uses_ampersand_with_query() {
        assert_eq!(
            page_url("https://x/issues?state=all", 3),
            "https://x/issues?state=all&page=3"
        );
    }

    #[test]
    fn walks_until_empty_page() {
        let transport = ScriptedTransport::new()
            .respond_json(&page_url(BASE, 1), &json!([{"sha": "a"}, {"sha": "b"}]))
            .respond_json(&page_url(BASE, 2), &json!([{"sha": "c"}]))
            .respond_json(&page_url(BASE, 3), &json!([]));

        let items = fetch(&transport, &PageOptions::default()).unwrap();

        assert_eq!(transport.calls(), 3);
        let shas: Vec<&str> = items.iter().map(|i| i["sha"].as_str().unwrap()).collect();
        assert_eq!(shas, vec!["a", "b", "c"]);
        let pages: Vec<u64> = items.iter().map(|i| i["page"].as_u64().unwrap()).collect();
        assert_eq!(pages, vec![1, 1, 2]);
        assert!(items.iter().all(|i| i["project_id"] == "o-r"));
    }

    #[test]
    fn each_item_appended_once() {
        let transport = ScriptedTransport::new()
            .respond_json(&page_url(BASE, 1), &json!([{"n": 1}, {"n": 2}]))
            .respond_json(&page_url(BASE, 2), &json!([]));
        let items = fetch(&transport, &PageOptions::default()).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn empty_first_page_yields_nothing() {
        let transport = ScriptedTransport::new().respond_json(&page_url(BASE, 1), &json!([]));
        let items = fetch(&transport, &PageOptions::default()).unwrap();
        assert!(items.is_empty());
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn limit_short_circuits_before_request() {
        let transport = ScriptedTransport::new().fallback_ok(r#"[{"x": 1}]"#);
        let options = PageOptions {
            limit: Some(3),
            shape: PageShape::Array,
        };
        let items = fetch(&transport, &options).unwrap();
        assert_eq!(transport.calls(), 2);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["page"], 2);
    }

    #[test]
    fn limit_of_one_issues_no_request() {
        let transport = ScriptedTransport::new().fallback_ok("[]");
        let options = PageOptions {
            limit: Some(1),
            shape: PageShape::Array,
        };
        assert!(fetch(&transport, &options).unwrap().is_empty());
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn failure_mid_walk_discards_partial_data() {
        let transport = ScriptedTransport::new()
            .respond_json(&page_url(BASE, 1), &json!([{"n": 1}]))
            .fail(&page_url(BASE, 2), RequestError::Transport("reset".into()))
            .fail(&page_url(BASE, 2), RequestError::Transport("reset".into()));
        let err = fetch(&transport, &PageOptions::default()).unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { attempts: 2, .. }));
        assert_eq!(transport.calls(), 3);
    }

    #[test]
    fn nested_shape_unwraps_inner_list() {
        let transport = ScriptedTransport::new()
            .respond_json(
                &page_url(BASE, 1),
                &json!({"total_count": 3, "workflows": [{"id": 1}, {"id": 2}, {"id": 3}]}),
            )
            .respond_json(&page_url(BASE, 2), &json!({"total_count": 3, "workflows": []}));
        let options = PageOptions {
            limit: None,
            shape: PageShape::Nested("workflows"),
        };
        let items = fetch(&transport, &options).unwrap();
        let ids: Vec<u64> = items.iter().map(|i| i["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(items.iter().all(|i| i.get("total_count").is_none()));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let transport = ScriptedTransport::new()
            .respond_json(&page_url(BASE, 1), &json!({"message": "Moved Permanently"}));
        let err = fetch(&transport, &PageOptions::default()).unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[test]
    fn non_object_item_is_malformed() {
        let transport = ScriptedTransport::new().respond_json(&page_url(BASE, 1), &json!([1, 2]));
        let err = fetch(&transport, &PageOptions::default()).unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[test]
    fn stamping_preserves_existing_fields_and_order() {
        let mut record = json!({"z": 1, "a": {"nested": true}})
            .as_object()
            .cloned()
            .unwrap();
        stamp_page(&mut record, "o-r", 4);
        stamp_page(&mut record, "o-r", 4);
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "project_id", "page"]);
        assert_eq!(record["a"]["nested"], true);
        assert_eq!(record["page"], 4);
    }

    #[test]
    fn shape_errors_name_the_problem() {
        assert_eq!(
            PageShape::Nested("workflows").items(json!({})).unwrap_err(),
            "missing field `workflows`"
        );
        assert_eq!(
            PageShape::Array.items(json!("x")).unwrap_err(),
            "expected array, got string"
        );
    }
}
