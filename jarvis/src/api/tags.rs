//! Auto-creation of referenced tags
//!
//! Before a tag-bearing record is submitted, every tag it names that does not
//! exist yet is created as a stub. This is best effort: a tag that cannot be
//! checked or created is logged and reported, and the main submission goes
//! ahead regardless.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{ApiClient, ApiError, PostOptions};
use crate::record::{Record, ResourceKind};

/// Outcome of creating missing tags
#[derive(Debug, Default)]
pub struct TagCreation {
    /// Tags that were missing and have been created
    pub created: Vec<String>,
    /// Tags that could not be checked or created
    pub failed: Vec<(String, ApiError)>,
}

impl TagCreation {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Minimal tag record used for auto-created tags
pub fn stub_tag(name: &str, author: &str) -> Record {
    let mut tag = Record::new();
    tag.insert("name", name);
    tag.insert("author", author);
    tag.insert("tags", Value::Array(Vec::new()));
    tag
}

impl ApiClient {
    /// Create every tag in `tags` that the server does not know yet
    pub fn ensure_tags(&self, author: &str, tags: &[String]) -> TagCreation {
        debug!(count = tags.len(), "ensure_tags: called");
        let mut outcome = TagCreation::default();
        let mut checked: Vec<String> = Vec::new();

        for name in tags {
            let key = name.to_lowercase();
            if checked.contains(&key) {
                continue;
            }
            checked.push(key.clone());

            match self.get(ResourceKind::Tag, &key) {
                Ok(Some(_)) => debug!(%name, "ensure_tags: exists"),
                Ok(None) => match self.post(ResourceKind::Tag, &stub_tag(name, author), PostOptions::default()) {
                    Ok(_) => {
                        info!(%name, "ensure_tags: created missing tag");
                        outcome.created.push(name.clone());
                    }
                    Err(e) => {
                        warn!(%name, error = %e, "ensure_tags: failed to create tag");
                        outcome.failed.push((name.clone(), e));
                    }
                },
                Err(e) => {
                    warn!(%name, error = %e, "ensure_tags: failed to check tag");
                    outcome.failed.push((name.clone(), e));
                }
            }
        }

        outcome
    }

    /// Create missing tags referenced by `request`, then create the record itself
    pub fn create_tagged(
        &self,
        kind: ResourceKind,
        author: &str,
        request: &Record,
    ) -> (TagCreation, Result<Record, ApiError>) {
        let tags = self.ensure_tags(author, &request.tags());
        (tags, self.post(kind, request, PostOptions::default()))
    }

    /// Create missing tags referenced by `request`, then update the record
    pub fn update_tagged(
        &self,
        kind: ResourceKind,
        id: &str,
        author: &str,
        request: &Record,
    ) -> (TagCreation, Result<Record, ApiError>) {
        let tags = self.ensure_tags(author, &request.tags());
        (tags, self.put(kind, id, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::{Method, MockTransport};
    use serde_json::json;
    use std::sync::Arc;

    const BASE: &str = "http://localhost:3000";

    fn log_request(tags: &[&str]) -> Record {
        let mut log = Record::new();
        log.insert("author", "Jane");
        log.insert("tags", json!(tags));
        log.insert("body", "Rain again");
        log
    }

    #[test]
    fn test_missing_tag_created_once_before_submission() {
        let transport = Arc::new(
            MockTransport::new()
                .on(Method::Post, "http://localhost:3000/tags", 201, json!({"name": "NewTag"}))
                .on(Method::Post, "http://localhost:3000/logentries", 201, json!({"id": 1})),
        );
        let client = ApiClient::new(transport.clone(), BASE);

        let (tags, created) = client.create_tagged(ResourceKind::LogEntry, "Jane", &log_request(&["NewTag"]));
        assert!(created.is_ok());
        assert_eq!(tags.created, vec!["NewTag"]);

        let posts: Vec<_> = transport
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Post)
            .collect();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].url, "http://localhost:3000/tags");
        assert_eq!(
            posts[0].body,
            Some(json!({"name": "NewTag", "author": "Jane", "tags": []}))
        );
        assert_eq!(posts[1].url, "http://localhost:3000/logentries");
    }

    #[test]
    fn test_existing_tags_not_recreated() {
        let transport = Arc::new(
            MockTransport::new()
                .on(Method::Get, "http://localhost:3000/tags/weather", 200, json!({"name": "Weather"}))
                .on(Method::Post, "http://localhost:3000/logentries", 201, json!({"id": 2})),
        );
        let client = ApiClient::new(transport.clone(), BASE);

        let (tags, created) = client.create_tagged(ResourceKind::LogEntry, "Jane", &log_request(&["Weather"]));
        assert!(created.is_ok());
        assert!(tags.created.is_empty());
        assert!(tags.is_clean());

        // Lookup uses the lower-cased tag name
        assert_eq!(transport.requests()[0].url, "http://localhost:3000/tags/weather");
        assert_eq!(
            transport.requests().iter().filter(|r| r.method == Method::Post).count(),
            1
        );
    }

    #[test]
    fn test_failed_tag_creation_does_not_block_submission() {
        let transport = Arc::new(
            MockTransport::new()
                .on_raw(Method::Post, "http://localhost:3000/tags", 500, "db down")
                .on(Method::Put, "http://localhost:3000/logentries/3", 200, json!({"id": 3})),
        );
        let client = ApiClient::new(transport.clone(), BASE);

        let (tags, updated) = client.update_tagged(ResourceKind::LogEntry, "3", "Jane", &log_request(&["Broken"]));
        assert!(updated.is_ok());
        assert!(!tags.is_clean());
        assert_eq!(tags.failed[0].0, "Broken");
        assert_eq!(tags.failed[0].1.status(), Some(500));
    }

    #[test]
    fn test_duplicate_tag_names_checked_once() {
        let transport = Arc::new(
            MockTransport::new().on(Method::Get, "http://localhost:3000/tags/a", 200, json!({"name": "A"})),
        );
        let client = ApiClient::new(transport.clone(), BASE);

        let outcome = client.ensure_tags("Jane", &["A".to_string(), "a".to_string()]);
        assert!(outcome.is_clean());
        assert_eq!(transport.requests().len(), 1);
    }
}
