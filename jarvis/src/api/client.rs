//! Resource client for the Jarvis API
//!
//! Status handling for single-resource calls:
//!
//! | Status    | GET            | PUT / POST          |
//! |-----------|----------------|---------------------|
//! | 200 / 201 | record         | record              |
//! | 400       | `BadRequest`   | `BadRequest`        |
//! | 404       | `Ok(None)`     | `NotFound`          |
//! | other     | `Status`       | `Status`            |

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::query::{Listing, Pages};
use super::transport::HttpResponse;
use super::{ApiError, HttpTransport, Transport, links};
use crate::record::{Record, ResourceKind};

/// Endpoint serving per-collection data summaries
const DATA_SUMMARY_ENDPOINT: &str = "datasummary";

/// Options for creating a resource
#[derive(Debug, Clone, Copy, Default)]
pub struct PostOptions {
    /// Ask the server not to verify that referenced tags exist
    pub skip_tags_check: bool,
}

/// Client for one Jarvis API host
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { transport, base_url }
    }

    /// Client speaking HTTP to `base_url`
    pub fn connect(base_url: &str) -> Result<Self, ApiError> {
        debug!(%base_url, "connect: called");
        Ok(Self::new(Arc::new(HttpTransport::new()?), base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resource_url(&self, endpoint: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, endpoint, urlencoding::encode(id))
    }

    /// Fetch one resource; `Ok(None)` when the server has no such resource
    pub fn get(&self, kind: ResourceKind, id: &str) -> Result<Option<Record>, ApiError> {
        debug!(%kind, %id, "get: called");
        let response = self.transport.get(&self.resource_url(kind.endpoint(), id))?;
        match response.status {
            200 | 201 => Ok(Some(parse_record(&response)?)),
            404 => {
                debug!(%kind, %id, "get: not found");
                Ok(None)
            }
            _ => Err(ApiError::from_response(&response, &resource_name(kind, id), "")),
        }
    }

    /// Replace a resource with `request`
    pub fn put(&self, kind: ResourceKind, id: &str, request: &Record) -> Result<Record, ApiError> {
        debug!(%kind, %id, "put: called");
        let body = request.clone().into_value();
        let response = self.transport.put(&self.resource_url(kind.endpoint(), id), &body)?;
        match response.status {
            200 | 201 => {
                info!(%kind, %id, "put: updated");
                parse_record(&response)
            }
            _ => Err(ApiError::from_response(&response, &resource_name(kind, id), &body.to_string())),
        }
    }

    /// Create a resource from `request`
    pub fn post(&self, kind: ResourceKind, request: &Record, options: PostOptions) -> Result<Record, ApiError> {
        debug!(%kind, skip_tags_check = options.skip_tags_check, "post: called");
        let mut url = format!("{}/{}", self.base_url, kind.endpoint());
        if options.skip_tags_check {
            url.push_str("?skipTagsCheck=true");
        }

        let body = request.clone().into_value();
        let response = self.transport.post(&url, &body)?;
        match response.status {
            200 | 201 => {
                let record = parse_record(&response)?;
                info!(%kind, id = ?kind.id_of(&record), "post: created");
                Ok(record)
            }
            _ => Err(ApiError::from_response(&response, kind.endpoint(), &body.to_string())),
        }
    }

    /// Page through a collection lazily
    pub fn pages(&self, kind: ResourceKind, params: &[(&str, Option<String>)]) -> Pages<'_> {
        Pages::new(self.transport.as_ref(), &self.base_url, kind.endpoint(), params)
    }

    /// Every record of a collection matching `params`, in server order
    pub fn query(&self, kind: ResourceKind, params: &[(&str, Option<String>)]) -> Listing {
        debug!(%kind, params = params.len(), "query: called");
        Listing::collect(self.pages(kind, params))
    }

    /// Summary counters the server keeps for a collection
    pub fn data_summary(&self, kind: ResourceKind) -> Result<Map<String, Value>, ApiError> {
        debug!(%kind, "data_summary: called");
        let url = format!("{}/{}/{}", self.base_url, DATA_SUMMARY_ENDPOINT, kind.endpoint());
        let response = self.transport.get(&url)?;
        if !response.is_success() {
            return Err(ApiError::from_response(&response, &url, ""));
        }
        match response.json()? {
            Value::Object(map) => Ok(map),
            _ => Err(ApiError::InvalidResponse(format!("{} did not return an object", url))),
        }
    }
}

fn parse_record(response: &HttpResponse) -> Result<Record, ApiError> {
    links::normalize(response.json()?)
}

fn resource_name(kind: ResourceKind, id: &str) -> String {
    format!("{}/{}", kind.endpoint(), id)
}
