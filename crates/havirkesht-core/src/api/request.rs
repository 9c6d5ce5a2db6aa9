//! Logical request descriptions and URL construction.

use reqwest::Url;
use serde::Serialize;

use super::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// URL-encoded form fields, sent verbatim (empty values included)
    Form(Vec<(String, String)>),
}

/// Query string pairs. Empty values are dropped on insert, so a blank
/// search box means "no filter" rather than "match the empty string".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.0.push((key.to_string(), value));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    /// Appended to `path` as individually percent-encoded segments
    pub segments: Vec<String>,
    pub query: QueryParams,
    pub body: RequestBody,
    pub authenticated: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            segments: Vec::new(),
            query: QueryParams::new(),
            body: RequestBody::Empty,
            authenticated: true,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Unknown {
            status: None,
            message: format!("Failed to encode request body: {}", e),
        })?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    /// Token endpoints authenticate with their body or query, not a bearer header.
    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn url(&self, base_url: &str) -> Result<Url, ApiError> {
        build_url(base_url, &self.path, &self.segments, &self.query)
    }
}

pub fn build_url(
    base_url: &str,
    path: &str,
    segments: &[String],
    query: &QueryParams,
) -> Result<Url, ApiError> {
    let invalid = |detail: String| ApiError::Unknown {
        status: None,
        message: format!("Invalid request URL: {}", detail),
    };

    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    let mut url = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;

    if !segments.is_empty() {
        let mut path_segments = url
            .path_segments_mut()
            .map_err(|_| invalid(raw.clone()))?;
        path_segments.pop_if_empty();
        for segment in segments {
            path_segments.push(segment);
        }
    }

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.pairs());
    }

    Ok(url)
}
