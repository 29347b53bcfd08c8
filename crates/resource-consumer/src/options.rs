//! # Request Options
//!
//! Option types passed to the API client. [`RequestOptions`] and
//! [`RequestUploadOptions`] describe a fully resolved request; [`CallOptions`]
//! and [`RequestDataOptions`] are the per-call knobs the consumer resolves into them.

use crate::error::ConsumerError;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Per-call knobs shared by every positional consumer operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Replaces the resolved resource path entirely when set.
    pub override_uri: Option<String>,
    /// Lets the API client skip authentication for this call.
    pub allow_anonymous: bool,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anonymous() -> Self {
        Self {
            override_uri: None,
            allow_anonymous: true,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.override_uri = Some(uri.into());
        self
    }

    pub fn allow_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }
}

/// A fully resolved request handed to the API client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub uri: String,
    pub body: Option<Value>,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub allow_anonymous: bool,
}

impl RequestOptions {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `payload` into the request body.
    pub fn with_json_body<B: Serialize + ?Sized>(mut self, payload: &B) -> Result<Self, ConsumerError> {
        self.body = Some(serde_json::to_value(payload).map_err(ConsumerError::Serialize)?);
        Ok(self)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn allow_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }
}

/// Paging, ordering and filtering for collection reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestDataOptions {
    /// 1-based page index.
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub order_by: Option<String>,
    pub descending: bool,
    pub filters: BTreeMap<String, String>,
}

impl RequestDataOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page_number: u32, page_size: u32) -> Self {
        self.page_number = Some(page_number);
        self.page_size = Some(page_size);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.order_by = Some(field.into());
        self.descending = descending;
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Renders these options as query parameters.
    ///
    /// Filters are written first so the reserved paging keys win on collision.
    pub fn to_query(&self) -> BTreeMap<String, String> {
        let mut query = self.filters.clone();

        if let Some(page_number) = self.page_number {
            query.insert("pageNumber".to_string(), page_number.to_string());
        }
        if let Some(page_size) = self.page_size {
            query.insert("pageSize".to_string(), page_size.to_string());
        }
        if let Some(search) = &self.search {
            query.insert("search".to_string(), search.clone());
        }
        if let Some(order_by) = &self.order_by {
            query.insert("orderBy".to_string(), order_by.clone());
            let direction = if self.descending { "desc" } else { "asc" };
            query.insert("orderDirection".to_string(), direction.to_string());
        }

        query
    }
}

/// A fully resolved file upload handed to the API client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestUploadOptions {
    pub uri: String,
    pub file_name: String,
    pub content: Bytes,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub allow_anonymous: bool,
}

impl RequestUploadOptions {
    pub fn new(uri: impl Into<String>, file_name: impl Into<String>, content: Bytes) -> Self {
        Self {
            uri: uri.into(),
            file_name: file_name.into(),
            content,
            ..Self::default()
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn allow_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_options_render_query() {
        let options = RequestDataOptions::new()
            .page(2, 10)
            .search("gear")
            .order_by("name", true)
            .filter("color", "blue");

        let query = options.to_query();
        assert_eq!(query.get("pageNumber").map(String::as_str), Some("2"));
        assert_eq!(query.get("pageSize").map(String::as_str), Some("10"));
        assert_eq!(query.get("search").map(String::as_str), Some("gear"));
        assert_eq!(query.get("orderBy").map(String::as_str), Some("name"));
        assert_eq!(query.get("orderDirection").map(String::as_str), Some("desc"));
        assert_eq!(query.get("color").map(String::as_str), Some("blue"));
    }

    #[test]
    fn test_empty_data_options_render_nothing() {
        assert!(RequestDataOptions::new().to_query().is_empty());
    }

    #[test]
    fn test_paging_keys_override_filters() {
        let options = RequestDataOptions::new()
            .filter("pageSize", "999")
            .page(1, 5);
        assert_eq!(options.to_query().get("pageSize").map(String::as_str), Some("5"));
    }

    #[test]
    fn test_json_body_serializes_payload() {
        #[derive(Serialize)]
        struct Payload {
            name: &'static str,
        }

        let options = RequestOptions::new("widgets")
            .with_json_body(&Payload { name: "Foo" })
            .unwrap();
        assert_eq!(options.body, Some(serde_json::json!({ "name": "Foo" })));
    }
}
