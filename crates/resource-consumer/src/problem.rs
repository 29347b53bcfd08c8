//! # Problem Details
//!
//! Structured error descriptions returned by a server when a request fails,
//! following the RFC 7807 JSON shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A structured error-description envelope returned by a failed call.
///
/// Unknown members of the JSON document are kept in [`ProblemDetails::extensions`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl ProblemDetails {
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Builds problem details from an error response body.
    ///
    /// Bodies that are not a problem-details document yield a generic
    /// "Request failed" problem carrying the status. A document without a
    /// status of its own inherits the response status.
    pub fn from_response(status: u16, body: Option<&Value>) -> Self {
        let parsed = body
            .filter(|value| value.is_object())
            .and_then(|value| serde_json::from_value::<ProblemDetails>(value.clone()).ok());

        match parsed {
            Some(mut details) => {
                details.status.get_or_insert(status);
                details
            }
            None => ProblemDetails::new(status, "Request failed"),
        }
    }
}

impl fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{}", status)?,
            None => write!(f, "unknown status")?,
        }
        if let Some(title) = &self.title {
            write!(f, " {}", title)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}
