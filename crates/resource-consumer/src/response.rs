//! # Response Shapes
//!
//! Raw responses produced by the API client and the typed envelopes the
//! consumer decodes them into.

use crate::error::{ConsumerError, OperationResult};
use crate::problem::ProblemDetails;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw response from the API client: a status code and an optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, Some(body))
    }

    pub fn no_content() -> Self {
        Self::new(204, None)
    }

    /// An error response whose body is the given problem document.
    pub fn problem(details: &ProblemDetails) -> Self {
        let status = details.status.unwrap_or(500);
        Self::new(status, serde_json::to_value(details).ok())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the response into `T`, or into problem details when unsuccessful.
    ///
    /// A successful response without a body decodes from JSON `null`.
    pub fn into_result<T: DeserializeOwned>(self) -> OperationResult<T> {
        if !self.is_success() {
            let details = ProblemDetails::from_response(self.status, self.body.as_ref());
            return Err(ConsumerError::Problem(details));
        }

        serde_json::from_value(self.body.unwrap_or(Value::Null)).map_err(ConsumerError::Decode)
    }
}

/// A page of resources plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

impl<T> PagedResult<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether more items exist past this page, when the total is known.
    pub fn has_more(&self) -> bool {
        if self.continuation_token.is_some() {
            return true;
        }
        match self.total_count {
            Some(total) => {
                let seen = u64::from(self.page_number.max(1) - 1) * u64::from(self.page_size)
                    + self.items.len() as u64;
                seen < total
            }
            None => false,
        }
    }
}

/// The server's acknowledgement of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResponse {
    pub uri: String,
    pub file_name: String,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Widget {
        id: String,
        name: String,
    }

    #[test]
    fn test_success_decodes_body() {
        let response = ApiResponse::ok(json!({ "id": "42", "name": "Foo" }));
        let widget: Widget = response.into_result().unwrap();
        assert_eq!(
            widget,
            Widget {
                id: "42".into(),
                name: "Foo".into()
            }
        );
    }

    #[test]
    fn test_error_status_yields_problem() {
        let response = ApiResponse::new(404, Some(json!({ "title": "Not Found", "status": 404 })));
        let err = response.into_result::<Widget>().unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_mismatched_body_is_decode_error() {
        let response = ApiResponse::ok(json!({ "unexpected": true }));
        let err = response.into_result::<Widget>().unwrap_err();
        assert!(matches!(err, ConsumerError::Decode(_)));
    }

    #[test]
    fn test_empty_success_decodes_unit() {
        ApiResponse::no_content().into_result::<()>().unwrap();
        let missing: Option<Widget> = ApiResponse::no_content().into_result().unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_paged_result_has_more() {
        let page: PagedResult<u32> = serde_json::from_value(json!({
            "items": [1, 2],
            "pageNumber": 1,
            "pageSize": 2,
            "totalCount": 5
        }))
        .unwrap();
        assert!(page.has_more());

        let last = PagedResult {
            items: vec![5],
            page_number: 3,
            page_size: 2,
            total_count: Some(5),
            continuation_token: None,
        };
        assert!(!last.has_more());
    }
}
