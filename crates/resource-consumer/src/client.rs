//! # API Client
//!
//! This module defines the collaborator every consumer delegates to. An
//! [`ApiClient`] owns transport, authentication, base URL resolution and retry
//! policy; consumers only hand it resolved requests and decode what comes back.

use crate::error::ConsumerError;
use crate::options::{RequestOptions, RequestUploadOptions};
use crate::response::ApiResponse;
use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// The HTTP verb of a request, as seen by an [`ApiClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Upload,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Upload => "UPLOAD",
        };
        f.write_str(name)
    }
}

/// Transport-level client that performs the actual API calls.
///
/// Implementations decide what a cancelled token means; consumers forward the
/// token untouched and never inspect it.
///
/// A non-success status is reported as `Ok(ApiResponse)` with that status, not as
/// an error. `Err` is reserved for exchanges that produced no response at all
/// (transport failure, cancellation).
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use resource_consumer::{ApiClient, ApiResponse, ConsumerError, RequestOptions, RequestUploadOptions};
/// use tokio_util::sync::CancellationToken;
///
/// struct Offline;
///
/// #[async_trait]
/// impl ApiClient for Offline {
///     async fn get(&self, _: RequestOptions, _: CancellationToken) -> Result<ApiResponse, ConsumerError> {
///         Err(ConsumerError::Transport("offline".into()))
///     }
///     async fn post(&self, _: RequestOptions, _: CancellationToken) -> Result<ApiResponse, ConsumerError> {
///         Err(ConsumerError::Transport("offline".into()))
///     }
///     async fn put(&self, _: RequestOptions, _: CancellationToken) -> Result<ApiResponse, ConsumerError> {
///         Err(ConsumerError::Transport("offline".into()))
///     }
///     async fn delete(&self, _: RequestOptions, _: CancellationToken) -> Result<ApiResponse, ConsumerError> {
///         Err(ConsumerError::Transport("offline".into()))
///     }
///     async fn upload(&self, _: RequestUploadOptions, _: CancellationToken) -> Result<ApiResponse, ConsumerError> {
///         Err(ConsumerError::Transport("offline".into()))
///     }
/// }
/// ```
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn get(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError>;

    async fn post(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError>;

    async fn put(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError>;

    async fn delete(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError>;

    /// Sends a file as multipart content.
    async fn upload(
        &self,
        options: RequestUploadOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError>;
}
