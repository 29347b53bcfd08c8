//! # Resource Consumer
//!
//! This crate provides a strongly-typed, ergonomic façade for consuming REST
//! resources through an API client you supply. It does no transport work of its own:
//! the [`ApiClient`] trait owns HTTP, authentication, serialization on the wire and
//! retries, and this crate turns resource-level calls into requests for it.
//!
//! ## Architecture Overview
//!
//! The crate separates concerns into three layers:
//!
//! 1. **Transport Layer** ([`ApiClient`]) - The collaborator that performs the calls
//! 2. **Base Layer** ([`BaseConsumer`]) - URI resolution, payload encoding, response decoding
//! 3. **Typed Layer** ([`Consumer<T>`]) - The same surface with the response type pinned
//!
//! Data flows `Consumer<T>` → `BaseConsumer` → `ApiClient` and back unchanged.
//!
//! ## Operations
//!
//! | Operation | Positional form | Options form | Result |
//! |-----------|-----------------|--------------|--------|
//! | Get | `get` | `get_with` | `T` |
//! | GetAll | `get_all` | `get_all_with` | [`PagedResult<T>`] |
//! | Create / Post | `create`, `post` | `create_with`, `post_with` | `T` |
//! | Update / Put | `update`, `put` | `update_with`, `put_with` | `T` |
//! | Delete | `delete` | `delete_with` | `T` |
//! | Upload | `upload` | `upload_with` | [`FileUploadResponse`] |
//!
//! Positional forms take an optional id, the call knobs in [`CallOptions`]
//! (override URI, allow-anonymous) and a [`CancellationToken`](tokio_util::sync::CancellationToken).
//! Options forms take a fully resolved [`RequestOptions`] or [`RequestUploadOptions`].
//!
//! ## Results & Errors
//!
//! Every operation returns [`OperationResult<T>`], i.e. `Result<T, ConsumerError>`.
//! A server-reported failure is [`ConsumerError::Problem`] carrying the
//! [`ProblemDetails`] document. Consumers never retry, translate or swallow errors.
//!
//! ## Concurrency Model
//!
//! - Consumers are immutable after construction and cheap to clone
//! - Calls are independent; share one consumer across as many tasks as you like
//! - Thread-safety of the calls themselves is the [`ApiClient`]'s responsibility
//!
//! ## Testing
//!
//! The [`mock`] module provides [`MockApiClient`](mock::MockApiClient), a scripted
//! in-memory API client with a fluent expectation API and request recording.

pub mod base;
pub mod client;
pub mod consumer;
pub mod error;
pub mod mock;
pub mod observability;
pub mod options;
pub mod problem;
pub mod response;

// Re-export core types for convenience
pub use base::BaseConsumer;
pub use client::{ApiClient, Method};
pub use consumer::Consumer;
pub use error::{ConsumerError, OperationResult};
pub use options::{CallOptions, RequestDataOptions, RequestOptions, RequestUploadOptions};
pub use problem::ProblemDetails;
pub use response::{ApiResponse, FileUploadResponse, PagedResult};
