//! # In-Memory Backend
//!
//! [`InMemoryApiClient`] is an [`ApiClient`] that answers requests from an in-memory
//! store instead of the network. It plays the server's role in the demo and in the
//! end-to-end tests, so consumers can be exercised against real routing, paging and
//! error responses.
//!
//! ## Routes
//!
//! | Method | Path | Result |
//! |--------|------|--------|
//! | GET | `{collection}` | Page of resources (`pageNumber`, `pageSize`, `search`, `orderBy`, filters) |
//! | GET | `{collection}/{id}` | The resource, or 404 |
//! | POST | `{collection}` | Created resource with a generated id (201) |
//! | PUT | `{collection}/{id}` | Resource with the body's fields merged in |
//! | DELETE | `{collection}/{id}` | The removed resource |
//! | UPLOAD | `{collection}/{id}` | Upload acknowledgement (201) |
//!
//! Failures are answered with a problem-details body, as a real server would.
//! Calls that do not allow anonymous access need a session ([`InMemoryApiClient::with_session`]).

pub mod error;

pub use error::*;

use async_trait::async_trait;
use resource_consumer::{
    ApiClient, ApiResponse, ConsumerError, FileUploadResponse, Method, PagedResult, RequestOptions,
    RequestUploadOptions,
};
use serde_json::{Map, Value};
use std::cmp;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DEFAULT_PAGE_SIZE: u32 = 25;

/// Query keys with a meaning of their own; every other key is an equality filter.
const RESERVED_QUERY_KEYS: [&str; 5] = ["pageNumber", "pageSize", "search", "orderBy", "orderDirection"];

#[derive(Default)]
struct Store {
    items: Vec<Map<String, Value>>,
    files: BTreeMap<String, Vec<FileUploadResponse>>,
}

/// An [`ApiClient`] serving one resource collection from memory.
pub struct InMemoryApiClient {
    collection: String,
    id_prefix: String,
    store: Mutex<Store>,
    next_id: AtomicU64,
    session: Option<String>,
    page_size: u32,
    latency: Duration,
}

impl InMemoryApiClient {
    /// Creates an empty backend for `collection` (e.g. `"widgets"`) with no session.
    pub fn new(collection: impl Into<String>) -> Self {
        let collection = collection.into().trim_matches('/').to_string();
        let id_prefix = collection.strip_suffix('s').unwrap_or(&collection).to_string();
        Self {
            collection,
            id_prefix,
            store: Mutex::new(Store::default()),
            next_id: AtomicU64::new(1),
            session: None,
            page_size: DEFAULT_PAGE_SIZE,
            latency: Duration::ZERO,
        }
    }

    /// Marks the client as signed in with `token`.
    pub fn with_session(mut self, token: impl Into<String>) -> Self {
        self.session = Some(token.into());
        self
    }

    /// Page size used when a request does not ask for one.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Delays every response, to make cancellation observable.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Files uploaded for the resource `id`, oldest first.
    pub fn files(&self, id: &str) -> Vec<FileUploadResponse> {
        self.lock().files.get(id).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Waits out the configured latency, failing if the caller cancels first.
    async fn wait(&self, cancel: &CancellationToken) -> Result<(), ConsumerError> {
        if cancel.is_cancelled() {
            return Err(ConsumerError::Cancelled);
        }
        if self.latency.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(ConsumerError::Cancelled),
            _ = tokio::time::sleep(self.latency) => Ok(()),
        }
    }

    fn authorize(&self, allow_anonymous: bool) -> Result<(), BackendError> {
        if allow_anonymous || self.session.is_some() {
            Ok(())
        } else {
            Err(BackendError::Unauthorized)
        }
    }

    /// Splits `uri` into this collection and an optional id.
    fn route<'a>(&self, uri: &'a str) -> Result<Option<&'a str>, BackendError> {
        let path = uri.trim_matches('/');
        let mut segments = path.splitn(2, '/');
        if segments.next() != Some(self.collection.as_str()) {
            return Err(BackendError::NotFound(uri.to_string()));
        }
        match segments.next() {
            None => Ok(None),
            Some(id) if !id.is_empty() && !id.contains('/') => Ok(Some(id)),
            Some(_) => Err(BackendError::NotFound(uri.to_string())),
        }
    }

    fn require_id<'a>(&self, method: Method, uri: &'a str) -> Result<&'a str, BackendError> {
        self.route(uri)?
            .ok_or_else(|| BackendError::MethodNotAllowed(format!("{} {}", method, uri)))
    }

    fn handle_get(&self, options: &RequestOptions) -> Result<ApiResponse, BackendError> {
        match self.route(&options.uri)? {
            Some(id) => self.find(id).map(|item| ApiResponse::ok(Value::Object(item))),
            None => Ok(ApiResponse::ok(self.list(&options.query)?)),
        }
    }

    fn handle_post(&self, options: RequestOptions) -> Result<ApiResponse, BackendError> {
        if self.route(&options.uri)?.is_some() {
            return Err(BackendError::MethodNotAllowed(format!("POST {}", options.uri)));
        }
        let created = self.insert(options.body)?;
        Ok(ApiResponse::new(201, Some(Value::Object(created))))
    }

    fn handle_put(&self, options: RequestOptions) -> Result<ApiResponse, BackendError> {
        let id = self.require_id(Method::Put, &options.uri)?;
        let updated = self.merge(id, options.body)?;
        Ok(ApiResponse::ok(Value::Object(updated)))
    }

    fn handle_delete(&self, options: &RequestOptions) -> Result<ApiResponse, BackendError> {
        let id = self.require_id(Method::Delete, &options.uri)?;
        let removed = self.remove(id)?;
        Ok(ApiResponse::ok(Value::Object(removed)))
    }

    fn find(&self, id: &str) -> Result<Map<String, Value>, BackendError> {
        self.lock()
            .items
            .iter()
            .find(|item| item_id(item) == Some(id))
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("{}/{}", self.collection, id)))
    }

    fn list(&self, query: &BTreeMap<String, String>) -> Result<Value, BackendError> {
        let page_number = parse_number(query, "pageNumber")?.unwrap_or(1).max(1);
        let page_size = parse_number(query, "pageSize")?.unwrap_or(self.page_size).max(1);
        let search = query.get("search").map(|term| term.to_lowercase());
        let filters: Vec<(&String, &String)> = query
            .iter()
            .filter(|(key, _)| !RESERVED_QUERY_KEYS.contains(&key.as_str()))
            .collect();

        let mut matching: Vec<Map<String, Value>> = self
            .lock()
            .items
            .iter()
            .filter(|item| match &search {
                Some(term) => field_text(item, "name").is_some_and(|name| name.to_lowercase().contains(term)),
                None => true,
            })
            .filter(|item| {
                filters
                    .iter()
                    .all(|(key, value)| field_text(item, key).as_deref() == Some(value.as_str()))
            })
            .cloned()
            .collect();

        if let Some(order_by) = query.get("orderBy") {
            let descending = query.get("orderDirection").map(String::as_str) == Some("desc");
            matching.sort_by(|a, b| {
                let (a, b) = (field_value(a, order_by), field_value(b, order_by));
                if descending {
                    compare_values(b, a)
                } else {
                    compare_values(a, b)
                }
            });
        }

        let total = matching.len() as u64;
        let skip = (page_number as usize - 1) * page_size as usize;
        let items: Vec<Value> = matching
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .map(Value::Object)
            .collect();

        let page = PagedResult {
            items,
            page_number,
            page_size,
            total_count: Some(total),
            continuation_token: None,
        };
        serde_json::to_value(page).map_err(|e| BackendError::ValidationError(e.to_string()))
    }

    fn insert(&self, body: Option<Value>) -> Result<Map<String, Value>, BackendError> {
        let mut item = expect_object(body)?;
        if !item.get("name").is_some_and(Value::is_string) {
            return Err(BackendError::ValidationError("name is required".to_string()));
        }

        let id = format!("{}_{}", self.id_prefix, self.next_id.fetch_add(1, Ordering::SeqCst));
        item.insert("id".to_string(), Value::String(id.clone()));

        let mut store = self.lock();
        store.items.push(item.clone());
        info!(id = %id, size = store.items.len(), "Created");
        Ok(item)
    }

    fn merge(&self, id: &str, body: Option<Value>) -> Result<Map<String, Value>, BackendError> {
        let changes = expect_object(body)?;
        let mut store = self.lock();
        let item = store
            .items
            .iter_mut()
            .find(|item| item_id(item) == Some(id))
            .ok_or_else(|| BackendError::NotFound(format!("{}/{}", self.collection, id)))?;

        for (key, value) in changes {
            if key != "id" {
                item.insert(key, value);
            }
        }
        debug!(id = %id, "Updated");
        Ok(item.clone())
    }

    fn remove(&self, id: &str) -> Result<Map<String, Value>, BackendError> {
        let mut store = self.lock();
        let position = store
            .items
            .iter()
            .position(|item| item_id(item) == Some(id))
            .ok_or_else(|| BackendError::NotFound(format!("{}/{}", self.collection, id)))?;

        let removed = store.items.remove(position);
        store.files.remove(id);
        info!(id = %id, size = store.items.len(), "Deleted");
        Ok(removed)
    }

    fn store_file(&self, options: &RequestUploadOptions) -> Result<ApiResponse, BackendError> {
        let id = self.require_id(Method::Upload, &options.uri)?;
        self.find(id)?;
        if options.file_name.trim().is_empty() {
            return Err(BackendError::ValidationError("file name is required".to_string()));
        }

        let uploaded = FileUploadResponse {
            uri: format!("{}/{}", options.uri.trim_matches('/'), options.file_name),
            file_name: options.file_name.clone(),
            size: options.content.len() as u64,
        };
        self.lock()
            .files
            .entry(id.to_string())
            .or_default()
            .push(uploaded.clone());
        info!(id = %id, file_name = %uploaded.file_name, size = uploaded.size, "Stored upload");

        let body = serde_json::to_value(&uploaded).map_err(|e| BackendError::ValidationError(e.to_string()))?;
        Ok(ApiResponse::new(201, Some(body)))
    }

    /// Runs `handler` once the latency has passed and the caller is authorized.
    async fn serve<F>(
        &self,
        uri: &str,
        allow_anonymous: bool,
        cancel: CancellationToken,
        handler: F,
    ) -> Result<ApiResponse, ConsumerError>
    where
        F: FnOnce() -> Result<ApiResponse, BackendError> + Send,
    {
        self.wait(&cancel).await?;
        let outcome = self.authorize(allow_anonymous).and_then(|()| handler());
        Ok(outcome.unwrap_or_else(|e| respond_with(&e, uri)))
    }
}

fn respond_with(error: &BackendError, uri: &str) -> ApiResponse {
    warn!(uri = %uri, error = %error, "Request rejected");
    ApiResponse::problem(&error.to_problem(uri))
}

fn item_id(item: &Map<String, Value>) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

/// A field's value, with an explicit `null` treated as absent.
fn field_value<'a>(item: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    item.get(field).filter(|value| !value.is_null())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// A field rendered as text for searching and filtering.
fn field_text(item: &Map<String, Value>, field: &str) -> Option<String> {
    field_value(item, field).map(value_text)
}

/// Orders absent values first, numbers by magnitude, everything else by text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> cmp::Ordering {
    match (a, b) {
        (None, None) => cmp::Ordering::Equal,
        (None, Some(_)) => cmp::Ordering::Less,
        (Some(_), None) => cmp::Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let (a, b) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
            a.total_cmp(&b)
        }
        (Some(a), Some(b)) => value_text(a).cmp(&value_text(b)),
    }
}

fn expect_object(body: Option<Value>) -> Result<Map<String, Value>, BackendError> {
    match body {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(BackendError::ValidationError("body must be a JSON object".to_string())),
    }
}

fn parse_number(query: &BTreeMap<String, String>, key: &str) -> Result<Option<u32>, BackendError> {
    query
        .get(key)
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|_| BackendError::ValidationError(format!("{} must be a number", key)))
        })
        .transpose()
}

#[async_trait]
impl ApiClient for InMemoryApiClient {
    async fn get(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError> {
        let (uri, allow_anonymous) = (options.uri.clone(), options.allow_anonymous);
        self.serve(&uri, allow_anonymous, cancel, move || self.handle_get(&options))
            .await
    }

    async fn post(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError> {
        let (uri, allow_anonymous) = (options.uri.clone(), options.allow_anonymous);
        self.serve(&uri, allow_anonymous, cancel, move || self.handle_post(options))
            .await
    }

    async fn put(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError> {
        let (uri, allow_anonymous) = (options.uri.clone(), options.allow_anonymous);
        self.serve(&uri, allow_anonymous, cancel, move || self.handle_put(options))
            .await
    }

    async fn delete(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError> {
        let (uri, allow_anonymous) = (options.uri.clone(), options.allow_anonymous);
        self.serve(&uri, allow_anonymous, cancel, move || self.handle_delete(&options))
            .await
    }

    async fn upload(
        &self,
        options: RequestUploadOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError> {
        let (uri, allow_anonymous) = (options.uri.clone(), options.allow_anonymous);
        self.serve(&uri, allow_anonymous, cancel, move || self.store_file(&options))
            .await
    }
}
